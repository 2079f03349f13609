use super::*;
use crate::foundation::error::CodeLocation;
use crate::foundation::geometry::{Point, Rectangle, Size2D};
use crate::genlib::height_map::HeightMap;
use crate::renderer::step::RenderingStep;

fn rect(x: i32, y: i32, w: u32, h: u32) -> Rectangle {
    Rectangle::new(Point::new(x, y), Size2D::new(w, h))
}

fn step(kind: StepKind, arguments: &[usize], target: usize) -> RenderingStep {
    RenderingStep::new(CodeLocation::default(), kind, arguments.iter().copied(), target)
}

fn yield_main(target: usize, render_rect: Rectangle) -> RenderingStep {
    step(
        StepKind::Yield {
            name: "main".into(),
            render_rect,
        },
        &[],
        target,
    )
}

fn metadata(steps: Vec<RenderingStep>) -> RenderingSequenceMetadata {
    let mut sequence = RenderingSequence::new(1.0, 100);
    let slots = steps.iter().map(|s| s.target + 1).max().unwrap_or(0);
    for _ in 0..slots {
        sequence.allocate_slot();
    }
    for s in steps {
        sequence.add(s).unwrap();
    }
    let graph = RenderingGraph::new(&sequence);
    RenderingSequenceMetadata::calculate(&sequence, &graph)
}

/// Two flat maps, the first added into the second, the second yielded.
fn add_chain() -> RenderingSequenceMetadata {
    metadata(vec![
        step(StepKind::MapFlat { height: 0 }, &[], 0),
        step(StepKind::MapFlat { height: 0 }, &[], 1),
        step(StepKind::MapAddMap, &[0], 1),
        yield_main(1, rect(0, 0, 10, 10)),
    ])
}

#[test]
fn bounds_flow_back_from_the_yield() {
    let meta = add_chain();
    let r = RenderingBounds::Rect(rect(0, 0, 10, 10));
    for index in 0..3 {
        assert_eq!(meta.get(index).map(|m| m.bounds), Some(r), "step {index}");
    }
    assert!(meta.get(3).is_some_and(|m| m.bounds.is_empty()));
}

#[test]
fn neighborhood_steps_widen_their_producers() {
    let meta = metadata(vec![
        step(StepKind::MapFlat { height: 0 }, &[], 0),
        step(StepKind::MapBlur { radius: 2 }, &[], 0),
        yield_main(0, rect(0, 0, 10, 10)),
    ]);
    assert_eq!(
        meta.get(0).map(|m| m.bounds),
        Some(RenderingBounds::Rect(rect(-2, -2, 14, 14)))
    );
    assert_eq!(
        meta.get(1).map(|m| m.bounds),
        Some(RenderingBounds::Rect(rect(0, 0, 10, 10)))
    );
}

#[test]
fn unused_results_get_empty_bounds() {
    let meta = metadata(vec![
        step(StepKind::MapFlat { height: 0 }, &[], 0),
        step(StepKind::MapFlat { height: 0 }, &[], 1),
        yield_main(1, rect(0, 0, 4, 4)),
    ]);
    assert!(meta.get(0).is_some_and(|m| m.bounds.is_empty()));
    assert!(meta.get(0).is_some_and(|m| m.memory_requirement == 0));
}

#[test]
fn slots_are_released_after_their_last_reader() {
    let meta = add_chain();
    let releases: Vec<Vec<usize>> = (0..meta.len())
        .map(|i| meta.get(i).map(|m| m.releases.to_vec()).unwrap_or_default())
        .collect();
    assert_eq!(releases, vec![vec![], vec![], vec![0], vec![1]]);
}

#[test]
fn memory_counts_resident_maps_and_outputs() {
    let meta = add_chain();
    let m = HeightMap::memory_size(rect(0, 0, 10, 10), 1.0);
    let requirements: Vec<u64> = (0..meta.len())
        .map(|i| meta.get(i).map(|s| s.memory_requirement).unwrap_or_default())
        .collect();
    assert_eq!(requirements, vec![m, 2 * m, 2 * m, 2 * m]);
    assert_eq!(meta.peak_memory(), 2 * m);
    assert!(meta.dump().contains("release [0]"));
}

#[test]
fn empty_sequence_has_no_peak() {
    let meta = metadata(Vec::new());
    assert!(meta.is_empty());
    assert_eq!(meta.peak_memory(), 0);
}
