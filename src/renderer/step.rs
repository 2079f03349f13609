use std::collections::BTreeMap;
use std::fmt;

use smallvec::SmallVec;

use crate::foundation::error::CodeLocation;
use crate::foundation::geometry::{Coordinate, Direction, Interval, Point, Rectangle, Scale, Size1D};
use crate::foundation::number::Height;
use crate::foundation::random::RandomSeed;
use crate::genlib::height_map::HeightMap;
use crate::genlib::height_profile::HeightProfile;
use crate::genlib::matrix::TransformationMatrix;
use crate::genlib::noise::NoiseLayers;
use crate::renderer::objects::{RenderedMapTable, RendererObject, RendererObjectTable};

/// Raster type held in a renderer slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    HeightMap,
    HeightProfile,
}

/// Logical extent of a raster: a rectangle for maps, an interval for profiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderingBounds {
    Rect(Rectangle),
    Interval(Interval),
}

impl RenderingBounds {
    pub fn empty(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::HeightMap => Self::Rect(Rectangle::default()),
            ObjectKind::HeightProfile => Self::Interval(Interval::default()),
        }
    }

    pub fn kind(self) -> ObjectKind {
        match self {
            Self::Rect(_) => ObjectKind::HeightMap,
            Self::Interval(_) => ObjectKind::HeightProfile,
        }
    }

    pub fn is_empty(self) -> bool {
        match self {
            Self::Rect(r) => r.is_empty(),
            Self::Interval(i) => i.is_empty(),
        }
    }

    /// Smallest bounds containing both; empty bounds are the identity.
    pub fn combine(self, other: RenderingBounds) -> RenderingBounds {
        match (self, other) {
            (Self::Rect(a), Self::Rect(b)) => Self::Rect(Rectangle::combine(a, b)),
            (Self::Interval(a), Self::Interval(b)) => Self::Interval(Interval::combine(a, b)),
            (a, b) => panic!("cannot combine {a:?} with {b:?}"),
        }
    }

    pub fn rect(self) -> Rectangle {
        match self {
            Self::Rect(r) => r,
            Self::Interval(i) => panic!("expected map bounds, got interval {i:?}"),
        }
    }

    pub fn interval(self) -> Interval {
        match self {
            Self::Interval(i) => i,
            Self::Rect(r) => panic!("expected profile bounds, got rectangle {r:?}"),
        }
    }

    /// Bytes a raster covering these bounds occupies at `scale`.
    pub fn memory_size(self, scale: Scale) -> u64 {
        match self {
            Self::Rect(r) if r.is_empty() => 0,
            Self::Interval(i) if i.is_empty() => 0,
            Self::Rect(r) => HeightMap::memory_size(r, scale),
            Self::Interval(i) => HeightProfile::memory_size(i, scale),
        }
    }
}

impl fmt::Display for RenderingBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rect(r) => write!(
                f,
                "[{}, {}; {}x{}]",
                r.position.x, r.position.y, r.size.width, r.size.height
            ),
            Self::Interval(i) => write!(f, "[{}; {}]", i.start, i.length),
        }
    }
}

/// Deferred raster operation, with every parameter resolved when the script ran.
#[derive(Clone, Debug, PartialEq)]
pub enum StepKind {
    MapFlat { height: Height },
    MapNoise { layers: NoiseLayers, seed: RandomSeed },
    MapGradient { source: Point, destination: Point, from: Height, to: Height },
    MapRadialGradient { center: Point, radius: Size1D, from: Height, to: Height },
    MapProjection { direction: Direction },
    MapClone,

    MapAbs,
    MapAdd { height: Height },
    MapAddMap,
    MapAddMasked { height: Height },
    MapAddMapMasked,
    MapBlur { radius: Size1D },
    MapClampHeights { min: Height, max: Height },
    MapCombine,
    MapConvexity { radius: Size1D },
    MapCrop { rect: Rectangle, height: Height },
    MapCropHeights { min: Height, max: Height, replace: Height },
    MapDistanceMap { max_distance: Size1D },
    MapDistort { max_distance: Size1D },
    MapDrawLine { start: Point, end: Point, height: Height },
    MapFillRectangle { rect: Rectangle, height: Height },
    MapIntersect,
    MapInvert,
    MapMove { offset: Point },
    MapMultiply { factor: f64 },
    MapMultiplyMap,
    MapNoiseLayer { wave_length: Size1D, amplitude: Height, seed: RandomSeed, ridged: bool },
    MapPattern { repeat: Rectangle },
    MapRescale { horizontal: Scale, vertical: Scale },
    MapResize { rect: Rectangle, height: Height },
    MapShift { max_distance: Size1D, direction: Direction },
    MapTransform { matrix: TransformationMatrix },
    MapTransformHeights { interval: Interval, min: Height, max: Height },
    MapUnify,
    /// Copies the logical `render_rect` of the target into the rendered map table.
    Yield { name: String, render_rect: Rectangle },

    ProfileFlat { height: Height },
    ProfileGradient { source: Coordinate, destination: Coordinate, from: Height, to: Height },
    ProfileFromArray { keys: BTreeMap<Coordinate, Height> },
    ProfileNoise { layers: NoiseLayers, seed: RandomSeed },
    ProfileSlice { direction: Direction, coordinate: Coordinate },
    ProfileClone,

    ProfileAbs,
    ProfileAdd { height: Height },
    ProfileAddProfile,
    ProfileAddMasked { height: Height },
    ProfileAddProfileMasked,
    ProfileBlur { radius: Size1D },
    ProfileClampHeights { min: Height, max: Height },
    ProfileCombine,
    ProfileCrop { interval: Interval, height: Height },
    ProfileCropHeights { min: Height, max: Height, replace: Height },
    ProfileFillInterval { interval: Interval, height: Height },
    ProfileFlip,
    ProfileIntersect,
    ProfileInvert,
    ProfileMove { offset: Coordinate },
    ProfileMultiply { factor: f64 },
    ProfileMultiplyProfile,
    ProfileNoiseLayer { wave_length: Size1D, amplitude: Height, seed: RandomSeed },
    ProfilePattern { repeat: Interval },
    ProfileRescale { scale: Scale },
    ProfileResize { interval: Interval, height: Height },
    ProfileUnify,
}

impl StepKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MapFlat { .. } => "HeightMap.Flat",
            Self::MapNoise { .. } => "HeightMap.Noise",
            Self::MapGradient { .. } => "HeightMap.Gradient",
            Self::MapRadialGradient { .. } => "HeightMap.RadialGradient",
            Self::MapProjection { .. } => "HeightMap.Projection",
            Self::MapClone => "HeightMap.Clone",
            Self::MapAbs => "HeightMap.Abs",
            Self::MapAdd { .. } => "HeightMap.Add",
            Self::MapAddMap => "HeightMap.AddMap",
            Self::MapAddMasked { .. } => "HeightMap.AddMasked",
            Self::MapAddMapMasked => "HeightMap.AddMapMasked",
            Self::MapBlur { .. } => "HeightMap.Blur",
            Self::MapClampHeights { .. } => "HeightMap.ClampHeights",
            Self::MapCombine => "HeightMap.Combine",
            Self::MapConvexity { .. } => "HeightMap.ConvexityMap",
            Self::MapCrop { .. } => "HeightMap.Crop",
            Self::MapCropHeights { .. } => "HeightMap.CropHeights",
            Self::MapDistanceMap { .. } => "HeightMap.DistanceMap",
            Self::MapDistort { .. } => "HeightMap.Distort",
            Self::MapDrawLine { .. } => "HeightMap.DrawLine",
            Self::MapFillRectangle { .. } => "HeightMap.FillRectangle",
            Self::MapIntersect => "HeightMap.Intersect",
            Self::MapInvert => "HeightMap.Invert",
            Self::MapMove { .. } => "HeightMap.Move",
            Self::MapMultiply { .. } => "HeightMap.Multiply",
            Self::MapMultiplyMap => "HeightMap.MultiplyMap",
            Self::MapNoiseLayer { .. } => "HeightMap.NoiseLayer",
            Self::MapPattern { .. } => "HeightMap.Pattern",
            Self::MapRescale { .. } => "HeightMap.Rescale",
            Self::MapResize { .. } => "HeightMap.Resize",
            Self::MapShift { .. } => "HeightMap.Shift",
            Self::MapTransform { .. } => "HeightMap.Transform",
            Self::MapTransformHeights { .. } => "HeightMap.TransformHeights",
            Self::MapUnify => "HeightMap.Unify",
            Self::Yield { .. } => "Yield",
            Self::ProfileFlat { .. } => "HeightProfile.Flat",
            Self::ProfileGradient { .. } => "HeightProfile.Gradient",
            Self::ProfileFromArray { .. } => "HeightProfile.FromArray",
            Self::ProfileNoise { .. } => "HeightProfile.Noise",
            Self::ProfileSlice { .. } => "HeightProfile.Slice",
            Self::ProfileClone => "HeightProfile.Clone",
            Self::ProfileAbs => "HeightProfile.Abs",
            Self::ProfileAdd { .. } => "HeightProfile.Add",
            Self::ProfileAddProfile => "HeightProfile.AddProfile",
            Self::ProfileAddMasked { .. } => "HeightProfile.AddMasked",
            Self::ProfileAddProfileMasked => "HeightProfile.AddProfileMasked",
            Self::ProfileBlur { .. } => "HeightProfile.Blur",
            Self::ProfileClampHeights { .. } => "HeightProfile.ClampHeights",
            Self::ProfileCombine => "HeightProfile.Combine",
            Self::ProfileCrop { .. } => "HeightProfile.Crop",
            Self::ProfileCropHeights { .. } => "HeightProfile.CropHeights",
            Self::ProfileFillInterval { .. } => "HeightProfile.FillInterval",
            Self::ProfileFlip => "HeightProfile.Flip",
            Self::ProfileIntersect => "HeightProfile.Intersect",
            Self::ProfileInvert => "HeightProfile.Invert",
            Self::ProfileMove { .. } => "HeightProfile.Move",
            Self::ProfileMultiply { .. } => "HeightProfile.Multiply",
            Self::ProfileMultiplyProfile => "HeightProfile.MultiplyProfile",
            Self::ProfileNoiseLayer { .. } => "HeightProfile.NoiseLayer",
            Self::ProfilePattern { .. } => "HeightProfile.Pattern",
            Self::ProfileRescale { .. } => "HeightProfile.Rescale",
            Self::ProfileResize { .. } => "HeightProfile.Resize",
            Self::ProfileUnify => "HeightProfile.Unify",
        }
    }

    /// Whether the step allocates its target instead of modifying an existing raster.
    pub fn is_creator(&self) -> bool {
        matches!(
            self,
            Self::MapFlat { .. }
                | Self::MapNoise { .. }
                | Self::MapGradient { .. }
                | Self::MapRadialGradient { .. }
                | Self::MapProjection { .. }
                | Self::MapClone
                | Self::ProfileFlat { .. }
                | Self::ProfileGradient { .. }
                | Self::ProfileFromArray { .. }
                | Self::ProfileNoise { .. }
                | Self::ProfileSlice { .. }
                | Self::ProfileClone
        )
    }

    /// Raster type of the target slot. `Yield` reads a map.
    pub fn output_kind(&self) -> ObjectKind {
        match self {
            Self::MapFlat { .. }
            | Self::MapNoise { .. }
            | Self::MapGradient { .. }
            | Self::MapRadialGradient { .. }
            | Self::MapProjection { .. }
            | Self::MapClone
            | Self::MapAbs
            | Self::MapAdd { .. }
            | Self::MapAddMap
            | Self::MapAddMasked { .. }
            | Self::MapAddMapMasked
            | Self::MapBlur { .. }
            | Self::MapClampHeights { .. }
            | Self::MapCombine
            | Self::MapConvexity { .. }
            | Self::MapCrop { .. }
            | Self::MapCropHeights { .. }
            | Self::MapDistanceMap { .. }
            | Self::MapDistort { .. }
            | Self::MapDrawLine { .. }
            | Self::MapFillRectangle { .. }
            | Self::MapIntersect
            | Self::MapInvert
            | Self::MapMove { .. }
            | Self::MapMultiply { .. }
            | Self::MapMultiplyMap
            | Self::MapNoiseLayer { .. }
            | Self::MapPattern { .. }
            | Self::MapRescale { .. }
            | Self::MapResize { .. }
            | Self::MapShift { .. }
            | Self::MapTransform { .. }
            | Self::MapTransformHeights { .. }
            | Self::MapUnify
            | Self::Yield { .. } => ObjectKind::HeightMap,
            Self::ProfileFlat { .. }
            | Self::ProfileGradient { .. }
            | Self::ProfileFromArray { .. }
            | Self::ProfileNoise { .. }
            | Self::ProfileSlice { .. }
            | Self::ProfileClone
            | Self::ProfileAbs
            | Self::ProfileAdd { .. }
            | Self::ProfileAddProfile
            | Self::ProfileAddMasked { .. }
            | Self::ProfileAddProfileMasked
            | Self::ProfileBlur { .. }
            | Self::ProfileClampHeights { .. }
            | Self::ProfileCombine
            | Self::ProfileCrop { .. }
            | Self::ProfileCropHeights { .. }
            | Self::ProfileFillInterval { .. }
            | Self::ProfileFlip
            | Self::ProfileIntersect
            | Self::ProfileInvert
            | Self::ProfileMove { .. }
            | Self::ProfileMultiply { .. }
            | Self::ProfileMultiplyProfile
            | Self::ProfileNoiseLayer { .. }
            | Self::ProfilePattern { .. }
            | Self::ProfileRescale { .. }
            | Self::ProfileResize { .. }
            | Self::ProfileUnify => ObjectKind::HeightProfile,
        }
    }
}

/// One recorded step: what to run, which slots it reads and which slot it writes.
///
/// `arguments` never lists the target. In-place steps read and write `target`; creators
/// allocate it; `Yield` only reads it.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderingStep {
    pub location: CodeLocation,
    pub kind: StepKind,
    pub arguments: SmallVec<[usize; 4]>,
    pub target: usize,
}

impl RenderingStep {
    pub fn new(
        location: CodeLocation,
        kind: StepKind,
        arguments: impl IntoIterator<Item = usize>,
        target: usize,
    ) -> Self {
        Self {
            location,
            kind,
            arguments: arguments.into_iter().collect(),
            target,
        }
    }

    /// Slots whose current content this step reads: the arguments plus, unless it is a
    /// creator, the target.
    pub fn read_slots(&self) -> impl Iterator<Item = usize> + '_ {
        let target = (!self.kind.is_creator()).then_some(self.target);
        self.arguments.iter().copied().chain(target)
    }

    /// Extent of the target's previous content an in-place step needs to produce `own`.
    pub fn prior_bounds(&self, own: RenderingBounds) -> RenderingBounds {
        if own.is_empty() && !matches!(self.kind, StepKind::Yield { .. }) {
            return own;
        }
        match &self.kind {
            StepKind::MapBlur { radius } | StepKind::MapConvexity { radius } => {
                RenderingBounds::Rect(own.rect().expand(*radius))
            }
            StepKind::MapDistort { max_distance } => {
                RenderingBounds::Rect(own.rect().expand(*max_distance))
            }
            StepKind::MapShift {
                max_distance,
                direction,
            } => RenderingBounds::Rect(own.rect().expand_in(*max_distance, *direction)),
            StepKind::MapTransform { matrix } => {
                RenderingBounds::Rect(matrix.inverse().map_rectangle(own.rect()).expand(1))
            }
            StepKind::MapRescale {
                horizontal,
                vertical,
            } => RenderingBounds::Rect(unscale_rect(own.rect(), *horizontal, *vertical)),
            StepKind::MapMove { offset } => RenderingBounds::Rect(own.rect().translated(-*offset)),
            StepKind::MapResize { rect, .. } => {
                RenderingBounds::Rect(Rectangle::intersect(own.rect(), *rect))
            }
            StepKind::Yield { render_rect, .. } => own.combine(RenderingBounds::Rect(*render_rect)),
            StepKind::ProfileBlur { radius } => RenderingBounds::Interval(own.interval().expand(*radius)),
            StepKind::ProfileFlip => RenderingBounds::Interval(mirror_interval(own.interval())),
            StepKind::ProfileRescale { scale } => {
                RenderingBounds::Interval(unscale_interval(own.interval(), *scale))
            }
            StepKind::ProfileMove { offset } => {
                RenderingBounds::Interval(own.interval().translated(offset.saturating_neg()))
            }
            StepKind::ProfileResize { interval, .. } => {
                RenderingBounds::Interval(Interval::intersect(own.interval(), *interval))
            }
            _ => own,
        }
    }

    /// Extent of argument `index` this step reads to produce `own`.
    pub fn argument_bounds(&self, index: usize, own: RenderingBounds) -> RenderingBounds {
        match &self.kind {
            StepKind::MapProjection { direction } | StepKind::MapShift { direction, .. } => {
                let rect = own.rect();
                RenderingBounds::Interval(match direction {
                    Direction::Horizontal => rect.vertical(),
                    Direction::Vertical => rect.horizontal(),
                })
            }
            StepKind::ProfileSlice {
                direction,
                coordinate,
            } => {
                let along = own.interval();
                if along.is_empty() {
                    return RenderingBounds::empty(ObjectKind::HeightMap);
                }
                let across = Interval::new(*coordinate, 1);
                RenderingBounds::Rect(match direction {
                    Direction::Horizontal => Rectangle::from_intervals(along, across),
                    Direction::Vertical => Rectangle::from_intervals(across, along),
                })
            }
            StepKind::MapPattern { repeat } => RenderingBounds::Rect(*repeat),
            StepKind::ProfilePattern { repeat } => RenderingBounds::Interval(*repeat),
            StepKind::MapTransformHeights { interval, .. } => RenderingBounds::Interval(*interval),
            _ => {
                debug_assert!(index < self.arguments.len());
                own
            }
        }
    }

    /// Target footprint after an in-place step ran on `footprint`.
    pub fn simulate_footprint(&self, own: RenderingBounds, footprint: RenderingBounds) -> RenderingBounds {
        match &self.kind {
            StepKind::MapRescale {
                horizontal,
                vertical,
            } => RenderingBounds::Rect(scale_rect(footprint.rect(), *horizontal, *vertical)),
            StepKind::MapMove { offset } => RenderingBounds::Rect(footprint.rect().translated(*offset)),
            StepKind::MapResize { rect, .. } => RenderingBounds::Rect(*rect),
            StepKind::MapTransform { .. } => own,
            StepKind::ProfileRescale { scale } => {
                RenderingBounds::Interval(scale_interval(footprint.interval(), *scale))
            }
            StepKind::ProfileMove { offset } => {
                RenderingBounds::Interval(footprint.interval().translated(*offset))
            }
            StepKind::ProfileResize { interval, .. } => RenderingBounds::Interval(*interval),
            StepKind::ProfileFlip => RenderingBounds::Interval(mirror_interval(footprint.interval())),
            _ => footprint,
        }
    }

    /// Temporary memory the step needs on top of everything resident while it runs.
    ///
    /// `footprint` is the target's extent before the step (empty for creators).
    pub fn peak_extra_memory(
        &self,
        own: RenderingBounds,
        footprint: RenderingBounds,
        scale: Scale,
    ) -> u64 {
        if self.kind.is_creator() {
            return own.memory_size(scale);
        }
        let current = footprint.memory_size(scale);
        match &self.kind {
            StepKind::MapBlur { .. }
            | StepKind::MapDistort { .. }
            | StepKind::MapShift { .. }
            | StepKind::ProfileBlur { .. } => current,
            StepKind::MapConvexity { .. } => 2 * current,
            StepKind::MapDistanceMap { .. } => 4 * current,
            StepKind::MapRescale { .. }
            | StepKind::MapResize { .. }
            | StepKind::MapTransform { .. }
            | StepKind::ProfileRescale { .. }
            | StepKind::ProfileResize { .. } => {
                self.simulate_footprint(own, footprint).memory_size(scale)
            }
            StepKind::Yield { render_rect, .. } => {
                RenderingBounds::Rect(*render_rect).memory_size(scale)
            }
            _ => 0,
        }
    }

    /// Runs the step against the object table. `own` is the step's rendering bounds.
    pub fn execute(
        &self,
        objects: &mut RendererObjectTable,
        rendered: &mut RenderedMapTable,
        own: RenderingBounds,
        scale: Scale,
    ) {
        if self.kind.is_creator() {
            let created = self.create(objects, own, scale);
            objects.set(self.target, created);
            return;
        }
        if let StepKind::Yield { name, render_rect } = &self.kind {
            let map = objects.get(self.target).as_map(self.target);
            rendered.insert(name.clone(), HeightMap::cutout(map, *render_rect));
            return;
        }

        let mut target = objects.take(self.target);
        let snapshot = self.arguments.contains(&self.target).then(|| target.clone());
        let view: &RendererObjectTable = objects;
        let map_arg = |index: usize| {
            let slot = self.arguments[index];
            argument(view, snapshot.as_ref(), slot, self.target).as_map(slot)
        };
        let profile_arg = |index: usize| {
            let slot = self.arguments[index];
            argument(view, snapshot.as_ref(), slot, self.target).as_profile(slot)
        };

        match &mut target {
            RendererObject::Map(map) => match &self.kind {
                StepKind::MapAbs => map.abs(),
                StepKind::MapAdd { height } => map.add(*height),
                StepKind::MapAddMap => map.add_map(map_arg(0)),
                StepKind::MapAddMasked { height } => map.add_masked(*height, map_arg(0)),
                StepKind::MapAddMapMasked => map.add_map_masked(map_arg(0), map_arg(1)),
                StepKind::MapBlur { radius } => map.blur(*radius),
                StepKind::MapClampHeights { min, max } => map.clamp_heights(*min, *max),
                StepKind::MapCombine => map.combine(map_arg(0), map_arg(1)),
                StepKind::MapConvexity { radius } => map.convexity_map(*radius),
                StepKind::MapCrop { rect, height } => map.crop(*rect, *height),
                StepKind::MapCropHeights { min, max, replace } => {
                    map.crop_heights(*min, *max, *replace)
                }
                StepKind::MapDistanceMap { max_distance } => map.distance_map(*max_distance),
                StepKind::MapDistort { max_distance } => {
                    map.distort(map_arg(0), map_arg(1), *max_distance)
                }
                StepKind::MapDrawLine { start, end, height } => map.draw_line(*start, *end, *height),
                StepKind::MapFillRectangle { rect, height } => map.fill_rectangle(*rect, *height),
                StepKind::MapIntersect => map.intersect(map_arg(0)),
                StepKind::MapInvert => map.invert(),
                StepKind::MapMove { offset } => map.move_by(*offset),
                StepKind::MapMultiply { factor } => map.multiply(*factor),
                StepKind::MapMultiplyMap => map.multiply_map(map_arg(0)),
                StepKind::MapNoiseLayer {
                    wave_length,
                    amplitude,
                    seed,
                    ridged,
                } => map.noise_layer(*wave_length, *amplitude, *seed, 0, *ridged),
                StepKind::MapPattern { repeat } => map.pattern(map_arg(0), *repeat),
                StepKind::MapRescale {
                    horizontal,
                    vertical,
                } => map.rescale(*horizontal, *vertical),
                StepKind::MapResize { rect, height } => map.resize(*rect, *height),
                StepKind::MapShift {
                    max_distance,
                    direction,
                } => map.shift(profile_arg(0), *max_distance, *direction),
                StepKind::MapTransform { matrix } => map.transform(matrix, own.rect()),
                StepKind::MapTransformHeights { interval, min, max } => {
                    map.transform_heights(profile_arg(0), *interval, *min, *max)
                }
                StepKind::MapUnify => map.unify(map_arg(0)),
                other => panic!("{} cannot run on a height map", other.name()),
            },
            RendererObject::Profile(profile) => match &self.kind {
                StepKind::ProfileAbs => profile.abs(),
                StepKind::ProfileAdd { height } => profile.add(*height),
                StepKind::ProfileAddProfile => profile.add_profile(profile_arg(0)),
                StepKind::ProfileAddMasked { height } => profile.add_masked(*height, profile_arg(0)),
                StepKind::ProfileAddProfileMasked => {
                    profile.add_profile_masked(profile_arg(0), profile_arg(1))
                }
                StepKind::ProfileBlur { radius } => profile.blur(*radius),
                StepKind::ProfileClampHeights { min, max } => profile.clamp_heights(*min, *max),
                StepKind::ProfileCombine => profile.combine(profile_arg(0), profile_arg(1)),
                StepKind::ProfileCrop { interval, height } => profile.crop(*interval, *height),
                StepKind::ProfileCropHeights { min, max, replace } => {
                    profile.crop_heights(*min, *max, *replace)
                }
                StepKind::ProfileFillInterval { interval, height } => {
                    profile.fill_interval(*interval, *height)
                }
                StepKind::ProfileFlip => profile.flip(),
                StepKind::ProfileIntersect => profile.intersect(profile_arg(0)),
                StepKind::ProfileInvert => profile.invert(),
                StepKind::ProfileMove { offset } => profile.move_by(*offset),
                StepKind::ProfileMultiply { factor } => profile.multiply(*factor),
                StepKind::ProfileMultiplyProfile => profile.multiply_profile(profile_arg(0)),
                StepKind::ProfileNoiseLayer {
                    wave_length,
                    amplitude,
                    seed,
                } => profile.noise_layer(*wave_length, *amplitude, *seed, 0),
                StepKind::ProfilePattern { repeat } => profile.pattern(profile_arg(0), *repeat),
                StepKind::ProfileRescale { scale } => profile.rescale(*scale),
                StepKind::ProfileResize { interval, height } => profile.resize(*interval, *height),
                StepKind::ProfileUnify => profile.unify(profile_arg(0)),
                other => panic!("{} cannot run on a height profile", other.name()),
            },
        }
        objects.set(self.target, target);
    }

    fn create(&self, objects: &RendererObjectTable, own: RenderingBounds, scale: Scale) -> RendererObject {
        let new_map = || HeightMap::new(own.rect(), 0, scale);
        let new_profile = || HeightProfile::for_logical(own.interval(), 0, scale);
        match &self.kind {
            StepKind::MapFlat { height } => {
                RendererObject::Map(HeightMap::new(own.rect(), *height, scale))
            }
            StepKind::MapNoise { layers, seed } => {
                let mut map = new_map();
                map.noise(layers, *seed);
                RendererObject::Map(map)
            }
            StepKind::MapGradient {
                source,
                destination,
                from,
                to,
            } => {
                let mut map = new_map();
                map.gradient(*source, *destination, *from, *to);
                RendererObject::Map(map)
            }
            StepKind::MapRadialGradient {
                center,
                radius,
                from,
                to,
            } => {
                let mut map = new_map();
                map.radial_gradient(*center, *radius, *from, *to);
                RendererObject::Map(map)
            }
            StepKind::MapProjection { direction } => {
                let slot = self.arguments[0];
                let mut map = new_map();
                map.projection(objects.get(slot).as_profile(slot), *direction);
                RendererObject::Map(map)
            }
            StepKind::MapClone => {
                let slot = self.arguments[0];
                let source = objects.get(slot).as_map(slot);
                RendererObject::Map(HeightMap::cutout(source, own.rect()))
            }
            StepKind::ProfileFlat { height } => {
                RendererObject::Profile(HeightProfile::for_logical(own.interval(), *height, scale))
            }
            StepKind::ProfileGradient {
                source,
                destination,
                from,
                to,
            } => {
                let mut profile = new_profile();
                profile.gradient(*source, *destination, *from, *to, true);
                RendererObject::Profile(profile)
            }
            StepKind::ProfileFromArray { keys } => {
                let mut profile = new_profile();
                profile.from_array(keys);
                RendererObject::Profile(profile)
            }
            StepKind::ProfileNoise { layers, seed } => {
                let mut profile = new_profile();
                profile.noise(layers, *seed);
                RendererObject::Profile(profile)
            }
            StepKind::ProfileSlice {
                direction,
                coordinate,
            } => {
                let slot = self.arguments[0];
                let mut profile = new_profile();
                profile.slice(objects.get(slot).as_map(slot), *direction, *coordinate);
                RendererObject::Profile(profile)
            }
            StepKind::ProfileClone => {
                let slot = self.arguments[0];
                let source = objects.get(slot).as_profile(slot);
                RendererObject::Profile(HeightProfile::cutout(
                    source,
                    own.interval().scaled(scale),
                ))
            }
            other => panic!("{} is not a creator", other.name()),
        }
    }
}

impl fmt::Display for RenderingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.kind.name(), self.target)?;
        if !self.arguments.is_empty() {
            let args: Vec<String> = self.arguments.iter().map(ToString::to_string).collect();
            write!(f, " ({})", args.join(", "))?;
        }
        write!(f, " at {}", self.location)
    }
}

/// Argument object, reading the pre-step copy when the argument is the target itself.
fn argument<'a>(
    objects: &'a RendererObjectTable,
    snapshot: Option<&'a RendererObject>,
    slot: usize,
    target: usize,
) -> &'a RendererObject {
    match snapshot {
        Some(copy) if slot == target => copy,
        _ => objects.get(slot),
    }
}

fn interval_from_bounds(start: f64, end: f64) -> Interval {
    let start = start.clamp(f64::from(Coordinate::MIN), f64::from(Coordinate::MAX));
    let length = (end - start).clamp(0.0, f64::from(Size1D::MAX));
    Interval::new(start as Coordinate, length as Size1D)
}

/// Interval that becomes `interval` after scaling by `factor`.
fn unscale_interval(interval: Interval, factor: Scale) -> Interval {
    if interval.is_empty() {
        return interval;
    }
    interval_from_bounds(
        (f64::from(interval.start) / factor).floor(),
        (interval.end() as f64 / factor).ceil(),
    )
}

fn scale_interval(interval: Interval, factor: Scale) -> Interval {
    Interval::new(
        (f64::from(interval.start) * factor) as Coordinate,
        (f64::from(interval.length) * factor) as Size1D,
    )
}

fn unscale_rect(rect: Rectangle, horizontal: Scale, vertical: Scale) -> Rectangle {
    Rectangle::from_intervals(
        unscale_interval(rect.horizontal(), horizontal),
        unscale_interval(rect.vertical(), vertical),
    )
}

fn scale_rect(rect: Rectangle, horizontal: Scale, vertical: Scale) -> Rectangle {
    Rectangle::from_intervals(
        scale_interval(rect.horizontal(), horizontal),
        scale_interval(rect.vertical(), vertical),
    )
}

/// Image of `interval` under `x -> -x - 1`.
fn mirror_interval(interval: Interval) -> Interval {
    interval_from_bounds(-(interval.end() as f64), -f64::from(interval.start))
}

#[cfg(test)]
#[path = "../../tests/unit/renderer/step.rs"]
mod tests;
