use std::collections::BTreeMap;
use std::fmt::Write as _;

use xxhash_rust::xxh3::Xxh3;

use crate::genlib::height_map::HeightMap;
use crate::genlib::height_profile::HeightProfile;

const XXH3_SEED: u64 = 0x5eed_1e1a_7e55_a11e;

/// Raster stored in a renderer slot.
#[derive(Clone, Debug, PartialEq)]
pub enum RendererObject {
    Map(HeightMap),
    Profile(HeightProfile),
}

impl RendererObject {
    /// Panics when the slot holds a profile.
    pub fn as_map(&self, slot: usize) -> &HeightMap {
        match self {
            Self::Map(map) => map,
            Self::Profile(_) => panic!("slot {slot} holds a height profile, not a height map"),
        }
    }

    /// Panics when the slot holds a map.
    pub fn as_profile(&self, slot: usize) -> &HeightProfile {
        match self {
            Self::Profile(profile) => profile,
            Self::Map(_) => panic!("slot {slot} holds a height map, not a height profile"),
        }
    }

    pub fn memory_size(&self) -> u64 {
        match self {
            Self::Map(map) => map.own_memory_size(),
            Self::Profile(profile) => HeightProfile::memory_size(profile.interval(), 1.0),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Map(map) => {
                let r = map.rectangle();
                format!(
                    "HeightMap [{}, {}; {}x{}] scale {}",
                    r.position.x, r.position.y, r.size.width, r.size.height, map.scale()
                )
            }
            Self::Profile(profile) => {
                let i = profile.interval();
                format!("HeightProfile [{}; {}] scale {}", i.start, i.length, profile.scale())
            }
        }
    }
}

/// Slot-indexed storage of intermediate rasters.
#[derive(Debug, Default)]
pub struct RendererObjectTable {
    slots: Vec<Option<RendererObject>>,
}

impl RendererObjectTable {
    pub fn new(size: usize) -> Self {
        Self {
            slots: (0..size).map(|_| None).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(Option::is_some)
    }

    /// Panics when the slot is empty.
    pub fn get(&self, slot: usize) -> &RendererObject {
        match self.slots.get(slot) {
            Some(Some(object)) => object,
            _ => panic!("renderer slot {slot} is empty"),
        }
    }

    pub fn set(&mut self, slot: usize, object: RendererObject) {
        if slot >= self.slots.len() {
            self.slots.resize_with(slot + 1, || None);
        }
        self.slots[slot] = Some(object);
    }

    /// Moves the object out of its slot. Panics when the slot is empty.
    pub fn take(&mut self, slot: usize) -> RendererObject {
        match self.slots.get_mut(slot).and_then(Option::take) {
            Some(object) => object,
            None => panic!("renderer slot {slot} is empty"),
        }
    }

    /// Frees the slot; releasing an empty slot is a no-op.
    pub fn release(&mut self, slot: usize) {
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = None;
        }
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Bytes held by every live raster.
    pub fn memory_size(&self) -> u64 {
        self.slots.iter().flatten().map(RendererObject::memory_size).sum()
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (slot, object) in self.slots.iter().enumerate() {
            let described = object
                .as_ref()
                .map(RendererObject::describe)
                .unwrap_or_else(|| "empty".to_string());
            let _ = writeln!(out, "{slot}: {described}");
        }
        out
    }
}

/// Named maps the script yielded, in name order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderedMapTable {
    maps: BTreeMap<String, HeightMap>,
}

impl RenderedMapTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a rendered map; a later yield under the same name replaces it.
    pub fn insert(&mut self, name: String, map: HeightMap) {
        self.maps.insert(name, map);
    }

    pub fn get(&self, name: &str) -> Option<&HeightMap> {
        self.maps.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeightMap)> {
        self.maps.iter().map(|(n, m)| (n.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn into_maps(self) -> BTreeMap<String, HeightMap> {
        self.maps
    }

    /// Stable digest of a map's placement and samples, for comparing renders.
    pub fn fingerprint(&self, name: &str) -> Option<u64> {
        let map = self.maps.get(name)?;
        let mut hasher = Xxh3::with_seed(XXH3_SEED);
        let r = map.rectangle();
        hasher.update(&r.position.x.to_le_bytes());
        hasher.update(&r.position.y.to_le_bytes());
        hasher.update(&r.size.width.to_le_bytes());
        hasher.update(&r.size.height.to_le_bytes());
        for h in map.heights() {
            hasher.update(&h.to_le_bytes());
        }
        Some(hasher.digest())
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (name, map) in &self.maps {
            let r = map.rectangle();
            let _ = writeln!(
                out,
                "{name}: [{}, {}; {}x{}] scale {} digest {:016x}",
                r.position.x,
                r.position.y,
                r.size.width,
                r.size.height,
                map.scale(),
                self.fingerprint(name).unwrap_or_default()
            );
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/renderer/objects.rs"]
mod tests;
