use std::collections::BTreeMap;

use crate::foundation::geometry::Size1D;
use crate::foundation::number::{HEIGHT_MAX, Height};

/// Wave length to amplitude table driving multi-octave noise.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NoiseLayers {
    layers: BTreeMap<Size1D, Height>,
}

impl NoiseLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Octaves at every power of two up to `max_wave_length`. The longest wave gets half the
    /// height range and each shorter octave is attenuated by `persistence`.
    pub fn with_persistence(max_wave_length: Size1D, persistence: f64) -> Self {
        let mut layers = BTreeMap::new();
        let mut wave_length = max_wave_length.max(1).next_power_of_two();
        if wave_length > max_wave_length.max(1) {
            wave_length /= 2;
        }
        let mut amplitude = f64::from(HEIGHT_MAX) / 2.0;
        while wave_length >= 1 && amplitude >= 1.0 {
            layers.insert(wave_length, amplitude as Height);
            amplitude *= persistence;
            wave_length /= 2;
        }
        Self { layers }
    }

    /// Default octave set used when a script does not specify one.
    pub fn standard() -> Self {
        Self::with_persistence(256, 0.5)
    }

    pub fn insert(&mut self, wave_length: Size1D, amplitude: Height) {
        self.layers.insert(wave_length, amplitude);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layers in ascending wave length order.
    pub fn iter(&self) -> impl Iterator<Item = (Size1D, Height)> + '_ {
        self.layers.iter().map(|(&w, &a)| (w, a))
    }

    /// Longest wave length, 0 when empty.
    pub fn max_wave_length(&self) -> Size1D {
        self.layers.keys().next_back().copied().unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/genlib/noise.rs"]
mod tests;
