use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::foundation::geometry::Point;

/// Seed accepted by every random source.
pub type RandomSeed = u32;

fn int_in_range(bits: u64, min: i64, max: i64) -> i64 {
    debug_assert!(min <= max);
    let span = (max - min) as u64 + 1;
    min + (bits % span) as i64
}

/// Sequential generator (splitmix64) used for script-level randomness and seed derivation.
#[derive(Clone, Debug)]
pub struct RandomSequence {
    state: u64,
}

impl RandomSequence {
    pub fn new(seed: RandomSeed) -> Self {
        Self {
            state: u64::from(seed) ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    pub fn next_seed(&mut self) -> RandomSeed {
        (self.next_u64() >> 32) as RandomSeed
    }

    /// Uniform integer in `[min, max]`.
    pub fn next_int(&mut self, min: i64, max: i64) -> i64 {
        int_in_range(self.next_u64(), min, max)
    }

    /// Uniform value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Mixes a script-supplied seed with the run's global seed.
pub fn combine_seeds(local: RandomSeed, global: RandomSeed) -> RandomSeed {
    let mut key = [0u8; 8];
    key[..4].copy_from_slice(&local.to_le_bytes());
    key[4..].copy_from_slice(&global.to_le_bytes());
    (xxh3_64_with_seed(&key, 0) >> 32) as RandomSeed
}

/// Coordinate-addressed generator: the value at a lattice point depends only on
/// `(seed, step, point)`, never on evaluation order.
#[derive(Clone, Copy, Debug)]
pub struct RandomSequence2D {
    seed: RandomSeed,
    step: u32,
}

impl RandomSequence2D {
    pub fn new(seed: RandomSeed, step: u32) -> Self {
        Self { seed, step }
    }

    pub fn step(self) -> u32 {
        self.step
    }

    /// Moves to an independent sub-sequence.
    pub fn advance(&mut self) {
        self.step = self.step.wrapping_add(1);
    }

    pub fn get_u64(self, point: Point) -> u64 {
        let mut key = [0u8; 12];
        key[..4].copy_from_slice(&self.step.to_le_bytes());
        key[4..8].copy_from_slice(&point.x.to_le_bytes());
        key[8..].copy_from_slice(&point.y.to_le_bytes());
        xxh3_64_with_seed(&key, u64::from(self.seed))
    }

    /// Integer in `[min, max]` attached to `point`.
    pub fn get_int(self, point: Point, min: i64, max: i64) -> i64 {
        int_in_range(self.get_u64(point), min, max)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/random.rs"]
mod tests;
