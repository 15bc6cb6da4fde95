//! Deterministic seeding and randomness sources.
//!
//! `hash_seed` + `XorShift32` make word masking reproducible for a given
//! (level, roll) pair. `RandomSource` is the seam for real dice rolls and deck
//! shuffles: `OsRandom` reads the platform source (`crypto.getRandomValues` in
//! the browser), `XorShift32` doubles as a scripted source in tests.

/// Seed used when a hash folds to zero (xorshift has no zero state).
const ZERO_SEED_FALLBACK: u32 = 123_456_789;

/// FNV-1a fold over the UTF-16 code units of `s`.
pub fn hash_seed(s: &str) -> u32 {
    let mut h: u32 = 2_166_136_261;
    for unit in s.encode_utf16() {
        h ^= unit as u32;
        h = h.wrapping_mul(16_777_619);
    }
    h
}

/// xorshift32 stream. Same seed, same sequence.
#[derive(Clone, Debug)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    pub fn new(seed: u32) -> Self {
        let state = if seed == 0 { ZERO_SEED_FALLBACK } else { seed };
        Self { state }
    }

    pub fn from_str_seed(seed: &str) -> Self {
        Self::new(hash_seed(seed))
    }

    pub fn next_raw(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform float in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.next_raw() as f64 / 4_294_967_296.0
    }
}

/// Source of non-deterministic integers for dice and shuffles.
pub trait RandomSource {
    fn next_u32(&mut self) -> u32;

    /// Uniform integer in `0..upper` (rejection sampled, no modulo bias).
    fn below(&mut self, upper: u32) -> u32 {
        if upper <= 1 {
            return 0;
        }
        let zone = u32::MAX - (u32::MAX % upper);
        loop {
            let v = self.next_u32();
            if v < zone {
                return v % upper;
            }
        }
    }

    /// Uniform integer in `1..=20`.
    fn roll_d20(&mut self) -> u8 {
        (self.below(20) + 1) as u8
    }
}

impl RandomSource for XorShift32 {
    fn next_u32(&mut self) -> u32 {
        self.next_raw()
    }
}

/// Platform randomness via `getrandom`.
#[derive(Debug, Clone)]
pub struct OsRandom {
    fallback: XorShift32,
}

impl Default for OsRandom {
    fn default() -> Self {
        Self { fallback: XorShift32::new(ZERO_SEED_FALLBACK) }
    }
}

impl RandomSource for OsRandom {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        if let Err(e) = getrandom::getrandom(&mut buf) {
            // Dice never fail in front of the user; fall back to the local stream.
            log::warn!("random source unavailable: {}", e);
            return self.fallback.next_raw();
        }
        u32::from_le_bytes(buf)
    }
}

/// Fisher-Yates shuffle in place.
pub fn shuffle<T>(items: &mut [T], rng: &mut dyn RandomSource) {
    for i in (1..items.len()).rev() {
        let j = rng.below(i as u32 + 1) as usize;
        items.swap(i, j);
    }
}
