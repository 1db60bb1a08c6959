//! Seeded pseudo-random stream for reproducible scenario scripts.
//!
//! The recurrence is the classic Numerical Recipes LCG,
//! `state = state * 1664525 + 1013904223 (mod 2^32)`, and every draw is
//! `state / 2^32`. Two generators created from the same seed always yield the
//! same sequence, on every platform and across process restarts.

const MULTIPLIER: u32 = 1_664_525;
const INCREMENT: u32 = 1_013_904_223;
const MODULUS: f64 = 4_294_967_296.0;

/// Added to the character sum of a seed string.
pub const SEED_BASE: u32 = 99_173;

/// Derive a numeric seed from a string: sum of its UTF-16 code units plus [`SEED_BASE`].
pub fn seed_from_str(value: &str) -> u32 {
    value
        .encode_utf16()
        .fold(SEED_BASE, |acc, unit| acc.wrapping_add(u32::from(unit)))
}

/// Linear-congruential generator over `u32` state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Generator seeded from a string identifier (see [`seed_from_str`]).
    pub fn from_key(key: &str) -> Self {
        Self::new(seed_from_str(key))
    }

    /// Next draw in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
        f64::from(self.state) / MODULUS
    }

    pub fn state(&self) -> u32 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_sums_code_units() {
        assert_eq!(seed_from_str(""), SEED_BASE);
        assert_eq!(seed_from_str("ab"), SEED_BASE + 97 + 98);
    }

    #[test]
    fn first_draw_matches_reference_recurrence() {
        let seed = seed_from_str("dx_acute_mi");
        let expected = ((u64::from(seed) * 1_664_525 + 1_013_904_223) % 4_294_967_296) as f64
            / 4_294_967_296.0;
        let mut rng = Lcg::new(seed);
        assert_eq!(rng.next_f64(), expected);
    }

    #[test]
    fn same_key_same_stream() {
        let mut a = Lcg::from_key("dx_stroke");
        let mut b = Lcg::from_key("dx_stroke");
        for _ in 0..32 {
            assert_eq!(a.next_f64(), b.next_f64());
        }
    }

    #[test]
    fn different_keys_diverge() {
        let mut a = Lcg::from_key("dx_stroke");
        let mut b = Lcg::from_key("dx_legionella");
        assert_ne!(a.next_f64(), b.next_f64());
    }
}
