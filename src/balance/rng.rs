//! Seeded PRNG for team balancing. Linear congruential generator with the classic
//! `(seed * 9301 + 49297) % 233280` step; each draw is the new state scaled into `[0, 1)`.
//! Deterministic: same seed produces the same sequence. Not cryptographically secure.

const LCG_MULTIPLIER: u64 = 9301;
const LCG_INCREMENT: u64 = 49297;
const LCG_MODULUS: u64 = 233_280;

#[derive(Debug, Clone, Copy)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed % LCG_MODULUS,
        }
    }

    /// Returns the next value in `[0, 1)`.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS;
        self.state as f64 / LCG_MODULUS as f64
    }

    /// Uniform index in `0..bound`. `bound` must be non-zero.
    #[inline]
    pub fn next_index(&mut self, bound: usize) -> usize {
        let index = (self.next_f64() * bound as f64) as usize;
        index.min(bound - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcg_deterministic() {
        let mut a = Lcg::new(7);
        let mut b = Lcg::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn lcg_different_seeds_differ() {
        let mut a = Lcg::new(1);
        let mut b = Lcg::new(2);
        assert_ne!(a.next_f64(), b.next_f64());
    }

    #[test]
    fn lcg_first_draw_matches_recurrence() {
        let mut rng = Lcg::new(1);
        let expected = ((9301 + 49297) % 233_280) as f64 / 233_280.0;
        assert_eq!(rng.next_f64(), expected);
    }

    #[test]
    fn lcg_draws_stay_in_unit_interval() {
        let mut rng = Lcg::new(u64::MAX);
        for _ in 0..10_000 {
            let value = rng.next_f64();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn next_index_stays_in_bounds() {
        let mut rng = Lcg::new(99);
        for bound in 1..20 {
            assert!(rng.next_index(bound) < bound);
        }
    }
}
