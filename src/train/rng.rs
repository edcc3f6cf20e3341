//! Worker-local linear-congruential generator.

use rand::RngCore;

const MULTIPLIER: u64 = 48_271;
const MODULUS: u64 = 2_147_483_647;

/// The minimal-standard LCG (`x ← 48271·x mod 2³¹−1`).
///
/// Each worker owns one; no generator state is ever shared between threads.
/// Seeds may be negative (the main training phase negates the configured
/// seed so it draws different negatives than burn-in): the seed is reduced
/// two's-complement to 32 bits, then mod 2³¹−1, with 0 mapped to 1.
#[derive(Debug, Clone)]
pub struct MinstdRng {
    state: u64,
}

impl MinstdRng {
    pub fn new(seed: i64) -> Self {
        let state = (seed as u32) as u64 % MODULUS;
        Self {
            state: if state == 0 { 1 } else { state },
        }
    }
}

impl RngCore for MinstdRng {
    fn next_u32(&mut self) -> u32 {
        self.state = self.state * MULTIPLIER % MODULUS;
        self.state as u32
    }

    fn next_u64(&mut self) -> u64 {
        u64::from(self.next_u32()) << 32 | u64::from(self.next_u32())
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_the_minstd_reference_sequence() {
        let mut rng = MinstdRng::new(1);
        assert_eq!(rng.next_u32(), 48_271);
        assert_eq!(rng.next_u32(), 182_605_794);
    }

    #[test]
    fn zero_seed_maps_to_one() {
        let mut a = MinstdRng::new(0);
        let mut b = MinstdRng::new(1);
        assert_eq!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn negative_seeds_are_reduced_not_rejected() {
        let mut rng = MinstdRng::new(-12345);
        for _ in 0..100 {
            let x = u64::from(rng.next_u32());
            assert!(x >= 1 && x < MODULUS);
        }
    }

    #[test]
    fn distinct_seeds_diverge() {
        let mut a = MinstdRng::new(2);
        let mut b = MinstdRng::new(3);
        assert_ne!(a.next_u32(), b.next_u32());
    }
}
