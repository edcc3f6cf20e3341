//! Precomputed negative-sampling table.

use rand::RngCore;

use crate::vocab::WordId;

/// Target slot count for the full-size table.
pub const NEGATIVE_TABLE_SIZE: usize = 100_000_000;

/// Word ids replicated proportionally to `count^power`; drawing uniformly
/// from the table samples the smoothed unigram distribution.
pub struct NegativeTable {
    table: Vec<WordId>,
}

impl NegativeTable {
    /// Build the table at the standard [`NEGATIVE_TABLE_SIZE`].
    pub fn new(counts: &[u64], power: f64) -> Self {
        Self::with_target_len(counts, power, NEGATIVE_TABLE_SIZE)
    }

    /// Build the table with an explicit target length. Each id receives
    /// `⌊len · count^power / Σ count^power⌋` slots, so the table may come
    /// out slightly short, and ids of vanishing mass may receive zero slots
    /// and never be drawn as negatives.
    pub fn with_target_len(counts: &[u64], power: f64, target_len: usize) -> Self {
        let z: f64 = counts.iter().map(|&c| (c as f64).powf(power)).sum();
        let mut table = Vec::with_capacity(target_len);
        for (id, &count) in counts.iter().enumerate() {
            let slots = ((count as f64).powf(power) * target_len as f64 / z) as usize;
            for _ in 0..slots {
                table.push(id as WordId);
            }
        }
        Self { table }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Draw a word id uniformly from the table.
    pub fn sample<R: RngCore>(&self, rng: &mut R) -> WordId {
        self.table[rng.next_u32() as usize % self.table.len()]
    }

    /// Draw a word id that differs from `target`, by rejection.
    pub fn sample_excluding<R: RngCore>(&self, target: WordId, rng: &mut R) -> WordId {
        loop {
            let negative = self.sample(rng);
            if negative != target {
                return negative;
            }
        }
    }
}
