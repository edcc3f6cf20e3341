//! Embedding export and epoch checkpoints.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};
use crate::geometry::ManifoldVector;
use crate::vocab::{Vocabulary, WordId};

/// Write the embedding table to `<prefix>.csv`: one line per word in
/// vocabulary id order, the word followed by the coordinates, single-space
/// separated. Coordinates carry 17 fractional digits so a reload
/// reconstructs them exactly.
pub fn save_embeddings(
    prefix: &str,
    vocab: &Vocabulary,
    embeddings: &[Mutex<ManifoldVector>],
) -> Result<()> {
    let path = format!("{prefix}.csv");
    let file = File::create(&path).map_err(|source| Error::CreateOutput {
        path: path.clone(),
        source,
    })?;
    let mut out = BufWriter::new(file);
    for id in 0..vocab.n_words() {
        let vector = embeddings[id]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        out.write_all(vocab.word(id as WordId))?;
        for i in 0..vector.dim() {
            write!(out, " {:.17}", vector[i])?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

/// Writes interval checkpoints of the embedding table during the main
/// training epochs. Disabled when the interval is ≤ 0; burn-in never
/// checkpoints.
pub struct Checkpointer {
    interval: i32,
    prefix: String,
}

impl Checkpointer {
    pub fn new(interval: i32, prefix: &str) -> Self {
        Self {
            interval,
            prefix: prefix.to_string(),
        }
    }

    /// Checkpoint file prefix for an epoch count; zero-padding keeps the
    /// files lexicographically ordered.
    fn prefix_for(&self, epochs_trained: u32) -> String {
        format!("{}-after-{:06}-epochs", self.prefix, epochs_trained)
    }

    /// Called at the start of each main epoch; writes when the epoch lands
    /// on the interval.
    pub fn at_epoch_start(
        &self,
        epoch: u32,
        vocab: &Vocabulary,
        embeddings: &[Mutex<ManifoldVector>],
    ) -> Result<()> {
        if self.interval > 0 && epoch % self.interval as u32 == 0 {
            save_embeddings(&self.prefix_for(epoch), vocab, embeddings)?;
        }
        Ok(())
    }

    /// Called once after the last main epoch; writes regardless of where
    /// the interval fell.
    pub fn after_last_epoch(
        &self,
        epochs_trained: u32,
        vocab: &Vocabulary,
        embeddings: &[Mutex<ManifoldVector>],
    ) -> Result<()> {
        if self.interval > 0 {
            save_embeddings(&self.prefix_for(epochs_trained), vocab, embeddings)?;
        }
        Ok(())
    }
}
