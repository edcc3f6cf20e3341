//! Parallel Riemannian-SGD training loop.
//!
//! The [`Trainer`] owns the embedding table as a sequence of
//! `Mutex<ManifoldVector>`: the per-word lock and the vector it guards are
//! one value, so no code path can reach an embedding without holding its
//! lock. Each epoch fans out scoped worker threads over disjoint byte
//! shards of the corpus; workers only ever *try* to lock, dropping a
//! (source, context) pair on contention, which keeps the protocol
//! deadlock-free without any lock ordering.

mod model;
mod negative;
mod rng;
mod schedule;

use std::fs::File;
use std::io::BufReader;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Instant;

use rand_distr::Normal;

use crate::config::Args;
use crate::error::{Error, Result};
use crate::geometry::ManifoldVector;
use crate::output::{save_embeddings, Checkpointer};
use crate::vocab::{CorpusReader, Vocabulary, WordId};

pub use model::Model;
pub use negative::{NegativeTable, NEGATIVE_TABLE_SIZE};
pub use rng::MinstdRng;
pub use schedule::LinearSchedule;

/// Lines between progress reports on thread 0.
const REPORTING_INTERVAL: u64 = 50;

/// Coordinates vocabulary construction, embedding initialization, and the
/// epoch loops.
pub struct Trainer {
    args: Args,
    vocab: Vocabulary,
    negatives: NegativeTable,
    embeddings: Vec<Mutex<ManifoldVector>>,
}

/// The lock set for one skip-gram example. `samples[0]` is the positive
/// context, the rest are negatives. Field order matters: dropping releases
/// the samples before the source.
struct LockedSamples<'a> {
    samples: Vec<MutexGuard<'a, ManifoldVector>>,
    source: MutexGuard<'a, ManifoldVector>,
}

impl Trainer {
    /// Build the vocabulary and negative table from the corpus and draw the
    /// initial embeddings around the hyperboloid basepoint.
    pub fn new(args: Args) -> Result<Self> {
        let file = File::open(&args.input).map_err(|source| Error::OpenInput {
            path: args.input.clone(),
            source,
        })?;
        let mut reader = CorpusReader::new(BufReader::new(file));
        let vocab = Vocabulary::from_corpus(&mut reader, args.min_count, args.subsample_t)?;

        let negatives = NegativeTable::with_target_len(
            &vocab.counts(),
            args.distribution_power,
            args.negative_table_size,
        );

        let noise = Normal::new(0.0, args.init_std_dev)
            .map_err(|_| Error::InvalidParameter("-init-std-dev must be positive".to_string()))?;
        let mut rng = MinstdRng::new(i64::from(args.seed));
        let embeddings = (0..vocab.n_words())
            .map(|_| {
                let mut vector = ManifoldVector::new(args.dimension);
                vector.random_hyperboloid_point(&mut rng, &noise);
                Mutex::new(vector)
            })
            .collect();

        Ok(Self {
            args,
            vocab,
            negatives,
            embeddings,
        })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn embeddings(&self) -> &[Mutex<ManifoldVector>] {
        &self.embeddings
    }

    /// Run burn-in, the main epochs, and the final export.
    pub fn train(&self) -> Result<()> {
        let seed = i64::from(self.args.seed);

        let burnin_schedule =
            LinearSchedule::new(self.args.burnin_lr, self.args.burnin_lr, self.args.burnin_epochs);
        self.run_epochs(self.args.burnin_epochs, seed, burnin_schedule, true, None)?;

        // A different seed base so the main phase draws different negative
        // sequences than burn-in.
        let checkpointer = Checkpointer::new(self.args.checkpoint_interval, &self.args.output);
        let schedule =
            LinearSchedule::new(self.args.start_lr, self.args.end_lr, self.args.epochs);
        self.run_epochs(self.args.epochs, -seed, schedule, false, Some(&checkpointer))?;

        save_embeddings(&self.args.output, &self.vocab, &self.embeddings)
    }

    fn run_epochs(
        &self,
        epochs: u32,
        seed_base: i64,
        schedule: LinearSchedule,
        burnin: bool,
        checkpointer: Option<&Checkpointer>,
    ) -> Result<()> {
        for epoch in 0..epochs {
            if let Some(cp) = checkpointer {
                cp.at_epoch_start(epoch, &self.vocab, &self.embeddings)?;
            }
            eprintln!("Epoch: {} / {}", epoch + 1, epochs);
            let (epoch_start_lr, epoch_end_lr) = schedule.epoch_endpoints(epoch);
            thread::scope(|scope| -> Result<()> {
                let mut workers = Vec::with_capacity(self.args.threads);
                for thread_id in 0..self.args.threads {
                    let worker_seed = seed_base
                        + i64::from(epoch) * self.args.threads as i64
                        + thread_id as i64;
                    workers.push(scope.spawn(move || {
                        self.epoch_worker(thread_id, worker_seed, epoch_start_lr, epoch_end_lr, burnin)
                    }));
                }
                for worker in workers {
                    match worker.join() {
                        Ok(result) => result?,
                        Err(panic) => std::panic::resume_unwind(panic),
                    }
                }
                Ok(())
            })?;
        }
        if let Some(cp) = checkpointer {
            cp.after_last_epoch(epochs, &self.vocab, &self.embeddings)?;
        }
        Ok(())
    }

    /// One worker's pass over its shard of the corpus for one epoch.
    fn epoch_worker(
        &self,
        thread_id: usize,
        seed: i64,
        start_lr: f64,
        end_lr: f64,
        burnin: bool,
    ) -> Result<()> {
        let mut rng = MinstdRng::new(seed);
        let file = File::open(&self.args.input).map_err(|source| Error::OpenInput {
            path: self.args.input.clone(),
            source,
        })?;
        let file_size = file.metadata()?.len();
        let mut reader = CorpusReader::new(BufReader::new(file));
        reader.seek_to(thread_id as u64 * file_size / self.args.threads as u64)?;

        let mut model = Model::new(self.args.dimension, self.args.max_step_size);
        let mut num_negatives = self.args.number_negatives;
        if burnin {
            num_negatives /= 10; // as per Nickel & Kiela
        }

        let token_budget = self.vocab.n_tokens() / self.args.threads as u64;
        let mut token_count: u64 = 0;
        let mut line_count: u64 = 0;
        let mut line: Vec<WordId> = Vec::new();
        let start = Instant::now();
        let mut lr = start_lr;
        let mut progress = 0.0;
        while token_count < token_budget {
            token_count += self.vocab.get_line(&mut reader, &mut line, &mut rng)?;
            progress = (token_count as f64 / token_budget as f64).min(1.0);
            lr = (1.0 - progress) * start_lr + progress * end_lr;
            self.skipgram(&mut model, lr, &line, num_negatives, &mut rng);
            if thread_id == 0 && line_count % REPORTING_INTERVAL == 0 {
                print_progress(start, progress, token_count, lr, model.get_performance());
            }
            line_count += 1;
        }
        if thread_id == 0 {
            print_progress(start, progress, token_count, lr, model.get_performance());
            eprintln!();
        }
        Ok(())
    }

    /// Sweep the skip-gram window over one line, training every (source,
    /// context) pair whose lock set can be obtained without waiting.
    fn skipgram(
        &self,
        model: &mut Model,
        lr: f64,
        line: &[WordId],
        num_negatives: usize,
        rng: &mut MinstdRng,
    ) {
        let window = self.args.window_size as isize;
        for w in 0..line.len() as isize {
            for c in -window..=window {
                if c == 0 || w + c < 0 || w + c >= line.len() as isize {
                    continue;
                }
                let source = line[w as usize];
                let target = line[(w + c) as usize];
                let Some(mut locked) = self.obtain_vectors(source, target, num_negatives, rng)
                else {
                    // couldn't obtain one of the necessary locks, so skip
                    continue;
                };
                model.log_bilinear_negative_sampling(&mut locked.source, &mut locked.samples, lr);
            }
        }
    }

    /// Try-lock the source and target, then draw and try-lock negatives
    /// until the sample list is full. Any failure on source or target drops
    /// the pair; a failed negative draw is simply retried with a fresh
    /// candidate. Held locks cannot be reacquired, so the negatives are
    /// distinct from each other, the target, and the source.
    fn obtain_vectors(
        &self,
        source: WordId,
        target: WordId,
        num_negatives: usize,
        rng: &mut MinstdRng,
    ) -> Option<LockedSamples<'_>> {
        let source_guard = self.embeddings[source as usize].try_lock().ok()?;
        let Ok(target_guard) = self.embeddings[target as usize].try_lock() else {
            return None;
        };
        let mut samples = Vec::with_capacity(num_negatives + 1);
        samples.push(target_guard);
        while samples.len() < num_negatives + 1 {
            let negative = self.negatives.sample_excluding(target, rng);
            if let Ok(guard) = self.embeddings[negative as usize].try_lock() {
                samples.push(guard);
            }
        }
        Some(LockedSamples {
            samples,
            source: source_guard,
        })
    }
}

fn print_progress(start: Instant, progress: f64, token_count: u64, lr: f64, performance: f64) {
    let elapsed = start.elapsed().as_secs_f64();
    let words_per_sec = if elapsed > 0.0 {
        token_count as f64 / elapsed
    } else {
        0.0
    };
    eprint!(
        "\rProgress: {:5.1}%  words/sec/thread: {:8.0}  lr: {:8.6}  objective: {:8.6}",
        100.0 * progress,
        words_per_sec,
        lr,
        performance
    );
}
