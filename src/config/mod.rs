//! Training configuration and command-line parsing.
//!
//! The binary takes order-independent `-name value` flag pairs; `-input`
//! and `-output` are required. Every parse failure routes through
//! [`ConfigError`] so the binary can print the help text and exit non-zero
//! before any training work starts.

use std::str::FromStr;

use thiserror::Error;

use crate::train::NEGATIVE_TABLE_SIZE;

/// Configuration-stage errors: these print the help text and abort.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("help requested")]
    HelpRequested,

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for {0}")]
    MissingValue(&'static str),

    #[error("invalid value for {flag}: {value}")]
    InvalidValue { flag: &'static str, value: String },

    #[error("missing required flag: {0}")]
    MissingRequired(&'static str),
}

/// The full training configuration.
#[derive(Debug, Clone)]
pub struct Args {
    /// Training corpus path.
    pub input: String,
    /// Output prefix; the final file is `<prefix>.csv`.
    pub output: String,
    /// Ambient Minkowski dimension.
    pub dimension: usize,
    /// Main training epochs.
    pub epochs: u32,
    /// Burn-in epochs at a fixed learning rate.
    pub burnin_epochs: u32,
    pub start_lr: f64,
    pub end_lr: f64,
    pub burnin_lr: f64,
    /// Clip on the geodesic step length.
    pub max_step_size: f64,
    /// Skip-gram half-window.
    pub window_size: usize,
    /// Minimum occurrence count for vocabulary words.
    pub min_count: u64,
    /// Subsampling threshold (`-t`); ≤ 0 disables subsampling.
    pub subsample_t: f64,
    /// Negatives per positive example (divided by 10 during burn-in).
    pub number_negatives: usize,
    /// Negative-sampling smoothing exponent α.
    pub distribution_power: f64,
    /// Standard deviation of the initial hyperbolic radius.
    pub init_std_dev: f64,
    /// Worker thread count.
    pub threads: usize,
    pub seed: i32,
    /// Epochs between checkpoints; ≤ 0 disables checkpointing.
    pub checkpoint_interval: i32,
    /// Slot count for the negative-sampling table. Not exposed as a flag;
    /// tests shrink it to keep fixtures small.
    pub negative_table_size: usize,
}

impl Args {
    /// Defaults with the two required paths filled in.
    pub fn with_required(input: &str, output: &str) -> Self {
        Self {
            input: input.to_string(),
            output: output.to_string(),
            dimension: 100,
            epochs: 5,
            burnin_epochs: 0,
            start_lr: 0.05,
            end_lr: 0.05,
            burnin_lr: 0.05,
            max_step_size: 2.0,
            window_size: 5,
            min_count: 5,
            subsample_t: 1e-4,
            number_negatives: 5,
            distribution_power: 0.5,
            init_std_dev: 0.1,
            threads: 12,
            seed: 1,
            checkpoint_interval: -1,
            negative_table_size: NEGATIVE_TABLE_SIZE,
        }
    }

    /// Parse `-name value` pairs. The iterator should not include the
    /// program name.
    pub fn parse_from<I>(argv: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut it = argv.into_iter();
        let mut input: Option<String> = None;
        let mut output: Option<String> = None;
        let mut args = Self::with_required("", "");
        while let Some(flag) = it.next() {
            match flag.as_str() {
                "-h" => return Err(ConfigError::HelpRequested),
                "-input" => input = Some(require_value(&mut it, "-input")?),
                "-output" => output = Some(require_value(&mut it, "-output")?),
                "-dimension" => args.dimension = parse_value("-dimension", &mut it)?,
                "-epochs" => args.epochs = parse_value("-epochs", &mut it)?,
                "-burnin-epochs" => args.burnin_epochs = parse_value("-burnin-epochs", &mut it)?,
                "-start-lr" => args.start_lr = parse_value("-start-lr", &mut it)?,
                "-end-lr" => args.end_lr = parse_value("-end-lr", &mut it)?,
                "-burnin-lr" => args.burnin_lr = parse_value("-burnin-lr", &mut it)?,
                "-max-step-size" => args.max_step_size = parse_value("-max-step-size", &mut it)?,
                "-window-size" => args.window_size = parse_value("-window-size", &mut it)?,
                "-min-count" => args.min_count = parse_value("-min-count", &mut it)?,
                "-t" => args.subsample_t = parse_value("-t", &mut it)?,
                "-number-negatives" => {
                    args.number_negatives = parse_value("-number-negatives", &mut it)?;
                }
                "-distribution-power" => {
                    args.distribution_power = parse_value("-distribution-power", &mut it)?;
                }
                "-init-std-dev" => args.init_std_dev = parse_value("-init-std-dev", &mut it)?,
                "-threads" => args.threads = parse_value("-threads", &mut it)?,
                "-seed" => args.seed = parse_value("-seed", &mut it)?,
                "-checkpoint-interval" => {
                    args.checkpoint_interval = parse_value("-checkpoint-interval", &mut it)?;
                }
                _ => return Err(ConfigError::UnknownFlag(flag)),
            }
        }
        args.input = input.ok_or(ConfigError::MissingRequired("-input"))?;
        args.output = output.ok_or(ConfigError::MissingRequired("-output"))?;
        args.validate()?;
        Ok(args)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.dimension < 2 {
            return Err(ConfigError::InvalidValue {
                flag: "-dimension",
                value: format!("{} (must be at least 2)", self.dimension),
            });
        }
        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                flag: "-threads",
                value: "0 (must be at least 1)".to_string(),
            });
        }
        if !(self.init_std_dev > 0.0) {
            return Err(ConfigError::InvalidValue {
                flag: "-init-std-dev",
                value: format!("{} (must be positive)", self.init_std_dev),
            });
        }
        Ok(())
    }

    /// Print usage to standard error.
    pub fn print_help() {
        eprintln!(
            "usage: incrustar -input <path> -output <path> [options]

Train hyperbolic word embeddings on the Minkowski hyperboloid.

required:
  -input               training corpus (whitespace-tokenized text)
  -output              output prefix (the final file is <prefix>.csv)

options:
  -dimension           ambient Minkowski dimension [100]
  -epochs              main training epochs [5]
  -burnin-epochs       burn-in epochs [0]
  -start-lr            learning rate at the start of training [0.05]
  -end-lr              learning rate at the end of training [0.05]
  -burnin-lr           fixed learning rate during burn-in [0.05]
  -max-step-size       clip on the geodesic step length [2.0]
  -window-size         skip-gram half-window [5]
  -min-count           minimum word occurrence count [5]
  -t                   subsampling threshold, 0 disables [1e-4]
  -number-negatives    negatives per positive, /10 in burn-in [5]
  -distribution-power  negative-sampling exponent [0.5]
  -init-std-dev        std-dev of the initial hyperbolic radius [0.1]
  -threads             worker threads [12]
  -seed                RNG seed [1]
  -checkpoint-interval epochs between checkpoints, <=0 disables [-1]
  -h                   print this help and exit"
        );
    }
}

fn require_value<I>(it: &mut I, flag: &'static str) -> Result<String, ConfigError>
where
    I: Iterator<Item = String>,
{
    it.next().ok_or(ConfigError::MissingValue(flag))
}

fn parse_value<T, I>(flag: &'static str, it: &mut I) -> Result<T, ConfigError>
where
    T: FromStr,
    I: Iterator<Item = String>,
{
    let value = require_value(it, flag)?;
    value.parse().map_err(|_| ConfigError::InvalidValue {
        flag,
        value,
    })
}
