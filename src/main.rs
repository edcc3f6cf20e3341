//! incrustar CLI
//!
//! Single-command trainer for hyperbolic word embeddings.
//!
//! ```bash
//! incrustar -input corpus.txt -output vectors -dimension 50 -epochs 5
//! ```

use std::process::ExitCode;

use incrustar::{Args, ConfigError, Trainer};

fn main() -> ExitCode {
    let args = match Args::parse_from(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(error) => {
            if !matches!(error, ConfigError::HelpRequested) {
                eprintln!("Error: {error}");
            }
            Args::print_help();
            return ExitCode::FAILURE;
        }
    };

    let trainer = match Trainer::new(args) {
        Ok(trainer) => trainer,
        Err(error) => {
            eprintln!("Error: {error}");
            return ExitCode::FAILURE;
        }
    };

    match trainer.train() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}
