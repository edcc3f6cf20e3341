//! incrustar: hyperbolic word embeddings.
//!
//! Trains skip-gram embeddings with negative sampling where similarity is a
//! monotone transform of geodesic distance on the upper sheet of the unit
//! hyperboloid in Minkowski space. Optimization is Riemannian SGD: gradients
//! are projected onto the tangent space at each point and applied through
//! the exponential map, with worker threads updating the shared embedding
//! table under per-vector try-locks.
//!
//! # Example
//!
//! ```no_run
//! use incrustar::{Args, Trainer};
//!
//! let mut args = Args::with_required("corpus.txt", "vectors");
//! args.dimension = 20;
//! args.epochs = 5;
//! let trainer = Trainer::new(args)?;
//! trainer.train()?;
//! # Ok::<(), incrustar::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod output;
pub mod train;
pub mod vocab;

pub use config::{Args, ConfigError};
pub use error::{Error, Result};
pub use geometry::ManifoldVector;
pub use train::Trainer;
