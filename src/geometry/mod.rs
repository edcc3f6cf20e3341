//! Minkowski-space numerics for the hyperboloid model.
//!
//! Points live on the upper sheet of the two-sheeted unit hyperboloid
//! `{v : ⟨v, v⟩_M = −1, v[d−1] > 0}`, where `⟨·,·⟩_M` is the Minkowski
//! bilinear form with the *last* coordinate time-like. Training moves points
//! along geodesics via the exponential map.

mod vector;

pub use vector::{distance, minkowski_dot, ManifoldVector};
