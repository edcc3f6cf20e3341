//! Skip-gram negative-sampling objective on the hyperboloid.

use std::ops::DerefMut;

use crate::geometry::{minkowski_dot, ManifoldVector};

const SIGMOID_TABLE_SIZE: usize = 512;
const MAX_SIGMOID: f64 = 8.0;
const MIN_STEP_SIZE: f64 = 1e-10;

/// Offset added to Minkowski dot products before the sigmoid: the dot of
/// two hyperboloid points is at most −1, so scores would otherwise start
/// deep in the sigmoid's left tail.
const SHIFT: f64 = 3.0;

/// Per-worker model state: scratch gradients, the loss accumulator, and the
/// tabulated sigmoid.
///
/// The model never touches the shared embedding table itself; the trainer
/// passes in the locked entries for each example, so every update here runs
/// under locks held by the caller.
pub struct Model {
    acc_grad_source: ManifoldVector,
    grad_output: ManifoldVector,
    performance: f64,
    n_examples: u64,
    max_step_size: f64,
    sigmoid_table: Vec<f64>,
}

impl Model {
    pub fn new(dimension: usize, max_step_size: f64) -> Self {
        let sigmoid_table = (0..=SIGMOID_TABLE_SIZE)
            .map(|i| {
                let x = (i * 2) as f64 * MAX_SIGMOID / SIGMOID_TABLE_SIZE as f64 - MAX_SIGMOID;
                1.0 / (1.0 + (-x).exp())
            })
            .collect();
        Self {
            acc_grad_source: ManifoldVector::new(dimension),
            grad_output: ManifoldVector::new(dimension),
            performance: 0.0,
            n_examples: 1,
            max_step_size,
            sigmoid_table,
        }
    }

    /// Tabulated sigmoid; clamps to 0/1 outside `[−8, 8]`.
    pub fn sigmoid(&self, x: f64) -> f64 {
        if x < -MAX_SIGMOID {
            0.0
        } else if x > MAX_SIGMOID {
            1.0
        } else {
            let i = ((x + MAX_SIGMOID) * SIGMOID_TABLE_SIZE as f64 / MAX_SIGMOID / 2.0) as usize;
            self.sigmoid_table[i]
        }
    }

    /// One binary-logistic example against `target`, with the given label.
    ///
    /// Accumulates the (ambient, unprojected) source gradient into the
    /// scratch accumulator and applies the tangent-projected update to
    /// `target` immediately. Returns the example's negative log-likelihood.
    pub fn binary_logistic(
        &mut self,
        source: &ManifoldVector,
        target: &mut ManifoldVector,
        label: bool,
        lr: f64,
    ) -> f64 {
        let score = self.sigmoid(minkowski_dot(source, target) + SHIFT);
        let delta = if label { 1.0 } else { 0.0 } - score;

        self.acc_grad_source.add_scaled(target, delta);

        self.grad_output.assign(source);
        self.grad_output.scale(lr * delta);
        self.grad_output.project_onto_tangent_space(target);
        apply_update(target, &mut self.grad_output, self.max_step_size);

        if label {
            -(score + 1e-8).ln()
        } else {
            -(1.0 - score + 1e-8).ln()
        }
    }

    /// One skip-gram example: `samples[0]` is the positive context, the rest
    /// are negatives. The caller must hold the locks on the source vector
    /// and on every sample vector.
    pub fn log_bilinear_negative_sampling<T>(
        &mut self,
        source: &mut ManifoldVector,
        samples: &mut [T],
        lr: f64,
    ) where
        T: DerefMut<Target = ManifoldVector>,
    {
        self.acc_grad_source.zero();
        for (n, sample) in samples.iter_mut().enumerate() {
            let loss = self.binary_logistic(source, sample, n == 0, lr);
            self.performance += loss;
        }
        self.n_examples += 1;

        self.acc_grad_source.scale(lr);
        self.acc_grad_source.project_onto_tangent_space(source);
        apply_update(source, &mut self.acc_grad_source, self.max_step_size);
    }

    /// Average loss per example since the last call; resets the
    /// accumulators, so this is not idempotent.
    pub fn get_performance(&mut self) -> f64 {
        let avg = self.performance / self.n_examples as f64;
        self.performance = 0.0;
        self.n_examples = 1;
        avg
    }
}

/// Move `point` along the geodesic in the direction of `tangent`, clipping
/// the step length to `max_step_size`. Steps below [`MIN_STEP_SIZE`] are
/// skipped before the tangent is normalized.
fn apply_update(point: &mut ManifoldVector, tangent: &mut ManifoldVector, max_step_size: f64) {
    let norm_sq = minkowski_dot(tangent, tangent);
    if norm_sq < MIN_STEP_SIZE * MIN_STEP_SIZE {
        return;
    }
    let step_size = norm_sq.sqrt();
    tangent.scale(1.0 / step_size);
    point.geodesic_update(tangent, step_size.min(max_step_size));
}
