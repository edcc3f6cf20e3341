//! Fixed-dimension vectors in Minkowski space.

use std::ops::{Index, IndexMut};

use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Tolerance on `|⟨v, v⟩_M + 1|` before a point is re-projected onto the
/// hyperboloid.
const MDP_ERROR_TOLERANCE: f64 = 1e-15;

/// A vector in Minkowski space, where the last coordinate is time-like.
///
/// The same type represents hyperboloid points, tangent vectors, and
/// intermediate gradients; which invariants hold is up to the caller.
/// Used as a point, it satisfies `⟨v, v⟩_M ≈ −1` with `v[d−1] > 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifoldVector {
    data: Array1<f64>,
}

impl ManifoldVector {
    /// Create a zero vector of the given ambient dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            data: Array1::zeros(dimension),
        }
    }

    /// Ambient dimension.
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    /// Set all entries to zero.
    pub fn zero(&mut self) {
        self.data.fill(0.0);
    }

    /// Multiply all entries by `a`, in place.
    pub fn scale(&mut self, a: f64) {
        self.data *= a;
    }

    /// Add `other` to this vector, in place.
    pub fn add(&mut self, other: &Self) {
        self.data += &other.data;
    }

    /// Add `scalar * other` to this vector, in place.
    pub fn add_scaled(&mut self, other: &Self, scalar: f64) {
        self.data.scaled_add(scalar, &other.data);
    }

    /// Copy the entries of `other` into this vector without reallocating.
    pub fn assign(&mut self, other: &Self) {
        self.data.assign(&other.data);
    }

    /// Project this vector onto the tangent space of the hyperboloid at
    /// `point`: `v ← v + ⟨point, v⟩_M · point`. Afterwards
    /// `⟨point, v⟩_M = 0`.
    pub fn project_onto_tangent_space(&mut self, point: &Self) {
        let mdp = minkowski_dot(point, self);
        self.add_scaled(point, mdp);
    }

    /// Replace this point with the point reached by following the geodesic
    /// in the direction of `tangent_unit_vec` for distance `step_size`:
    /// `v ← cosh(s)·v + sinh(s)·t̂`. This is the exponential map at `v`.
    ///
    /// Pre: `tangent_unit_vec` is a unit tangent vector at `self`;
    /// `step_size > 0`.
    pub fn geodesic_update(&mut self, tangent_unit_vec: &Self, step_size: f64) {
        self.scale(step_size.cosh());
        self.add_scaled(tangent_unit_vec, step_size.sinh());
        self.ensure_on_hyperboloid();
    }

    /// Re-project this time-like point onto the hyperboloid if it has
    /// drifted off, rescaling by `1/√(−⟨v, v⟩_M)`.
    ///
    /// Panics if the vector has become space-like; that indicates a bug or a
    /// pathologically large `-max-step-size` and is not recoverable.
    pub fn ensure_on_hyperboloid(&mut self) {
        let mdp = minkowski_dot(self, self);
        if (mdp + 1.0).abs() > MDP_ERROR_TOLERANCE {
            assert!(
                mdp < 0.0,
                "space-like vector cannot be projected onto the hyperboloid"
            );
            self.scale(1.0 / (-mdp).sqrt());
        }
    }

    /// Set this vector to a random point on the hyperboloid, circularly
    /// distributed around the basepoint `(0, …, 0, 1)`.
    ///
    /// A tangent vector at the basepoint is sampled with `noise`-distributed
    /// spatial coordinates; the point is reached by following the geodesic
    /// for the tangent's Euclidean norm. The hyperbolic distance from the
    /// basepoint therefore equals that norm.
    pub fn random_hyperboloid_point<R: Rng + ?Sized>(&mut self, rng: &mut R, noise: &Normal<f64>) {
        let n = self.dim();
        let mut tangent = ManifoldVector::new(n);
        let mut norm_sq = 0.0;
        for i in 0..n - 1 {
            let x = noise.sample(rng);
            tangent.data[i] = x;
            norm_sq += x * x;
        }
        let norm = norm_sq.sqrt();
        tangent.scale(1.0 / norm);
        self.zero();
        self.data[n - 1] = 1.0;
        self.geodesic_update(&tangent, norm);
    }

    /// Project this hyperboloid point to the Poincaré ball, in place: the
    /// spatial part is divided by `v[d−1] + 1` and the last coordinate
    /// zeroed.
    pub fn to_ball_point(&mut self) {
        let n = self.dim();
        let denom = self.data[n - 1] + 1.0;
        self.data[n - 1] = 0.0;
        self.scale(1.0 / denom);
    }

    /// Inverse of [`to_ball_point`](Self::to_ball_point): lift this ball
    /// point (last coordinate zero) back onto the hyperboloid.
    pub fn to_hyperboloid_point(&mut self) {
        let n = self.dim();
        let norm_sq = minkowski_dot(self, self);
        self.scale(2.0 / (1.0 - norm_sq));
        self.data[n - 1] = (1.0 + norm_sq) / (1.0 - norm_sq);
    }

    /// Reinterpret this hyperboloid tangent vector at `point` as the
    /// corresponding Poincaré-ball tangent, in place.
    pub fn to_ball_tangent(&mut self, point: &Self) {
        let n = self.dim();
        let denom = point.data[n - 1] + 1.0;
        let time_part = self.data[n - 1];
        for i in 0..n - 1 {
            self.data[i] = (self.data[i] - point.data[i] * time_part / denom) / denom;
        }
        self.data[n - 1] = 0.0;
    }
}

impl Index<usize> for ManifoldVector {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.data[i]
    }
}

impl IndexMut<usize> for ManifoldVector {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.data[i]
    }
}

/// The Minkowski inner product `Σ_{i<d−1} v_i·w_i − v_{d−1}·w_{d−1}`.
pub fn minkowski_dot(v: &ManifoldVector, w: &ManifoldVector) -> f64 {
    debug_assert_eq!(v.dim(), w.dim());
    let n = v.dim();
    let mut result = 0.0;
    for i in 0..n - 1 {
        result += v.data[i] * w.data[i];
    }
    result - v.data[n - 1] * w.data[n - 1]
}

/// Geodesic distance between two points on the hyperboloid:
/// `acosh(−⟨p, q⟩_M)`. The caller must ensure both points are on the
/// hyperboloid, where the argument is ≥ 1 up to rounding; arguments that
/// land a few ulps below 1 read as coincident points.
pub fn distance(point0: &ManifoldVector, point1: &ManifoldVector) -> f64 {
    let arg = -minkowski_dot(point0, point1);
    if arg <= 1.0 {
        return 0.0;
    }
    arg.acosh()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn basepoint(dim: usize) -> ManifoldVector {
        let mut v = ManifoldVector::new(dim);
        v[dim - 1] = 1.0;
        v
    }

    fn random_point<R: Rng>(dim: usize, std_dev: f64, rng: &mut R) -> ManifoldVector {
        let noise = Normal::new(0.0, std_dev).unwrap();
        let mut v = ManifoldVector::new(dim);
        v.random_hyperboloid_point(rng, &noise);
        v
    }

    /// Unit tangent at `p` derived from an arbitrary ambient direction, or
    /// None when the projection degenerates.
    fn unit_tangent_at(p: &ManifoldVector, raw: &[f64]) -> Option<ManifoldVector> {
        let mut t = ManifoldVector::new(p.dim());
        for (i, &x) in raw.iter().enumerate() {
            t[i] = x;
        }
        t.project_onto_tangent_space(p);
        let norm_sq = minkowski_dot(&t, &t);
        if norm_sq < 1e-8 {
            return None;
        }
        t.scale(1.0 / norm_sq.sqrt());
        Some(t)
    }

    #[test]
    fn geodesic_update_from_basepoint() {
        let mut p = basepoint(2);
        let mut t = ManifoldVector::new(2);
        t[0] = 1.0;
        p.geodesic_update(&t, 0.5);
        assert_relative_eq!(p[0], 0.5f64.sinh(), max_relative = 1e-12);
        assert_relative_eq!(p[1], 0.5f64.cosh(), max_relative = 1e-12);
        assert_relative_eq!(distance(&basepoint(2), &p), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn in_place_arithmetic_composes() {
        let mut v = ManifoldVector::new(3);
        v[0] = 1.0;
        v[1] = -2.0;
        let mut w = ManifoldVector::new(3);
        w[0] = 0.5;
        w[2] = 4.0;
        v.add(&w);
        v.scale(2.0);
        v.add_scaled(&w, -2.0);
        assert_relative_eq!(v[0], 2.0, epsilon = 1e-15);
        assert_relative_eq!(v[1], -4.0, epsilon = 1e-15);
        assert_relative_eq!(v[2], 0.0, epsilon = 1e-15);
        v.zero();
        assert_eq!(v, ManifoldVector::new(3));
    }

    #[test]
    fn minkowski_dot_signs_the_last_coordinate() {
        let mut a = ManifoldVector::new(3);
        a[0] = 1.0;
        a[1] = 0.5;
        a[2] = -2.0;
        let mut b = ManifoldVector::new(3);
        b[1] = 0.5;
        b[2] = 1.0;
        assert_relative_eq!(minkowski_dot(&a, &b), 2.25, epsilon = 1e-15);
    }

    #[test]
    fn ensure_on_hyperboloid_rescales_drifted_point() {
        let mut v = ManifoldVector::new(2);
        v[1] = 1.000001;
        v.ensure_on_hyperboloid();
        assert!((v[1] - 1.0).abs() < 1e-6);
        assert_relative_eq!(minkowski_dot(&v, &v), -1.0, epsilon = 1e-12);
    }

    #[test]
    #[should_panic(expected = "space-like")]
    fn ensure_on_hyperboloid_rejects_space_like_vector() {
        let mut v = ManifoldVector::new(2);
        v[0] = 2.0;
        v[1] = 1.0;
        v.ensure_on_hyperboloid();
    }

    #[test]
    fn distance_is_zero_on_diagonal_and_symmetric() {
        let mut rng = StdRng::seed_from_u64(7);
        let p = random_point(5, 0.5, &mut rng);
        let q = random_point(5, 0.5, &mut rng);
        assert_relative_eq!(distance(&p, &p), 0.0, epsilon = 1e-6);
        assert_relative_eq!(distance(&p, &q), distance(&q, &p), epsilon = 1e-12);
    }

    #[test]
    fn ball_tangent_has_no_time_component() {
        let mut rng = StdRng::seed_from_u64(11);
        let p = random_point(4, 0.3, &mut rng);
        let mut t = unit_tangent_at(&p, &[0.4, -0.2, 0.9]).unwrap();
        t.to_ball_tangent(&p);
        assert_eq!(t[3], 0.0);
    }

    proptest! {
        #[test]
        fn prop_random_point_lies_on_hyperboloid(
            seed in any::<u64>(),
            dim in 2usize..50,
            std_dev in 0.01f64..2.0
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let v = random_point(dim, std_dev, &mut rng);
            prop_assert!((minkowski_dot(&v, &v) + 1.0).abs() < 1e-6);
            prop_assert!(v[dim - 1] > 0.0);
        }

        #[test]
        fn prop_tangent_projection_is_orthogonal(
            seed in any::<u64>(),
            raw in prop::collection::vec(-1.0f64..1.0, 4)
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let p = random_point(4, 0.5, &mut rng);
            let mut u = ManifoldVector::new(4);
            for (i, &x) in raw.iter().enumerate() {
                u[i] = x;
            }
            u.project_onto_tangent_space(&p);
            prop_assert!(minkowski_dot(&p, &u).abs() < 1e-6);
        }

        #[test]
        fn prop_geodesic_step_covers_requested_distance(
            seed in any::<u64>(),
            raw in prop::collection::vec(-1.0f64..1.0, 6),
            step in 0.01f64..2.0
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let before = random_point(6, 0.3, &mut rng);
            if let Some(t) = unit_tangent_at(&before, &raw) {
                let mut after = before.clone();
                after.geodesic_update(&t, step);
                prop_assert!((distance(&before, &after) - step).abs() < 1e-5);
            }
        }

        #[test]
        fn prop_ball_round_trip_recovers_point(
            seed in any::<u64>(),
            std_dev in 0.01f64..1.0
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let p = random_point(5, std_dev, &mut rng);
            prop_assume!(p[4] < 100.0);
            let mut q = p.clone();
            q.to_ball_point();
            q.to_hyperboloid_point();
            for i in 0..5 {
                prop_assert!((p[i] - q[i]).abs() < 1e-5);
            }
        }
    }
}
