//! Distance metrics for vector similarity

use serde::{Deserialize, Serialize};

/// A function mapping a pair of equal-length vectors to a distance, where
/// lower means more similar.
///
/// The query engine checks dimensionality before calling [`Metric::distance`],
/// so implementations may assume `a.len() == b.len()`.
pub trait Metric: Send + Sync {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32;

    /// The built-in metric this is, if any. An auxiliary index is consulted
    /// only when its metric matches the query metric exactly.
    fn kind(&self) -> Option<DistanceMetric> {
        None
    }
}

/// Built-in distance metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Euclidean (L2) distance
    #[default]
    Euclidean,
    /// Squared Euclidean distance. Ranks identically to `Euclidean`
    /// without the square root.
    SquaredEuclidean,
    /// Cosine similarity converted to distance: 1 - similarity
    Cosine,
    /// Manhattan (L1) distance
    Manhattan,
}

impl DistanceMetric {
    /// Compute the distance between two vectors using this metric
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            DistanceMetric::Euclidean => euclidean_distance(a, b),
            DistanceMetric::SquaredEuclidean => squared_euclidean_distance(a, b),
            DistanceMetric::Cosine => cosine_distance(a, b),
            DistanceMetric::Manhattan => manhattan_distance(a, b),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::SquaredEuclidean => "squared_euclidean",
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Manhattan => "manhattan",
        }
    }
}

impl Metric for DistanceMetric {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        DistanceMetric::distance(self, a, b)
    }

    fn kind(&self) -> Option<DistanceMetric> {
        Some(*self)
    }
}

/// Adapts a closure into a [`Metric`].
///
/// ```
/// use vecstore::distance::{CustomMetric, Metric};
///
/// let chebyshev = CustomMetric(|a: &[f32], b: &[f32]| {
///     a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f32::max)
/// });
/// assert_eq!(chebyshev.distance(&[0.0, 0.0], &[1.0, 3.0]), 3.0);
/// ```
#[derive(Clone, Copy)]
pub struct CustomMetric<F>(pub F);

impl<F> Metric for CustomMetric<F>
where
    F: Fn(&[f32], &[f32]) -> f32 + Send + Sync,
{
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        (self.0)(a, b)
    }
}

impl<F> std::fmt::Debug for CustomMetric<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CustomMetric")
    }
}

/// Compute Euclidean (L2) distance between two vectors
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    squared_euclidean_distance(a, b).sqrt()
}

/// Compute squared Euclidean distance between two vectors
pub fn squared_euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Compute Manhattan (L1) distance between two vectors
pub fn manhattan_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

/// Compute cosine distance between two vectors (1 - cosine similarity).
///
/// A zero vector has no direction; its similarity to anything is taken as 0,
/// giving distance 1.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = dot_product(a, a).sqrt();
    let norm_b = dot_product(b, b).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    // Clamp to [-1, 1] to handle floating point errors
    let similarity = (dot_product(a, b) / (norm_a * norm_b)).clamp(-1.0, 1.0);
    1.0 - similarity
}

/// Compute dot product of two vectors
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_euclidean_distance() {
        let dist = euclidean_distance(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        assert_relative_eq!(dist, 5.196152, epsilon = 1e-5);
    }

    #[test]
    fn test_euclidean_same_vector() {
        let v = [1.0, 2.0, 3.0];
        assert_relative_eq!(euclidean_distance(&v, &v), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_squared_euclidean() {
        let dist = squared_euclidean_distance(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        assert_relative_eq!(dist, 27.0, epsilon = 1e-6);
    }

    #[test]
    fn test_manhattan() {
        let dist = manhattan_distance(&[1.0, -2.0], &[4.0, 2.0]);
        assert_relative_eq!(dist, 7.0, epsilon = 1e-6);
    }

    #[test]
    fn test_dot_product() {
        let dot = dot_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        assert_relative_eq!(dot, 32.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_identical() {
        let dist = cosine_distance(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]);
        assert_relative_eq!(dist, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let dist = cosine_distance(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert_relative_eq!(dist, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_opposite() {
        let dist = cosine_distance(&[1.0, 0.0, 0.0], &[-1.0, 0.0, 0.0]);
        assert_relative_eq!(dist, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 1.0]), 1.0);
    }

    #[test]
    fn test_cosine_scale_invariant() {
        let a = cosine_distance(&[1.0, 2.0], &[2.0, 1.0]);
        let b = cosine_distance(&[10.0, 20.0], &[2.0, 1.0]);
        assert_relative_eq!(a, b, epsilon = 1e-6);
    }

    #[test]
    fn test_squared_preserves_euclidean_ranking() {
        let q = [0.0, 0.0];
        let near = [1.0, 1.0];
        let far = [3.0, 0.5];
        assert!(
            DistanceMetric::Euclidean.distance(&q, &near)
                < DistanceMetric::Euclidean.distance(&q, &far)
        );
        assert!(
            DistanceMetric::SquaredEuclidean.distance(&q, &near)
                < DistanceMetric::SquaredEuclidean.distance(&q, &far)
        );
    }

    #[test]
    fn test_metric_kind() {
        assert_eq!(
            Metric::kind(&DistanceMetric::Cosine),
            Some(DistanceMetric::Cosine)
        );
        let custom = CustomMetric(|a: &[f32], b: &[f32]| euclidean_distance(a, b));
        assert_eq!(custom.kind(), None);
        assert_relative_eq!(custom.distance(&[0.0], &[2.0]), 2.0);
    }

    #[test]
    fn test_default_is_euclidean() {
        assert_eq!(DistanceMetric::default(), DistanceMetric::Euclidean);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&DistanceMetric::SquaredEuclidean).unwrap();
        assert_eq!(json, "\"squared_euclidean\"");
    }
}
