//! Distance computation and nearest-neighbor search over stored
//! registrations.

use tracing::debug;

use crate::store::Registration;
use crate::template::{DistanceVector, Template};

/// Default maximum acceptable distance for declaring a match.
///
/// Callers always pass the threshold explicitly; this constant is the one
/// documented default for call sites with no better-informed choice.
pub const DEFAULT_THRESHOLD: f64 = 0.13;

/// Euclidean distance over the intersection of keys present in both vectors.
///
/// Returns `f64::INFINITY` when the vectors share no keys. Both vectors are
/// normally built from the same fixed 5-point scheme, so the intersection is
/// the full 10-key set; partial overlap only arises from malformed or legacy
/// records.
pub fn distance(a: &DistanceVector, b: &DistanceVector) -> f64 {
    let mut sum = 0.0;
    let mut common = 0usize;

    for (key, value) in a.iter() {
        if let Some(other) = b.get(key) {
            let diff = value - other;
            sum += diff * diff;
            common += 1;
        }
    }

    if common == 0 {
        return f64::INFINITY;
    }
    sum.sqrt()
}

/// The nearest stored registration to a query template.
#[derive(Debug, Clone, Copy)]
pub struct BestMatch<'a> {
    pub registration: &'a Registration,
    pub distance: f64,
}

/// Scan candidates for the registration nearest to the query.
///
/// Ties are broken by enumeration order: the first strict minimum wins.
/// Returns `None` when there are no candidates or every candidate is at
/// infinite distance.
pub fn search<'a, I>(query: &Template, candidates: I) -> Option<BestMatch<'a>>
where
    I: IntoIterator<Item = &'a Registration>,
{
    let mut best: Option<BestMatch<'a>> = None;

    for candidate in candidates {
        let d = distance(&query.normalized_distances, &candidate.normalized_distances);
        debug!(identity = %candidate.identity, distance = d, "Compared candidate");

        if best.map_or(d < f64::INFINITY, |b| d < b.distance) {
            best = Some(BestMatch {
                registration: candidate,
                distance: d,
            });
        }
    }

    best
}

/// Match iff the best distance is within the caller-supplied threshold.
pub fn decide(best_distance: f64, threshold: f64) -> bool {
    best_distance <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{registration_with_distances, sample_landmarks};
    use crate::template::TemplateBuilder;

    fn vector(entries: &[(&str, f64)]) -> DistanceVector {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let v = vector(&[("a_b", 1.0), ("a_c", 0.5), ("b_c", 2.25)]);
        assert_eq!(distance(&v, &v), 0.0);
    }

    #[test]
    fn test_distance_known_value() {
        let a = vector(&[("a_b", 1.0), ("a_c", 2.0)]);
        let b = vector(&[("a_b", 1.0), ("a_c", 5.0)]);
        assert!((distance(&a, &b) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_disjoint_keys_give_infinity() {
        let a = vector(&[("a_b", 1.0)]);
        let b = vector(&[("c_d", 1.0)]);
        assert_eq!(distance(&a, &b), f64::INFINITY);
    }

    #[test]
    fn test_partial_overlap_uses_intersection_only() {
        let a = vector(&[("a_b", 1.0), ("only_a", 99.0)]);
        let b = vector(&[("a_b", 4.0), ("only_b", -7.0)]);
        assert!((distance(&a, &b) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_search_first_minimum_wins() {
        let query = TemplateBuilder::new(sample_landmarks()).build().unwrap();
        let q = &query.normalized_distances;

        // Two candidates at the same distance from the query.
        let first = registration_with_distances("first", q.clone());
        let second = registration_with_distances("second", q.clone());

        let best = search(&query, [&first, &second]).unwrap();
        assert_eq!(best.registration.identity, "first");
        assert_eq!(best.distance, 0.0);
    }

    #[test]
    fn test_search_empty_candidates() {
        let query = TemplateBuilder::new(sample_landmarks()).build().unwrap();
        assert!(search(&query, std::iter::empty::<&Registration>()).is_none());
    }

    #[test]
    fn test_search_all_infinite_yields_none() {
        let query = TemplateBuilder::new(sample_landmarks()).build().unwrap();
        let unrelated = registration_with_distances(
            "legacy",
            [("no_such_pair".to_string(), 1.0)].into_iter().collect(),
        );
        assert!(search(&query, [&unrelated]).is_none());
    }

    #[test]
    fn test_decide_boundary_inclusive() {
        assert!(decide(0.13, DEFAULT_THRESHOLD));
        assert!(decide(0.0, 0.0));
        assert!(!decide(0.1300001, DEFAULT_THRESHOLD));
    }
}
