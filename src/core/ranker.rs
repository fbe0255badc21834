use crate::models::{Caretaker, LocationPoint, RankedCaretaker};
use crate::core::distance::{euclidean_distance, squared_distance};

/// Orders caretakers by straight-line distance to a reference point
///
/// Ranking is a read-only view: candidates are consumed and returned in a new
/// order, nothing is written back. Equal distances keep their input order.
#[derive(Debug, Clone, Copy)]
pub struct ProximityRanker {
    default_top_n: usize,
    max_top_n: usize,
}

impl ProximityRanker {
    pub fn new(default_top_n: usize, max_top_n: usize) -> Self {
        let max_top_n = max_top_n.max(1);
        Self {
            default_top_n: default_top_n.clamp(1, max_top_n),
            max_top_n,
        }
    }

    pub fn default_top_n(&self) -> usize {
        self.default_top_n
    }

    pub fn max_top_n(&self) -> usize {
        self.max_top_n
    }

    /// Resolve a client-requested slice size
    ///
    /// Absent requests use the configured default; explicit ones are clamped
    /// into `1..=max_top_n`.
    pub fn resolve_top_n(&self, requested: Option<usize>) -> usize {
        requested
            .map(|n| n.clamp(1, self.max_top_n))
            .unwrap_or(self.default_top_n)
    }

    /// Return the `top_n` caretakers closest to `reference`
    ///
    /// The result has `min(top_n, candidates.len())` entries, sorted by
    /// non-decreasing distance.
    pub fn rank(
        reference: LocationPoint,
        candidates: Vec<Caretaker>,
        top_n: usize,
    ) -> Vec<Caretaker> {
        Self::rank_with_distance(reference, candidates, top_n)
            .into_iter()
            .map(|ranked| ranked.caretaker)
            .collect()
    }

    /// Same ordering as [`ProximityRanker::rank`], keeping each distance
    pub fn rank_with_distance(
        reference: LocationPoint,
        candidates: Vec<Caretaker>,
        top_n: usize,
    ) -> Vec<RankedCaretaker> {
        let mut keyed: Vec<(u128, Caretaker)> = candidates
            .into_iter()
            .map(|caretaker| (squared_distance(reference, caretaker.location()), caretaker))
            .collect();

        // sort_by_key is stable, ties keep input order
        keyed.sort_by_key(|(key, _)| *key);
        keyed.truncate(top_n);

        keyed
            .into_iter()
            .map(|(_, caretaker)| {
                let distance = euclidean_distance(reference, caretaker.location());
                RankedCaretaker { caretaker, distance }
            })
            .collect()
    }
}

impl Default for ProximityRanker {
    fn default() -> Self {
        Self::new(3, 50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caretaker(id: &str, lat: i32, lon: i32) -> Caretaker {
        Caretaker {
            id: id.to_string(),
            name: format!("Caretaker {}", id),
            address: "1 Main St".to_string(),
            email: format!("{}@example.com", id),
            password: String::new(),
            phone: format!("555-{}", id),
            lat,
            lon,
            rating: 0.0,
        }
    }

    fn ids(caretakers: &[Caretaker]) -> Vec<&str> {
        caretakers.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_rank_top_two() {
        let candidates = vec![
            caretaker("A", 0, 1),
            caretaker("B", 0, 5),
            caretaker("C", 0, 2),
        ];

        let ranked = ProximityRanker::rank(LocationPoint::new(0, 0), candidates, 2);

        assert_eq!(ids(&ranked), vec!["A", "C"]);
    }

    #[test]
    fn test_rank_empty_candidates() {
        let ranked = ProximityRanker::rank(LocationPoint::new(0, 0), vec![], 3);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_top_n_larger_than_candidates() {
        let candidates = vec![caretaker("A", 4, 4), caretaker("B", 1, 1)];

        let ranked = ProximityRanker::rank(LocationPoint::new(0, 0), candidates, 10);

        assert_eq!(ids(&ranked), vec!["B", "A"]);
    }

    #[test]
    fn test_top_n_zero() {
        let candidates = vec![caretaker("A", 1, 1)];
        let ranked = ProximityRanker::rank(LocationPoint::new(0, 0), candidates, 0);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_ties_keep_input_order() {
        // All four sit at distance 5 from the origin
        let candidates = vec![
            caretaker("north", 5, 0),
            caretaker("east", 0, 5),
            caretaker("diag", 3, -4),
            caretaker("south", -5, 0),
        ];

        let ranked = ProximityRanker::rank(LocationPoint::new(0, 0), candidates, 4);

        assert_eq!(ids(&ranked), vec!["north", "east", "diag", "south"]);
    }

    #[test]
    fn test_no_duplicated_entries() {
        let candidates = vec![
            caretaker("A", 0, 1),
            caretaker("B", 0, 2),
            caretaker("C", 0, 3),
        ];

        let ranked = ProximityRanker::rank(LocationPoint::new(0, 0), candidates, 3);

        assert_eq!(ids(&ranked), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_rank_with_distance_reports_distance() {
        let candidates = vec![caretaker("A", 3, 4)];

        let ranked = ProximityRanker::rank_with_distance(LocationPoint::new(0, 0), candidates, 1);

        assert_eq!(ranked.len(), 1);
        assert!((ranked[0].distance - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_resolve_top_n() {
        let ranker = ProximityRanker::new(3, 10);
        assert_eq!(ranker.resolve_top_n(None), 3);
        assert_eq!(ranker.resolve_top_n(Some(7)), 7);
        assert_eq!(ranker.resolve_top_n(Some(0)), 1);
        assert_eq!(ranker.resolve_top_n(Some(500)), 10);
    }

    #[test]
    fn test_default_clamped_to_max() {
        let ranker = ProximityRanker::new(20, 5);
        assert_eq!(ranker.default_top_n(), 5);
        assert_eq!(ranker.max_top_n(), 5);
    }
}
