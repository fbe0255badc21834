//! PetCare Match - caretaker recommendation and booking service
//!
//! The computational core ranks caretakers by planar distance to an owner
//! and aggregates booking reviews into a caretaker rating. Around it sit the
//! HTTP API, the PostgreSQL store, the caretaker directory cache and token
//! based authentication.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{ProximityRanker, average_rating, summarize_ratings, euclidean_distance};
pub use crate::models::{LocationPoint, Caretaker, Booking, Review, RankedCaretaker, RatingSummary};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let d = euclidean_distance(LocationPoint::new(0, 0), LocationPoint::new(0, 2));
        assert_eq!(d, 2.0);
        assert!(ProximityRanker::rank(LocationPoint::new(0, 0), vec![], 3).is_empty());
    }
}
