// Recommendation and rating kernel
pub mod distance;
pub mod ranker;
pub mod rating;

pub use distance::{euclidean_distance, squared_distance};
pub use ranker::ProximityRanker;
pub use rating::{average_rating, summarize_ratings};
