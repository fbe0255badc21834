// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{LocationPoint, Owner, Caretaker, Pet, Booking, Review, Role, RankedCaretaker, RatingSummary};
pub use requests::{SignupRequest, UpdateProfileRequest, LoginRequest, RefreshRequest, CreatePetRequest, CreateBookingRequest, CreateReviewRequest, UpdateRatingRequest, RecommendQuery};
pub use responses::{RecommendResponse, TokenResponse, HealthResponse, ErrorResponse};
