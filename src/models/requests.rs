use serde::{Deserialize, Serialize};
use validator::Validate;

/// Owner or caretaker signup payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1))]
    pub phone: String,
    pub lat: i32,
    pub lon: i32,
}

/// Profile update payload shared by owners and caretakers
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub phone: String,
    pub lat: i32,
    pub lon: i32,
}

/// Login payload; `username` is the account email
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "refresh_token", rename = "refreshToken")]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePetRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0))]
    pub age: i32,
    pub breed: Option<String>,
    pub gender: Option<String>,
    #[validate(length(min = 1))]
    #[serde(alias = "owner_id", rename = "ownerId")]
    pub owner_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "owner_id", rename = "ownerId")]
    pub owner_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "caretaker_id", rename = "caretakerId")]
    pub caretaker_id: String,
    #[serde(default)]
    pub instruction: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "booking_id", rename = "bookingId")]
    pub booking_id: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Explicit write of a caretaker's stored rating
///
/// Without a `rating` the current review average is computed and stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateRatingRequest {
    #[validate(range(min = 0.0, max = 5.0))]
    #[serde(default)]
    pub rating: Option<f64>,
}

/// Query string of the recommendation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendQuery {
    pub limit: Option<usize>,
}
