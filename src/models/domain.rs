use serde::{Deserialize, Serialize};

/// Integer-degree coordinate pair as stored for owners and caretakers
///
/// Values are not range checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationPoint {
    #[serde(rename = "lat")]
    pub latitude: i32,
    #[serde(rename = "lon")]
    pub longitude: i32,
}

impl LocationPoint {
    pub fn new(latitude: i32, longitude: i32) -> Self {
        Self { latitude, longitude }
    }
}

/// Pet owner account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Owner {
    pub id: String,
    pub name: String,
    pub address: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub phone: String,
    pub lat: i32,
    pub lon: i32,
}

impl Owner {
    pub fn location(&self) -> LocationPoint {
        LocationPoint::new(self.lat, self.lon)
    }
}

/// Caretaker account
///
/// `rating` is only ever written through the explicit rating update path,
/// never as a side effect of computing an average.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Caretaker {
    pub id: String,
    pub name: String,
    pub address: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub phone: String,
    pub lat: i32,
    pub lon: i32,
    #[serde(default)]
    pub rating: f64,
}

impl Caretaker {
    pub fn location(&self) -> LocationPoint {
        LocationPoint::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Pet {
    pub id: String,
    pub name: String,
    pub age: i32,
    pub breed: Option<String>,
    pub gender: Option<String>,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
}

/// Scheduled engagement between one owner and one caretaker
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub id: String,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    #[serde(rename = "caretakerId")]
    pub caretaker_id: String,
    #[serde(rename = "dateOfBooking")]
    pub date_of_booking: chrono::DateTime<chrono::Utc>,
    pub instruction: Option<String>,
}

/// Post-booking feedback, at most one per booking
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: String,
    #[serde(rename = "bookingId")]
    pub booking_id: String,
    pub rating: i32,
    pub comment: Option<String>,
    #[serde(rename = "dateOfReview")]
    pub date_of_review: chrono::DateTime<chrono::Utc>,
}

/// Account kind carried in issued tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Caretaker,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Caretaker => write!(f, "caretaker"),
        }
    }
}

/// Caretaker paired with its distance to the reference point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCaretaker {
    #[serde(flatten)]
    pub caretaker: Caretaker,
    pub distance: f64,
}

/// Aggregated review rating for one caretaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    #[serde(rename = "caretakerId")]
    pub caretaker_id: String,
    /// `None` when no booking of the caretaker has been reviewed yet
    #[serde(rename = "averageRating")]
    pub average_rating: Option<f64>,
    #[serde(rename = "reviewCount")]
    pub review_count: usize,
}
