use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use crate::models::{Booking, Caretaker, LocationPoint, Owner, Pet, Review};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for PostgresError {
    fn from(err: sqlx::Error) -> Self {
        // Unique constraint violations are caller errors, not infrastructure ones
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique constraint").to_string();
                return PostgresError::Conflict(constraint);
            }
        }
        PostgresError::SqlxError(err)
    }
}

/// New account row before insertion
#[derive(Debug, Clone)]
pub struct NewAccount<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub address: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone: &'a str,
    pub location: LocationPoint,
}

/// Mutable contact and location fields of an account
#[derive(Debug, Clone)]
pub struct AccountUpdate<'a> {
    pub address: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub location: LocationPoint,
}

/// PostgreSQL store for every marketplace record
///
/// Built once at startup and shared through the application state. All
/// transactional behavior is delegated to the database.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Build a client whose pool connects on first use
    ///
    /// No migrations are run. Handlers that never touch the database can be
    /// exercised without a server behind it.
    pub fn connect_lazy(database_url: &str) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    // Owners

    pub async fn create_owner(&self, account: &NewAccount<'_>) -> Result<Owner, PostgresError> {
        let owner = sqlx::query_as::<_, Owner>(
            r#"
            INSERT INTO owners (id, name, address, email, password, phone, lat, lon)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, address, email, password, phone, lat, lon
            "#,
        )
        .bind(account.id)
        .bind(account.name)
        .bind(account.address)
        .bind(account.email)
        .bind(account.password_hash)
        .bind(account.phone)
        .bind(account.location.latitude)
        .bind(account.location.longitude)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created owner {}", owner.id);
        Ok(owner)
    }

    pub async fn get_owner(&self, owner_id: &str) -> Result<Option<Owner>, PostgresError> {
        let owner = sqlx::query_as::<_, Owner>(
            "SELECT id, name, address, email, password, phone, lat, lon FROM owners WHERE id = $1",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(owner)
    }

    pub async fn get_owner_by_email(&self, email: &str) -> Result<Option<Owner>, PostgresError> {
        let owner = sqlx::query_as::<_, Owner>(
            "SELECT id, name, address, email, password, phone, lat, lon FROM owners WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(owner)
    }

    pub async fn get_owner_by_phone(&self, phone: &str) -> Result<Option<Owner>, PostgresError> {
        let owner = sqlx::query_as::<_, Owner>(
            "SELECT id, name, address, email, password, phone, lat, lon FROM owners WHERE phone = $1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;
        Ok(owner)
    }

    pub async fn update_owner(
        &self,
        owner_id: &str,
        update: &AccountUpdate<'_>,
    ) -> Result<Option<Owner>, PostgresError> {
        let owner = sqlx::query_as::<_, Owner>(
            r#"
            UPDATE owners
            SET address = $2, email = $3, phone = $4, lat = $5, lon = $6
            WHERE id = $1
            RETURNING id, name, address, email, password, phone, lat, lon
            "#,
        )
        .bind(owner_id)
        .bind(update.address)
        .bind(update.email)
        .bind(update.phone)
        .bind(update.location.latitude)
        .bind(update.location.longitude)
        .fetch_optional(&self.pool)
        .await?;
        Ok(owner)
    }

    /// Delete an owner, returning whether a row was removed
    pub async fn delete_owner(&self, owner_id: &str) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM owners WHERE id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Pets

    pub async fn create_pet(&self, pet: &Pet) -> Result<Pet, PostgresError> {
        let pet = sqlx::query_as::<_, Pet>(
            r#"
            INSERT INTO pets (id, name, age, breed, gender, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, age, breed, gender, owner_id
            "#,
        )
        .bind(&pet.id)
        .bind(&pet.name)
        .bind(pet.age)
        .bind(&pet.breed)
        .bind(&pet.gender)
        .bind(&pet.owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(pet)
    }

    pub async fn get_pet(&self, pet_id: &str) -> Result<Option<Pet>, PostgresError> {
        let pet = sqlx::query_as::<_, Pet>(
            "SELECT id, name, age, breed, gender, owner_id FROM pets WHERE id = $1",
        )
        .bind(pet_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(pet)
    }

    pub async fn get_owner_pets(&self, owner_id: &str) -> Result<Vec<Pet>, PostgresError> {
        let pets = sqlx::query_as::<_, Pet>(
            "SELECT id, name, age, breed, gender, owner_id FROM pets WHERE owner_id = $1 ORDER BY name",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(pets)
    }

    // Caretakers

    pub async fn create_caretaker(&self, account: &NewAccount<'_>) -> Result<Caretaker, PostgresError> {
        let caretaker = sqlx::query_as::<_, Caretaker>(
            r#"
            INSERT INTO caretakers (id, name, address, email, password, phone, lat, lon, rating)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0)
            RETURNING id, name, address, email, password, phone, lat, lon, rating
            "#,
        )
        .bind(account.id)
        .bind(account.name)
        .bind(account.address)
        .bind(account.email)
        .bind(account.password_hash)
        .bind(account.phone)
        .bind(account.location.latitude)
        .bind(account.location.longitude)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created caretaker {}", caretaker.id);
        Ok(caretaker)
    }

    pub async fn get_caretaker(&self, caretaker_id: &str) -> Result<Option<Caretaker>, PostgresError> {
        let caretaker = sqlx::query_as::<_, Caretaker>(
            "SELECT id, name, address, email, password, phone, lat, lon, rating FROM caretakers WHERE id = $1",
        )
        .bind(caretaker_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(caretaker)
    }

    pub async fn get_caretaker_by_email(&self, email: &str) -> Result<Option<Caretaker>, PostgresError> {
        let caretaker = sqlx::query_as::<_, Caretaker>(
            "SELECT id, name, address, email, password, phone, lat, lon, rating FROM caretakers WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(caretaker)
    }

    pub async fn get_caretaker_by_phone(&self, phone: &str) -> Result<Option<Caretaker>, PostgresError> {
        let caretaker = sqlx::query_as::<_, Caretaker>(
            "SELECT id, name, address, email, password, phone, lat, lon, rating FROM caretakers WHERE phone = $1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;
        Ok(caretaker)
    }

    /// Every caretaker, in insertion order
    ///
    /// Insertion order is the tie-break order of the ranker.
    pub async fn get_all_caretakers(&self) -> Result<Vec<Caretaker>, PostgresError> {
        let caretakers = sqlx::query_as::<_, Caretaker>(
            r#"
            SELECT id, name, address, email, password, phone, lat, lon, rating
            FROM caretakers
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!("Loaded {} caretakers", caretakers.len());
        Ok(caretakers)
    }

    pub async fn update_caretaker(
        &self,
        caretaker_id: &str,
        update: &AccountUpdate<'_>,
    ) -> Result<Option<Caretaker>, PostgresError> {
        let caretaker = sqlx::query_as::<_, Caretaker>(
            r#"
            UPDATE caretakers
            SET address = $2, email = $3, phone = $4, lat = $5, lon = $6
            WHERE id = $1
            RETURNING id, name, address, email, password, phone, lat, lon, rating
            "#,
        )
        .bind(caretaker_id)
        .bind(update.address)
        .bind(update.email)
        .bind(update.phone)
        .bind(update.location.latitude)
        .bind(update.location.longitude)
        .fetch_optional(&self.pool)
        .await?;
        Ok(caretaker)
    }

    /// Store a rating value on the caretaker row
    pub async fn update_caretaker_rating(
        &self,
        caretaker_id: &str,
        rating: f64,
    ) -> Result<Option<Caretaker>, PostgresError> {
        let caretaker = sqlx::query_as::<_, Caretaker>(
            r#"
            UPDATE caretakers SET rating = $2 WHERE id = $1
            RETURNING id, name, address, email, password, phone, lat, lon, rating
            "#,
        )
        .bind(caretaker_id)
        .bind(rating)
        .fetch_optional(&self.pool)
        .await?;

        tracing::info!("Stored rating {} for caretaker {}", rating, caretaker_id);
        Ok(caretaker)
    }

    pub async fn delete_caretaker(&self, caretaker_id: &str) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM caretakers WHERE id = $1")
            .bind(caretaker_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Bookings

    pub async fn create_booking(&self, booking: &Booking) -> Result<Booking, PostgresError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (id, owner_id, caretaker_id, date_of_booking, instruction)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, caretaker_id, date_of_booking, instruction
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.owner_id)
        .bind(&booking.caretaker_id)
        .bind(booking.date_of_booking)
        .bind(&booking.instruction)
        .fetch_one(&self.pool)
        .await?;
        Ok(booking)
    }

    pub async fn get_booking(&self, booking_id: &str) -> Result<Option<Booking>, PostgresError> {
        let booking = sqlx::query_as::<_, Booking>(
            "SELECT id, owner_id, caretaker_id, date_of_booking, instruction FROM bookings WHERE id = $1",
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(booking)
    }

    pub async fn get_owner_bookings(&self, owner_id: &str) -> Result<Vec<Booking>, PostgresError> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, owner_id, caretaker_id, date_of_booking, instruction
            FROM bookings
            WHERE owner_id = $1
            ORDER BY date_of_booking DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    pub async fn get_caretaker_bookings(&self, caretaker_id: &str) -> Result<Vec<Booking>, PostgresError> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, owner_id, caretaker_id, date_of_booking, instruction
            FROM bookings
            WHERE caretaker_id = $1
            ORDER BY date_of_booking DESC
            "#,
        )
        .bind(caretaker_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    // Reviews

    /// Insert a review; a second review for the same booking is a conflict
    pub async fn create_review(&self, review: &Review) -> Result<Review, PostgresError> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (id, booking_id, rating, comment, date_of_review)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, booking_id, rating, comment, date_of_review
            "#,
        )
        .bind(&review.id)
        .bind(&review.booking_id)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.date_of_review)
        .fetch_one(&self.pool)
        .await?;
        Ok(review)
    }

    pub async fn get_review_for_booking(&self, booking_id: &str) -> Result<Option<Review>, PostgresError> {
        let review = sqlx::query_as::<_, Review>(
            "SELECT id, booking_id, rating, comment, date_of_review FROM reviews WHERE booking_id = $1",
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(review)
    }

    /// Reviews of a caretaker's bookings keyed by booking id
    pub async fn get_caretaker_reviews(
        &self,
        caretaker_id: &str,
    ) -> Result<HashMap<String, Review>, PostgresError> {
        let reviews = sqlx::query_as::<_, Review>(
            r#"
            SELECT r.id, r.booking_id, r.rating, r.comment, r.date_of_review
            FROM reviews r
            JOIN bookings b ON b.id = r.booking_id
            WHERE b.caretaker_id = $1
            "#,
        )
        .bind(caretaker_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews
            .into_iter()
            .map(|review| (review.booking_id.clone(), review))
            .collect())
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
