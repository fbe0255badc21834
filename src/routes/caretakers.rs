use actix_web::{web, HttpResponse};
use validator::Validate;
use crate::core::summarize_ratings;
use crate::models::{LocationPoint, RatingSummary, SignupRequest, UpdateProfileRequest, UpdateRatingRequest};
use crate::routes::{invalidate_caretaker_directory, ApiError, AppState, AuthenticatedUser};
use crate::services::{hash_password, AccountUpdate, NewAccount};

/// Configure caretaker routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/signup", web::post().to(caretaker_signup))
        .route("/booking/{caretaker_id}", web::get().to(get_caretaker_bookings))
        .route("/rating/{caretaker_id}", web::get().to(get_caretaker_rating))
        .route("/rating/{caretaker_id}", web::put().to(store_caretaker_rating))
        .route("/{caretaker_id}", web::get().to(get_caretaker))
        .route("/{caretaker_id}", web::put().to(edit_caretaker))
        .route("/{caretaker_id}", web::delete().to(delete_caretaker));
}

fn caretaker_not_found(caretaker_id: &str) -> ApiError {
    ApiError::NotFound(format!("Caretaker with caretaker id: {} not found", caretaker_id))
}

/// Create a caretaker account; new caretakers start with a 0 rating
///
/// POST /api/v1/caretaker/signup
async fn caretaker_signup(
    state: web::Data<AppState>,
    req: web::Json<SignupRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    if state.postgres.get_caretaker_by_email(&req.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }
    if state.postgres.get_caretaker_by_phone(&req.phone).await?.is_some() {
        return Err(ApiError::Conflict("Phone number already exists".to_string()));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let password_hash = hash_password(&req.password)?;

    let caretaker = state
        .postgres
        .create_caretaker(&NewAccount {
            id: &id,
            name: &req.name,
            address: &req.address,
            email: &req.email,
            password_hash: &password_hash,
            phone: &req.phone,
            location: LocationPoint::new(req.lat, req.lon),
        })
        .await?;

    invalidate_caretaker_directory(&state).await;

    tracing::info!("Caretaker {} signed up", caretaker.id);
    Ok(HttpResponse::Created().json(caretaker))
}

/// GET /api/v1/caretaker/{caretaker_id}
async fn get_caretaker(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let caretaker_id = path.into_inner();

    let caretaker = state
        .postgres
        .get_caretaker(&caretaker_id)
        .await?
        .ok_or_else(|| caretaker_not_found(&caretaker_id))?;

    Ok(HttpResponse::Ok().json(caretaker))
}

/// PUT /api/v1/caretaker/{caretaker_id}
async fn edit_caretaker(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let caretaker_id = path.into_inner();
    user.require_caretaker(&caretaker_id)?;
    req.validate()?;

    let caretaker = state
        .postgres
        .update_caretaker(
            &caretaker_id,
            &AccountUpdate {
                address: &req.address,
                email: &req.email,
                phone: &req.phone,
                location: LocationPoint::new(req.lat, req.lon),
            },
        )
        .await?
        .ok_or_else(|| caretaker_not_found(&caretaker_id))?;

    invalidate_caretaker_directory(&state).await;

    Ok(HttpResponse::Accepted().json(caretaker))
}

/// DELETE /api/v1/caretaker/{caretaker_id}
async fn delete_caretaker(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let caretaker_id = path.into_inner();
    user.require_caretaker(&caretaker_id)?;

    if !state.postgres.delete_caretaker(&caretaker_id).await? {
        return Err(caretaker_not_found(&caretaker_id));
    }

    invalidate_caretaker_directory(&state).await;

    tracing::info!("Deleted caretaker {}", caretaker_id);
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/v1/caretaker/booking/{caretaker_id}
async fn get_caretaker_bookings(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let caretaker_id = path.into_inner();

    if state.postgres.get_caretaker(&caretaker_id).await?.is_none() {
        return Err(caretaker_not_found(&caretaker_id));
    }

    let bookings = state.postgres.get_caretaker_bookings(&caretaker_id).await?;
    if bookings.is_empty() {
        return Err(ApiError::NotFound(format!(
            "Caretaker with caretaker id {} has no bookings",
            caretaker_id
        )));
    }

    Ok(HttpResponse::Ok().json(bookings))
}

/// Current review average, computed on every call
async fn current_rating(state: &AppState, caretaker_id: &str) -> Result<RatingSummary, ApiError> {
    if state.postgres.get_caretaker(caretaker_id).await?.is_none() {
        return Err(caretaker_not_found(caretaker_id));
    }

    let bookings = state.postgres.get_caretaker_bookings(caretaker_id).await?;
    let reviews = state.postgres.get_caretaker_reviews(caretaker_id).await?;

    let summary = summarize_ratings(caretaker_id, &bookings, |booking_id| reviews.get(booking_id));

    tracing::debug!(
        "Caretaker {} rating: {:?} over {} reviews ({} bookings)",
        caretaker_id,
        summary.average_rating,
        summary.review_count,
        bookings.len()
    );
    Ok(summary)
}

/// Aggregate rating of a caretaker
///
/// GET /api/v1/caretaker/rating/{caretaker_id}
///
/// `averageRating` is `null` until at least one booking has been reviewed.
async fn get_caretaker_rating(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let caretaker_id = path.into_inner();
    let summary = current_rating(&state, &caretaker_id).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Store a rating on the caretaker record
///
/// PUT /api/v1/caretaker/rating/{caretaker_id}
///
/// Request body:
/// ```json
/// { "rating": 4.5 }
/// ```
/// `{}` stores the current review average instead.
async fn store_caretaker_rating(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    path: web::Path<String>,
    req: web::Json<UpdateRatingRequest>,
) -> Result<HttpResponse, ApiError> {
    let caretaker_id = path.into_inner();
    req.validate()?;

    let rating = match req.rating {
        Some(rating) => rating,
        None => current_rating(&state, &caretaker_id)
            .await?
            .average_rating
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "No rating available for caretaker with caretaker id {}",
                    caretaker_id
                ))
            })?,
    };

    let caretaker = state
        .postgres
        .update_caretaker_rating(&caretaker_id, rating)
        .await?
        .ok_or_else(|| caretaker_not_found(&caretaker_id))?;

    invalidate_caretaker_directory(&state).await;

    Ok(HttpResponse::Accepted().json(caretaker))
}
