use actix_web::{web, HttpResponse};
use validator::Validate;
use crate::core::ProximityRanker;
use crate::models::{
    Booking, CreateBookingRequest, CreatePetRequest, CreateReviewRequest, LocationPoint, Pet, RecommendQuery,
    RecommendResponse, Review, SignupRequest, UpdateProfileRequest,
};
use crate::routes::{caretaker_directory, ApiError, AppState, AuthenticatedUser};
use crate::services::{hash_password, AccountUpdate, NewAccount};

/// Configure owner routes
///
/// Literal paths are registered before `{owner_id}` patterns.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/signup", web::post().to(owner_signup))
        .route("/add_pet", web::post().to(add_pet))
        .route("/booking", web::post().to(create_booking))
        .route("/review", web::post().to(create_review))
        .route("/owner_pet/{owner_id}", web::get().to(get_owner_pets))
        .route("/pet/{pet_id}", web::get().to(get_pet))
        .route("/booking/{owner_id}", web::get().to(get_owner_bookings))
        .route("/booking_info/{booking_id}", web::get().to(get_booking_info))
        .route("/recommend/{owner_id}", web::get().to(recommend_caretakers))
        .route("/{owner_id}", web::get().to(get_owner))
        .route("/{owner_id}", web::put().to(edit_owner))
        .route("/{owner_id}", web::delete().to(delete_owner));
}

fn owner_not_found(owner_id: &str) -> ApiError {
    ApiError::NotFound(format!("Owner with owner id: {} not found", owner_id))
}

/// Create an owner account
///
/// POST /api/v1/owner/signup
async fn owner_signup(
    state: web::Data<AppState>,
    req: web::Json<SignupRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    if state.postgres.get_owner_by_email(&req.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }
    if state.postgres.get_owner_by_phone(&req.phone).await?.is_some() {
        return Err(ApiError::Conflict("Phone number already exists".to_string()));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let password_hash = hash_password(&req.password)?;

    let owner = state
        .postgres
        .create_owner(&NewAccount {
            id: &id,
            name: &req.name,
            address: &req.address,
            email: &req.email,
            password_hash: &password_hash,
            phone: &req.phone,
            location: LocationPoint::new(req.lat, req.lon),
        })
        .await?;

    tracing::info!("Owner {} signed up", owner.id);
    Ok(HttpResponse::Created().json(owner))
}

/// GET /api/v1/owner/{owner_id}
async fn get_owner(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let owner_id = path.into_inner();
    user.require_owner(&owner_id)?;

    let owner = state
        .postgres
        .get_owner(&owner_id)
        .await?
        .ok_or_else(|| owner_not_found(&owner_id))?;

    Ok(HttpResponse::Ok().json(owner))
}

/// PUT /api/v1/owner/{owner_id}
async fn edit_owner(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let owner_id = path.into_inner();
    user.require_owner(&owner_id)?;
    req.validate()?;

    let owner = state
        .postgres
        .update_owner(
            &owner_id,
            &AccountUpdate {
                address: &req.address,
                email: &req.email,
                phone: &req.phone,
                location: LocationPoint::new(req.lat, req.lon),
            },
        )
        .await?
        .ok_or_else(|| owner_not_found(&owner_id))?;

    Ok(HttpResponse::Accepted().json(owner))
}

/// DELETE /api/v1/owner/{owner_id}
async fn delete_owner(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let owner_id = path.into_inner();
    user.require_owner(&owner_id)?;

    if !state.postgres.delete_owner(&owner_id).await? {
        return Err(owner_not_found(&owner_id));
    }

    tracing::info!("Deleted owner {}", owner_id);
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/v1/owner/add_pet
async fn add_pet(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreatePetRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require_owner(&req.owner_id)?;
    req.validate()?;

    let req = req.into_inner();
    let pet = state
        .postgres
        .create_pet(&Pet {
            id: uuid::Uuid::new_v4().to_string(),
            name: req.name,
            age: req.age,
            breed: req.breed,
            gender: req.gender,
            owner_id: req.owner_id,
        })
        .await?;

    tracing::debug!("Owner {} added pet {}", pet.owner_id, pet.id);
    Ok(HttpResponse::Created().json(pet))
}

/// GET /api/v1/owner/owner_pet/{owner_id}
async fn get_owner_pets(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let owner_id = path.into_inner();
    user.require_owner(&owner_id)?;

    let pets = state.postgres.get_owner_pets(&owner_id).await?;
    if pets.is_empty() {
        return Err(ApiError::NotFound(format!(
            "Owner with owner id: {} has no pets",
            owner_id
        )));
    }

    Ok(HttpResponse::Ok().json(pets))
}

/// GET /api/v1/owner/pet/{pet_id}
async fn get_pet(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let pet_id = path.into_inner();

    let pet = state
        .postgres
        .get_pet(&pet_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Pet with pet id: {} not found", pet_id)))?;
    user.require_owner(&pet.owner_id)?;

    Ok(HttpResponse::Ok().json(pet))
}

/// POST /api/v1/owner/booking
async fn create_booking(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require_owner(&req.owner_id)?;
    req.validate()?;

    if state.postgres.get_caretaker(&req.caretaker_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "Caretaker with caretaker id: {} not found",
            req.caretaker_id
        )));
    }

    let req = req.into_inner();
    let booking = state
        .postgres
        .create_booking(&Booking {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: req.owner_id,
            caretaker_id: req.caretaker_id,
            date_of_booking: chrono::Utc::now(),
            instruction: req.instruction,
        })
        .await?;

    tracing::info!(
        "Booking {} created: owner {} -> caretaker {}",
        booking.id,
        booking.owner_id,
        booking.caretaker_id
    );
    Ok(HttpResponse::Created().json(booking))
}

/// GET /api/v1/owner/booking/{owner_id}
async fn get_owner_bookings(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let owner_id = path.into_inner();
    user.require_owner(&owner_id)?;

    let bookings = state.postgres.get_owner_bookings(&owner_id).await?;
    if bookings.is_empty() {
        return Err(ApiError::NotFound(format!(
            "Owner with owner id: {} has no bookings",
            owner_id
        )));
    }

    Ok(HttpResponse::Ok().json(bookings))
}

/// GET /api/v1/owner/booking_info/{booking_id}
async fn get_booking_info(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let booking_id = path.into_inner();

    let booking = state
        .postgres
        .get_booking(&booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Booking id {} not found", booking_id)))?;
    user.require_owner(&booking.owner_id)?;

    Ok(HttpResponse::Ok().json(booking))
}

/// Review a booking
///
/// POST /api/v1/owner/review
///
/// Only the owner who made the booking may review it, once.
async fn create_review(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let booking = state
        .postgres
        .get_booking(&req.booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Booking id {} not found", req.booking_id)))?;
    user.require_owner(&booking.owner_id)?;

    if state.postgres.get_review_for_booking(&booking.id).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Booking id {} has already been reviewed",
            booking.id
        )));
    }

    let req = req.into_inner();
    let review = state
        .postgres
        .create_review(&Review {
            id: uuid::Uuid::new_v4().to_string(),
            booking_id: booking.id,
            rating: req.rating,
            comment: req.comment,
            date_of_review: chrono::Utc::now(),
        })
        .await?;

    tracing::info!(
        "Review {} ({} stars) recorded for caretaker {}",
        review.id,
        review.rating,
        booking.caretaker_id
    );
    Ok(HttpResponse::Created().json(review))
}

/// Recommend the caretakers closest to an owner
///
/// GET /api/v1/owner/recommend/{owner_id}?limit=3
async fn recommend_caretakers(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    query: web::Query<RecommendQuery>,
) -> Result<HttpResponse, ApiError> {
    let owner_id = path.into_inner();
    user.require_owner(&owner_id)?;

    let owner = state
        .postgres
        .get_owner(&owner_id)
        .await?
        .ok_or_else(|| owner_not_found(&owner_id))?;

    let caretakers = caretaker_directory(&state).await?;
    let total_candidates = caretakers.len();

    if total_candidates == 0 {
        return Err(ApiError::NotFound(format!(
            "No caretakers nearby for owner with owner id {}",
            owner_id
        )));
    }

    let top_n = state.ranker.resolve_top_n(query.limit);
    let ranked = ProximityRanker::rank_with_distance(owner.location(), caretakers, top_n);

    tracing::info!(
        "Returning {} caretakers for owner {} (from {} candidates)",
        ranked.len(),
        owner_id,
        total_candidates
    );

    Ok(HttpResponse::Ok().json(RecommendResponse {
        owner_id,
        caretakers: ranked,
        total_candidates,
    }))
}
