// Route exports
pub mod auth;
pub mod caretakers;
pub mod health;
pub mod owners;

use actix_web::{error, http::StatusCode, web, HttpRequest, HttpResponse, ResponseError};
use std::sync::Arc;
use thiserror::Error;
use crate::core::ProximityRanker;
use crate::models::{Caretaker, ErrorResponse};
use crate::services::{AuthError, CacheKey, CacheManager, PostgresClient, PostgresError, TokenService};

pub use auth::AuthenticatedUser;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub cache: Arc<CacheManager>,
    pub tokens: Arc<TokenService>,
    pub ranker: ProximityRanker,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::configure)
            .service(web::scope("/authentication").configure(auth::configure))
            .service(web::scope("/owner").configure(owners::configure))
            .service(web::scope("/caretaker").configure(caretakers::configure)),
    );
}

/// Error type returned by every handler
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Database(#[from] PostgresError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

impl ApiError {
    fn label(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_failed",
            ApiError::Unauthorized(_) | ApiError::Auth(AuthError::InvalidToken(_)) => "unauthorized",
            ApiError::Auth(AuthError::WrongTokenType { .. }) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) | ApiError::Database(PostgresError::Conflict(_)) => "conflict",
            ApiError::Internal(_) | ApiError::Database(_) | ApiError::Auth(_) => "internal_error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::InvalidToken(_) | AuthError::WrongTokenType { .. }) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::Database(PostgresError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Internal(_) | ApiError::Database(_) | ApiError::Auth(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: self.label().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

/// Render JSON payload errors in the API error shape
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    });
    error::InternalError::from_response(err, response).into()
}

/// Render query string errors in the API error shape
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    });
    error::InternalError::from_response(err, response).into()
}

/// Caretakers used for ranking, read through the cache
///
/// Cache failures fall back to the database and are only logged. A list
/// loaded before a concurrent caretaker write is not cached.
pub(crate) async fn caretaker_directory(state: &AppState) -> Result<Vec<Caretaker>, ApiError> {
    let key = CacheKey::caretaker_directory();
    let epoch = state.cache.invalidation_epoch();

    match state.cache.get::<Vec<Caretaker>>(&key).await {
        Ok(Some(caretakers)) => return Ok(caretakers),
        Ok(None) => {}
        Err(e) => tracing::warn!("Caretaker directory cache read failed: {}", e),
    }

    let caretakers = state.postgres.get_all_caretakers().await?;

    if let Err(e) = state.cache.set_unless_invalidated(&key, &caretakers, epoch).await {
        tracing::warn!("Failed to cache caretaker directory: {}", e);
    }

    Ok(caretakers)
}

/// Drop the cached caretaker directory after any caretaker write
pub(crate) async fn invalidate_caretaker_directory(state: &AppState) {
    if let Err(e) = state.cache.delete(&CacheKey::caretaker_directory()).await {
        tracing::warn!("Failed to invalidate caretaker directory: {}", e);
    }
}
