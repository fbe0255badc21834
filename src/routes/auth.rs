use actix_web::{dev::Payload, web, FromRequest, HttpRequest, HttpResponse};
use std::future::{ready, Ready};
use validator::Validate;
use crate::models::{LoginRequest, RefreshRequest, Role, TokenResponse};
use crate::routes::{ApiError, AppState};
use crate::services::verify_password;

/// Configure authentication routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/owner_signin", web::post().to(owner_signin))
        .route("/caretaker_signin", web::post().to(caretaker_signin))
        .route("/refresh", web::post().to(refresh));
}

/// Caller identity taken from a verified `Authorization: Bearer` access token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub role: Role,
}

impl AuthenticatedUser {
    /// Require the caller to be the owner with `owner_id`
    pub fn require_owner(&self, owner_id: &str) -> Result<(), ApiError> {
        self.require(Role::Owner, owner_id)
    }

    /// Require the caller to be the caretaker with `caretaker_id`
    pub fn require_caretaker(&self, caretaker_id: &str) -> Result<(), ApiError> {
        self.require(Role::Caretaker, caretaker_id)
    }

    fn require(&self, role: Role, id: &str) -> Result<(), ApiError> {
        if self.role != role || self.user_id != id {
            return Err(ApiError::Forbidden(format!(
                "Invalid {}. Authentication failed",
                role
            )));
        }
        Ok(())
    }

    fn from_http(req: &HttpRequest) -> Result<Self, ApiError> {
        let state = req
            .app_data::<web::Data<AppState>>()
            .ok_or_else(|| ApiError::Internal("Application state not configured".to_string()))?;

        let header = req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?
            .to_str()
            .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;

        let token = match header.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
            _ => {
                return Err(ApiError::Unauthorized(
                    "Invalid token type. Bearer token required".to_string(),
                ))
            }
        };

        let claims = state.tokens.verify_access(token)?;

        Ok(Self {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_http(req))
    }
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".to_string())
}

/// Owner login
///
/// POST /api/v1/authentication/owner_signin
async fn owner_signin(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let owner = state
        .postgres
        .get_owner_by_email(&req.username)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&req.password, &owner.password) {
        tracing::info!("Rejected owner login for {}", owner.id);
        return Err(invalid_credentials());
    }

    let pair = state.tokens.issue_pair(&owner.id, Role::Owner)?;
    tracing::info!("Owner {} signed in", owner.id);

    Ok(HttpResponse::Ok().json(TokenResponse {
        id: owner.id,
        name: owner.name,
        role: Role::Owner,
        token_type: "bearer".to_string(),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// Caretaker login
///
/// POST /api/v1/authentication/caretaker_signin
async fn caretaker_signin(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let caretaker = state
        .postgres
        .get_caretaker_by_email(&req.username)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&req.password, &caretaker.password) {
        tracing::info!("Rejected caretaker login for {}", caretaker.id);
        return Err(invalid_credentials());
    }

    let pair = state.tokens.issue_pair(&caretaker.id, Role::Caretaker)?;
    tracing::info!("Caretaker {} signed in", caretaker.id);

    Ok(HttpResponse::Ok().json(TokenResponse {
        id: caretaker.id,
        name: caretaker.name,
        role: Role::Caretaker,
        token_type: "bearer".to_string(),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// Exchange a refresh token for a new token pair
///
/// POST /api/v1/authentication/refresh
async fn refresh(
    state: web::Data<AppState>,
    req: web::Json<RefreshRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let claims = state.tokens.verify_refresh(&req.refresh_token)?;

    // The account may have been deleted since the token was issued
    let name = match claims.role {
        Role::Owner => state.postgres.get_owner(&claims.sub).await?.map(|o| o.name),
        Role::Caretaker => state.postgres.get_caretaker(&claims.sub).await?.map(|c| c.name),
    }
    .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    let pair = state.tokens.issue_pair(&claims.sub, claims.role)?;
    tracing::debug!("Refreshed tokens for {} {}", claims.role, claims.sub);

    Ok(HttpResponse::Ok().json(TokenResponse {
        id: claims.sub,
        name,
        role: claims.role,
        token_type: "bearer".to_string(),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}
