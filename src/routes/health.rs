use actix_web::{web, HttpResponse, Responder};
use crate::models::HealthResponse;
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}

/// Health check endpoint
///
/// Always 200; a failed database check reports `degraded`.
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = match state.postgres.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("PostgreSQL health check failed: {}", e);
            false
        }
    };

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: pg_healthy,
        cache: state.cache.stats(),
        timestamp: chrono::Utc::now(),
    })
}
