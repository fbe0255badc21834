use actix_cors::Cors;
use actix_web::{web, App, HttpServer, middleware};
use petcare_match::config::Settings;
use petcare_match::core::ProximityRanker;
use petcare_match::routes::{self, AppState};
use petcare_match::services::{CacheManager, PostgresClient, TokenService};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting petcare-match service...");

    // Cache: Redis is optional, the in-process tier always exists
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

    let cache = match &settings.cache.redis_url {
        Some(url) => match CacheManager::new(url, l1_cache_size, cache_ttl).await {
            Ok(c) => {
                info!("Cache manager initialized with Redis (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);
                c
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), running with in-process cache only", e);
                CacheManager::in_memory(l1_cache_size, cache_ttl)
            }
        },
        None => {
            info!("No Redis configured, running with in-process cache only");
            CacheManager::in_memory(l1_cache_size, cache_ttl)
        }
    };

    let db_max_conn = settings.database.max_connections.unwrap_or(10);

    let postgres = match PostgresClient::from_settings(
        &settings.database.url,
        Some(db_max_conn),
        settings.database.min_connections,
        settings.database.acquire_timeout_secs,
        settings.database.idle_timeout_secs,
    )
    .await
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to PostgreSQL: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e));
        }
    };

    info!("PostgreSQL client initialized (max: {} connections)", db_max_conn);

    let tokens = TokenService::new(
        &settings.auth.jwt_secret,
        &settings.auth.jwt_refresh_secret,
        settings.auth.access_token_ttl_minutes,
        settings.auth.refresh_token_ttl_minutes,
    );

    let ranker = ProximityRanker::new(
        settings.recommendation.default_top_n,
        settings.recommendation.max_top_n,
    );

    info!(
        "Ranker initialized (default top {}, max {})",
        ranker.default_top_n(),
        ranker.max_top_n()
    );

    let app_state = AppState {
        postgres: Arc::new(postgres),
        cache: Arc::new(cache),
        tokens: Arc::new(tokens),
        ranker,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(routes::handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
