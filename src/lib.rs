//! Portfolio CMS - content API and role-gated admin panel

pub mod auth;
pub mod compose;
pub mod config;
pub mod content;
pub mod db;
pub mod files;
pub mod logging;
pub mod routes;
pub mod state;
pub mod store;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};

use crate::auth::{AccountDirectory, AuthError, LoginRateLimiter, ProfileDirectory, SessionRegistry, UserProfile};
use crate::config::{AppConfig, ConfigError};
use crate::files::LocalFileStore;
use crate::state::AppState;
use crate::store::{DocumentStore, MemoryDocumentStore, PgDocumentStore, StoreError};

/// Request bodies are capped a little above the 5 MB upload limit.
const BODY_LIMIT_BYTES: usize = 6 * 1024 * 1024;

const SESSION_PRUNE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(300);

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to seed admin account: {0}")]
    Auth(#[from] AuthError),

    #[error("failed to seed admin profile: {0}")]
    Store(#[from] StoreError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors();

    Router::new()
        .route("/api/site", get(routes::public::get_site))
        .route("/api/projects", get(routes::public::list_projects))
        .route("/api/projects/{slug}", get(routes::public::get_project))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/session", get(routes::auth::session))
        .route("/api/admin/dashboard", get(routes::admin::dashboard))
        .route("/api/admin/uploads/{target}", post(routes::upload::upload_file))
        .route("/api/admin/files/{*path}", delete(routes::upload::delete_file))
        .route(
            "/api/admin/{collection}",
            get(routes::admin::read_collection)
                .post(routes::admin::create_item)
                .put(routes::admin::save_singleton),
        )
        .route(
            "/api/admin/{collection}/{id}",
            patch(routes::admin::update_item).delete(routes::admin::delete_item),
        )
        .route("/health", get(routes::health::health_ping))
        .route("/health/ready", get(routes::health::health_ready))
        .route("/health/store", get(routes::health::health_store))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Picks Postgres when DATABASE_URL is set, the in-memory store otherwise.
/// Outside production a database that cannot be reached falls back to memory.
async fn open_store(config: &AppConfig) -> Result<(Arc<dyn DocumentStore>, &'static str), StartupError> {
    let Some(db_config) = config.database.clone() else {
        tracing::info!("DATABASE_URL not set. Content is kept in memory for this run.");
        return Ok((Arc::new(MemoryDocumentStore::new()), "memory"));
    };

    let connected = async {
        let pool = db::init_pool(Some(db_config)).await?;
        db::run_migrations(&pool).await?;
        Ok::<_, sqlx::Error>(pool)
    }
    .await;

    match connected {
        Ok(pool) => Ok((Arc::new(PgDocumentStore::new(pool)), "postgres")),
        Err(e) if config.is_production() => Err(e.into()),
        Err(e) => {
            tracing::warn!(
                "Failed to initialize database: {}. Continuing with the in-memory store.",
                e
            );
            Ok((Arc::new(MemoryDocumentStore::new()), "memory"))
        }
    }
}

/// Registers the configured admin account and seeds its profile with ADMIN_ROLE.
async fn seed_admin(
    config: &AppConfig,
    accounts: &AccountDirectory,
    profiles: &ProfileDirectory,
) -> Result<(), StartupError> {
    let Some(email) = config.auth.admin_email.as_deref() else {
        tracing::warn!("ADMIN_EMAIL is not set. No account can sign in to the admin panel.");
        return Ok(());
    };

    let uid = match (&config.auth.admin_password_hash, &config.auth.admin_password) {
        (Some(hash), _) => accounts.add_hashed(email, hash).await,
        (None, Some(password)) => {
            if config.is_production() {
                tracing::warn!(
                    "SECURITY: ADMIN_PASSWORD is set in plain text. \
                     Set ADMIN_HASH_PASSWORD to a bcrypt hash instead."
                );
            }
            accounts
                .add_password(email, password, bcrypt::DEFAULT_COST)
                .await?
        }
        (None, None) => {
            tracing::warn!(
                "Neither ADMIN_HASH_PASSWORD nor ADMIN_PASSWORD is set. \
                 The admin account cannot sign in."
            );
            return Ok(());
        }
    };

    let seeded = profiles
        .seed(&UserProfile {
            uid,
            email: email.trim().to_lowercase(),
            role: config.auth.admin_role,
            display_name: None,
        })
        .await?;
    if seeded {
        tracing::info!(role = %config.auth.admin_role, "seeded admin profile");
    }
    Ok(())
}

/// Sweeps expired sessions on a fixed interval.
fn spawn_session_pruner(sessions: Arc<SessionRegistry>) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SESSION_PRUNE_INTERVAL);
        loop {
            tick.tick().await;
            sessions.prune_expired().await;
        }
    });
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    // Guards must be held for the programme's lifetime or buffered log lines are lost.
    let _log_guards = logging::init();

    routes::health::init_start_time();

    let config = AppConfig::from_env()?;
    config.validate()?;

    let (store, backend) = open_store(&config).await?;
    tracing::info!(backend, "document store ready");

    let accounts = Arc::new(AccountDirectory::new());
    let profiles = ProfileDirectory::new(store.clone());
    seed_admin(&config, &accounts, &profiles).await?;

    let sessions = Arc::new(SessionRegistry::new(
        accounts,
        profiles,
        config.auth.jwt_secret.clone(),
        chrono::Duration::hours(config.auth.session_ttl_hours),
    ));
    spawn_session_pruner(sessions.clone());
    let limiter = Arc::new(LoginRateLimiter::new(config.auth.login_attempts_per_minute));
    let files = Arc::new(LocalFileStore::new(
        config.upload_dir.clone(),
        config.public_base_url.clone(),
    ));

    let state = AppState::new(store, backend, files, sessions, limiter);
    let app = create_app(state).nest_service("/uploads", ServeDir::new(&config.upload_dir));

    let addr = config.socket_addr()?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
