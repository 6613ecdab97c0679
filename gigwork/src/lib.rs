//! # gigwork: accounts, worker onboarding and identity verification
//!
//! `gigwork` is the backend of a gig-work marketplace. People register an account, may promote
//! themselves to workers offering a service, and then prove their identity by uploading
//! documents. Administrators review each document; the worker's verification status follows
//! from the decisions on all of their documents.
//!
//! ## Architecture
//!
//! The HTTP layer is built on [Axum](https://github.com/tokio-rs/axum). Persistence goes through
//! the [`store::AccountStore`] trait, backed either by PostgreSQL or by an in-process store for
//! development. Uploaded files live outside the database behind
//! [`db::handlers::file_storage::FileStorage`].
//!
//! ### Core Components
//!
//! - **API layer** ([`api`]): thin handlers under `/authentication/*`, `/api/v1/*` and
//!   `/admin/api/v1/*`, documented with OpenAPI at `/docs`
//! - **Authentication** ([`auth`]): argon2 password hashes and signed access/refresh tokens that
//!   can be revoked per account
//! - **Verification** ([`verification`]): the workflow owning every state change, the status
//!   aggregation rules and the admin registry
//! - **Persistence** ([`store`], [`db`]): transactional units of work over the repositories
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use gigwork::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = gigwork::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     gigwork::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     Application::new(config)
//!         .await?
//!         .serve(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await
//! }
//! ```
//!
//! ## Database Setup
//!
//! With `database.type: external`, migrations run on startup. They can also be applied directly:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! gigwork::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod verification;

#[cfg(test)]
pub mod test_utils;

use crate::{
    auth::AuthService,
    config::{CorsOrigin, DatabaseConfig},
    db::handlers::file_storage::create_file_storage,
    openapi::ApiDoc,
    store::{AccountStore, MemoryStore, PgAccountStore},
    verification::{registry::AdminRegistry, VerificationWorkflow, WorkflowPolicy},
};
use axum::extract::DefaultBodyLimit;
use axum::http::{self, HeaderValue};
use axum::{
    routing::{delete, get, post},
    Json, Router,
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{AccountId, DocumentId, WorkerProfileId};

/// Room for multipart boundaries and the text fields next to the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .workflow(workflow)
///     .auth(auth)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub workflow: VerificationWorkflow,
    pub auth: AuthService,
}

/// Get the gigwork database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect the configured store, running migrations for PostgreSQL
#[instrument(skip_all)]
async fn setup_store(config: &Config) -> anyhow::Result<Arc<dyn AccountStore>> {
    match &config.database {
        DatabaseConfig::External { url, pool } => {
            info!("Using external database");
            let pg_pool = PgPoolOptions::new()
                .max_connections(pool.max_connections)
                .min_connections(pool.min_connections)
                .acquire_timeout(pool.acquire_timeout)
                .idle_timeout(Some(pool.idle_timeout))
                .max_lifetime(Some(pool.max_lifetime))
                .connect(url)
                .await?;
            migrator().run(&pg_pool).await?;
            Ok(Arc::new(PgAccountStore::new(pg_pool)))
        }
        DatabaseConfig::Memory => {
            info!("Using in-memory store: data will be lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Wire the store, file storage and admin registry into the shared state, and bootstrap the
/// initial administrator when a password is configured.
pub async fn build_state(config: Config) -> anyhow::Result<AppState> {
    let store = setup_store(&config).await?;
    let files = create_file_storage(&config.files.storage).await?;
    let registry = Arc::new(AdminRegistry::from_config(&config.admin));

    let workflow = VerificationWorkflow::new(store.clone(), files, registry, WorkflowPolicy::from(&config));

    if let Some(password) = config.admin_password.as_deref() {
        workflow
            .ensure_admin(&config.admin_email, password)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create initial admin account: {}", e))?;
    }

    let auth = AuthService::new(store, config.clone());
    Ok(AppState::builder().config(config).workflow(workflow).auth(auth).build())
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allowed = &config.auth.security.cors.allowed_origins;
    // A wildcard cannot be mixed into an explicit origin list
    let allow_origin = if allowed.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in allowed {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::PATCH,
            http::Method::DELETE,
        ])
        .allow_headers(vec![http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware:
///
/// - Authentication routes at `/authentication/*`
/// - Self-service routes at `/api/v1/*`
/// - Administration routes at `/admin/api/v1/*`
/// - OpenAPI document and Scalar UI
/// - Optional Prometheus metrics at `/internal/metrics`
/// - CORS and request tracing
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        .route("/authentication/register", post(api::handlers::auth::register))
        .route("/authentication/login", post(api::handlers::auth::login))
        .route("/authentication/refresh", post(api::handlers::auth::refresh))
        .route("/authentication/logout-all", post(api::handlers::auth::logout_all))
        .with_state(state.clone());

    let upload_limit = state.config.files.max_file_size as usize + MULTIPART_OVERHEAD;
    let api_routes = Router::new()
        .route("/me", get(api::handlers::accounts::get_me).delete(api::handlers::accounts::delete_me))
        .route(
            "/profile",
            get(api::handlers::profiles::get_profile).patch(api::handlers::profiles::update_profile),
        )
        .route("/become-worker", post(api::handlers::workers::become_worker))
        .route(
            "/worker/profile",
            get(api::handlers::workers::get_worker_profile).patch(api::handlers::workers::update_worker_profile),
        )
        .route(
            "/worker/documents",
            get(api::handlers::documents::list_documents)
                .post(api::handlers::documents::upload_document)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/accounts", get(api::handlers::admin::list_accounts))
        .route("/accounts/{id}", delete(api::handlers::admin::delete_account))
        .route("/workers", get(api::handlers::admin::list_workers))
        .route("/documents", get(api::handlers::admin::list_documents))
        .route("/documents/{id}", get(api::handlers::admin::get_document))
        .route("/documents/{id}/content", get(api::handlers::admin::get_document_content))
        .route("/documents/{id}/decision", post(api::handlers::admin::decide))
        .route("/registry", get(api::handlers::admin::get_registry))
        .with_state(state.clone());

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(auth_routes)
        .nest("/api/v1", api_routes)
        .nest("/admin/api/v1", admin_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_request(DefaultOnRequest::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(create_cors_layer(&state.config)?),
    );

    Ok(router)
}

pub struct Application {
    router: Router,
    app_state: AppState,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting gigwork with configuration: {:#?}", config);

        let app_state = build_state(config.clone()).await?;
        let router = build_router(&app_state)?;

        Ok(Self {
            router,
            app_state,
            config,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> (axum_test::TestServer, AppState) {
        let server = axum_test::TestServer::new(self.router).expect("Failed to create test server");
        (server, self.app_state)
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("gigwork listening on http://{}, docs at http://localhost:{}/docs", bind_addr, self.config.port);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Releasing store connections...");
        drop(self.app_state);

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
