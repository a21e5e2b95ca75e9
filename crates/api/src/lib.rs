//! SheSecure API Server
//!
//! REST API for accounts, unsafe-area reports, route safety scoring and SOS.

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use route_safety::RouteSafetyScorer;
use sos::{SmsGateway, SosDispatcher};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod rate_limit;
mod routes;
pub mod validation;

pub use crate::config::ApiConfig;
pub use crate::error::ApiError;

use crate::rate_limit::{create_governor_config, RateLimitConfig};
use storage::Repository;

/// Shared handle passed to every handler
pub type SharedState = Arc<RwLock<AppState>>;

/// Application state shared across handlers
pub struct AppState {
    /// Storage repository
    pub repository: Repository,
    /// Route safety scorer
    pub scorer: RouteSafetyScorer,
    /// SOS fan-out
    pub dispatcher: SosDispatcher,
    pub config: ApiConfig,
    /// Prometheus handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ApiConfig, gateway: SmsGateway) -> Self {
        Self {
            repository: Repository::new(),
            scorer: RouteSafetyScorer::new(),
            dispatcher: SosDispatcher::new(gateway, config.max_sos_contacts),
            config,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }
}

/// Create the application router
///
/// Login, signup and SOS are rate limited per peer IP when `rate_limit`
/// is given, which requires serving with connect info.
pub fn create_router(state: SharedState, rate_limit: Option<&RateLimitConfig>) -> Router {
    let mut sensitive = Router::new()
        .route("/api/login", post(routes::accounts::login))
        .route("/api/signup", post(routes::accounts::signup))
        .route("/api/sos", post(routes::emergency::send_sos));

    if let Some(limit) = rate_limit {
        match create_governor_config(limit) {
            Some(config) => sensitive = sensitive.layer(GovernorLayer { config }),
            None => warn!("Invalid rate limit {:?}, serving without limits", limit),
        }
    }

    Router::new()
        .route("/", get(routes::health::root))
        .route("/test", get(routes::health::test_database))
        .route("/metrics", get(routes::health::metrics))
        .route(
            "/api/profile/:user_id",
            get(routes::accounts::get_profile)
                .put(routes::accounts::update_profile)
                .delete(routes::accounts::delete_account),
        )
        .route("/api/report", post(routes::reports::create_report))
        .route("/api/reports", get(routes::reports::list_reports))
        .route("/api/route-safety", post(routes::route_safety::route_safety))
        .merge(sensitive)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize logging
pub fn init_logging(config: &ApiConfig) -> anyhow::Result<()> {
    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if config.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Install the global Prometheus recorder
pub fn install_metrics() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// Run the server
pub async fn run_server(config: ApiConfig) -> anyhow::Result<()> {
    let gateway = SmsGateway::from_config(config.twilio.clone())?;
    if gateway.is_simulated() {
        info!("Twilio credentials not configured, SOS messages will be simulated");
    }

    let addr = config.server.addr();
    let rate_limit = config.rate_limit.clone();
    let state = AppState::new(config, gateway)
        .with_metrics(install_metrics()?)
        .shared();
    let app = create_router(state, Some(&rate_limit));

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
