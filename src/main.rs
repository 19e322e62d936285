//! Alarm Collector
//!
//! Main entry point for the collector service.

use alarm_collector::{
    alarm_validator::HttpAlarmValidator,
    collector_orchestrator::{CollectorService, CollectorStores},
    event_publisher::HttpBrokerPublisher,
    legacy_store::MySqlLegacyRepository,
    state::{AppConfig, AppState},
    traffic_service::TrafficService,
    traffic_store::MySqlTrafficRepository,
    web_api,
};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn connect(url: &str, max_connections: u32) -> anyhow::Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(url)
        .await?;
    Ok(pool)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alarm_collector=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Alarm Collector v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    tracing::info!(
        validator_url = %config.validator.base_url,
        broker_url = %config.broker.base_url,
        alarm_topic = %config.broker.alarm_topic,
        request_timeout_secs = config.request_timeout.as_secs(),
        traffic_guard = config.traffic_api_token.is_some(),
        "Configuration loaded"
    );

    // Database pools
    let pool = connect(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Primary database connected");
    let legacy_pool = connect(&config.legacy_database_url, config.db_max_connections).await?;
    tracing::info!("Legacy database connected");

    // Repositories
    let traffic_repo = Arc::new(MySqlTrafficRepository::new(pool));
    let legacy = Arc::new(MySqlLegacyRepository::new(legacy_pool));

    // Outbound clients
    let validator = Arc::new(HttpAlarmValidator::new(&config.validator)?);
    let publisher = Arc::new(HttpBrokerPublisher::new(&config.broker)?);

    let collector = CollectorService::new(
        CollectorStores {
            traffic: traffic_repo.clone(),
            routers: legacy.clone(),
            units: legacy.clone(),
            alarms: legacy.clone(),
            locations: legacy.clone(),
            facility_locations: legacy,
        },
        validator,
        publisher,
        config.broker.alarm_topic.clone(),
    );
    let traffic = TrafficService::new(traffic_repo);

    let state = AppState::new(config, collector, traffic)?;

    let app = web_api::create_router(state.clone())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
