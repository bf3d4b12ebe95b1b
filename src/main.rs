//! Tutoria subscription service
//!
//! ## REST Endpoints
//!
//! - `GET /api/subscription` - Current user's subscription
//! - `POST /api/subscription` - Start a subscription (303 to the card page)
//! - `POST /subscription/result` - Gateway return after card registration
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe

use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use tutoria::adapters::http::subscription::SubscriptionRedirects;
use tutoria::adapters::http::{app_router, SubscriptionAppState};
use tutoria::adapters::{FlowGatewayClient, PostgresMemberStore};
use tutoria::config::AppConfig;
use tutoria::ports::{MemberStore, PaymentGateway};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load and validate configuration (reads .env first)
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config)?;
    tracing::info!(
        environment = ?config.server.environment,
        gateway = %config.gateway.base_url(),
        sandbox = config.gateway.is_sandbox(),
        "Starting Tutoria subscription service"
    );

    // Member store
    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }
    let member_store: Arc<dyn MemberStore> = Arc::new(PostgresMemberStore::new(pool));

    // Payment gateway
    let http_client = reqwest::Client::builder()
        .timeout(config.server.request_timeout())
        .build()?;
    let gateway: Arc<dyn PaymentGateway> =
        Arc::new(FlowGatewayClient::new(&config.gateway)?.with_http_client(http_client));

    let state = SubscriptionAppState {
        gateway,
        member_store,
        plans: config.gateway.plan_catalog(),
        redirects: SubscriptionRedirects::new(config.server.public_base_url())?,
    };
    let app = app_router(state, config.server.request_timeout());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Installs the global subscriber. `RUST_LOG` overrides the configured level;
/// production logs are JSON.
fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.server.log_level)?,
    };
    let json = config.is_production();

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .try_init()?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
