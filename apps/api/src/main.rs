mod auth;
mod config;
mod db;
mod errors;
mod forms;
mod models;
mod notify;
mod profile;
mod render;
mod routes;
mod state;
mod store;
mod translation;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::ensure_staff_user;
use crate::config::Config;
use crate::db::create_pool;
use crate::notify::smtp::{SmtpMailer, UnconfiguredTransport};
use crate::notify::{MailTransport, Notifier};
use crate::profile::catalog::Catalog;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgRecordStore;
use crate::translation::MyMemoryClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Vocari API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs pending migrations)
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgRecordStore::new(db));
    if let Some(staff) = &config.staff_account {
        ensure_staff_user(store.as_ref(), &staff.username, &staff.password).await?;
    }

    // Initialize translation client
    let translator = MyMemoryClient::new(
        config.translation.api_url.clone(),
        Duration::from_secs(config.translation.timeout_secs),
        config.translation.max_attempts,
    )?;
    info!(
        "Translation client initialized ({} -> {})",
        config.translation.api_url, config.translation.target_lang
    );

    // Initialize mail transport
    let transport: Arc<dyn MailTransport> = match &config.smtp {
        Some(smtp) => {
            info!("SMTP transport initialized ({}:{})", smtp.host, smtp.port);
            Arc::new(SmtpMailer::new(smtp)?)
        }
        None => {
            warn!("No SMTP host configured; email delivery is disabled");
            Arc::new(UnconfiguredTransport)
        }
    };
    let notifier = Notifier::new(
        transport,
        config.email_delivery_enabled,
        config.default_from_email.clone(),
    );
    info!("Email delivery enabled: {}", notifier.delivery_enabled());

    // Build app state
    let state = AppState {
        store,
        translator: Arc::new(translator),
        notifier,
        catalog: Arc::new(Catalog::standard()),
        target_lang: config.translation.target_lang.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
