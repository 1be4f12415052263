//! # Minimart API server binary
//!
//! Startup order: logging → config → database (+ migrations) → admin
//! bootstrap → optional mailer → router → serve.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use minimart_db::{Database, DbConfig};
use minimart_server::config::AppConfig;
use minimart_server::email::Mailer;
use minimart_server::state::AppState;
use minimart_server::{auth::JwtManager, bootstrap_admin, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Minimart API server");

    let config = AppConfig::load()?;
    info!(
        port = config.http_port,
        db = %config.database_path,
        "Configuration loaded"
    );

    let db = Database::new(DbConfig::new(&config.database_path)).await?;

    bootstrap_admin(&db, &config).await?;

    // Mailer is optional: a misconfigured relay logs a warning and the
    // server runs without invoice email.
    let mailer = match &config.smtp {
        Some(smtp) => match Mailer::from_config(smtp, &config.store_name) {
            Ok(mailer) => Some(Arc::new(mailer)),
            Err(e) => {
                warn!(error = %e, "Invoice mailer disabled");
                None
            }
        },
        None => None,
    };

    let jwt = Arc::new(JwtManager::new(
        config.jwt_secret.clone(),
        config.jwt_lifetime_secs,
    ));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));

    let state = AppState {
        db: db.clone(),
        jwt,
        mailer,
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app).await?;

    db.close().await;
    Ok(())
}
