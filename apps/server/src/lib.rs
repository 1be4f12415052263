//! # Minimart HTTP server
//!
//! The network-facing layer of the Minimart backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Client ──► axum Router ──► handler                                 │
//! │                              │  1. AuthUser extractor (JWT, role)   │
//! │                              │  2. input validation                 │
//! │                              │  3. repository call (minimart-db)    │
//! │                              │  4. {success, message?, data?}       │
//! │                              ▼                                      │
//! │                          SQLite                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod handlers;
pub mod response;
pub mod state;

use tracing::{info, warn};

use crate::auth::hash_password;
use crate::config::AppConfig;
use minimart_core::Role;
use minimart_db::repository::user::NewUser;
use minimart_db::Database;

pub use handlers::router;

/// Creates the initial admin account when the users table is empty.
///
/// Runs on every startup and does nothing once any user exists, so a wiped
/// database always comes back reachable.
pub async fn bootstrap_admin(db: &Database, config: &AppConfig) -> anyhow::Result<()> {
    if db.users().count().await? > 0 {
        return Ok(());
    }

    let password_hash = hash_password(&config.admin_password)?;

    let admin = db
        .users()
        .insert(NewUser {
            username: config.admin_username.clone(),
            password_hash,
            full_name: "Administrator".to_string(),
            email: None,
            phone: None,
            role: Role::Admin,
        })
        .await?;

    info!(username = %admin.username, "Bootstrapped initial admin account");
    warn!("Change the default admin password before exposing this server");

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
