//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::auth::JwtManager;
use crate::email::Mailer;
use minimart_db::Database;

/// Cloneable state: the pool handle inside `Database` is reference-counted,
/// the rest sits behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    /// `None` when SMTP is not configured; invoice email is then skipped.
    pub mailer: Option<Arc<Mailer>>,
}
