//! Account service library.
//!
//! Register a profile, authenticate with phone + password for a signed
//! bearer credential, and read or update the profile.  The binary in
//! `main.rs` wires this together; the library split exists so integration
//! tests can drive the same code paths.

use std::sync::Arc;

use tokio_rusqlite::Connection;

use shared::types::server_config::AppConfig;
use shared::validation::Rules;

pub mod database;
pub mod handlers;
pub mod keys;
pub mod token;

use token::TokenKeys;

/// Per-request context handed to every handler.
///
/// Everything here is read-only after startup (the database connection
/// serializes its own access), so cloning per connection is cheap and safe
/// under unbounded parallelism.
#[derive(Clone)]
pub struct AppState {
    pub db: Connection,
    pub config: Arc<AppConfig>,
    pub keys: Arc<TokenKeys>,
    pub rules: Arc<Rules>,
}
