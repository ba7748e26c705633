mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::hooks::HookClient;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Session database pool
    pub db: DbPool,
    /// Outbound hook client (upload delivery, payment links, pay-later)
    pub hooks: Arc<HookClient>,
    /// Public base URL of this server (e.g., https://orders.example.com)
    pub base_url: String,
    /// Payment processor base, for synthesized fallback links
    pub processor_base_url: String,
    /// Per-file upload ceiling in bytes
    pub max_file_bytes: u64,
    /// Sessions untouched for this long are reaped
    pub session_ttl_secs: i64,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
