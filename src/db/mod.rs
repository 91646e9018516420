//! Database layer for helpdesk.
//!
//! Two independently owned SQLite files back the service: the account store
//! (users) and the ticket store (tickets, projects, comments). Each store
//! wraps its own pool and bootstraps its own schema.

mod comments;
mod pool;
mod projects;
mod tickets;
mod users;

pub use comments::*;
pub use pool::*;
pub use projects::*;
pub use tickets::*;
pub use users::*;

use chrono::{SecondsFormat, Utc};
use tracing::info;

use crate::Result;

/// Type alias for the SQLite connection pool.
pub type DbPool = sqlx::SqlitePool;

pub const TICKETS_SCHEMA: &str = include_str!("../../schema/tickets.sql");
pub const ACCOUNTS_SCHEMA: &str = include_str!("../../schema/accounts.sql");

const ID_ALPHABET: [char; 36] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r',
    's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

/// Open a pool at `path` with the given connection limit.
pub async fn init_pool(path: &str, max_connections: u32) -> Result<DbPool> {
    let pool =
        create_pool_with_config(path, PoolConfig::new().with_max_connections(max_connections))
            .await?;

    info!("Database pool initialized: {}", path);

    Ok(pool)
}

/// Apply a schema script.
///
/// Comment lines are dropped first, then the script is split on semicolons
/// and each statement executed. Scripts only use IF NOT EXISTS clauses so this
/// is safe to run on every startup.
pub async fn initialize_schema(pool: &DbPool, schema: &str) -> Result<()> {
    let script: String = schema
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    for statement in script.split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}

/// Generate an opaque record ID: millisecond timestamp, underscore, nine
/// random `[a-z0-9]` characters. IDs sort lexicographically in creation order
/// (to millisecond resolution).
pub fn generate_id() -> String {
    format!(
        "{}_{}",
        Utc::now().timestamp_millis(),
        nanoid::nanoid!(9, &ID_ALPHABET)
    )
}

/// Current time as an RFC 3339 UTC string with microseconds.
///
/// Fixed width, so string order matches time order in `ORDER BY`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
