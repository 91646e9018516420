//! Application state for helpdesk.
//!
//! Contains the shared state that is passed to all handlers. The stores are
//! built once at startup and cloned into each request; a clone shares the
//! underlying pool.

use crate::config::Config;
use crate::db::{AccountStore, TicketStore};
use crate::Result;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Users and credentials.
    pub accounts: AccountStore,
    /// Tickets, projects and comments.
    pub tickets: TicketStore,
}

impl AppState {
    /// Open both stores from configuration, creating files and schemas as needed.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = &config.database;
        let tickets = TicketStore::open(&db.path, db.max_connections).await?;
        let accounts = AccountStore::open(&db.auth_path, db.max_connections).await?;

        Ok(Self::from_stores(accounts, tickets))
    }

    /// Assemble state from already-open stores.
    pub fn from_stores(accounts: AccountStore, tickets: TicketStore) -> Self {
        Self { accounts, tickets }
    }
}
