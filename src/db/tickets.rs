//! Ticket store: ticket queries.
//!
//! [`TicketStore`] owns the ticket database (tickets, comments, projects).
//! Project and comment queries live in their own modules as further `impl`
//! blocks on the same store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::{debug, info};

use super::{generate_id, init_pool, initialize_schema, now_timestamp, DbPool, TICKETS_SCHEMA};
use crate::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Ticket priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ticket lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Closed => "CLOSED",
        }
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Self::Open),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "CLOSED" => Ok(Self::Closed),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ticket record from the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TicketStatus,
    pub reporter: String,
    pub project_id: Option<String>,
}

/// Ticket plus the number of comments attached to it.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub ticket: Ticket,
    pub comment_count: i64,
}

/// Input for creating a ticket. Status is not part of it: new tickets are
/// always OPEN.
#[derive(Debug, Clone)]
pub struct CreateTicket {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub reporter: String,
    pub project_id: Option<String>,
}

/// Input for updating a ticket. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateTicket {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TicketStatus>,
    pub reporter: Option<String>,
}

impl UpdateTicket {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.reporter.is_none()
    }
}

/// Filter for listing tickets. Blank values mean "no filter".
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    /// Substring matched against title or description.
    pub query: Option<String>,
    /// Exact status. `ALL` is normalized away.
    pub status: Option<String>,
    /// A leaf project id, or a parent whose children are matched instead.
    pub project_id: Option<String>,
}

impl TicketFilter {
    pub fn new(query: Option<String>, status: Option<String>, project_id: Option<String>) -> Self {
        let present = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            query: present(query),
            status: present(status).filter(|s| s != "ALL"),
            project_id: present(project_id),
        }
    }
}

/// One condition in the ticket listing WHERE clause. Values are always bound.
#[derive(Debug, Clone, PartialEq)]
enum TicketPredicate {
    ProjectIn(Vec<String>),
    ProjectIs(String),
    Matches(String),
    StatusIs(String),
}

impl TicketPredicate {
    fn push_to(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Self::ProjectIn(ids) => {
                qb.push(" AND t.project_id IN (");
                let mut list = qb.separated(", ");
                for id in ids {
                    list.push_bind(id.clone());
                }
                qb.push(")");
            }
            Self::ProjectIs(id) => {
                qb.push(" AND t.project_id = ").push_bind(id.clone());
            }
            Self::Matches(text) => {
                let pattern = like_pattern(text);
                qb.push(r" AND (t.title LIKE ")
                    .push_bind(pattern.clone())
                    .push(r" ESCAPE '\' OR t.description LIKE ")
                    .push_bind(pattern)
                    .push(r" ESCAPE '\')");
            }
            Self::StatusIs(status) => {
                qb.push(" AND t.status = ").push_bind(status.clone());
            }
        }
    }
}

/// `%text%` with LIKE wildcards in `text` escaped, so it matches literally.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

const SELECT_WITH_COUNT: &str = r#"
    SELECT t.*,
        (SELECT COUNT(*) FROM comments c WHERE c.ticket_id = t.id) AS comment_count
    FROM tickets t
"#;

// ============================================================================
// Store
// ============================================================================

/// Store for tickets, projects and comments.
#[derive(Clone)]
pub struct TicketStore {
    pub(super) db: DbPool,
}

impl TicketStore {
    /// Wrap an existing pool, creating the schema if absent.
    pub async fn new(db: DbPool) -> Result<Self> {
        initialize_schema(&db, TICKETS_SCHEMA).await?;
        info!("Ticket store schema ready");
        Ok(Self { db })
    }

    /// Open (or create) the ticket database file at `path`.
    pub async fn open(path: &str, max_connections: u32) -> Result<Self> {
        let db = init_pool(path, max_connections).await?;
        Self::new(db).await
    }

    pub fn pool(&self) -> &DbPool {
        &self.db
    }

    /// Create a ticket. Status is forced to OPEN and both timestamps are equal.
    pub async fn create_ticket(&self, input: CreateTicket) -> Result<Ticket> {
        let id = generate_id();
        let now = now_timestamp();

        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (id, created_at, updated_at, title, description, priority, status, reporter, project_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&now)
        .bind(&now)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.priority)
        .bind(TicketStatus::Open)
        .bind(&input.reporter)
        .bind(&input.project_id)
        .fetch_one(&self.db)
        .await?;

        info!(id = %ticket.id, priority = %ticket.priority, "Created ticket");

        Ok(ticket)
    }

    /// List tickets matching `filter`, most recently updated first.
    pub async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<TicketWithCount>> {
        let predicates = self.resolve_filter(filter).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_WITH_COUNT);
        qb.push(" WHERE 1=1");
        for predicate in &predicates {
            predicate.push_to(&mut qb);
        }
        qb.push(" ORDER BY t.updated_at DESC, t.id DESC");

        let tickets = qb
            .build_query_as::<TicketWithCount>()
            .fetch_all(&self.db)
            .await?;

        debug!(count = tickets.len(), filters = predicates.len(), "Listed tickets");

        Ok(tickets)
    }

    /// Turn a filter into predicates.
    ///
    /// A project id that other projects name as their parent selects the
    /// tickets of those children (never the parent's own tickets). Any other
    /// project id is matched exactly.
    async fn resolve_filter(&self, filter: &TicketFilter) -> Result<Vec<TicketPredicate>> {
        let mut predicates = Vec::new();

        if let Some(project_id) = &filter.project_id {
            let children = self.child_project_ids(project_id).await?;
            if children.is_empty() {
                predicates.push(TicketPredicate::ProjectIs(project_id.clone()));
            } else {
                predicates.push(TicketPredicate::ProjectIn(children));
            }
        }
        if let Some(query) = &filter.query {
            predicates.push(TicketPredicate::Matches(query.clone()));
        }
        if let Some(status) = &filter.status {
            predicates.push(TicketPredicate::StatusIs(status.clone()));
        }

        Ok(predicates)
    }

    /// Get a ticket with its comment count.
    pub async fn get_ticket(&self, id: &str) -> Result<TicketWithCount> {
        sqlx::query_as::<_, TicketWithCount>(&format!("{} WHERE t.id = ?", SELECT_WITH_COUNT))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| Error::NotFound("Ticket not found".into()))
    }

    /// Apply the supplied fields and refresh `updated_at`.
    ///
    /// An update with no fields is rejected before the ticket is looked up.
    pub async fn update_ticket(&self, id: &str, input: UpdateTicket) -> Result<Ticket> {
        if input.is_empty() {
            return Err(Error::InvalidInput("No valid fields to update".into()));
        }

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE tickets SET ");
        let mut set = qb.separated(", ");
        if let Some(title) = input.title {
            set.push("title = ").push_bind_unseparated(title);
        }
        if let Some(description) = input.description {
            set.push("description = ").push_bind_unseparated(description);
        }
        if let Some(priority) = input.priority {
            set.push("priority = ").push_bind_unseparated(priority);
        }
        if let Some(status) = input.status {
            set.push("status = ").push_bind_unseparated(status);
        }
        if let Some(reporter) = input.reporter {
            set.push("reporter = ").push_bind_unseparated(reporter);
        }
        set.push("updated_at = ").push_bind_unseparated(now_timestamp());

        qb.push(" WHERE id = ").push_bind(id.to_string());
        qb.push(" RETURNING *");

        let ticket = qb
            .build_query_as::<Ticket>()
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| Error::NotFound("Ticket not found".into()))?;

        info!(id = %ticket.id, status = %ticket.status, "Updated ticket");

        Ok(ticket)
    }

    /// Delete a ticket. Its comments go with it via ON DELETE CASCADE.
    pub async fn delete_ticket(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Ticket not found".into()));
        }

        info!(id, "Deleted ticket");

        Ok(())
    }
}
