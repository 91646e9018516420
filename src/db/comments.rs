//! Comment queries.
//!
//! Comments are immutable. Adding one also counts as activity on the ticket,
//! so the ticket's `updated_at` moves in the same transaction.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::info;

use super::{generate_id, now_timestamp, TicketStore};
use crate::{Error, Result};

/// Comment record from the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub created_at: String,
    pub author: String,
    pub body: String,
    pub ticket_id: String,
}

/// Input for creating a comment.
#[derive(Debug, Clone)]
pub struct CreateComment {
    pub author: String,
    pub body: String,
}

impl TicketStore {
    /// Add a comment to a ticket and touch the ticket's `updated_at`.
    ///
    /// The ticket is touched first: the UPDATE both proves the ticket exists
    /// and takes the write lock before anything is inserted. Nothing is
    /// visible until commit; an early return rolls back on drop.
    pub async fn add_comment(&self, ticket_id: &str, input: CreateComment) -> Result<Comment> {
        let now = now_timestamp();
        let mut tx = self.db.begin().await?;

        let touched = sqlx::query("UPDATE tickets SET updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(ticket_id)
            .execute(&mut *tx)
            .await?;

        if touched.rows_affected() == 0 {
            return Err(Error::NotFound("Ticket not found".into()));
        }

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, created_at, author, body, ticket_id)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(generate_id())
        .bind(&now)
        .bind(&input.author)
        .bind(&input.body)
        .bind(ticket_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(id = %comment.id, ticket_id, "Added comment");

        Ok(comment)
    }

    /// Comments on a ticket, oldest first. Unknown tickets yield an empty list.
    pub async fn list_comments(&self, ticket_id: &str) -> Result<Vec<Comment>> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT * FROM comments
            WHERE ticket_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.db)
        .await
        .map_err(Error::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tickets::tests::{new_ticket, test_store};

    fn comment(author: &str, body: &str) -> CreateComment {
        CreateComment {
            author: author.to_string(),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_comment_touches_ticket() {
        let store = test_store().await;
        let ticket = store.create_ticket(new_ticket("Printer jam", None)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;

        let added = store
            .add_comment(&ticket.id, comment("ana", "Restarted it"))
            .await
            .unwrap();
        assert_eq!(added.ticket_id, ticket.id);

        let fetched = store.get_ticket(&ticket.id).await.unwrap();
        assert!(fetched.ticket.updated_at >= added.created_at);
        assert!(fetched.ticket.updated_at > ticket.updated_at);
        assert_eq!(fetched.comment_count, 1);
    }

    #[tokio::test]
    async fn test_add_comment_to_missing_ticket() {
        let store = test_store().await;
        let err = store
            .add_comment("missing", comment("ana", "Hello there"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_list_comments_oldest_first() {
        let store = test_store().await;
        let ticket = store.create_ticket(new_ticket("Printer jam", None)).await.unwrap();

        let first = store.add_comment(&ticket.id, comment("ana", "first")).await.unwrap();
        let second = store.add_comment(&ticket.id, comment("bo", "second")).await.unwrap();

        let listed = store.list_comments(&ticket.id).await.unwrap();
        assert_eq!(listed, vec![first, second]);
        assert!(store.list_comments("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_ticket_cascades_comments() {
        let store = test_store().await;
        let doomed = store.create_ticket(new_ticket("Printer jam", None)).await.unwrap();
        let kept = store.create_ticket(new_ticket("VPN down", None)).await.unwrap();
        store.add_comment(&doomed.id, comment("ana", "one")).await.unwrap();
        store.add_comment(&doomed.id, comment("ana", "two")).await.unwrap();
        store.add_comment(&kept.id, comment("ana", "three")).await.unwrap();

        store.delete_ticket(&doomed.id).await.unwrap();

        let (orphans,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM comments WHERE ticket_id = ?")
                .bind(&doomed.id)
                .fetch_one(store.pool())
                .await
                .unwrap();
        assert_eq!(orphans, 0);
        assert_eq!(store.list_comments(&kept.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_comment_count_in_listing() {
        let store = test_store().await;
        let ticket = store.create_ticket(new_ticket("Printer jam", None)).await.unwrap();
        store.create_ticket(new_ticket("VPN down", None)).await.unwrap();
        store.add_comment(&ticket.id, comment("ana", "one")).await.unwrap();
        store.add_comment(&ticket.id, comment("bo", "two")).await.unwrap();

        let listed = store.list_tickets(&Default::default()).await.unwrap();
        // the commented ticket was touched last
        assert_eq!(listed[0].ticket.id, ticket.id);
        assert_eq!(listed[0].comment_count, 2);
        assert_eq!(listed[1].comment_count, 0);
    }
}
