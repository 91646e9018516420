//! Project queries.
//!
//! Projects form a shallow hierarchy through `parent_project`, which holds
//! either a root category name or another project's id. A project that some
//! other project names as its parent is a *parent*; any other is a *leaf*.
//! Deleting a project leaves tickets that reference it in place.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::info;

use super::{generate_id, now_timestamp, TicketStore};
use crate::{Error, Result};

/// Project record from the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub parent_project: String,
    pub created_at: String,
}

/// Input for creating a project.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub parent_project: String,
}

impl TicketStore {
    /// Create a project.
    pub async fn create_project(&self, input: CreateProject) -> Result<Project> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, name, parent_project, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(generate_id())
        .bind(&input.name)
        .bind(&input.parent_project)
        .bind(now_timestamp())
        .fetch_one(&self.db)
        .await?;

        info!(id = %project.id, parent = %project.parent_project, "Created project");

        Ok(project)
    }

    /// Projects directly under `parent_project`, oldest first.
    pub async fn list_projects_by_parent(&self, parent_project: &str) -> Result<Vec<Project>> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT * FROM projects
            WHERE parent_project = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(parent_project)
        .fetch_all(&self.db)
        .await
        .map_err(Error::Database)
    }

    /// Ids of projects whose parent is `project_id`. Empty for a leaf.
    pub async fn child_project_ids(&self, project_id: &str) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT id FROM projects WHERE parent_project = ?")
            .bind(project_id)
            .fetch_all(&self.db)
            .await
            .map_err(Error::Database)
    }

    /// Delete a project by id.
    pub async fn delete_project(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Project not found".into()));
        }

        info!(id, "Deleted project");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tickets::tests::{new_ticket, test_store};
    use crate::db::TicketFilter;

    fn project(name: &str, parent: &str) -> CreateProject {
        CreateProject {
            name: name.to_string(),
            parent_project: parent.to_string(),
        }
    }

    fn by_project(project_id: &str) -> TicketFilter {
        TicketFilter::new(None, None, Some(project_id.to_string()))
    }

    #[tokio::test]
    async fn test_create_and_list_by_parent() {
        let store = test_store().await;
        let a = store.create_project(project("Alpha", "Project1")).await.unwrap();
        let b = store.create_project(project("Beta", "Project1")).await.unwrap();
        store.create_project(project("Gamma", "Project2")).await.unwrap();

        let listed = store.list_projects_by_parent("Project1").await.unwrap();
        assert_eq!(listed, vec![a, b]);
        assert!(store.list_projects_by_parent("nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_project() {
        let store = test_store().await;
        let a = store.create_project(project("Alpha", "Project1")).await.unwrap();

        store.delete_project(&a.id).await.unwrap();
        assert!(store.list_projects_by_parent("Project1").await.unwrap().is_empty());
        assert!(matches!(
            store.delete_project(&a.id).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_project_keeps_tickets() {
        let store = test_store().await;
        let leaf = store.create_project(project("Alpha", "Project1")).await.unwrap();
        let ticket = store
            .create_ticket(new_ticket("Orphan to be", Some(&leaf.id)))
            .await
            .unwrap();

        store.delete_project(&leaf.id).await.unwrap();

        let fetched = store.get_ticket(&ticket.id).await.unwrap();
        assert_eq!(fetched.ticket.project_id.as_deref(), Some(leaf.id.as_str()));
    }

    #[tokio::test]
    async fn test_parent_filter_selects_children_only() {
        let store = test_store().await;
        let a = store.create_project(project("Root A", "Project1")).await.unwrap();
        let b = store.create_project(project("Child B", &a.id)).await.unwrap();
        let c = store.create_project(project("Child C", &a.id)).await.unwrap();

        let on_a = store.create_ticket(new_ticket("Filed on A", Some(&a.id))).await.unwrap();
        let on_b = store.create_ticket(new_ticket("Filed on B", Some(&b.id))).await.unwrap();
        let on_c = store.create_ticket(new_ticket("Filed on C", Some(&c.id))).await.unwrap();
        store.create_ticket(new_ticket("Unfiled", None)).await.unwrap();

        let listed = store.list_tickets(&by_project(&a.id)).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|t| t.ticket.id.as_str()).collect();

        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&on_b.id.as_str()));
        assert!(ids.contains(&on_c.id.as_str()));
        assert!(!ids.contains(&on_a.id.as_str()));
    }

    #[tokio::test]
    async fn test_leaf_filter_is_exact() {
        let store = test_store().await;
        let d = store.create_project(project("Leaf D", "Project1")).await.unwrap();
        let e = store.create_project(project("Leaf E", "Project1")).await.unwrap();

        let on_d = store.create_ticket(new_ticket("Filed on D", Some(&d.id))).await.unwrap();
        store.create_ticket(new_ticket("Filed on E", Some(&e.id))).await.unwrap();

        let listed = store.list_tickets(&by_project(&d.id)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].ticket.id, on_d.id);
    }

    #[tokio::test]
    async fn test_root_category_resolves_to_its_projects() {
        let store = test_store().await;
        let a = store.create_project(project("Alpha", "Project1")).await.unwrap();
        let on_a = store.create_ticket(new_ticket("Filed on Alpha", Some(&a.id))).await.unwrap();

        // "Project1" is not a project row, but it is named as a parent
        let listed = store.list_tickets(&by_project("Project1")).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].ticket.id, on_a.id);
    }

    #[tokio::test]
    async fn test_project_filter_composes_with_search_and_status() {
        let store = test_store().await;
        let a = store.create_project(project("Root", "Project1")).await.unwrap();
        let b = store.create_project(project("Child", &a.id)).await.unwrap();

        let wanted = store.create_ticket(new_ticket("VPN down", Some(&b.id))).await.unwrap();
        store.create_ticket(new_ticket("Printer jam", Some(&b.id))).await.unwrap();
        store.create_ticket(new_ticket("VPN slow", None)).await.unwrap();

        let filter = TicketFilter::new(Some("VPN".into()), Some("OPEN".into()), Some(a.id.clone()));
        let listed = store.list_tickets(&filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].ticket.id, wanted.id);
    }
}
