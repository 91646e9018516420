//! Account store: user queries.
//!
//! Users live in their own database file. Email uniqueness is enforced by
//! the UNIQUE constraint on insert, never by a lookup beforehand, so two
//! concurrent signups for one address cannot both succeed.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::info;

use super::{init_pool, initialize_schema, DbPool, ACCOUNTS_SCHEMA};
use crate::{Error, Result};

/// User record from the database.
///
/// `password_hash` is never serialized.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: String,
}

/// Input for creating a user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Store for user accounts.
#[derive(Clone)]
pub struct AccountStore {
    db: DbPool,
}

impl AccountStore {
    /// Wrap an existing pool, creating the schema if absent.
    pub async fn new(db: DbPool) -> Result<Self> {
        initialize_schema(&db, ACCOUNTS_SCHEMA).await?;
        info!("Account store schema ready");
        Ok(Self { db })
    }

    /// Open (or create) the account database file at `path`.
    pub async fn open(path: &str, max_connections: u32) -> Result<Self> {
        let db = init_pool(path, max_connections).await?;
        Self::new(db).await
    }

    pub fn pool(&self) -> &DbPool {
        &self.db
    }

    /// Create a user, returning the stored row (with its default `created_at`).
    pub async fn create_user(&self, input: CreateUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                Error::Conflict("Email already registered".into())
            }
            _ => Error::Database(e),
        })?;

        info!(id = user.id, "Created user");

        Ok(user)
    }

    /// Get a user by email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .map_err(Error::Database)
    }

    /// Get a user by ID.
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(Error::Database)
    }

    /// All users, newest first.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.db)
            .await
            .map_err(Error::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool_with_config, PoolConfig};

    async fn test_store() -> AccountStore {
        let pool = create_pool_with_config(":memory:", PoolConfig::test()).await.unwrap();
        AccountStore::new(pool).await.unwrap()
    }

    fn new_user(name: &str, email: &str) -> CreateUser {
        CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_reads_back_defaults() {
        let store = test_store().await;
        let user = store.create_user(new_user("Ana", "ana@example.com")).await.unwrap();

        assert!(user.id > 0);
        assert_eq!(user.email, "ana@example.com");
        assert!(!user.created_at.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = test_store().await;
        store.create_user(new_user("Ana", "ana@example.com")).await.unwrap();

        let err = store
            .create_user(new_user("Other Ana", "ana@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lookups() {
        let store = test_store().await;
        let user = store.create_user(new_user("Ana", "ana@example.com")).await.unwrap();

        assert_eq!(
            store.get_user_by_email("ana@example.com").await.unwrap(),
            Some(user.clone())
        );
        assert_eq!(store.get_user_by_id(user.id).await.unwrap(), Some(user.clone()));
        assert!(store.get_user_by_email("bo@example.com").await.unwrap().is_none());
        assert!(store.get_user_by_id(user.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_users_newest_first() {
        let store = test_store().await;
        let ana = store.create_user(new_user("Ana", "ana@example.com")).await.unwrap();
        let bo = store.create_user(new_user("Bo", "bo@example.com")).await.unwrap();

        let listed = store.list_users().await.unwrap();
        let ids: Vec<i64> = listed.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![bo.id, ana.id]);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: 1,
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "secret-hash".into(),
            created_at: "2024-01-01T00:00:00.000Z".into(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("secret-hash"));
        assert_eq!(json["created_at"], "2024-01-01T00:00:00.000Z");
    }
}
