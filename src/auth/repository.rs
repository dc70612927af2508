// Credential store: persistence seam for users, roles and their links

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::models::{Role, User, UserRole};

/// Failures raised by a credential store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or the statement failed
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint rejected the write
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// A foreign key named a row that does not exist
    #[error("referenced row missing: {0}")]
    MissingReference(String),

    /// A stored row could not be decoded into a model
    #[error("row mapping failed: {0}")]
    Mapping(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Duplicate(db_err.constraint().unwrap_or("unique").to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                StoreError::MissingReference(db_err.constraint().unwrap_or("foreign key").to_string())
            }
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. } => StoreError::Mapping(err.to_string()),
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

/// CRUD operations over users, roles and user-role links
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Cheap connectivity check used by the readiness endpoint
    async fn ping(&self) -> Result<(), StoreError>;

    async fn create_user(&self, user: &User) -> Result<(), StoreError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn create_role(&self, role: &Role) -> Result<(), StoreError>;
    /// Rename a role; returns false if no row had that id
    async fn update_role(&self, role: &Role) -> Result<bool, StoreError>;
    /// Delete a role and its links; returns false if no row had that id
    async fn delete_role(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError>;
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError>;
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError>;

    async fn create_user_role(&self, link: &UserRole) -> Result<(), StoreError>;
    async fn find_user_role(&self, user_id: Uuid, role_id: Uuid) -> Result<Option<UserRole>, StoreError>;
    async fn list_user_roles(&self) -> Result<Vec<UserRole>, StoreError>;
    /// Roles linked to one user, ordered by name
    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<Role>, StoreError>;
}

/// PostgreSQL-backed credential store
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new PgCredentialStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO auth.users (id, username, password_hash, created_date) VALUES ($1, $2, $3, $4)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_date FROM auth.users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_date FROM auth.users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_date FROM auth.users ORDER BY created_date, username",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn create_role(&self, role: &Role) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO auth.roles (id, name, created_by_user_id, created_date) VALUES ($1, $2, $3, $4)",
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(role.created_by_user_id)
        .bind(role.created_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_role(&self, role: &Role) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE auth.roles SET name = $1 WHERE id = $2")
            .bind(&role.name)
            .bind(role.id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_role(&self, id: Uuid) -> Result<bool, StoreError> {
        // user_roles rows go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM auth.roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, created_by_user_id, created_date FROM auth.roles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, created_by_user_id, created_date FROM auth.roles WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, name, created_by_user_id, created_date FROM auth.roles ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    async fn create_user_role(&self, link: &UserRole) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO auth.user_roles (user_id, role_id, created_by_user_id, created_date)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(link.user_id)
        .bind(link.role_id)
        .bind(link.created_by_user_id)
        .bind(link.created_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_user_role(&self, user_id: Uuid, role_id: Uuid) -> Result<Option<UserRole>, StoreError> {
        let link = sqlx::query_as::<_, UserRole>(
            r#"
            SELECT user_id, role_id, created_by_user_id, created_date
            FROM auth.user_roles
            WHERE user_id = $1 AND role_id = $2
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }

    async fn list_user_roles(&self) -> Result<Vec<UserRole>, StoreError> {
        let links = sqlx::query_as::<_, UserRole>(
            r#"
            SELECT user_id, role_id, created_by_user_id, created_date
            FROM auth.user_roles
            ORDER BY created_date
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(links)
    }

    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<Role>, StoreError> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.name, r.created_by_user_id, r.created_date
            FROM auth.roles r
            INNER JOIN auth.user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }
}
