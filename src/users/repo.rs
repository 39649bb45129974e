use axum::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::storage::{UserStore, UserStoreError};
use crate::users::repo_types::{NewUser, User};

/// Name of the unique index on `users.email`, see `db::ensure_schema`.
pub const EMAIL_UNIQUE_INDEX: &str = "users_email_key";

/// `UserStore` backed by the Postgres `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list_users(&self) -> Result<Vec<User>, UserStoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, created_at
            FROM users
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, created_at
            FROM users
            WHERE email = $1
            ORDER BY seq ASC
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<Uuid, UserStoreError> {
        // Fast path only; the unique index decides races.
        if self.find_user_by_email(&new_user.email).await?.is_some() {
            return Err(UserStoreError::DuplicateEmail(new_user.email));
        }

        let id = Uuid::new_v4();
        let inserted = sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.name)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.db)
        .await;

        match inserted {
            Ok(_) => {
                debug!(user_id = %id, "user inserted");
                Ok(id)
            }
            Err(e) => Err(insert_error(e, new_user.email)),
        }
    }
}

/// A unique violation on the email index becomes `DuplicateEmail`; anything
/// else is passed through.
fn insert_error(err: sqlx::Error, email: String) -> UserStoreError {
    let email_taken = err.as_database_error().is_some_and(|db_err| {
        db_err.is_unique_violation() && db_err.constraint() == Some(EMAIL_UNIQUE_INDEX)
    });
    if email_taken {
        UserStoreError::DuplicateEmail(email)
    } else {
        UserStoreError::Database(err)
    }
}
