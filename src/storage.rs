use std::collections::HashMap;

use axum::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::users::repo_types::{NewUser, PublicProfile, User};

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("user already exists: {0}")]
    DuplicateEmail(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// The user directory. Implementations must make the duplicate-email check
/// and the insert in `create_user` a single atomic step.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users in insertion order.
    async fn list_users(&self) -> Result<Vec<User>, UserStoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError>;

    /// Insert a user and return its new id, or `DuplicateEmail` if the email is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<Uuid, UserStoreError>;

    /// `None` both for an unknown email and for a hash mismatch.
    async fn verify_credentials(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<PublicProfile>, UserStoreError> {
        let user = self.find_user_by_email(email).await?;
        Ok(user
            .filter(|u| u.hash_matches(password_hash))
            .map(User::into_profile))
    }
}

#[derive(Default)]
struct Table {
    rows: Vec<User>,
    by_email: HashMap<String, usize>, // email -> position in rows
}

/// Process-local store used when no database is configured, and in tests.
#[derive(Default)]
pub struct InMemoryUserStore {
    table: Mutex<Table>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn list_users(&self) -> Result<Vec<User>, UserStoreError> {
        Ok(self.table.lock().await.rows.clone())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        let table = self.table.lock().await;
        Ok(table
            .by_email
            .get(email)
            .and_then(|&pos| table.rows.get(pos))
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<Uuid, UserStoreError> {
        // Lookup and insert under the same guard.
        let mut table = self.table.lock().await;
        if table.by_email.contains_key(&new_user.email) {
            return Err(UserStoreError::DuplicateEmail(new_user.email));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            created_at: OffsetDateTime::now_utc(),
        };
        let id = user.id;
        let pos = table.rows.len();
        table.by_email.insert(user.email.clone(), pos);
        table.rows.push(user);

        debug!(user_id = %id, "user inserted");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn new_user(email: &str, hash: &str, name: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: hash.into(),
            name: name.into(),
        }
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let store = InMemoryUserStore::new();
        assert!(store.list_users().await.unwrap().is_empty());
        assert!(store.find_user_by_email("nobody@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn alice_scenario() {
        let store = InMemoryUserStore::new();

        let id = store
            .create_user(new_user("a@x.com", "h1", "Alice"))
            .await
            .expect("first create succeeds");

        let err = store
            .create_user(new_user("a@x.com", "other", "Mallory"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserStoreError::DuplicateEmail(ref e) if e == "a@x.com"));

        let profile = store.verify_credentials("a@x.com", "h1").await.unwrap();
        assert_eq!(
            profile,
            Some(PublicProfile {
                email: "a@x.com".into(),
                name: "Alice".into(),
            })
        );
        assert_eq!(store.verify_credentials("a@x.com", "wrong").await.unwrap(), None);

        let users = store.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, id);
        assert_eq!(users[0].name, "Alice");
        assert_eq!(users[0].password_hash, "h1");
    }

    #[tokio::test]
    async fn distinct_emails_are_listed_in_creation_order() {
        let store = InMemoryUserStore::new();
        let people = [
            ("c@x.com", "h3", "Carol"),
            ("a@x.com", "h1", "Alice"),
            ("b@x.com", "h2", "Bob"),
        ];

        let mut ids = Vec::new();
        for (email, hash, name) in people {
            ids.push(store.create_user(new_user(email, hash, name)).await.unwrap());
        }

        let users = store.list_users().await.unwrap();
        assert_eq!(users.len(), people.len());
        for ((user, id), (email, hash, name)) in users.iter().zip(&ids).zip(people) {
            assert_eq!(user.id, *id);
            assert_eq!(user.email, email);
            assert_eq!(user.password_hash, hash);
            assert_eq!(user.name, name);
        }

        for (email, _, name) in people {
            let found = store.find_user_by_email(email).await.unwrap().expect("present");
            assert_eq!(found.email, email);
            assert_eq!(found.name, name);
        }
    }

    #[tokio::test]
    async fn duplicate_create_leaves_count_unchanged() {
        let store = InMemoryUserStore::new();
        store.create_user(new_user("a@x.com", "h1", "Alice")).await.unwrap();
        let before = store.list_users().await.unwrap();

        assert!(store
            .create_user(new_user("a@x.com", "h1", "Alice"))
            .await
            .is_err());

        let after = store.list_users().await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_hash_look_the_same() {
        let store = InMemoryUserStore::new();
        store.create_user(new_user("a@x.com", "h1", "Alice")).await.unwrap();

        let wrong_hash = store.verify_credentials("a@x.com", "nope").await.unwrap();
        let unknown = store.verify_credentials("z@x.com", "h1").await.unwrap();
        assert_eq!(wrong_hash, unknown);
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn emails_match_exactly() {
        let store = InMemoryUserStore::new();
        store.create_user(new_user("a@x.com", "h1", "Alice")).await.unwrap();

        assert!(store.find_user_by_email("A@x.com").await.unwrap().is_none());
        // A differently-cased email is a different key.
        store.create_user(new_user("A@x.com", "h2", "Alice2")).await.unwrap();
        assert_eq!(store.list_users().await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_for_one_email_yield_one_winner() {
        let store = Arc::new(InMemoryUserStore::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_user(new_user("race@x.com", &format!("h{i}"), "Racer"))
                        .await
                })
            })
            .collect();

        let mut ok = 0;
        let mut dup = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(UserStoreError::DuplicateEmail(_)) => dup += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(dup, 15);
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }
}
