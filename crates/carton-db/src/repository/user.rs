//! # User Repository
//!
//! Operator accounts in the `Users` collection, used by the register's local
//! sign-in. Only password hashes are stored; hashing happens in the register.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{decode, Identified};
use crate::error::{DbError, DbResult};
use crate::store::{to_fields, Collection, DocumentStore};
use carton_core::User;

/// A stored operator account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(skip)]
    pub id: String,

    /// Lowercase email, unique across the collection.
    pub email: String,

    #[serde(default)]
    pub display_name: Option<String>,

    /// PHC-format password hash.
    pub password_hash: String,
}

impl UserRecord {
    /// The public view of this account.
    pub fn to_user(&self) -> User {
        User {
            uid: self.id.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

impl Identified for UserRecord {
    fn assign_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Repository for operator accounts.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        UserRepository { store }
    }

    /// Looks an account up by email, ignoring case.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRecord>> {
        let email = email.trim().to_lowercase();
        debug!(email = %email, "Looking up user");

        for doc in self.store.get_all(Collection::Users).await? {
            let record: UserRecord = decode(&doc)?;
            if record.email == email {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Stores a new account.
    ///
    /// ## Errors
    /// `AlreadyExists` when the email is taken.
    pub async fn insert(&self, record: &UserRecord) -> DbResult<UserRecord> {
        let mut record = record.clone();
        record.email = record.email.trim().to_lowercase();

        if self.find_by_email(&record.email).await?.is_some() {
            return Err(DbError::AlreadyExists {
                collection: Collection::Users.to_string(),
                key: record.email,
            });
        }

        record.id = self.store.add(Collection::Users, to_fields(&record)?).await?;
        debug!(id = %record.id, "Inserted user");
        Ok(record)
    }

    pub async fn count(&self) -> DbResult<usize> {
        Ok(self.store.get_all(Collection::Users).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn record(email: &str) -> UserRecord {
        UserRecord {
            id: String::new(),
            email: email.to_string(),
            display_name: Some("Owner".to_string()),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_ignoring_case() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let created = repo.insert(&record("Owner@Shop.pk")).await.unwrap();
        assert_eq!(created.email, "owner@shop.pk");

        let found = repo.find_by_email("OWNER@shop.pk").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.to_user().uid, created.id);
        assert!(repo.find_by_email("other@shop.pk").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        repo.insert(&record("owner@shop.pk")).await.unwrap();
        assert!(matches!(
            repo.insert(&record("OWNER@shop.pk")).await,
            Err(DbError::AlreadyExists { .. })
        ));
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
