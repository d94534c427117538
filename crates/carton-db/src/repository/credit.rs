//! # Credit Repository
//!
//! Customer credit accounts in the `Credits` collection.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use super::decode;
use crate::error::{DbError, DbResult};
use crate::store::{to_fields, Collection, DocumentStore, WriteBatch};
use carton_core::{CreditAccount, Money};

/// Repository for credit accounts.
#[derive(Clone)]
pub struct CreditRepository {
    store: Arc<dyn DocumentStore>,
}

impl CreditRepository {
    /// Creates a new CreditRepository.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        CreditRepository { store }
    }

    /// Every account, newest first.
    pub async fn list(&self) -> DbResult<Vec<CreditAccount>> {
        let docs = self.store.get_all(Collection::Credits).await?;
        let mut accounts = docs
            .iter()
            .map(decode)
            .collect::<DbResult<Vec<CreditAccount>>>()?;

        accounts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(accounts)
    }

    /// A single account, or `None`.
    pub async fn get(&self, id: &str) -> DbResult<Option<CreditAccount>> {
        match self.store.get_one(Collection::Credits, id).await? {
            Some(doc) => Ok(Some(decode(&doc)?)),
            None => Ok(None),
        }
    }

    /// Stores a new account and returns it with its id.
    pub async fn insert(&self, account: &CreditAccount) -> DbResult<CreditAccount> {
        let id = self
            .store
            .add(Collection::Credits, to_fields(account)?)
            .await?;
        info!(id = %id, name = %account.name, credit = %account.credit, "Credit account created");

        Ok(CreditAccount {
            id,
            ..account.clone()
        })
    }

    /// Changes an account's name and balance. The creation time is kept.
    pub async fn update(&self, id: &str, name: &str, credit: Money) -> DbResult<CreditAccount> {
        let fields = to_fields(&json!({ "name": name, "credit": credit }))?;
        self.store.update(Collection::Credits, id, fields).await?;
        info!(id, name, credit = %credit, "Credit account updated");

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found(Collection::Credits.as_str(), id))
    }

    /// Deletes an account.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        if self.get(id).await?.is_none() {
            return Err(DbError::not_found(Collection::Credits.as_str(), id));
        }
        self.store.delete(Collection::Credits, id).await?;
        debug!(id, "Deleted credit account");
        Ok(())
    }

    /// Adds an account's new balance to a commit batch.
    pub fn stage_balance(batch: &mut WriteBatch, account: &CreditAccount) -> DbResult<()> {
        let fields = to_fields(&json!({ "credit": account.credit }))?;
        batch.update(Collection::Credits, account.id.clone(), fields);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, Utc};

    fn account(name: &str, credit: i64, days_ago: i64) -> CreditAccount {
        CreditAccount {
            id: String::new(),
            name: name.to_string(),
            credit: Money::from_cents(credit),
            timestamp: Utc::now() - Duration::days(days_ago),
        }
    }

    #[tokio::test]
    async fn test_crud() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.credits();

        let older = repo.insert(&account("Ali", 5_000, 3)).await.unwrap();
        let newer = repo.insert(&account("Bilal", 10_000, 1)).await.unwrap();

        let listed = repo.list().await.unwrap();
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);

        let updated = repo
            .update(&older.id, "Ali Raza", Money::from_cents(7_500))
            .await
            .unwrap();
        assert_eq!(updated.name, "Ali Raza");
        assert_eq!(updated.timestamp, older.timestamp);

        repo.delete(&older.id).await.unwrap();
        assert!(repo.get(&older.id).await.unwrap().is_none());
        assert!(repo.delete(&older.id).await.is_err());
    }

    #[tokio::test]
    async fn test_staged_balance() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.credits();
        let mut acct = repo.insert(&account("Ali", 5_000, 0)).await.unwrap();
        acct.credit = Money::from_cents(1_000);

        let mut batch = WriteBatch::new();
        CreditRepository::stage_balance(&mut batch, &acct).unwrap();
        db.commit(batch).await.unwrap();

        let stored = repo.get(&acct.id).await.unwrap().unwrap();
        assert_eq!(stored.credit, Money::from_cents(1_000));
        assert_eq!(stored.name, "Ali");
    }
}
