//! Session state for the finance tracker: the loaded transactions and the
//! category list derived from them.

use crate::api::{ApiError, LifehubApi};
use crate::auth;
use crate::error::{AppError, AppResult};
use crate::models::transaction::{Transaction, TransactionPatch, UNCATEGORIZED};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// Result of an edit that may turn out to be a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Updated,
    Unchanged,
}

#[derive(Debug, Default)]
pub struct DataStore {
    transactions: Vec<Transaction>,
    categories: Vec<String>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        let mut store = Self::new();
        store.import_transactions(transactions);
        store
    }

    /// Verifies the session, then fetches the transactions once.
    pub fn mount<A: LifehubApi>(api: &A) -> AppResult<Self> {
        auth::check_login(api)?;
        let mut store = Self::new();
        store.reload(api)?;
        Ok(store)
    }

    pub fn reload<A: LifehubApi>(&mut self, api: &A) -> AppResult<()> {
        match api.transactions() {
            Ok(transactions) => {
                tracing::info!(count = transactions.len(), "Transactions loaded");
                self.import_transactions(transactions);
                Ok(())
            }
            Err(ApiError::Unauthorized) => Err(AppError::LoginRequired {
                login_url: api.login_url(),
            }),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load transactions");
                self.import_transactions(Vec::new());
                Ok(())
            }
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    /// Replaces the list and rebuilds the category set from it.
    pub fn import_transactions(&mut self, transactions: Vec<Transaction>) {
        self.categories = transactions
            .iter()
            .map(|t| t.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self.transactions = transactions;
    }

    /// Adds a locally created transaction in front of the list.
    pub fn add_transaction(&mut self, mut transaction: Transaction) -> &Transaction {
        transaction.id = Uuid::new_v4().to_string();
        self.add_category(&transaction.category);
        self.transactions.insert(0, transaction);
        &self.transactions[0]
    }

    pub fn update_transaction(&mut self, id: &str, patch: &TransactionPatch) -> AppResult<()> {
        let transaction = self
            .transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Transaction {}", id)))?;
        transaction.apply(patch);

        if let Some(ref category) = patch.category {
            self.add_category(category);
        }
        Ok(())
    }

    pub fn delete_transaction(&mut self, id: &str) {
        self.transactions.retain(|t| t.id != id);
    }

    pub fn add_category(&mut self, category: &str) {
        let category = category.trim();
        if category.is_empty() || self.categories.iter().any(|c| c == category) {
            return;
        }
        self.categories.push(category.to_string());
        self.categories.sort();
    }

    /// Removes a category; its transactions fall back to `Uncategorized`.
    pub fn delete_category(&mut self, category: &str) {
        self.categories.retain(|c| c != category);
        for transaction in self.transactions.iter_mut().filter(|t| t.category == category) {
            transaction.category = UNCATEGORIZED.to_string();
        }
    }

    pub fn export_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(&self.transactions)?)
    }

    pub fn clear_all(&mut self) {
        self.transactions.clear();
        self.categories.clear();
    }

    /// Parses `raw` and sends the new amount. Unparsable or unchanged
    /// input is not sent.
    pub fn edit_amount<A: LifehubApi>(
        &mut self,
        api: &A,
        id: &str,
        raw: &str,
    ) -> AppResult<EditOutcome> {
        let current = self
            .transaction(id)
            .ok_or_else(|| AppError::NotFound(format!("Transaction {}", id)))?
            .amount;
        let Ok(amount) = Decimal::from_str(raw.trim()) else {
            tracing::debug!(raw, "Ignoring unparsable amount");
            return Ok(EditOutcome::Unchanged);
        };
        if amount == current {
            return Ok(EditOutcome::Unchanged);
        }

        api.update_amount(id, amount)?;
        self.update_transaction(
            id,
            &TransactionPatch {
                amount: Some(amount),
                category: None,
            },
        )?;
        tracing::info!(id, %amount, "Amount updated");
        Ok(EditOutcome::Updated)
    }

    pub fn edit_category<A: LifehubApi>(
        &mut self,
        api: &A,
        id: &str,
        category: &str,
    ) -> AppResult<EditOutcome> {
        let category = category.trim();
        let current = self
            .transaction(id)
            .ok_or_else(|| AppError::NotFound(format!("Transaction {}", id)))?;
        if category.is_empty() || category == current.category {
            return Ok(EditOutcome::Unchanged);
        }

        api.update_category(id, category)?;
        self.update_transaction(
            id,
            &TransactionPatch {
                amount: None,
                category: Some(category.to_string()),
            },
        )?;
        tracing::info!(id, category, "Category updated");
        Ok(EditOutcome::Updated)
    }

    pub fn remove_transaction<A: LifehubApi>(&mut self, api: &A, id: &str) -> AppResult<()> {
        if self.transaction(id).is_none() {
            return Err(AppError::NotFound(format!("Transaction {}", id)));
        }
        api.delete_transaction(id)?;
        self.delete_transaction(id);
        tracing::info!(id, "Transaction deleted");
        Ok(())
    }

    /// Uploads a card statement; the server's full list replaces ours.
    pub fn upload<A: LifehubApi>(&mut self, api: &A, file: &Path) -> AppResult<usize> {
        if !file.is_file() {
            return Err(AppError::Invalid(format!(
                "Failed to open file '{}'",
                file.display()
            )));
        }
        let transactions = api.upload_transactions(file)?;
        let count = transactions.len();
        self.import_transactions(transactions);
        tracing::info!(count, file = %file.display(), "Import complete");
        Ok(count)
    }

    /// Clears the backend first; local data is only dropped once that
    /// succeeded.
    pub fn clear<A: LifehubApi>(&mut self, api: &A) -> AppResult<()> {
        api.clear_transactions()?;
        self.clear_all();
        tracing::info!("Data cleared");
        Ok(())
    }
}
