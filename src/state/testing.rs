//! In-memory backend used by the store and operation tests.

use crate::api::{ApiError, LifehubApi};
use crate::models::analysis::AnalysisReport;
use crate::models::marker::{CreatedMarker, Marker};
use crate::models::transaction::{PaymentStatus, Transaction};
use crate::models::user::CurrentUser;
use rust_decimal::Decimal;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::Path;

pub fn sample_transaction(id: &str, category: &str, amount: i64, date: &str) -> Transaction {
    Transaction::new(
        id.to_string(),
        date.to_string(),
        format!("Merchant {}", id),
        format!("Purchase {}", id),
        Decimal::new(amount, 0),
        category.to_string(),
        PaymentStatus::Completed,
        "KB Card".to_string(),
    )
}

pub fn sample_marker(id: &str, sort_order: i64) -> Marker {
    Marker::new(
        id.to_string(),
        format!("Game {}", id),
        "bg-rose-600".to_string(),
        sort_order,
    )
}

pub struct FakeApi {
    pub authenticated: bool,
    pub transactions: RefCell<Vec<Transaction>>,
    pub uploaded: RefCell<Vec<Transaction>>,
    pub markers: RefCell<Vec<Marker>>,
    pub reports: RefCell<Vec<AnalysisReport>>,
    /// Operations (method names) that answer with a 500.
    pub failing: RefCell<HashSet<&'static str>>,
    /// Operations (method names) that answer with a 401.
    pub unauthorized: RefCell<HashSet<&'static str>>,
    /// Answer `create_marker` with the bare id instead of the marker.
    pub create_returns_id: bool,
    pub calls: RefCell<Vec<String>>,
    next_id: Cell<u64>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            authenticated: true,
            transactions: RefCell::new(Vec::new()),
            uploaded: RefCell::new(Vec::new()),
            markers: RefCell::new(Vec::new()),
            reports: RefCell::new(Vec::new()),
            failing: RefCell::new(HashSet::new()),
            unauthorized: RefCell::new(HashSet::new()),
            create_returns_id: false,
            calls: RefCell::new(Vec::new()),
            next_id: Cell::new(100),
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            ..Self::new()
        }
    }

    pub fn with_transactions(transactions: Vec<Transaction>) -> Self {
        let api = Self::new();
        *api.transactions.borrow_mut() = transactions;
        api
    }

    pub fn with_markers(markers: Vec<Marker>) -> Self {
        let api = Self::new();
        *api.markers.borrow_mut() = markers;
        api
    }

    pub fn fail(&self, operation: &'static str) {
        self.failing.borrow_mut().insert(operation);
    }

    pub fn reject(&self, operation: &'static str) {
        self.unauthorized.borrow_mut().insert(operation);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn enter(&self, operation: &'static str, detail: String) -> Result<(), ApiError> {
        self.calls.borrow_mut().push(if detail.is_empty() {
            operation.to_string()
        } else {
            format!("{} {}", operation, detail)
        });
        if self.unauthorized.borrow().contains(operation) {
            return Err(ApiError::Unauthorized);
        }
        if self.failing.borrow().contains(operation) {
            return Err(ApiError::Status {
                status: 500,
                message: format!("{} failed", operation),
            });
        }
        Ok(())
    }

    fn next_id(&self) -> String {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id.to_string()
    }
}

impl LifehubApi for FakeApi {
    fn login_url(&self) -> String {
        crate::api::login_url("https://hub.example.org")
    }

    fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.enter("current_user", String::new())?;
        if !self.authenticated {
            return Err(ApiError::Unauthorized);
        }
        Ok(CurrentUser {
            message: "Logged in successfully".to_string(),
            user: serde_json::Value::String("player@example.org".to_string()),
        })
    }

    fn transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        self.enter("transactions", String::new())?;
        Ok(self.transactions.borrow().clone())
    }

    fn upload_transactions(&self, file: &Path) -> Result<Vec<Transaction>, ApiError> {
        self.enter("upload_transactions", file.display().to_string())?;
        let uploaded = self.uploaded.borrow().clone();
        self.transactions.borrow_mut().extend(uploaded);
        Ok(self.transactions.borrow().clone())
    }

    fn update_amount(&self, id: &str, amount: Decimal) -> Result<(), ApiError> {
        self.enter("update_amount", format!("{} {}", id, amount))?;
        for tx in self.transactions.borrow_mut().iter_mut().filter(|t| t.id == id) {
            tx.amount = amount;
        }
        Ok(())
    }

    fn update_category(&self, id: &str, category: &str) -> Result<(), ApiError> {
        self.enter("update_category", format!("{} {}", id, category))?;
        for tx in self.transactions.borrow_mut().iter_mut().filter(|t| t.id == id) {
            tx.category = category.to_string();
        }
        Ok(())
    }

    fn delete_transaction(&self, id: &str) -> Result<(), ApiError> {
        self.enter("delete_transaction", id.to_string())?;
        self.transactions.borrow_mut().retain(|t| t.id != id);
        Ok(())
    }

    fn clear_transactions(&self) -> Result<(), ApiError> {
        self.enter("clear_transactions", String::new())?;
        self.transactions.borrow_mut().clear();
        Ok(())
    }

    fn analysis_history(&self) -> Result<Vec<AnalysisReport>, ApiError> {
        self.enter("analysis_history", String::new())?;
        Ok(self.reports.borrow().clone())
    }

    fn analyze(
        &self,
        month: &str,
        transactions: &[Transaction],
    ) -> Result<AnalysisReport, ApiError> {
        self.enter("analyze", format!("{} {}", month, transactions.len()))?;
        Ok(AnalysisReport {
            month: String::new(),
            summary: format!("{} transactions analysed", transactions.len()),
            trends: Vec::new(),
            recommendations: Vec::new(),
            budget_health: None,
        })
    }

    fn markers(&self) -> Result<Vec<Marker>, ApiError> {
        self.enter("markers", String::new())?;
        Ok(self.markers.borrow().clone())
    }

    fn create_marker(&self, title: &str, color: &str) -> Result<CreatedMarker, ApiError> {
        self.enter("create_marker", title.to_string())?;
        let id = self.next_id();
        let next_order = self
            .markers
            .borrow()
            .iter()
            .map(|m| m.sort_order)
            .max()
            .unwrap_or(0)
            + 1;
        let marker = Marker::new(id.clone(), title.to_string(), color.to_string(), next_order);
        self.markers.borrow_mut().insert(0, marker.clone());
        if self.create_returns_id {
            Ok(CreatedMarker::Id(id))
        } else {
            Ok(CreatedMarker::Full(marker))
        }
    }

    fn move_marker(&self, id: &str, new_order: i64) -> Result<(), ApiError> {
        self.enter("move_marker", format!("{} {}", id, new_order))
    }

    fn delete_marker(&self, id: &str) -> Result<(), ApiError> {
        self.enter("delete_marker", id.to_string())?;
        self.markers.borrow_mut().retain(|m| m.id != id);
        Ok(())
    }

    fn add_link(&self, marker_id: &str, title: &str, url: &str) -> Result<String, ApiError> {
        self.enter("add_link", format!("{} {} {}", marker_id, title, url))?;
        Ok(self.next_id())
    }

    fn delete_link(&self, link_id: &str) -> Result<(), ApiError> {
        self.enter("delete_link", link_id.to_string())
    }
}
