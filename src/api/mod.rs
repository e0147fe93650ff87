//! HTTP access to the LifeHub backend.
//!
//! `LifehubApi` is the seam the state stores talk to; `ApiClient` is the
//! reqwest implementation used by the binary.

pub mod client;

use crate::models::analysis::AnalysisReport;
use crate::models::marker::{CreatedMarker, Marker};
use crate::models::transaction::Transaction;
use crate::models::user::CurrentUser;
use rust_decimal::Decimal;
use std::path::Path;
use thiserror::Error;

pub use client::ApiClient;

pub const OAUTH_LOGIN_PATH: &str = "/oauth2/authorization/google";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// 401 from the backend; the stored token is no longer valid
    #[error("Unauthorized")]
    Unauthorized,

    /// Any other non-success status
    #[error("API request failed ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

pub fn login_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), OAUTH_LOGIN_PATH)
}

pub trait LifehubApi {
    /// Where the user is sent when authentication fails.
    fn login_url(&self) -> String;

    fn current_user(&self) -> Result<CurrentUser, ApiError>;

    fn transactions(&self) -> Result<Vec<Transaction>, ApiError>;
    fn upload_transactions(&self, file: &Path) -> Result<Vec<Transaction>, ApiError>;
    fn update_amount(&self, id: &str, amount: Decimal) -> Result<(), ApiError>;
    fn update_category(&self, id: &str, category: &str) -> Result<(), ApiError>;
    fn delete_transaction(&self, id: &str) -> Result<(), ApiError>;
    fn clear_transactions(&self) -> Result<(), ApiError>;

    fn analysis_history(&self) -> Result<Vec<AnalysisReport>, ApiError>;
    fn analyze(
        &self,
        month: &str,
        transactions: &[Transaction],
    ) -> Result<AnalysisReport, ApiError>;

    fn markers(&self) -> Result<Vec<Marker>, ApiError>;
    fn create_marker(&self, title: &str, color: &str) -> Result<CreatedMarker, ApiError>;
    fn move_marker(&self, id: &str, new_order: i64) -> Result<(), ApiError>;
    fn delete_marker(&self, id: &str) -> Result<(), ApiError>;
    /// Returns the id of the new link.
    fn add_link(&self, marker_id: &str, title: &str, url: &str) -> Result<String, ApiError>;
    fn delete_link(&self, link_id: &str) -> Result<(), ApiError>;
}
