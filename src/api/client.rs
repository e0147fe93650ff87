//! Blocking reqwest client for the LifeHub backend

use super::{ApiError, LifehubApi};
use crate::models::analysis::{AnalysisReport, AnalysisRequest};
use crate::models::id::deserialize_id;
use crate::models::marker::{CreatedMarker, Marker};
use crate::models::transaction::Transaction;
use crate::models::user::CurrentUser;
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct UploadResponse {
    transactions: Vec<Transaction>,
}

#[derive(Deserialize)]
struct IdResponse(#[serde(deserialize_with = "deserialize_id")] String);

/// API client for the LifeHub backend
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("lifehub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let request = match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        };
        let response = request
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(error_for_status(status.as_u16(), &body))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        tracing::debug!(path, "GET");
        let response = self.send(self.client.get(self.url(path)))?;
        response.json().map_err(|e| ApiError::Parse(e.to_string()))
    }

    fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        tracing::debug!(path, "POST");
        let response = self.send(self.client.post(self.url(path)).json(body))?;
        response.json().map_err(|e| ApiError::Parse(e.to_string()))
    }

    fn patch(&self, path: &str, body: serde_json::Value) -> Result<(), ApiError> {
        tracing::debug!(path, "PATCH");
        self.send(self.client.patch(self.url(path)).json(&body))?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), ApiError> {
        tracing::debug!(path, "DELETE");
        self.send(self.client.delete(self.url(path)))?;
        Ok(())
    }
}

impl LifehubApi for ApiClient {
    fn login_url(&self) -> String {
        super::login_url(&self.base_url)
    }

    fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.get_json("/api/user/me")
    }

    fn transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        self.get_json("/api/transactions")
    }

    fn upload_transactions(&self, file: &Path) -> Result<Vec<Transaction>, ApiError> {
        tracing::debug!(file = %file.display(), "POST /api/transactions/upload");
        let form = multipart::Form::new()
            .file("file", file)
            .map_err(|e| ApiError::Network(format!("Failed to read '{}': {}", file.display(), e)))?;
        let response = self.send(
            self.client
                .post(self.url("/api/transactions/upload"))
                .multipart(form),
        )?;
        let body: UploadResponse = response.json().map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(body.transactions)
    }

    fn update_amount(&self, id: &str, amount: Decimal) -> Result<(), ApiError> {
        self.patch(
            &format!("/api/transactions/{}/amount", id),
            json!({ "amount": amount }),
        )
    }

    fn update_category(&self, id: &str, category: &str) -> Result<(), ApiError> {
        self.patch(
            &format!("/api/transactions/{}/category", id),
            json!({ "category": category }),
        )
    }

    fn delete_transaction(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/api/transactions/{}/delete", id))
    }

    fn clear_transactions(&self) -> Result<(), ApiError> {
        self.delete("/api/transactions/clear")
    }

    fn analysis_history(&self) -> Result<Vec<AnalysisReport>, ApiError> {
        self.get_json("/api/analysis")
    }

    fn analyze(
        &self,
        month: &str,
        transactions: &[Transaction],
    ) -> Result<AnalysisReport, ApiError> {
        self.post_json("/api/analysis", &AnalysisRequest { transactions, month })
    }

    fn markers(&self) -> Result<Vec<Marker>, ApiError> {
        self.get_json("/api/markers")
    }

    fn create_marker(&self, title: &str, color: &str) -> Result<CreatedMarker, ApiError> {
        self.post_json("/api/markers", &json!({ "title": title, "color": color }))
    }

    fn move_marker(&self, id: &str, new_order: i64) -> Result<(), ApiError> {
        self.patch(
            &format!("/api/markers/{}/move", id),
            json!({ "newOrder": new_order }),
        )
    }

    fn delete_marker(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/api/markers/{}", id))
    }

    fn add_link(&self, marker_id: &str, title: &str, url: &str) -> Result<String, ApiError> {
        let IdResponse(id) = self.post_json(
            &format!("/api/markers/{}/links", marker_id),
            &json!({ "title": title, "url": url }),
        )?;
        Ok(id)
    }

    fn delete_link(&self, link_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/api/links/{}", link_id))
    }
}

/// Maps a failed response onto `ApiError`, preferring the backend's
/// `{"message": ...}` body when there is one.
pub fn error_for_status(status: u16, body: &str) -> ApiError {
    if status == 401 {
        return ApiError::Unauthorized;
    }
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    ApiError::Status { status, message }
}
