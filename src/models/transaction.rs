use super::id::{deserialize_id, deserialize_nullable_string};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const UNCATEGORIZED: &str = "Uncategorized";

const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];
const DATE_FORMATS: [&str; 3] = ["%Y.%m.%d", "%Y-%m-%d", "%Y/%m/%d"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Failed,
}

impl PaymentStatus {
    pub fn label(self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub date: String,
    pub merchant: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub description: String,
    pub amount: Decimal,
    pub category: String,
    pub status: PaymentStatus,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub payment_method: String,
}

/// Partial update applied to a single transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub amount: Option<Decimal>,
    pub category: Option<String>,
}

impl Transaction {
    pub fn new(
        id: String,
        date: String,
        merchant: String,
        description: String,
        amount: Decimal,
        category: String,
        status: PaymentStatus,
        payment_method: String,
    ) -> Self {
        Self {
            id,
            date,
            merchant,
            description,
            amount,
            category,
            status,
            payment_method,
        }
    }

    /// Calendar day of the transaction. The server passes the card
    /// statement's date through verbatim, so several layouts are accepted.
    pub fn day(&self) -> Option<NaiveDate> {
        parse_day(&self.date)
    }

    /// `YYYY-MM` key used by the history and analysis views.
    pub fn month_key(&self) -> Option<String> {
        self.day().map(|d| d.format("%Y-%m").to_string())
    }

    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.merchant.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }

    pub fn apply(&mut self, patch: &TransactionPatch) {
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(ref category) = patch.category {
            self.category = category.clone();
        }
    }
}

pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for format in DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }
    None
}
