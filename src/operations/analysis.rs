//! Monthly spending breakdown and the AI analysis reports stored per month.

use crate::api::LifehubApi;
use crate::error::{AppError, AppResult};
use crate::models::analysis::AnalysisReport;
use crate::models::transaction::Transaction;
use crate::operations::history::category_breakdown;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub category: String,
    pub amount: Decimal,
    /// Rounded to a whole percent.
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyBreakdown {
    pub month: String,
    pub total: Decimal,
    pub transactions: usize,
    pub categories: Vec<CategoryShare>,
}

pub fn month_transactions(transactions: &[Transaction], month: &str) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| t.month_key().as_deref() == Some(month))
        .cloned()
        .collect()
}

pub fn monthly_breakdown(transactions: &[Transaction], month: &str) -> MonthlyBreakdown {
    let in_month: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.month_key().as_deref() == Some(month))
        .collect();
    let total: Decimal = in_month.iter().map(|t| t.amount).sum();

    let categories = category_breakdown(in_month.iter().copied())
        .into_iter()
        .map(|entry| CategoryShare {
            percentage: percentage_of(entry.value, total),
            category: entry.category,
            amount: entry.value,
        })
        .collect();

    MonthlyBreakdown {
        month: month.to_string(),
        total,
        transactions: in_month.len(),
        categories,
    }
}

fn percentage_of(amount: Decimal, total: Decimal) -> u32 {
    if total.is_zero() {
        return 0;
    }
    (amount / total * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}

/// Replaces the stored report for the report's month, or appends it.
pub fn upsert_report(history: &mut Vec<AnalysisReport>, report: AnalysisReport) {
    match history.iter_mut().find(|r| r.month == report.month) {
        Some(existing) => *existing = report,
        None => history.push(report),
    }
}

pub fn report_for<'a>(history: &'a [AnalysisReport], month: &str) -> Option<&'a AnalysisReport> {
    history.iter().find(|r| r.month == month)
}

/// Loads the saved reports. A failure leaves the history empty.
pub fn load_history<A: LifehubApi>(api: &A) -> AppResult<Vec<AnalysisReport>> {
    match api.analysis_history() {
        Ok(history) => {
            tracing::info!(count = history.len(), "Analysis history loaded");
            Ok(history)
        }
        Err(crate::api::ApiError::Unauthorized) => Err(AppError::LoginRequired {
            login_url: api.login_url(),
        }),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load analysis history");
            Ok(Vec::new())
        }
    }
}

/// Sends the month's transactions for a fresh analysis and stores the
/// answer under that month.
pub fn reanalyze<A: LifehubApi>(
    api: &A,
    history: &mut Vec<AnalysisReport>,
    transactions: &[Transaction],
    month: &str,
) -> AppResult<AnalysisReport> {
    let selected = month_transactions(transactions, month);
    if selected.is_empty() {
        return Err(AppError::Invalid(format!("No transactions recorded for {}", month)));
    }

    tracing::info!(month, count = selected.len(), "Requesting analysis");
    let mut report = api.analyze(month, &selected)?;
    report.month = month.to_string();
    upsert_report(history, report.clone());
    Ok(report)
}

pub fn print_breakdown(breakdown: &MonthlyBreakdown) {
    println!(
        "{}: {} transactions, total {}",
        breakdown.month, breakdown.transactions, breakdown.total
    );
    for share in &breakdown.categories {
        println!("  {:<16} {:>12}  {:>3}%", share.category, share.amount, share.percentage);
    }
}

pub fn print_report(report: &AnalysisReport) {
    println!("Summary: {}", report.summary);
    if let Some(ref health) = report.budget_health {
        println!("Budget health: {} ({}) {}", health.score, health.status, health.description);
    }
    for trend in &report.trends {
        println!("  [{:?}] {} {}: {}", trend.kind, trend.category, trend.change, trend.description);
    }
    for rec in &report.recommendations {
        println!("  ({:?}) {}: {}", rec.priority, rec.title, rec.description);
    }
}
