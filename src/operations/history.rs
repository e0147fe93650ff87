//! Filters and groupings behind the payment history views.

use crate::models::transaction::Transaction;
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    /// Substring of merchant or description, case-insensitive.
    pub search: String,
    /// `None` shows every category.
    pub category: Option<String>,
    /// `YYYY-MM`
    pub month: Option<String>,
}

impl HistoryFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        let search = self.search.trim();
        if !search.is_empty() && !tx.matches_search(search) {
            return false;
        }
        if let Some(ref category) = self.category {
            if &tx.category != category {
                return false;
            }
        }
        if let Some(ref month) = self.month {
            if tx.month_key().as_deref() != Some(month.as_str()) {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.category.is_none() && self.month.is_none()
    }
}

pub fn filter_transactions<'a>(
    transactions: &'a [Transaction],
    filter: &HistoryFilter,
) -> Vec<&'a Transaction> {
    transactions.iter().filter(|t| filter.matches(t)).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub value: Decimal,
    pub count: usize,
}

/// Spend per category, largest first.
pub fn category_breakdown<'a, I>(transactions: I) -> Vec<CategoryTotal>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut totals: HashMap<&str, (Decimal, usize)> = HashMap::new();
    for tx in transactions {
        let entry = totals.entry(tx.category.as_str()).or_insert((Decimal::ZERO, 0));
        entry.0 += tx.amount;
        entry.1 += 1;
    }

    let mut breakdown: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, (value, count))| CategoryTotal {
            category: category.to_string(),
            value,
            count,
        })
        .collect();
    breakdown.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.category.cmp(&b.category)));
    breakdown
}

/// Distinct `YYYY-MM` keys, newest first.
pub fn available_months(transactions: &[Transaction]) -> Vec<String> {
    let months: BTreeSet<String> = transactions.iter().filter_map(|t| t.month_key()).collect();
    months.into_iter().rev().collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthGroup<'a> {
    pub month: String,
    pub total: Decimal,
    pub transactions: Vec<&'a Transaction>,
}

/// Groups transactions by month, newest month first. Transactions with an
/// unreadable date end up in an "unknown" group at the end.
pub fn group_by_month<'a, I>(transactions: I) -> Vec<MonthGroup<'a>>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut groups: Vec<MonthGroup<'a>> = Vec::new();
    for tx in transactions {
        let month = tx.month_key().unwrap_or_else(|| "unknown".to_string());
        match groups.iter_mut().find(|g| g.month == month) {
            Some(group) => {
                group.total += tx.amount;
                group.transactions.push(tx);
            }
            None => groups.push(MonthGroup {
                month,
                total: tx.amount,
                transactions: vec![tx],
            }),
        }
    }
    groups.sort_by(|a, b| match (a.month.as_str(), b.month.as_str()) {
        ("unknown", "unknown") => std::cmp::Ordering::Equal,
        ("unknown", _) => std::cmp::Ordering::Greater,
        (_, "unknown") => std::cmp::Ordering::Less,
        (x, y) => y.cmp(x),
    });
    groups
}

pub fn parse_month(month: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d").ok()
}

/// Steps a `YYYY-MM` key by `delta` months.
pub fn shift_month(month: &str, delta: i32) -> Option<String> {
    let first = parse_month(month)?;
    let shifted = if delta >= 0 {
        first.checked_add_months(Months::new(delta.unsigned_abs()))?
    } else {
        first.checked_sub_months(Months::new(delta.unsigned_abs()))?
    };
    Some(shifted.format("%Y-%m").to_string())
}

pub fn month_label(month: &str) -> String {
    match parse_month(month) {
        Some(date) => date.format("%B %Y").to_string(),
        None => month.to_string(),
    }
}

pub fn print_history(transactions: &[&Transaction]) {
    if transactions.is_empty() {
        println!("No transactions match the current filters.");
        return;
    }
    for group in group_by_month(transactions.iter().copied()) {
        println!(
            "{} ({} transactions, total {})",
            month_label(&group.month),
            group.transactions.len(),
            group.total
        );
        for tx in group.transactions {
            println!(
                "  [{}] {:<19} {:<24} {:>12} {:<14} {}",
                tx.id,
                tx.date,
                tx.merchant,
                tx.amount,
                tx.category,
                tx.status.label()
            );
        }
    }
}

pub fn print_breakdown(breakdown: &[CategoryTotal]) {
    for entry in breakdown {
        println!("{:<16} {:>12}  ({} transactions)", entry.category, entry.value, entry.count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::sample_transaction;

    fn history() -> Vec<Transaction> {
        let mut coffee = sample_transaction("1", "Cafe", 4500, "2024.03.02 08:10:00");
        coffee.merchant = "Starbucks".to_string();
        let mut lunch = sample_transaction("2", "Food", 12000, "2024.03.05 12:30:00");
        lunch.description = "Team lunch".to_string();
        let dinner = sample_transaction("3", "Food", 30000, "2024.02.20 19:00:00");
        let bus = sample_transaction("4", "Transport", 1500, "2023.12.31 23:00:00");
        vec![coffee, lunch, dinner, bus]
    }

    fn ids(transactions: &[&Transaction]) -> Vec<String> {
        transactions.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_search_is_case_insensitive_over_merchant_and_description() {
        let all = history();
        let filter = HistoryFilter {
            search: "STARBUCKS".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&filter_transactions(&all, &filter)), vec!["1"]);

        let filter = HistoryFilter {
            search: "team".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&filter_transactions(&all, &filter)), vec!["2"]);
    }

    #[test]
    fn test_category_and_month_filters_combine() {
        let all = history();
        let filter = HistoryFilter {
            category: Some("Food".to_string()),
            month: Some("2024-03".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_transactions(&all, &filter)), vec!["2"]);

        assert_eq!(filter_transactions(&all, &HistoryFilter::default()).len(), 4);
        assert!(HistoryFilter::default().is_empty());
    }

    #[test]
    fn test_breakdown_sorted_by_value() {
        let all = history();
        let breakdown = category_breakdown(&all);
        assert_eq!(breakdown[0].category, "Food");
        assert_eq!(breakdown[0].value, Decimal::new(42000, 0));
        assert_eq!(breakdown[0].count, 2);
        assert_eq!(breakdown.last().unwrap().category, "Transport");
    }

    #[test]
    fn test_available_months_newest_first() {
        assert_eq!(available_months(&history()), vec!["2024-03", "2024-02", "2023-12"]);
    }

    #[test]
    fn test_group_by_month_totals() {
        let mut all = history();
        all.push(sample_transaction("5", "Food", 100, "someday"));
        let groups = group_by_month(&all);

        let months: Vec<&str> = groups.iter().map(|g| g.month.as_str()).collect();
        assert_eq!(months, vec!["2024-03", "2024-02", "2023-12", "unknown"]);
        assert_eq!(groups[0].total, Decimal::new(16500, 0));
        assert_eq!(groups[0].transactions.len(), 2);
    }

    #[test]
    fn test_shift_month_crosses_years() {
        assert_eq!(shift_month("2024-01", -1).as_deref(), Some("2023-12"));
        assert_eq!(shift_month("2023-12", 1).as_deref(), Some("2024-01"));
        assert_eq!(shift_month("2024-05", 0).as_deref(), Some("2024-05"));
        assert_eq!(shift_month("May", 1), None);
    }

    #[test]
    fn test_month_label() {
        assert_eq!(month_label("2024-03"), "March 2024");
        assert_eq!(month_label("unknown"), "unknown");
    }
}
