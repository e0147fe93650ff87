use crate::models::transaction::Transaction;
use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

/// Figures shown on the card dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub count: usize,
    pub average: Decimal,
    pub month_total: Decimal,
    pub total: Decimal,
}

pub fn summarize(transactions: &[Transaction], today: NaiveDate) -> DashboardSummary {
    let total: Decimal = transactions.iter().map(|t| t.amount).sum();
    let average = if transactions.is_empty() {
        Decimal::ZERO
    } else {
        (total / Decimal::from(transactions.len()))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    };
    let month_total = transactions
        .iter()
        .filter(|t| {
            t.day()
                .is_some_and(|d| d.year() == today.year() && d.month() == today.month())
        })
        .map(|t| t.amount)
        .sum();

    DashboardSummary {
        count: transactions.len(),
        average,
        month_total,
        total,
    }
}

pub fn print_summary(summary: &DashboardSummary, today: NaiveDate) {
    println!("Transactions:      {}", summary.count);
    println!("Average amount:    {}", summary.average);
    println!("{} total:     {}", today.format("%Y-%m"), summary.month_total);
    println!("Overall total:     {}", summary.total);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::sample_transaction;

    #[test]
    fn test_summary_of_empty_list() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let summary = summarize(&[], today);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, Decimal::ZERO);
        assert_eq!(summary.total, Decimal::ZERO);
    }

    #[test]
    fn test_summary_counts_this_month_only() {
        let transactions = vec![
            sample_transaction("1", "Food", 1000, "2024.03.01 09:00:00"),
            sample_transaction("2", "Food", 2001, "2024.03.09 18:30:00"),
            sample_transaction("3", "Cafe", 4500, "2024.02.27 08:00:00"),
            sample_transaction("4", "Cafe", 500, "2023.03.05 08:00:00"),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        let summary = summarize(&transactions, today);

        assert_eq!(summary.count, 4);
        assert_eq!(summary.month_total, Decimal::new(3001, 0));
        assert_eq!(summary.total, Decimal::new(8001, 0));
        assert_eq!(summary.average, Decimal::new(2000, 0));
    }

    #[test]
    fn test_average_rounds_half_up() {
        let transactions = vec![
            sample_transaction("1", "Food", 2, "2024.03.01 09:00:00"),
            sample_transaction("2", "Food", 3, "2024.03.02 09:00:00"),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(summarize(&transactions, today).average, Decimal::new(3, 0));
    }
}
