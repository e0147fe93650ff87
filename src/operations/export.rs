use crate::error::{AppError, AppResult};
use crate::models::transaction::Transaction;
use crate::state::data::DataStore;
use chrono::NaiveDate;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

const CSV_HEADER: [&str; 8] = [
    "id",
    "date",
    "merchant",
    "description",
    "amount",
    "category",
    "status",
    "paymentMethod",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }
}

pub fn default_file_name(today: NaiveDate) -> PathBuf {
    PathBuf::from(format!("payment-history-{}.json", today.format("%Y-%m-%d")))
}

pub fn export_transactions(
    store: &DataStore,
    format: ExportFormat,
    path: &Path,
) -> AppResult<usize> {
    let count = store.transactions().len();
    match format {
        ExportFormat::Json => {
            let json = store.export_json()?;
            create_file(path)?.write_all(json.as_bytes())?;
        }
        ExportFormat::Csv => export_csv(store.transactions(), create_file(path)?)?,
    }
    tracing::info!(count, path = %path.display(), ?format, "Transactions exported");
    Ok(count)
}

fn create_file(path: &Path) -> AppResult<File> {
    File::create(path).map_err(|e| {
        AppError::Invalid(format!("Failed to create file '{}': {}", path.display(), e))
    })
}

fn export_csv(transactions: &[Transaction], file: File) -> AppResult<()> {
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(CSV_HEADER)?;
    for tx in transactions {
        writer.write_record([
            tx.id.as_str(),
            tx.date.as_str(),
            tx.merchant.as_str(),
            tx.description.as_str(),
            tx.amount.to_string().as_str(),
            tx.category.as_str(),
            tx.status.label(),
            tx.payment_method.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
