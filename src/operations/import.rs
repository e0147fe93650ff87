use crate::api::LifehubApi;
use crate::db::local_storage;
use crate::error::{AppError, AppResult};
use crate::state::data::DataStore;
use rusqlite::Connection;
use std::fs;
use std::path::Path;

/// Card statement layouts the backend parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementFormat {
    Xls,
    Xlsx,
}

impl StatementFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xls" => Some(StatementFormat::Xls),
            "xlsx" => Some(StatementFormat::Xlsx),
            _ => None,
        }
    }
}

/// Uploads a statement file. The backend answers with the complete list,
/// which replaces the local one.
pub fn import_statement<A: LifehubApi>(
    api: &A,
    store: &mut DataStore,
    path: &Path,
) -> AppResult<usize> {
    if !path.is_file() {
        return Err(AppError::Invalid(format!("Failed to open file '{}'", path.display())));
    }
    let format = StatementFormat::from_path(path).ok_or_else(|| {
        AppError::Invalid(format!(
            "Unsupported import format '{}': expected .xls or .xlsx",
            path.display()
        ))
    })?;
    tracing::debug!(?format, path = %path.display(), "Uploading statement");
    store.upload(api, path)
}

/// Loads a JSON object of string pairs (a browser localStorage dump) so
/// legacy markers can be migrated.
pub fn import_storage_dump(conn: &Connection, path: &Path) -> AppResult<usize> {
    let contents = fs::read_to_string(path).map_err(|e| {
        AppError::Invalid(format!("Failed to open file '{}': {}", path.display(), e))
    })?;
    let count = local_storage::import_dump(conn, &contents)?;
    tracing::info!(count, path = %path.display(), "Local storage dump imported");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::establish_test_connection;
    use crate::state::testing::{sample_transaction, FakeApi};
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
        let mut tmp = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(tmp, "{}", contents).unwrap();
        tmp
    }

    #[test]
    fn test_statement_format_from_extension() {
        assert_eq!(StatementFormat::from_path(Path::new("card.XLSX")), Some(StatementFormat::Xlsx));
        assert_eq!(StatementFormat::from_path(Path::new("card.xls")), Some(StatementFormat::Xls));
        assert_eq!(StatementFormat::from_path(Path::new("card.csv")), None);
        assert_eq!(StatementFormat::from_path(Path::new("card")), None);
    }

    #[test]
    fn test_import_statement_replaces_list() {
        let existing = sample_transaction("1", "Food", 100, "2024.01.01");
        let api = FakeApi::with_transactions(vec![existing]);
        api.uploaded
            .borrow_mut()
            .push(sample_transaction("2", "Cafe", 200, "2024.01.02"));
        let mut store = DataStore::mount(&api).unwrap();
        let file = write_temp(".xlsx", "statement");

        let count = import_statement(&api, &mut store, file.path()).unwrap();

        assert_eq!(count, 2);
        assert_eq!(store.categories(), &["Cafe".to_string(), "Food".to_string()]);
    }

    #[test]
    fn test_import_unsupported_format() {
        let api = FakeApi::new();
        let mut store = DataStore::new();
        let file = write_temp(".csv", "a,b,c");

        let err = import_statement(&api, &mut store, file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported import format"));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_import_nonexistent_file() {
        let api = FakeApi::new();
        let mut store = DataStore::new();
        let err = import_statement(&api, &mut store, Path::new("nonexistent.xlsx")).unwrap_err();
        assert!(err.to_string().contains("Failed to open file"));
    }

    #[test]
    fn test_failed_upload_keeps_list() {
        let existing = sample_transaction("1", "Food", 100, "2024.01.01");
        let api = FakeApi::with_transactions(vec![existing]);
        let mut store = DataStore::mount(&api).unwrap();
        api.fail("upload_transactions");
        let file = write_temp(".xls", "statement");

        assert!(import_statement(&api, &mut store, file.path()).is_err());
        assert_eq!(store.transactions().len(), 1);
    }

    #[test]
    fn test_import_storage_dump() {
        let conn = establish_test_connection().unwrap();
        let file = write_temp(".json", r#"{"my-markers": "[]", "theme": "dark"}"#);

        assert_eq!(import_storage_dump(&conn, file.path()).unwrap(), 2);
        assert_eq!(
            local_storage::get_item(&conn, "theme").unwrap().as_deref(),
            Some("dark")
        );
    }
}
