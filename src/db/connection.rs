use rusqlite::{Connection, Result};
use std::path::Path;

const CREATE_LOCAL_STORAGE: &str = "CREATE TABLE IF NOT EXISTS local_storage (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";

pub fn establish_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute(CREATE_LOCAL_STORAGE, [])?;
    Ok(conn)
}

#[cfg(test)]
pub fn establish_test_connection() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute(CREATE_LOCAL_STORAGE, [])?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_establish_connection_creates_table_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lifehub.db");

        establish_connection(&path).unwrap();
        let conn = establish_connection(&path).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'local_storage'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
