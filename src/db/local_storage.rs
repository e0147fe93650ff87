//! Key/value store standing in for the browser's `localStorage`.

use crate::error::AppResult;
use crate::models::marker::{LegacyMarker, LinkItem};
use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeMap;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const LEGACY_MARKERS_KEY: &str = "my-markers";

pub fn legacy_links_key(marker_id: &str) -> String {
    format!("marker-links-{}", marker_id)
}

pub fn get_item(conn: &Connection, key: &str) -> AppResult<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM local_storage WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

pub fn set_item(conn: &Connection, key: &str, value: &str) -> AppResult<()> {
    conn.execute(
        "INSERT INTO local_storage (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [key, value],
    )?;
    Ok(())
}

pub fn remove_item(conn: &Connection, key: &str) -> AppResult<()> {
    conn.execute("DELETE FROM local_storage WHERE key = ?1", [key])?;
    Ok(())
}

pub fn clear(conn: &Connection) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM local_storage", [])?)
}

pub fn keys(conn: &Connection) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT key FROM local_storage ORDER BY key ASC")?;
    let keys = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(keys)
}

/// Loads a `JSON.stringify(localStorage)` dump taken in the browser.
/// Returns the number of keys written.
pub fn import_dump(conn: &Connection, dump: &str) -> AppResult<usize> {
    let entries: BTreeMap<String, String> = serde_json::from_str(dump)?;
    for (key, value) in &entries {
        set_item(conn, key, value)?;
    }
    Ok(entries.len())
}

/// Markers and their links kept locally by earlier dashboard revisions.
pub fn load_legacy_markers(conn: &Connection) -> AppResult<Vec<(LegacyMarker, Vec<LinkItem>)>> {
    let Some(raw) = get_item(conn, LEGACY_MARKERS_KEY)? else {
        return Ok(Vec::new());
    };
    let markers: Vec<LegacyMarker> = serde_json::from_str(&raw)?;

    let mut result = Vec::with_capacity(markers.len());
    for marker in markers {
        let links = match get_item(conn, &legacy_links_key(&marker.id))? {
            Some(raw_links) => serde_json::from_str(&raw_links)?,
            None => Vec::new(),
        };
        result.push((marker, links));
    }
    Ok(result)
}

pub fn remove_legacy_marker(conn: &Connection, marker_id: &str) -> AppResult<()> {
    remove_item(conn, &legacy_links_key(marker_id))
}

/// Rewrites the legacy marker list; an empty list drops the key.
pub fn save_legacy_markers(conn: &Connection, markers: &[LegacyMarker]) -> AppResult<()> {
    if markers.is_empty() {
        return remove_item(conn, LEGACY_MARKERS_KEY);
    }
    set_item(conn, LEGACY_MARKERS_KEY, &serde_json::to_string(markers)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::establish_test_connection;

    #[test]
    fn test_get_missing_item_is_none() {
        let conn = establish_test_connection().unwrap();
        assert_eq!(get_item(&conn, ACCESS_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_set_item_overwrites() {
        let conn = establish_test_connection().unwrap();
        set_item(&conn, ACCESS_TOKEN_KEY, "first").unwrap();
        set_item(&conn, ACCESS_TOKEN_KEY, "second").unwrap();

        assert_eq!(
            get_item(&conn, ACCESS_TOKEN_KEY).unwrap().as_deref(),
            Some("second")
        );
        assert_eq!(keys(&conn).unwrap(), vec![ACCESS_TOKEN_KEY.to_string()]);
    }

    #[test]
    fn test_remove_and_clear() {
        let conn = establish_test_connection().unwrap();
        set_item(&conn, "a", "1").unwrap();
        set_item(&conn, "b", "2").unwrap();

        remove_item(&conn, "a").unwrap();
        assert_eq!(keys(&conn).unwrap(), vec!["b".to_string()]);

        assert_eq!(clear(&conn).unwrap(), 1);
        assert!(keys(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_import_dump() {
        let conn = establish_test_connection().unwrap();
        let dump = r#"{"accessToken": "tok", "my-markers": "[]"}"#;

        assert_eq!(import_dump(&conn, dump).unwrap(), 2);
        assert_eq!(get_item(&conn, "accessToken").unwrap().as_deref(), Some("tok"));
    }

    #[test]
    fn test_import_dump_rejects_non_string_values() {
        let conn = establish_test_connection().unwrap();
        assert!(import_dump(&conn, r#"{"accessToken": 5}"#).is_err());
    }

    #[test]
    fn test_load_legacy_markers_with_links() {
        let conn = establish_test_connection().unwrap();
        set_item(
            &conn,
            LEGACY_MARKERS_KEY,
            r#"[{"id": "1700000000000", "title": "Lost Ark", "color": "bg-rose-600", "desc": "Game Guide"},
                {"id": "1700000000001", "title": "Diablo", "color": "bg-blue-600"}]"#,
        )
        .unwrap();
        set_item(
            &conn,
            "marker-links-1700000000000",
            r#"[{"id": "1", "title": "Build", "url": "https://example.com/build"}]"#,
        )
        .unwrap();

        let legacy = load_legacy_markers(&conn).unwrap();
        assert_eq!(legacy.len(), 2);
        assert_eq!(legacy[0].0.title, "Lost Ark");
        assert_eq!(legacy[0].1.len(), 1);
        assert!(legacy[1].1.is_empty());
    }

    #[test]
    fn test_load_legacy_markers_absent() {
        let conn = establish_test_connection().unwrap();
        assert!(load_legacy_markers(&conn).unwrap().is_empty());
    }
}
