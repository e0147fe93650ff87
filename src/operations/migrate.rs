//! Moves markers kept in local storage by older dashboard revisions onto
//! the server.

use crate::api::LifehubApi;
use crate::db::local_storage::{self, LEGACY_MARKERS_KEY};
use crate::error::AppResult;
use crate::models::marker::LegacyMarker;
use crate::state::markers::MarkerStore;
use rusqlite::Connection;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub markers: usize,
    pub links: usize,
}

/// Uploads every legacy marker with its links. Each marker is removed from
/// local storage as soon as it is on the server, so a failed run can be
/// repeated without creating duplicates.
pub fn migrate_legacy_markers<A: LifehubApi>(
    conn: &Connection,
    api: &A,
    store: &mut MarkerStore,
) -> AppResult<MigrationReport> {
    let legacy = local_storage::load_legacy_markers(conn)?;
    let mut remaining: Vec<LegacyMarker> = legacy.iter().map(|(m, _)| m.clone()).collect();
    let mut report = MigrationReport::default();

    if legacy.is_empty() {
        tracing::info!(key = LEGACY_MARKERS_KEY, "No legacy markers to migrate");
        return Ok(report);
    }

    for (marker, links) in legacy {
        let created_id = store
            .create_marker(api, &marker.title, Some(marker.color.as_str()))?
            .id
            .clone();

        for link in &links {
            if let Err(e) = store.add_link(api, &created_id, &link.title, &link.url) {
                tracing::warn!(
                    legacy_id = %marker.id,
                    error = %e,
                    "Link upload failed, undoing marker"
                );
                // Only this marker is retried on the next run.
                if let Err(undo) = store.delete_marker(api, &created_id) {
                    tracing::error!(
                        id = %created_id,
                        error = %undo,
                        "Failed to remove partially migrated marker"
                    );
                }
                local_storage::save_legacy_markers(conn, &remaining)?;
                return Err(e);
            }
        }

        remaining.retain(|m| m.id != marker.id);
        local_storage::save_legacy_markers(conn, &remaining)?;
        local_storage::remove_legacy_marker(conn, &marker.id)?;
        report.markers += 1;
        report.links += links.len();
        tracing::info!(
            legacy_id = %marker.id,
            id = %created_id,
            links = links.len(),
            "Legacy marker migrated"
        );
    }

    Ok(report)
}
