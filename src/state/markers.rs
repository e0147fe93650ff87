//! Session state for the bookmark board.

use super::reorder::{self, MoveCommand};
use crate::api::{ApiError, LifehubApi};
use crate::auth;
use crate::error::{AppError, AppResult};
use crate::models::marker::{normalize_url, pick_color, CreatedMarker, LinkItem, Marker};
use uuid::Uuid;

/// What to do with the local order when a move fails to reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailedMovePolicy {
    /// Log the failure and keep the order the user sees.
    #[default]
    KeepLocal,
    /// Put the list back the way it was before the move.
    Rollback,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveSettlement {
    Synced,
    KeptLocal(ApiError),
    RolledBack(ApiError),
}

#[derive(Debug)]
pub struct MarkerStore {
    markers: Vec<Marker>,
    loading: bool,
    policy: FailedMovePolicy,
    last_move: u64,
}

impl MarkerStore {
    pub fn new(policy: FailedMovePolicy) -> Self {
        Self {
            markers: Vec::new(),
            loading: true,
            policy,
            last_move: 0,
        }
    }

    /// Verifies the session, then fetches every marker with its links.
    pub fn mount<A: LifehubApi>(api: &A, policy: FailedMovePolicy) -> AppResult<Self> {
        auth::check_login(api)?;
        let mut store = Self::new(policy);
        store.reload(api)?;
        Ok(store)
    }

    pub fn reload<A: LifehubApi>(&mut self, api: &A) -> AppResult<()> {
        self.loading = true;
        let result = match api.markers() {
            Ok(markers) => {
                tracing::info!(count = markers.len(), "Markers loaded");
                self.set_markers(markers);
                Ok(())
            }
            Err(ApiError::Unauthorized) => Err(AppError::LoginRequired {
                login_url: api.login_url(),
            }),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load markers");
                self.markers.clear();
                Ok(())
            }
        };
        self.loading = false;
        result
    }

    fn set_markers(&mut self, mut markers: Vec<Marker>) {
        markers.sort_by(|a, b| b.sort_order.cmp(&a.sort_order));
        self.markers = markers;
        self.loading = false;
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn policy(&self) -> FailedMovePolicy {
        self.policy
    }

    pub fn marker(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    fn marker_mut(&mut self, id: &str) -> AppResult<&mut Marker> {
        self.markers
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Marker {}", id)))
    }

    /// Creates a marker on the server and puts it at the top of the board.
    /// Without a color one is picked from the palette.
    pub fn create_marker<A: LifehubApi>(
        &mut self,
        api: &A,
        title: &str,
        color: Option<&str>,
    ) -> AppResult<&Marker> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Invalid("Marker title cannot be empty".to_string()));
        }
        let color = match color {
            Some(c) => c.to_string(),
            None => pick_color(Uuid::new_v4().as_bytes()[0]).to_string(),
        };

        let marker = match api.create_marker(title, &color)? {
            CreatedMarker::Full(marker) => marker,
            CreatedMarker::Id(id) => {
                let next_order = self.markers.iter().map(|m| m.sort_order).max().unwrap_or(0) + 1;
                Marker::new(id, title.to_string(), color, next_order)
            }
        };
        tracing::info!(id = %marker.id, title, "Marker created");
        self.markers.insert(0, marker);
        Ok(&self.markers[0])
    }

    pub fn delete_marker<A: LifehubApi>(&mut self, api: &A, id: &str) -> AppResult<()> {
        if self.marker(id).is_none() {
            return Err(AppError::NotFound(format!("Marker {}", id)));
        }
        api.delete_marker(id)?;
        self.markers.retain(|m| m.id != id);
        tracing::info!(id, "Marker deleted");
        Ok(())
    }

    pub fn add_link<A: LifehubApi>(
        &mut self,
        api: &A,
        marker_id: &str,
        title: &str,
        url: &str,
    ) -> AppResult<LinkItem> {
        let title = title.trim();
        if title.is_empty() || url.trim().is_empty() {
            return Err(AppError::Invalid("Link title and url are required".to_string()));
        }
        self.marker_mut(marker_id)?;

        let url = normalize_url(url);
        let id = api.add_link(marker_id, title, &url)?;
        let link = LinkItem {
            id,
            title: title.to_string(),
            url,
        };
        self.marker_mut(marker_id)?.links.push(link.clone());
        tracing::info!(marker_id, link_id = %link.id, "Link added");
        Ok(link)
    }

    pub fn delete_link<A: LifehubApi>(
        &mut self,
        api: &A,
        marker_id: &str,
        link_id: &str,
    ) -> AppResult<()> {
        let marker = self.marker_mut(marker_id)?;
        if !marker.links.iter().any(|l| l.id == link_id) {
            return Err(AppError::NotFound(format!("Link {}", link_id)));
        }
        api.delete_link(link_id)?;
        self.marker_mut(marker_id)?.links.retain(|l| l.id != link_id);
        tracing::info!(marker_id, link_id, "Link deleted");
        Ok(())
    }

    /// Applies the move locally and returns the command that still has to
    /// be sent.
    pub fn begin_move(&mut self, source_id: &str, target_id: &str) -> Option<MoveCommand> {
        let (next, new_order) = reorder::reorder(&self.markers, source_id, target_id)?;
        self.last_move += 1;
        let previous = std::mem::replace(&mut self.markers, next);
        tracing::debug!(source_id, target_id, new_order, "Marker moved locally");
        Some(MoveCommand::new(
            self.last_move,
            source_id.to_string(),
            new_order,
            previous,
        ))
    }

    /// Records the server's answer to a move. A rollback only happens for
    /// the latest move; older snapshots would undo later moves.
    pub fn settle_move(
        &mut self,
        command: MoveCommand,
        result: Result<(), ApiError>,
    ) -> MoveSettlement {
        let error = match result {
            Ok(()) => {
                tracing::debug!(marker_id = %command.marker_id, "Marker order synced");
                return MoveSettlement::Synced;
            }
            Err(e) => e,
        };
        tracing::error!(
            marker_id = %command.marker_id,
            error = %error,
            "Failed to sync marker order"
        );

        if self.policy == FailedMovePolicy::Rollback && command.seq == self.last_move {
            self.markers = command.into_previous();
            MoveSettlement::RolledBack(error)
        } else {
            MoveSettlement::KeptLocal(error)
        }
    }

    /// Move and sync in one go, for callers without an event loop.
    pub fn move_marker<A: LifehubApi>(
        &mut self,
        api: &A,
        source_id: &str,
        target_id: &str,
    ) -> Option<MoveSettlement> {
        let command = self.begin_move(source_id, target_id)?;
        let result = command.sync(api);
        Some(self.settle_move(command, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::{sample_marker, FakeApi};

    fn abc_api() -> FakeApi {
        FakeApi::with_markers(vec![
            sample_marker("A", 3),
            sample_marker("B", 2),
            sample_marker("C", 1),
        ])
    }

    fn ids(store: &MarkerStore) -> Vec<&str> {
        store.markers().iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_mount_requires_login() {
        let api = FakeApi::unauthenticated();
        let err = MarkerStore::mount(&api, FailedMovePolicy::KeepLocal).unwrap_err();
        assert!(err.needs_login());
    }

    #[test]
    fn test_mount_sorts_by_order_descending() {
        let api = FakeApi::with_markers(vec![
            sample_marker("low", 1),
            sample_marker("high", 9),
            sample_marker("mid", 4),
        ]);
        let store = MarkerStore::mount(&api, FailedMovePolicy::KeepLocal).unwrap();
        assert_eq!(ids(&store), vec!["high", "mid", "low"]);
        assert!(!store.is_loading());
    }

    #[test]
    fn test_failed_load_is_empty_and_not_loading() {
        let api = abc_api();
        api.fail("markers");
        let store = MarkerStore::mount(&api, FailedMovePolicy::KeepLocal).unwrap();
        assert!(store.markers().is_empty());
        assert!(!store.is_loading());
    }

    #[test]
    fn test_move_syncs_dragged_marker_with_new_order() {
        let api = abc_api();
        let mut store = MarkerStore::mount(&api, FailedMovePolicy::KeepLocal).unwrap();

        let settlement = store.move_marker(&api, "A", "C").unwrap();

        assert_eq!(settlement, MoveSettlement::Synced);
        assert_eq!(ids(&store), vec!["B", "C", "A"]);
        let moves: Vec<String> = api
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("move_marker"))
            .collect();
        assert_eq!(moves, vec!["move_marker A 1"]);
    }

    #[test]
    fn test_failed_move_keeps_local_order() {
        let api = abc_api();
        api.fail("move_marker");
        let mut store = MarkerStore::mount(&api, FailedMovePolicy::KeepLocal).unwrap();

        let settlement = store.move_marker(&api, "A", "C").unwrap();

        assert!(matches!(settlement, MoveSettlement::KeptLocal(_)));
        assert_eq!(ids(&store), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_failed_move_rolls_back_when_enabled() {
        let api = abc_api();
        api.fail("move_marker");
        let mut store = MarkerStore::mount(&api, FailedMovePolicy::Rollback).unwrap();

        let settlement = store.move_marker(&api, "A", "C").unwrap();

        assert!(matches!(settlement, MoveSettlement::RolledBack(_)));
        assert_eq!(ids(&store), vec!["A", "B", "C"]);
        assert_eq!(store.markers()[0].sort_order, 3);
    }

    #[test]
    fn test_stale_failure_does_not_undo_later_move() {
        let api = abc_api();
        let mut store = MarkerStore::mount(&api, FailedMovePolicy::Rollback).unwrap();

        let first = store.begin_move("A", "C").unwrap();
        let second = store.begin_move("C", "B").unwrap();
        assert_eq!(ids(&store), vec!["C", "B", "A"]);

        let settlement = store.settle_move(
            first,
            Err(ApiError::Network("connection reset".to_string())),
        );
        assert!(matches!(settlement, MoveSettlement::KeptLocal(_)));
        assert_eq!(store.settle_move(second, Ok(())), MoveSettlement::Synced);
        assert_eq!(ids(&store), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_move_onto_itself_sends_nothing() {
        let api = abc_api();
        let mut store = MarkerStore::mount(&api, FailedMovePolicy::KeepLocal).unwrap();
        assert!(store.move_marker(&api, "B", "B").is_none());
        assert!(!api.calls().iter().any(|c| c.starts_with("move_marker")));
    }

    #[test]
    fn test_create_marker_goes_on_top() {
        let api = abc_api();
        let mut store = MarkerStore::mount(&api, FailedMovePolicy::KeepLocal).unwrap();

        let created = store.create_marker(&api, "Elden Ring", Some("bg-blue-600")).unwrap();
        assert_eq!(created.title, "Elden Ring");
        assert_eq!(created.sort_order, 4);
        assert!(created.links.is_empty());
        assert_eq!(store.markers()[0].title, "Elden Ring");
    }

    #[test]
    fn test_create_marker_from_bare_id_response() {
        let mut api = abc_api();
        api.create_returns_id = true;
        let mut store = MarkerStore::mount(&api, FailedMovePolicy::KeepLocal).unwrap();

        let created = store.create_marker(&api, "Hades", None).unwrap();
        assert_eq!(created.id, "100");
        assert_eq!(created.sort_order, 4);
        assert!(created.color.starts_with("bg-"));
    }

    #[test]
    fn test_create_marker_requires_title() {
        let api = abc_api();
        let mut store = MarkerStore::mount(&api, FailedMovePolicy::KeepLocal).unwrap();
        assert!(store.create_marker(&api, "  ", None).is_err());
        assert!(!api.calls().iter().any(|c| c.starts_with("create_marker")));
    }

    #[test]
    fn test_delete_marker() {
        let api = abc_api();
        let mut store = MarkerStore::mount(&api, FailedMovePolicy::KeepLocal).unwrap();
        store.delete_marker(&api, "B").unwrap();
        assert_eq!(ids(&store), vec!["A", "C"]);
        assert!(store.delete_marker(&api, "B").is_err());
    }

    #[test]
    fn test_add_and_delete_link() {
        let api = abc_api();
        let mut store = MarkerStore::mount(&api, FailedMovePolicy::KeepLocal).unwrap();

        let link = store.add_link(&api, "A", "Build guide", "example.com/build").unwrap();
        assert_eq!(link.url, "https://example.com/build");
        assert_eq!(store.marker("A").unwrap().links, vec![link.clone()]);
        assert!(store.marker("B").unwrap().links.is_empty());

        store.delete_link(&api, "A", &link.id).unwrap();
        assert!(store.marker("A").unwrap().links.is_empty());
    }

    #[test]
    fn test_failed_add_link_changes_nothing() {
        let api = abc_api();
        api.fail("add_link");
        let mut store = MarkerStore::mount(&api, FailedMovePolicy::KeepLocal).unwrap();
        assert!(store.add_link(&api, "A", "Guide", "https://example.com").is_err());
        assert!(store.marker("A").unwrap().links.is_empty());
    }

    #[test]
    fn test_add_link_to_unknown_marker() {
        let api = abc_api();
        let mut store = MarkerStore::mount(&api, FailedMovePolicy::KeepLocal).unwrap();
        let err = store.add_link(&api, "Z", "Guide", "https://example.com").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
