//! Marker drag-and-drop reordering.
//!
//! Markers are listed by `sort_order` descending. Dropping a marker onto
//! another one moves it to the target's index and hands it the target's
//! ordinal; the ordinals in between shift by one, the same way the backend
//! shifts them when it receives `PATCH /api/markers/{id}/move`.

use crate::api::{ApiError, LifehubApi};
use crate::models::marker::Marker;

/// A move that has already been applied locally and still has to reach
/// the server. Holds the pre-move list as its compensating action.
#[derive(Debug, Clone)]
pub struct MoveCommand {
    pub seq: u64,
    pub marker_id: String,
    pub new_order: i64,
    previous: Vec<Marker>,
}

impl MoveCommand {
    pub(crate) fn new(seq: u64, marker_id: String, new_order: i64, previous: Vec<Marker>) -> Self {
        Self {
            seq,
            marker_id,
            new_order,
            previous,
        }
    }

    /// Sends the single update call for this move.
    pub fn sync<A: LifehubApi>(&self, api: &A) -> Result<(), ApiError> {
        api.move_marker(&self.marker_id, self.new_order)
    }

    pub(crate) fn into_previous(self) -> Vec<Marker> {
        self.previous
    }
}

/// Computes the list after dropping `source_id` onto `target_id`.
/// Returns the new list and the ordinal sent to the server, or `None`
/// when there is nothing to move.
pub fn reorder(
    markers: &[Marker],
    source_id: &str,
    target_id: &str,
) -> Option<(Vec<Marker>, i64)> {
    if source_id == target_id {
        return None;
    }
    let from = markers.iter().position(|m| m.id == source_id)?;
    let to = markers.iter().position(|m| m.id == target_id)?;

    let current = markers[from].sort_order;
    let target_order = markers[to].sort_order;

    let mut next = markers.to_vec();
    for marker in next.iter_mut().filter(|m| m.id != source_id) {
        if current > target_order
            && marker.sort_order >= target_order
            && marker.sort_order < current
        {
            marker.sort_order += 1;
        } else if current < target_order
            && marker.sort_order > current
            && marker.sort_order <= target_order
        {
            marker.sort_order -= 1;
        }
    }

    let mut moved = next.remove(from);
    moved.sort_order = target_order;
    next.insert(to, moved);

    if !is_strictly_descending(&next) {
        // Only the moved marker's ordinal is sent; the server keeps the
        // duplicates until the next reload replaces this local numbering.
        tracing::warn!(
            marker_id = source_id,
            "Duplicate marker ordinals renumbered locally; server order may differ"
        );
        renumber(&mut next);
    }
    let new_order = next[to].sort_order;
    Some((next, new_order))
}

fn is_strictly_descending(markers: &[Marker]) -> bool {
    markers.windows(2).all(|pair| pair[0].sort_order > pair[1].sort_order)
}

// Duplicate ordinals (older data) cannot express an order; start over at len..1.
fn renumber(markers: &mut [Marker]) {
    let len = markers.len() as i64;
    for (index, marker) in markers.iter_mut().enumerate() {
        marker.sort_order = len - index as i64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::{sample_marker, FakeApi};

    fn ids(markers: &[Marker]) -> Vec<&str> {
        markers.iter().map(|m| m.id.as_str()).collect()
    }

    fn orders(markers: &[Marker]) -> Vec<i64> {
        markers.iter().map(|m| m.sort_order).collect()
    }

    fn abc() -> Vec<Marker> {
        vec![sample_marker("A", 3), sample_marker("B", 2), sample_marker("C", 1)]
    }

    #[test]
    fn test_drag_first_onto_last() {
        let (next, new_order) = reorder(&abc(), "A", "C").unwrap();
        assert_eq!(ids(&next), vec!["B", "C", "A"]);
        assert_eq!(orders(&next), vec![3, 2, 1]);
        assert_eq!(new_order, 1);
    }

    #[test]
    fn test_drag_last_onto_first() {
        let (next, new_order) = reorder(&abc(), "C", "A").unwrap();
        assert_eq!(ids(&next), vec!["C", "A", "B"]);
        assert_eq!(orders(&next), vec![3, 2, 1]);
        assert_eq!(new_order, 3);
    }

    #[test]
    fn test_drag_onto_neighbour() {
        let (next, _) = reorder(&abc(), "B", "A").unwrap();
        assert_eq!(ids(&next), vec!["B", "A", "C"]);
        assert_eq!(orders(&next), vec![3, 2, 1]);
    }

    #[test]
    fn test_gaps_shift_like_the_server() {
        let markers = vec![sample_marker("A", 5), sample_marker("B", 3), sample_marker("C", 1)];
        let (next, new_order) = reorder(&markers, "A", "C").unwrap();
        assert_eq!(ids(&next), vec!["B", "C", "A"]);
        assert_eq!(orders(&next), vec![4, 2, 1]);
        assert_eq!(new_order, 1);
    }

    #[test]
    fn test_duplicate_ordinals_are_renumbered() {
        let markers = vec![sample_marker("A", 0), sample_marker("B", 0), sample_marker("C", 0)];
        let (next, new_order) = reorder(&markers, "A", "B").unwrap();
        assert_eq!(ids(&next), vec!["B", "A", "C"]);
        assert_eq!(orders(&next), vec![3, 2, 1]);
        assert_eq!(new_order, 2);
    }

    #[test]
    fn test_renumbered_move_sends_only_the_moved_marker() {
        let markers = vec![sample_marker("A", 3), sample_marker("B", 3), sample_marker("C", 1)];
        let (next, new_order) = reorder(&markers, "C", "B").unwrap();
        assert_eq!(ids(&next), vec!["A", "C", "B"]);
        assert_eq!(orders(&next), vec![3, 2, 1]);
        assert_eq!(new_order, 2);

        let api = FakeApi::with_markers(markers.clone());
        MoveCommand::new(1, "C".to_string(), new_order, markers).sync(&api).unwrap();
        assert_eq!(api.calls(), vec![format!("move_marker C {}", new_order)]);
    }

    #[test]
    fn test_same_or_missing_marker_is_a_no_op() {
        assert!(reorder(&abc(), "A", "A").is_none());
        assert!(reorder(&abc(), "A", "Z").is_none());
        assert!(reorder(&abc(), "Z", "A").is_none());
    }

    #[test]
    fn test_reorder_keeps_input_untouched() {
        let markers = abc();
        reorder(&markers, "A", "C").unwrap();
        assert_eq!(ids(&markers), vec!["A", "B", "C"]);
    }
}
