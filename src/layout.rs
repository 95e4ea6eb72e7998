//! Applying a saved layout to the live display set

use anyhow::Result;
use tracing::{debug, warn};

use crate::randr::{self, DisplayTransaction};
use crate::store::LayoutStore;
use crate::types::DisplayInfo;

/// Outcome of applying a saved layout
#[derive(Debug)]
pub enum ApplyOutcome {
    Applied,
    /// The requested name is not in the store; carries the known names
    LayoutNotFound { available: Vec<String> },
    BeginFailed,
    CommitFailed,
}

/// Resolve a saved display to a live one.
///
/// Exact id match wins; otherwise the first live display with identical
/// (width, height) is taken. Ids are not stable across reconnects or server
/// restarts, so the geometry fallback keeps a layout applicable to the same
/// physical monitor after its id changed, at the cost of a possible mix-up
/// between displays sharing a resolution.
pub fn resolve_target(saved: &DisplayInfo, live: &[DisplayInfo]) -> Option<u32> {
    live.iter()
        .find(|d| d.id == saved.id)
        .or_else(|| {
            live.iter()
                .find(|d| d.width == saved.width && d.height == saved.height)
        })
        .map(|d| d.id)
}

/// Resolve every saved display against the live list and return the origin
/// moves to request. A saved display matching nothing is skipped; it never
/// aborts the rest of the batch.
pub fn plan_moves(saved: &[DisplayInfo], live: &[DisplayInfo]) -> Vec<(u32, i32, i32)> {
    let mut moves = Vec::new();
    for entry in saved {
        match resolve_target(entry, live) {
            Some(id) => moves.push((id, entry.x, entry.y)),
            None => debug!(
                id = entry.id,
                width = entry.width,
                height = entry.height,
                "No live display matches saved entry, skipping"
            ),
        }
    }
    moves
}

/// Apply the layout named `name`: reposition every saved display that still
/// resolves to a live one, committed as a single transaction.
/// The store is consulted before the display server so an unknown name
/// costs no connection.
pub fn apply(store: &LayoutStore, name: &str) -> Result<ApplyOutcome> {
    let config = store.load();
    let Some(saved) = config.layouts.get(name) else {
        return Ok(ApplyOutcome::LayoutNotFound {
            available: config.layouts.keys().cloned().collect(),
        });
    };

    let (conn, root) = randr::connect()?;
    let live = randr::current_displays(&conn, root)?;

    let mut txn = match DisplayTransaction::begin(&conn, root) {
        Ok(txn) => txn,
        Err(e) => {
            warn!(error = %e, "Could not begin display configuration");
            return Ok(ApplyOutcome::BeginFailed);
        }
    };
    for (crtc, x, y) in plan_moves(saved, &live) {
        txn.set_origin(crtc, x, y);
    }
    if let Err(e) = txn.commit() {
        warn!(error = %e, "Display configuration commit failed");
        return Ok(ApplyOutcome::CommitFailed);
    }
    Ok(ApplyOutcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn live_pair() -> Vec<DisplayInfo> {
        vec![
            DisplayInfo::new(1, 800, 600, 0, 0),
            DisplayInfo::new(2, 1024, 768, 100, 0),
        ]
    }

    #[test]
    fn test_resolve_prefers_id_over_geometry() {
        // Display 2 shares no geometry with the saved entry, display 1 both
        // id and geometry; id must decide
        let saved = DisplayInfo::new(1, 800, 600, 5, 5);
        assert_eq!(resolve_target(&saved, &live_pair()), Some(1));
    }

    #[test]
    fn test_resolve_id_match_wins_even_when_geometry_points_elsewhere() {
        let live = vec![
            DisplayInfo::new(1, 800, 600, 0, 0),
            DisplayInfo::new(2, 1024, 768, 100, 0),
        ];
        // Saved geometry matches display 2, saved id matches display 1
        let saved = DisplayInfo::new(1, 1024, 768, 5, 5);
        assert_eq!(resolve_target(&saved, &live), Some(1));
    }

    #[test]
    fn test_resolve_falls_back_to_geometry_when_id_gone() {
        let saved = DisplayInfo::new(99, 800, 600, 5, 5);
        assert_eq!(resolve_target(&saved, &live_pair()), Some(1));
    }

    #[test]
    fn test_resolve_geometry_fallback_takes_first_of_duplicates() {
        let live = vec![
            DisplayInfo::new(3, 1920, 1080, 0, 0),
            DisplayInfo::new(4, 1920, 1080, 1920, 0),
        ];
        let saved = DisplayInfo::new(99, 1920, 1080, 0, 0);
        assert_eq!(resolve_target(&saved, &live), Some(3));
    }

    #[test]
    fn test_resolve_no_match_yields_none() {
        let saved = DisplayInfo::new(99, 2560, 1440, 5, 5);
        assert_eq!(resolve_target(&saved, &live_pair()), None);
    }

    #[test]
    fn test_plan_requests_saved_origin_for_resolved_display() {
        let saved = vec![DisplayInfo::new(1, 800, 600, 5, 5)];
        assert_eq!(plan_moves(&saved, &live_pair()), vec![(1, 5, 5)]);
    }

    #[test]
    fn test_plan_skips_unmatched_entry_without_aborting_batch() {
        let saved = vec![
            DisplayInfo::new(1, 800, 600, 5, 5),
            DisplayInfo::new(99, 2560, 1440, 50, 50),
            DisplayInfo::new(2, 1024, 768, 800, 0),
        ];
        // Middle entry matches nothing; the other two still get moves
        assert_eq!(
            plan_moves(&saved, &live_pair()),
            vec![(1, 5, 5), (2, 800, 0)]
        );
    }

    #[test]
    fn test_save_plan_delete_scenario() {
        let dir = tempdir().unwrap();
        let store = LayoutStore::new(dir.path().join("store.json"));
        let live = vec![DisplayInfo::new(1, 1920, 1080, 0, 0)];

        // Empty store has no layouts to list
        assert!(store.load().layouts.is_empty());

        store.set_layout("home", live.clone()).unwrap();
        let names: Vec<String> = store.load().layouts.keys().cloned().collect();
        assert_eq!(names, vec!["home"]);

        // Applying against the unchanged live set plans a no-op move
        let saved = store.load();
        assert_eq!(
            plan_moves(saved.layouts.get("home").unwrap(), &live),
            vec![(1, 0, 0)]
        );

        assert!(store.remove_layout("home").unwrap());
        assert!(store.load().layouts.is_empty());
    }
}
