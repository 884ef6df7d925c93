//! Rotation planning: advances focus to the next tab once the active tab's
//! dwell time has elapsed.
//!
//! The dwell clock is a single global instant, not per-tab: rotation times
//! "how long has the currently focused tab been focused", so a manual tab
//! switch changes which entry's interval governs the next rotation without
//! resetting the elapsed clock itself.

use chrono::NaiveDateTime;

use crate::registry::TabRegistry;
use crate::types::{DisplayConfig, OpenTab, TabId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationState {
    pub last_rotate: NaiveDateTime,
}

impl RotationState {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { last_rotate: now }
    }
}

/// Decide whether to rotate at `now`.
///
/// Returns the updated state and, when the active tab's dwell interval has
/// elapsed, the tab to focus next — the immediate successor in list order,
/// wrapping from last to first. With no active tab in the listing the
/// successor of "nothing" is the first tab, and the default interval
/// governs. An empty listing is a no-op.
pub fn plan_rotation(
    state: &RotationState,
    config: &DisplayConfig,
    registry: &TabRegistry,
    tabs: &[OpenTab],
    now: NaiveDateTime,
) -> (RotationState, Option<TabId>) {
    if tabs.is_empty() {
        return (state.clone(), None);
    }

    let active_idx = tabs.iter().position(|t| t.active);
    let entry = active_idx.and_then(|i| registry.entry_for(&tabs[i].id));
    let dwell = config.rotate_after(entry);

    if now.signed_duration_since(state.last_rotate) < dwell {
        return (state.clone(), None);
    }

    let next_idx = active_idx.map_or(0, |i| i + 1) % tabs.len();
    (
        RotationState { last_rotate: now },
        Some(tabs[next_idx].id.clone()),
    )
}

// ─── Tests ────────────────────────────────────────────────────────
