//! Reconciliation planning: the symmetric difference between the entries
//! that should currently be open and the tabs that actually are.
//!
//! Planning is pure; the runtime driver executes the plan against the
//! window and is the only writer of the [`TabRegistry`]. The plan orders
//! opens before closes so a partial failure never leaves the display window
//! without tabs.

use std::collections::HashSet;

use chrono::NaiveDateTime;

use crate::registry::TabRegistry;
use crate::schedule::is_applicable;
use crate::types::{DisplayConfig, EntryId, OpenTab, TabId};

/// URL the reconciler opens to keep the window alive while content tabs are
/// still being created.
pub const PLACEHOLDER_URL: &str = "about:blank";

/// URL prefixes marking host-internal tabs. These never count as content and
/// never enter the open/close computation.
const PLACEHOLDER_PREFIXES: [&str; 4] = ["about:", "chrome://", "devtools://", "chrome-extension://"];

pub fn is_placeholder(url: &str) -> bool {
    PLACEHOLDER_PREFIXES.iter().any(|p| url.starts_with(p))
}

/// One reconciliation step, to be executed in field order: guard placeholder
/// first, then every open, then the closes, then placeholder cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Entries that must be opened as new tabs.
    pub to_open: Vec<EntryId>,
    /// Content tabs to close: unknown to the registry, or no longer applicable.
    pub to_close: Vec<TabId>,
    /// Open a guard placeholder before anything else — the window has no
    /// content tabs and would collapse while the first open is in flight.
    pub open_placeholder: bool,
    /// Existing placeholder tabs that can go once content tabs remain.
    pub placeholders_to_close: Vec<TabId>,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.to_open.is_empty()
            && self.to_close.is_empty()
            && !self.open_placeholder
            && self.placeholders_to_close.is_empty()
    }
}

/// Diff the applicable entries against the open tabs.
///
/// Running the resulting plan and re-planning with the produced state yields
/// a no-op: the diff is idempotent for a fixed `now` and tab listing.
pub fn plan_reconcile(
    config: &DisplayConfig,
    registry: &TabRegistry,
    tabs: &[OpenTab],
    now: NaiveDateTime,
) -> ReconcilePlan {
    let (placeholders, content): (Vec<&OpenTab>, Vec<&OpenTab>) =
        tabs.iter().partition(|t| is_placeholder(&t.url));

    let applicable: Vec<EntryId> = config
        .iter()
        .filter(|(_, entry)| is_applicable(entry, now))
        .map(|(id, _)| id)
        .collect();
    let applicable_set: HashSet<EntryId> = applicable.iter().copied().collect();

    let mut open_entries: HashSet<EntryId> = HashSet::new();
    let mut to_close = Vec::new();
    for tab in &content {
        match registry.entry_for(&tab.id) {
            Some(entry) if applicable_set.contains(&entry) => {
                open_entries.insert(entry);
            }
            _ => to_close.push(tab.id.clone()),
        }
    }

    let to_open: Vec<EntryId> = applicable
        .iter()
        .copied()
        .filter(|e| !open_entries.contains(e))
        .collect();

    let open_placeholder = content.is_empty() && placeholders.is_empty() && !to_open.is_empty();

    // Placeholders may only go once the plan leaves at least one content tab.
    let remaining = content.len() - to_close.len() + to_open.len();
    let placeholders_to_close = if remaining > 0 {
        placeholders.iter().map(|t| t.id.clone()).collect()
    } else {
        Vec::new()
    };

    ReconcilePlan {
        to_open,
        to_close,
        open_placeholder,
        placeholders_to_close,
    }
}

// ─── Tests ────────────────────────────────────────────────────────
