//! Live mapping from open tab identity to the config entry that produced it.
//!
//! Write access belongs to the reconciler alone; the rotator and refresher
//! only ever hold `&TabRegistry`. The borrow split is enforced by the tick
//! driver signatures, not by convention.

use std::collections::{HashMap, HashSet};

use crate::types::{EntryId, OpenTab, TabId};

#[derive(Debug, Clone, Default)]
pub struct TabRegistry {
    map: HashMap<TabId, EntryId>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry a tab was opened for, if the tab is known.
    pub fn entry_for(&self, id: &TabId) -> Option<EntryId> {
        self.map.get(id).copied()
    }

    pub fn contains(&self, id: &TabId) -> bool {
        self.map.contains_key(id)
    }

    pub fn insert(&mut self, id: TabId, entry: EntryId) {
        self.map.insert(id, entry);
    }

    pub fn remove(&mut self, id: &TabId) -> Option<EntryId> {
        self.map.remove(id)
    }

    /// Drop keys whose tab no longer appears in the window's listing.
    ///
    /// Keys can go stale when a tab is closed behind our back (user action,
    /// crashed renderer); a stale key would otherwise leak refresh timer
    /// state and present a ghost "open" entry to the reconciler.
    pub fn retain_open(&mut self, tabs: &[OpenTab]) {
        let open: HashSet<&TabId> = tabs.iter().map(|t| &t.id).collect();
        self.map.retain(|id, _| open.contains(id));
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

// ─── Tests ────────────────────────────────────────────────────────
