//! Refresh planning: forces each open tab to reload once its entry's
//! refresh interval has elapsed, with per-tab debounce state.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::registry::TabRegistry;
use crate::types::{DisplayConfig, OpenTab, TabId};

/// Per-tab last-refreshed instants. An entry appears on first observation of
/// a tab and is purged when the tab disappears from the listing.
#[derive(Debug, Clone, Default)]
pub struct RefreshState {
    last_refreshed: HashMap<TabId, NaiveDateTime>,
}

impl RefreshState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &TabId) -> bool {
        self.last_refreshed.contains_key(id)
    }

    pub fn tracked(&self) -> usize {
        self.last_refreshed.len()
    }

    /// One refresher pass over the current tab listing.
    ///
    /// Returns the tabs due for a reload. First observation of a tab only
    /// establishes the baseline and never triggers an immediate reload. Each
    /// tab is evaluated independently; many tabs may come due in one pass.
    pub fn tick(
        &mut self,
        config: &DisplayConfig,
        registry: &TabRegistry,
        tabs: &[OpenTab],
        now: NaiveDateTime,
    ) -> Vec<TabId> {
        // Purge state for tabs that are gone, otherwise the map grows without
        // bound and a reused id could inherit a stale baseline.
        self.last_refreshed
            .retain(|id, _| tabs.iter().any(|t| &t.id == id));

        let mut due = Vec::new();
        for tab in tabs {
            match self.last_refreshed.get(&tab.id) {
                None => {
                    self.last_refreshed.insert(tab.id.clone(), now);
                }
                Some(last) => {
                    let interval = config.refresh_after(registry.entry_for(&tab.id));
                    if now.signed_duration_since(*last) >= interval {
                        due.push(tab.id.clone());
                        self.last_refreshed.insert(tab.id.clone(), now);
                    }
                }
            }
        }
        due
    }
}

// ─── Tests ────────────────────────────────────────────────────────
