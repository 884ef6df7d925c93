use std::fmt;

use chrono::TimeDelta;

use crate::schedule::ScheduleWindow;

// ─── Identities ───────────────────────────────────────────────────

/// Opaque tab identity assigned by the host window (DevTools target id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(String);

impl TabId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a configured entry. Positional within [`DisplayConfig`]:
/// two entries with identical URLs are still distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(usize);

impl EntryId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ─── Window observations ──────────────────────────────────────────

/// One open tab as reported by the host window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTab {
    pub id: TabId,
    pub url: String,
    pub active: bool,
}

// ─── Config entries ───────────────────────────────────────────────

/// Dwell time applied when an entry carries no `rotate_after`, or when the
/// active tab is unknown to the registry.
pub const DEFAULT_ROTATE_SECS: i64 = 30;

/// Reload interval applied when an entry carries no `refresh_after`, or when
/// a tab is unknown to the registry.
pub const DEFAULT_REFRESH_SECS: i64 = 6 * 60 * 60;

/// A configured desired tab. Immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabEntry {
    pub url: String,
    /// Dwell time before rotation advances past this tab while it is active.
    pub rotate_after: Option<TimeDelta>,
    /// Interval between forced reloads of this tab.
    pub refresh_after: Option<TimeDelta>,
    /// Day/time visibility window. `None` means always applicable.
    pub schedule: Option<ScheduleWindow>,
}

impl TabEntry {
    /// Entry with no schedule and default timing.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            rotate_after: None,
            refresh_after: None,
            schedule: None,
        }
    }
}

/// The full set of desired tabs, in display order.
///
/// Also the single place where optional per-entry timing resolves against
/// the defaults; callers never apply fallback values themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayConfig {
    entries: Vec<TabEntry>,
}

impl DisplayConfig {
    pub fn new(entries: Vec<TabEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, id: EntryId) -> Option<&TabEntry> {
        self.entries.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &TabEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (EntryId::new(i), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Effective dwell time for the entry behind a tab, or the default when
    /// the tab is unknown or the entry leaves it unset.
    pub fn rotate_after(&self, id: Option<EntryId>) -> TimeDelta {
        id.and_then(|id| self.get(id))
            .and_then(|e| e.rotate_after)
            .unwrap_or_else(|| TimeDelta::seconds(DEFAULT_ROTATE_SECS))
    }

    /// Effective reload interval, same fallback rule as [`Self::rotate_after`].
    pub fn refresh_after(&self, id: Option<EntryId>) -> TimeDelta {
        id.and_then(|id| self.get(id))
            .and_then(|e| e.refresh_after)
            .unwrap_or_else(|| TimeDelta::seconds(DEFAULT_REFRESH_SECS))
    }
}

// ─── Tests ────────────────────────────────────────────────────────
