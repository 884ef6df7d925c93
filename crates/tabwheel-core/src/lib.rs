//! tabwheel-core: pure reconciliation policies for a rotating display
//! window — schedule eligibility, rotation, refresh debouncing, and the
//! desired-vs-actual tab diff.
//!
//! No IO and no clock access: every decision function takes `now` as a
//! parameter, so the whole crate is deterministic under test. The async
//! drivers that execute these plans against a live window live in
//! tabwheel-runtime.

pub mod reconcile;
pub mod refresh;
pub mod registry;
pub mod rotate;
pub mod schedule;
pub mod types;

pub use reconcile::{PLACEHOLDER_URL, ReconcilePlan, is_placeholder, plan_reconcile};
pub use refresh::RefreshState;
pub use registry::TabRegistry;
pub use rotate::{RotationState, plan_rotation};
pub use schedule::{Day, ScheduleWindow, is_applicable};
pub use types::{
    DEFAULT_REFRESH_SECS, DEFAULT_ROTATE_SECS, DisplayConfig, EntryId, OpenTab, TabEntry, TabId,
};
