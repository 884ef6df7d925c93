//! Engine: drives the pure policies against a live window on a fixed tick.
//!
//! One cooperative loop runs rotation, refresh, and reconciliation in
//! sequence each period, awaiting each driver to completion — ticks of the
//! same policy can never overlap. Window failures are transient: the
//! affected step is logged and skipped, and nothing is retried before the
//! next natural tick.

use chrono::{Local, NaiveDateTime};
use tokio::time::{Duration, MissedTickBehavior, interval};

use tabwheel_cdp::{Window, WindowError};
use tabwheel_core::{
    DisplayConfig, PLACEHOLDER_URL, RefreshState, RotationState, TabRegistry, plan_reconcile,
    plan_rotation,
};

/// All mutable engine state, owned by the tick loop.
///
/// Access rules are carried by the driver signatures: the reconciler is the
/// only writer of the registry; rotation and refresh borrow it shared.
pub struct EngineState {
    pub config: DisplayConfig,
    pub registry: TabRegistry,
    pub rotation: RotationState,
    pub refresh: RefreshState,
}

impl EngineState {
    pub fn new(config: DisplayConfig, now: NaiveDateTime) -> Self {
        Self {
            config,
            registry: TabRegistry::new(),
            rotation: RotationState::new(now),
            refresh: RefreshState::new(),
        }
    }
}

/// Initial population: raise the window and run one eager reconcile pass so
/// the display is filled before the first timer tick.
pub async fn start<W: Window>(window: &W, state: &mut EngineState, now: NaiveDateTime) {
    if let Err(e) = window.focus_window().await {
        tracing::warn!("focus window failed: {e}");
    }
    if let Err(e) = reconcile_tick(window, &state.config, &mut state.registry, now).await {
        tracing::warn!("initial reconcile failed: {e}");
    }
}

/// One full engine tick. A failing policy must not keep the others from
/// their turn in the same tick.
pub async fn tick<W: Window>(window: &W, state: &mut EngineState, now: NaiveDateTime) {
    if let Err(e) =
        rotate_tick(window, &state.config, &state.registry, &mut state.rotation, now).await
    {
        tracing::warn!("rotation tick failed: {e}");
    }
    if let Err(e) =
        refresh_tick(window, &state.config, &state.registry, &mut state.refresh, now).await
    {
        tracing::warn!("refresh tick failed: {e}");
    }
    if let Err(e) = reconcile_tick(window, &state.config, &mut state.registry, now).await {
        tracing::warn!("reconcile tick failed: {e}");
    }
}

async fn rotate_tick<W: Window>(
    window: &W,
    config: &DisplayConfig,
    registry: &TabRegistry,
    rotation: &mut RotationState,
    now: NaiveDateTime,
) -> Result<(), WindowError> {
    let tabs = window.open_tabs().await?;
    let (next, focus) = plan_rotation(rotation, config, registry, &tabs, now);
    *rotation = next;
    if let Some(id) = focus {
        window.focus_tab(&id).await?;
    }
    Ok(())
}

async fn refresh_tick<W: Window>(
    window: &W,
    config: &DisplayConfig,
    registry: &TabRegistry,
    refresh: &mut RefreshState,
    now: NaiveDateTime,
) -> Result<(), WindowError> {
    let tabs = window.open_tabs().await?;
    for id in refresh.tick(config, registry, &tabs, now) {
        // Tabs refresh independently; one failed reload must not starve the
        // rest.
        if let Err(e) = window.reload_tab(&id).await {
            tracing::warn!(tab = %id, "reload failed: {e}");
        }
    }
    Ok(())
}

async fn reconcile_tick<W: Window>(
    window: &W,
    config: &DisplayConfig,
    registry: &mut TabRegistry,
    now: NaiveDateTime,
) -> Result<(), WindowError> {
    let tabs = window.open_tabs().await?;

    // Keys for tabs closed behind our back (user action, crash) are purged
    // against the fresh listing before planning.
    registry.retain_open(&tabs);

    let plan = plan_reconcile(config, registry, &tabs, now);
    if plan.is_noop() {
        return Ok(());
    }
    tracing::debug!(
        to_open = plan.to_open.len(),
        to_close = plan.to_close.len(),
        "reconciling"
    );

    let mut guard = None;
    if plan.open_placeholder {
        match window.new_tab(PLACEHOLDER_URL).await {
            Ok(id) => guard = Some(id),
            Err(e) => tracing::warn!("placeholder open failed: {e}"),
        }
    }

    // All opens complete before any close is issued: if opening fails
    // partway, the soon-to-be-redundant tabs survive and the window never
    // passes through a zero-tab state.
    let mut opened = 0usize;
    for entry in &plan.to_open {
        let Some(url) = config.get(*entry).map(|e| e.url.as_str()) else {
            continue;
        };
        match window.new_tab(url).await {
            Ok(id) => {
                registry.insert(id, *entry);
                opened += 1;
            }
            Err(e) => tracing::warn!(entry = %entry, url, "open failed: {e}"),
        }
    }

    if !plan.to_close.is_empty() {
        match window.close_tabs(&plan.to_close).await {
            Ok(()) => {
                for id in &plan.to_close {
                    registry.remove(id);
                }
            }
            // Registry keys stay until the next listing confirms what
            // actually closed.
            Err(e) => tracing::warn!("close failed: {e}"),
        }
    }

    if !plan.placeholders_to_close.is_empty() {
        if let Err(e) = window.close_tabs(&plan.placeholders_to_close).await {
            tracing::warn!("placeholder close failed: {e}");
        }
    }

    // The guard opened above is only removable once a real tab exists.
    if let Some(id) = guard {
        if opened > 0 {
            if let Err(e) = window.close_tabs(std::slice::from_ref(&id)).await {
                tracing::warn!("placeholder close failed: {e}");
            }
        }
    }

    Ok(())
}

/// Run the engine until ctrl-c or SIGTERM. The ticker is halted before the
/// window handle is dropped, so no tick ever fires during teardown.
pub async fn run<W: Window>(window: &W, config: DisplayConfig, tick_ms: u64) -> anyhow::Result<()> {
    let mut state = EngineState::new(config, Local::now().naive_local());
    start(window, &mut state, Local::now().naive_local()).await;

    let mut ticker = interval(Duration::from_millis(tick_ms));
    // A stalled tick must not be followed by a catch-up burst; the next
    // firing waits out a full period.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tick(window, &mut state, Local::now().naive_local()).await;
            }
            () = &mut shutdown => break,
        }
    }

    tracing::info!("tabwheel stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        tracing::info!("received ctrl-c, shutting down");
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    use chrono::TimeDelta;
    use tabwheel_core::{Day, OpenTab, ScheduleWindow, TabEntry, TabId};

    /// Fake window backend: canned tab listing, scripted failures, and an
    /// operation log for ordering assertions.
    #[derive(Default)]
    struct FakeWindow {
        inner: Mutex<Inner>,
    }

    #[derive(Default)]
    struct Inner {
        tabs: Vec<OpenTab>,
        ops: Vec<String>,
        next_id: u64,
        fail_list: bool,
        fail_close: bool,
    }

    impl FakeWindow {
        fn new() -> Self {
            Self::default()
        }

        fn with_tab(self, id: &str, url: &str, active: bool) -> Self {
            {
                let mut inner = self.inner.lock().unwrap();
                inner.tabs.push(OpenTab {
                    id: TabId::new(id),
                    url: url.to_string(),
                    active,
                });
            }
            self
        }

        fn set_fail_list(&self, fail: bool) {
            self.inner.lock().unwrap().fail_list = fail;
        }

        fn set_fail_close(&self, fail: bool) {
            self.inner.lock().unwrap().fail_close = fail;
        }

        fn ops(&self) -> Vec<String> {
            self.inner.lock().unwrap().ops.clone()
        }

        fn tab_urls(&self) -> Vec<String> {
            let inner = self.inner.lock().unwrap();
            inner.tabs.iter().map(|t| t.url.clone()).collect()
        }

        fn op_index(&self, op: &str) -> Option<usize> {
            self.ops().iter().position(|o| o == op)
        }
    }

    impl Window for FakeWindow {
        async fn open_tabs(&self) -> Result<Vec<OpenTab>, WindowError> {
            let inner = self.inner.lock().unwrap();
            if inner.fail_list {
                return Err(WindowError::Protocol("list failed".to_string()));
            }
            Ok(inner.tabs.clone())
        }

        async fn new_tab(&self, url: &str) -> Result<TabId, WindowError> {
            let mut inner = self.inner.lock().unwrap();
            let id = TabId::new(format!("f{}", inner.next_id));
            inner.next_id += 1;
            let active = inner.tabs.is_empty();
            inner.tabs.push(OpenTab {
                id: id.clone(),
                url: url.to_string(),
                active,
            });
            inner.ops.push(format!("open:{url}"));
            Ok(id)
        }

        async fn close_tabs(&self, ids: &[TabId]) -> Result<(), WindowError> {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail_close {
                return Err(WindowError::Protocol("close failed".to_string()));
            }
            for id in ids {
                inner.tabs.retain(|t| &t.id != id);
                inner.ops.push(format!("close:{id}"));
            }
            // The browser promotes another tab when the active one closes.
            if !inner.tabs.is_empty() && !inner.tabs.iter().any(|t| t.active) {
                inner.tabs[0].active = true;
            }
            Ok(())
        }

        async fn focus_tab(&self, id: &TabId) -> Result<(), WindowError> {
            let mut inner = self.inner.lock().unwrap();
            if !inner.tabs.iter().any(|t| &t.id == id) {
                return Err(WindowError::TabGone(id.to_string()));
            }
            for tab in &mut inner.tabs {
                tab.active = &tab.id == id;
            }
            inner.ops.push(format!("focus:{id}"));
            Ok(())
        }

        async fn reload_tab(&self, id: &TabId) -> Result<(), WindowError> {
            let mut inner = self.inner.lock().unwrap();
            if !inner.tabs.iter().any(|t| &t.id == id) {
                return Err(WindowError::TabGone(id.to_string()));
            }
            inner.ops.push(format!("reload:{id}"));
            Ok(())
        }

        async fn focus_window(&self) -> Result<(), WindowError> {
            let mut inner = self.inner.lock().unwrap();
            inner.ops.push("focus-window".to_string());
            Ok(())
        }
    }

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("valid datetime")
    }

    /// A Tuesday.
    fn t0() -> NaiveDateTime {
        ts("2026-02-24 12:00:00")
    }

    fn mon_only(url: &str) -> TabEntry {
        let mut entry = TabEntry::new(url);
        entry.schedule = Some(ScheduleWindow {
            days: Some(BTreeSet::from([Day::Mon])),
            open: None,
            close: None,
        });
        entry
    }

    // ── Startup ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn start_populates_an_empty_window() {
        let window = FakeWindow::new();
        let config = DisplayConfig::new(vec![
            TabEntry::new("https://a.example"),
            TabEntry::new("https://b.example"),
        ]);
        let mut state = EngineState::new(config, t0());

        start(&window, &mut state, t0()).await;

        assert_eq!(state.registry.len(), 2);
        assert_eq!(
            window.tab_urls(),
            vec!["https://a.example", "https://b.example"],
            "guard placeholder is gone again"
        );

        // Guard placeholder opens before any content tab and closes after.
        let guard_open = window.op_index("open:about:blank").expect("guard opened");
        let first_open = window.op_index("open:https://a.example").expect("a opened");
        let guard_close = window.op_index("close:f0").expect("guard closed");
        assert!(guard_open < first_open);
        assert!(first_open < guard_close);
    }

    #[tokio::test]
    async fn start_skips_entries_outside_their_schedule() {
        let window = FakeWindow::new().with_tab("seed", "https://seed.example", true);
        let config = DisplayConfig::new(vec![
            mon_only("https://weekday.example"),
            TabEntry::new("https://always.example"),
        ]);
        let mut state = EngineState::new(config, t0());

        start(&window, &mut state, t0()).await;

        assert_eq!(state.registry.len(), 1);
        assert!(window.op_index("open:https://weekday.example").is_none());
    }

    // ── Idempotence ─────────────────────────────────────────────────

    #[tokio::test]
    async fn immediate_second_tick_is_a_noop() {
        let window = FakeWindow::new();
        let config = DisplayConfig::new(vec![TabEntry::new("https://a.example")]);
        let mut state = EngineState::new(config, t0());

        start(&window, &mut state, t0()).await;
        let ops_before = window.ops().len();

        tick(&window, &mut state, t0()).await;
        tick(&window, &mut state, t0()).await;

        assert_eq!(
            window.ops().len(),
            ops_before,
            "no time passed, nothing external changed: no operations"
        );
    }

    // ── Reconciler ordering & cleanup ───────────────────────────────

    #[tokio::test]
    async fn opens_complete_before_any_close() {
        let window = FakeWindow::new().with_tab("t1", "https://old.example", true);
        let config = DisplayConfig::new(vec![
            mon_only("https://old.example"),
            TabEntry::new("https://new.example"),
        ]);
        let mut state = EngineState::new(config, t0());
        state.registry.insert(TabId::new("t1"), tabwheel_core::EntryId::new(0));

        tick(&window, &mut state, t0()).await;

        let open = window.op_index("open:https://new.example").expect("opened");
        let close = window.op_index("close:t1").expect("closed");
        assert!(open < close, "all opens precede the first close");
        assert!(!state.registry.contains(&TabId::new("t1")));
        assert_eq!(state.registry.len(), 1);
    }

    #[tokio::test]
    async fn refresh_state_is_purged_after_a_close() {
        let window = FakeWindow::new().with_tab("t1", "https://old.example", true);
        let config = DisplayConfig::new(vec![mon_only("https://old.example")]);
        let mut state = EngineState::new(config, t0());
        state.registry.insert(TabId::new("t1"), tabwheel_core::EntryId::new(0));

        // First tick: refresher baselines t1, then the reconciler closes it.
        tick(&window, &mut state, t0()).await;
        assert!(state.refresh.contains(&TabId::new("t1")));
        assert!(!state.registry.contains(&TabId::new("t1")));

        tick(&window, &mut state, t0() + TimeDelta::seconds(1)).await;
        assert!(!state.refresh.contains(&TabId::new("t1")), "purged on next pass");
    }

    #[tokio::test]
    async fn close_failure_heals_on_the_next_tick() {
        let window = FakeWindow::new().with_tab("t1", "https://old.example", true);
        let config = DisplayConfig::new(vec![mon_only("https://old.example")]);
        let mut state = EngineState::new(config, t0());
        state.registry.insert(TabId::new("t1"), tabwheel_core::EntryId::new(0));

        window.set_fail_close(true);
        tick(&window, &mut state, t0()).await;
        assert!(
            state.registry.contains(&TabId::new("t1")),
            "failed close leaves the registry untouched"
        );

        window.set_fail_close(false);
        tick(&window, &mut state, t0() + TimeDelta::seconds(1)).await;
        assert!(!state.registry.contains(&TabId::new("t1")));
        assert!(window.tab_urls().is_empty(), "tab actually closed this time");
    }

    #[tokio::test]
    async fn externally_closed_tab_is_purged_from_the_registry() {
        // Registry knows t1, but the window listing no longer has it.
        let window = FakeWindow::new();
        let config = DisplayConfig::new(vec![TabEntry::new("https://a.example")]);
        let mut state = EngineState::new(config, t0());
        state.registry.insert(TabId::new("t1"), tabwheel_core::EntryId::new(0));

        tick(&window, &mut state, t0()).await;

        assert!(!state.registry.contains(&TabId::new("t1")));
        // The entry was reopened under a fresh id.
        assert_eq!(state.registry.len(), 1);
        assert!(window.op_index("open:https://a.example").is_some());
    }

    // ── Failure isolation ───────────────────────────────────────────

    #[tokio::test]
    async fn listing_failure_does_not_panic_or_mutate() {
        let window = FakeWindow::new();
        window.set_fail_list(true);
        let config = DisplayConfig::new(vec![TabEntry::new("https://a.example")]);
        let mut state = EngineState::new(config, t0());

        tick(&window, &mut state, t0()).await;

        assert!(window.ops().is_empty());
        assert!(state.registry.is_empty());
    }

    // ── Rotation through the engine ─────────────────────────────────

    #[tokio::test]
    async fn rotation_advances_focus_after_the_dwell() {
        let window = FakeWindow::new();
        let mut fast = TabEntry::new("https://a.example");
        fast.rotate_after = Some(TimeDelta::seconds(4));
        let config = DisplayConfig::new(vec![fast, TabEntry::new("https://b.example")]);
        let mut state = EngineState::new(config, t0());

        start(&window, &mut state, t0()).await;

        tick(&window, &mut state, t0() + TimeDelta::seconds(1)).await;
        assert!(window.op_index("focus:f2").is_none(), "dwell not yet elapsed");

        tick(&window, &mut state, t0() + TimeDelta::seconds(4)).await;
        assert!(
            window.op_index("focus:f2").is_some(),
            "focus advanced to the next tab"
        );
    }

    // ── Refresh through the engine ──────────────────────────────────

    #[tokio::test]
    async fn refresh_reloads_only_after_the_interval() {
        let window = FakeWindow::new();
        let mut entry = TabEntry::new("https://a.example");
        entry.refresh_after = Some(TimeDelta::seconds(10));
        let config = DisplayConfig::new(vec![entry]);
        let mut state = EngineState::new(config, t0());

        start(&window, &mut state, t0()).await;

        // First observation only baselines.
        tick(&window, &mut state, t0() + TimeDelta::seconds(1)).await;
        assert!(window.ops().iter().all(|op| !op.starts_with("reload:")));

        tick(&window, &mut state, t0() + TimeDelta::seconds(12)).await;
        assert!(
            window.ops().iter().any(|op| op.starts_with("reload:")),
            "due tab reloaded"
        );
    }
}
