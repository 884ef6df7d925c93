//! Real window adapter over Chromium's DevTools interface.
//!
//! Tab listing and open/activate/close go through the HTTP endpoints of a
//! browser started with `--remote-debugging-port`. Reload has no HTTP
//! endpoint, so it opens a short-lived WebSocket to the target and issues a
//! single `Page.reload` command.

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use tabwheel_core::{OpenTab, TabId};

use crate::error::WindowError;
use crate::window::Window;

/// One target from `/json/list`. Targets also cover service workers,
/// extensions and the like; only `type == "page"` targets are tabs.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "webSocketDebuggerUrl", default)]
    pub ws_url: Option<String>,
}

impl TargetInfo {
    pub fn is_page(&self) -> bool {
        self.kind == "page"
    }
}

/// Map a target listing to the engine's tab view.
///
/// DevTools orders targets most-recently-activated first, so the first page
/// target is the one currently in front.
fn pages_to_tabs(targets: &[TargetInfo]) -> Vec<OpenTab> {
    targets
        .iter()
        .filter(|t| t.is_page())
        .enumerate()
        .map(|(i, t)| OpenTab {
            id: TabId::new(t.id.clone()),
            url: t.url.clone(),
            active: i == 0,
        })
        .collect()
}

/// The one CDP command this adapter speaks over the WebSocket.
fn reload_command(seq: u64) -> String {
    json!({
        "id": seq,
        "method": "Page.reload",
        "params": { "ignoreCache": false },
    })
    .to_string()
}

/// Window adapter for a Chromium instance with remote debugging enabled.
pub struct DevtoolsWindow {
    http: reqwest::Client,
    base: String,
}

impl DevtoolsWindow {
    /// `base_url` is the debugging endpoint, e.g. `http://127.0.0.1:9222`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base = base_url.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    async fn targets(&self) -> Result<Vec<TargetInfo>, WindowError> {
        let resp = self
            .http
            .get(format!("{}/json/list", self.base))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn target(&self, id: &TabId) -> Result<TargetInfo, WindowError> {
        self.targets()
            .await?
            .into_iter()
            .find(|t| t.id == id.as_str())
            .ok_or_else(|| WindowError::TabGone(id.to_string()))
    }
}

impl Window for DevtoolsWindow {
    async fn open_tabs(&self) -> Result<Vec<OpenTab>, WindowError> {
        Ok(pages_to_tabs(&self.targets().await?))
    }

    async fn new_tab(&self, url: &str) -> Result<TabId, WindowError> {
        // DevTools takes the raw URL after the `?`; it is not a query
        // parameter and must not be form-encoded. PUT is required since
        // Chrome 66.
        let resp = self
            .http
            .put(format!("{}/json/new?{url}", self.base))
            .send()
            .await?
            .error_for_status()?;
        let target: TargetInfo = resp.json().await?;
        Ok(TabId::new(target.id))
    }

    async fn close_tabs(&self, ids: &[TabId]) -> Result<(), WindowError> {
        for id in ids {
            let resp = self
                .http
                .get(format!("{}/json/close/{}", self.base, id.as_str()))
                .send()
                .await?;
            // 404 means the tab is already gone, which is the state we want.
            if resp.status() == reqwest::StatusCode::NOT_FOUND {
                continue;
            }
            resp.error_for_status()?;
        }
        Ok(())
    }

    async fn focus_tab(&self, id: &TabId) -> Result<(), WindowError> {
        let resp = self
            .http
            .get(format!("{}/json/activate/{}", self.base, id.as_str()))
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(WindowError::TabGone(id.to_string()));
        }
        resp.error_for_status()?;
        Ok(())
    }

    async fn reload_tab(&self, id: &TabId) -> Result<(), WindowError> {
        let target = self.target(id).await?;
        let ws_url = target
            .ws_url
            .ok_or_else(|| WindowError::Protocol(format!("target {id} has no debugger url")))?;

        let (mut socket, _) = connect_async(ws_url.as_str()).await?;
        socket.send(Message::Text(reload_command(1).into())).await?;

        // The browser may interleave events; wait for the reply to our
        // command id before dropping the socket.
        while let Some(msg) = socket.next().await {
            if let Message::Text(text) = msg? {
                let value: serde_json::Value = serde_json::from_str(&text)
                    .map_err(|e| WindowError::Protocol(format!("bad CDP frame: {e}")))?;
                if value.get("id").and_then(serde_json::Value::as_u64) == Some(1) {
                    return Ok(());
                }
            }
        }
        Err(WindowError::Protocol(
            "websocket closed before Page.reload reply".to_string(),
        ))
    }

    async fn focus_window(&self) -> Result<(), WindowError> {
        // Activating a page target raises its window. Re-activate whichever
        // page is already in front; a window with no pages has nothing to
        // raise.
        let tabs = self.open_tabs().await?;
        match tabs.iter().find(|t| t.active) {
            Some(tab) => self.focus_tab(&tab.id).await,
            None => Ok(()),
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────
