//! Error types for the host window backend.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("devtools request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("devtools websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("unexpected devtools response: {0}")]
    Protocol(String),

    #[error("no such tab: {0}")]
    TabGone(String),
}
