//! The window capability the reconciliation engine drives. Trait-shaped so
//! tests can inject a fake window.

use tabwheel_core::{OpenTab, TabId};

use crate::error::WindowError;

/// Asynchronous control surface over a single display window's tabs.
///
/// Every operation may fail; callers treat failures as transient and skip
/// the affected step rather than aborting the tick loop.
#[allow(async_fn_in_trait)]
pub trait Window {
    /// List open tabs in display order, placeholder tabs included.
    async fn open_tabs(&self) -> Result<Vec<OpenTab>, WindowError>;

    /// Open a new tab on `url` and return its host-assigned id.
    async fn new_tab(&self, url: &str) -> Result<TabId, WindowError>;

    /// Close the given tabs. A tab that is already gone is not an error.
    async fn close_tabs(&self, ids: &[TabId]) -> Result<(), WindowError>;

    /// Bring the given tab to the front.
    async fn focus_tab(&self, id: &TabId) -> Result<(), WindowError>;

    /// Force the given tab to reload.
    async fn reload_tab(&self, id: &TabId) -> Result<(), WindowError>;

    /// Bring the display window itself to the front.
    async fn focus_window(&self) -> Result<(), WindowError>;
}

impl<T: Window + ?Sized> Window for &T {
    async fn open_tabs(&self) -> Result<Vec<OpenTab>, WindowError> {
        (**self).open_tabs().await
    }

    async fn new_tab(&self, url: &str) -> Result<TabId, WindowError> {
        (**self).new_tab(url).await
    }

    async fn close_tabs(&self, ids: &[TabId]) -> Result<(), WindowError> {
        (**self).close_tabs(ids).await
    }

    async fn focus_tab(&self, id: &TabId) -> Result<(), WindowError> {
        (**self).focus_tab(id).await
    }

    async fn reload_tab(&self, id: &TabId) -> Result<(), WindowError> {
        (**self).reload_tab(id).await
    }

    async fn focus_window(&self) -> Result<(), WindowError> {
        (**self).focus_window().await
    }
}
