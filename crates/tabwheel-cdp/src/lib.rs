//! tabwheel-cdp: the host window capability — the `Window` trait the
//! reconciliation engine drives, plus the real adapter speaking Chromium's
//! DevTools interface.

pub mod devtools;
pub mod error;
pub mod window;

pub use devtools::DevtoolsWindow;
pub use error::WindowError;
pub use window::Window;
