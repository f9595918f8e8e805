//! Browser session management
//!
//! - [`Page`]: the primitives the harvesting engine drives (navigation, DOM queries,
//!   in-page evaluation, response listeners)
//! - [`BrowserSession`]: the Chrome DevTools Protocol implementation over a single tab
//! - [`LaunchOptions`] / [`ConnectionOptions`]: how the browser is started or attached to

pub mod config;
pub mod page;
pub mod session;

pub use config::{ConnectionOptions, DEFAULT_USER_AGENT, LaunchOptions};
pub use page::{CapturedResponse, ListenerGuard, Page, ResponseHandler};
pub use session::BrowserSession;
