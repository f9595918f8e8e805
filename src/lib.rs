//! # comment-harvester
//!
//! Collects the comments of dynamically rendered video pages through the Chrome DevTools
//! Protocol. Comment listing responses are intercepted while the page is scrolled and its
//! reply threads expanded; the rendered markup is read only when no payload was captured.
//!
//! ## Command Line
//!
//! ```bash
//! # Harvest every page listed in data/nyc-mayoral-election/video_ids_with_urls.csv
//! cargo run --bin harvest-comments -- nyc mayoral election
//!
//! # Pages exported for one account, with a visible browser
//! cargo run --bin harvest-comments -- @someuser --headed
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use comment_harvester::{BrowserSession, HarvestConfig, LaunchOptions, visit_page};
//!
//! # fn main() -> comment_harvester::Result<()> {
//! let session = BrowserSession::launch(LaunchOptions::default())?;
//! let outcome = visit_page(&session, "https://www.tiktok.com/@someuser/video/1", &HarvestConfig::default())?;
//!
//! println!("{} comments ({:?})", outcome.records.len(), outcome.source);
//! # Ok(())
//! # }
//! ```
//!
//! Anything implementing [`Page`] can be harvested, which is how the visit logic is
//! tested without a browser.
//!
//! ## Module Overview
//!
//! - [`browser`]: Chrome session, launch options and the [`Page`] abstraction
//! - [`comments`]: normalization, network harvesting, DOM fallback and the interaction loop
//! - [`batch`]: CSV targets, input resolution and sequential multi-page runs
//! - [`error`]: Error types and result aliases

pub mod batch;
pub mod browser;
pub mod comments;
pub mod error;

pub use batch::{BatchReport, PageTarget, ResolvedInput, read_targets, resolve_input, run_batch, write_comments};
pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions, Page};
pub use comments::{CommentRecord, CommentTime, HarvestConfig, RecordSource, VisitOutcome, visit_page};
pub use error::{HarvestError, Result};
