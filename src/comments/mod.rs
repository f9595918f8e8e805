//! The comment-harvesting engine
//!
//! - [`normalize`]: raw object → [`CommentRecord`], shared by both sources
//! - [`bag`]: last-write-wins accumulator for one page visit
//! - [`harvest`]: response listener mining intercepted JSON payloads
//! - [`dom`]: fallback extraction from rendered markup
//! - [`converge`]: scroll/expand loop with a stability stopping rule
//! - [`visit`]: one page visit tying the above together

pub mod bag;
pub mod config;
pub mod converge;
pub mod dom;
pub mod harvest;
pub mod normalize;
pub mod record;
pub mod scripts;
pub mod visit;

pub use bag::CommentBag;
pub use config::HarvestConfig;
pub use converge::{ConvergenceDriver, ConvergenceReport, Phase, StabilityTracker, StopReason};
pub use harvest::{NetworkHarvester, ResponseFilter};
pub use normalize::normalize;
pub use record::{CommentRecord, CommentTime};
pub use visit::{RecordSource, VisitOutcome, visit_page};
