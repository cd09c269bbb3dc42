//! Self-hosted analytics subsystem
//!
//! Write side: `tracker` ingests page views, session heartbeats, web
//! vitals and client errors. Read side: `aggregate` turns raw rows into
//! summaries, `realtime` produces the live-dashboard snapshot, `report`
//! renders CSV exports, and `retention` deletes expired rows.

pub mod aggregate;
pub mod fingerprint;
pub mod realtime;
pub mod report;
pub mod retention;
pub mod tracker;

pub use aggregate::{AnalyticsSummary, DateRange};
pub use fingerprint::session_fingerprint;
pub use realtime::RealtimeSnapshot;
pub use retention::{CleanupOptions, CleanupReport, RetentionTask};
pub use tracker::{SessionAction, Tracker};
