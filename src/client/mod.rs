//! Client layer for dashboard tooling
//!
//! Consumes the live analytics endpoints over plain HTTP. Stream-first
//! with polling fallback:
//!
//! ```text
//! Dashboard tool → LiveClient ──→ SSE stream (normal path)
//!                               └→ polling endpoint (stream keeps failing)
//! ```
//!
//! # Fallback policy
//!
//! - stream connect or read error → reconnect with exponential backoff
//! - too many consecutive failures → switch to polling, permanently
//! - polling errors → backoff and retry, never switch back

mod live;

pub use live::{ConnectionMethod, LiveClient, LiveClientConfig, SseFrame};
