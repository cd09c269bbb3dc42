//! Live analytics stream (SSE)
//!
//! One snapshot immediately, then one per tick until the client
//! disconnects. A failed tick emits an `event: error` frame and the
//! stream keeps going; there is no replay.

use actix_web::{HttpResponse, Responder, web};
use futures_util::stream;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::analytics::realtime::{self, sse_data_frame, sse_error_frame};
use crate::storage::Storage;

use super::types::LiveQuery;

pub const MIN_INTERVAL_MS: u64 = 5_000;
pub const MAX_INTERVAL_MS: u64 = 300_000;
pub const DEFAULT_INTERVAL_MS: u64 = 10_000;

pub fn clamp_interval(requested: Option<u64>) -> u64 {
    requested
        .unwrap_or(DEFAULT_INTERVAL_MS)
        .clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS)
}

/// GET /admin/v1/analytics/live?interval_ms=N
pub async fn live_stream(
    query: web::Query<LiveQuery>,
    storage: web::Data<Arc<Storage>>,
) -> impl Responder {
    let interval_ms = clamp_interval(query.interval_ms);
    debug!("Live analytics stream opened (interval {} ms)", interval_ms);

    let storage = storage.get_ref().clone();
    // The first tick of a tokio interval completes immediately, which
    // gives the client its initial snapshot without waiting.
    let interval = tokio::time::interval(Duration::from_millis(interval_ms));

    let frames = stream::unfold((storage, interval), |(storage, mut interval)| async move {
        interval.tick().await;

        let frame = match realtime::snapshot(&storage).await {
            Ok(snapshot) => match serde_json::to_string(&snapshot) {
                Ok(json) => sse_data_frame(&json),
                Err(e) => {
                    warn!("Live stream serialization failed: {}", e);
                    sse_error_frame("serialization failed")
                }
            },
            Err(e) => {
                warn!("Live stream snapshot failed: {}", e);
                sse_error_frame(e.message())
            }
        };

        Some((
            Ok::<_, actix_web::Error>(web::Bytes::from(frame)),
            (storage, interval),
        ))
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_clamping() {
        assert_eq!(clamp_interval(None), DEFAULT_INTERVAL_MS);
        assert_eq!(clamp_interval(Some(1)), MIN_INTERVAL_MS);
        assert_eq!(clamp_interval(Some(5_000)), 5_000);
        assert_eq!(clamp_interval(Some(60_000)), 60_000);
        assert_eq!(clamp_interval(Some(10_000_000)), MAX_INTERVAL_MS);
    }
}
