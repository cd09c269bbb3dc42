//! Realtime snapshot for the live dashboard
//!
//! The same payload backs the SSE stream and the polling fallback
//! endpoint, so a client that drops to polling sees identical shapes.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::errors::Result;
use crate::storage::Storage;
use migration::entities::{page_view, visitor_session};

const TS_EXPORT_PATH: &str = "../dashboard/src/services/types.generated.ts";

const ACTIVE_WINDOW_MINUTES: i64 = 5;
const RECENT_WINDOW_MINUTES: i64 = 30;
const LATEST_VIEWS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct RecentView {
    pub url: String,
    /// Last 6 characters of the session id, enough to tell sessions apart
    pub session_tail: String,
    pub seconds_ago: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct RealtimeSnapshot {
    pub active_sessions: u64,
    pub views_last_30m: u64,
    pub latest_views: Vec<RecentView>,
    pub timestamp: String,
    /// Random per-emission id so the dashboard can spot duplicate frames
    pub emission_id: String,
}

/// Query the snapshot: active sessions, recent view count, latest views
pub async fn snapshot(storage: &Arc<Storage>) -> Result<RealtimeSnapshot> {
    let now = Utc::now();
    let db = storage.get_db();

    let active_sessions = visitor_session::Entity::find()
        .filter(visitor_session::Column::LastSeenAt.gte(now - Duration::minutes(ACTIVE_WINDOW_MINUTES)))
        .count(db)
        .await?;

    let views_last_30m = page_view::Entity::find()
        .filter(page_view::Column::CreatedAt.gte(now - Duration::minutes(RECENT_WINDOW_MINUTES)))
        .count(db)
        .await?;

    let latest = page_view::Entity::find()
        .order_by_desc(page_view::Column::CreatedAt)
        .order_by_desc(page_view::Column::Id)
        .limit(LATEST_VIEWS)
        .all(db)
        .await?;

    let latest_views = latest
        .into_iter()
        .map(|m| {
            let tail_start = m.session_id.len().saturating_sub(6);
            RecentView {
                url: m.page_url,
                session_tail: m.session_id[tail_start..].to_string(),
                seconds_ago: (now - m.created_at).num_seconds().max(0),
            }
        })
        .collect();

    Ok(RealtimeSnapshot {
        active_sessions,
        views_last_30m,
        latest_views,
        timestamp: now.to_rfc3339(),
        emission_id: Uuid::new_v4().to_string(),
    })
}

/// Encode a payload as one SSE data frame
pub fn sse_data_frame(json: &str) -> String {
    format!("data: {}\n\n", json)
}

/// Encode an error payload as a named SSE event; the stream continues
pub fn sse_error_frame(message: &str) -> String {
    let payload = serde_json::json!({ "error": message });
    format!("event: error\ndata: {}\n\n", payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_frame_shape() {
        let frame = sse_data_frame("{\"a\":1}");
        assert!(frame.starts_with("data: {"));
        assert!(frame.ends_with("\n\n"));
    }

    #[test]
    fn test_error_frame_shape() {
        let frame = sse_error_frame("query failed");
        assert!(frame.starts_with("event: error\ndata: "));
        assert!(frame.ends_with("\n\n"));
        assert!(frame.contains("query failed"));
    }
}
