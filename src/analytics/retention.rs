//! Retention cleanup for the tracking tables
//!
//! Deletes run in id-window batches to keep transactions short. Each
//! optional stage (dedup, compaction) degrades independently: a failed
//! stage logs and reports zero, the request still succeeds.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use ts_rs::TS;

use crate::errors::{FolioError, Result};
use crate::storage::Storage;
use migration::entities::{analytics_event, client_error, page_view, visitor_session, web_vital};

const TS_EXPORT_PATH: &str = "../dashboard/src/services/types.generated.ts";

pub const MIN_RETENTION_DAYS: i64 = 30;
pub const MAX_RETENTION_DAYS: i64 = 1095;

const BATCH_SIZE: u64 = 10_000;
const MAX_ITERATIONS: u32 = 1000;

// Fixed per-row size estimates, in kilobytes
const KB_PER_EVENT: f64 = 0.5;
const KB_PER_PAGE_VIEW: f64 = 0.2;
const KB_PER_SESSION: f64 = 0.3;

const DEDUP_WINDOW_SECONDS: i64 = 60;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CleanupOptions {
    pub retention_days: i64,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub aggressive: bool,
    #[serde(default)]
    pub compact: bool,
}

impl CleanupOptions {
    pub fn validate(&self) -> Result<()> {
        if self.retention_days < MIN_RETENTION_DAYS || self.retention_days > MAX_RETENTION_DAYS {
            return Err(FolioError::validation(format!(
                "retention_days must be between {} and {}, got {}",
                MIN_RETENTION_DAYS, MAX_RETENTION_DAYS, self.retention_days
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CleanupReport {
    pub dry_run: bool,
    pub events_deleted: u64,
    pub page_views_deleted: u64,
    pub web_vitals_deleted: u64,
    pub client_errors_deleted: u64,
    pub sessions_deleted: u64,
    pub duplicates_removed: u64,
    pub compacted: bool,
    pub estimated_kb_before: f64,
    pub estimated_kb_after: f64,
}

pub struct RetentionTask {
    storage: Arc<Storage>,
    retention_days: i64,
}

impl RetentionTask {
    pub fn new(storage: Arc<Storage>, retention_days: i64) -> Self {
        Self {
            storage,
            retention_days,
        }
    }

    /// Run a cleanup pass with explicit options (the admin endpoint path)
    pub async fn run_cleanup(&self, options: &CleanupOptions) -> Result<CleanupReport> {
        options.validate()?;

        let cutoff = Utc::now() - Duration::days(options.retention_days);
        let mut report = CleanupReport {
            dry_run: options.dry_run,
            ..Default::default()
        };

        report.estimated_kb_before = self.estimate_kb().await?;

        if options.dry_run {
            report.events_deleted = self.count_older(Table::Events, cutoff).await?;
            report.page_views_deleted = self.count_older(Table::PageViews, cutoff).await?;
            report.web_vitals_deleted = self.count_older(Table::WebVitals, cutoff).await?;
            report.client_errors_deleted = self.count_older(Table::ClientErrors, cutoff).await?;
            report.sessions_deleted = self.count_older(Table::Sessions, cutoff).await?;
        } else {
            report.events_deleted = self.delete_older(Table::Events, cutoff).await?;
            report.page_views_deleted = self.delete_older(Table::PageViews, cutoff).await?;
            report.web_vitals_deleted = self.delete_older(Table::WebVitals, cutoff).await?;
            report.client_errors_deleted = self.delete_older(Table::ClientErrors, cutoff).await?;
            report.sessions_deleted = self.delete_expired_sessions(cutoff).await?;

            if options.aggressive {
                report.duplicates_removed = match self.dedup_page_views().await {
                    Ok(removed) => removed,
                    Err(e) => {
                        error!("Page view dedup failed: {}", e);
                        0
                    }
                };
            }

            if options.compact {
                report.compacted = match self.compact().await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Storage compaction failed: {}", e);
                        false
                    }
                };
            }
        }

        report.estimated_kb_after = if options.dry_run {
            report.estimated_kb_before
                - report.events_deleted as f64 * KB_PER_EVENT
                - (report.page_views_deleted
                    + report.web_vitals_deleted
                    + report.client_errors_deleted) as f64
                    * KB_PER_PAGE_VIEW
                - report.sessions_deleted as f64 * KB_PER_SESSION
        } else {
            self.estimate_kb().await?
        };
        report.estimated_kb_after = report.estimated_kb_after.max(0.0);

        info!(
            "Analytics cleanup completed (dry_run={}): events {}, page views {}, vitals {}, errors {}, sessions {}, duplicates {}",
            report.dry_run,
            report.events_deleted,
            report.page_views_deleted,
            report.web_vitals_deleted,
            report.client_errors_deleted,
            report.sessions_deleted,
            report.duplicates_removed
        );

        Ok(report)
    }

    async fn estimate_kb(&self) -> Result<f64> {
        let db = self.storage.get_db();

        let events = analytics_event::Entity::find().count(db).await?;
        let views = page_view::Entity::find().count(db).await?;
        let vitals = web_vital::Entity::find().count(db).await?;
        let errors = client_error::Entity::find().count(db).await?;
        let sessions = visitor_session::Entity::find().count(db).await?;

        Ok(events as f64 * KB_PER_EVENT
            + (views + vitals + errors) as f64 * KB_PER_PAGE_VIEW
            + sessions as f64 * KB_PER_SESSION)
    }

    async fn count_older(&self, table: Table, cutoff: DateTime<Utc>) -> Result<u64> {
        let db = self.storage.get_db();
        let count = match table {
            Table::Events => {
                analytics_event::Entity::find()
                    .filter(analytics_event::Column::CreatedAt.lt(cutoff))
                    .count(db)
                    .await?
            }
            Table::PageViews => {
                page_view::Entity::find()
                    .filter(page_view::Column::CreatedAt.lt(cutoff))
                    .count(db)
                    .await?
            }
            Table::WebVitals => {
                web_vital::Entity::find()
                    .filter(web_vital::Column::CreatedAt.lt(cutoff))
                    .count(db)
                    .await?
            }
            Table::ClientErrors => {
                client_error::Entity::find()
                    .filter(client_error::Column::CreatedAt.lt(cutoff))
                    .count(db)
                    .await?
            }
            Table::Sessions => {
                visitor_session::Entity::find()
                    .filter(visitor_session::Column::LastSeenAt.lt(cutoff))
                    .count(db)
                    .await?
            }
        };
        Ok(count)
    }

    /// Batched id-window delete, avoids one long transaction
    async fn delete_older(&self, table: Table, cutoff: DateTime<Utc>) -> Result<u64> {
        let db = self.storage.get_db();
        let mut total_deleted = 0u64;
        let mut iterations = 0u32;

        loop {
            if iterations >= MAX_ITERATIONS {
                warn!(
                    "Cleanup of {:?} reached max iterations {} (deleted {} rows)",
                    table, MAX_ITERATIONS, total_deleted
                );
                break;
            }

            let deleted = match table {
                Table::Events => {
                    let ids: Vec<i64> = analytics_event::Entity::find()
                        .select_only()
                        .column(analytics_event::Column::Id)
                        .filter(analytics_event::Column::CreatedAt.lt(cutoff))
                        .order_by_asc(analytics_event::Column::Id)
                        .limit(BATCH_SIZE)
                        .into_tuple()
                        .all(db)
                        .await?;
                    if ids.is_empty() {
                        break;
                    }
                    analytics_event::Entity::delete_many()
                        .filter(analytics_event::Column::Id.is_in(ids))
                        .exec(db)
                        .await?
                        .rows_affected
                }
                Table::PageViews => {
                    let ids: Vec<i64> = page_view::Entity::find()
                        .select_only()
                        .column(page_view::Column::Id)
                        .filter(page_view::Column::CreatedAt.lt(cutoff))
                        .order_by_asc(page_view::Column::Id)
                        .limit(BATCH_SIZE)
                        .into_tuple()
                        .all(db)
                        .await?;
                    if ids.is_empty() {
                        break;
                    }
                    page_view::Entity::delete_many()
                        .filter(page_view::Column::Id.is_in(ids))
                        .exec(db)
                        .await?
                        .rows_affected
                }
                Table::WebVitals => {
                    let ids: Vec<i64> = web_vital::Entity::find()
                        .select_only()
                        .column(web_vital::Column::Id)
                        .filter(web_vital::Column::CreatedAt.lt(cutoff))
                        .order_by_asc(web_vital::Column::Id)
                        .limit(BATCH_SIZE)
                        .into_tuple()
                        .all(db)
                        .await?;
                    if ids.is_empty() {
                        break;
                    }
                    web_vital::Entity::delete_many()
                        .filter(web_vital::Column::Id.is_in(ids))
                        .exec(db)
                        .await?
                        .rows_affected
                }
                Table::ClientErrors => {
                    let ids: Vec<i64> = client_error::Entity::find()
                        .select_only()
                        .column(client_error::Column::Id)
                        .filter(client_error::Column::CreatedAt.lt(cutoff))
                        .order_by_asc(client_error::Column::Id)
                        .limit(BATCH_SIZE)
                        .into_tuple()
                        .all(db)
                        .await?;
                    if ids.is_empty() {
                        break;
                    }
                    client_error::Entity::delete_many()
                        .filter(client_error::Column::Id.is_in(ids))
                        .exec(db)
                        .await?
                        .rows_affected
                }
                Table::Sessions => unreachable!("sessions use delete_expired_sessions"),
            };

            total_deleted += deleted;
            iterations += 1;

            debug!(
                "Cleanup batch {} for {:?}: deleted {} rows (total {})",
                iterations, table, deleted, total_deleted
            );

            if deleted < BATCH_SIZE {
                break;
            }

            tokio::time::sleep(StdDuration::from_millis(100)).await;
        }

        Ok(total_deleted)
    }

    /// Sessions have a string primary key, so they get their own batcher
    async fn delete_expired_sessions(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let db = self.storage.get_db();
        let mut total_deleted = 0u64;
        let mut iterations = 0u32;

        loop {
            if iterations >= MAX_ITERATIONS {
                warn!(
                    "Session cleanup reached max iterations {} (deleted {} rows)",
                    MAX_ITERATIONS, total_deleted
                );
                break;
            }

            let ids: Vec<String> = visitor_session::Entity::find()
                .select_only()
                .column(visitor_session::Column::Id)
                .filter(visitor_session::Column::LastSeenAt.lt(cutoff))
                .order_by_asc(visitor_session::Column::Id)
                .limit(BATCH_SIZE)
                .into_tuple()
                .all(db)
                .await?;

            if ids.is_empty() {
                break;
            }

            let deleted = visitor_session::Entity::delete_many()
                .filter(visitor_session::Column::Id.is_in(ids))
                .exec(db)
                .await?
                .rows_affected;

            total_deleted += deleted;
            iterations += 1;

            if deleted < BATCH_SIZE {
                break;
            }

            tokio::time::sleep(StdDuration::from_millis(100)).await;
        }

        Ok(total_deleted)
    }

    /// Drop duplicate page views: same session + url within 60 s, keep
    /// the lowest id of each run.
    async fn dedup_page_views(&self) -> Result<u64> {
        let db = self.storage.get_db();

        let rows: Vec<(i64, String, String, DateTime<Utc>)> = page_view::Entity::find()
            .select_only()
            .column(page_view::Column::Id)
            .column(page_view::Column::SessionId)
            .column(page_view::Column::PageUrl)
            .column(page_view::Column::CreatedAt)
            .order_by_asc(page_view::Column::SessionId)
            .order_by_asc(page_view::Column::PageUrl)
            .order_by_asc(page_view::Column::CreatedAt)
            .order_by_asc(page_view::Column::Id)
            .into_tuple()
            .all(db)
            .await?;

        let mut to_delete: Vec<i64> = Vec::new();
        let mut kept: Option<(String, String, DateTime<Utc>)> = None;

        for (id, session_id, url, created_at) in rows {
            let is_duplicate = match &kept {
                Some((kept_session, kept_url, kept_at)) => {
                    *kept_session == session_id
                        && *kept_url == url
                        && (created_at - *kept_at).num_seconds() < DEDUP_WINDOW_SECONDS
                }
                None => false,
            };

            if is_duplicate {
                to_delete.push(id);
            } else {
                kept = Some((session_id, url, created_at));
            }
        }

        let mut total_deleted = 0u64;
        for chunk in to_delete.chunks(BATCH_SIZE as usize) {
            total_deleted += page_view::Entity::delete_many()
                .filter(page_view::Column::Id.is_in(chunk.to_vec()))
                .exec(db)
                .await?
                .rows_affected;
        }

        Ok(total_deleted)
    }

    /// Reclaim space after a large delete; dialect-specific
    async fn compact(&self) -> Result<()> {
        let db = self.storage.get_db();
        let statement = match self.storage.backend_name() {
            "mysql" => {
                "OPTIMIZE TABLE analytics_events, page_views, web_vitals, client_errors, visitor_sessions"
            }
            _ => "VACUUM",
        };

        db.execute_unprepared(statement)
            .await
            .map_err(|e| FolioError::database_operation(e.to_string()))?;

        Ok(())
    }

    /// Periodic cleanup with the configured retention, first run delayed
    pub fn spawn_background_task(self: Arc<Self>, interval_hours: u64) {
        let retention_days = self.retention_days;
        tokio::spawn(async move {
            let interval = StdDuration::from_secs(interval_hours * 60 * 60);
            let options = CleanupOptions {
                retention_days,
                dry_run: false,
                aggressive: false,
                compact: false,
            };

            tokio::time::sleep(StdDuration::from_secs(300)).await;

            loop {
                if let Err(e) = self.run_cleanup(&options).await {
                    error!("Analytics cleanup task failed: {}", e);
                }

                tokio::time::sleep(interval).await;
            }
        });

        info!(
            "Analytics cleanup background task started (interval: {} hours)",
            interval_hours
        );
    }
}

#[derive(Debug, Clone, Copy)]
enum Table {
    Events,
    PageViews,
    WebVitals,
    ClientErrors,
    Sessions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_bounds() {
        let mut options = CleanupOptions {
            retention_days: 30,
            dry_run: true,
            aggressive: false,
            compact: false,
        };
        assert!(options.validate().is_ok());

        options.retention_days = 1095;
        assert!(options.validate().is_ok());

        options.retention_days = 29;
        assert!(options.validate().is_err());

        options.retention_days = 1096;
        assert!(options.validate().is_err());
    }
}
