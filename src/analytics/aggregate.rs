//! Read-side aggregation over the raw tracking tables
//!
//! Every query here is range-bounded and grouped server-side; only the
//! visitor-flow fold happens in Rust because it needs per-session
//! ordering that GROUP BY cannot express portably.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ColumnTrait, DbBackend, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::{FolioError, Result};
use crate::storage::Storage;
use migration::entities::{page_view, visitor_session, web_vital};

const TS_EXPORT_PATH: &str = "../dashboard/src/services/types.generated.ts";

/// Day cap for summary endpoints
pub const SUMMARY_MAX_DAYS: i64 = 365;
/// Day cap for exports, intentionally wider than the summary cap
pub const EXPORT_MAX_DAYS: i64 = 730;

const TOP_PAGES_MAX: u64 = 50;
const FLOW_TOP: usize = 20;

// ============ Date range ============

#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Range ending now, `days` back. Validated before any query runs.
    pub fn last_days(days: i64, max_days: i64) -> Result<Self> {
        if days < 1 || days > max_days {
            return Err(FolioError::validation(format!(
                "days must be between 1 and {}, got {}",
                max_days, days
            )));
        }
        let end = Utc::now();
        Ok(Self {
            start: end - Duration::days(days),
            end,
        })
    }

    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(FolioError::validation("start date is after end date"));
        }
        Ok(Self { start, end })
    }
}

// ============ Summary shapes ============

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct DailyPoint {
    pub date: String,
    pub views: u64,
    pub unique_visitors: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct PageCount {
    pub url: String,
    pub views: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ReferrerCount {
    pub referrer: String,
    pub count: u64,
    pub percentage: f64,
}

/// One slice of a device/browser/country breakdown
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct BreakdownSlice {
    pub label: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct HourlyPoint {
    pub hour: String,
    pub views: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct FlowEdge {
    pub from: String,
    pub to: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct VitalStat {
    pub name: String,
    pub samples: u64,
    pub average: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct AnalyticsSummary {
    pub start_date: String,
    pub end_date: String,
    pub total_views: u64,
    pub unique_visitors: u64,
    pub daily: Vec<DailyPoint>,
    pub top_pages: Vec<PageCount>,
    pub top_referrers: Vec<ReferrerCount>,
    pub devices: Vec<BreakdownSlice>,
    pub browsers: Vec<BreakdownSlice>,
    pub countries: Vec<BreakdownSlice>,
    pub hourly: Vec<HourlyPoint>,
    pub visitor_flow: Vec<FlowEdge>,
    pub web_vitals: Vec<VitalStat>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct SessionInfo {
    pub id: String,
    pub device: Option<String>,
    pub browser: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub started_at: String,
    pub last_seen_at: String,
    pub page_views: i32,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct SessionPage {
    pub sessions: Vec<SessionInfo>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

// ============ Query result rows ============

#[derive(Debug, FromQueryResult)]
struct DailyRow {
    label: String,
    count: i64,
    uniques: i64,
}

#[derive(Debug, FromQueryResult)]
struct LabelCountRow {
    label: Option<String>,
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct VitalRow {
    name: String,
    count: i64,
    avg: Option<f64>,
}

// ============ Dialect helpers ============

fn db_backend(storage: &Storage) -> DbBackend {
    match storage.backend_name() {
        "sqlite" => DbBackend::Sqlite,
        "mysql" => DbBackend::MySql,
        _ => DbBackend::Postgres,
    }
}

#[derive(Debug, Clone, Copy)]
enum Bucket {
    Day,
    Hour,
}

fn date_format_expr(backend: DbBackend, column: &str, bucket: Bucket) -> Expr {
    let (sqlite_fmt, mysql_fmt, pg_fmt) = match bucket {
        Bucket::Day => ("%Y-%m-%d", "%Y-%m-%d", "YYYY-MM-DD"),
        Bucket::Hour => ("%Y-%m-%d %H:00", "%Y-%m-%d %H:00", "YYYY-MM-DD HH24:00"),
    };

    match backend {
        DbBackend::Sqlite => Expr::cust(format!("strftime('{}', {})", sqlite_fmt, column)),
        DbBackend::MySql => Expr::cust(format!("DATE_FORMAT({}, '{}')", column, mysql_fmt)),
        _ => Expr::cust(format!("TO_CHAR({}, '{}')", column, pg_fmt)),
    }
}

// ============ Aggregator ============

pub struct Aggregator {
    storage: Arc<Storage>,
}

impl Aggregator {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Full dashboard summary for a range
    pub async fn summary(&self, range: DateRange, top_n: u64) -> Result<AnalyticsSummary> {
        let top_n = top_n.min(TOP_PAGES_MAX);
        let total_views = self.total_views(range).await?;
        let unique_visitors = self.unique_visitors(range).await?;
        let daily = self.daily_series(range).await?;
        let top_pages = self.top_pages(range, top_n).await?;
        let top_referrers = self.top_referrers(range, top_n, total_views).await?;
        let devices = self.session_breakdown(range, visitor_session::Column::Device).await?;
        let browsers = self.session_breakdown(range, visitor_session::Column::Browser).await?;
        let countries = self.session_breakdown(range, visitor_session::Column::Country).await?;
        let hourly = self.hourly_series().await?;
        let visitor_flow = self.visitor_flow(range).await?;
        let web_vitals = self.vital_stats(range).await?;

        Ok(AnalyticsSummary {
            start_date: range.start.format("%Y-%m-%d").to_string(),
            end_date: range.end.format("%Y-%m-%d").to_string(),
            total_views,
            unique_visitors,
            daily,
            top_pages,
            top_referrers,
            devices,
            browsers,
            countries,
            hourly,
            visitor_flow,
            web_vitals,
        })
    }

    pub async fn total_views(&self, range: DateRange) -> Result<u64> {
        let count = page_view::Entity::find()
            .filter(page_view::Column::CreatedAt.gte(range.start))
            .filter(page_view::Column::CreatedAt.lte(range.end))
            .count(self.storage.get_db())
            .await?;
        Ok(count)
    }

    pub async fn unique_visitors(&self, range: DateRange) -> Result<u64> {
        let count: Option<i64> = page_view::Entity::find()
            .select_only()
            .column_as(Expr::cust("COUNT(DISTINCT session_id)"), "count")
            .filter(page_view::Column::CreatedAt.gte(range.start))
            .filter(page_view::Column::CreatedAt.lte(range.end))
            .into_tuple()
            .one(self.storage.get_db())
            .await?;
        Ok(count.unwrap_or(0) as u64)
    }

    /// One point per calendar day in range, zero-filled for silent days
    pub async fn daily_series(&self, range: DateRange) -> Result<Vec<DailyPoint>> {
        let backend = db_backend(&self.storage);
        let date_expr = date_format_expr(backend, "created_at", Bucket::Day);

        let rows = page_view::Entity::find()
            .select_only()
            .column_as(date_expr.clone(), "label")
            .column_as(page_view::Column::Id.count(), "count")
            .column_as(Expr::cust("COUNT(DISTINCT session_id)"), "uniques")
            .filter(page_view::Column::CreatedAt.gte(range.start))
            .filter(page_view::Column::CreatedAt.lte(range.end))
            .group_by(date_expr)
            .order_by_asc(Expr::cust("label"))
            .into_model::<DailyRow>()
            .all(self.storage.get_db())
            .await?;

        let by_date: HashMap<String, (u64, u64)> = rows
            .into_iter()
            .map(|r| (r.label, (r.count as u64, r.uniques as u64)))
            .collect();

        let mut series = Vec::new();
        let mut day = range.start.date_naive();
        let last = range.end.date_naive();
        while day <= last {
            let label = day.format("%Y-%m-%d").to_string();
            let (views, unique_visitors) = by_date.get(&label).copied().unwrap_or((0, 0));
            series.push(DailyPoint {
                date: label,
                views,
                unique_visitors,
            });
            day += Duration::days(1);
        }

        Ok(series)
    }

    pub async fn top_pages(&self, range: DateRange, limit: u64) -> Result<Vec<PageCount>> {
        let rows = page_view::Entity::find()
            .select_only()
            .column_as(Expr::col(page_view::Column::PageUrl), "label")
            .column_as(page_view::Column::Id.count(), "count")
            .filter(page_view::Column::CreatedAt.gte(range.start))
            .filter(page_view::Column::CreatedAt.lte(range.end))
            .group_by(page_view::Column::PageUrl)
            .order_by_desc(Expr::cust("count"))
            .limit(limit.min(TOP_PAGES_MAX))
            .into_model::<LabelCountRow>()
            .all(self.storage.get_db())
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| PageCount {
                url: r.label.unwrap_or_default(),
                views: r.count as u64,
            })
            .collect())
    }

    pub async fn top_referrers(
        &self,
        range: DateRange,
        limit: u64,
        total: u64,
    ) -> Result<Vec<ReferrerCount>> {
        let rows = page_view::Entity::find()
            .select_only()
            .column_as(Expr::col(page_view::Column::Referrer), "label")
            .column_as(page_view::Column::Id.count(), "count")
            .filter(page_view::Column::CreatedAt.gte(range.start))
            .filter(page_view::Column::CreatedAt.lte(range.end))
            .group_by(page_view::Column::Referrer)
            .order_by_desc(Expr::cust("count"))
            .limit(limit)
            .into_model::<LabelCountRow>()
            .all(self.storage.get_db())
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let count = r.count as u64;
                ReferrerCount {
                    referrer: r.label.unwrap_or_else(|| "(direct)".to_string()),
                    count,
                    percentage: percentage(count, total),
                }
            })
            .collect())
    }

    async fn session_breakdown(
        &self,
        range: DateRange,
        column: visitor_session::Column,
    ) -> Result<Vec<BreakdownSlice>> {
        let db = self.storage.get_db();

        let total = visitor_session::Entity::find()
            .filter(visitor_session::Column::LastSeenAt.gte(range.start))
            .filter(visitor_session::Column::LastSeenAt.lte(range.end))
            .count(db)
            .await?;

        let rows = visitor_session::Entity::find()
            .select_only()
            .column_as(Expr::col(column), "label")
            .column_as(visitor_session::Column::Id.count(), "count")
            .filter(visitor_session::Column::LastSeenAt.gte(range.start))
            .filter(visitor_session::Column::LastSeenAt.lte(range.end))
            .group_by(column)
            .order_by_desc(Expr::cust("count"))
            .into_model::<LabelCountRow>()
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let count = r.count as u64;
                BreakdownSlice {
                    label: r.label.unwrap_or_else(|| "unknown".to_string()),
                    count,
                    percentage: percentage(count, total),
                }
            })
            .collect())
    }

    /// 24 hourly buckets covering the last 24h, zero-filled
    pub async fn hourly_series(&self) -> Result<Vec<HourlyPoint>> {
        let end = Utc::now();
        let start = end - Duration::hours(24);
        let backend = db_backend(&self.storage);
        let hour_expr = date_format_expr(backend, "created_at", Bucket::Hour);

        let rows = page_view::Entity::find()
            .select_only()
            .column_as(hour_expr.clone(), "label")
            .column_as(page_view::Column::Id.count(), "count")
            .filter(page_view::Column::CreatedAt.gte(start))
            .filter(page_view::Column::CreatedAt.lte(end))
            .group_by(hour_expr)
            .order_by_asc(Expr::cust("label"))
            .into_model::<LabelCountRow>()
            .all(self.storage.get_db())
            .await?;

        let by_hour: HashMap<String, u64> = rows
            .into_iter()
            .filter_map(|r| r.label.map(|l| (l, r.count as u64)))
            .collect();

        let mut series = Vec::with_capacity(24);
        for offset in (0..24).rev() {
            let label = (end - Duration::hours(offset)).format("%Y-%m-%d %H:00").to_string();
            let views = by_hour.get(&label).copied().unwrap_or(0);
            series.push(HourlyPoint { hour: label, views });
        }

        Ok(series)
    }

    /// Per-session page transitions folded into (from, to, count), top 20.
    /// Ordering within a session comes from created_at, ties broken by id.
    pub async fn visitor_flow(&self, range: DateRange) -> Result<Vec<FlowEdge>> {
        let rows: Vec<(String, String)> = page_view::Entity::find()
            .select_only()
            .column(page_view::Column::SessionId)
            .column(page_view::Column::PageUrl)
            .filter(page_view::Column::CreatedAt.gte(range.start))
            .filter(page_view::Column::CreatedAt.lte(range.end))
            .order_by_asc(page_view::Column::SessionId)
            .order_by_asc(page_view::Column::CreatedAt)
            .order_by_asc(page_view::Column::Id)
            .into_tuple()
            .all(self.storage.get_db())
            .await?;

        let mut edges: HashMap<(String, String), u64> = HashMap::new();
        let mut prev: Option<(String, String)> = None;
        for (session_id, url) in rows {
            if let Some((prev_session, prev_url)) = &prev {
                if *prev_session == session_id && *prev_url != url {
                    *edges.entry((prev_url.clone(), url.clone())).or_insert(0) += 1;
                }
            }
            prev = Some((session_id, url));
        }

        let mut flow: Vec<FlowEdge> = edges
            .into_iter()
            .map(|((from, to), count)| FlowEdge { from, to, count })
            .collect();
        flow.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.from.cmp(&b.from)));
        flow.truncate(FLOW_TOP);

        Ok(flow)
    }

    pub async fn vital_stats(&self, range: DateRange) -> Result<Vec<VitalStat>> {
        let rows = web_vital::Entity::find()
            .select_only()
            .column(web_vital::Column::Name)
            .column_as(web_vital::Column::Id.count(), "count")
            .column_as(Expr::cust("AVG(value)"), "avg")
            .filter(web_vital::Column::CreatedAt.gte(range.start))
            .filter(web_vital::Column::CreatedAt.lte(range.end))
            .group_by(web_vital::Column::Name)
            .order_by_asc(web_vital::Column::Name)
            .into_model::<VitalRow>()
            .all(self.storage.get_db())
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| VitalStat {
                name: r.name,
                samples: r.count as u64,
                average: r.avg.unwrap_or(0.0),
            })
            .collect())
    }

    /// Paginated session listing for the dashboard table
    pub async fn sessions(&self, range: DateRange, page: u64, page_size: u64) -> Result<SessionPage> {
        let page_size = page_size.clamp(1, 100);
        let db = self.storage.get_db();

        let paginator = visitor_session::Entity::find()
            .filter(visitor_session::Column::LastSeenAt.gte(range.start))
            .filter(visitor_session::Column::LastSeenAt.lte(range.end))
            .order_by_desc(visitor_session::Column::LastSeenAt)
            .paginate(db, page_size);

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page).await?;

        let sessions = models
            .into_iter()
            .map(|m| SessionInfo {
                id: m.id,
                device: m.device,
                browser: m.browser,
                country: m.country,
                city: m.city,
                started_at: m.started_at.to_rfc3339(),
                last_seen_at: m.last_seen_at.to_rfc3339(),
                page_views: m.page_views,
            })
            .collect();

        Ok(SessionPage {
            sessions,
            total,
            page,
            page_size,
        })
    }
}

fn percentage(count: u64, total: u64) -> f64 {
    if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_days_bounds() {
        assert!(DateRange::last_days(1, SUMMARY_MAX_DAYS).is_ok());
        assert!(DateRange::last_days(365, SUMMARY_MAX_DAYS).is_ok());
        assert!(DateRange::last_days(0, SUMMARY_MAX_DAYS).is_err());
        assert!(DateRange::last_days(366, SUMMARY_MAX_DAYS).is_err());
        assert!(DateRange::last_days(366, EXPORT_MAX_DAYS).is_ok());
        assert!(DateRange::last_days(731, EXPORT_MAX_DAYS).is_err());
    }

    #[test]
    fn test_range_order() {
        let now = Utc::now();
        assert!(DateRange::new(now - Duration::days(1), now).is_ok());
        assert!(DateRange::new(now, now - Duration::days(1)).is_err());
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(percentage(5, 0), 0.0);
    }
}
