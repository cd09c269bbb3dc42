//! Admin analytics endpoints: summary, realtime, sessions, export, cleanup

use actix_web::http::StatusCode;
use actix_web::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use actix_web::{HttpResponse, Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::error;

use crate::analytics::aggregate::{Aggregator, DateRange, EXPORT_MAX_DAYS, SUMMARY_MAX_DAYS};
use crate::analytics::report::{export_filename, render_csv};
use crate::analytics::retention::{CleanupOptions, RetentionTask};
use crate::analytics::{RealtimeSnapshot, realtime};
use crate::storage::Storage;

use super::helpers::{error_from_folio, error_response, success_response};
use super::types::{ExportQuery, SessionsQuery, SummaryQuery};

const DEFAULT_DAYS: i64 = 30;
const DEFAULT_TOP_N: u64 = 10;

/// GET /admin/v1/analytics/summary?days=N
///
/// Range validation happens before any query.
pub async fn get_summary(
    query: web::Query<SummaryQuery>,
    aggregator: web::Data<Arc<Aggregator>>,
) -> ActixResult<impl Responder> {
    let days = query.days.unwrap_or(DEFAULT_DAYS);
    let range = match DateRange::last_days(days, SUMMARY_MAX_DAYS) {
        Ok(range) => range,
        Err(e) => return Ok(error_from_folio(&e)),
    };

    let top_n = query.top_n.unwrap_or(DEFAULT_TOP_N);

    match aggregator.summary(range, top_n).await {
        Ok(summary) => Ok(success_response(summary)),
        Err(e) => {
            error!("Failed to build analytics summary: {}", e);
            Ok(error_from_folio(&e))
        }
    }
}

/// GET /admin/v1/analytics/realtime - also the polling fallback for the
/// live stream
pub async fn get_realtime(storage: web::Data<Arc<Storage>>) -> ActixResult<impl Responder> {
    match realtime::snapshot(&storage).await {
        Ok(snapshot) => Ok(success_response::<RealtimeSnapshot>(snapshot)),
        Err(e) => {
            error!("Failed to build realtime snapshot: {}", e);
            Ok(error_from_folio(&e))
        }
    }
}

/// GET /admin/v1/analytics/sessions?days=N
pub async fn get_sessions(
    query: web::Query<SessionsQuery>,
    aggregator: web::Data<Arc<Aggregator>>,
) -> ActixResult<impl Responder> {
    let days = query.days.unwrap_or(DEFAULT_DAYS);
    let range = match DateRange::last_days(days, SUMMARY_MAX_DAYS) {
        Ok(range) => range,
        Err(e) => return Ok(error_from_folio(&e)),
    };

    let page = query.page.unwrap_or(0);
    let page_size = query.page_size.unwrap_or(20);

    match aggregator.sessions(range, page, page_size).await {
        Ok(sessions) => Ok(success_response(sessions)),
        Err(e) => Ok(error_from_folio(&e)),
    }
}

/// GET /admin/v1/analytics/export?days=N&format=csv|json
///
/// The export cap (730 days) is wider than the summary cap on purpose.
pub async fn export_analytics(
    query: web::Query<ExportQuery>,
    aggregator: web::Data<Arc<Aggregator>>,
) -> ActixResult<HttpResponse> {
    let days = query.days.unwrap_or(DEFAULT_DAYS);
    let range = match DateRange::last_days(days, EXPORT_MAX_DAYS) {
        Ok(range) => range,
        Err(e) => return Ok(error_from_folio(&e)),
    };

    let format = query.format.as_deref().unwrap_or("csv");
    if format != "csv" && format != "json" {
        return Ok(error_response(
            StatusCode::BAD_REQUEST,
            "format must be 'csv' or 'json'",
        ));
    }

    let summary = match aggregator.summary(range, DEFAULT_TOP_N).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Failed to build analytics export: {}", e);
            return Ok(error_from_folio(&e));
        }
    };

    if format == "json" {
        return Ok(success_response(summary));
    }

    let csv = render_csv(&summary);
    let filename = export_filename(&summary);

    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/csv; charset=utf-8"))
        .insert_header((
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(csv))
}

/// POST /admin/v1/analytics/cleanup
pub async fn run_cleanup(
    body: web::Json<CleanupOptions>,
    retention: web::Data<Arc<RetentionTask>>,
) -> ActixResult<impl Responder> {
    match retention.run_cleanup(&body).await {
        Ok(report) => Ok(success_response(report)),
        Err(e) => Ok(error_from_folio(&e)),
    }
}
