//! Analytics ingestion endpoints
//!
//! These are called by the tracking snippet on the marketing site.
//! Validation happens here so malformed beacons never reach storage;
//! every missing field is listed in one 400 instead of one at a time.

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use ts_rs::TS;

use crate::analytics::tracker::{ClientErrorRecord, PageViewRecord, WebVitalRecord};
use crate::analytics::{SessionAction, Tracker};
use crate::api::services::admin::{error_from_folio, error_response, success_response};
use crate::utils::extract_client_ip;

use actix_web::http::StatusCode;

const TS_EXPORT_PATH: &str = "../dashboard/src/services/types.generated.ts";

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct TrackPayload {
    pub url: Option<String>,
    pub title: Option<String>,
    pub referrer: Option<String>,
}

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct SessionPayload {
    pub session_id: Option<String>,
    pub action: Option<String>,
}

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct VitalsPayload {
    pub name: Option<String>,
    pub value: Option<f64>,
    pub id: Option<String>,
    pub url: Option<String>,
}

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ErrorsPayload {
    pub message: Option<String>,
    pub url: Option<String>,
    /// Milliseconds since the Unix epoch, as reported by the browser
    pub timestamp: Option<i64>,
    pub stack: Option<String>,
}

fn client_identity(req: &HttpRequest) -> (String, String) {
    let ip = extract_client_ip(req).unwrap_or_else(|| "unknown".to_string());
    let user_agent = req
        .headers()
        .get("User-Agent")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
        .to_string();
    (ip, user_agent)
}

fn missing_fields_response(missing: &[&str]) -> HttpResponse {
    error_response(
        StatusCode::BAD_REQUEST,
        &format!("Missing required fields: {}", missing.join(", ")),
    )
}

/// POST /api/analytics/track
pub async fn track(
    req: HttpRequest,
    body: web::Json<TrackPayload>,
    tracker: web::Data<Arc<Tracker>>,
) -> ActixResult<HttpResponse> {
    let body = body.into_inner();

    let Some(url) = body.url.filter(|u| !u.trim().is_empty()) else {
        return Ok(missing_fields_response(&["url"]));
    };

    let (ip, user_agent) = client_identity(&req);
    let record = PageViewRecord {
        url,
        title: body.title,
        referrer: body.referrer.filter(|r| !r.is_empty()),
    };

    match tracker.track_page_view(record, &ip, &user_agent).await {
        Ok(session_id) => Ok(success_response(
            serde_json::json!({ "session_id": session_id }),
        )),
        Err(e) => Ok(error_from_folio(&e)),
    }
}

/// POST /api/analytics/session
pub async fn session(
    req: HttpRequest,
    body: web::Json<SessionPayload>,
    tracker: web::Data<Arc<Tracker>>,
) -> ActixResult<HttpResponse> {
    let body = body.into_inner();

    let action = match body.action.as_deref() {
        Some("start") => SessionAction::Start,
        Some("heartbeat") => SessionAction::Heartbeat,
        Some("end") => SessionAction::End,
        Some(other) => {
            return Ok(error_response(
                StatusCode::BAD_REQUEST,
                &format!(
                    "Invalid session action: {} (expected start, heartbeat or end)",
                    other
                ),
            ));
        }
        None => return Ok(missing_fields_response(&["action"])),
    };

    let (ip, user_agent) = client_identity(&req);

    match tracker
        .session_action(action, body.session_id, &ip, &user_agent)
        .await
    {
        Ok(session_id) => Ok(success_response(
            serde_json::json!({ "session_id": session_id }),
        )),
        Err(e) => Ok(error_from_folio(&e)),
    }
}

/// POST /api/analytics/vitals
pub async fn vitals(
    req: HttpRequest,
    body: web::Json<VitalsPayload>,
    tracker: web::Data<Arc<Tracker>>,
) -> ActixResult<HttpResponse> {
    let body = body.into_inner();

    let mut missing = Vec::new();
    if body.name.as_deref().map(str::trim).unwrap_or("").is_empty() {
        missing.push("name");
    }
    if body.value.is_none() {
        missing.push("value");
    }
    if body.id.as_deref().map(str::trim).unwrap_or("").is_empty() {
        missing.push("id");
    }
    if body.url.as_deref().map(str::trim).unwrap_or("").is_empty() {
        missing.push("url");
    }
    if !missing.is_empty() {
        return Ok(missing_fields_response(&missing));
    }

    let (ip, user_agent) = client_identity(&req);
    let record = WebVitalRecord {
        name: body.name.unwrap_or_default(),
        value: body.value.unwrap_or_default(),
        vital_id: body.id.unwrap_or_default(),
        url: body.url.unwrap_or_default(),
    };

    match tracker.record_vital(record, &ip, &user_agent).await {
        Ok(()) => {
            debug!("Web vital recorded");
            Ok(success_response(serde_json::json!({ "recorded": true })))
        }
        Err(e) => Ok(error_from_folio(&e)),
    }
}

/// POST /api/analytics/errors
pub async fn errors(
    req: HttpRequest,
    body: web::Json<ErrorsPayload>,
    tracker: web::Data<Arc<Tracker>>,
) -> ActixResult<HttpResponse> {
    let body = body.into_inner();

    let mut missing = Vec::new();
    if body
        .message
        .as_deref()
        .map(str::trim)
        .unwrap_or("")
        .is_empty()
    {
        missing.push("message");
    }
    if body.url.as_deref().map(str::trim).unwrap_or("").is_empty() {
        missing.push("url");
    }
    if body.timestamp.is_none() {
        missing.push("timestamp");
    }
    if !missing.is_empty() {
        return Ok(missing_fields_response(&missing));
    }

    let Some(occurred_at) =
        chrono::DateTime::from_timestamp_millis(body.timestamp.unwrap_or_default())
    else {
        return Ok(error_response(
            StatusCode::BAD_REQUEST,
            "timestamp is out of range",
        ));
    };

    let (ip, user_agent) = client_identity(&req);
    let record = ClientErrorRecord {
        message: body.message.unwrap_or_default(),
        url: body.url.unwrap_or_default(),
        stack: body.stack,
        occurred_at,
    };

    match tracker.record_error(record, &ip, &user_agent).await {
        Ok(()) => Ok(success_response(serde_json::json!({ "recorded": true }))),
        Err(e) => Ok(error_from_folio(&e)),
    }
}
