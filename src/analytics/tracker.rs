//! Tracking ingestion
//!
//! One handler call = one row insert (plus a visitor-session upsert).
//! Responses never echo aggregated data, so no read-your-write guarantee
//! is needed here.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{FolioError, Result};
use crate::services::geoip::GeoIpService;
use crate::storage::Storage;
use crate::utils::classify_user_agent;

use super::session_fingerprint;
use migration::entities::{analytics_event, client_error, page_view, visitor_session, web_vital};

/// Session lifecycle action reported by the tracking script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionAction {
    Start,
    Heartbeat,
    End,
}

pub struct PageViewRecord {
    pub url: String,
    pub title: Option<String>,
    pub referrer: Option<String>,
}

pub struct WebVitalRecord {
    pub name: String,
    pub value: f64,
    pub vital_id: String,
    pub url: String,
}

pub struct ClientErrorRecord {
    pub message: String,
    pub url: String,
    pub stack: Option<String>,
    pub occurred_at: chrono::DateTime<Utc>,
}

pub struct Tracker {
    storage: Arc<Storage>,
    geoip: Option<Arc<GeoIpService>>,
}

impl Tracker {
    pub fn new(storage: Arc<Storage>, geoip: Option<Arc<GeoIpService>>) -> Self {
        Self { storage, geoip }
    }

    /// Record one page hit: analytics event + page view + session upsert.
    /// Returns the session id derived from the client fingerprint.
    pub async fn track_page_view(
        &self,
        record: PageViewRecord,
        ip: &str,
        user_agent: &str,
    ) -> Result<String> {
        let session_id = session_fingerprint(ip, user_agent);
        let now = Utc::now();
        let db = self.storage.get_db();

        analytics_event::ActiveModel {
            page_url: Set(record.url.clone()),
            page_title: Set(record.title),
            referrer: Set(record.referrer.clone()),
            user_agent: Set(Some(user_agent.to_string())),
            ip_address: Set(Some(ip.to_string())),
            session_id: Set(session_id.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        page_view::ActiveModel {
            page_url: Set(record.url),
            referrer: Set(record.referrer),
            session_id: Set(session_id.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        self.upsert_session(&session_id, ip, user_agent, true).await?;

        Ok(session_id)
    }

    /// Apply a session lifecycle action, creating the row when missing
    pub async fn session_action(
        &self,
        action: SessionAction,
        session_id: Option<String>,
        ip: &str,
        user_agent: &str,
    ) -> Result<String> {
        let session_id = session_id.unwrap_or_else(|| session_fingerprint(ip, user_agent));
        let db = self.storage.get_db();
        let now = Utc::now();

        match action {
            SessionAction::Start | SessionAction::Heartbeat => {
                self.upsert_session(&session_id, ip, user_agent, false).await?;
            }
            SessionAction::End => {
                if let Some(existing) =
                    visitor_session::Entity::find_by_id(session_id.clone()).one(db).await?
                {
                    let mut model: visitor_session::ActiveModel = existing.into();
                    model.ended_at = Set(Some(now));
                    model.last_seen_at = Set(now);
                    model.update(db).await?;
                } else {
                    debug!("Session end for unknown session {}", session_id);
                }
            }
        }

        Ok(session_id)
    }

    pub async fn record_vital(
        &self,
        record: WebVitalRecord,
        ip: &str,
        user_agent: &str,
    ) -> Result<()> {
        let session_id = session_fingerprint(ip, user_agent);

        web_vital::ActiveModel {
            name: Set(record.name),
            value: Set(record.value),
            vital_id: Set(record.vital_id),
            page_url: Set(record.url),
            session_id: Set(Some(session_id)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.storage.get_db())
        .await?;

        Ok(())
    }

    pub async fn record_error(
        &self,
        record: ClientErrorRecord,
        ip: &str,
        user_agent: &str,
    ) -> Result<()> {
        let session_id = session_fingerprint(ip, user_agent);

        client_error::ActiveModel {
            message: Set(record.message),
            page_url: Set(record.url),
            stack: Set(record.stack),
            session_id: Set(Some(session_id)),
            occurred_at: Set(record.occurred_at),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.storage.get_db())
        .await?;

        Ok(())
    }

    /// A brand-new client fires `track` and `session` (start) together;
    /// the loser of the insert race retries on the update path.
    async fn upsert_session(
        &self,
        session_id: &str,
        ip: &str,
        user_agent: &str,
        count_view: bool,
    ) -> Result<()> {
        let db = self.storage.get_db();

        for attempt in 0..2 {
            let now = Utc::now();

            if let Some(existing) =
                visitor_session::Entity::find_by_id(session_id.to_string()).one(db).await?
            {
                let views = existing.page_views + if count_view { 1 } else { 0 };
                let mut model: visitor_session::ActiveModel = existing.into();
                model.last_seen_at = Set(now);
                model.page_views = Set(views);
                // A returning visitor re-opens the session
                model.ended_at = Set(None);
                model.update(db).await?;
                return Ok(());
            }

            let ua_info = classify_user_agent(user_agent);
            let geo = match &self.geoip {
                Some(service) => service.lookup(ip).await,
                None => None,
            };
            let (country, city) = match geo {
                Some(info) => (info.country, info.city),
                None => (None, None),
            };

            let inserted = visitor_session::ActiveModel {
                id: Set(session_id.to_string()),
                device: Set(Some(ua_info.device)),
                browser: Set(Some(ua_info.browser)),
                country: Set(country),
                city: Set(city),
                started_at: Set(now),
                last_seen_at: Set(now),
                ended_at: Set(None),
                page_views: Set(if count_view { 1 } else { 0 }),
            }
            .insert(db)
            .await;

            match inserted.map_err(FolioError::from) {
                Ok(_) => return Ok(()),
                Err(FolioError::DuplicateRecord(_)) if attempt == 0 => {
                    debug!("Lost session insert race for {}, updating instead", session_id);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}
