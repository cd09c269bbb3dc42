//! Analytics pipeline integration tests
//!
//! Tracker ingestion, session lifecycle, aggregation, CSV rendering and
//! retention cleanup against a temp sqlite database.

use std::sync::{Arc, Once};

use chrono::{Duration, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait};
use tempfile::TempDir;

use folio_server::analytics::aggregate::{Aggregator, SUMMARY_MAX_DAYS};
use folio_server::analytics::report::render_csv;
use folio_server::analytics::tracker::PageViewRecord;
use folio_server::analytics::{
    CleanupOptions, DateRange, RetentionTask, SessionAction, Tracker, session_fingerprint,
};
use folio_server::config::init_config;
use folio_server::storage::Storage;
use migration::entities::{analytics_event, page_view, visitor_session};

static INIT: Once = Once::new();

fn init_static_config() {
    INIT.call_once(|| {
        init_config();
    });
}

async fn create_temp_storage() -> (Arc<Storage>, TempDir) {
    init_static_config();
    let td = TempDir::new().unwrap();
    let path = td.path().join("analytics_test.db");
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let storage = Storage::connect(&url).await.unwrap();
    (Arc::new(storage), td)
}

fn view(url: &str, referrer: Option<&str>) -> PageViewRecord {
    PageViewRecord {
        url: url.to_string(),
        title: None,
        referrer: referrer.map(str::to_string),
    }
}

const UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                  (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

mod tracker_tests {
    use super::*;

    #[tokio::test]
    async fn test_page_view_creates_rows_and_session() {
        let (storage, _td) = create_temp_storage().await;
        let tracker = Tracker::new(storage.clone(), None);

        let session_id = tracker
            .track_page_view(view("/about", None), "203.0.113.7", UA)
            .await
            .unwrap();

        assert_eq!(session_id.len(), 16);
        assert!(session_id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(session_id, session_fingerprint("203.0.113.7", UA));

        let db = storage.get_db();
        assert_eq!(analytics_event::Entity::find().count(db).await.unwrap(), 1);
        assert_eq!(page_view::Entity::find().count(db).await.unwrap(), 1);

        let session = visitor_session::Entity::find_by_id(session_id.clone())
            .one(db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.page_views, 1);
        assert!(session.ended_at.is_none());
        assert!(session.device.is_some());
        assert!(session.browser.is_some());
    }

    #[tokio::test]
    async fn test_same_client_reuses_session() {
        let (storage, _td) = create_temp_storage().await;
        let tracker = Tracker::new(storage.clone(), None);

        let first = tracker
            .track_page_view(view("/", None), "203.0.113.7", UA)
            .await
            .unwrap();
        let second = tracker
            .track_page_view(view("/projects", None), "203.0.113.7", UA)
            .await
            .unwrap();
        assert_eq!(first, second);

        let other = tracker
            .track_page_view(view("/", None), "198.51.100.1", UA)
            .await
            .unwrap();
        assert_ne!(first, other);

        let session = visitor_session::Entity::find_by_id(first)
            .one(storage.get_db())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.page_views, 2);
    }

    #[tokio::test]
    async fn test_concurrent_first_beacons_both_succeed() {
        let (storage, _td) = create_temp_storage().await;
        let tracker = Arc::new(Tracker::new(storage.clone(), None));

        // A fresh client fires the page-view beacon and the session-start
        // beacon at the same time; neither may fail on the shared row.
        let t1 = tracker.clone();
        let t2 = tracker.clone();
        let (tracked, started) = tokio::join!(
            tokio::spawn(async move {
                t1.track_page_view(view("/", None), "203.0.113.9", UA).await
            }),
            tokio::spawn(async move {
                t2.session_action(SessionAction::Start, None, "203.0.113.9", UA)
                    .await
            }),
        );
        let tracked = tracked.unwrap().unwrap();
        let started = started.unwrap().unwrap();
        assert_eq!(tracked, started);

        let session = visitor_session::Entity::find_by_id(tracked)
            .one(storage.get_db())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.page_views, 1);
    }

    #[tokio::test]
    async fn test_session_end_and_reopen() {
        let (storage, _td) = create_temp_storage().await;
        let tracker = Tracker::new(storage.clone(), None);

        let session_id = tracker
            .track_page_view(view("/", None), "203.0.113.7", UA)
            .await
            .unwrap();

        tracker
            .session_action(SessionAction::End, Some(session_id.clone()), "203.0.113.7", UA)
            .await
            .unwrap();

        let db = storage.get_db();
        let ended = visitor_session::Entity::find_by_id(session_id.clone())
            .one(db)
            .await
            .unwrap()
            .unwrap();
        assert!(ended.ended_at.is_some());

        // A new page view from the same client re-opens the session
        tracker
            .track_page_view(view("/contact", None), "203.0.113.7", UA)
            .await
            .unwrap();
        let reopened = visitor_session::Entity::find_by_id(session_id)
            .one(db)
            .await
            .unwrap()
            .unwrap();
        assert!(reopened.ended_at.is_none());
    }
}

mod aggregation_tests {
    use super::*;

    #[tokio::test]
    async fn test_summary_counts_and_referrers() {
        let (storage, _td) = create_temp_storage().await;
        let tracker = Tracker::new(storage.clone(), None);

        tracker
            .track_page_view(view("/", None), "203.0.113.7", UA)
            .await
            .unwrap();
        tracker
            .track_page_view(view("/projects", Some("https://news.ycombinator.com/")), "203.0.113.7", UA)
            .await
            .unwrap();
        tracker
            .track_page_view(view("/", None), "198.51.100.1", UA)
            .await
            .unwrap();

        let aggregator = Aggregator::new(storage);
        let range = DateRange::last_days(7, SUMMARY_MAX_DAYS).unwrap();
        let summary = aggregator.summary(range, 10).await.unwrap();

        assert_eq!(summary.total_views, 3);
        assert_eq!(summary.unique_visitors, 2);
        assert_eq!(summary.daily.len(), 8);
        assert_eq!(summary.top_pages[0].url, "/");
        assert_eq!(summary.top_pages[0].views, 2);
        assert!(
            summary
                .top_referrers
                .iter()
                .any(|r| r.referrer == "(direct)" && r.count == 2)
        );
        assert_eq!(summary.hourly.len(), 24);

        // Flow edge "/" -> "/projects" from the first session
        assert!(
            summary
                .visitor_flow
                .iter()
                .any(|e| e.from == "/" && e.to == "/projects" && e.count == 1)
        );
    }

    #[tokio::test]
    async fn test_csv_export_shape() {
        let (storage, _td) = create_temp_storage().await;
        let tracker = Tracker::new(storage.clone(), None);

        tracker
            .track_page_view(view("/", None), "203.0.113.7", UA)
            .await
            .unwrap();

        let aggregator = Aggregator::new(storage);
        let range = DateRange::last_days(1, SUMMARY_MAX_DAYS).unwrap();
        let summary = aggregator.summary(range, 10).await.unwrap();

        let csv = render_csv(&summary);
        assert!(csv.starts_with("\"Analytics Summary\""));
        assert!(csv.contains("Date,Views,Unique Visitors"));
        assert!(csv.contains("\"Top Pages\""));
        assert!(csv.contains("\"/\",1"));
    }

    #[tokio::test]
    async fn test_sessions_pagination() {
        let (storage, _td) = create_temp_storage().await;
        let tracker = Tracker::new(storage.clone(), None);

        for i in 0..5 {
            tracker
                .track_page_view(view("/", None), &format!("203.0.113.{}", i), UA)
                .await
                .unwrap();
        }

        let aggregator = Aggregator::new(storage);
        let range = DateRange::last_days(1, SUMMARY_MAX_DAYS).unwrap();

        let page = aggregator.sessions(range, 0, 2).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.sessions.len(), 2);
        assert_eq!(page.page_size, 2);

        let last = aggregator.sessions(range, 2, 2).await.unwrap();
        assert_eq!(last.sessions.len(), 1);
    }
}

mod retention_tests {
    use super::*;

    async fn seed_old_rows(storage: &Arc<Storage>, count: usize) {
        let db = storage.get_db();
        let old = Utc::now() - Duration::days(120);

        for i in 0..count {
            analytics_event::ActiveModel {
                page_url: Set("/old".to_string()),
                session_id: Set(format!("oldsession{:06x}", i)),
                created_at: Set(old),
                ..Default::default()
            }
            .insert(db)
            .await
            .unwrap();

            page_view::ActiveModel {
                page_url: Set("/old".to_string()),
                session_id: Set(format!("oldsession{:06x}", i)),
                created_at: Set(old),
                ..Default::default()
            }
            .insert(db)
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_dry_run_counts_without_deleting() {
        let (storage, _td) = create_temp_storage().await;
        seed_old_rows(&storage, 3).await;

        let task = RetentionTask::new(storage.clone(), 30);
        let options = CleanupOptions {
            retention_days: 30,
            dry_run: true,
            aggressive: false,
            compact: false,
        };

        let report = task.run_cleanup(&options).await.unwrap();
        assert!(report.dry_run);
        assert_eq!(report.events_deleted, 3);
        assert_eq!(report.page_views_deleted, 3);
        assert!(report.estimated_kb_after < report.estimated_kb_before);

        // Nothing actually deleted
        let db = storage.get_db();
        assert_eq!(analytics_event::Entity::find().count(db).await.unwrap(), 3);
        assert_eq!(page_view::Entity::find().count(db).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_live_cleanup_spares_recent_rows() {
        let (storage, _td) = create_temp_storage().await;
        seed_old_rows(&storage, 3).await;

        let tracker = Tracker::new(storage.clone(), None);
        tracker
            .track_page_view(view("/fresh", None), "203.0.113.7", UA)
            .await
            .unwrap();

        let task = RetentionTask::new(storage.clone(), 30);
        let options = CleanupOptions {
            retention_days: 30,
            dry_run: false,
            aggressive: false,
            compact: true,
        };

        let report = task.run_cleanup(&options).await.unwrap();
        assert_eq!(report.events_deleted, 3);
        assert_eq!(report.page_views_deleted, 3);
        assert!(report.compacted);

        let db = storage.get_db();
        assert_eq!(analytics_event::Entity::find().count(db).await.unwrap(), 1);
        assert_eq!(page_view::Entity::find().count(db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_aggressive_dedup_keeps_first_view() {
        let (storage, _td) = create_temp_storage().await;
        let db = storage.get_db();
        let base = Utc::now() - Duration::minutes(5);

        // Three views of the same page in the same session within 60s,
        // plus one outside the window
        for offset in [0i64, 10, 20, 120] {
            page_view::ActiveModel {
                page_url: Set("/repeat".to_string()),
                session_id: Set("dupsession000001".to_string()),
                created_at: Set(base + Duration::seconds(offset)),
                ..Default::default()
            }
            .insert(db)
            .await
            .unwrap();
        }

        let task = RetentionTask::new(storage.clone(), 30);
        let options = CleanupOptions {
            retention_days: 30,
            dry_run: false,
            aggressive: true,
            compact: false,
        };

        let report = task.run_cleanup(&options).await.unwrap();
        assert_eq!(report.duplicates_removed, 2);
        assert_eq!(page_view::Entity::find().count(db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_retention_bounds_rejected() {
        let (storage, _td) = create_temp_storage().await;
        let task = RetentionTask::new(storage, 30);

        for days in [29, 1096] {
            let options = CleanupOptions {
                retention_days: days,
                dry_run: true,
                aggressive: false,
                compact: false,
            };
            assert!(task.run_cleanup(&options).await.is_err());
        }
    }
}
