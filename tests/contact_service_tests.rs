//! ContactService integration tests
//!
//! Covers submission persistence, the honeypot path, status updates,
//! and bulk deletion against a temp sqlite database.

use std::sync::{Arc, Once};

use sea_orm::EntityTrait;
use tempfile::TempDir;

use folio_server::config::init_config;
use folio_server::services::{ContactService, ContactSubmission, Mailer, SubmissionOutcome};
use folio_server::storage::Storage;
use migration::entities::contact;

static INIT: Once = Once::new();

fn init_static_config() {
    INIT.call_once(|| {
        init_config();
    });
}

async fn create_temp_storage() -> (Arc<Storage>, TempDir) {
    init_static_config();
    let td = TempDir::new().unwrap();
    let path = td.path().join("contact_test.db");
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let storage = Storage::connect(&url).await.unwrap();
    (Arc::new(storage), td)
}

fn service(storage: Arc<Storage>) -> ContactService {
    // Mail is disabled by default configuration, so no network happens
    ContactService::new(storage, Mailer::from_config())
}

fn submission(name: &str, email: &str) -> ContactSubmission {
    ContactSubmission {
        name: name.to_string(),
        email: email.to_string(),
        subject: Some("Hello".to_string()),
        message: "I liked the writeup on the projects page.".to_string(),
        website: String::new(),
    }
}

mod submit_tests {
    use super::*;

    #[tokio::test]
    async fn test_submission_persists_as_new() {
        let (storage, _td) = create_temp_storage().await;
        let svc = service(storage.clone());

        let outcome = svc.submit(submission("Ada", "ada@example.com")).await.unwrap();
        let id = match outcome {
            SubmissionOutcome::Persisted(id) => id,
            other => panic!("expected Persisted, got {:?}", other),
        };

        let row = contact::Entity::find_by_id(id)
            .one(storage.get_db())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.name, "Ada");
        assert_eq!(row.email, "ada@example.com");
        assert_eq!(row.status, "NEW");
    }

    #[tokio::test]
    async fn test_honeypot_succeeds_without_row() {
        let (storage, _td) = create_temp_storage().await;
        let svc = service(storage.clone());

        let mut sub = submission("Bot", "bot@example.com");
        sub.website = "http://spam.example".to_string();

        let outcome = svc.submit(sub).await.unwrap();
        assert_eq!(outcome, SubmissionOutcome::HoneypotDropped);

        let rows = contact::Entity::find().all(storage.get_db()).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_under_length_fields_rejected_before_insert() {
        let (storage, _td) = create_temp_storage().await;
        let svc = service(storage.clone());

        let err = svc
            .submit(submission("A", "ada@example.com"))
            .await
            .unwrap_err();
        assert!(
            err.message().contains("at least 2"),
            "got: {}",
            err.message()
        );

        let mut sub = submission("Ada", "ada@example.com");
        sub.message = "short".to_string();
        let err = svc.submit(sub).await.unwrap_err();
        assert!(
            err.message().contains("at least 10"),
            "got: {}",
            err.message()
        );

        let rows = contact::Entity::find().all(storage.get_db()).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_missing_fields_rejected_before_insert() {
        let (storage, _td) = create_temp_storage().await;
        let svc = service(storage.clone());

        let mut sub = submission("", "ada@example.com");
        sub.message = String::new();

        let err = svc.submit(sub).await.unwrap_err();
        let msg = err.message().to_string();
        assert!(msg.contains("name"), "got: {}", msg);
        assert!(msg.contains("message"), "got: {}", msg);

        let rows = contact::Entity::find().all(storage.get_db()).await.unwrap();
        assert!(rows.is_empty());
    }
}

mod inbox_tests {
    use super::*;

    #[tokio::test]
    async fn test_update_status_and_filtered_list() {
        let (storage, _td) = create_temp_storage().await;
        let svc = service(storage);

        let id = match svc.submit(submission("Ada", "ada@example.com")).await.unwrap() {
            SubmissionOutcome::Persisted(id) => id,
            other => panic!("expected Persisted, got {:?}", other),
        };
        svc.submit(submission("Grace", "grace@example.com")).await.unwrap();

        let updated = svc.update_status(id, "READ").await.unwrap();
        assert_eq!(updated.status, "READ");

        let (read_only, total) = svc.list(Some("READ"), 0, 20).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(read_only.len(), 1);
        assert_eq!(read_only[0].id, id);

        assert!(svc.update_status(id, "ARCHIVED").await.is_err());
        assert!(svc.update_status(9999, "READ").await.is_err());
    }

    #[tokio::test]
    async fn test_bulk_delete() {
        let (storage, _td) = create_temp_storage().await;
        let svc = service(storage.clone());

        let mut ids = Vec::new();
        for i in 0..3 {
            let outcome = svc
                .submit(submission(&format!("User {}", i), &format!("u{}@example.com", i)))
                .await
                .unwrap();
            if let SubmissionOutcome::Persisted(id) = outcome {
                ids.push(id);
            }
        }

        let deleted = svc.delete_many(vec![ids[0], ids[1]]).await.unwrap();
        assert_eq!(deleted, 2);

        let remaining = contact::Entity::find().all(storage.get_db()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, ids[2]);

        assert!(svc.delete_many(Vec::new()).await.is_err());
    }
}
