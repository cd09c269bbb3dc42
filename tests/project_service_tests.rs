//! ProjectService integration tests
//!
//! Slug derivation, uniqueness, public visibility, reorder rollback and
//! the bulk operations, all against a temp sqlite database.

use std::sync::{Arc, Once};

use tempfile::TempDir;

use folio_server::config::init_config;
use folio_server::services::{NewProject, ProjectPatch, ProjectService, PublishedFilter};
use folio_server::storage::Storage;

static INIT: Once = Once::new();

fn init_static_config() {
    INIT.call_once(|| {
        init_config();
    });
}

async fn create_temp_service() -> (ProjectService, TempDir) {
    init_static_config();
    let td = TempDir::new().unwrap();
    let path = td.path().join("project_test.db");
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let storage = Arc::new(Storage::connect(&url).await.unwrap());
    (ProjectService::new(storage), td)
}

fn new_project(title: &str) -> NewProject {
    NewProject {
        title: title.to_string(),
        summary: Some("short".to_string()),
        description: None,
        technologies: vec!["rust".to_string()],
        image_urls: Vec::new(),
        live_url: None,
        source_url: None,
        featured: false,
        status: None,
    }
}

mod create_tests {
    use super::*;

    #[tokio::test]
    async fn test_slug_derived_from_title() {
        let (svc, _td) = create_temp_service().await;

        let project = svc.create(new_project("Hello, World!")).await.unwrap();
        assert_eq!(project.slug, "hello-world");
        assert_eq!(project.status, "DRAFT");
        assert_eq!(project.display_order, 1);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let (svc, _td) = create_temp_service().await;

        svc.create(new_project("My Project")).await.unwrap();
        let err = svc.create(new_project("My   Project")).await.unwrap_err();
        assert!(err.message().contains("already exists"), "got: {}", err.message());
    }

    #[tokio::test]
    async fn test_symbol_only_title_rejected() {
        let (svc, _td) = create_temp_service().await;
        assert!(svc.create(new_project("!!! ???")).await.is_err());
    }

    #[tokio::test]
    async fn test_display_order_appends() {
        let (svc, _td) = create_temp_service().await;

        let first = svc.create(new_project("First")).await.unwrap();
        let second = svc.create(new_project("Second")).await.unwrap();
        assert_eq!(first.display_order, 1);
        assert_eq!(second.display_order, 2);
    }
}

mod visibility_tests {
    use super::*;

    #[tokio::test]
    async fn test_public_listing_excludes_drafts() {
        let (svc, _td) = create_temp_service().await;

        let draft = svc.create(new_project("Draft Project")).await.unwrap();
        let published = svc.create(new_project("Published Project")).await.unwrap();
        svc.update(
            published.id,
            ProjectPatch {
                status: Some("PUBLISHED".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let public = svc.list_published().await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].id, published.id);

        let all = svc.list_all().await.unwrap();
        assert_eq!(all.len(), 2);

        assert!(svc.get_published_by_slug("published-project").await.is_ok());
        assert!(svc.get_published_by_slug(&draft.slug).await.is_err());
    }

    #[tokio::test]
    async fn test_published_filters_and_pagination() {
        let (svc, _td) = create_temp_service().await;

        let mut featured = new_project("Featured One");
        featured.featured = true;
        featured.status = Some("PUBLISHED".to_string());
        svc.create(featured).await.unwrap();

        let mut plain = new_project("Plain One");
        plain.technologies = vec!["actix".to_string()];
        plain.status = Some("PUBLISHED".to_string());
        svc.create(plain).await.unwrap();

        let (only_featured, total) = svc
            .list_published_filtered(
                PublishedFilter {
                    featured: Some(true),
                    technology: None,
                },
                0,
                20,
            )
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(only_featured[0].slug, "featured-one");

        let (by_tech, total) = svc
            .list_published_filtered(
                PublishedFilter {
                    featured: None,
                    technology: Some("Actix".to_string()),
                },
                0,
                20,
            )
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(by_tech[0].slug, "plain-one");

        let (second_page, total) = svc
            .list_published_filtered(PublishedFilter::default(), 1, 1)
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].slug, "plain-one");
    }

    #[tokio::test]
    async fn test_title_change_rederives_slug() {
        let (svc, _td) = create_temp_service().await;

        let project = svc.create(new_project("Old Name")).await.unwrap();
        let updated = svc
            .update(
                project.id,
                ProjectPatch {
                    title: Some("New Name".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.slug, "new-name");
    }
}

mod bulk_tests {
    use super::*;

    #[tokio::test]
    async fn test_reorder_missing_id_rolls_back() {
        let (svc, _td) = create_temp_service().await;

        let a = svc.create(new_project("Alpha")).await.unwrap();
        let b = svc.create(new_project("Beta")).await.unwrap();

        let err = svc
            .reorder(vec![(a.id, 5), (9999, 1)])
            .await
            .unwrap_err();
        assert!(err.message().contains("not found"), "got: {}", err.message());

        // The transaction rolled back, original order is intact
        let current = svc.get(a.id).await.unwrap();
        assert_eq!(current.display_order, a.display_order);

        let updated = svc.reorder(vec![(a.id, 2), (b.id, 1)]).await.unwrap();
        assert_eq!(updated, 2);
        assert_eq!(svc.list_all().await.unwrap()[0].id, b.id);
    }

    #[tokio::test]
    async fn test_bulk_status_change() {
        let (svc, _td) = create_temp_service().await;

        let a = svc.create(new_project("Alpha")).await.unwrap();
        let b = svc.create(new_project("Beta")).await.unwrap();

        let changed = svc
            .bulk_status(vec![a.id, b.id], "PUBLISHED")
            .await
            .unwrap();
        assert_eq!(changed, 2);
        assert_eq!(svc.list_published().await.unwrap().len(), 2);

        assert!(svc.bulk_status(vec![a.id], "published").await.is_err());
        assert!(svc.bulk_status(Vec::new(), "DRAFT").await.is_err());
    }

    #[tokio::test]
    async fn test_bulk_delete() {
        let (svc, _td) = create_temp_service().await;

        let a = svc.create(new_project("Alpha")).await.unwrap();
        let b = svc.create(new_project("Beta")).await.unwrap();
        let c = svc.create(new_project("Gamma")).await.unwrap();

        let deleted = svc.delete_many(vec![a.id, b.id]).await.unwrap();
        assert_eq!(deleted, 2);

        let remaining = svc.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, c.id);
    }
}
