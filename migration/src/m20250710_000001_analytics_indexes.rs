//! Analytics query indexes
//!
//! Time-range filters and per-session scans dominate the aggregation
//! queries, so every event table gets a created_at index and page_views
//! additionally gets (session_id, created_at) for the visitor-flow query.

use sea_orm_migration::prelude::*;

use super::m20250602_000001_analytics_tables::{
    AnalyticsEvents, ClientErrors, PageViews, VisitorSessions, WebVitals,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_analytics_events_created_at")
                    .table(AnalyticsEvents::Table)
                    .col(AnalyticsEvents::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_page_views_created_at")
                    .table(PageViews::Table)
                    .col(PageViews::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_page_views_session_time")
                    .table(PageViews::Table)
                    .col(PageViews::SessionId)
                    .col(PageViews::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_visitor_sessions_last_seen")
                    .table(VisitorSessions::Table)
                    .col(VisitorSessions::LastSeenAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_web_vitals_created_at")
                    .table(WebVitals::Table)
                    .col(WebVitals::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_client_errors_created_at")
                    .table(ClientErrors::Table)
                    .col(ClientErrors::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_client_errors_created_at")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("idx_web_vitals_created_at").to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_visitor_sessions_last_seen")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("idx_page_views_session_time").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_page_views_created_at").to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_analytics_events_created_at")
                    .to_owned(),
            )
            .await
    }
}
