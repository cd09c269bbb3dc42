//! Analytics tables migration
//!
//! Creates the append-only event tables (analytics_events, page_views,
//! web_vitals, client_errors) and the visitor_sessions table keyed by the
//! IP+UA fingerprint hash.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AnalyticsEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AnalyticsEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AnalyticsEvents::PageUrl).text().not_null())
                    .col(ColumnDef::new(AnalyticsEvents::PageTitle).text().null())
                    .col(ColumnDef::new(AnalyticsEvents::Referrer).text().null())
                    .col(ColumnDef::new(AnalyticsEvents::UserAgent).text().null())
                    .col(
                        ColumnDef::new(AnalyticsEvents::IpAddress)
                            .string_len(45)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AnalyticsEvents::SessionId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AnalyticsEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PageViews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PageViews::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PageViews::PageUrl).text().not_null())
                    .col(ColumnDef::new(PageViews::Referrer).text().null())
                    .col(
                        ColumnDef::new(PageViews::SessionId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PageViews::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VisitorSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VisitorSessions::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VisitorSessions::Device)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(VisitorSessions::Browser)
                            .string_len(64)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(VisitorSessions::Country)
                            .string_len(64)
                            .null(),
                    )
                    .col(ColumnDef::new(VisitorSessions::City).string_len(100).null())
                    .col(
                        ColumnDef::new(VisitorSessions::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VisitorSessions::LastSeenAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VisitorSessions::EndedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(VisitorSessions::PageViews)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WebVitals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WebVitals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WebVitals::Name).string_len(32).not_null())
                    .col(ColumnDef::new(WebVitals::Value).double().not_null())
                    .col(ColumnDef::new(WebVitals::VitalId).string_len(64).not_null())
                    .col(ColumnDef::new(WebVitals::PageUrl).text().not_null())
                    .col(ColumnDef::new(WebVitals::SessionId).string_len(32).null())
                    .col(
                        ColumnDef::new(WebVitals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ClientErrors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClientErrors::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClientErrors::Message).text().not_null())
                    .col(ColumnDef::new(ClientErrors::PageUrl).text().not_null())
                    .col(ColumnDef::new(ClientErrors::Stack).text().null())
                    .col(ColumnDef::new(ClientErrors::SessionId).string_len(32).null())
                    .col(
                        ColumnDef::new(ClientErrors::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClientErrors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClientErrors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WebVitals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VisitorSessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PageViews::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AnalyticsEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum AnalyticsEvents {
    #[sea_orm(iden = "analytics_events")]
    Table,
    Id,
    PageUrl,
    PageTitle,
    Referrer,
    UserAgent,
    IpAddress,
    SessionId,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum PageViews {
    #[sea_orm(iden = "page_views")]
    Table,
    Id,
    PageUrl,
    Referrer,
    SessionId,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum VisitorSessions {
    #[sea_orm(iden = "visitor_sessions")]
    Table,
    Id,
    Device,
    Browser,
    Country,
    City,
    StartedAt,
    LastSeenAt,
    EndedAt,
    PageViews,
}

#[derive(DeriveIden)]
pub(crate) enum WebVitals {
    #[sea_orm(iden = "web_vitals")]
    Table,
    Id,
    Name,
    Value,
    VitalId,
    PageUrl,
    SessionId,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum ClientErrors {
    #[sea_orm(iden = "client_errors")]
    Table,
    Id,
    Message,
    PageUrl,
    Stack,
    SessionId,
    OccurredAt,
    CreatedAt,
}
