//! Portfolio project entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Derived from title, unique
    #[sea_orm(unique)]
    pub slug: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// JSON array of technology names
    #[sea_orm(column_type = "Text")]
    pub technologies: String,
    /// JSON array of image URLs
    #[sea_orm(column_type = "Text")]
    pub image_urls: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub live_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub source_url: Option<String>,
    pub featured: bool,
    /// DRAFT or PUBLISHED
    pub status: String,
    /// Dense admin-assigned display rank
    pub display_order: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
