//! Site-owner profile, a single-row table fetched via find-first

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub display_name: String,
    pub headline: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,
    /// JSON array of skill names
    #[sea_orm(column_type = "Text")]
    pub skills: String,
    /// JSON object of social links
    #[sea_orm(column_type = "Text")]
    pub social_links: String,
    pub email: Option<String>,
    pub location: Option<String>,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
