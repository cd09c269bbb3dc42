use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "web_vitals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Metric name (LCP, FID, CLS, TTFB, ...)
    pub name: String,
    pub value: f64,
    /// Client-generated metric instance id
    pub vital_id: String,
    #[sea_orm(column_type = "Text")]
    pub page_url: String,
    pub session_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
