pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20250601_000001_content_tables;
mod m20250602_000001_analytics_tables;
mod m20250710_000001_analytics_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_content_tables::Migration),
            Box::new(m20250602_000001_analytics_tables::Migration),
            Box::new(m20250710_000001_analytics_indexes::Migration),
        ]
    }
}
