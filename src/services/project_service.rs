//! Project CRUD and bulk operations
//!
//! Slugs are derived from titles and must stay unique. Bulk operations
//! run inside one transaction: either every row changes or none do.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, sea_query::Expr,
};
use tracing::info;

use crate::errors::{FolioError, Result};
use crate::storage::Storage;
use crate::utils::slugify;

use migration::entities::project;

pub const PROJECT_STATUSES: [&str; 2] = ["DRAFT", "PUBLISHED"];

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub title: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub technologies: Vec<String>,
    pub image_urls: Vec<String>,
    pub live_url: Option<String>,
    pub source_url: Option<String>,
    pub featured: bool,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub image_urls: Option<Vec<String>>,
    pub live_url: Option<String>,
    pub source_url: Option<String>,
    pub featured: Option<bool>,
    pub status: Option<String>,
}

/// Filters for the public project listing
#[derive(Debug, Clone, Default)]
pub struct PublishedFilter {
    pub featured: Option<bool>,
    pub technology: Option<String>,
}

pub struct ProjectService {
    storage: Arc<Storage>,
}

impl ProjectService {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn create(&self, new: NewProject) -> Result<project::Model> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(FolioError::validation("title must not be empty"));
        }

        let slug = slugify(title);
        if slug.is_empty() {
            return Err(FolioError::validation(
                "title must contain at least one alphanumeric character",
            ));
        }

        let status = match new.status.as_deref() {
            Some(s) => {
                validate_status(s)?;
                s.to_string()
            }
            None => "DRAFT".to_string(),
        };

        let db = self.storage.get_db();

        let existing = project::Entity::find()
            .filter(project::Column::Slug.eq(&slug))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(FolioError::duplicate_record(format!(
                "Project with slug '{}' already exists",
                slug
            )));
        }

        // New projects go to the end of the display order
        let max_order: Option<i32> = project::Entity::find()
            .select_only()
            .column_as(project::Column::DisplayOrder.max(), "max_order")
            .into_tuple()
            .one(db)
            .await?
            .flatten();

        let now = Utc::now();
        let model = project::ActiveModel {
            slug: Set(slug),
            title: Set(title.to_string()),
            summary: Set(new.summary),
            description: Set(new.description),
            technologies: Set(serde_json::to_string(&new.technologies)?),
            image_urls: Set(serde_json::to_string(&new.image_urls)?),
            live_url: Set(new.live_url),
            source_url: Set(new.source_url),
            featured: Set(new.featured),
            status: Set(status),
            display_order: Set(max_order.unwrap_or(0) + 1),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!("Project {} created ({})", model.id, model.slug);
        Ok(model)
    }

    pub async fn update(&self, id: i64, patch: ProjectPatch) -> Result<project::Model> {
        let db = self.storage.get_db();

        let existing = project::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| FolioError::not_found(format!("Project {} not found", id)))?;

        let mut model: project::ActiveModel = existing.into();

        if let Some(title) = &patch.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(FolioError::validation("title must not be empty"));
            }
            let slug = slugify(title);
            if slug.is_empty() {
                return Err(FolioError::validation(
                    "title must contain at least one alphanumeric character",
                ));
            }

            let clash = project::Entity::find()
                .filter(project::Column::Slug.eq(&slug))
                .filter(project::Column::Id.ne(id))
                .one(db)
                .await?;
            if clash.is_some() {
                return Err(FolioError::duplicate_record(format!(
                    "Project with slug '{}' already exists",
                    slug
                )));
            }

            model.title = Set(title.to_string());
            model.slug = Set(slug);
        }

        if let Some(status) = &patch.status {
            validate_status(status)?;
            model.status = Set(status.clone());
        }
        if let Some(summary) = patch.summary {
            model.summary = Set(Some(summary));
        }
        if let Some(description) = patch.description {
            model.description = Set(Some(description));
        }
        if let Some(technologies) = patch.technologies {
            model.technologies = Set(serde_json::to_string(&technologies)?);
        }
        if let Some(image_urls) = patch.image_urls {
            model.image_urls = Set(serde_json::to_string(&image_urls)?);
        }
        if let Some(live_url) = patch.live_url {
            model.live_url = Set(Some(live_url));
        }
        if let Some(source_url) = patch.source_url {
            model.source_url = Set(Some(source_url));
        }
        if let Some(featured) = patch.featured {
            model.featured = Set(featured);
        }

        model.updated_at = Set(Utc::now());

        Ok(model.update(db).await?)
    }

    pub async fn get(&self, id: i64) -> Result<project::Model> {
        project::Entity::find_by_id(id)
            .one(self.storage.get_db())
            .await?
            .ok_or_else(|| FolioError::not_found(format!("Project {} not found", id)))
    }

    /// Public lookup: published projects only
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<project::Model> {
        project::Entity::find()
            .filter(project::Column::Slug.eq(slug))
            .filter(project::Column::Status.eq("PUBLISHED"))
            .one(self.storage.get_db())
            .await?
            .ok_or_else(|| FolioError::not_found(format!("Project '{}' not found", slug)))
    }

    pub async fn list_all(&self) -> Result<Vec<project::Model>> {
        Ok(project::Entity::find()
            .order_by_asc(project::Column::DisplayOrder)
            .order_by_asc(project::Column::Id)
            .all(self.storage.get_db())
            .await?)
    }

    pub async fn list_published(&self) -> Result<Vec<project::Model>> {
        Ok(project::Entity::find()
            .filter(project::Column::Status.eq("PUBLISHED"))
            .order_by_asc(project::Column::DisplayOrder)
            .order_by_asc(project::Column::Id)
            .all(self.storage.get_db())
            .await?)
    }

    /// Public listing with optional filters and pagination.
    ///
    /// The technology filter matches against the decoded JSON array, so
    /// it runs in memory; a portfolio has tens of projects, not millions.
    pub async fn list_published_filtered(
        &self,
        filter: PublishedFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<project::Model>, u64)> {
        let page_size = page_size.clamp(1, 100);

        let mut query = project::Entity::find().filter(project::Column::Status.eq("PUBLISHED"));
        if let Some(featured) = filter.featured {
            query = query.filter(project::Column::Featured.eq(featured));
        }

        let mut models = query
            .order_by_asc(project::Column::DisplayOrder)
            .order_by_asc(project::Column::Id)
            .all(self.storage.get_db())
            .await?;

        if let Some(technology) = &filter.technology {
            models.retain(|m| {
                decode_string_list(&m.technologies)
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(technology))
            });
        }

        let total = models.len() as u64;
        let start = page.saturating_mul(page_size) as usize;
        let page_models = models
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();

        Ok((page_models, total))
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let deleted = project::Entity::delete_by_id(id)
            .exec(self.storage.get_db())
            .await?
            .rows_affected;

        if deleted == 0 {
            return Err(FolioError::not_found(format!("Project {} not found", id)));
        }
        Ok(())
    }

    /// Reorder in one transaction; a missing id rolls everything back
    pub async fn reorder(&self, items: Vec<(i64, i32)>) -> Result<u64> {
        if items.is_empty() {
            return Err(FolioError::validation("items must not be empty"));
        }

        let txn = self.storage.get_db().begin().await?;

        let mut updated = 0u64;
        for (id, display_order) in items {
            let existing = project::Entity::find_by_id(id).one(&txn).await?;
            let Some(existing) = existing else {
                txn.rollback().await?;
                return Err(FolioError::not_found(format!("Project {} not found", id)));
            };

            let mut model: project::ActiveModel = existing.into();
            model.display_order = Set(display_order);
            model.updated_at = Set(Utc::now());
            model.update(&txn).await?;
            updated += 1;
        }

        txn.commit().await?;

        info!("Reordered {} project(s)", updated);
        Ok(updated)
    }

    /// Bulk status change in one transaction
    pub async fn bulk_status(&self, ids: Vec<i64>, status: &str) -> Result<u64> {
        if ids.is_empty() {
            return Err(FolioError::validation("ids must not be empty"));
        }
        validate_status(status)?;

        let txn = self.storage.get_db().begin().await?;

        let updated = project::Entity::update_many()
            .col_expr(project::Column::Status, Expr::value(status))
            .col_expr(project::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(project::Column::Id.is_in(ids))
            .exec(&txn)
            .await?
            .rows_affected;

        txn.commit().await?;

        info!("Bulk status change: {} project(s) -> {}", updated, status);
        Ok(updated)
    }

    /// Bulk delete in one transaction
    pub async fn delete_many(&self, ids: Vec<i64>) -> Result<u64> {
        if ids.is_empty() {
            return Err(FolioError::validation("ids must not be empty"));
        }

        let txn = self.storage.get_db().begin().await?;

        let deleted = project::Entity::delete_many()
            .filter(project::Column::Id.is_in(ids))
            .exec(&txn)
            .await?
            .rows_affected;

        txn.commit().await?;

        info!("Bulk-deleted {} project(s)", deleted);
        Ok(deleted)
    }
}

fn validate_status(status: &str) -> Result<()> {
    if PROJECT_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(FolioError::validation(format!(
            "Invalid project status: {} (expected one of {})",
            status,
            PROJECT_STATUSES.join(", ")
        )))
    }
}

/// Decode a JSON string-array column, tolerating legacy empty values
pub fn decode_string_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    serde_json::from_str(raw).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_validation() {
        assert!(validate_status("DRAFT").is_ok());
        assert!(validate_status("PUBLISHED").is_ok());
        assert!(validate_status("ARCHIVED").is_err());
        assert!(validate_status("draft").is_err());
    }

    #[test]
    fn test_decode_string_list() {
        assert_eq!(
            decode_string_list(r#"["rust","actix"]"#),
            vec!["rust".to_string(), "actix".to_string()]
        );
        assert!(decode_string_list("").is_empty());
        assert!(decode_string_list("not json").is_empty());
    }
}
