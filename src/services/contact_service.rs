//! Contact form handling: validation, honeypot, persistence, notification

use std::sync::Arc;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde::Deserialize;
use tracing::{debug, info};
use ts_rs::TS;

use crate::errors::{FolioError, Result};
use crate::storage::Storage;

use super::mailer::Mailer;
use migration::entities::contact;

const TS_EXPORT_PATH: &str = "../dashboard/src/services/types.generated.ts";

pub const CONTACT_STATUSES: [&str; 3] = ["NEW", "READ", "REPLIED"];

const MIN_NAME_LEN: usize = 2;
const MIN_MESSAGE_LEN: usize = 10;
const MAX_NAME_LEN: usize = 200;
const MAX_EMAIL_LEN: usize = 320;
const MAX_SUBJECT_LEN: usize = 300;
const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
    /// Honeypot field, hidden in the real form. Bots fill it; humans
    /// never see it.
    #[serde(default)]
    pub website: String,
}

/// Outcome of a submission; the caller returns success either way so a
/// bot cannot tell it was caught.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Persisted(i64),
    HoneypotDropped,
}

pub struct ContactService {
    storage: Arc<Storage>,
    mailer: Mailer,
}

impl ContactService {
    pub fn new(storage: Arc<Storage>, mailer: Mailer) -> Self {
        Self { storage, mailer }
    }

    pub fn validate(submission: &ContactSubmission) -> Result<()> {
        let mut missing = Vec::new();
        if submission.name.trim().is_empty() {
            missing.push("name");
        }
        if submission.email.trim().is_empty() {
            missing.push("email");
        }
        if submission.message.trim().is_empty() {
            missing.push("message");
        }
        if !missing.is_empty() {
            return Err(FolioError::validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let mut too_short = Vec::new();
        if submission.name.trim().chars().count() < MIN_NAME_LEN {
            too_short.push(format!("name must be at least {} characters", MIN_NAME_LEN));
        }
        if submission.message.trim().chars().count() < MIN_MESSAGE_LEN {
            too_short.push(format!(
                "message must be at least {} characters",
                MIN_MESSAGE_LEN
            ));
        }
        if !too_short.is_empty() {
            return Err(FolioError::validation(too_short.join("; ")));
        }

        let email = submission.email.trim();
        let valid_email = email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if !valid_email {
            return Err(FolioError::validation("Invalid email address"));
        }

        if submission.name.len() > MAX_NAME_LEN
            || submission.email.len() > MAX_EMAIL_LEN
            || submission.subject.as_deref().map(str::len).unwrap_or(0) > MAX_SUBJECT_LEN
            || submission.message.len() > MAX_MESSAGE_LEN
        {
            return Err(FolioError::validation("Field length limit exceeded"));
        }

        Ok(())
    }

    /// Validate and persist a submission; honeypot hits succeed silently
    pub async fn submit(&self, submission: ContactSubmission) -> Result<SubmissionOutcome> {
        Self::validate(&submission)?;

        if !submission.website.is_empty() {
            debug!("Honeypot triggered, dropping contact submission");
            return Ok(SubmissionOutcome::HoneypotDropped);
        }

        let now = Utc::now();
        let model = contact::ActiveModel {
            name: Set(submission.name.trim().to_string()),
            email: Set(submission.email.trim().to_string()),
            subject: Set(submission.subject.clone().filter(|s| !s.is_empty())),
            message: Set(submission.message.trim().to_string()),
            status: Set("NEW".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.storage.get_db())
        .await?;

        info!("Contact message {} received from {}", model.id, model.email);

        self.mailer.notify_contact(
            &model.name,
            &model.email,
            model.subject.as_deref(),
            &model.message,
        );

        Ok(SubmissionOutcome::Persisted(model.id))
    }

    pub async fn list(
        &self,
        status: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<contact::Model>, u64)> {
        if let Some(status) = status {
            validate_status(status)?;
        }

        let page_size = page_size.clamp(1, 100);
        let db = self.storage.get_db();

        let mut query = contact::Entity::find().order_by_desc(contact::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(contact::Column::Status.eq(status));
        }

        let paginator = query.paginate(db, page_size);
        let total = paginator.num_items().await?;
        let contacts = paginator.fetch_page(page).await?;

        Ok((contacts, total))
    }

    pub async fn update_status(&self, id: i64, status: &str) -> Result<contact::Model> {
        validate_status(status)?;

        let db = self.storage.get_db();
        let existing = contact::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| FolioError::not_found(format!("Contact {} not found", id)))?;

        let mut model: contact::ActiveModel = existing.into();
        model.status = Set(status.to_string());
        model.updated_at = Set(Utc::now());

        Ok(model.update(db).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let deleted = contact::Entity::delete_by_id(id)
            .exec(self.storage.get_db())
            .await?
            .rows_affected;

        if deleted == 0 {
            return Err(FolioError::not_found(format!("Contact {} not found", id)));
        }
        Ok(())
    }

    /// Bulk delete in one transaction, all-or-nothing
    pub async fn delete_many(&self, ids: Vec<i64>) -> Result<u64> {
        if ids.is_empty() {
            return Err(FolioError::validation("ids must not be empty"));
        }

        let db = self.storage.get_db();
        let txn = db.begin().await?;

        let deleted = contact::Entity::delete_many()
            .filter(contact::Column::Id.is_in(ids))
            .exec(&txn)
            .await?
            .rows_affected;

        txn.commit().await?;

        info!("Bulk-deleted {} contact(s)", deleted);
        Ok(deleted)
    }
}

fn validate_status(status: &str) -> Result<()> {
    if CONTACT_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(FolioError::validation(format!(
            "Invalid contact status: {} (expected one of {})",
            status,
            CONTACT_STATUSES.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_submission() -> ContactSubmission {
        ContactSubmission {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            subject: Some("Hello".to_string()),
            message: "I enjoyed your site.".to_string(),
            website: String::new(),
        }
    }

    #[test]
    fn test_valid_submission_passes() {
        assert!(ContactService::validate(&valid_submission()).is_ok());
    }

    #[test]
    fn test_missing_fields_listed() {
        let submission = ContactSubmission {
            name: String::new(),
            email: String::new(),
            subject: None,
            message: "hi".to_string(),
            website: String::new(),
        };

        let err = ContactService::validate(&submission).unwrap_err();
        let msg = err.message().to_string();
        assert!(msg.contains("name"));
        assert!(msg.contains("email"));
        assert!(!msg.contains("message"));
    }

    #[test]
    fn test_under_length_fields_rejected() {
        let mut submission = valid_submission();
        submission.name = "A".to_string();
        let err = ContactService::validate(&submission).unwrap_err();
        assert!(err.message().contains("at least 2"), "got: {}", err.message());

        let mut submission = valid_submission();
        submission.message = "short".to_string();
        let err = ContactService::validate(&submission).unwrap_err();
        assert!(
            err.message().contains("at least 10"),
            "got: {}",
            err.message()
        );

        // Both violations land in one message
        let mut submission = valid_submission();
        submission.name = "A".to_string();
        submission.message = "short".to_string();
        let msg = ContactService::validate(&submission)
            .unwrap_err()
            .message()
            .to_string();
        assert!(msg.contains("name") && msg.contains("message"), "got: {}", msg);
    }

    #[test]
    fn test_invalid_email_rejected() {
        let mut submission = valid_submission();
        submission.email = "not-an-email".to_string();
        assert!(ContactService::validate(&submission).is_err());

        submission.email = "a@b".to_string();
        assert!(ContactService::validate(&submission).is_err());
    }

    #[test]
    fn test_oversized_message_rejected() {
        let mut submission = valid_submission();
        submission.message = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert!(ContactService::validate(&submission).is_err());
    }

    #[test]
    fn test_status_validation() {
        assert!(validate_status("NEW").is_ok());
        assert!(validate_status("READ").is_ok());
        assert!(validate_status("REPLIED").is_ok());
        assert!(validate_status("ARCHIVED").is_err());
        assert!(validate_status("new").is_err());
    }
}
