//! Admin API types

use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const TS_EXPORT_PATH: &str = "../dashboard/src/services/types.generated.ts";

/// Uniform response envelope for every JSON endpoint
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct LoginCredentials {
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct PaginationInfo {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

// ============ Contacts ============

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct GetContactsQuery {
    pub status: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UpdateContactStatus {
    pub status: String,
}

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct BulkDeleteRequest {
    pub ids: Vec<i64>,
}

#[derive(Serialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ContactItem {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub status: String,
    pub created_at: String,
}

// ============ Projects ============

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct PostProject {
    pub title: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub live_url: Option<String>,
    pub source_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub status: Option<String>,
}

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UpdateProject {
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

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ReorderItem {
    pub id: i64,
    pub display_order: i32,
}

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ReorderRequest {
    pub items: Vec<ReorderItem>,
}

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct BulkStatusRequest {
    pub ids: Vec<i64>,
    pub status: String,
}

#[derive(Serialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ProjectItem {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub technologies: Vec<String>,
    pub image_urls: Vec<String>,
    pub live_url: Option<String>,
    pub source_url: Option<String>,
    pub featured: bool,
    pub status: String,
    pub display_order: i32,
    pub created_at: String,
    pub updated_at: String,
}

// ============ Profile ============

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UpdateProfile {
    pub display_name: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub social_links: Option<std::collections::BTreeMap<String, String>>,
    pub email: Option<String>,
    pub location: Option<String>,
}

#[derive(Serialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ProfileItem {
    pub display_name: String,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub social_links: std::collections::BTreeMap<String, String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub updated_at: String,
}

// ============ Files ============

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct DeleteFilesRequest {
    pub keys: Vec<String>,
}

// ============ Analytics queries ============

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct SummaryQuery {
    pub days: Option<i64>,
    pub top_n: Option<u64>,
}

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ExportQuery {
    pub days: Option<i64>,
    pub format: Option<String>,
}

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct SessionsQuery {
    pub days: Option<i64>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct LiveQuery {
    pub interval_ms: Option<u64>,
}
