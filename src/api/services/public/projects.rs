//! Public project endpoints, published projects only

use actix_web::{HttpResponse, Result as ActixResult, web};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ts_rs::TS;

use crate::api::services::admin::projects::to_item;
use crate::api::services::admin::{
    PaginationInfo, ProjectItem, error_from_folio, success_response,
};
use crate::services::{ProjectService, PublishedFilter};

const TS_EXPORT_PATH: &str = "../dashboard/src/services/types.generated.ts";

#[derive(Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct PublicProjectsQuery {
    pub featured: Option<bool>,
    pub technology: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Serialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct PublicProjectList {
    pub projects: Vec<ProjectItem>,
    pub pagination: PaginationInfo,
}

/// GET /api/projects
pub async fn list_projects(
    query: web::Query<PublicProjectsQuery>,
    service: web::Data<Arc<ProjectService>>,
) -> ActixResult<HttpResponse> {
    let query = query.into_inner();
    let page = query.page.unwrap_or(0);
    let page_size = query.page_size.unwrap_or(20).clamp(1, 100);

    let filter = PublishedFilter {
        featured: query.featured,
        technology: query.technology,
    };

    match service.list_published_filtered(filter, page, page_size).await {
        Ok((projects, total)) => Ok(success_response(PublicProjectList {
            projects: projects.into_iter().map(to_item).collect(),
            pagination: PaginationInfo {
                page,
                page_size,
                total,
                total_pages: total.div_ceil(page_size),
            },
        })),
        Err(e) => Ok(error_from_folio(&e)),
    }
}

/// GET /api/projects/{slug} - drafts respond 404, same as missing
pub async fn get_project(
    path: web::Path<String>,
    service: web::Data<Arc<ProjectService>>,
) -> ActixResult<HttpResponse> {
    match service.get_published_by_slug(&path.into_inner()).await {
        Ok(project) => Ok(success_response(to_item(project))),
        Err(e) => Ok(error_from_folio(&e)),
    }
}
