//! Admin project CRUD and bulk operations

use actix_web::{HttpResponse, Responder, Result as ActixResult, web};
use std::sync::Arc;

use crate::services::project_service::decode_string_list;
use crate::services::{NewProject, ProjectPatch, ProjectService};

use super::helpers::{error_from_folio, success_response, success_with_message};
use super::types::{
    BulkDeleteRequest, BulkStatusRequest, PostProject, ProjectItem, ReorderRequest, UpdateProject,
};

use migration::entities::project;

pub(crate) fn to_item(model: project::Model) -> ProjectItem {
    ProjectItem {
        id: model.id,
        slug: model.slug,
        title: model.title,
        summary: model.summary,
        description: model.description,
        technologies: decode_string_list(&model.technologies),
        image_urls: decode_string_list(&model.image_urls),
        live_url: model.live_url,
        source_url: model.source_url,
        featured: model.featured,
        status: model.status,
        display_order: model.display_order,
        created_at: model.created_at.to_rfc3339(),
        updated_at: model.updated_at.to_rfc3339(),
    }
}

/// GET /admin/v1/projects - drafts included
pub async fn list_projects(
    service: web::Data<Arc<ProjectService>>,
) -> ActixResult<impl Responder> {
    match service.list_all().await {
        Ok(projects) => Ok(success_response(
            projects.into_iter().map(to_item).collect::<Vec<_>>(),
        )),
        Err(e) => Ok(error_from_folio(&e)),
    }
}

/// POST /admin/v1/projects
pub async fn create_project(
    body: web::Json<PostProject>,
    service: web::Data<Arc<ProjectService>>,
) -> ActixResult<impl Responder> {
    let body = body.into_inner();
    let new = NewProject {
        title: body.title,
        summary: body.summary,
        description: body.description,
        technologies: body.technologies,
        image_urls: body.image_urls,
        live_url: body.live_url,
        source_url: body.source_url,
        featured: body.featured,
        status: body.status,
    };

    match service.create(new).await {
        Ok(model) => Ok(success_response(to_item(model))),
        Err(e) => Ok(error_from_folio(&e)),
    }
}

/// GET /admin/v1/projects/{id}
pub async fn get_project(
    path: web::Path<i64>,
    service: web::Data<Arc<ProjectService>>,
) -> ActixResult<impl Responder> {
    match service.get(path.into_inner()).await {
        Ok(model) => Ok(success_response(to_item(model))),
        Err(e) => Ok(error_from_folio(&e)),
    }
}

/// PUT /admin/v1/projects/{id}
pub async fn update_project(
    path: web::Path<i64>,
    body: web::Json<UpdateProject>,
    service: web::Data<Arc<ProjectService>>,
) -> ActixResult<impl Responder> {
    let body = body.into_inner();
    let patch = ProjectPatch {
        title: body.title,
        summary: body.summary,
        description: body.description,
        technologies: body.technologies,
        image_urls: body.image_urls,
        live_url: body.live_url,
        source_url: body.source_url,
        featured: body.featured,
        status: body.status,
    };

    match service.update(path.into_inner(), patch).await {
        Ok(model) => Ok(success_response(to_item(model))),
        Err(e) => Ok(error_from_folio(&e)),
    }
}

/// DELETE /admin/v1/projects/{id}
pub async fn delete_project(
    path: web::Path<i64>,
    service: web::Data<Arc<ProjectService>>,
) -> ActixResult<impl Responder> {
    match service.delete(path.into_inner()).await {
        Ok(()) => Ok(success_with_message((), "Project deleted")),
        Err(e) => Ok(error_from_folio(&e)),
    }
}

/// PUT /admin/v1/projects/order - transactional bulk reorder
pub async fn reorder_projects(
    body: web::Json<ReorderRequest>,
    service: web::Data<Arc<ProjectService>>,
) -> ActixResult<HttpResponse> {
    let items = body
        .into_inner()
        .items
        .into_iter()
        .map(|item| (item.id, item.display_order))
        .collect();

    match service.reorder(items).await {
        Ok(updated) => Ok(success_response(serde_json::json!({ "updated": updated }))),
        Err(e) => Ok(error_from_folio(&e)),
    }
}

/// PUT /admin/v1/projects/status - transactional bulk status change
pub async fn bulk_project_status(
    body: web::Json<BulkStatusRequest>,
    service: web::Data<Arc<ProjectService>>,
) -> ActixResult<HttpResponse> {
    let body = body.into_inner();

    match service.bulk_status(body.ids, &body.status).await {
        Ok(updated) => Ok(success_response(serde_json::json!({ "updated": updated }))),
        Err(e) => Ok(error_from_folio(&e)),
    }
}

/// DELETE /admin/v1/projects (bulk)
pub async fn delete_projects(
    body: web::Json<BulkDeleteRequest>,
    service: web::Data<Arc<ProjectService>>,
) -> ActixResult<HttpResponse> {
    match service.delete_many(body.into_inner().ids).await {
        Ok(deleted) => Ok(success_response(serde_json::json!({ "deleted": deleted }))),
        Err(e) => Ok(error_from_folio(&e)),
    }
}
