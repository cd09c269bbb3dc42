//! Admin contact inbox endpoints

use actix_web::{HttpResponse, Responder, Result as ActixResult, web};
use serde::Serialize;
use std::sync::Arc;
use ts_rs::TS;

use crate::services::ContactService;

use super::helpers::{error_from_folio, success_response, success_with_message};
use super::types::{
    BulkDeleteRequest, ContactItem, GetContactsQuery, PaginationInfo, TS_EXPORT_PATH,
    UpdateContactStatus,
};

use migration::entities::contact;

#[derive(Serialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ContactListResponse {
    pub contacts: Vec<ContactItem>,
    pub pagination: PaginationInfo,
}

fn to_item(model: contact::Model) -> ContactItem {
    ContactItem {
        id: model.id,
        name: model.name,
        email: model.email,
        subject: model.subject,
        message: model.message,
        status: model.status,
        created_at: model.created_at.to_rfc3339(),
    }
}

/// GET /admin/v1/contacts
pub async fn list_contacts(
    query: web::Query<GetContactsQuery>,
    service: web::Data<Arc<ContactService>>,
) -> ActixResult<impl Responder> {
    let page = query.page.unwrap_or(0);
    let page_size = query.page_size.unwrap_or(20);

    match service.list(query.status.as_deref(), page, page_size).await {
        Ok((contacts, total)) => {
            let total_pages = total.div_ceil(page_size.clamp(1, 100));
            Ok(success_response(ContactListResponse {
                contacts: contacts.into_iter().map(to_item).collect(),
                pagination: PaginationInfo {
                    page,
                    page_size: page_size.clamp(1, 100),
                    total,
                    total_pages,
                },
            }))
        }
        Err(e) => Ok(error_from_folio(&e)),
    }
}

/// PUT /admin/v1/contacts/{id}/status
pub async fn update_contact_status(
    path: web::Path<i64>,
    body: web::Json<UpdateContactStatus>,
    service: web::Data<Arc<ContactService>>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();

    match service.update_status(id, &body.status).await {
        Ok(model) => Ok(success_response(to_item(model))),
        Err(e) => Ok(error_from_folio(&e)),
    }
}

/// DELETE /admin/v1/contacts/{id}
pub async fn delete_contact(
    path: web::Path<i64>,
    service: web::Data<Arc<ContactService>>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();

    match service.delete(id).await {
        Ok(()) => Ok(success_with_message((), "Contact deleted")),
        Err(e) => Ok(error_from_folio(&e)),
    }
}

/// DELETE /admin/v1/contacts (bulk)
pub async fn delete_contacts(
    body: web::Json<BulkDeleteRequest>,
    service: web::Data<Arc<ContactService>>,
) -> ActixResult<HttpResponse> {
    match service.delete_many(body.into_inner().ids).await {
        Ok(deleted) => Ok(success_response(serde_json::json!({ "deleted": deleted }))),
        Err(e) => Ok(error_from_folio(&e)),
    }
}
