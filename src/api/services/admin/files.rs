//! Upload provider proxy endpoint

use actix_web::{HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::services::UploadService;

use super::helpers::{error_from_folio, success_response};
use super::types::DeleteFilesRequest;

/// DELETE /admin/v1/files - provider failure surfaces as 503
pub async fn delete_files(
    body: web::Json<DeleteFilesRequest>,
    service: web::Data<Arc<UploadService>>,
) -> ActixResult<HttpResponse> {
    match service.delete_files(body.into_inner().keys).await {
        Ok(deleted) => Ok(success_response(serde_json::json!({ "deleted": deleted }))),
        Err(e) => Ok(error_from_folio(&e)),
    }
}
