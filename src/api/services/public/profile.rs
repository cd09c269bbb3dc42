//! Public profile endpoint

use actix_web::{HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::services::admin::profile::to_item;
use crate::api::services::admin::{error_from_folio, error_response, success_response};
use crate::services::ProfileService;

use actix_web::http::StatusCode;

/// GET /api/profile
pub async fn get_profile(service: web::Data<Arc<ProfileService>>) -> ActixResult<HttpResponse> {
    match service.get().await {
        Ok(Some(model)) => Ok(success_response(to_item(model))),
        Ok(None) => Ok(error_response(
            StatusCode::NOT_FOUND,
            "Profile has not been created yet",
        )),
        Err(e) => Ok(error_from_folio(&e)),
    }
}
