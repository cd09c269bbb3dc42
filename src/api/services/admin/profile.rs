//! Admin profile endpoints

use actix_web::{Responder, Result as ActixResult, web};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::services::project_service::decode_string_list;
use crate::services::{ProfilePatch, ProfileService};

use super::helpers::{error_from_folio, error_response, success_response};
use super::types::{ProfileItem, UpdateProfile};

use actix_web::http::StatusCode;
use migration::entities::profile;

pub(crate) fn to_item(model: profile::Model) -> ProfileItem {
    let social_links: BTreeMap<String, String> =
        serde_json::from_str(&model.social_links).unwrap_or_default();

    ProfileItem {
        display_name: model.display_name,
        headline: model.headline,
        bio: model.bio,
        skills: decode_string_list(&model.skills),
        social_links,
        email: model.email,
        location: model.location,
        updated_at: model.updated_at.to_rfc3339(),
    }
}

/// GET /admin/v1/profile
pub async fn get_profile(service: web::Data<Arc<ProfileService>>) -> ActixResult<impl Responder> {
    match service.get().await {
        Ok(Some(model)) => Ok(success_response(to_item(model))),
        Ok(None) => Ok(error_response(
            StatusCode::NOT_FOUND,
            "Profile has not been created yet",
        )),
        Err(e) => Ok(error_from_folio(&e)),
    }
}

/// PUT /admin/v1/profile - upsert
pub async fn update_profile(
    body: web::Json<UpdateProfile>,
    service: web::Data<Arc<ProfileService>>,
) -> ActixResult<impl Responder> {
    let body = body.into_inner();
    let patch = ProfilePatch {
        display_name: body.display_name,
        headline: body.headline,
        bio: body.bio,
        skills: body.skills,
        social_links: body.social_links,
        email: body.email,
        location: body.location,
    };

    match service.update(patch).await {
        Ok(model) => Ok(success_response(to_item(model))),
        Err(e) => Ok(error_from_folio(&e)),
    }
}
