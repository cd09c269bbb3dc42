//! Public API service module
//!
//! Unauthenticated endpoints under /api: contact form, published
//! projects, profile, and the analytics ingestion routes.

pub mod contact;
pub mod profile;
pub mod projects;
pub mod tracking;

use actix_web::web;

use crate::api::middleware::ClientRateLimit;

/// Public API routes under `/api`
///
/// The contact limiter is shared across workers, so the caller builds
/// it once and hands it in.
pub fn public_routes(contact_limiter: ClientRateLimit) -> actix_web::Scope {
    web::scope("/api")
        .service(
            web::resource("/contact")
                .wrap(contact_limiter)
                .route(web::post().to(contact::submit_contact)),
        )
        .route("/projects", web::get().to(projects::list_projects))
        .route("/projects/{slug}", web::get().to(projects::get_project))
        .route("/profile", web::get().to(profile::get_profile))
        .service(
            web::scope("/analytics")
                .route("/track", web::post().to(tracking::track))
                .route("/session", web::post().to(tracking::session))
                .route("/vitals", web::post().to(tracking::vitals))
                .route("/errors", web::post().to(tracking::errors)),
        )
}
