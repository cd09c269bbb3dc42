//! Admin API route configuration

use actix_web::web;

use super::analytics::{export_analytics, get_realtime, get_sessions, get_summary, run_cleanup};
use super::auth::{
    login, login_rate_limiter, logout, refresh_rate_limiter, refresh_token, verify_token,
};
use super::contacts::{delete_contact, delete_contacts, list_contacts, update_contact_status};
use super::files::delete_files;
use super::profile::{get_profile, update_profile};
use super::projects::{
    bulk_project_status, create_project, delete_project, delete_projects, get_project,
    list_projects, reorder_projects, update_project,
};
use super::stream::live_stream;

/// Auth routes `/auth`
pub fn auth_routes() -> actix_web::Scope {
    web::scope("/auth")
        .route("/login", web::post().to(login).wrap(login_rate_limiter()))
        .route(
            "/refresh",
            web::post().to(refresh_token).wrap(refresh_rate_limiter()),
        )
        .route("/logout", web::post().to(logout))
        .route("/verify", web::get().to(verify_token))
}

/// Contact inbox routes `/contacts`
pub fn contact_routes() -> actix_web::Scope {
    web::scope("/contacts")
        .route("", web::get().to(list_contacts))
        .route("", web::delete().to(delete_contacts))
        .route("/{id}/status", web::put().to(update_contact_status))
        .route("/{id}", web::delete().to(delete_contact))
}

/// Project routes `/projects`
///
/// Bulk routes must come before `/{id}`.
pub fn project_routes() -> actix_web::Scope {
    web::scope("/projects")
        .route("", web::get().to(list_projects))
        .route("", web::post().to(create_project))
        .route("", web::delete().to(delete_projects))
        .route("/order", web::put().to(reorder_projects))
        .route("/status", web::put().to(bulk_project_status))
        .route("/{id}", web::get().to(get_project))
        .route("/{id}", web::put().to(update_project))
        .route("/{id}", web::delete().to(delete_project))
}

/// Analytics routes `/analytics`
pub fn analytics_routes() -> actix_web::Scope {
    web::scope("/analytics")
        .route("/summary", web::get().to(get_summary))
        .route("/realtime", web::get().to(get_realtime))
        .route("/sessions", web::get().to(get_sessions))
        .route("/export", web::get().to(export_analytics))
        .route("/cleanup", web::post().to(run_cleanup))
        .route("/live", web::get().to(live_stream))
}

/// Profile routes `/profile`
pub fn profile_routes() -> actix_web::Scope {
    web::scope("/profile")
        .route("", web::get().to(get_profile))
        .route("", web::put().to(update_profile))
}

/// File proxy routes `/files`
pub fn file_routes() -> actix_web::Scope {
    web::scope("/files").route("", web::delete().to(delete_files))
}

/// Admin API v1 routes
pub fn admin_v1_routes() -> actix_web::Scope {
    web::scope("/v1")
        .service(auth_routes())
        .service(contact_routes())
        .service(project_routes())
        .service(analytics_routes())
        .service(profile_routes())
        .service(file_routes())
}
