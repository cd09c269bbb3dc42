//! Admin API service module
//!
//! Everything under /admin/v1: auth, contact inbox, project CRUD,
//! profile, analytics reporting and the live stream, upload proxy.

pub mod analytics;
pub mod auth;
mod contacts;
mod files;
mod helpers;
pub mod profile;
pub mod projects;
pub mod routes;
pub mod stream;
mod types;

pub use types::*;

pub use helpers::{
    CookieBuilder, api_result, error_from_folio, error_response, success_message,
    success_response, success_with_message,
};

pub use auth::{login, logout, refresh_token, verify_token};
