//! Admin API helpers

use actix_web::HttpResponse;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::StatusCode;
use serde::Serialize;

use crate::api::constants;
use crate::errors::FolioError;

use super::types::ApiResponse;

/// Build a JSON success response
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok()
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse::ok(data))
}

pub fn success_with_message<T: Serialize>(data: T, message: &str) -> HttpResponse {
    HttpResponse::Ok()
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse::ok_with_message(data, message))
}

/// Success envelope carrying only a message
pub fn success_message(message: &str) -> HttpResponse {
    HttpResponse::Ok()
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse::<()>::message_only(message))
}

/// Build a JSON error response
pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse::<()>::error(message))
}

/// Map a FolioError to status + envelope; internal details are redacted
/// outside development mode
pub fn error_from_folio(err: &FolioError) -> HttpResponse {
    let status = err.http_status();
    let message = if err.is_client_safe() || !crate::config::get_config().is_production() {
        err.message().to_string()
    } else {
        "Internal server error".to_string()
    };
    error_response(status, &message)
}

/// Uniform Result to HttpResponse conversion
pub fn api_result<T, E>(result: Result<T, E>) -> HttpResponse
where
    T: Serialize,
    E: Into<FolioError>,
{
    match result {
        Ok(data) => success_response(data),
        Err(e) => {
            let err: FolioError = e.into();
            error_from_folio(&err)
        }
    }
}

/// Cookie builder for the auth endpoints
pub struct CookieBuilder {
    secure: bool,
    domain: Option<String>,
    access_token_minutes: u64,
    refresh_token_days: u64,
}

impl CookieBuilder {
    pub fn from_config() -> Self {
        let config = crate::config::get_config();

        Self {
            secure: config.api.cookie_secure,
            domain: config.api.cookie_domain.clone(),
            access_token_minutes: config.api.access_token_minutes,
            refresh_token_days: config.api.refresh_token_days,
        }
    }

    fn build_cookie_base(
        &self,
        name: String,
        value: String,
        path: String,
        max_age: actix_web::cookie::time::Duration,
    ) -> Cookie<'static> {
        let mut cookie = Cookie::new(name, value);
        cookie.set_path(path);
        cookie.set_http_only(true);
        cookie.set_secure(self.secure);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_max_age(max_age);
        if let Some(ref domain) = self.domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }

    pub fn build_access_cookie(&self, token: String) -> Cookie<'static> {
        self.build_cookie_base(
            constants::ACCESS_COOKIE_NAME.to_string(),
            token,
            "/".to_string(),
            actix_web::cookie::time::Duration::minutes(self.access_token_minutes as i64),
        )
    }

    pub fn build_refresh_cookie(&self, token: String) -> Cookie<'static> {
        let refresh_path = format!("{}/v1/auth", constants::ADMIN_PREFIX);
        self.build_cookie_base(
            constants::REFRESH_COOKIE_NAME.to_string(),
            token,
            refresh_path,
            actix_web::cookie::time::Duration::days(self.refresh_token_days as i64),
        )
    }

    pub fn build_expired_access_cookie(&self) -> Cookie<'static> {
        self.build_cookie_base(
            constants::ACCESS_COOKIE_NAME.to_string(),
            String::new(),
            "/".to_string(),
            actix_web::cookie::time::Duration::ZERO,
        )
    }

    pub fn build_expired_refresh_cookie(&self) -> Cookie<'static> {
        let refresh_path = format!("{}/v1/auth", constants::ADMIN_PREFIX);
        self.build_cookie_base(
            constants::REFRESH_COOKIE_NAME.to_string(),
            String::new(),
            refresh_path,
            actix_web::cookie::time::Duration::ZERO,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response_status() {
        let response = success_response("data");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_error_response_status() {
        let response = error_response(StatusCode::BAD_REQUEST, "bad input");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = error_response(StatusCode::NOT_FOUND, "missing");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_from_folio_maps_status() {
        let response = error_from_folio(&FolioError::validation("bad"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = error_from_folio(&FolioError::not_found("gone"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = error_from_folio(&FolioError::rate_limited("slow down"));
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
