//! Admin authentication endpoints

use actix_governor::{Governor, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError};
use actix_web::dev::ServiceRequest;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, Result as ActixResult, web};
use governor::middleware::NoOpMiddleware;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use ts_rs::TS;

use crate::api::jwt::JwtService;
use crate::config::get_config;
use crate::utils::ip::is_trusted_proxy;
use crate::utils::password::verify_password;

use super::helpers::{CookieBuilder, error_response, success_response};
use super::types::{LoginCredentials, TS_EXPORT_PATH};

#[derive(Serialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct AuthSuccessResponse {
    pub message: String,
    pub expires_in: u64,
}

#[derive(Serialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct MessageResponse {
    pub message: String,
}

/// IP-based rate-limit key extractor for the login endpoint
///
/// Uses the peer address unless the connection comes from a configured
/// trusted proxy, in which case X-Forwarded-For is honored.
#[derive(Clone, Copy)]
pub struct LoginKeyExtractor;

impl KeyExtractor for LoginKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        let conn_info = req.connection_info();

        let peer_ip = conn_info
            .peer_addr()
            .ok_or_else(|| SimpleKeyExtractionError::new("Unable to extract peer IP"))?;

        let trusted_proxies = &get_config().api.trusted_proxies;

        if !trusted_proxies.is_empty() && is_trusted_proxy(peer_ip, trusted_proxies) {
            let real_ip = conn_info.realip_remote_addr().unwrap_or(peer_ip);
            debug!("Login rate limit key from trusted proxy: {}", real_ip);
            Ok(real_ip.to_string())
        } else {
            Ok(peer_ip.to_string())
        }
    }
}

/// Login limiter: 1 req/s refill, burst of 5, 429 beyond that
pub fn login_rate_limiter() -> Governor<LoginKeyExtractor, NoOpMiddleware> {
    let config = GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(5)
        .key_extractor(LoginKeyExtractor)
        .finish()
        .expect("Invalid rate limit config");

    debug!("Login rate limiter created: 1 req/s, burst 5");
    Governor::new(&config)
}

/// Refresh limiter, a little more generous than login
pub fn refresh_rate_limiter() -> Governor<LoginKeyExtractor, NoOpMiddleware> {
    let config = GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(10)
        .key_extractor(LoginKeyExtractor)
        .finish()
        .expect("Invalid rate limit config");

    Governor::new(&config)
}

/// POST /admin/v1/auth/login
pub async fn login(
    _req: HttpRequest,
    login_body: web::Json<LoginCredentials>,
) -> ActixResult<impl Responder> {
    let config = get_config();
    let password_hash = &config.api.admin_password_hash;

    if password_hash.is_empty() {
        error!("Admin API: login attempted with no admin password configured");
        return Ok(error_response(
            StatusCode::UNAUTHORIZED,
            "Admin login is not configured",
        ));
    }

    let password_valid = match verify_password(&login_body.password, password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            error!("Admin API: password verification error: {}", e);
            return Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication error",
            ));
        }
    };

    if !password_valid {
        warn!("Admin API: login failed, invalid password");
        return Ok(error_response(StatusCode::UNAUTHORIZED, "Invalid password"));
    }

    info!("Admin API: login successful");

    let jwt_service = JwtService::from_config();
    let access_token = match jwt_service.generate_access_token() {
        Ok(token) => token,
        Err(e) => {
            error!("Admin API: failed to generate access token: {}", e);
            return Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate token",
            ));
        }
    };

    let refresh_token = match jwt_service.generate_refresh_token() {
        Ok(token) => token,
        Err(e) => {
            error!("Admin API: failed to generate refresh token: {}", e);
            return Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate token",
            ));
        }
    };

    let cookie_builder = CookieBuilder::from_config();
    let access_cookie = cookie_builder.build_access_cookie(access_token);
    let refresh_cookie = cookie_builder.build_refresh_cookie(refresh_token);

    Ok(HttpResponse::Ok()
        .cookie(access_cookie)
        .cookie(refresh_cookie)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(super::types::ApiResponse::ok(AuthSuccessResponse {
            message: "Login successful".to_string(),
            expires_in: config.api.access_token_minutes * 60,
        })))
}

/// POST /admin/v1/auth/refresh
pub async fn refresh_token(req: HttpRequest) -> ActixResult<impl Responder> {
    let config = get_config();
    let cookie_builder = CookieBuilder::from_config();

    let refresh_token = match req.cookie(crate::api::constants::REFRESH_COOKIE_NAME) {
        Some(cookie) => cookie.value().to_string(),
        None => {
            warn!("Admin API: refresh token not found in cookie");
            return Ok(error_response(
                StatusCode::UNAUTHORIZED,
                "Refresh token not found",
            ));
        }
    };

    let jwt_service = JwtService::from_config();
    if let Err(e) = jwt_service.validate_refresh_token(&refresh_token) {
        warn!("Admin API: invalid refresh token: {}", e);
        return Ok(error_response(
            StatusCode::UNAUTHORIZED,
            "Invalid refresh token",
        ));
    }

    info!("Admin API: token refresh successful");

    // Sliding expiration: both tokens are rotated
    let new_access_token = match jwt_service.generate_access_token() {
        Ok(token) => token,
        Err(e) => {
            error!("Admin API: failed to generate access token: {}", e);
            return Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate token",
            ));
        }
    };

    let new_refresh_token = match jwt_service.generate_refresh_token() {
        Ok(token) => token,
        Err(e) => {
            error!("Admin API: failed to generate refresh token: {}", e);
            return Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate token",
            ));
        }
    };

    let access_cookie = cookie_builder.build_access_cookie(new_access_token);
    let refresh_cookie = cookie_builder.build_refresh_cookie(new_refresh_token);

    Ok(HttpResponse::Ok()
        .cookie(access_cookie)
        .cookie(refresh_cookie)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(super::types::ApiResponse::ok(AuthSuccessResponse {
            message: "Token refreshed".to_string(),
            expires_in: config.api.access_token_minutes * 60,
        })))
}

/// POST /admin/v1/auth/logout
pub async fn logout(_req: HttpRequest) -> ActixResult<impl Responder> {
    info!("Admin API: logout");

    let cookie_builder = CookieBuilder::from_config();
    let access_cookie = cookie_builder.build_expired_access_cookie();
    let refresh_cookie = cookie_builder.build_expired_refresh_cookie();

    Ok(HttpResponse::Ok()
        .cookie(access_cookie)
        .cookie(refresh_cookie)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(super::types::ApiResponse::ok(MessageResponse {
            message: "Logout successful".to_string(),
        })))
}

/// GET /admin/v1/auth/verify - reaching the handler means the token passed
pub async fn verify_token(_req: HttpRequest) -> ActixResult<impl Responder> {
    Ok(success_response(MessageResponse {
        message: "Token is valid".to_string(),
    }))
}
