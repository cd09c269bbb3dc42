use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, header::CONTENT_TYPE},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{info, trace};

use crate::api::constants;
use crate::api::jwt::get_jwt_service;
use crate::api::services::admin::ApiResponse;

/// Token check outcome. Missing/invalid tokens get 401, a valid token
/// with the wrong role claim gets 403.
enum TokenCheck {
    Missing,
    Invalid,
    WrongRole,
    Valid,
}

/// Admin authentication middleware
#[derive(Clone)]
pub struct AdminAuth;

impl<S, B> Transform<S, ServiceRequest> for AdminAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AdminAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> AdminAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    /// CORS preflight never carries credentials
    fn handle_options_request(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        req.into_response(
            HttpResponse::NoContent()
                .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                .finish()
                .map_into_right_body(),
        )
    }

    fn handle_unauthenticated(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        info!("Admin authentication failed: invalid or missing token");
        req.into_response(
            HttpResponse::Unauthorized()
                .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
                .json(ApiResponse::<()>::error("Unauthorized: invalid or missing token"))
                .map_into_right_body(),
        )
    }

    fn handle_forbidden(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        info!("Admin authentication failed: valid token without admin role");
        req.into_response(
            HttpResponse::Forbidden()
                .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
                .json(ApiResponse::<()>::error("Forbidden: admin role required"))
                .map_into_right_body(),
        )
    }

    fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
        req.headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.to_string())
    }

    fn check_token(token: &str) -> TokenCheck {
        let jwt_service = get_jwt_service();
        match jwt_service.validate_access_token(token) {
            Ok(claims) if claims.role == "admin" => {
                trace!("Access token validation successful");
                TokenCheck::Valid
            }
            Ok(claims) => {
                info!("Access token carries non-admin role: {}", claims.role);
                TokenCheck::WrongRole
            }
            Err(e) => {
                info!("Access token validation failed: {}", e);
                TokenCheck::Invalid
            }
        }
    }

    /// Bearer token first, then the access cookie
    fn check_request(req: &ServiceRequest) -> TokenCheck {
        if let Some(token) = Self::extract_bearer_token(req) {
            return Self::check_token(&token);
        }

        if let Some(cookie) = req.cookie(constants::ACCESS_COOKIE_NAME) {
            return Self::check_token(cookie.value());
        }

        TokenCheck::Missing
    }

    /// Auth endpoints manage their own credentials and bypass the token check
    fn is_auth_endpoint(req: &ServiceRequest) -> bool {
        let path = req.path();
        let prefix = constants::ADMIN_PREFIX;
        path == format!("{}/v1/auth/login", prefix)
            || path == format!("{}/v1/auth/refresh", prefix)
            || path == format!("{}/v1/auth/logout", prefix)
    }
}

impl<S, B> Service<ServiceRequest> for AdminAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            if req.method() == Method::OPTIONS {
                return Ok(Self::handle_options_request(req));
            }

            if Self::is_auth_endpoint(&req) {
                trace!("Auth endpoint accessed, bypassing token check");
                let response = srv.call(req).await?.map_into_left_body();
                return Ok(response);
            }

            match Self::check_request(&req) {
                TokenCheck::Valid => {
                    let response = srv.call(req).await?.map_into_left_body();
                    Ok(response)
                }
                TokenCheck::WrongRole => Ok(Self::handle_forbidden(req)),
                TokenCheck::Missing | TokenCheck::Invalid => {
                    Ok(Self::handle_unauthenticated(req))
                }
            }
        })
    }
}
