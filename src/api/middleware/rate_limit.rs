//! Fixed-window rate limiting for the public endpoints
//!
//! Process-local by design: the window table lives in a DashMap, so a
//! multi-instance deployment rate-limits per instance. The store is a
//! trait so tests can drive the clock.

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::CONTENT_TYPE,
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::info;

use crate::api::services::admin::ApiResponse;
use crate::utils::extract_client_ip;

pub const CONTACT_MAX_REQUESTS: u32 = 5;
pub const CONTACT_WINDOW_MINUTES: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after_secs: u64 },
}

pub trait RateLimitStore: Send + Sync {
    fn check(&self, key: &str, now: DateTime<Utc>) -> RateLimitDecision;
}

struct WindowState {
    window_start: DateTime<Utc>,
    count: u32,
}

pub struct FixedWindowLimiter {
    windows: DashMap<String, WindowState>,
    max_requests: u32,
    window: Duration,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn contact_default() -> Self {
        Self::new(
            CONTACT_MAX_REQUESTS,
            Duration::minutes(CONTACT_WINDOW_MINUTES),
        )
    }

    fn purge_expired(&self, now: DateTime<Utc>) {
        let window = self.window;
        self.windows
            .retain(|_, state| now - state.window_start < window);
    }
}

impl RateLimitStore for FixedWindowLimiter {
    fn check(&self, key: &str, now: DateTime<Utc>) -> RateLimitDecision {
        // Keep the table bounded under churn
        if self.windows.len() > 10_000 {
            self.purge_expired(now);
        }

        let mut state = self.windows.entry(key.to_string()).or_insert(WindowState {
            window_start: now,
            count: 0,
        });

        if now - state.window_start >= self.window {
            state.window_start = now;
            state.count = 0;
        }

        state.count += 1;

        if state.count > self.max_requests {
            let retry_after =
                (state.window_start + self.window - now).num_seconds().max(1) as u64;
            RateLimitDecision::Limited {
                retry_after_secs: retry_after,
            }
        } else {
            RateLimitDecision::Allowed
        }
    }
}

/// Per-client (IP + user-agent) rate-limit middleware
#[derive(Clone)]
pub struct ClientRateLimit {
    store: Arc<dyn RateLimitStore>,
}

impl ClientRateLimit {
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self { store }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ClientRateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = ClientRateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientRateLimitMiddleware {
            service: Rc::new(service),
            store: self.store.clone(),
        }))
    }
}

pub struct ClientRateLimitMiddleware<S> {
    service: Rc<S>,
    store: Arc<dyn RateLimitStore>,
}

impl<S, B> Service<ServiceRequest> for ClientRateLimitMiddleware<S>
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
        let store = self.store.clone();

        Box::pin(async move {
            let ip = extract_client_ip(req.request()).unwrap_or_else(|| "unknown".to_string());
            let user_agent = req
                .headers()
                .get("User-Agent")
                .and_then(|h| h.to_str().ok())
                .unwrap_or("");
            let key = format!("{}|{}", ip, user_agent);

            match store.check(&key, Utc::now()) {
                RateLimitDecision::Allowed => {
                    let response = srv.call(req).await?.map_into_left_body();
                    Ok(response)
                }
                RateLimitDecision::Limited { retry_after_secs } => {
                    info!("Rate limit exceeded for {}", ip);
                    Ok(req.into_response(
                        HttpResponse::TooManyRequests()
                            .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
                            .insert_header(("Retry-After", retry_after_secs.to_string()))
                            .json(ApiResponse::<()>::error(
                                "Too many requests, please try again later",
                            ))
                            .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sixth_request_limited() {
        let limiter = FixedWindowLimiter::contact_default();
        let now = Utc::now();

        for _ in 0..5 {
            assert_eq!(limiter.check("1.2.3.4|ua", now), RateLimitDecision::Allowed);
        }

        match limiter.check("1.2.3.4|ua", now) {
            RateLimitDecision::Limited { retry_after_secs } => {
                assert!(retry_after_secs > 0);
                assert!(retry_after_secs <= (CONTACT_WINDOW_MINUTES * 60) as u64);
            }
            RateLimitDecision::Allowed => panic!("sixth request should be limited"),
        }
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = FixedWindowLimiter::contact_default();
        let now = Utc::now();

        for _ in 0..6 {
            limiter.check("1.2.3.4|ua", now);
        }
        assert_eq!(limiter.check("5.6.7.8|ua", now), RateLimitDecision::Allowed);
    }

    #[test]
    fn test_window_resets() {
        let limiter = FixedWindowLimiter::contact_default();
        let now = Utc::now();

        for _ in 0..6 {
            limiter.check("1.2.3.4|ua", now);
        }

        let later = now + Duration::minutes(CONTACT_WINDOW_MINUTES + 1);
        assert_eq!(
            limiter.check("1.2.3.4|ua", later),
            RateLimitDecision::Allowed
        );
    }
}
