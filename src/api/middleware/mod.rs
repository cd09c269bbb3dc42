pub mod auth;
pub mod rate_limit;

pub use auth::AdminAuth;
pub use rate_limit::{ClientRateLimit, FixedWindowLimiter, RateLimitDecision, RateLimitStore};
