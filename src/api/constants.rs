//! API constants: cookie names and route prefixes

/// Access token cookie name
pub const ACCESS_COOKIE_NAME: &str = "folio_access";

/// Refresh token cookie name
pub const REFRESH_COOKIE_NAME: &str = "folio_refresh";

/// Admin route prefix
pub const ADMIN_PREFIX: &str = "/admin";
