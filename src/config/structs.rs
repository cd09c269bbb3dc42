use serde::{Deserialize, Serialize};

/// Run mode, switches error redaction and startup validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub run_mode: RunMode,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub uploads: UploadsConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub geoip: GeoIpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Connection string; scheme selects the backend (sqlite/postgres/mysql)
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log directory; when set, a daily-rotated file appender is added
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Secret for signing access/refresh JWTs
    #[serde(default)]
    pub jwt_secret: String,
    /// Argon2 hash of the admin password
    #[serde(default)]
    pub admin_password_hash: String,
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: u64,
    #[serde(default = "default_refresh_token_days")]
    pub refresh_token_days: u64,
    #[serde(default)]
    pub cookie_secure: bool,
    #[serde(default)]
    pub cookie_domain: Option<String>,
    /// Proxies allowed to set X-Forwarded-For, single IPs or CIDR ranges
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            admin_password_hash: String::new(),
            access_token_minutes: default_access_token_minutes(),
            refresh_token_days: default_refresh_token_days(),
            cookie_secure: false,
            cookie_domain: None,
            trusted_proxies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CorsConfig {
    /// Allowed origins; empty means same-origin deployments only
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Transactional email provider (contact-form notifications)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_mail_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub from_address: String,
    #[serde(default)]
    pub to_address: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            endpoint: default_mail_endpoint(),
            from_address: String::new(),
            to_address: String::new(),
        }
    }
}

/// Hosted file-upload provider (admin file deletion proxy)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_uploads_endpoint")]
    pub endpoint: String,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            endpoint: default_uploads_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Default retention window for the background cleanup task
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
    /// Hours between background cleanup runs; 0 disables the task
    #[serde(default = "default_cleanup_interval_hours")]
    pub cleanup_interval_hours: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            cleanup_interval_hours: default_cleanup_interval_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoIpConfig {
    #[serde(default)]
    pub enabled: bool,
    /// URL template with `{ip}` placeholder
    #[serde(default = "default_geoip_url")]
    pub api_url: String,
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: default_geoip_url(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_access_token_minutes() -> u64 {
    15
}

fn default_refresh_token_days() -> u64 {
    7
}

fn default_mail_endpoint() -> String {
    "https://api.resend.com/emails".to_string()
}

fn default_uploads_endpoint() -> String {
    "https://api.uploadthing.com/v6/deleteFiles".to_string()
}

fn default_retention_days() -> u64 {
    365
}

fn default_cleanup_interval_hours() -> u64 {
    24
}

fn default_geoip_url() -> String {
    "http://ip-api.com/json/{ip}?fields=status,country,city".to_string()
}
