//! Application configuration
//!
//! Layered loading, highest priority last:
//! defaults < `config.toml` < environment (prefix `FOLIO`, separator `__`).
//! Example: `FOLIO__SERVER__PORT=9000`.
//!
//! In production mode the required secrets must be present at startup;
//! `validate()` reports every missing value and the binary exits.

mod structs;

use std::sync::OnceLock;

use config::{Config, Environment, File};
use tracing::warn;

pub use structs::{
    AnalyticsConfig, ApiConfig, AppConfig, CorsConfig, DatabaseConfig, GeoIpConfig, LoggingConfig,
    MailConfig, RunMode, ServerConfig, UploadsConfig,
};

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Load configuration once and cache it for the process lifetime
pub fn init_config() -> &'static AppConfig {
    CONFIG.get_or_init(AppConfig::load)
}

/// Get the cached configuration (loads on first use)
pub fn get_config() -> &'static AppConfig {
    init_config()
}

impl AppConfig {
    pub fn load() -> Self {
        let builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("FOLIO").separator("__"));

        match builder.build() {
            Ok(cfg) => match cfg.try_deserialize::<AppConfig>() {
                Ok(app) => app,
                Err(e) => {
                    warn!("Failed to deserialize configuration, using defaults: {}", e);
                    AppConfig::default()
                }
            },
            Err(e) => {
                warn!("Failed to load configuration sources, using defaults: {}", e);
                AppConfig::default()
            }
        }
    }

    /// Check required values; every violation is reported, not just the first
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut missing = Vec::new();

        if self.database.url.is_empty() {
            missing.push("database.url (FOLIO__DATABASE__URL)".to_string());
        }

        if self.run_mode == RunMode::Production {
            if self.api.jwt_secret.is_empty() {
                missing.push("api.jwt_secret (FOLIO__API__JWT_SECRET)".to_string());
            }
            if self.api.admin_password_hash.is_empty() {
                missing
                    .push("api.admin_password_hash (FOLIO__API__ADMIN_PASSWORD_HASH)".to_string());
            }
            if self.mail.enabled && self.mail.api_key.is_empty() {
                missing.push("mail.api_key (FOLIO__MAIL__API_KEY)".to_string());
            }
            if self.uploads.enabled && self.uploads.api_key.is_empty() {
                missing.push("uploads.api_key (FOLIO__UPLOADS__API_KEY)".to_string());
            }
        }

        if missing.is_empty() { Ok(()) } else { Err(missing) }
    }

    pub fn is_production(&self) -> bool {
        self.run_mode == RunMode::Production
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_development() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.run_mode, RunMode::Development);
        assert!(!cfg.is_production());
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn test_validate_requires_database_url() {
        let cfg = AppConfig::default();
        let err = cfg.validate().unwrap_err();
        assert!(err.iter().any(|m| m.contains("database.url")));
    }

    #[test]
    fn test_production_requires_secrets() {
        let mut cfg = AppConfig::default();
        cfg.run_mode = RunMode::Production;
        cfg.database.url = "sqlite://folio.db".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err.iter().any(|m| m.contains("jwt_secret")));
        assert!(err.iter().any(|m| m.contains("admin_password_hash")));
    }

    #[test]
    fn test_development_allows_missing_secrets() {
        let mut cfg = AppConfig::default();
        cfg.database.url = "sqlite://folio.db".to_string();
        assert!(cfg.validate().is_ok());
    }
}
