//! Database access
//!
//! Thin wrapper over the SeaORM connection. The backend name is kept
//! around because a few aggregation queries and the storage-compaction
//! command need dialect-specific SQL.

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::errors::{FolioError, Result};
use migration::{Migrator, MigratorTrait};

pub struct Storage {
    db: DatabaseConnection,
    backend: &'static str,
}

impl Storage {
    /// Connect using the URL scheme to pick the backend, then run migrations
    pub async fn connect(url: &str) -> Result<Self> {
        let backend = backend_from_url(url)?;

        let mut opts = ConnectOptions::new(url.to_string());
        opts.sqlx_logging(false);

        let db = Database::connect(opts)
            .await
            .map_err(|e| FolioError::database_connection(e.to_string()))?;

        Migrator::up(&db, None)
            .await
            .map_err(|e| FolioError::database_operation(format!("migration failed: {}", e)))?;

        info!("Connected to {} database", backend);

        Ok(Self { db, backend })
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend
    }
}

fn backend_from_url(url: &str) -> Result<&'static str> {
    if url.starts_with("sqlite:") {
        Ok("sqlite")
    } else if url.starts_with("postgres:") || url.starts_with("postgresql:") {
        Ok("postgres")
    } else if url.starts_with("mysql:") {
        Ok("mysql")
    } else {
        Err(FolioError::database_config(format!(
            "Unsupported database URL scheme: {}",
            url
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_url() {
        assert_eq!(backend_from_url("sqlite://folio.db?mode=rwc").unwrap(), "sqlite");
        assert_eq!(
            backend_from_url("postgres://user:pw@localhost/folio").unwrap(),
            "postgres"
        );
        assert_eq!(
            backend_from_url("postgresql://user:pw@localhost/folio").unwrap(),
            "postgres"
        );
        assert_eq!(
            backend_from_url("mysql://user:pw@localhost/folio").unwrap(),
            "mysql"
        );
        assert!(backend_from_url("redis://localhost").is_err());
    }
}
