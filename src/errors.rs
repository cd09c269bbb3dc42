use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum FolioError {
    Validation(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    RateLimited(String),
    DuplicateRecord(String),
    ConstraintViolation(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Serialization(String),
    DateParse(String),
    ExternalService(String),
    Internal(String),
}

impl FolioError {
    /// Error code, stable across releases (used by the admin panel)
    pub fn code(&self) -> &'static str {
        match self {
            FolioError::Validation(_) => "E001",
            FolioError::Unauthorized(_) => "E002",
            FolioError::Forbidden(_) => "E003",
            FolioError::NotFound(_) => "E004",
            FolioError::RateLimited(_) => "E005",
            FolioError::DuplicateRecord(_) => "E006",
            FolioError::ConstraintViolation(_) => "E007",
            FolioError::DatabaseConfig(_) => "E008",
            FolioError::DatabaseConnection(_) => "E009",
            FolioError::DatabaseOperation(_) => "E010",
            FolioError::Serialization(_) => "E011",
            FolioError::DateParse(_) => "E012",
            FolioError::ExternalService(_) => "E013",
            FolioError::Internal(_) => "E014",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            FolioError::Validation(_) => "Validation Error",
            FolioError::Unauthorized(_) => "Unauthorized",
            FolioError::Forbidden(_) => "Forbidden",
            FolioError::NotFound(_) => "Resource Not Found",
            FolioError::RateLimited(_) => "Rate Limit Exceeded",
            FolioError::DuplicateRecord(_) => "Duplicate Record",
            FolioError::ConstraintViolation(_) => "Constraint Violation",
            FolioError::DatabaseConfig(_) => "Database Configuration Error",
            FolioError::DatabaseConnection(_) => "Database Connection Error",
            FolioError::DatabaseOperation(_) => "Database Operation Error",
            FolioError::Serialization(_) => "Serialization Error",
            FolioError::DateParse(_) => "Date Parse Error",
            FolioError::ExternalService(_) => "External Service Error",
            FolioError::Internal(_) => "Internal Server Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FolioError::Validation(msg)
            | FolioError::Unauthorized(msg)
            | FolioError::Forbidden(msg)
            | FolioError::NotFound(msg)
            | FolioError::RateLimited(msg)
            | FolioError::DuplicateRecord(msg)
            | FolioError::ConstraintViolation(msg)
            | FolioError::DatabaseConfig(msg)
            | FolioError::DatabaseConnection(msg)
            | FolioError::DatabaseOperation(msg)
            | FolioError::Serialization(msg)
            | FolioError::DateParse(msg)
            | FolioError::ExternalService(msg)
            | FolioError::Internal(msg) => msg,
        }
    }

    /// HTTP status this error maps to at the API boundary
    pub fn http_status(&self) -> StatusCode {
        match self {
            FolioError::Validation(_)
            | FolioError::DuplicateRecord(_)
            | FolioError::ConstraintViolation(_)
            | FolioError::DateParse(_) => StatusCode::BAD_REQUEST,
            FolioError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            FolioError::Forbidden(_) => StatusCode::FORBIDDEN,
            FolioError::NotFound(_) => StatusCode::NOT_FOUND,
            FolioError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            FolioError::ExternalService(_) => StatusCode::SERVICE_UNAVAILABLE,
            FolioError::DatabaseConfig(_)
            | FolioError::DatabaseConnection(_)
            | FolioError::DatabaseOperation(_)
            | FolioError::Serialization(_)
            | FolioError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the message is safe to echo to clients outside dev mode
    pub fn is_client_safe(&self) -> bool {
        !matches!(
            self,
            FolioError::DatabaseConfig(_)
                | FolioError::DatabaseConnection(_)
                | FolioError::DatabaseOperation(_)
                | FolioError::Serialization(_)
                | FolioError::Internal(_)
        )
    }
}

impl fmt::Display for FolioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message())
    }
}

impl std::error::Error for FolioError {}

// Convenience constructors
impl FolioError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        FolioError::Validation(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        FolioError::Unauthorized(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        FolioError::Forbidden(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        FolioError::NotFound(msg.into())
    }

    pub fn rate_limited<T: Into<String>>(msg: T) -> Self {
        FolioError::RateLimited(msg.into())
    }

    pub fn duplicate_record<T: Into<String>>(msg: T) -> Self {
        FolioError::DuplicateRecord(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        FolioError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        FolioError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        FolioError::DatabaseOperation(msg.into())
    }

    pub fn external_service<T: Into<String>>(msg: T) -> Self {
        FolioError::ExternalService(msg.into())
    }

    pub fn internal<T: Into<String>>(msg: T) -> Self {
        FolioError::Internal(msg.into())
    }
}

impl From<sea_orm::DbErr> for FolioError {
    fn from(err: sea_orm::DbErr) -> Self {
        match &err {
            sea_orm::DbErr::RecordNotFound(msg) => FolioError::NotFound(msg.clone()),
            _ => {
                // Provider-specific codes arrive as strings; classify the
                // common ones instead of exposing driver internals.
                let text = err.to_string();
                let lowered = text.to_lowercase();
                if lowered.contains("unique") || lowered.contains("duplicate") {
                    FolioError::DuplicateRecord(text)
                } else if lowered.contains("foreign key") || lowered.contains("constraint") {
                    FolioError::ConstraintViolation(text)
                } else {
                    FolioError::DatabaseOperation(text)
                }
            }
        }
    }
}

impl From<std::io::Error> for FolioError {
    fn from(err: std::io::Error) -> Self {
        FolioError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(err: serde_json::Error) -> Self {
        FolioError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for FolioError {
    fn from(err: chrono::ParseError) -> Self {
        FolioError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            FolioError::validation("bad").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            FolioError::unauthorized("no token").http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            FolioError::forbidden("wrong role").http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            FolioError::not_found("missing").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            FolioError::rate_limited("slow down").http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            FolioError::external_service("provider down").http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            FolioError::internal("boom").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_db_error_classification() {
        let err = sea_orm::DbErr::Custom("UNIQUE constraint failed: projects.slug".to_string());
        assert!(matches!(
            FolioError::from(err),
            FolioError::DuplicateRecord(_)
        ));

        let err = sea_orm::DbErr::Custom("FOREIGN KEY constraint failed".to_string());
        assert!(matches!(
            FolioError::from(err),
            FolioError::ConstraintViolation(_)
        ));

        let err = sea_orm::DbErr::Custom("connection reset".to_string());
        assert!(matches!(
            FolioError::from(err),
            FolioError::DatabaseOperation(_)
        ));
    }

    #[test]
    fn test_internal_errors_not_client_safe() {
        assert!(!FolioError::internal("stack trace").is_client_safe());
        assert!(!FolioError::database_operation("sql details").is_client_safe());
        assert!(FolioError::validation("name too short").is_client_safe());
        assert!(FolioError::rate_limited("try later").is_client_safe());
    }
}
