use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidationErrors;

/// One failing input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

/// Body rendered for every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// Response extension set when a handler reports an integrity fault. The
/// outermost pipeline stage turns it into a shutdown request.
#[derive(Debug, Clone, Copy)]
pub struct IntegrityFault;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("id provided was not a valid UUID")]
    InvalidIdentifier,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("authentication failed")]
    AuthenticationFailure,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("request timed out")]
    Timeout,

    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    #[error("integrity fault: {0}")]
    IntegrityFault(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Password hash error: {0}")]
    PasswordHash(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidIdentifier | Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthenticated(_) | Self::AuthenticationFailure => StatusCode::UNAUTHORIZED,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::IntegrityFault(_)
            | Self::Database(_)
            | Self::Migrate(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Metrics(_)
            | Self::Token(_)
            | Self::PasswordHash(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing errors carry their own message; everything else is
    /// rendered as a bare 500.
    fn is_trusted(&self) -> bool {
        !self.status_code().is_server_error()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    error: error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| error.code.to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.error.cmp(&b.error)));

        Self::Validation {
            message: "field validation error".to_string(),
            fields,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let integrity_fault = matches!(self, Self::IntegrityFault(_));

        let body = if self.is_trusted() {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
            let message = self.to_string();
            match self {
                Self::Validation { fields, .. } => ErrorResponse {
                    error: message,
                    fields,
                },
                _ => ErrorResponse {
                    error: message,
                    fields: Vec::new(),
                },
            }
        } else {
            tracing::error!(error = %self, "unhandled error");
            ErrorResponse {
                error: status
                    .canonical_reason()
                    .unwrap_or("Internal Server Error")
                    .to_string(),
                fields: Vec::new(),
            }
        };

        let mut response = (status, Json(body)).into_response();
        if integrity_fault {
            response.extensions_mut().insert(IntegrityFault);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Input {
        #[validate(length(min = 1, message = "must not be empty"))]
        name: String,
        #[validate(range(min = 0, message = "must be at least 0"))]
        cost: i64,
    }

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(AppError::InvalidIdentifier.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Unauthenticated("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::AuthenticationFailure.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::MethodNotAllowed.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(AppError::Timeout.status_code(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(AppError::validation("bad").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::IntegrityFault("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::Internal("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_errors_collect_every_field_sorted() {
        let input = Input {
            name: String::new(),
            cost: -1,
        };
        let err = AppError::from(input.validate().unwrap_err());

        match err {
            AppError::Validation { fields, .. } => {
                assert_eq!(
                    fields,
                    vec![
                        FieldError {
                            field: "cost".into(),
                            error: "must be at least 0".into()
                        },
                        FieldError {
                            field: "name".into(),
                            error: "must not be empty".into()
                        },
                    ]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn integrity_fault_response_is_tagged() {
        let response = AppError::IntegrityFault("claims missing".into()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<IntegrityFault>().is_some());
    }

    #[test]
    fn internal_errors_are_not_tagged() {
        let response = AppError::Internal("boom".into()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<IntegrityFault>().is_none());
    }
}
