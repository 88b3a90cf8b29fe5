use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{error::DbErr, SqlErr};
use serde::{Deserialize, Serialize};

/// JSON body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Reason phrase of the status, e.g. `Not Found`
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Failures raised below the HTTP layer.
///
/// Client-facing variants carry the exact message the caller sees.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Upstream failure: {0}")]
    ExternalServiceError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl ServiceError {
    pub fn not_found(resource: &str, id: i32) -> Self {
        Self::NotFound(format!("{resource} with ID {id} not found"))
    }

    pub fn status_code(&self) -> StatusCode {
        use ServiceError::*;
        match self {
            NotFound(_) => StatusCode::NOT_FOUND,
            ValidationError(_) | BadRequest(_) => StatusCode::BAD_REQUEST,
            Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Forbidden(_) => StatusCode::FORBIDDEN,
            Conflict(_) => StatusCode::CONFLICT,
            ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            DatabaseError(_) | InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text placed in [`ErrorBody::message`]; 500s never echo their cause.
    pub fn public_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".into(),
            Self::InternalError(_) => "Internal server error".into(),
            other => other.to_string(),
        }
    }

    /// Maps a failed insert/update, turning unique-key clashes into 409.
    pub fn from_write_error(err: DbErr, conflict_message: &str) -> Self {
        let clash = match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => true,
            _ => {
                let text = err.to_string().to_ascii_lowercase();
                text.contains("unique constraint") || text.contains("duplicate key")
            }
        };
        if clash {
            Self::Conflict(conflict_message.to_owned())
        } else {
            Self::DatabaseError(err)
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        }

        let body = ErrorBody {
            error: status.canonical_reason().unwrap_or("Error").to_owned(),
            message: self.public_message(),
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_owned()),
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handler-level error: either a service failure or rejected input.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("{0}")]
    Invalid(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let inner = match self {
            Self::Service(err) => err,
            Self::Invalid(msg) => ServiceError::BadRequest(msg),
        };
        inner.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(response: Response) -> ErrorBody {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn error_body_carries_the_scoped_request_id() {
        let response = crate::tracing::scope_request_id(
            crate::tracing::RequestId::new("req-123"),
            async { ServiceError::not_found("Livestock", 7).into_response() },
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_of(response).await;
        assert_eq!(body.request_id.as_deref(), Some("req-123"));
        assert_eq!(body.error, "Not Found");
        assert_eq!(body.message, "Livestock with ID 7 not found");
    }

    #[tokio::test]
    async fn invalid_input_is_a_bad_request() {
        let response = ApiError::Invalid("tag_id: too long".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await.message, "tag_id: too long");
    }

    #[test]
    fn statuses_follow_the_variant() {
        let cases = [
            (ServiceError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ServiceError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (ServiceError::ExternalServiceError("smtp down".into()), StatusCode::BAD_GATEWAY),
            (ServiceError::InternalError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err:?}");
        }
    }

    #[test]
    fn server_errors_keep_their_cause_private() {
        let db = ServiceError::DatabaseError(DbErr::Custom("secret table".into()));
        assert_eq!(db.public_message(), "Database error");
        assert_eq!(
            ServiceError::InternalError("stack".into()).public_message(),
            "Internal server error"
        );

        let conflict = ServiceError::Conflict("You are already an approved member of this farm.".into());
        assert_eq!(conflict.public_message(), "You are already an approved member of this farm.");
    }

    #[test]
    fn unique_violations_become_conflicts() {
        let clash = DbErr::Custom("UNIQUE constraint failed: livestock.tag_id".into());
        assert!(matches!(
            ServiceError::from_write_error(clash, "tag_id already exists"),
            ServiceError::Conflict(_)
        ));

        let io = DbErr::Custom("disk I/O error".into());
        assert!(matches!(
            ServiceError::from_write_error(io, "tag_id already exists"),
            ServiceError::DatabaseError(_)
        ));
    }
}
