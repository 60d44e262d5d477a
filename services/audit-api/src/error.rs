//! HTTP error responses.

use audit_common::{AuditError, AuditField, ErrorCategory, Persona, StageError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure of an API request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A pipeline stage failed.
    #[error(transparent)]
    Stage(#[from] StageError),

    /// A collaborator failed outside any audit stage.
    #[error(transparent)]
    Audit(#[from] AuditError),

    /// Malformed or missing query parameters.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The persona may not see this kind of result.
    #[error("{field:?} is not available to the {persona} persona")]
    NotExposed { persona: Persona, field: AuditField },
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub category: ErrorCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub message: String,
    pub retryable: bool,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        let code = match self {
            ApiError::Stage(e) => e.source.http_status_code(),
            ApiError::Audit(e) => e.http_status_code(),
            ApiError::BadRequest(_) => 400,
            ApiError::NotExposed { .. } => 403,
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn body(&self) -> ErrorBody {
        let message = self.to_string();
        match self {
            ApiError::Stage(e) => ErrorBody {
                code: e.source.code(),
                category: e.category(),
                stage: Some(e.stage.to_string()),
                message,
                retryable: e.source.is_retryable(),
            },
            ApiError::Audit(e) => ErrorBody {
                code: e.code(),
                category: e.category(),
                stage: None,
                message,
                retryable: e.is_retryable(),
            },
            ApiError::BadRequest(_) => ErrorBody {
                code: "BadRequest",
                category: ErrorCategory::InvalidInput,
                stage: None,
                message,
                retryable: false,
            },
            ApiError::NotExposed { .. } => ErrorBody {
                code: "NotExposed",
                category: ErrorCategory::InvalidInput,
                stage: None,
                message,
                retryable: false,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_common::AuditStage;

    #[test]
    fn test_stage_error_body() {
        let err = ApiError::from(StageError::new(
            AuditStage::Composite { year: 2024 },
            AuditError::NoCloudFreeImagery {
                year: 2024,
                threshold_pct: 60.0,
            },
        ));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = err.body();
        assert_eq!(body.code, "NoCloudFreeImagery");
        assert_eq!(body.category, ErrorCategory::NoData);
        assert_eq!(body.stage.as_deref(), Some("composite[2024]"));
        assert!(!body.retryable);
    }

    #[test]
    fn test_timeout_is_retryable_gateway_timeout() {
        let err = ApiError::from(StageError::new(
            AuditStage::Geocode,
            AuditError::ProviderTimeout("geocoder".into()),
        ));
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
        assert!(err.body().retryable);
    }

    #[test]
    fn test_invalid_input_distinct_from_no_data() {
        let invalid = ApiError::from(AuditError::InvalidRadius("-1".into()));
        let no_data = ApiError::from(AuditError::EmptyRegion);
        assert_eq!(invalid.body().category, ErrorCategory::InvalidInput);
        assert_eq!(no_data.body().category, ErrorCategory::NoData);
        assert_ne!(invalid.status(), no_data.status());
    }

    #[test]
    fn test_not_exposed_is_forbidden() {
        let err = ApiError::NotExposed {
            persona: Persona::Public,
            field: AuditField::Trend,
        };
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert!(err.to_string().contains("public"));
    }
}
