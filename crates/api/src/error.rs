//! Mapping of service errors onto JSON responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bizhub_core::provisioning::ProvisionError;
use bizhub_db::ProvisioningServiceError;
use bizhub_shared::AppError;
use serde_json::json;
use tracing::error;

/// Handler error rendered as `{"error": code, "message": text}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": self.0.to_string(),
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<ProvisionError> for ApiError {
    fn from(err: ProvisionError) -> Self {
        Self(AppError::Provisioning(err.to_string()))
    }
}

impl From<ProvisioningServiceError> for ApiError {
    fn from(err: ProvisioningServiceError) -> Self {
        Self(match err {
            ProvisioningServiceError::BusinessNotFound(code) => {
                AppError::NotFound(format!("business {code}"))
            }
            ProvisioningServiceError::InvalidPurchase(msg)
            | ProvisioningServiceError::InvalidBusiness(msg) => AppError::Validation(msg),
            err @ ProvisioningServiceError::SchemaTaken { .. } => {
                AppError::Conflict(err.to_string())
            }
            ProvisioningServiceError::Provision(e) => AppError::Provisioning(e.to_string()),
            ProvisioningServiceError::Database(e) => AppError::Database(e.to_string()),
        })
    }
}
