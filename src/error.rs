use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::database::StoreError;
use crate::geo::grid::GridError;
use crate::utils::{error_codes, error_to_api_response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 请求参数不合法，在任何 I/O 之前拒绝
    #[error("{0}")]
    Validation(String),
    /// 没有降级路径的上游（空间存储）不可用
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::UpstreamUnavailable(e.to_string())
    }
}

impl From<GridError> for AppError {
    fn from(e: GridError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            AppError::Validation(_) => error_codes::VALIDATION_ERROR,
            AppError::UpstreamUnavailable(_) => error_codes::UPSTREAM_UNAVAILABLE,
            AppError::NotFound(_) => error_codes::NOT_FOUND,
            AppError::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = error_to_api_response::<()>(self.code(), self.to_string());
        (status, body).into_response()
    }
}
