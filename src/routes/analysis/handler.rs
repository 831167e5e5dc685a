use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    AppState,
    analysis::{AnalysisRequest, AnalysisResponse, HealthReport, PoliceOffice},
    error::AppError,
    routes::analysis::model::LocationAnalysisBody,
    utils::{ApiResponse, success_to_api_response},
};

// 位置分析API
pub async fn analyze_location(
    State(state): State<AppState>,
    body: Result<Json<LocationAnalysisBody>, JsonRejection>,
) -> Result<Json<ApiResponse<AnalysisResponse>>, AppError> {
    // 请求体无法解析时按校验错误返回
    let Json(body) = body.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let request = AnalysisRequest::try_from(body)?;

    let response = state.orchestrator.analyze(request).await?;
    Ok(success_to_api_response(response))
}

// 获取全部派出所API
pub async fn police_offices(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PoliceOffice>>>, AppError> {
    let offices = state.orchestrator.police_offices().await.inspect_err(|err| {
        tracing::error!("Failed to load police offices: {}", err);
    })?;
    Ok(success_to_api_response(offices))
}

// 健康检查API
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthReport>> {
    success_to_api_response(state.orchestrator.health().await)
}
