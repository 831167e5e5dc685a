use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use analysis::LocationAnalysisOrchestrator;

pub mod analysis;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod gateway;
pub mod geo;
pub mod middleware;
pub mod utils;

pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<LocationAnalysisOrchestrator>,
}

/// 构建挂载在 `api_base_uri` 下的全部路由
pub fn build_router(state: AppState, api_base_uri: &str) -> Router {
    let api_routes = Router::new()
        .route(
            "/location-analysis",
            post(routes::analysis::analyze_location),
        )
        .route("/police-offices", get(routes::analysis::police_offices))
        .route("/health", get(routes::analysis::health));

    // axum 不允许在根路径上 nest
    let base = api_base_uri.trim_end_matches('/');
    let router = if base.is_empty() {
        Router::new().merge(api_routes)
    } else {
        Router::new().nest(base, api_routes)
    };

    router
        .layer(axum::middleware::from_fn(middleware::log_errors))
        .with_state(state)
}
