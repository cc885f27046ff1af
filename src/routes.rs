use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::weather::{
    service::{WeatherService, WeatherServiceError},
    types::{WeatherDetails, WeatherQuery},
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub weather_service: Arc<WeatherService>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    pub location: Option<String>,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
}

impl WeatherParams {
    fn into_query(self) -> Option<WeatherQuery> {
        let location = self.location.filter(|l| !l.trim().is_empty())?;
        Some(WeatherQuery::new(location, self.lon?, self.lat?))
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub providers: Vec<String>,
}

pub enum ApiError {
    InvalidParameters,
    Service(WeatherServiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidParameters => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": "Invalid parameters - required location, lon, lat" })),
            )
                .into_response(),
            ApiError::Service(e) => {
                let failures: Vec<String> = e.failures().iter().map(ToString::to_string).collect();
                tracing::error!(error = %e, failures = ?failures, "weather request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "response": e.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

// Route handlers
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        providers: state
            .weather_service
            .provider_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

pub async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<WeatherDetails>, ApiError> {
    let query = params.into_query().ok_or(ApiError::InvalidParameters)?;

    state
        .weather_service
        .get_weather_details(&query)
        .await
        .map(Json)
        .map_err(ApiError::Service)
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/weather", get(get_weather))
        .with_state(state)
}
