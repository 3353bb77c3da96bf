//! HTTP Handlers

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use portfolio_advisor::{AdvisorError, PortfolioResult, RecommendRequest};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub market_source: String,
    pub market_reachable: bool,
    pub explainer_configured: bool,
    pub crew_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct UniverseResponse {
    pub symbols: Vec<String>,
    pub lookback_days: u32,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: &AdvisorError) -> ApiError {
    let (status, code) = match err {
        AdvisorError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "ADVISOR_ERROR"),
    };
    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
            code: code.into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let market_reachable = state.market.health_check().await;

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        market_source: state.market.name().to_string(),
        market_reachable,
        explainer_configured: state.explainer.is_some(),
        crew_configured: state.config.crew.is_some(),
    })
}

/// Default universe
pub async fn universe(State(state): State<AppState>) -> Json<UniverseResponse> {
    Json(UniverseResponse {
        symbols: state.config.default_universe.clone(),
        lookback_days: state.config.lookback_days,
    })
}

/// Portfolio recommendation
pub async fn recommend(
    State(state): State<AppState>,
    Json(payload): Json<RecommendRequest>,
) -> Result<Json<PortfolioResult>, ApiError> {
    tracing::info!(
        budget = ?payload.budget,
        risk_level = ?payload.risk_level,
        universe = ?payload.universe,
        "Recommend request"
    );

    let result = state.orchestrator().recommend(payload).await.map_err(|e| {
        tracing::warn!(error = %e, "Rejected recommend request");
        api_error(&e)
    })?;

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use portfolio_advisor::{AdvisorConfig, MockMarketData};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::router;
    use crate::state::AppState;

    fn state() -> AppState {
        AppState {
            config: Arc::new(AdvisorConfig::default()),
            market: Arc::new(MockMarketData::new()),
            explainer: None,
        }
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::post("/api/recommend")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["market_source"], "Mock");
        assert_eq!(body["explainer_configured"], false);
    }

    #[tokio::test]
    async fn test_recommend_default_universe() {
        let (status, body) = send(post_json(r#"{"budget": 5000, "risk_level": "low"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "complete");
        assert_eq!(body["weights"].as_object().unwrap().len(), 10);
        assert_eq!(body["diagnostics"]["strategy"], "deterministic");
        assert_eq!(body["explanation"]["source"]["kind"], "fallback");
    }

    #[tokio::test]
    async fn test_recommend_rejects_negative_budget() {
        let (status, body) = send(post_json(r#"{"budget": -10}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_unknown_tickers_give_empty_portfolio() {
        let (status, body) = send(post_json(r#"{"universe": "ZZZZ, QQQQ"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "insufficient_data");
        assert_eq!(body["diagnostics"]["omitted_symbols"].as_array().unwrap().len(), 2);
    }
}
