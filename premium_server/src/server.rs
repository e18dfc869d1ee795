use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use log::{error, info, warn};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};

use crate::error::PredictionError;
use crate::misc::{ErrorBody, PremiumQuote};
use crate::pipeline::PremiumPipeline;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<PremiumPipeline>,
}

impl IntoResponse for PredictionError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            warn!("Rejected prediction request: {}", self);
        } else {
            error!("Prediction failed: {}", self);
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// POST /predict scores `user_data` and returns the crypto-denominated premium.
async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PremiumQuote>, PredictionError> {
    let Json(body) =
        payload.map_err(|rejection| PredictionError::MalformedBody(rejection.body_text()))?;
    let quote = state.pipeline.predict(&body)?;
    Ok(Json(quote))
}

/// GET /health reports the model and the rate this process is quoting with.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let rate = state.pipeline.rate();
    Json(json!({
        "status": "ok",
        "model": state.pipeline.model_name(),
        "rate": rate.value,
        "base": rate.base,
        "quote": rate.quote,
    }))
}

pub fn router(pipeline: Arc<PremiumPipeline>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .layer(cors)
        .with_state(AppState { pipeline })
}

pub struct Server {
    addr: SocketAddr,
    pipeline: Arc<PremiumPipeline>,
}

impl Server {
    pub fn init(addr: SocketAddr, pipeline: Arc<PremiumPipeline>) -> Self {
        Self { addr, pipeline }
    }

    pub async fn run(self) -> Result<()> {
        let app = router(self.pipeline);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("HTTP server running on {}", self.addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal, initiating graceful shutdown");
}
