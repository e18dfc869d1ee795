use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::routing::get;
use axum::{Json, Router};
use premium_features::Feature;
use premium_server::engine::{Node, RegressionTree};
use premium_server::server::router;
use premium_server::{ForestModel, PROFIT_MARGIN, PremiumPipeline, load_model};
use rate_feed::{PricingConfig, RateError, RateFetcher};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn pricing_endpoint(body: Value) -> String {
    let app = Router::new().route(
        "/data/pricemulti",
        get(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/data/pricemulti")
}

fn pricing(url: String) -> PricingConfig {
    PricingConfig {
        url,
        timeout_secs: 5,
        ..PricingConfig::default()
    }
}

fn smoker_tree() -> ForestModel {
    let tree = RegressionTree::new(vec![
        Node::Split {
            feature: Feature::Smoker.column(),
            threshold: 0.5,
            left: 1,
            right: 2,
        },
        Node::Leaf { value: 8000.0 },
        Node::Leaf { value: 32000.0 },
    ])
    .unwrap();
    ForestModel::from_trees(vec![tree]).unwrap()
}

#[tokio::test]
async fn test_startup_path_serves_quotes() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("premium_model.bin");
    smoker_tree().save(&model_path).unwrap();
    let model = load_model(&model_path).unwrap();

    let url = pricing_endpoint(json!({"USD": {"BTC": 0.0000095, "ETH": 0.00026}})).await;
    let rate = RateFetcher::new(pricing(url))
        .unwrap()
        .conversion_rate()
        .await
        .unwrap();

    let app = router(Arc::new(PremiumPipeline::new(Arc::new(model), rate)));
    let request = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"user_data": {"age": "45", "sex": "0", "children": "2", "bmi": "30.1", "smoker": "1"}}"#,
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        json["predicted_premium"].as_f64().unwrap(),
        0.00026 * (32000.0 * PROFIT_MARGIN)
    );
}

#[tokio::test]
async fn test_startup_aborts_without_rate() {
    let url = pricing_endpoint(json!({"Response": "Error", "Message": "Invalid api key"})).await;
    let result = RateFetcher::new(pricing(url)).unwrap().conversion_rate().await;

    assert!(matches!(result, Err(RateError::Provider(_))));
}
