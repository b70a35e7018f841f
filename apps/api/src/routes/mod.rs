pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::estimate::handlers;
use crate::state::AppState;
use crate::vin::handlers::handle_vin_lookup;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Estimates
        .route(
            "/api/generate-estimate",
            post(handlers::handle_generate_estimate),
        )
        .route("/api/jobs", get(handlers::handle_list_jobs))
        .route("/api/jobs/:id", get(handlers::handle_get_job))
        // Flat-rate reference table
        .route("/api/flat-rates", get(handlers::handle_list_flat_rates))
        .route(
            "/api/flat-rates/match",
            get(handlers::handle_match_flat_rate),
        )
        // Vehicles
        .route("/api/vin-lookup/:vin", get(handle_vin_lookup))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::PricingDefaults;
    use crate::estimate::generator::EstimateGenerator;
    use crate::llm_client::LlmError;
    use crate::store::memory::MemoryJobStore;
    use crate::vin::VinClient;

    struct FixedGenerator(Value);

    #[async_trait]
    impl EstimateGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str, _system: &str) -> Result<Value, LlmError> {
            Ok(self.0.clone())
        }
    }

    fn app_with(store: Arc<MemoryJobStore>) -> Router {
        let generator = FixedGenerator(json!({
            "jobType": "brakes",
            "description": "Replace front pads and rotors",
            "laborHours": 2.2,
            "parts": [{"name": "Pads", "cost": 80}, {"name": "Rotors", "cost": 140}],
            "shopSuppliesPercent": 7,
            "workSteps": ["Lift vehicle", "Remove calipers"]
        }));
        build_router(AppState {
            pricing: PricingDefaults::default(),
            store,
            generator: Arc::new(generator),
            // Port 9 (discard); tests never reach the network.
            vin: VinClient::new("http://127.0.0.1:9", Duration::from_millis(50)),
        })
    }

    fn app() -> Router {
        app_with(Arc::new(MemoryJobStore::default()))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["service"], "estimate-api");
    }

    #[tokio::test]
    async fn test_generate_estimate_persists_and_prices() {
        let store = Arc::new(MemoryJobStore::default());
        let body = json!({
            "customer": {"name": "Dana Reyes", "email": "Dana@Example.com"},
            "vehicle": {"year": 2018, "make": "Honda", "model": "Civic"},
            "description": "Front brake pads and rotors",
            "laborRate": 65
        });

        let response = app_with(store.clone())
            .oneshot(post_json("/api/generate-estimate", body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["estimate"]["laborCost"], 143.0);
        assert_eq!(body["estimate"]["subtotal"], 378.4);
        assert_eq!(body["flatRate"]["label"], "brake pads and rotors front");
        assert_eq!(body["customer"]["email"], "dana@example.com");
        assert_eq!(body["savedJob"]["status"], "estimate");

        assert_eq!(store.jobs().len(), 1);
        assert_eq!(store.customers().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let response = app()
            .oneshot(post_json("/api/generate-estimate", "{not json".to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_missing_fields_are_listed() {
        let body = json!({"customer": {"name": " "}, "description": ""});
        let response = app()
            .oneshot(post_json("/api/generate-estimate", body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        let fields: Vec<&str> = body["fields"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|f| f["field"].as_str())
            .collect();
        assert!(fields.contains(&"customer.name"));
        assert!(fields.contains(&"description"));
    }

    #[tokio::test]
    async fn test_list_and_get_jobs() {
        let store = Arc::new(MemoryJobStore::default());
        let app = app_with(store.clone());
        let body = json!({
            "customer": {"name": "Dana Reyes", "phone": "555-0199"},
            "description": "Oil change"
        });
        let response = app
            .clone()
            .oneshot(post_json("/api/generate-estimate", body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let id = body_json(response).await["savedJob"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app.clone().oneshot(get("/api/jobs")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let jobs = body_json(response).await;
        assert_eq!(jobs.as_array().unwrap().len(), 1);
        assert_eq!(jobs[0]["id"], id.as_str());

        let response = app
            .oneshot(get(&format!("/api/jobs/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["laborHours"], 0.5);
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let response = app()
            .oneshot(get(&format!("/api/jobs/{}", uuid::Uuid::new_v4())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_invalid_vin_is_rejected_locally() {
        let response = app()
            .oneshot(get("/api/vin-lookup/1HGCM82633A00435O"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["ok"], false);
    }

    #[tokio::test]
    async fn test_flat_rate_match() {
        let response = app()
            .oneshot(get("/api/flat-rates/match?description=Need%20an%20OIL%20CHANGE"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["match"]["label"], "oil change");
        assert_eq!(body["match"]["hours"], 0.5);

        let response = app()
            .oneshot(get("/api/flat-rates/match?description=mystery%20noise"))
            .await
            .unwrap();
        assert!(body_json(response).await["match"].is_null());
    }

    #[tokio::test]
    async fn test_flat_rate_table_is_listed() {
        let response = app().oneshot(get("/api/flat-rates")).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body[0]["label"], "brake pads and rotors front");
        assert_eq!(body[0]["hours"]["min"], 2.0);
    }
}
