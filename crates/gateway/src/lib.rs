//! HTTP gateway for salesrag.
//!
//! Endpoints:
//!
//! - `GET  /health`: liveness check
//! - `POST /ask`: answer a question; role from the `x-user-role` header
//! - `POST /load-text`: ingest the configured source document
//! - `POST /orders`: create a sales order
//!
//! Built on Axum. Business outcomes (including the empty-question rejection)
//! are `200 OK` bodies; only engine faults become `500`. Invalid orders are
//! `400`.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::Json,
    routing::{get, post},
};
use salesrag_config::{AppConfig, GatewayConfig};
use salesrag_core::answer::AskResponse;
use salesrag_core::embedding::Embedder;
use salesrag_core::error::Error;
use salesrag_core::order::NewSalesOrder;
use salesrag_core::retrieval::{AccessRole, SalesOrderRow};
use salesrag_engine::{HybridEngine, OrderIntake, Runtime, TextIngestor};
use salesrag_providers::EmbedderCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

/// Header carrying the requester's declared role.
pub const ROLE_HEADER: &str = "x-user-role";

/// Shared application state for the gateway.
pub struct GatewayState {
    pub engine: Arc<HybridEngine>,
    pub ingestor: Arc<TextIngestor>,
    pub orders: Arc<OrderIntake>,
    /// Reported by `/health`; never forces a load.
    pub embedder: Arc<EmbedderCell>,
    /// Document ingested by `POST /load-text`.
    pub source_path: PathBuf,
}

impl GatewayState {
    pub fn from_runtime(runtime: &Runtime, config: &AppConfig) -> Self {
        Self {
            engine: runtime.engine.clone(),
            ingestor: runtime.ingestor.clone(),
            orders: runtime.orders.clone(),
            embedder: runtime.embedder.clone(),
            source_path: PathBuf::from(&config.ingest.source_path),
        }
    }
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - Request body size limit
/// - In-memory rate limiting per client (skipped when the budget is 0)
/// - CORS for local front ends
/// - HTTP trace logging
pub fn build_router(state: SharedState, config: &GatewayConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(|origin, _| {
            origin
                .to_str()
                .is_ok_and(|o| o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1"))
        }))
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderName::from_static(ROLE_HEADER),
        ])
        .max_age(std::time::Duration::from_secs(3600));

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/ask", post(ask_handler))
        .route("/load-text", post(load_text_handler))
        .route("/orders", post(create_order_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes));

    if config.requests_per_minute > 0 {
        let rate_limiter = Arc::new(RateLimiter::new(
            config.requests_per_minute,
            std::time::Duration::from_secs(60),
        ));
        router = router.layer(middleware::from_fn(move |req, next| {
            let limiter = rate_limiter.clone();
            rate_limit_middleware(limiter, req, next)
        }));
    }

    router
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig, runtime: Runtime) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = Arc::new(GatewayState::from_runtime(&runtime, &config));
    let app = build_router(state, &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Rate Limiter ---

/// Simple in-memory sliding-window rate limiter.
///
/// Tracks request timestamps per client key.
/// Thread-safe via `std::sync::Mutex` (non-async, held briefly).
struct RateLimiter {
    max_requests: usize,
    window: std::time::Duration,
    clients: std::sync::Mutex<HashMap<String, Vec<std::time::Instant>>>,
}

impl RateLimiter {
    fn new(max_requests: usize, window: std::time::Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` if the client is still within budget.
    fn check(&self, client_key: &str) -> bool {
        let now = std::time::Instant::now();
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        if clients.len() > 10_000 {
            clients.retain(|_, timestamps| {
                timestamps
                    .last()
                    .is_some_and(|t| now.duration_since(*t) < self.window)
            });
        }

        let timestamps = clients.entry(client_key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.max_requests {
            return false;
        }

        timestamps.push(now);
        true
    }
}

/// Keys clients by `x-forwarded-for`, falling back to "anonymous".
/// `/health` is exempt.
async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    req: axum::extract::Request,
    next: Next,
) -> Result<axum::response::Response, StatusCode> {
    if req.uri().path() == "/health" {
        return Ok(next.run(req).await);
    }

    let client_key = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    if !limiter.check(&client_key) {
        warn!(client = %client_key, "Rate limit exceeded");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    Ok(next.run(req).await)
}

// --- Handlers ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    embedder: String,
    embedder_loaded: bool,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        embedder: state.embedder.name().to_string(),
        embedder_loaded: state.embedder.is_initialized(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn internal_error(e: impl std::fmt::Display) -> HandlerError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

async fn ask_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Option<Json<AskRequest>>,
) -> Result<Json<AskResponse>, HandlerError> {
    let role = AccessRole::from_header(headers.get(ROLE_HEADER).and_then(|v| v.to_str().ok()));
    let question = payload
        .and_then(|Json(p)| p.question)
        .unwrap_or_default();

    info!(role = %role, question_len = question.len(), "Question received");

    match state.engine.ask(&question, &role).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!(error = %e, "Question processing failed");
            Err(internal_error(e))
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadTextResponse {
    inserted_count: usize,
}

async fn load_text_handler(
    State(state): State<SharedState>,
) -> Result<Json<LoadTextResponse>, HandlerError> {
    match state.ingestor.load_file(&state.source_path).await {
        Ok(inserted_count) => Ok(Json(LoadTextResponse { inserted_count })),
        Err(e) => {
            error!(path = %state.source_path.display(), error = %e, "Text ingestion failed");
            Err(internal_error(e))
        }
    }
}

async fn create_order_handler(
    State(state): State<SharedState>,
    Json(order): Json<NewSalesOrder>,
) -> Result<(StatusCode, Json<SalesOrderRow>), HandlerError> {
    match state.orders.create(&order).await {
        Ok(row) => Ok((StatusCode::CREATED, Json(row))),
        Err(Error::Order(e)) => {
            warn!(order = %order.sales_order_number, error = %e, "Sales order rejected");
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
        Err(e) => {
            error!(order = %order.sales_order_number, error = %e, "Sales order creation failed");
            Err(internal_error(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use salesrag_core::error::ProviderError;
    use salesrag_core::message::Message;
    use salesrag_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
    use salesrag_core::retrieval::SalesOrderRow;
    use salesrag_providers::FallbackProvider;
    use salesrag_store::{InMemoryAuditSink, InMemoryOrderStore, InMemoryVectorStore};
    use std::io::Write;
    use tower::ServiceExt;

    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                message: Message::assistant("Order 1234567 totals 1200 EUR."),
                usage: Some(Usage {
                    prompt_tokens: 50,
                    completion_tokens: 10,
                    total_tokens: 60,
                }),
                model: request.model,
            })
        }
    }

    struct ConstantEmbedder {
        fail: bool,
    }

    #[async_trait]
    impl Embedder for ConstantEmbedder {
        fn name(&self) -> &str {
            "constant"
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
            if self.fail {
                return Err(ProviderError::Network("embedding backend down".into()));
            }
            Ok(vec![1.0, 0.0])
        }
    }

    fn test_state(source_path: PathBuf, embedder_fails: bool) -> SharedState {
        let embedder = Arc::new(EmbedderCell::ready(Arc::new(ConstantEmbedder {
            fail: embedder_fails,
        })));
        let vectors = Arc::new(InMemoryVectorStore::new());
        let orders = Arc::new(InMemoryOrderStore::with_orders([SalesOrderRow::new(
            "1234567", 1200.0,
        )]));
        let completion = FallbackProvider::new("test")
            .add(Arc::new(EchoProvider), "primary")
            .add(Arc::new(EchoProvider), "fallback");

        let engine = HybridEngine::new(
            embedder.clone(),
            vectors.clone(),
            orders.clone(),
            completion,
            Arc::new(InMemoryAuditSink::new()),
        );
        let ingestor = Arc::new(TextIngestor::new(
            embedder.clone(),
            vectors,
            500,
            "sales_context.txt",
        ));

        Arc::new(GatewayState {
            engine: Arc::new(engine),
            orders: Arc::new(OrderIntake::new(orders, ingestor.clone())),
            ingestor,
            embedder,
            source_path,
        })
    }

    fn app() -> Router {
        build_router(
            test_state(PathBuf::from("sales_context.txt"), false),
            &GatewayConfig::default(),
        )
    }

    fn ask_request(body: &str, role: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/ask")
            .header("content-type", "application/json");
        if let Some(role) = role {
            builder = builder.header(ROLE_HEADER, role);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["embedder"], "constant");
        assert_eq!(json["embedderLoaded"], true);
    }

    fn order_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/orders")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn created_order_is_priced_and_answerable() {
        let state = test_state(PathBuf::from("x"), false);
        let response = build_router(state.clone(), &GatewayConfig::default())
            .oneshot(order_request(serde_json::json!({
                "SalesOrderNumber": "7654321",
                "CustomerName": "Globex",
                "WAERK": "EUR",
                "Items": [{"POSNR": "000010", "ARKTX": "Turbine", "KWMENG": 3, "NETPR": 4000}]
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = json_body(response).await;
        assert_eq!(json["NETWR"], 11400.0);
        assert_eq!(json["ARKTX"], "Turbine");

        let response = build_router(state, &GatewayConfig::default())
            .oneshot(ask_request(
                r#"{"question": "What is order 7654321?"}"#,
                Some("FINANCE"),
            ))
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["intent"], "structured");
        assert_eq!(json["modelUsed"], "primary");
    }

    #[tokio::test]
    async fn invalid_order_is_400_and_not_stored() {
        let state = test_state(PathBuf::from("x"), false);
        let response = build_router(state.clone(), &GatewayConfig::default())
            .oneshot(order_request(serde_json::json!({
                "SalesOrderNumber": "7654321",
                "Items": [{"POSNR": "000010", "ARKTX": "Turbine", "KWMENG": 0, "NETPR": 4000}]
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"error": "Invalid Quantity for item 000010"})
        );

        let response = build_router(state.clone(), &GatewayConfig::default())
            .oneshot(order_request(serde_json::json!({"SalesOrderNumber": "7654321"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "Sales order must contain at least one item"
        );

        let response = build_router(state, &GatewayConfig::default())
            .oneshot(ask_request(
                r#"{"question": "What is order 7654321?"}"#,
                Some("FINANCE"),
            ))
            .await
            .unwrap();
        assert_eq!(
            json_body(response).await["answer"],
            "Sales order not found in system."
        );
    }

    #[tokio::test]
    async fn order_indexing_failure_is_500() {
        let state = test_state(PathBuf::from("x"), true);
        let response = build_router(state, &GatewayConfig::default())
            .oneshot(order_request(serde_json::json!({
                "SalesOrderNumber": "7654321",
                "Items": [{"KWMENG": 1, "NETPR": 10}]
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn ask_answers_order_question() {
        let response = app()
            .oneshot(ask_request(
                r#"{"question": "What is order 1234567?"}"#,
                Some("FINANCE"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["intent"], "structured");
        assert_eq!(json["answer"], "Order 1234567 totals 1200 EUR.");
        assert_eq!(json["modelUsed"], "primary");
        assert_eq!(json["tokenUsage"]["total"], 60);
    }

    #[tokio::test]
    async fn missing_question_is_rejected() {
        let response = app().oneshot(ask_request("{}", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"error": "Please provide a question."})
        );
    }

    #[tokio::test]
    async fn role_header_defaults_to_sales_rep() {
        // 1200 is below the high-value threshold, so a risk manager cannot see it.
        let response = app()
            .oneshot(ask_request(
                r#"{"question": "What is order 1234567?"}"#,
                Some("risk_manager"),
            ))
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["answer"], "Sales order not found in system.");
        assert!(json.get("modelUsed").is_none());

        let response = app()
            .oneshot(ask_request(r#"{"question": "What is order 1234567?"}"#, None))
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["answer"], "Order 1234567 totals 1200 EUR.");
    }

    #[tokio::test]
    async fn engine_fault_is_500() {
        let app = build_router(
            test_state(PathBuf::from("sales_context.txt"), true),
            &GatewayConfig::default(),
        );
        let response = app
            .oneshot(ask_request(r#"{"question": "Explain the policy"}"#, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert!(json["error"].as_str().unwrap().contains("embedding backend down"));
    }

    #[tokio::test]
    async fn load_text_reports_inserted_count() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Orders above 10,000 EUR receive a 5% discount.").unwrap();
        writeln!(file, "Payment terms are net 30.").unwrap();

        let state = test_state(file.path().to_path_buf(), false);
        let app = build_router(state.clone(), &GatewayConfig::default());

        let req = Request::builder()
            .method("POST")
            .uri("/load-text")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["insertedCount"], 2);

        let response = build_router(state, &GatewayConfig::default())
            .oneshot(ask_request(r#"{"question": "Explain the payment terms"}"#, None))
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["intent"], "vector");
        assert_eq!(json["modelUsed"], "primary");
    }

    #[tokio::test]
    async fn missing_source_is_500() {
        let app = build_router(
            test_state(PathBuf::from("/nonexistent/sales_context.txt"), false),
            &GatewayConfig::default(),
        );
        let req = Request::builder()
            .method("POST")
            .uri("/load-text")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn rate_limit_applies_after_budget() {
        let config = GatewayConfig {
            requests_per_minute: 1,
            ..GatewayConfig::default()
        };
        let app = build_router(test_state(PathBuf::from("x"), false), &config);

        let first = app
            .clone()
            .oneshot(ask_request(r#"{"question": ""}"#, None))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(ask_request(r#"{"question": ""}"#, None))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn rate_limiter_tracks_clients_separately() {
        let limiter = RateLimiter::new(1, std::time::Duration::from_secs(60));
        assert!(limiter.check("a"));
        assert!(!limiter.check("a"));
        assert!(limiter.check("b"));
    }
}
