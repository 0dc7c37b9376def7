//! Axum-based API gateway: the "ask" transport in front of the broker core.
//! Config-driven via AppConfig.

use axum::{
    extract::Json,
    extract::State,
    routing::{get, post},
    Router,
};
use mylead_core::{
    AppConfig, CompletionClient, KnowledgeStore, PromptAssembler, RequestOrchestrator,
    SessionContext,
};
use mylead_model::ModelRouter;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!(
            "[mylead-gateway] .env not loaded: {} (using system environment)",
            e
        );
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().expect("load AppConfig");
    let knowledge = Arc::new(KnowledgeStore::load(&config.knowledge_path));
    let model: Arc<dyn CompletionClient> = Arc::new(ModelRouter::from_config(&config));
    tracing::info!(
        model = model.model_id(),
        knowledge_entries = knowledge.len(),
        "backend ready"
    );

    let orchestrator = Arc::new(
        RequestOrchestrator::new(knowledge, model, config.persona.clone())
            .with_assembler(PromptAssembler::new(config.system_role_supported))
            .with_top_n(config.top_n),
    );

    let app = build_app(AppState { orchestrator });

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("{} listening on {}", config.app_name, addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), app)
        .await
        .unwrap();
}

fn build_app(state: AppState) -> Router {
    // The chat widget is served from another origin; the API carries no
    // credentials, so a permissive policy is sufficient here.
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/ask", post(ask))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) orchestrator: Arc<RequestOrchestrator>,
}

/// GET /api/v1/health – liveness check for UI and scripts.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// Ask request from the chat frontend.
#[derive(serde::Deserialize)]
struct AskRequest {
    #[serde(default)]
    query: String,
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    first_turn: bool,
}

/// POST /api/v1/ask – routes the question through the broker pipeline.
/// Degraded answers are still HTTP 200: the failure contract is carried in
/// the response text, never in the status code.
async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> axum::Json<serde_json::Value> {
    let correlation_id = uuid::Uuid::new_v4();
    tracing::info!(
        target: "mylead::gateway",
        %correlation_id,
        chars = req.query.len(),
        first_turn = req.first_turn,
        "ask request received"
    );

    let session = SessionContext {
        query: req.query,
        display_name: req.user_name,
        first_turn: req.first_turn,
    };
    let answer = state.orchestrator.handle(&session).await;

    tracing::info!(
        target: "mylead::gateway",
        %correlation_id,
        outcome = ?answer.outcome,
        "ask request completed"
    );
    axum::Json(serde_json::json!({ "response": answer.text }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use mylead_core::{
        CompletionError, CompletionOutput, GenerationConfig, PersonaProfile, PromptSegment,
        EMPTY_QUERY_REPLY,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    struct ScriptedModel {
        fragments: Option<Vec<&'static str>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedModel {
        fn answering(fragments: Vec<&'static str>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    fragments: Some(fragments),
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }

        fn failing() -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    fragments: None,
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }
    }

    #[async_trait::async_trait]
    impl CompletionClient for ScriptedModel {
        fn model_id(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _segments: &[PromptSegment],
            _config: &GenerationConfig,
        ) -> Result<CompletionOutput, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.fragments {
                Some(fragments) => {
                    let (tx, rx) = mpsc::channel(fragments.len().max(1));
                    for fragment in fragments {
                        tx.send(Ok(fragment.to_string())).await.unwrap();
                    }
                    Ok(CompletionOutput::Stream(rx))
                }
                None => Err(CompletionError::Transport("connection refused".into())),
            }
        }
    }

    fn test_app(model: ScriptedModel) -> Router {
        let orchestrator = Arc::new(RequestOrchestrator::new(
            Arc::new(KnowledgeStore::empty()),
            Arc::new(model),
            PersonaProfile::default(),
        ));
        build_app(AppState { orchestrator })
    }

    async fn post_ask(app: Router, body: serde_json::Value) -> serde_json::Value {
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/ask")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let (model, _) = ScriptedModel::answering(vec!["unused"]);
        let req = Request::builder()
            .method("GET")
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();
        let res = test_app(model).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_ask_aggregates_streamed_fragments() {
        let (model, calls) = ScriptedModel::answering(vec!["Hello", " ", "world"]);
        let json = post_ask(
            test_app(model),
            serde_json::json!({ "query": "say hello", "user_name": "jane.doe@example.com", "first_turn": true }),
        )
        .await;
        assert_eq!(json["response"], "Hello world");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_query_skips_the_model() {
        let (model, calls) = ScriptedModel::answering(vec!["unused"]);
        let json = post_ask(test_app(model), serde_json::json!({ "query": "" })).await;
        assert_eq!(json["response"], EMPTY_QUERY_REPLY);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_query_field_is_treated_as_empty() {
        let (model, calls) = ScriptedModel::answering(vec!["unused"]);
        let json = post_ask(test_app(model), serde_json::json!({})).await;
        assert_eq!(json["response"], EMPTY_QUERY_REPLY);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_completion_failure_degrades_to_fixed_answer_with_200() {
        let (model, _) = ScriptedModel::failing();
        let json = post_ask(
            test_app(model),
            serde_json::json!({ "query": "is the portal down?" }),
        )
        .await;
        assert_eq!(
            json["response"],
            "MyLEAD is currently unavailable. Please try again later."
        );
    }
}
