//! Integration tests for the API layer.
//!
//! These tests spin up a real HTTP server on a random port with a
//! keyword-based classifier and canned agents, so multi-turn
//! clarification dialogues run end to end without any network calls.

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use switchboard_api::{create_router, AppState};
use switchboard_common::{
    AgentKind, DomainAgent, QueryContext, Result, RoutingClassifier, RoutingDecision,
    UserDirectory, UserIdentity,
};

/// Deterministic classifier: routes by platform keyword, flags bare
/// "issues" as ambiguous, and rejects everything else.
struct KeywordClassifier;

#[async_trait]
impl RoutingClassifier for KeywordClassifier {
    async fn route(&self, query: &str) -> Result<RoutingDecision> {
        let lower = query.to_lowercase();
        if lower.contains("github") || lower.contains("repo") {
            Ok(RoutingDecision::to(AgentKind::GitHub))
        } else if lower.contains("linear") || lower.contains("sprint") {
            Ok(RoutingDecision::to(AgentKind::Linear))
        } else if lower.contains("issue") {
            Ok(RoutingDecision::ambiguous_agent(
                "Issues exist on both platforms",
            ))
        } else {
            Ok(RoutingDecision::out_of_scope("Unrelated query"))
        }
    }
}

/// Agent that answers with a canned line naming the platform and user.
struct CannedAgent(AgentKind);

#[async_trait]
impl DomainAgent for CannedAgent {
    fn kind(&self) -> AgentKind {
        self.0
    }

    async fn execute(&self, _query: &str, user_id: &str, _context: &QueryContext) -> Result<String> {
        Ok(format!("{} data for {}", self.0, user_id))
    }
}

fn alice_and_bob() -> UserDirectory {
    UserDirectory::new(vec![
        UserIdentity {
            id: "user1".into(),
            username: "alice-dev".into(),
            display_name: "Alice".into(),
        },
        UserIdentity {
            id: "user2".into(),
            username: "bob-codes".into(),
            display_name: "Bob".into(),
        },
    ])
}

/// Spin up a test server on a random port and return the base URL.
async fn start_test_server() -> String {
    let agents: Vec<Arc<dyn DomainAgent>> = vec![
        Arc::new(CannedAgent(AgentKind::GitHub)),
        Arc::new(CannedAgent(AgentKind::Linear)),
    ];
    let state = Arc::new(AppState::new(
        Arc::new(KeywordClassifier),
        agents,
        alice_and_bob(),
        false,
    ));
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    format!("http://{}", addr)
}

/// Helper to GET a URL and return (status, body_json).
async fn get(base: &str, path: &str) -> (u16, serde_json::Value) {
    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{}{}", base, path))
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    let body = resp.json().await.unwrap();
    (status, body)
}

/// Helper to POST JSON and return (status, body_json).
async fn post_json(base: &str, path: &str, json: serde_json::Value) -> (u16, serde_json::Value) {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}{}", base, path))
        .json(&json)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    let body = resp.json().await.unwrap();
    (status, body)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[tokio::test]
async fn health_endpoint_reports_status() {
    let base = start_test_server().await;
    let (status, body) = get(&base, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["llm_enabled"], false);
}

// ============================================================================
// Query endpoint
// ============================================================================

#[tokio::test]
async fn query_without_conversation_id_generates_one() {
    let base = start_test_server().await;
    let (status, body) = post_json(
        &base,
        "/api/v1/query",
        serde_json::json!({"query": "Show me Alice's GitHub repos"}),
    )
    .await;
    assert_eq!(status, 200);
    assert!(!body["conversation_id"].as_str().unwrap().is_empty());
    assert_eq!(body["response"], "GitHub data for user1");
}

#[tokio::test]
async fn empty_query_is_rejected_with_400() {
    let base = start_test_server().await;
    let (status, body) = post_json(
        &base,
        "/api/v1/query",
        serde_json::json!({"query": "   "}),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "EMPTY_QUERY");
}

#[tokio::test]
async fn out_of_scope_query_gets_in_band_rejection() {
    let base = start_test_server().await;
    let (status, body) = post_json(
        &base,
        "/api/v1/query",
        serde_json::json!({"query": "What's the weather like?"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["response"], "I cannot answer this question");
}

#[tokio::test]
async fn clarification_dialogue_spans_turns_on_one_conversation() {
    let base = start_test_server().await;

    // Ambiguous platform: the server asks which one.
    let (status, body) = post_json(
        &base,
        "/api/v1/query",
        serde_json::json!({"query": "Show me Alice's open issues", "conversation_id": "conv-1"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["response"], "Which platform? GitHub or Linear?");

    // The answer on the same conversation id resumes the original query;
    // Alice was already named, so it dispatches directly.
    let (status, body) = post_json(
        &base,
        "/api/v1/query",
        serde_json::json!({"query": "Linear", "conversation_id": "conv-1"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["response"], "Linear data for user1");
}

#[tokio::test]
async fn conversations_are_isolated() {
    let base = start_test_server().await;

    // conv-a is left mid-clarification.
    let (_, body) = post_json(
        &base,
        "/api/v1/query",
        serde_json::json!({"query": "Show me Bob's issues", "conversation_id": "conv-a"}),
    )
    .await;
    assert_eq!(body["response"], "Which platform? GitHub or Linear?");

    // conv-b starts fresh and is unaffected.
    let (_, body) = post_json(
        &base,
        "/api/v1/query",
        serde_json::json!({"query": "Show me Bob's GitHub repos", "conversation_id": "conv-b"}),
    )
    .await;
    assert_eq!(body["response"], "GitHub data for user2");
}

// ============================================================================
// Reset endpoint
// ============================================================================

#[tokio::test]
async fn reset_drops_pending_clarification() {
    let base = start_test_server().await;

    let (_, body) = post_json(
        &base,
        "/api/v1/query",
        serde_json::json!({"query": "Show me Alice's issues", "conversation_id": "conv-r"}),
    )
    .await;
    assert_eq!(body["response"], "Which platform? GitHub or Linear?");

    let (status, body) = post_json(
        &base,
        "/api/v1/reset",
        serde_json::json!({"conversation_id": "conv-r"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["cleared"], true);

    // After reset, "Linear" is a fresh query, not a clarification answer.
    let (_, body) = post_json(
        &base,
        "/api/v1/query",
        serde_json::json!({"query": "Show Bob's Linear sprint", "conversation_id": "conv-r"}),
    )
    .await;
    assert_eq!(body["response"], "Linear data for user2");
}

#[tokio::test]
async fn reset_of_unknown_conversation_is_a_noop() {
    let base = start_test_server().await;
    let (status, body) = post_json(
        &base,
        "/api/v1/reset",
        serde_json::json!({"conversation_id": "never-seen"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["cleared"], false);
}
