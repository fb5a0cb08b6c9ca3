//! Trait seams between the orchestrator and its external collaborators.
//!
//! These traits live in `switchboard-common` so that the orchestrator,
//! the classifier, and the agent crates can reference them without
//! circular dependencies.

use crate::{Result, RoutingDecision};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Context handed to a domain agent along with a resolved query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryContext {
    /// Action being performed, currently always "query".
    pub action: String,

    /// The routing decision that selected this agent.
    pub routing: RoutingDecision,
}

impl QueryContext {
    pub fn query(routing: RoutingDecision) -> Self {
        Self {
            action: "query".into(),
            routing,
        }
    }
}

/// Maps a free-text query to a target platform with a confidence and an
/// ambiguity signal.
///
/// The production implementation is LLM-backed and therefore
/// non-deterministic; tests must inject a deterministic stub.
/// An `Err` from `route` is fatal to the current turn.
#[async_trait]
pub trait RoutingClassifier: Send + Sync {
    async fn route(&self, query: &str) -> Result<RoutingDecision>;
}

/// Answers a resolved (query, user) pair for one platform.
#[async_trait]
pub trait DomainAgent: Send + Sync {
    /// The platform this agent serves.
    fn kind(&self) -> crate::AgentKind;

    /// Human-readable agent name.
    fn name(&self) -> &'static str {
        self.kind().display_name()
    }

    /// Execute a query on behalf of a configured user and return
    /// formatted text. May fail; the orchestrator degrades failures to a
    /// user-visible message rather than aborting the conversation.
    async fn execute(&self, query: &str, user_id: &str, context: &QueryContext) -> Result<String>;
}
