//! Application state for the API server.

use std::collections::HashMap;
use std::sync::Arc;
use switchboard_common::{DomainAgent, RoutingClassifier, UserDirectory};
use switchboard_orchestrator::Orchestrator;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Shared application state for the API server.
///
/// Each conversation id owns one [`Orchestrator`] behind its own mutex,
/// so clarification dialogues in different conversations never block
/// each other while turns within a conversation stay sequential.
pub struct AppState {
    classifier: Arc<dyn RoutingClassifier>,
    agents: Vec<Arc<dyn DomainAgent>>,
    directory: UserDirectory,
    sessions: RwLock<HashMap<String, Arc<Mutex<Orchestrator>>>>,

    /// Whether a classifier API key was resolved at startup.
    pub llm_enabled: bool,

    /// Server start time (for health checks)
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(
        classifier: Arc<dyn RoutingClassifier>,
        agents: Vec<Arc<dyn DomainAgent>>,
        directory: UserDirectory,
        llm_enabled: bool,
    ) -> Self {
        Self {
            classifier,
            agents,
            directory,
            sessions: RwLock::new(HashMap::new()),
            llm_enabled,
            start_time: std::time::Instant::now(),
        }
    }

    /// Fetch the orchestrator for a conversation, creating it on first use.
    pub async fn conversation(&self, id: &str) -> Arc<Mutex<Orchestrator>> {
        if let Some(orchestrator) = self.sessions.read().await.get(id) {
            return orchestrator.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(conversation_id = %id, "Creating conversation session");
                let mut orchestrator =
                    Orchestrator::new(self.classifier.clone(), self.directory.clone());
                for agent in &self.agents {
                    orchestrator.register_agent(agent.clone());
                }
                Arc::new(Mutex::new(orchestrator))
            })
            .clone()
    }

    /// Drop a conversation's session. Returns false if it never existed.
    pub async fn remove_conversation(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Get the uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
