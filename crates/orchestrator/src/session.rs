//! The per-conversation clarification state machine.

use crate::resolver::UserResolver;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use switchboard_common::{
    AgentKind, ClarificationType, DomainAgent, QueryContext, Result, RoutingClassifier,
    RoutingDecision, UserDirectory,
};
use tracing::{error, info, warn};

/// Fixed response for queries outside every agent's scope.
const REJECTION: &str = "I cannot answer this question";

/// Which answer the conversation is currently waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Awaiting {
    AgentChoice,
    UserChoice,
}

/// The single in-flight disambiguation record a conversation may hold.
///
/// Created when either the platform or the user cannot be determined;
/// destroyed the moment a query is fully resolved and dispatched, or on
/// an explicit reset. Serializable so a deployment can externalize it to
/// a session store keyed by conversation id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingClarification {
    /// Target platform, once known.
    pub agent: Option<AgentKind>,

    /// The interrupted query, replayed verbatim after clarification.
    pub original_query: String,

    /// The classifier verdict for the original query, reused on dispatch.
    pub routing: RoutingDecision,

    /// Which answer we are waiting for.
    pub awaiting: Awaiting,
}

/// Drives one conversation: classification, user resolution, clarification,
/// and dispatch to domain agents.
///
/// Holds at most one pending clarification at any time. Scoped to exactly
/// one conversation; a server handling many users must create one
/// `Orchestrator` per conversation. `process_query` takes `&mut self`, so
/// turns within a conversation are strictly sequential.
pub struct Orchestrator {
    classifier: Arc<dyn RoutingClassifier>,
    agents: HashMap<AgentKind, Arc<dyn DomainAgent>>,
    resolver: UserResolver,
    directory: UserDirectory,
    pending: Option<PendingClarification>,
}

impl Orchestrator {
    pub fn new(classifier: Arc<dyn RoutingClassifier>, directory: UserDirectory) -> Self {
        Self {
            classifier,
            agents: HashMap::new(),
            resolver: UserResolver::new(&directory),
            directory,
            pending: None,
        }
    }

    /// Register the agent serving a platform. Last registration wins.
    pub fn register_agent(&mut self, agent: Arc<dyn DomainAgent>) {
        self.agents.insert(agent.kind(), agent);
    }

    /// The pending clarification, if the conversation is mid-dialogue.
    pub fn pending(&self) -> Option<&PendingClarification> {
        self.pending.as_ref()
    }

    /// Clear any pending clarification. Used for new sessions and test
    /// isolation.
    pub fn reset(&mut self) {
        self.pending = None;
    }

    /// Process one conversational turn.
    ///
    /// A classifier failure is fatal to the turn and leaves state
    /// untouched; an agent failure is degraded to a user-visible message.
    pub async fn process_query(&mut self, query: &str) -> Result<String> {
        if self.pending.is_some() {
            return self.handle_clarification_response(query).await;
        }

        let decision = self.classifier.route(query).await?;
        info!(
            agent = ?decision.agent,
            confidence = decision.confidence,
            ambiguous = decision.ambiguous,
            "Routing decision"
        );

        // Out-of-scope wins even when the decision is also flagged ambiguous.
        let Some(agent_kind) = decision.agent else {
            return Ok(REJECTION.into());
        };

        if decision.ambiguous && decision.clarification_type == Some(ClarificationType::Agent) {
            let prompt = agent_choice_prompt();
            self.pending = Some(PendingClarification {
                agent: None,
                original_query: query.to_string(),
                routing: decision,
                awaiting: Awaiting::AgentChoice,
            });
            return Ok(prompt);
        }

        let resolution = self.resolver.resolve(query);
        info!(
            user = ?resolution.user_id,
            reason = %resolution.reason,
            "User resolution"
        );

        let Some(user_id) = resolution.user_id else {
            let message = self
                .resolver
                .clarification_message(agent_kind.display_name());
            self.pending = Some(PendingClarification {
                agent: Some(agent_kind),
                original_query: query.to_string(),
                routing: decision,
                awaiting: Awaiting::UserChoice,
            });
            return Ok(message);
        };

        self.dispatch(agent_kind, query, &user_id, decision).await
    }

    /// Interpret the turn as an answer to the outstanding question.
    async fn handle_clarification_response(&mut self, response: &str) -> Result<String> {
        // Caller checked; a missing record means a fresh turn was routed here.
        let awaiting = match self.pending.as_ref() {
            Some(pending) => pending.awaiting,
            None => return Ok(REJECTION.into()),
        };

        match awaiting {
            Awaiting::AgentChoice => self.resume_with_agent_choice(response).await,
            Awaiting::UserChoice => self.resume_with_user_choice(response).await,
        }
    }

    /// Resume after asking "Which platform?".
    ///
    /// The user is re-resolved from the original stored query, not from
    /// the clarification answer.
    async fn resume_with_agent_choice(&mut self, response: &str) -> Result<String> {
        let Some(agent_kind) = AgentKind::scan(response) else {
            return Ok(agent_choice_reprompt());
        };

        let Some(mut pending) = self.pending.take() else {
            return Ok(REJECTION.into());
        };
        pending.agent = Some(agent_kind);

        let resolution = self.resolver.resolve(&pending.original_query);
        match resolution.user_id {
            Some(user_id) => {
                self.dispatch(agent_kind, &pending.original_query, &user_id, pending.routing)
                    .await
            }
            None => {
                pending.awaiting = Awaiting::UserChoice;
                self.pending = Some(pending);
                Ok(self
                    .resolver
                    .clarification_message(agent_kind.display_name()))
            }
        }
    }

    /// Resume after asking whose data the query is about.
    async fn resume_with_user_choice(&mut self, response: &str) -> Result<String> {
        let Some(pending) = self.pending.take() else {
            return Ok(REJECTION.into());
        };

        let Some(user_id) = self.resolver.resolve_clarification_response(response) else {
            let agent_name = pending
                .agent
                .map(|a| a.display_name())
                .unwrap_or("platform");
            let message = self.resolver.clarification_message(agent_name);
            self.pending = Some(pending);
            return Ok(message);
        };

        let Some(agent_kind) = pending.agent else {
            // A user-choice record always carries its platform; a missing
            // one means the record was corrupted externally.
            warn!("Pending user clarification without a platform, rejecting");
            return Ok(REJECTION.into());
        };

        self.dispatch(agent_kind, &pending.original_query, &user_id, pending.routing)
            .await
    }

    /// Invoke the selected agent with the resolved query.
    ///
    /// Agent failures are soft: converted to a displayable string, state
    /// already back to idle. Directory inconsistencies are hard errors.
    async fn dispatch(
        &self,
        agent_kind: AgentKind,
        query: &str,
        user_id: &str,
        routing: RoutingDecision,
    ) -> Result<String> {
        // Resolver output must exist in the directory; a miss is an
        // internal inconsistency, not a user mistake.
        let user = self.directory.get(user_id)?;

        let Some(agent) = self.agents.get(&agent_kind) else {
            warn!(agent = %agent_kind, "No agent registered for platform");
            return Ok(format!(
                "The {agent_kind} agent is not available right now."
            ));
        };

        info!(agent = %agent_kind, user = %user.id, "Dispatching query");

        let context = QueryContext::query(routing);
        match agent.execute(query, user_id, &context).await {
            Ok(response) => Ok(response),
            Err(e) => {
                error!(agent = %agent_kind, error = %e, "Agent execution failed");
                Ok(format!(
                    "An error occurred while processing your request: {e}"
                ))
            }
        }
    }
}

fn platform_names() -> String {
    let names: Vec<&str> = AgentKind::ALL.iter().map(|a| a.display_name()).collect();
    names.join(" or ")
}

fn agent_choice_prompt() -> String {
    format!("Which platform? {}?", platform_names())
}

fn agent_choice_reprompt() -> String {
    format!(
        "I can help with that! Are you asking about {}?",
        platform_names()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_enumerate_known_platforms() {
        assert_eq!(agent_choice_prompt(), "Which platform? GitHub or Linear?");
        assert_eq!(
            agent_choice_reprompt(),
            "I can help with that! Are you asking about GitHub or Linear?"
        );
    }

    #[test]
    fn pending_clarification_roundtrips_exactly() {
        let pending = PendingClarification {
            agent: Some(AgentKind::Linear),
            original_query: "Show me issues".into(),
            routing: RoutingDecision {
                agent: Some(AgentKind::Linear),
                confidence: 0.7,
                reasoning: "issue keyword".into(),
                ambiguous: true,
                clarification_type: Some(ClarificationType::User),
            },
            awaiting: Awaiting::UserChoice,
        };

        let json = serde_json::to_string(&pending).unwrap();
        let back: PendingClarification = serde_json::from_str(&json).unwrap();

        assert_eq!(back.agent, Some(AgentKind::Linear));
        assert_eq!(back.original_query, "Show me issues");
        assert_eq!(back.awaiting, Awaiting::UserChoice);
        assert_eq!(back.routing.confidence, 0.7);
        assert_eq!(
            back.routing.clarification_type,
            Some(ClarificationType::User)
        );
    }
}
