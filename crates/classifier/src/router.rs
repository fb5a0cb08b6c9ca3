//! LLM-based query routing with a hardened JSON contract.
//!
//! The model is instructed to emit a single JSON object; the parser
//! validates the agent value against the known platforms, clamps the
//! confidence, and truncates over-long reasoning before anything reaches
//! the orchestrator.

use crate::chat::ChatModel;
use async_trait::async_trait;
use switchboard_common::{
    AgentKind, ClarificationType, Result, RoutingClassifier, RoutingDecision, SwitchboardError,
};
use tracing::{debug, info, warn};

/// Maximum length for the reasoning field.
const MAX_REASONING_LENGTH: usize = 500;

/// Maximum length for user input sent to the model.
const MAX_QUERY_LENGTH: usize = 10_000;

/// System prompt for the routing model.
///
/// Instructs the LLM to analyze queries and output structured JSON
/// routing decisions.
const ROUTING_SYSTEM_PROMPT: &str = r#"You are an intelligent routing agent for a multi-agent query system.

Your job is to analyze user queries and determine which specialized agent should handle them.

IMPORTANT: Respond ONLY with a JSON object, no other text. The JSON must have this exact structure:

{
  "agent": "github|linear|out_of_scope",
  "confidence": 0.0-1.0,
  "reasoning": "brief explanation of why this agent was chosen",
  "requires_clarification": true|false,
  "clarification_type": "agent|user|null"
}

Agent definitions:
- "github": GitHub-related queries - repositories, pull requests, PRs, stars, forks, commits, branches, code reviews
- "linear": Linear project management queries - issues, tasks, projects, teams, sprints, cycles
- "out_of_scope": queries unrelated to GitHub or Linear - weather, general questions, chit-chat

Guidelines:
- If the query mentions "GitHub", "repository", "pull request", "PR" -> github
- If the query mentions "Linear", "task", "project", "sprint" -> linear
- "issues" can mean GitHub issues OR Linear issues: if the platform is not named, set requires_clarification=true and clarification_type="agent"
- If the query is about weather, general chat, etc -> out_of_scope
- Be confident in your routing decisions and provide clear reasoning

Examples:

User: "Show me Alice's repositories"
{"agent":"github","confidence":0.95,"reasoning":"Repositories are a GitHub concept","requires_clarification":false,"clarification_type":null}

User: "What is Bob working on this sprint?"
{"agent":"linear","confidence":0.9,"reasoning":"Sprints are a Linear concept","requires_clarification":false,"clarification_type":null}

User: "Show me open issues"
{"agent":"github","confidence":0.5,"reasoning":"Issues exist on both GitHub and Linear","requires_clarification":true,"clarification_type":"agent"}

User: "What's the weather today?"
{"agent":"out_of_scope","confidence":0.99,"reasoning":"Weather is unrelated to GitHub or Linear","requires_clarification":false,"clarification_type":null}"#;

/// The production [`RoutingClassifier`], backed by a chat model.
pub struct LlmClassifier<M: ChatModel> {
    model: M,
}

impl<M: ChatModel> LlmClassifier<M> {
    pub fn new(model: M) -> Self {
        info!(model = %model.model_name(), "Initialized LLM routing classifier");
        Self { model }
    }
}

#[async_trait]
impl<M: ChatModel> RoutingClassifier for LlmClassifier<M> {
    async fn route(&self, query: &str) -> Result<RoutingDecision> {
        if query.len() > MAX_QUERY_LENGTH {
            return Err(SwitchboardError::Classification(format!(
                "Query exceeds maximum length of {MAX_QUERY_LENGTH} bytes"
            )));
        }

        debug!(
            query_preview = %query.chars().take(50).collect::<String>(),
            "Routing query"
        );

        let response = self.model.complete(ROUTING_SYSTEM_PROMPT, query).await?;
        debug!(response = %response, "Classifier response");

        let decision = parse_decision(&response)?;
        info!(
            agent = ?decision.agent,
            confidence = decision.confidence,
            reasoning = %decision.reasoning,
            "LLM routing decision"
        );
        Ok(decision)
    }
}

/// Parse and validate the model's JSON verdict.
fn parse_decision(response: &str) -> Result<RoutingDecision> {
    let json_str = extract_json_object(response).ok_or_else(|| {
        SwitchboardError::Classification(format!(
            "No valid JSON found in response: {}",
            response.chars().take(200).collect::<String>()
        ))
    })?;

    let parsed: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| SwitchboardError::Classification(format!("Invalid JSON: {e}")))?;

    let agent = match parsed.get("agent").and_then(|v| v.as_str()) {
        Some("github") => Some(AgentKind::GitHub),
        Some("linear") => Some(AgentKind::Linear),
        Some("out_of_scope") => None,
        other => {
            warn!(agent = ?other, "Unknown agent in classifier response, treating as out of scope");
            None
        }
    };

    let confidence = parsed
        .get("confidence")
        .and_then(|v| v.as_f64())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(0.5) as f32;

    let reasoning = parsed
        .get("reasoning")
        .and_then(|v| v.as_str())
        .unwrap_or("No reasoning provided");
    let reasoning = if reasoning.len() > MAX_REASONING_LENGTH {
        reasoning
            .chars()
            .take(MAX_REASONING_LENGTH)
            .collect::<String>()
            + "..."
    } else {
        reasoning.to_string()
    };

    let ambiguous = parsed
        .get("requires_clarification")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let clarification_type = match parsed.get("clarification_type").and_then(|v| v.as_str()) {
        Some("agent") => Some(ClarificationType::Agent),
        Some("user") => Some(ClarificationType::User),
        _ => None,
    };

    Ok(RoutingDecision {
        agent,
        confidence,
        reasoning,
        ambiguous,
        clarification_type,
    })
}

/// Extract a JSON object from a string that may contain other text.
fn extract_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0;
    let mut end = start;

    for (i, c) in s[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = start + i + 1;
                    break;
                }
            }
            _ => {}
        }
    }

    if depth == 0 && end > start {
        Some(&s[start..end])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_object_simple() {
        let input = r#"{"agent":"github","confidence":0.9}"#;
        assert_eq!(extract_json_object(input), Some(input));
    }

    #[test]
    fn extract_json_object_with_surrounding_text() {
        let input = r#"Here is the decision: {"agent":"github","confidence":0.9} Done!"#;
        assert_eq!(
            extract_json_object(input),
            Some(r#"{"agent":"github","confidence":0.9}"#)
        );
    }

    #[test]
    fn extract_json_object_nested() {
        let input = r#"{"agent":"linear","meta":{"nested":true}}"#;
        assert_eq!(extract_json_object(input), Some(input));
    }

    #[test]
    fn extract_json_object_absent_or_incomplete() {
        assert_eq!(extract_json_object("No JSON here"), None);
        assert_eq!(extract_json_object(r#"{"agent":"github"#), None);
    }

    #[test]
    fn parse_github_decision() {
        let response = r#"{"agent":"github","confidence":0.95,"reasoning":"Repositories are a GitHub concept","requires_clarification":false,"clarification_type":null}"#;
        let decision = parse_decision(response).unwrap();
        assert_eq!(decision.agent, Some(AgentKind::GitHub));
        assert_eq!(decision.confidence, 0.95);
        assert!(!decision.ambiguous);
        assert!(decision.clarification_type.is_none());
    }

    #[test]
    fn parse_out_of_scope_decision() {
        let response = r#"{"agent":"out_of_scope","confidence":0.99,"reasoning":"Weather","requires_clarification":false}"#;
        let decision = parse_decision(response).unwrap();
        assert!(decision.agent.is_none());
    }

    #[test]
    fn parse_ambiguous_agent_decision() {
        let response = r#"{"agent":"github","confidence":0.5,"reasoning":"Issues exist on both platforms","requires_clarification":true,"clarification_type":"agent"}"#;
        let decision = parse_decision(response).unwrap();
        assert!(decision.ambiguous);
        assert_eq!(decision.clarification_type, Some(ClarificationType::Agent));
    }

    #[test]
    fn parse_unknown_agent_falls_back_to_out_of_scope() {
        let response = r#"{"agent":"shell","confidence":0.9,"reasoning":"nope"}"#;
        let decision = parse_decision(response).unwrap();
        assert!(decision.agent.is_none());
    }

    #[test]
    fn parse_clamps_confidence() {
        let response = r#"{"agent":"github","confidence":999.0,"reasoning":"x"}"#;
        let decision = parse_decision(response).unwrap();
        assert_eq!(decision.confidence, 1.0);
    }

    #[test]
    fn parse_defaults_for_missing_fields() {
        let response = r#"{"agent":"linear"}"#;
        let decision = parse_decision(response).unwrap();
        assert_eq!(decision.agent, Some(AgentKind::Linear));
        assert_eq!(decision.confidence, 0.5);
        assert_eq!(decision.reasoning, "No reasoning provided");
        assert!(!decision.ambiguous);
    }

    #[test]
    fn parse_truncates_long_reasoning() {
        let long = "r".repeat(MAX_REASONING_LENGTH + 100);
        let response = format!(r#"{{"agent":"github","confidence":0.8,"reasoning":"{long}"}}"#);
        let decision = parse_decision(&response).unwrap();
        assert_eq!(decision.reasoning.len(), MAX_REASONING_LENGTH + 3);
        assert!(decision.reasoning.ends_with("..."));
    }

    #[test]
    fn parse_rejects_non_json() {
        assert!(parse_decision("Not valid JSON at all").is_err());
    }

    struct CannedModel(String);

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Ok(self.0.clone())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    #[tokio::test]
    async fn route_end_to_end_with_canned_model() {
        let classifier = LlmClassifier::new(CannedModel(
            r#"{"agent":"linear","confidence":0.9,"reasoning":"sprint keyword","requires_clarification":false}"#.into(),
        ));
        let decision = classifier.route("What is Bob's sprint?").await.unwrap();
        assert_eq!(decision.agent, Some(AgentKind::Linear));
    }

    #[tokio::test]
    async fn route_rejects_oversized_query() {
        let classifier = LlmClassifier::new(CannedModel("{}".into()));
        let huge = "x".repeat(MAX_QUERY_LENGTH + 1);
        let err = classifier.route(&huge).await.unwrap_err();
        assert!(matches!(err, SwitchboardError::Classification(_)));
    }
}
