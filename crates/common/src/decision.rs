//! Routing decision types produced by the classifier.

use serde::{Deserialize, Serialize};

/// The platforms a query can be routed to.
///
/// A closed set: adding a platform means adding a variant here and an
/// agent implementation, never a new string tag at a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    GitHub,
    Linear,
}

impl AgentKind {
    /// All known platforms, in prompt/display order.
    pub const ALL: &'static [AgentKind] = &[AgentKind::GitHub, AgentKind::Linear];

    /// Human-readable platform name, as used in clarification prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentKind::GitHub => "GitHub",
            AgentKind::Linear => "Linear",
        }
    }

    /// Scan free text for a platform name (case-insensitive substring).
    ///
    /// Used when interpreting a clarification answer such as "the linear one".
    pub fn scan(text: &str) -> Option<AgentKind> {
        let lower = text.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| lower.contains(&kind.display_name().to_lowercase()))
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// What kind of follow-up question an ambiguous query needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClarificationType {
    Agent,
    User,
}

/// The classifier's verdict for a single fresh query.
///
/// Produced once per query, immutable, and reused verbatim if stored in a
/// pending clarification. `agent: None` means the query is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Target platform, or `None` when the query is out of scope.
    pub agent: Option<AgentKind>,

    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,

    /// Reasoning for the decision
    pub reasoning: String,

    /// Whether the query needs clarification before dispatch.
    #[serde(default)]
    pub ambiguous: bool,

    /// What the clarification should ask about, when `ambiguous` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarification_type: Option<ClarificationType>,
}

impl RoutingDecision {
    /// An unambiguous decision for the given platform.
    pub fn to(agent: AgentKind) -> Self {
        Self {
            agent: Some(agent),
            confidence: 1.0,
            reasoning: format!("Routing to {agent}"),
            ambiguous: false,
            clarification_type: None,
        }
    }

    /// A decision rejecting the query as out of scope.
    pub fn out_of_scope(reasoning: impl Into<String>) -> Self {
        Self {
            agent: None,
            confidence: 1.0,
            reasoning: reasoning.into(),
            ambiguous: false,
            clarification_type: None,
        }
    }

    /// A decision that cannot choose between platforms.
    pub fn ambiguous_agent(reasoning: impl Into<String>) -> Self {
        Self {
            agent: Some(AgentKind::GitHub),
            confidence: 0.5,
            reasoning: reasoning.into(),
            ambiguous: true,
            clarification_type: Some(ClarificationType::Agent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&AgentKind::GitHub).unwrap(),
            "\"github\""
        );
        assert_eq!(
            serde_json::to_string(&AgentKind::Linear).unwrap(),
            "\"linear\""
        );
    }

    #[test]
    fn scan_finds_platform_in_free_text() {
        assert_eq!(AgentKind::scan("I meant GitHub"), Some(AgentKind::GitHub));
        assert_eq!(AgentKind::scan("the linear one"), Some(AgentKind::Linear));
        assert_eq!(AgentKind::scan("neither, thanks"), None);
    }

    #[test]
    fn decision_serialization_roundtrip() {
        let decision = RoutingDecision {
            agent: Some(AgentKind::Linear),
            confidence: 0.85,
            reasoning: "Query mentions sprints".to_string(),
            ambiguous: true,
            clarification_type: Some(ClarificationType::User),
        };
        let json = serde_json::to_string(&decision).unwrap();
        let back: RoutingDecision = serde_json::from_str(&json).unwrap();
        assert_eq!(back.agent, Some(AgentKind::Linear));
        assert_eq!(back.confidence, 0.85);
        assert!(back.ambiguous);
        assert_eq!(back.clarification_type, Some(ClarificationType::User));
    }

    #[test]
    fn out_of_scope_has_no_agent() {
        let decision = RoutingDecision::out_of_scope("weather question");
        assert!(decision.agent.is_none());
        assert!(!decision.ambiguous);
    }
}
