//! Linear domain agent, backed by the Linear GraphQL API.

use crate::CredentialMap;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use switchboard_common::{
    AgentKind, DomainAgent, QueryContext, Result, SwitchboardError, UserDirectory,
};
use tracing::{debug, info};

const DEFAULT_API_BASE: &str = "https://api.linear.app/graphql";

/// What the query is asking for, chosen by keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinearAction {
    Issues,
    Projects,
    Teams,
}

impl LinearAction {
    fn from_query(query: &str) -> Self {
        let lower = query.to_lowercase();
        if lower.contains("issue") {
            LinearAction::Issues
        } else if lower.contains("project") {
            LinearAction::Projects
        } else if lower.contains("team") {
            LinearAction::Teams
        } else {
            LinearAction::Issues
        }
    }
}

/// Workflow-state filter extracted from the query, as a Linear state type.
fn state_filter_from_query(query: &str) -> Option<&'static str> {
    let lower = query.to_lowercase();
    if lower.contains("in progress") || lower.contains("progress") {
        Some("started")
    } else if lower.contains("todo") || lower.contains("to do") {
        Some("unstarted")
    } else if lower.contains("done") || lower.contains("completed") {
        Some("completed")
    } else {
        None
    }
}

fn wants_urgent_only(query: &str) -> bool {
    let lower = query.to_lowercase();
    lower.contains("high priority") || lower.contains("urgent")
}

#[derive(Debug, Deserialize)]
struct IssueNode {
    identifier: String,
    title: String,
    state: StateNode,
    #[serde(default)]
    priority: f64,
}

#[derive(Debug, Deserialize)]
struct StateNode {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ProjectNode {
    name: String,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TeamNode {
    name: String,
    key: String,
}

#[derive(Debug, Deserialize)]
struct Nodes<T> {
    nodes: Vec<T>,
}

const ISSUES_QUERY: &str = r#"
query AssignedIssues($filter: IssueFilter) {
    issues(filter: $filter, first: 20) {
        nodes {
            identifier
            title
            state { name type }
            priority
        }
    }
}
"#;

const PROJECTS_QUERY: &str = r#"
query Projects {
    projects(first: 20) {
        nodes { name state }
    }
}
"#;

const TEAMS_QUERY: &str = r#"
query Teams {
    teams(first: 20) {
        nodes { name key }
    }
}
"#;

/// Agent for Linear project management queries.
pub struct LinearAgent {
    api_base: String,
    http_client: reqwest::Client,
    directory: UserDirectory,
    api_keys: CredentialMap,
}

impl LinearAgent {
    pub fn new(directory: UserDirectory, api_keys: CredentialMap) -> Self {
        Self::with_api_base(DEFAULT_API_BASE.to_string(), directory, api_keys)
    }

    pub fn with_api_base(
        api_base: String,
        directory: UserDirectory,
        api_keys: CredentialMap,
    ) -> Self {
        Self {
            api_base,
            http_client: reqwest::Client::new(),
            directory,
            api_keys,
        }
    }

    /// Execute a GraphQL query and return the `data` object.
    ///
    /// GraphQL errors arrive with HTTP 200, so the body is checked for an
    /// `errors` array as well.
    async fn graphql(
        &self,
        api_key: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let payload = json!({ "query": query, "variables": variables });

        let response = self
            .http_client
            .post(&self.api_base)
            .header("Authorization", api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| SwitchboardError::Agent(format!("Linear request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SwitchboardError::Agent(format!(
                "Linear API error {status}: {body}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SwitchboardError::Agent(format!("Failed to parse Linear response: {e}")))?;

        if let Some(errors) = body.get("errors") {
            return Err(SwitchboardError::Agent(format!(
                "Linear GraphQL errors: {errors}"
            )));
        }

        Ok(body.get("data").cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn issues(&self, api_key: &str, display: &str, query: &str) -> Result<String> {
        let mut filter = json!({ "assignee": { "isMe": { "eq": true } } });
        if let Some(state_type) = state_filter_from_query(query) {
            filter["state"] = json!({ "type": { "eq": state_type } });
        }

        let data = self
            .graphql(api_key, ISSUES_QUERY, json!({ "filter": filter }))
            .await?;
        let issues: Nodes<IssueNode> = serde_json::from_value(
            data.get("issues").cloned().unwrap_or(serde_json::Value::Null),
        )
        .map_err(|e| SwitchboardError::Agent(format!("Unexpected issues payload: {e}")))?;

        let mut nodes = issues.nodes;
        let urgent_only = wants_urgent_only(query);
        if urgent_only {
            // Linear priorities: 1 = urgent, 2 = high.
            nodes.retain(|issue| issue.priority >= 1.0 && issue.priority <= 2.0);
        }

        Ok(format_issues(
            display,
            state_filter_from_query(query),
            urgent_only,
            &nodes,
        ))
    }

    async fn projects(&self, api_key: &str) -> Result<String> {
        let data = self.graphql(api_key, PROJECTS_QUERY, json!({})).await?;
        let projects: Nodes<ProjectNode> = serde_json::from_value(
            data.get("projects").cloned().unwrap_or(serde_json::Value::Null),
        )
        .map_err(|e| SwitchboardError::Agent(format!("Unexpected projects payload: {e}")))?;
        Ok(format_projects(&projects.nodes))
    }

    async fn teams(&self, api_key: &str) -> Result<String> {
        let data = self.graphql(api_key, TEAMS_QUERY, json!({})).await?;
        let teams: Nodes<TeamNode> = serde_json::from_value(
            data.get("teams").cloned().unwrap_or(serde_json::Value::Null),
        )
        .map_err(|e| SwitchboardError::Agent(format!("Unexpected teams payload: {e}")))?;
        Ok(format_teams(&teams.nodes))
    }
}

#[async_trait]
impl DomainAgent for LinearAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Linear
    }

    async fn execute(&self, query: &str, user_id: &str, context: &QueryContext) -> Result<String> {
        let user = self.directory.get(user_id)?;

        let Some(api_key) = self.api_keys.get(user_id) else {
            return Ok(format!(
                "Linear API key not configured for {}",
                user.display_name
            ));
        };

        let action = LinearAction::from_query(query);
        info!(
            user = %user_id,
            action = ?action,
            context_action = %context.action,
            "Executing Linear query"
        );

        let result = match action {
            LinearAction::Issues => self.issues(api_key, &user.display_name, query).await?,
            LinearAction::Projects => self.projects(api_key).await?,
            LinearAction::Teams => self.teams(api_key).await?,
        };

        debug!(
            user = %user_id,
            result_preview = %result.chars().take(100).collect::<String>(),
            "Linear query complete"
        );
        Ok(result)
    }
}

fn format_issues(
    display: &str,
    state_filter: Option<&str>,
    urgent_only: bool,
    issues: &[IssueNode],
) -> String {
    if issues.is_empty() {
        let priority_desc = if urgent_only { " high priority" } else { "" };
        let state_desc = state_filter.unwrap_or("assigned");
        return format!("{display} has no{priority_desc} {state_desc} issues.");
    }

    let mut result = format!("{display} has {} issue(s):\n\n", issues.len());
    for (idx, issue) in issues.iter().enumerate() {
        result.push_str(&format!(
            "{}. {} {} [{}]\n",
            idx + 1,
            issue.identifier,
            issue.title,
            issue.state.name
        ));
    }
    result.trim_end().to_string()
}

fn format_projects(projects: &[ProjectNode]) -> String {
    if projects.is_empty() {
        return "No projects found.".to_string();
    }

    let mut result = format!("Found {} project(s):\n\n", projects.len());
    for (idx, project) in projects.iter().enumerate() {
        match &project.state {
            Some(state) => {
                result.push_str(&format!("{}. {} [{}]\n", idx + 1, project.name, state))
            }
            None => result.push_str(&format!("{}. {}\n", idx + 1, project.name)),
        }
    }
    result.trim_end().to_string()
}

fn format_teams(teams: &[TeamNode]) -> String {
    if teams.is_empty() {
        return "No teams found.".to_string();
    }

    let mut result = format!("Found {} team(s):\n\n", teams.len());
    for (idx, team) in teams.iter().enumerate() {
        result.push_str(&format!("{}. {} ({})\n", idx + 1, team.name, team.key));
    }
    result.trim_end().to_string()
}
