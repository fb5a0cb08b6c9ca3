//! GitHub domain agent, backed by the GitHub REST API.

use crate::CredentialMap;
use async_trait::async_trait;
use serde::Deserialize;
use switchboard_common::{
    AgentKind, DomainAgent, QueryContext, Result, SwitchboardError, UserDirectory,
};
use tracing::{debug, info};

const DEFAULT_API_BASE: &str = "https://api.github.com";

/// What the query is asking for, chosen by keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GitHubAction {
    PullRequests,
    Repositories,
    Issues,
    Starred,
}

impl GitHubAction {
    fn from_query(query: &str) -> Self {
        let lower = query.to_lowercase();
        if lower.contains("pull request") || lower.contains("pr") {
            GitHubAction::PullRequests
        } else if lower.contains("repositor") || lower.contains("repo") {
            GitHubAction::Repositories
        } else if lower.contains("issue") {
            GitHubAction::Issues
        } else if lower.contains("star") {
            GitHubAction::Starred
        } else {
            GitHubAction::Repositories
        }
    }
}

/// PR/issue state filter extracted from the query.
fn state_from_query(query: &str) -> &'static str {
    let lower = query.to_lowercase();
    if lower.contains("closed") {
        "closed"
    } else if lower.contains("all") {
        "all"
    } else {
        "open"
    }
}

#[derive(Debug, Deserialize)]
struct Repo {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    number: u64,
    title: String,
    repository_url: String,
}

/// Agent for GitHub-related queries.
pub struct GitHubAgent {
    api_base: String,
    http_client: reqwest::Client,
    directory: UserDirectory,
    tokens: CredentialMap,
}

impl GitHubAgent {
    pub fn new(directory: UserDirectory, tokens: CredentialMap) -> Self {
        Self::with_api_base(DEFAULT_API_BASE.to_string(), directory, tokens)
    }

    pub fn with_api_base(
        api_base: String,
        directory: UserDirectory,
        tokens: CredentialMap,
    ) -> Self {
        Self {
            api_base,
            http_client: reqwest::Client::new(),
            directory,
            tokens,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        token: &str,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .http_client
            .get(url)
            .query(params)
            .header("Authorization", format!("token {token}"))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "switchboard")
            .send()
            .await
            .map_err(|e| SwitchboardError::Agent(format!("GitHub request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SwitchboardError::Agent(format!(
                "GitHub API error {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SwitchboardError::Agent(format!("Failed to parse GitHub response: {e}")))
    }

    async fn pull_requests(&self, token: &str, username: &str, display: &str, query: &str) -> Result<String> {
        let state = state_from_query(query);
        let q = format!("type:pr author:{username} state:{state}");
        let url = format!("{}/search/issues", self.api_base);
        let search: SearchResponse = self
            .get_json(
                token,
                &url,
                &[
                    ("q", q.as_str()),
                    ("sort", "created"),
                    ("order", "desc"),
                    ("per_page", "10"),
                ],
            )
            .await?;
        Ok(format_pull_requests(display, state, &search.items))
    }

    async fn issues(&self, token: &str, username: &str, display: &str, query: &str) -> Result<String> {
        let state = state_from_query(query);
        let q = format!("type:issue author:{username} state:{state}");
        let url = format!("{}/search/issues", self.api_base);
        let search: SearchResponse = self
            .get_json(
                token,
                &url,
                &[
                    ("q", q.as_str()),
                    ("sort", "created"),
                    ("order", "desc"),
                    ("per_page", "10"),
                ],
            )
            .await?;
        Ok(format_issues(display, state, &search.items))
    }

    async fn repositories(&self, token: &str, username: &str, display: &str) -> Result<String> {
        let url = format!("{}/users/{username}/repos", self.api_base);
        let repos: Vec<Repo> = self
            .get_json(token, &url, &[("sort", "updated"), ("per_page", "20")])
            .await?;
        Ok(format_repositories(display, &repos))
    }

    async fn starred(&self, token: &str, username: &str, display: &str) -> Result<String> {
        let url = format!("{}/users/{username}/starred", self.api_base);
        let repos: Vec<Repo> = self.get_json(token, &url, &[("per_page", "10")]).await?;
        Ok(format_starred(display, &repos))
    }
}

#[async_trait]
impl DomainAgent for GitHubAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::GitHub
    }

    async fn execute(&self, query: &str, user_id: &str, context: &QueryContext) -> Result<String> {
        let user = self.directory.get(user_id)?;

        let Some(token) = self.tokens.get(user_id) else {
            return Ok(format!(
                "GitHub token not configured for {}",
                user.display_name
            ));
        };

        let action = GitHubAction::from_query(query);
        info!(
            user = %user_id,
            action = ?action,
            context_action = %context.action,
            "Executing GitHub query"
        );

        let result = match action {
            GitHubAction::PullRequests => {
                self.pull_requests(token, &user.username, &user.display_name, query)
                    .await?
            }
            GitHubAction::Repositories => {
                self.repositories(token, &user.username, &user.display_name)
                    .await?
            }
            GitHubAction::Issues => {
                self.issues(token, &user.username, &user.display_name, query)
                    .await?
            }
            GitHubAction::Starred => {
                self.starred(token, &user.username, &user.display_name)
                    .await?
            }
        };

        debug!(
            user = %user_id,
            result_preview = %result.chars().take(100).collect::<String>(),
            "GitHub query complete"
        );
        Ok(result)
    }
}

fn repo_name_from_url(repository_url: &str) -> &str {
    repository_url.rsplit('/').next().unwrap_or(repository_url)
}

fn format_pull_requests(display: &str, state: &str, items: &[SearchItem]) -> String {
    if items.is_empty() {
        return format!("{display} has no {state} pull requests.");
    }

    let mut result = format!("{display} has {} {state} pull request(s):\n\n", items.len());
    for (idx, item) in items.iter().enumerate() {
        result.push_str(&format!(
            "{}. {} in {} (#{})\n",
            idx + 1,
            item.title,
            repo_name_from_url(&item.repository_url),
            item.number
        ));
    }
    result.trim_end().to_string()
}

fn format_issues(display: &str, state: &str, items: &[SearchItem]) -> String {
    if items.is_empty() {
        return format!("{display} has no {state} issues.");
    }

    let mut result = format!("{display} has {} {state} issue(s):\n\n", items.len());
    for (idx, item) in items.iter().enumerate() {
        result.push_str(&format!(
            "{}. {} in {} (#{})\n",
            idx + 1,
            item.title,
            repo_name_from_url(&item.repository_url),
            item.number
        ));
    }
    result.trim_end().to_string()
}

fn format_repositories(display: &str, repos: &[Repo]) -> String {
    if repos.is_empty() {
        return format!("{display} has no repositories.");
    }

    let mut result = format!("{display} has {} repository(ies):\n\n", repos.len());
    for (idx, repo) in repos.iter().enumerate() {
        match &repo.description {
            Some(desc) if !desc.is_empty() => {
                result.push_str(&format!("{}. {} - {}\n", idx + 1, repo.name, desc))
            }
            _ => result.push_str(&format!("{}. {}\n", idx + 1, repo.name)),
        }
    }
    result.trim_end().to_string()
}

fn format_starred(display: &str, repos: &[Repo]) -> String {
    if repos.is_empty() {
        return format!("{display} has no starred repositories.");
    }

    let mut result = format!("{display} has starred {} repository(ies):\n\n", repos.len());
    for (idx, repo) in repos.iter().enumerate() {
        result.push_str(&format!("{}. {}\n", idx + 1, repo.name));
    }
    result.trim_end().to_string()
}
