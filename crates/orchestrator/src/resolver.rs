//! Determines which configured user a free-text query refers to.

use regex::Regex;
use switchboard_common::{UserDirectory, UserIdentity};
use tracing::debug;

/// Result of one resolution attempt. Computed fresh per call, never stored.
#[derive(Debug, Clone)]
pub struct UserResolution {
    /// Resolved user id, if exactly one user matched.
    pub user_id: Option<String>,

    /// Display name of the resolved user.
    pub user_name: Option<String>,

    /// Number of patterns that matched the resolved user.
    pub confidence: usize,

    /// Why this outcome was reached.
    pub reason: String,

    /// Set when zero or multiple users matched.
    pub clarification_needed: bool,
}

/// Per-user match patterns precomputed from a directory snapshot.
///
/// Patterns are immutable once built; if the directory changes, build a
/// new resolver rather than mutating this one.
pub struct UserResolver {
    directory: UserDirectory,
    patterns: Vec<(String, Vec<Regex>)>,
}

/// Ordinal and cardinal words accepted as positional clarification
/// answers, indexed by directory slot.
const NUMBER_WORDS: &[&[&str]] = &[
    &["1", "first", "one"],
    &["2", "second", "two"],
    &["3", "third", "three"],
    &["4", "fourth", "four"],
    &["5", "fifth", "five"],
];

impl UserResolver {
    /// Compile word-boundary patterns for every configured user: display
    /// name and username, each in plain and possessive (`'s`) form.
    pub fn new(directory: &UserDirectory) -> Self {
        let patterns = directory
            .users()
            .iter()
            .map(|user| (user.id.clone(), Self::patterns_for(user)))
            .collect();

        Self {
            directory: directory.clone(),
            patterns,
        }
    }

    fn patterns_for(user: &UserIdentity) -> Vec<Regex> {
        let mut compiled = Vec::with_capacity(4);
        for name in [
            user.display_name.to_lowercase(),
            user.username.to_lowercase(),
        ] {
            let escaped = regex::escape(&name);
            for pattern in [format!(r"\b{escaped}\b"), format!(r"\b{escaped}'s\b")] {
                // Escaped literals over lowered input always compile.
                if let Ok(re) = Regex::new(&pattern) {
                    compiled.push(re);
                }
            }
        }
        compiled
    }

    /// Resolve which user the query is about.
    ///
    /// Exactly one user with pattern hits resolves; zero or multiple hits
    /// require clarification. No tie-break: any multi-match is ambiguous
    /// regardless of relative counts.
    pub fn resolve(&self, query: &str) -> UserResolution {
        let lower = query.to_lowercase();

        let counts: Vec<(&str, usize)> = self
            .patterns
            .iter()
            .map(|(id, patterns)| {
                let hits = patterns.iter().filter(|p| p.is_match(&lower)).count();
                (id.as_str(), hits)
            })
            .collect();

        debug!(?counts, "User resolution pattern hits");

        let mut matched = counts.iter().filter(|(_, hits)| *hits > 0);
        let first = matched.next();
        let second = matched.next();

        match (first, second) {
            (Some(&(id, hits)), None) => {
                let display_name = self
                    .directory
                    .get(id)
                    .map(|u| u.display_name.clone())
                    .unwrap_or_else(|_| id.to_string());
                UserResolution {
                    user_id: Some(id.to_string()),
                    reason: format!("Query mentions {display_name}"),
                    user_name: Some(display_name),
                    confidence: hits,
                    clarification_needed: false,
                }
            }
            (Some(_), Some(_)) => UserResolution {
                user_id: None,
                user_name: None,
                confidence: 0,
                reason: "Multiple users mentioned".into(),
                clarification_needed: true,
            },
            _ => UserResolution {
                user_id: None,
                user_name: None,
                confidence: 0,
                reason: "No user mentioned".into(),
                clarification_needed: true,
            },
        }
    }

    /// The follow-up question asked when the user cannot be determined.
    pub fn clarification_message(&self, agent_name: &str) -> String {
        let names: Vec<&str> = self
            .directory
            .users()
            .iter()
            .map(|u| u.display_name.as_str())
            .collect();

        match names.as_slice() {
            [] => "No users configured in the system.".into(),
            [only] => format!("Only {only} is configured."),
            [a, b] => format!("Whose {agent_name} data? {a}'s or {b}'s?"),
            [rest @ .., last] => {
                format!("Whose {agent_name} data? {}, or {last}?", rest.join(", "))
            }
        }
    }

    /// Interpret an answer to the user clarification question.
    ///
    /// Tries name/username substrings first, then ordinal words mapped
    /// positionally onto directory insertion order.
    pub fn resolve_clarification_response(&self, response: &str) -> Option<String> {
        let lower = response.to_lowercase();

        for user in self.directory.users() {
            if lower.contains(&user.display_name.to_lowercase())
                || lower.contains(&user.username.to_lowercase())
            {
                return Some(user.id.clone());
            }
        }

        for (slot, words) in NUMBER_WORDS.iter().enumerate() {
            if slot >= self.directory.len() {
                break;
            }
            if words.iter().any(|w| lower.contains(w)) {
                return Some(self.directory.users()[slot].id.clone());
            }
        }

        None
    }
}
