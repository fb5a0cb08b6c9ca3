//! Domain agents for Switchboard.
//!
//! Each agent answers resolved queries for one platform: GitHub over its
//! REST API, Linear over its GraphQL API. Agents receive per-user
//! credentials at construction and never read global state.

pub mod github;
pub mod linear;

pub use github::GitHubAgent;
pub use linear::LinearAgent;

use std::collections::HashMap;

/// Per-user credentials for one platform, keyed by user id.
///
/// A user missing from the map is handled in-band ("token not
/// configured"), not as an error.
pub type CredentialMap = HashMap<String, String>;
