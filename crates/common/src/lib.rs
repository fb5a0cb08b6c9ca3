//! Common types and traits shared across Switchboard crates.
//!
//! This crate provides the contract types that the orchestrator, the
//! routing classifier, and the domain agents use to communicate.

pub mod decision;
pub mod directory;
pub mod error;
pub mod traits;

pub use decision::{AgentKind, ClarificationType, RoutingDecision};
pub use directory::{UserDirectory, UserIdentity};
pub use error::{Result, SwitchboardError};
pub use traits::{DomainAgent, QueryContext, RoutingClassifier};
