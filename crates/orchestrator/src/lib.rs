//! Routing and disambiguation core for Switchboard.
//!
//! The orchestrator is the conversation brain that:
//! 1. Receives user queries
//! 2. Asks the routing classifier which platform should answer
//! 3. Resolves whose data the query is about
//! 4. Carries a multi-turn clarification dialogue when either is ambiguous
//! 5. Dispatches resolved queries to the appropriate domain agent
//!
//! # Architecture
//!
//! ```text
//! User Query
//!      │
//!      ▼
//! ┌─────────────────┐
//! │  Orchestrator   │ ◄── pending clarification (at most one)
//! │  (this crate)   │
//! └────────┬────────┘
//!          │
//!    ┌─────┴──────┬──────────────┐
//!    ▼            ▼              ▼
//! [Classifier] [UserResolver] [Domain Agents]
//!  (LLM)        (directory)    (GitHub, Linear)
//! ```
//!
//! One `Orchestrator` value exists per conversation; it is never shared
//! across conversations.

pub mod config;
pub mod resolver;
pub mod session;

pub use config::{ClassifierConfig, SwitchboardConfig, UserEntry};
pub use resolver::{UserResolution, UserResolver};
pub use session::{Awaiting, Orchestrator, PendingClarification};
