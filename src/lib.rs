//! # AEOS
//!
//! Division dispatch and collaboration engine.
//!
//! A natural-language request is routed to one of four specialised
//! *divisions* (earth intelligence, enterprise intelligence, DeFi and
//! transactions, human interaction). Requests that span two domains run a
//! fixed collaboration workflow that chains divisions and merges their output
//! into a single response.
//!
//! ## Architecture
//!
//! ```text
//!  Request ──► Dispatcher ──┬─ collaboration rule? ──► WorkflowExecutor ─┐
//!                           │                          (step 1 → step 2)  │
//!                           └─ registry scan / default ──► Division ──────┤
//!                                                                         ▼
//!                                                           ResponseAggregator
//!                                                                         │
//!                                                                         ▼
//!                                                                  AgentResponse
//! ```
//!
//! ## Key Concepts
//!
//! - **Division**: a handler with a keyword predicate and canned templates
//! - **Registry**: ordered divisions; order breaks ties, the default catches the rest
//! - **Rule table**: keyword conjunctions that trigger a collaboration workflow
//! - **Workflow**: a linear, fixed pipeline of division invocations
//! - **Orchestrator**: channel-driven service loop around a shared dispatcher

pub mod aggregator;
pub mod analysis;
pub mod channel;
pub mod config;
pub mod dispatcher;
pub mod division;
pub mod error;
pub mod orchestrator;
pub mod protocol;
pub mod registry;
pub mod rules;
pub mod tools;
pub mod workflow;

pub use aggregator::ResponseAggregator;
pub use analysis::{Analysis, LexiconAnalyzer, SentimentAnalyzer};
pub use channel::{ChannelPair, EngineChannel};
pub use config::EngineConfig;
pub use dispatcher::{Dispatcher, Route};
pub use division::{Division, DivisionId, DivisionResult, Query};
pub use error::AeosError;
pub use orchestrator::Orchestrator;
pub use protocol::{
    AgentDescriptor, AgentResponse, Cost, Event, Op, Request, Sentiment, SubmissionId,
    ToolInvocation,
};
pub use registry::DivisionRegistry;
pub use rules::{CollaborationRule, KeywordGroup, RuleTable, Trigger};
pub use tools::{RandomSource, Tool, ToolError, ToolRegistry};
pub use workflow::{WorkflowExecutor, WorkflowName, WorkflowStep};
