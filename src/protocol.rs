//! Request/response protocol shared by the dispatcher and the service loop

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{AeosError, Result};

/// Identifier for one submission to the service loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Incoming natural-language request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub query: String,
    pub user_id: String,
    /// Explicit division override; `None` or `"general"` lets the dispatcher decide
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    /// Opaque caller context, never inspected by the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

impl Request {
    pub fn new(query: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            user_id: user_id.into(),
            division: None,
            context: None,
        }
    }

    /// Force a specific division
    pub fn with_division(mut self, division: impl Into<String>) -> Self {
        self.division = Some(division.into());
        self
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = Some(context);
        self
    }

    /// Parse a request body; missing required fields are a client error
    pub fn from_json(body: &str) -> Result<Self> {
        let request: Request = serde_json::from_str(body)?;
        request.validate()?;
        Ok(request)
    }

    /// Reject requests that cannot be dispatched
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(AeosError::InvalidRequest("query must not be empty".into()));
        }
        if self.user_id.trim().is_empty() {
            return Err(AeosError::InvalidRequest("user_id must not be empty".into()));
        }
        Ok(())
    }
}

/// Record of one simulated tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool: String,
    pub input: String,
    pub output: String,
}

impl ToolInvocation {
    pub fn new(
        tool: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Currency amount in ADA, stored as whole micro-units so sums stay exact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cost(u64);

const MICROS_PER_UNIT: u64 = 1_000_000;

impl Cost {
    pub const ZERO: Cost = Cost(0);

    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub const fn micros(self) -> u64 {
        self.0
    }

    /// Nearest micro-unit to a decimal amount; negative amounts clamp to zero
    pub fn from_units(units: f64) -> Self {
        if !units.is_finite() || units <= 0.0 {
            return Self::ZERO;
        }
        Self((units * MICROS_PER_UNIT as f64).round() as u64)
    }

    pub fn as_units(self) -> f64 {
        self.0 as f64 / MICROS_PER_UNIT as f64
    }
}

impl std::ops::Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost(self.0.saturating_add(rhs.0))
    }
}

impl std::iter::Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::ZERO, |acc, c| acc + c)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / MICROS_PER_UNIT;
        let frac = self.0 % MICROS_PER_UNIT;
        if frac == 0 {
            return write!(f, "{} ADA", whole);
        }
        let digits = format!("{:06}", frac);
        write!(f, "{}.{} ADA", whole, digits.trim_end_matches('0'))
    }
}

impl Serialize for Cost {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_units())
    }
}

impl<'de> Deserialize<'de> for Cost {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let units = f64::deserialize(deserializer)?;
        if units < 0.0 {
            return Err(serde::de::Error::custom("cost must not be negative"));
        }
        Ok(Cost::from_units(units))
    }
}

/// Emotional tone of a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        };
        f.write_str(label)
    }
}

/// Final response returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub response: String,
    pub tool_usage: Vec<ToolInvocation>,
    pub sentiment: Sentiment,
    pub cost_incurred: Cost,
    pub division_used: String,
    pub collaboration_log: Vec<String>,
}

/// Static capability descriptor advertised on the agent network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub name: String,
    pub did: String,
    pub division: String,
    pub capabilities: Vec<String>,
    pub price_per_request: Cost,
    pub wallet_address: String,
}

/// Operations submitted to the orchestrator loop
#[derive(Debug, Clone)]
pub enum Op {
    /// Dispatch a request
    Interact { sub_id: SubmissionId, request: Request },
    /// Ask for the agent descriptor
    Describe { sub_id: SubmissionId },
    /// Stop the loop after in-flight requests
    Shutdown,
}

impl Op {
    pub fn interact(request: Request) -> Self {
        Op::Interact {
            sub_id: SubmissionId::new(),
            request,
        }
    }

    pub fn describe() -> Self {
        Op::Describe {
            sub_id: SubmissionId::new(),
        }
    }

    pub fn sub_id(&self) -> Option<SubmissionId> {
        match self {
            Op::Interact { sub_id, .. } | Op::Describe { sub_id } => Some(*sub_id),
            Op::Shutdown => None,
        }
    }
}

/// Events emitted by the orchestrator loop
#[derive(Debug, Clone)]
pub enum Event {
    Response {
        sub_id: SubmissionId,
        response: AgentResponse,
    },
    /// Generic failure; no partial response accompanies it
    Failed {
        sub_id: SubmissionId,
        message: String,
        client_error: bool,
    },
    Descriptor {
        sub_id: SubmissionId,
        descriptor: AgentDescriptor,
    },
}

impl Event {
    pub fn sub_id(&self) -> SubmissionId {
        match self {
            Event::Response { sub_id, .. }
            | Event::Failed { sub_id, .. }
            | Event::Descriptor { sub_id, .. } => *sub_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_json() {
        let request = Request::from_json(
            r#"{"query": "what's the weather forecast", "user_id": "u-1", "context": {"channel": "voice"}}"#,
        )
        .unwrap();
        assert_eq!(request.query, "what's the weather forecast");
        assert!(request.division.is_none());
        assert_eq!(request.context.unwrap()["channel"], "voice");
    }

    #[test]
    fn test_request_missing_field_is_client_error() {
        let err = Request::from_json(r#"{"query": "pay the vendor"}"#).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_request_empty_query_rejected() {
        let err = Request::new("   ", "u-1").validate().unwrap_err();
        assert!(matches!(err, AeosError::InvalidRequest(_)));
    }

    #[test]
    fn test_cost_sum_is_exact() {
        let total: Cost = [Cost::from_units(0.02), Cost::from_units(0.03), Cost::from_units(0.015)]
            .into_iter()
            .sum();
        assert_eq!(total, Cost::from_micros(65_000));
        assert_eq!(total.to_string(), "0.065 ADA");
    }

    #[test]
    fn test_cost_display_whole() {
        assert_eq!(Cost::from_micros(2_000_000).to_string(), "2 ADA");
        assert_eq!(Cost::from_units(-1.0), Cost::ZERO);
    }

    #[test]
    fn test_response_wire_shape() {
        let response = AgentResponse {
            response: "ok".into(),
            tool_usage: vec![ToolInvocation::new("Check Balance", "addr1", "1000.0 ADA")],
            sentiment: Sentiment::Negative,
            cost_incurred: Cost::from_micros(5_000),
            division_used: "hid".into(),
            collaboration_log: vec![],
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["sentiment"], "negative");
        assert_eq!(value["cost_incurred"], 0.005);
        assert_eq!(value["tool_usage"][0]["tool"], "Check Balance");
    }

    #[test]
    fn test_op_sub_id() {
        assert!(Op::interact(Request::new("hi", "u")).sub_id().is_some());
        assert!(Op::Shutdown.sub_id().is_none());
    }
}
