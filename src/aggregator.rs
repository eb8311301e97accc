//! Merges division results into the caller-facing response

use tracing::debug;

use crate::division::DivisionResult;
use crate::error::{AeosError, Result};
use crate::protocol::{AgentResponse, Cost, Sentiment};

/// Separator between step responses in a collaboration
pub const STEP_SEPARATOR: &str = " → ";

/// Builds an [`AgentResponse`] from one or more [`DivisionResult`]s
///
/// Sentiment comes from the request unless a division overrides it; the
/// first override in step order wins. This is a simplification: a richer
/// policy would weigh the highest-priority step.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseAggregator;

impl ResponseAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn merge(
        &self,
        results: Vec<DivisionResult>,
        label: &str,
        sentiment: Sentiment,
    ) -> Result<AgentResponse> {
        let sentiment = results
            .iter()
            .find_map(|r| r.sentiment)
            .unwrap_or(sentiment);

        match results.len() {
            0 => Err(AeosError::EmptyAggregate),
            1 => Ok(Self::single(results, label, sentiment)),
            _ => Ok(Self::collaboration(results, label, sentiment)),
        }
    }

    fn single(mut results: Vec<DivisionResult>, label: &str, sentiment: Sentiment) -> AgentResponse {
        let result = results.remove(0);
        AgentResponse {
            response: result.response,
            tool_usage: result.tool_usage,
            sentiment,
            cost_incurred: result.cost,
            division_used: label.to_string(),
            collaboration_log: result.trace,
        }
    }

    fn collaboration(results: Vec<DivisionResult>, label: &str, sentiment: Sentiment) -> AgentResponse {
        let total = results.len();
        let cost: Cost = results.iter().map(|r| r.cost).sum();
        let chain = results
            .iter()
            .map(|r| r.division.as_str().to_uppercase())
            .collect::<Vec<_>>()
            .join(STEP_SEPARATOR);

        let mut responses = Vec::with_capacity(total);
        let mut tool_usage = Vec::new();
        let mut log = Vec::new();

        for (index, result) in results.into_iter().enumerate() {
            log.push(format!(
                "Step {}/{}: {} engaged",
                index + 1,
                total,
                result.division.display_name()
            ));
            log.extend(result.trace);
            tool_usage.extend(result.tool_usage);
            responses.push(result.response);
        }

        log.push(format!(
            "Collaboration complete: {} ({} steps, {} tool calls, {})",
            chain,
            total,
            tool_usage.len(),
            cost
        ));

        debug!(label, steps = total, cost = %cost, "Merged collaboration");

        AgentResponse {
            response: responses.join(STEP_SEPARATOR),
            tool_usage,
            sentiment,
            cost_incurred: cost,
            division_used: label.to_string(),
            collaboration_log: log,
        }
    }
}
