//! Collaboration workflows - fixed linear pipelines of divisions

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument, warn};

use crate::division::{Division, DivisionId, DivisionResult, Query};
use crate::error::{AeosError, Result};
use crate::registry::DivisionRegistry;
use crate::tools::ToolRegistry;

/// Named collaboration scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowName {
    /// Verify a hazard, then release emergency funds
    DisasterRelief,
    /// Verify identity, then settle a payment
    VerifiedPayment,
}

impl WorkflowName {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowName::DisasterRelief => "disaster_relief",
            WorkflowName::VerifiedPayment => "verified_payment",
        }
    }

    /// Ordered steps of the script
    pub fn steps(&self) -> &'static [WorkflowStep] {
        match self {
            WorkflowName::DisasterRelief => &DISASTER_RELIEF,
            WorkflowName::VerifiedPayment => &VERIFIED_PAYMENT,
        }
    }

    /// `division_used` value for responses produced by this workflow
    pub fn label(&self) -> String {
        self.steps()
            .iter()
            .map(|s| s.division.as_str())
            .collect::<Vec<_>>()
            .join("+")
    }
}

impl fmt::Display for WorkflowName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text a step hands to its division
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepQuery {
    /// The caller's query as received
    Original,
    /// A fixed instruction replacing the query
    Rewritten(&'static str),
}

/// One division invocation inside a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowStep {
    pub division: DivisionId,
    pub query: StepQuery,
    pub purpose: &'static str,
}

const DISASTER_RELIEF: [WorkflowStep; 2] = [
    WorkflowStep {
        division: DivisionId::Earth,
        query: StepQuery::Original,
        purpose: "hazard verification",
    },
    WorkflowStep {
        division: DivisionId::Defi,
        query: StepQuery::Rewritten("release emergency funds for verified hazard zone"),
        purpose: "emergency fund release",
    },
];

const VERIFIED_PAYMENT: [WorkflowStep; 2] = [
    WorkflowStep {
        division: DivisionId::Enterprise,
        query: StepQuery::Original,
        purpose: "compliance verification",
    },
    WorkflowStep {
        division: DivisionId::Defi,
        query: StepQuery::Original,
        purpose: "payment settlement",
    },
];

/// Runs divisions, one at a time, against the shared registries
///
/// A failing step aborts the whole workflow: no partial results are returned
/// and nothing is retried.
#[derive(Clone)]
pub struct WorkflowExecutor {
    registry: Arc<DivisionRegistry>,
    tools: Arc<ToolRegistry>,
    step_timeout: Option<Duration>,
}

impl WorkflowExecutor {
    pub fn new(registry: Arc<DivisionRegistry>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            tools,
            step_timeout: None,
        }
    }

    /// Bound every division invocation
    pub fn with_step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Invoke one division, honouring the step timeout
    pub async fn invoke(&self, division: &Division, query: &Query) -> Result<DivisionResult> {
        match self.step_timeout {
            None => division.process(query, &self.tools).await,
            Some(limit) => tokio::time::timeout(limit, division.process(query, &self.tools))
                .await
                .map_err(|_| {
                    warn!(division = %division.id, "Division timed out");
                    AeosError::StepTimeout {
                        division: division.id,
                        timeout_ms: limit.as_millis() as u64,
                    }
                })?,
        }
    }

    /// Run a workflow script, returning each step's result in order
    #[instrument(skip(self, query), fields(workflow = %name))]
    pub async fn execute(&self, name: WorkflowName, query: &Query) -> Result<Vec<DivisionResult>> {
        let steps = name.steps();
        let mut results = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let number = index + 1;
            let fail = |message: String| AeosError::StepFailed {
                workflow: name,
                step: number,
                division: step.division,
                message,
            };

            let division = self
                .registry
                .get(step.division)
                .ok_or_else(|| fail(format!("division {} is not registered", step.division)))?;

            let step_query = match step.query {
                StepQuery::Original => query.clone(),
                StepQuery::Rewritten(text) => query.rewritten(text),
            };

            info!(
                step = number,
                division = %step.division,
                purpose = step.purpose,
                "Running workflow step"
            );

            let result = self.invoke(division, &step_query).await.map_err(|e| {
                error!(step = number, error = %e, "Workflow step failed");
                fail(e.to_string())
            })?;
            results.push(result);
        }

        info!(steps = results.len(), "Workflow complete");
        Ok(results)
    }
}
