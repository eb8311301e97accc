//! Request dispatcher - picks a division or a collaboration workflow

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::aggregator::ResponseAggregator;
use crate::analysis::{LexiconAnalyzer, SentimentAnalyzer};
use crate::config::EngineConfig;
use crate::division::{DivisionId, Query};
use crate::error::Result;
use crate::protocol::{AgentDescriptor, AgentResponse, Request};
use crate::registry::DivisionRegistry;
use crate::rules::RuleTable;
use crate::tools::{RandomSource, ToolRegistry};
use crate::workflow::{WorkflowExecutor, WorkflowName};

/// Division override value that means "let the dispatcher decide"
pub const GENERAL: &str = "general";

/// Where a request is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Division(DivisionId),
    Workflow(WorkflowName),
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Division(id) => write!(f, "division:{}", id),
            Route::Workflow(name) => write!(f, "workflow:{}", name),
        }
    }
}

/// Routes requests and assembles responses
///
/// Everything it holds is built once and read-only afterwards, so one
/// dispatcher can be shared (behind an `Arc`) by any number of concurrent
/// requests.
pub struct Dispatcher {
    registry: Arc<DivisionRegistry>,
    rules: Arc<RuleTable>,
    analyzer: Arc<dyn SentimentAnalyzer>,
    executor: WorkflowExecutor,
    aggregator: ResponseAggregator,
    descriptor: AgentDescriptor,
}

impl Dispatcher {
    pub fn new(
        config: &EngineConfig,
        registry: DivisionRegistry,
        rules: RuleTable,
        tools: ToolRegistry,
        analyzer: Arc<dyn SentimentAnalyzer>,
    ) -> Self {
        let registry = Arc::new(registry);
        let executor = WorkflowExecutor::new(Arc::clone(&registry), Arc::new(tools))
            .with_step_timeout(config.step_timeout());

        info!(
            divisions = registry.len(),
            rules = rules.len(),
            default = %registry.default_id(),
            "Dispatcher ready"
        );

        Self {
            registry,
            rules: Arc::new(rules),
            analyzer,
            executor,
            aggregator: ResponseAggregator::new(),
            descriptor: config.descriptor.to_descriptor(),
        }
    }

    /// Canonical registry and rules, simulated tools, lexicon analyzer
    pub fn from_config(config: &EngineConfig, random: Arc<dyn RandomSource>) -> Self {
        Self::new(
            config,
            DivisionRegistry::canonical(config.default_division),
            RuleTable::canonical(),
            ToolRegistry::simulated(random),
            Arc::new(LexiconAnalyzer::new()),
        )
    }

    /// Decide where a request goes
    ///
    /// An explicit division override wins. Otherwise collaboration rules are
    /// checked first, then the registry in order, then the default division.
    pub fn route(&self, request: &Request) -> Result<Route> {
        if let Some(forced) = request.division.as_deref().map(str::trim) {
            if !forced.is_empty() && !forced.eq_ignore_ascii_case(GENERAL) {
                let id: DivisionId = forced.parse()?;
                self.registry.require(id)?;
                debug!(division = %id, "Division forced by request");
                return Ok(Route::Division(id));
            }
        }

        if let Some(workflow) = self.rules.first_match(&request.query) {
            return Ok(Route::Workflow(workflow));
        }

        let id = self
            .registry
            .find_first_match(&request.query)
            .map(|d| d.id)
            .unwrap_or_else(|| self.registry.default_id());
        Ok(Route::Division(id))
    }

    /// Handle one request end to end
    #[instrument(skip(self, request), fields(user = %request.user_id))]
    pub async fn handle(&self, request: &Request) -> Result<AgentResponse> {
        request.validate()?;

        let analysis = self.analyzer.analyze(&request.query);
        let sentiment = analysis.sentiment;
        let query = Query::new(request.query.as_str(), request.user_id.as_str(), analysis);

        let route = self.route(request)?;
        info!(route = %route, sentiment = %sentiment, "Request routed");

        let response = match route {
            Route::Division(id) => {
                let division = self.registry.require(id)?;
                let result = self.executor.invoke(division, &query).await?;
                self.aggregator.merge(vec![result], id.as_str(), sentiment)?
            }
            Route::Workflow(name) => {
                let results = self.executor.execute(name, &query).await?;
                self.aggregator.merge(results, &name.label(), sentiment)?
            }
        };

        info!(
            division_used = %response.division_used,
            cost = %response.cost_incurred,
            tools = response.tool_usage.len(),
            "Request handled"
        );
        Ok(response)
    }

    /// Static capability descriptor
    pub fn describe(&self) -> AgentDescriptor {
        self.descriptor.clone()
    }
}
