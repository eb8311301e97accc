//! Simulated external tools and the registry that owns them

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::protocol::ToolInvocation;

pub const SATELLITE_ANALYSIS: &str = "Satellite Analysis";
pub const RISK_PREDICTION: &str = "Risk Prediction Model";
pub const DRONE_SURVEY: &str = "Drone Survey";
pub const IDENTITY_VERIFY: &str = "On-Chain Identity Verify";
pub const CAMPAIGN_CREATOR: &str = "GenAI Campaign Creator";
pub const RISK_ASSESSMENT: &str = "Risk Assessment AI";
pub const WORKFLOW_OPTIMIZER: &str = "Workflow Optimizer";
pub const SMART_CONTRACT: &str = "Smart Contract Execute";
pub const EMERGENCY_RELEASE: &str = "Emergency Fund Release";
pub const YIELD_OPTIMIZER: &str = "Yield Optimizer";
pub const MARKET_PREDICTION: &str = "Market Prediction AI";
pub const STAKE_POOL_CHECK: &str = "Cardano Stake Pool Check";
pub const CHECK_BALANCE: &str = "Check Balance";
pub const SENTIMENT_ANALYSIS: &str = "Sentiment Analysis";

/// Draw above which the market model calls a bullish trend
pub const BULLISH_THRESHOLD: f64 = 0.4;
/// Draw below which an audit comes back low risk
pub const LOW_RISK_THRESHOLD: f64 = 0.7;

/// Tool errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("Tool not registered: {0}")]
    NotFound(String),

    #[error("{tool} failed: {reason}")]
    Failed { tool: String, reason: String },
}

/// Source of uniform draws in `[0, 1)` for randomised tool outputs
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

/// Thread-local RNG, the production source
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible stream from a fixed seed
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&self) -> f64 {
        self.rng.lock().gen::<f64>()
    }
}

/// Always returns the same draw
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn next_f64(&self) -> f64 {
        self.0
    }
}

/// An external capability a division can call
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    async fn invoke(&self, input: &str) -> Result<String, ToolError>;
}

type Handler = Box<dyn Fn(&str) -> Result<String, ToolError> + Send + Sync>;

/// Tool backed by a plain function
pub struct FnTool {
    name: String,
    handler: Handler,
}

impl FnTool {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&str) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            handler: Box::new(handler),
        }
    }

    /// Tool that ignores its input
    pub fn constant(name: impl Into<String>, output: &'static str) -> Self {
        Self::new(name, move |_| Ok(output.to_string()))
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        (self.handler)(input)
    }
}

/// Registry of tools available to divisions
///
/// Built once at startup and shared read-only across requests.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every simulated tool, drawing randomness from `random`
    pub fn simulated(random: Arc<dyn RandomSource>) -> Self {
        let mut registry = Self::new();

        registry.register(FnTool::constant(SATELLITE_ANALYSIS, "Clear"));
        registry.register(FnTool::constant(RISK_PREDICTION, "High Alert"));
        registry.register(FnTool::constant(DRONE_SURVEY, "Aerial survey dispatched"));
        registry.register(FnTool::constant(IDENTITY_VERIFY, "Verified (Tier 2)"));
        registry.register(FnTool::constant(CAMPAIGN_CREATOR, "Campaign Generated"));
        registry.register(FnTool::constant(WORKFLOW_OPTIMIZER, "Efficiency +14%"));
        registry.register(FnTool::constant(YIELD_OPTIMIZER, "5.4% APY Found"));
        registry.register(FnTool::constant(STAKE_POOL_CHECK, "Healthy (saturation 45%)"));

        registry.register(FnTool::new(SMART_CONTRACT, |input| {
            Ok(format!("TxHash: {}", tx_hash(input)))
        }));
        registry.register(FnTool::new(EMERGENCY_RELEASE, |input| {
            Ok(format!("Disbursed ({}) TxHash: {}", input, tx_hash(input)))
        }));
        registry.register(FnTool::new(CHECK_BALANCE, |wallet| {
            Ok(format!("Wallet {} Balance: 1000.0 ADA", wallet))
        }));
        registry.register(FnTool::new(SENTIMENT_ANALYSIS, |label| {
            Ok(match label {
                "negative" => "Frustrated",
                "positive" => "Satisfied",
                _ => "Calm",
            }
            .to_string())
        }));

        let market = Arc::clone(&random);
        registry.register(FnTool::new(MARKET_PREDICTION, move |_| {
            let trend = if market.next_f64() > BULLISH_THRESHOLD {
                "Bullish"
            } else {
                "Bearish"
            };
            Ok(trend.to_string())
        }));
        registry.register(FnTool::new(RISK_ASSESSMENT, move |_| {
            let risk = if random.next_f64() < LOW_RISK_THRESHOLD {
                "Low Risk"
            } else {
                "Elevated Risk"
            };
            Ok(risk.to_string())
        }));

        registry
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: impl Tool + 'static) -> Option<Arc<dyn Tool>> {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Call a tool and record the invocation
    pub async fn invoke(&self, name: &str, input: &str) -> Result<ToolInvocation, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        match tool.invoke(input).await {
            Ok(output) => {
                debug!(tool = name, input, output = %output, "Tool invoked");
                Ok(ToolInvocation::new(name, input, output))
            }
            Err(e) => {
                warn!(tool = name, error = %e, "Tool failed");
                Err(e)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Deterministic pseudo transaction hash for a simulated ledger write
fn tx_hash(input: &str) -> String {
    let mut hasher = DefaultHasher::new();
    input.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
