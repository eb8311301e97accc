//! Divisions - the specialised request handlers
//!
//! The set is closed: every division is one of the four [`DivisionId`]
//! variants, and `process` dispatches on the variant to that division's
//! response templates. Divisions hold no per-request state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::analysis::Analysis;
use crate::error::{AeosError, Result};
use crate::protocol::{Cost, Sentiment, ToolInvocation};
use crate::rules::{self, Trigger};
use crate::tools::{self, ToolRegistry};

/// Stable identifier of a division
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DivisionId {
    /// EID - environmental monitoring
    #[serde(rename = "eid")]
    Earth,
    /// ENID - enterprise workflow and compliance
    #[serde(rename = "enid")]
    Enterprise,
    /// DTAD - DeFi and ledger operations
    #[serde(rename = "dtad")]
    Defi,
    /// HID - human support, the fallback
    #[serde(rename = "hid")]
    Human,
}

impl DivisionId {
    pub const ALL: [DivisionId; 4] = [
        DivisionId::Earth,
        DivisionId::Enterprise,
        DivisionId::Defi,
        DivisionId::Human,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DivisionId::Earth => "eid",
            DivisionId::Enterprise => "enid",
            DivisionId::Defi => "dtad",
            DivisionId::Human => "hid",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DivisionId::Earth => "EID - Earth Intelligence",
            DivisionId::Enterprise => "ENID - Enterprise Intelligence",
            DivisionId::Defi => "DTAD - DeFi & Transactions",
            DivisionId::Human => "HID - Human Interaction",
        }
    }

    /// Fixed fee charged per invocation
    pub fn cost(&self) -> Cost {
        match self {
            DivisionId::Earth => Cost::from_micros(20_000),
            DivisionId::Enterprise => Cost::from_micros(15_000),
            DivisionId::Defi => Cost::from_micros(30_000),
            DivisionId::Human => Cost::from_micros(5_000),
        }
    }

    fn capabilities(&self) -> &'static [&'static str] {
        match self {
            DivisionId::Earth => &[
                "weather", "satellite", "disaster", "iot", "agriculture", "energy", "logistics",
            ],
            DivisionId::Enterprise => {
                &["marketing", "workflow", "compliance", "audit", "data", "reporting"]
            }
            DivisionId::Defi => &[
                "yield", "insurance", "loans", "payments", "settlement", "risk scoring",
            ],
            DivisionId::Human => &[
                "support", "personalization", "recommendation", "escalation", "ticket",
            ],
        }
    }

    fn trigger(&self) -> Trigger {
        match self {
            DivisionId::Earth => Trigger::AnyOf(rules::EARTH),
            DivisionId::Enterprise => Trigger::AnyOf(rules::ENTERPRISE),
            DivisionId::Defi => Trigger::AnyOf(rules::DEFI),
            DivisionId::Human => Trigger::AnyOf(rules::HUMAN),
        }
    }
}

impl fmt::Display for DivisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DivisionId {
    type Err = AeosError;

    fn from_str(s: &str) -> Result<Self> {
        DivisionId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AeosError::UnknownDivision(s.to_string()))
    }
}

/// Input handed to a division for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub text: String,
    pub user_id: String,
    pub analysis: Analysis,
}

impl Query {
    pub fn new(text: impl Into<String>, user_id: impl Into<String>, analysis: Analysis) -> Self {
        Self {
            text: text.into(),
            user_id: user_id.into(),
            analysis,
        }
    }

    /// Same caller and analysis, different text
    pub fn rewritten(&self, text: &str) -> Self {
        Self {
            text: text.to_string(),
            user_id: self.user_id.clone(),
            analysis: self.analysis.clone(),
        }
    }
}

/// Output of one division invocation
#[derive(Debug, Clone, PartialEq)]
pub struct DivisionResult {
    pub division: DivisionId,
    pub response: String,
    pub tool_usage: Vec<ToolInvocation>,
    pub trace: Vec<String>,
    pub cost: Cost,
    /// Explicit sentiment override; `None` keeps the request's sentiment
    pub sentiment: Option<Sentiment>,
}

impl DivisionResult {
    pub fn new(division: DivisionId, response: impl Into<String>, cost: Cost) -> Self {
        Self {
            division,
            response: response.into(),
            tool_usage: Vec::new(),
            trace: Vec::new(),
            cost,
            sentiment: None,
        }
    }

    pub fn with_tool(mut self, call: ToolInvocation) -> Self {
        self.tool_usage.push(call);
        self
    }

    pub fn with_trace(mut self, line: impl Into<String>) -> Self {
        self.trace.push(line.into());
        self
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }
}

/// A specialised request handler
#[derive(Debug, Clone)]
pub struct Division {
    pub id: DivisionId,
    pub name: String,
    /// Descriptive only; routing uses the trigger
    pub capabilities: Vec<String>,
    trigger: Trigger,
}

impl Division {
    /// Create a division with its standard intent keywords
    pub fn new(id: DivisionId) -> Self {
        debug!(division = %id, "Creating division");
        Self {
            id,
            name: id.display_name().to_string(),
            capabilities: id.capabilities().iter().map(|c| c.to_string()).collect(),
            trigger: id.trigger(),
        }
    }

    /// Replace the intent predicate
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn can_handle(&self, text: &str) -> bool {
        self.trigger.matches(text)
    }

    /// Run the division's templates against a query
    #[instrument(skip(self, query, tools), fields(division = %self.id))]
    pub async fn process(&self, query: &Query, tools: &ToolRegistry) -> Result<DivisionResult> {
        let lowered = query.text.to_lowercase();
        let result = match self.id {
            DivisionId::Earth => earth(&lowered, query, tools).await?,
            DivisionId::Enterprise => enterprise(&lowered, query, tools).await?,
            DivisionId::Defi => defi(&lowered, tools).await?,
            DivisionId::Human => human(&lowered, query, tools).await?,
        };

        info!(
            division = %self.id,
            tools = result.tool_usage.len(),
            cost = %result.cost,
            "Division processed request"
        );
        Ok(result)
    }
}

fn any(lowered: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| lowered.contains(k))
}

async fn earth(lowered: &str, query: &Query, tools: &ToolRegistry) -> Result<DivisionResult> {
    let id = DivisionId::Earth;

    // A named hazard outranks any weather wording around it
    if any(lowered, rules::HAZARD.keywords) {
        let hazard = if lowered.contains("flood") {
            "Flood"
        } else if lowered.contains("drought") {
            "Drought"
        } else {
            "Disaster"
        };
        let risk = tools.invoke(tools::RISK_PREDICTION, "Regional Sensors").await?;
        let survey = tools.invoke(tools::DRONE_SURVEY, "Sector 7").await?;
        return Ok(DivisionResult::new(
            id,
            format!(
                "CRITICAL WARNING: {} risk detected in Sector 7. Initiating autonomous response protocols.",
                hazard
            ),
            id.cost(),
        )
        .with_tool(risk)
        .with_tool(survey)
        .with_trace("Triggering Drone Swarm for aerial survey."));
    }

    if any(lowered, &["weather", "climate", "forecast"]) {
        let scan = tools
            .invoke(tools::SATELLITE_ANALYSIS, "Global Atmosphere Scan")
            .await?;
        return Ok(DivisionResult::new(
            id,
            "Analyzing atmospheric conditions via Masumi Satellite Network. Weather patterns are stable.",
            id.cost(),
        )
        .with_tool(scan));
    }

    if any(lowered, &["crop", "satellite", "water", "sensor"]) {
        let region = if query.analysis.topics.is_empty() {
            "region".to_string()
        } else {
            query.analysis.topics.join(", ")
        };
        let scan = tools
            .invoke(tools::SATELLITE_ANALYSIS, "Vegetation Index Scan")
            .await?;
        return Ok(DivisionResult::new(
            id,
            format!(
                "EID: Analysis of {} complete. Satellite imagery confirms stable conditions. Vegetation Index: Optimal.",
                region
            ),
            id.cost(),
        )
        .with_tool(scan));
    }

    Ok(DivisionResult::new(
        id,
        "EID is monitoring planetary systems. All indicators within nominal ranges.",
        id.cost(),
    ))
}

async fn enterprise(lowered: &str, query: &Query, tools: &ToolRegistry) -> Result<DivisionResult> {
    let id = DivisionId::Enterprise;

    if any(lowered, rules::COMPLIANCE.keywords) {
        let did = format!("did:masumi:user:{}", query.user_id);
        let verify = tools.invoke(tools::IDENTITY_VERIFY, &did).await?;
        return Ok(DivisionResult::new(
            id,
            "Identity verified against global AML/KYC databases. You are cleared for transaction.",
            id.cost(),
        )
        .with_tool(verify)
        .with_trace("Compliance Agent notifying DeFi Division."));
    }

    if lowered.contains("audit") {
        let assessment = tools.invoke(tools::RISK_ASSESSMENT, "Audit Log").await?;
        let response = format!(
            "ENID Compliance: Audit log verified on Masumi Network. Assessment: {}.",
            assessment.output
        );
        return Ok(DivisionResult::new(id, response, id.cost()).with_tool(assessment));
    }

    if any(lowered, &["marketing", "campaign"]) {
        let campaign = tools
            .invoke(tools::CAMPAIGN_CREATOR, "Target Audience Analysis")
            .await?;
        return Ok(DivisionResult::new(
            id,
            "Generated hyper-personalized marketing campaign. Scheduling autonomous A/B testing now.",
            id.cost(),
        )
        .with_tool(campaign));
    }

    let optimize = tools
        .invoke(tools::WORKFLOW_OPTIMIZER, "Business Workflows")
        .await?;
    Ok(DivisionResult::new(
        id,
        "ENID is optimizing business workflows. Efficiency increased by 14% this session.",
        id.cost(),
    )
    .with_tool(optimize))
}

/// Default transfer size when the request names no amount
const DEFAULT_TRANSFER_ADA: f64 = 100.0;

async fn defi(lowered: &str, tools: &ToolRegistry) -> Result<DivisionResult> {
    let id = DivisionId::Defi;

    // An explicit payment is settled as asked, whatever else it mentions
    if any(lowered, rules::PAYMENT.keywords) {
        let amount = ada_amount(lowered).unwrap_or(DEFAULT_TRANSFER_ADA);
        let transfer = format!("{} ADA -> addr1...", amount);
        let execute = tools.invoke(tools::SMART_CONTRACT, &transfer).await?;
        return Ok(DivisionResult::new(
            id,
            "Transaction executed securely. Proof of Settlement recorded on-chain.",
            id.cost(),
        )
        .with_tool(execute)
        .with_trace("Broadcasting transaction to Cardano mainnet."));
    }

    if lowered.contains("emergency") || (lowered.contains("release") && lowered.contains("fund")) {
        let release = tools
            .invoke(tools::EMERGENCY_RELEASE, "5000 ADA -> relief treasury")
            .await?;
        return Ok(DivisionResult::new(
            id,
            "Emergency funds released to the verified hazard zone. Disbursement recorded on-chain.",
            id.cost(),
        )
        .with_tool(release)
        .with_trace("Releasing emergency funds from relief treasury."));
    }

    if any(lowered, &["price", "predict"]) {
        let prediction = tools.invoke(tools::MARKET_PREDICTION, "ADA/USD").await?;
        let response = format!(
            "DTAD Market AI: Deep Learning model predicts {} trend for ADA/USD.",
            prediction.output
        );
        return Ok(DivisionResult::new(id, response, id.cost()).with_tool(prediction));
    }

    if any(lowered, &["yield", "invest"]) {
        let optimize = tools
            .invoke(tools::YIELD_OPTIMIZER, "Liquidity Pools Scan")
            .await?;
        return Ok(DivisionResult::new(
            id,
            "Optimized your portfolio. Reallocated assets to highest yield protocol (5.4% APY).",
            id.cost(),
        )
        .with_tool(optimize));
    }

    if any(lowered, &["stake", "delegate"]) {
        let pool = tools.invoke(tools::STAKE_POOL_CHECK, "Pool XYZ").await?;
        return Ok(DivisionResult::new(
            id,
            "DTAD: Stake pool saturation is 45%. Recommendation: Delegate to Pool XYZ.",
            id.cost(),
        )
        .with_tool(pool));
    }

    if any(lowered, &["balance", "wallet"]) {
        let balance = tools.invoke(tools::CHECK_BALANCE, "addr1...").await?;
        let response = format!("DTAD: {}.", balance.output);
        return Ok(DivisionResult::new(id, response, id.cost()).with_tool(balance));
    }

    Ok(DivisionResult::new(
        id,
        "DTAD is managing financial flows. Treasury status: Solvent.",
        id.cost(),
    ))
}

async fn human(lowered: &str, query: &Query, tools: &ToolRegistry) -> Result<DivisionResult> {
    let id = DivisionId::Human;
    let sentiment = query.analysis.sentiment;

    if sentiment == Sentiment::Negative {
        let tone = tools
            .invoke(tools::SENTIMENT_ANALYSIS, &sentiment.to_string())
            .await?;
        return Ok(DivisionResult::new(
            id,
            "HID: I understand you are frustrated. I have prioritized your request for immediate human review.",
            id.cost(),
        )
        .with_tool(tone)
        .with_trace("Escalating priority due to user sentiment.")
        .with_sentiment(Sentiment::Negative));
    }

    if any(lowered, &["help", "support"]) {
        let tone = tools
            .invoke(tools::SENTIMENT_ANALYSIS, &sentiment.to_string())
            .await?;
        return Ok(DivisionResult::new(
            id,
            "I understand you need assistance. I have analyzed your history and found the best solution. Connecting you with a specialist agent.",
            id.cost(),
        )
        .with_tool(tone));
    }

    let response = if query.analysis.topics.is_empty() {
        "HID is learning from your preferences to serve you better.".to_string()
    } else {
        format!(
            "HID: I have noted your interest in {}. How else can I assist you?",
            query.analysis.topics.join(", ")
        )
    };
    Ok(DivisionResult::new(id, response, id.cost()))
}

/// Amount written as `<number> ada` in lower-cased text
fn ada_amount(lowered: &str) -> Option<f64> {
    let tokens: Vec<&str> = lowered
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();

    tokens.iter().enumerate().find_map(|(i, token)| {
        let number = token
            .strip_suffix("ada")
            .filter(|n| !n.is_empty())
            .or_else(|| (tokens.get(i + 1) == Some(&"ada")).then_some(*token))?;
        number.parse::<f64>().ok().filter(|n| *n > 0.0)
    })
}
