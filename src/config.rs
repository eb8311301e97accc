//! Engine configuration

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::division::DivisionId;
use crate::error::{AeosError, Result};
use crate::protocol::{AgentDescriptor, Cost};

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Descriptor advertised on the agent network
    pub descriptor: DescriptorSettings,

    /// Division used when nothing else matches
    pub default_division: DivisionId,

    /// Upper bound on a single division invocation, in milliseconds
    pub step_timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            descriptor: DescriptorSettings::default(),
            default_division: DivisionId::Human,
            step_timeout_ms: None,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback division
    pub fn with_default_division(mut self, division: DivisionId) -> Self {
        self.default_division = division;
        self
    }

    /// Set the per-step timeout
    pub fn with_step_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.step_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_ms.map(Duration::from_millis)
    }

    /// Parse from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(text).map_err(|e| AeosError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("parsing engine config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.step_timeout_ms == Some(0) {
            return Err(AeosError::ConfigError("step_timeout_ms must be positive".into()));
        }
        if self.descriptor.name.trim().is_empty() {
            return Err(AeosError::ConfigError("descriptor name must not be empty".into()));
        }
        Ok(())
    }
}

/// Descriptor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorSettings {
    pub name: String,
    pub did: String,
    pub division: String,
    pub capabilities: Vec<String>,
    pub price_per_request: Cost,
    pub wallet_address: String,
}

impl Default for DescriptorSettings {
    fn default() -> Self {
        Self {
            name: "AEOS Orchestrator".into(),
            did: "did:masumi:agent:orchestrator-001".into(),
            division: "Core".into(),
            capabilities: vec![
                "Orchestration".into(),
                "DeFi".into(),
                "Compliance".into(),
                "Earth Intelligence".into(),
                "Human Interaction".into(),
            ],
            price_per_request: Cost::from_micros(10_000),
            wallet_address: "addr1_aeos_orchestrator_vault".into(),
        }
    }
}

impl DescriptorSettings {
    pub fn to_descriptor(&self) -> AgentDescriptor {
        AgentDescriptor {
            name: self.name.clone(),
            did: self.did.clone(),
            division: self.division.clone(),
            capabilities: self.capabilities.clone(),
            price_per_request: self.price_per_request,
            wallet_address: self.wallet_address.clone(),
        }
    }
}
