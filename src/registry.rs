//! Ordered division registry

use tracing::{debug, info};

use crate::division::{Division, DivisionId};
use crate::error::{AeosError, Result};

/// Fixed, ordered set of divisions plus the fallback
///
/// Registry order is the tie-break when more than one predicate matches:
/// the earlier division wins. The canonical order is Earth, Enterprise,
/// DeFi, Human, with Human as the default.
#[derive(Debug, Clone)]
pub struct DivisionRegistry {
    divisions: Vec<Division>,
    default: DivisionId,
}

impl DivisionRegistry {
    /// Build a registry; the default must be one of `divisions`
    pub fn new(divisions: Vec<Division>, default: DivisionId) -> Result<Self> {
        if !divisions.iter().any(|d| d.id == default) {
            return Err(AeosError::ConfigError(format!(
                "default division {} is not registered",
                default
            )));
        }

        let mut seen = Vec::with_capacity(divisions.len());
        for division in &divisions {
            if seen.contains(&division.id) {
                return Err(AeosError::ConfigError(format!(
                    "division {} registered twice",
                    division.id
                )));
            }
            seen.push(division.id);
        }

        info!(
            divisions = divisions.len(),
            default = %default,
            "Division registry built"
        );
        Ok(Self { divisions, default })
    }

    /// The product registry with the given fallback
    pub fn canonical(default: DivisionId) -> Self {
        Self {
            divisions: DivisionId::ALL.into_iter().map(Division::new).collect(),
            default,
        }
    }

    /// First division, in registry order, whose predicate accepts `text`
    pub fn find_first_match(&self, text: &str) -> Option<&Division> {
        let hit = self.divisions.iter().find(|d| d.can_handle(text));
        match hit {
            Some(division) => debug!(division = %division.id, "Registry match"),
            None => debug!("No division matched"),
        }
        hit
    }

    pub fn get(&self, id: DivisionId) -> Option<&Division> {
        self.divisions.iter().find(|d| d.id == id)
    }

    /// Look up a division or fail with [`AeosError::UnknownDivision`]
    pub fn require(&self, id: DivisionId) -> Result<&Division> {
        self.get(id)
            .ok_or_else(|| AeosError::UnknownDivision(id.to_string()))
    }

    pub fn default_division(&self) -> &Division {
        // `new` and `canonical` both guarantee the default is registered
        self.divisions
            .iter()
            .find(|d| d.id == self.default)
            .unwrap_or(&self.divisions[0])
    }

    pub fn default_id(&self) -> DivisionId {
        self.default
    }

    pub fn iter(&self) -> impl Iterator<Item = &Division> {
        self.divisions.iter()
    }

    pub fn len(&self) -> usize {
        self.divisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.divisions.is_empty()
    }
}

impl Default for DivisionRegistry {
    fn default() -> Self {
        Self::canonical(DivisionId::Human)
    }
}
