//! Declarative keyword rules
//!
//! Both routing stages read from here: division predicates are single
//! [`KeywordGroup`] memberships, and collaboration rules are conjunctions of
//! groups mapped to a [`WorkflowName`]. Matching is substring membership over
//! the lower-cased request text; false positives are accepted.

use tracing::debug;

use crate::workflow::WorkflowName;

/// A named set of keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordGroup {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

impl KeywordGroup {
    pub const fn new(name: &'static str, keywords: &'static [&'static str]) -> Self {
        Self { name, keywords }
    }

    /// Whether any keyword occurs in already lower-cased text
    pub fn matches_lowered(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matches_lowered(&text.to_lowercase())
    }
}

// Division intent groups

pub const EARTH: KeywordGroup = KeywordGroup::new(
    "earth",
    &[
        "weather", "climate", "forecast", "satellite", "crop", "flood", "drought", "sensor",
        "energy grid", "water", "disaster", "earthquake", "wildfire", "hurricane",
    ],
);

pub const ENTERPRISE: KeywordGroup = KeywordGroup::new(
    "enterprise",
    &[
        "marketing", "campaign", "compliance", "audit", "workflow", "schedule", "report", "kyc",
        "aml", "identity",
    ],
);

pub const DEFI: KeywordGroup = KeywordGroup::new(
    "defi",
    &[
        "pay", "send", "transfer", "settle", "loan", "yield", "stake", "insurance", "invest",
        "wallet", "balance", "price", "predict", "ada", "fund", "relief", "emergency aid",
    ],
);

pub const HUMAN: KeywordGroup = KeywordGroup::new(
    "human",
    &["help", "support", "ticket", "recommend", "suggest", "contact", "guide"],
);

// Collaboration groups. Each is covered by the division group of the step
// it feeds, so a single-domain request still reaches that division.

pub const HAZARD: KeywordGroup = KeywordGroup::new(
    "hazard",
    &["disaster", "flood", "drought", "earthquake", "wildfire", "hurricane"],
);

pub const FUNDING: KeywordGroup = KeywordGroup::new(
    "funding",
    &["fund", "relief", "insurance payout", "emergency aid"],
);

pub const COMPLIANCE: KeywordGroup =
    KeywordGroup::new("compliance", &["compliance", "kyc", "aml", "identity"]);

pub const PAYMENT: KeywordGroup =
    KeywordGroup::new("payment", &["pay", "send", "transfer", "settle"]);

/// Predicate over request text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Text is in the group
    AnyOf(KeywordGroup),
    /// Text is in every group
    AllOf(Vec<KeywordGroup>),
}

impl Trigger {
    pub fn matches_lowered(&self, lowered: &str) -> bool {
        match self {
            Trigger::AnyOf(group) => group.matches_lowered(lowered),
            Trigger::AllOf(groups) => {
                !groups.is_empty() && groups.iter().all(|g| g.matches_lowered(lowered))
            }
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matches_lowered(&text.to_lowercase())
    }
}

/// Trigger that chains divisions into a workflow instead of picking one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaborationRule {
    pub trigger: Trigger,
    pub workflow: WorkflowName,
}

impl CollaborationRule {
    pub fn new(trigger: Trigger, workflow: WorkflowName) -> Self {
        Self { trigger, workflow }
    }
}

/// Ordered collaboration rules; the first match wins
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<CollaborationRule>,
}

impl RuleTable {
    pub fn new(rules: Vec<CollaborationRule>) -> Self {
        Self { rules }
    }

    /// The product rule table
    ///
    /// 1. hazard + funding: verify the hazard, then release relief funds
    /// 2. compliance + payment: verify identity, then settle
    pub fn canonical() -> Self {
        Self::new(vec![
            CollaborationRule::new(
                Trigger::AllOf(vec![HAZARD, FUNDING]),
                WorkflowName::DisasterRelief,
            ),
            CollaborationRule::new(
                Trigger::AllOf(vec![COMPLIANCE, PAYMENT]),
                WorkflowName::VerifiedPayment,
            ),
        ])
    }

    /// First workflow whose trigger fires, if any
    pub fn first_match(&self, text: &str) -> Option<WorkflowName> {
        let lowered = text.to_lowercase();
        let hit = self
            .rules
            .iter()
            .find(|rule| rule.trigger.matches_lowered(&lowered))
            .map(|rule| rule.workflow);

        if let Some(workflow) = hit {
            debug!(workflow = %workflow, "Collaboration rule matched");
        }
        hit
    }

    pub fn rules(&self) -> &[CollaborationRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_is_case_insensitive() {
        assert!(EARTH.matches("What's the WEATHER forecast"));
        assert!(!EARTH.matches("xyz random gibberish"));
    }

    #[test]
    fn test_all_of_requires_every_group() {
        let trigger = Trigger::AllOf(vec![HAZARD, FUNDING]);
        assert!(trigger.matches("flood disaster, please release emergency funds"));
        assert!(!trigger.matches("flood warning for the delta"));
        assert!(!trigger.matches("release the quarterly funds"));
    }

    #[test]
    fn test_empty_conjunction_never_matches() {
        assert!(!Trigger::AllOf(vec![]).matches("anything at all"));
    }

    #[test]
    fn test_canonical_disaster_relief() {
        let rules = RuleTable::canonical();
        assert_eq!(
            rules.first_match("flood disaster, please release emergency funds"),
            Some(WorkflowName::DisasterRelief)
        );
    }

    #[test]
    fn test_canonical_verified_payment() {
        let rules = RuleTable::canonical();
        assert_eq!(
            rules.first_match("please check kyc status and then pay the vendor"),
            Some(WorkflowName::VerifiedPayment)
        );
    }

    #[test]
    fn test_single_domain_requests_do_not_collaborate() {
        let rules = RuleTable::canonical();
        assert_eq!(rules.first_match("what's the weather forecast"), None);
        assert_eq!(rules.first_match("run a compliance audit"), None);
        assert_eq!(rules.first_match("pay the vendor 40 ada"), None);
    }

    #[test]
    fn test_collaboration_groups_are_covered_by_division_groups() {
        let pairs = [(HAZARD, EARTH), (FUNDING, DEFI), (COMPLIANCE, ENTERPRISE), (PAYMENT, DEFI)];
        for (collab, division) in pairs {
            for keyword in collab.keywords {
                assert!(
                    division.matches(keyword),
                    "{} keyword {keyword:?} not in {}",
                    collab.name,
                    division.name
                );
            }
        }
    }

    #[test]
    fn test_first_rule_wins() {
        let rules = RuleTable::new(vec![
            CollaborationRule::new(Trigger::AnyOf(PAYMENT), WorkflowName::VerifiedPayment),
            CollaborationRule::new(Trigger::AnyOf(PAYMENT), WorkflowName::DisasterRelief),
        ]);
        assert_eq!(rules.first_match("pay now"), Some(WorkflowName::VerifiedPayment));
    }
}
