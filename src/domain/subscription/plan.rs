//! Subscription plans offered on the platform.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Subscription plan.
///
/// Persisted and exchanged by its literal display name (`"Plan Anual"`),
/// which is also the default gateway plan id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanName {
    #[serde(rename = "Plan Mensual")]
    Monthly,

    #[serde(rename = "Plan Semestral")]
    Semiannual,

    #[serde(rename = "Plan Anual")]
    Annual,
}

impl PlanName {
    pub const ALL: [PlanName; 3] = [PlanName::Monthly, PlanName::Semiannual, PlanName::Annual];

    /// Returns the literal plan name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanName::Monthly => "Plan Mensual",
            PlanName::Semiannual => "Plan Semestral",
            PlanName::Annual => "Plan Anual",
        }
    }
}

impl std::fmt::Display for PlanName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlanName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlanName::ALL
            .into_iter()
            .find(|plan| plan.as_str() == s.trim())
            .ok_or_else(|| ValidationError::invalid_format("plan", format!("unknown plan '{}'", s)))
    }
}

/// Gateway plan id for each plan.
///
/// Plans without an explicit id are subscribed under their literal name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanCatalog {
    ids: HashMap<PlanName, String>,
}

impl PlanCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the gateway id of one plan. Blank ids are ignored.
    pub fn with_plan_id(mut self, plan: PlanName, id: impl Into<String>) -> Self {
        let id = id.into();
        if !id.trim().is_empty() {
            self.ids.insert(plan, id.trim().to_string());
        }
        self
    }

    pub fn plan_id(&self, plan: PlanName) -> &str {
        self.ids.get(&plan).map(String::as_str).unwrap_or(plan.as_str())
    }
}
