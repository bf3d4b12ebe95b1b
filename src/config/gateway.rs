//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::subscription::{PlanCatalog, PlanName};

use super::error::ValidationError;
use super::server::Environment;

/// Gateway connection settings and plan mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the gateway REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Public API key, sent as `apiKey`
    #[serde(default)]
    pub api_key: String,

    /// Signing secret for the `s` parameter
    #[serde(default)]
    pub api_secret: Option<SecretString>,

    /// Gateway plan id for "Plan Mensual" (defaults to the plan name)
    pub monthly_plan_id: Option<String>,

    /// Gateway plan id for "Plan Semestral" (defaults to the plan name)
    pub semiannual_plan_id: Option<String>,

    /// Gateway plan id for "Plan Anual" (defaults to the plan name)
    pub annual_plan_id: Option<String>,
}

impl GatewayConfig {
    /// Configuration with credentials and defaults for everything else.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            api_key: api_key.into(),
            api_secret: Some(SecretString::new(api_secret.into())),
            monthly_plan_id: None,
            semiannual_plan_id: None,
            annual_plan_id: None,
        }
    }

    /// Set a custom base URL (sandbox or test server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Check if pointed at the gateway sandbox
    pub fn is_sandbox(&self) -> bool {
        self.base_url.contains("sandbox")
    }

    /// Gateway plan ids, falling back to each plan's literal name.
    pub fn plan_catalog(&self) -> PlanCatalog {
        let overrides = [
            (PlanName::Monthly, &self.monthly_plan_id),
            (PlanName::Semiannual, &self.semiannual_plan_id),
            (PlanName::Annual, &self.annual_plan_id),
        ];
        overrides
            .into_iter()
            .fold(PlanCatalog::new(), |catalog, (plan, id)| match id {
                Some(id) => catalog.with_plan_id(plan, id.as_str()),
                None => catalog,
            })
    }

    /// Validate gateway configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.api_key.trim().is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__API_KEY"));
        }
        let has_secret = self
            .api_secret
            .as_ref()
            .map(|s| !s.expose_secret().is_empty())
            .unwrap_or(false);
        if !has_secret {
            return Err(ValidationError::MissingRequired("GATEWAY__API_SECRET"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidGatewayUrl);
        }
        if *environment == Environment::Production && !self.base_url.starts_with("https://") {
            return Err(ValidationError::GatewayUrlMustBeHttps);
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://www.flow.cl/api".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_id_defaults_to_plan_name() {
        let catalog = GatewayConfig::new("key", "secret").plan_catalog();
        assert_eq!(catalog.plan_id(PlanName::Annual), "Plan Anual");
        assert_eq!(catalog.plan_id(PlanName::Monthly), "Plan Mensual");
    }

    #[test]
    fn plan_id_uses_configured_override() {
        let config = GatewayConfig {
            annual_plan_id: Some("PLAN-ANUAL-2024".to_string()),
            semiannual_plan_id: Some("  ".to_string()),
            ..GatewayConfig::new("key", "secret")
        };
        let catalog = config.plan_catalog();
        assert_eq!(catalog.plan_id(PlanName::Annual), "PLAN-ANUAL-2024");
        assert_eq!(catalog.plan_id(PlanName::Semiannual), "Plan Semestral");
    }

    #[test]
    fn sandbox_detection() {
        let config = GatewayConfig::new("key", "secret").with_base_url("https://sandbox.flow.cl/api/");
        assert!(config.is_sandbox());
        assert_eq!(config.base_url(), "https://sandbox.flow.cl/api");
        assert!(!GatewayConfig::new("key", "secret").is_sandbox());
    }

    #[test]
    fn validation_requires_secret() {
        let mut config = GatewayConfig::new("key", "");
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::MissingRequired("GATEWAY__API_SECRET"))
        );

        config.api_secret = None;
        assert!(config.validate(&Environment::Development).is_err());
    }

    #[test]
    fn validation_requires_api_key() {
        let config = GatewayConfig::new("", "secret");
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::MissingRequired("GATEWAY__API_KEY"))
        );
    }

    #[test]
    fn production_requires_https_gateway() {
        let config = GatewayConfig::new("key", "secret").with_base_url("http://localhost:9000");
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::GatewayUrlMustBeHttps)
        );
    }
}
