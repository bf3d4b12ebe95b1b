//! Browser destinations of the subscription flow.
//!
//! All of them are absolute URLs on the public application base:
//!
//! - `{base}/subscription/result` - gateway return after card registration
//! - `{base}/subscription/success?status=success`
//! - `{base}/subscription/error?status={code}&message={message}`

use reqwest::Url;

use crate::config::ValidationError;
use crate::domain::subscription::SubscriptionError;

const RESULT_PATH: &str = "/subscription/result";
const SUCCESS_PATH: &str = "/subscription/success";
const ERROR_PATH: &str = "/subscription/error";

/// Builds the flow's redirect targets from the public base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRedirects {
    base: String,
}

impl SubscriptionRedirects {
    /// Fails when `base` is not an absolute URL.
    pub fn new(base: &str) -> Result<Self, ValidationError> {
        let base = base.trim().trim_end_matches('/');
        Url::parse(base).map_err(|_| ValidationError::InvalidPublicUrl)?;
        Ok(Self {
            base: base.to_string(),
        })
    }

    /// Where the gateway POSTs the user back with the registration token.
    pub fn return_url(&self) -> String {
        format!("{}{}", self.base, RESULT_PATH)
    }

    pub fn success_url(&self) -> String {
        self.with_query(SUCCESS_PATH, &[("status", "success")])
    }

    /// Error page carrying the failure's status and message, query-encoded.
    pub fn error_url(&self, err: &SubscriptionError) -> String {
        let status = err.status();
        let message = err.message();
        self.with_query(ERROR_PATH, &[("status", &status), ("message", &message)])
    }

    fn with_query(&self, path: &str, params: &[(&str, &str)]) -> String {
        let page = format!("{}{}", self.base, path);
        match Url::parse_with_params(&page, params) {
            Ok(url) => url.into(),
            Err(e) => {
                tracing::error!(page = %page, error = %e, "could not build redirect URL");
                page
            }
        }
    }
}
