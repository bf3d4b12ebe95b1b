//! Subscription error types.
//!
//! The closed set of failures the activation sequence can end in.
//!
//! | Error | Redirect status | HTTP Status |
//! |-------|-----------------|-------------|
//! | Validation | 400 | 400 |
//! | Gateway | provider code, else 502 | 502 |
//! | NotFound | 404 | 404 |
//! | Persistence | 500 | 500 |

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Subscription-specific errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    /// Required input missing or malformed.
    #[error("Validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    /// The gateway did not return the expected success indicator.
    #[error("Gateway error: {message}")]
    Gateway {
        code: Option<String>,
        message: String,
    },

    /// No member matches the lookup key.
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// The member store failed.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl SubscriptionError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SubscriptionError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Callback arrived without the registration token.
    pub fn missing_token() -> Self {
        Self::validation("token", "missing registration token in gateway callback")
    }

    pub fn already_active() -> Self {
        Self::validation("subscriptionStatus", "subscription is already active")
    }

    pub fn gateway(code: Option<String>, message: impl Into<String>) -> Self {
        SubscriptionError::Gateway {
            code,
            message: message.into(),
        }
    }

    /// Card registration ended with a status other than complete.
    pub fn registration_incomplete(status: &str) -> Self {
        Self::gateway(
            None,
            format!("card registration was not completed (\"status\": {})", status),
        )
    }

    pub fn member_not_found(key: impl Into<String>) -> Self {
        SubscriptionError::NotFound {
            entity: "member".to_string(),
            key: key.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        SubscriptionError::Persistence(message.into())
    }

    /// Status value carried to the error page.
    pub fn status(&self) -> String {
        match self {
            SubscriptionError::Validation { .. } => "400".to_string(),
            SubscriptionError::Gateway { code: Some(code), .. } => code.clone(),
            SubscriptionError::Gateway { code: None, .. } => "502".to_string(),
            SubscriptionError::NotFound { .. } => "404".to_string(),
            SubscriptionError::Persistence(_) => "500".to_string(),
        }
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SubscriptionError::Validation { .. } => ErrorCode::ValidationFailed,
            SubscriptionError::Gateway { .. } => ErrorCode::GatewayError,
            SubscriptionError::NotFound { .. } => ErrorCode::MemberNotFound,
            SubscriptionError::Persistence(_) => ErrorCode::DatabaseError,
        }
    }

    /// Message shown to the user on the error page.
    pub fn message(&self) -> String {
        match self {
            SubscriptionError::Validation { message, .. } => message.clone(),
            SubscriptionError::Gateway { message, .. } => message.clone(),
            SubscriptionError::NotFound { entity, key } => format!("{} not found: {}", entity, key),
            SubscriptionError::Persistence(_) => "could not save subscription data".to_string(),
        }
    }
}

impl From<ValidationError> for SubscriptionError {
    fn from(err: ValidationError) -> Self {
        SubscriptionError::Validation {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for SubscriptionError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::MemberNotFound => SubscriptionError::NotFound {
                entity: "member".to_string(),
                key: err
                    .details
                    .get("key")
                    .cloned()
                    .unwrap_or_else(|| err.message.clone()),
            },
            ErrorCode::ValidationFailed | ErrorCode::InvalidStateTransition => {
                SubscriptionError::Validation {
                    field: err.details.get("field").cloned().unwrap_or_default(),
                    message: err.message,
                }
            }
            ErrorCode::GatewayError => SubscriptionError::Gateway {
                code: None,
                message: err.message,
            },
            ErrorCode::DatabaseError => SubscriptionError::Persistence(err.to_string()),
        }
    }
}
