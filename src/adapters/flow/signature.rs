//! Request signing for the payment gateway.
//!
//! Every request carries an `s` parameter: the lowercase hex HMAC-SHA256 of
//! the canonical parameter string, keyed with the API secret. The canonical
//! string is each parameter name immediately followed by its value, names
//! in lexicographic order, no separators:
//!
//! ```text
//! {apiKey: "k", email: "a@x.com"}  ->  "apiKeykemaila@x.com"
//! ```
//!
//! The gateway rejects any request whose signature differs by a single bit.

use std::collections::BTreeMap;
use std::fmt;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Name of the signature parameter appended to every request.
pub const SIGNATURE_PARAM: &str = "s";

/// Errors raised while preparing a signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("gateway API secret is not configured")]
    MissingSecret,

    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

/// Non-empty gateway API secret.
#[derive(Clone)]
pub struct GatewaySecret(SecretString);

impl GatewaySecret {
    /// Wraps a secret, refusing an empty one.
    pub fn new(secret: impl Into<String>) -> Result<Self, SignatureError> {
        Self::from_secret(SecretString::new(secret.into()))
    }

    /// Wraps an already protected secret, refusing an empty one.
    pub fn from_secret(secret: SecretString) -> Result<Self, SignatureError> {
        if secret.expose_secret().is_empty() {
            return Err(SignatureError::MissingSecret);
        }
        Ok(Self(secret))
    }
}

impl fmt::Debug for GatewaySecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GatewaySecret([REDACTED])")
    }
}

/// Request parameters, kept sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams(BTreeMap<String, String>);

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter. Numbers are rendered in decimal.
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl ToString) {
        self.0.insert(name.into(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `name1value1name2value2...` in name order.
    pub fn canonical_string(&self) -> String {
        self.0.iter().fold(String::new(), |mut acc, (name, value)| {
            acc.push_str(name);
            acc.push_str(value);
            acc
        })
    }

    /// Lowercase hex HMAC-SHA256 of the canonical string.
    pub fn sign(&self, secret: &GatewaySecret) -> Result<String, SignatureError> {
        let mut mac = HmacSha256::new_from_slice(secret.0.expose_secret().as_bytes())
            .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
        mac.update(self.canonical_string().as_bytes());
        Ok(hex_encode(&mac.finalize().into_bytes()))
    }

    /// Parameters in name order followed by the `s` signature.
    pub fn into_signed_pairs(
        self,
        secret: &GatewaySecret,
    ) -> Result<Vec<(String, String)>, SignatureError> {
        let signature = self.sign(secret)?;
        let mut pairs: Vec<(String, String)> = self.0.into_iter().collect();
        pairs.push((SIGNATURE_PARAM.to_string(), signature));
        Ok(pairs)
    }
}

impl<K, V> FromIterator<(K, V)> for RequestParams
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = RequestParams::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

/// Encode bytes as lowercase hex string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
