//! Tutoria - Subscription billing core
//!
//! Activates member subscriptions against an HMAC-signed payment gateway:
//! customer creation, hosted card registration, the redirect callback, and
//! subscription activation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
