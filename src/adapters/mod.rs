//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `flow` - HMAC-signed payment gateway client and its mock
//! - `postgres` - Member documents in PostgreSQL
//! - `memory` - In-memory member store
//! - `http` - Axum routes and handlers

pub mod flow;
pub mod http;
pub mod memory;
pub mod postgres;

pub use flow::{FlowGatewayClient, MockPaymentGateway};
pub use memory::InMemoryMemberStore;
pub use postgres::PostgresMemberStore;
