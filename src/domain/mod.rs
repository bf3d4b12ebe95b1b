//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machines)
//! - `subscription` - Members, the gateway sub-record, plans and activation

pub mod foundation;
pub mod subscription;
