//! PostgreSQL adapters.

mod member_store;

pub use member_store::PostgresMemberStore;
