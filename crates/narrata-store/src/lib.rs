//! # narrata-store
//!
//! Read-only SQLite adapter behind [`narrata_core::traits::IDataStore`].
//! Query text is untrusted model output: every statement passes the
//! [`guard`] accept-list, runs on a `query_only` read connection, and is
//! interrupted once its deadline passes.

pub mod convert;
pub mod engine;
pub mod errors;
pub mod guard;
pub mod pool;
pub mod schema;

pub use engine::SqliteDataStore;
