//! # narrata-llm
//!
//! Generative-model access for the pipeline: HTTP providers behind
//! [`narrata_core::traits::IGenerativeModel`], a content-addressed response
//! cache (moka in front of SQLite), and [`CachedModel`], which routes every
//! call through that cache.

pub mod cache;
pub mod engine;
pub mod providers;

pub use cache::ResponseCache;
pub use engine::CachedModel;
pub use providers::create_provider;
