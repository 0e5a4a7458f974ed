//! Read connection pool and the pragmas applied to it.

pub mod pragmas;
pub mod read_pool;

pub use read_pool::ReadPool;
