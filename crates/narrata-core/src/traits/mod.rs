pub mod data_store;
pub mod generative_model;
pub mod response_cache;

pub use data_store::{ExecutionOptions, IDataStore};
pub use generative_model::IGenerativeModel;
pub use response_cache::IResponseCache;
