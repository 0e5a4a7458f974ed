/// Response cache storage errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache storage error: {message}")]
    Storage { message: String },
}
