/// Convenience result type used across the crate.
pub type CacheResult<T> = Result<T, CacheError>;

/// Top-level error taxonomy used by cache APIs.
///
/// Expected runtime conditions (a generator producing nothing, an upload
/// failing) never cross the cache boundary as errors; they surface as an
/// absent proxy. This type covers constructor validation and the uploader
/// seam.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// Invalid caller-provided bitmap or geometry data.
    #[error("validation error: {0}")]
    Validation(String),

    /// GPU-side materialization of a proxy failed.
    #[error("upload error: {0}")]
    Upload(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CacheError {
    /// Build a [`CacheError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CacheError::Upload`] value.
    pub fn upload(msg: impl Into<String>) -> Self {
        Self::Upload(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
