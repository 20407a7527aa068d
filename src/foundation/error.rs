/// Crate-wide result alias.
pub type SeqResult<T> = Result<T, SeqError>;

/// Errors surfaced by the engine.
///
/// Only configuration-time misuse is ever returned to callers of the playback surface. Runtime
/// failures (network, decode) are recovered where they happen and logged instead.
#[derive(thiserror::Error, Debug)]
pub enum SeqError {
    /// The engine was built without a viewport container.
    #[error("no container element was provided")]
    NoElement,

    /// The engine was built without any image sets.
    #[error("no image sets were provided")]
    NoImageSets,

    /// The active image set has no images.
    #[error("active image set has no images: {0}")]
    NoImages(String),

    /// A ranged segment has `from >= to` or non-finite bounds.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Start and end values of a segment cannot be interpolated together.
    #[error("unit mismatch: {0}")]
    UnitMismatch(String),

    /// A unit or color string could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A resource fetch failed.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Encoded image bytes could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A render backend could not be created or failed to paint.
    #[error("backend error: {0}")]
    Backend(String),

    /// Invalid engine options.
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SeqError {
    pub fn no_images(msg: impl Into<String>) -> Self {
        Self::NoImages(msg.into())
    }

    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Self::InvalidRange(msg.into())
    }

    pub fn unit_mismatch(msg: impl Into<String>) -> Self {
        Self::UnitMismatch(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
