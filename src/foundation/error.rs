/// Convenience result type used across the crate.
pub type OccludeResult<T> = Result<T, OccludeError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum OccludeError {
    /// Zero (or otherwise unusable) width/height at some stage of the pipeline.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// The drawing surface for a pass could not be acquired.
    #[error("rendering context unavailable: {0}")]
    RenderingContextUnavailable(String),

    /// The segmentation collaborator returned no usable cutout.
    #[error("segmentation failed: {0}")]
    SegmentationFailed(String),

    /// The source image could not be decoded.
    #[error("decode failed: {0}")]
    DecodeFailed(String),

    /// Invalid user-provided text spec or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// A pending task was cancelled before it produced a result.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OccludeError {
    /// Build an [`OccludeError::InvalidDimensions`] value.
    pub fn invalid_dimensions(msg: impl Into<String>) -> Self {
        Self::InvalidDimensions(msg.into())
    }

    /// Build an [`OccludeError::RenderingContextUnavailable`] value.
    pub fn rendering_context(msg: impl Into<String>) -> Self {
        Self::RenderingContextUnavailable(msg.into())
    }

    /// Build an [`OccludeError::SegmentationFailed`] value.
    pub fn segmentation(msg: impl Into<String>) -> Self {
        Self::SegmentationFailed(msg.into())
    }

    /// Build an [`OccludeError::DecodeFailed`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeFailed(msg.into())
    }

    /// Build an [`OccludeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`OccludeError::Cancelled`] value.
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Same variant and message, for errors that must be reported more than once.
    ///
    /// `Other` keeps only the rendered error chain.
    pub fn replicate(&self) -> Self {
        match self {
            Self::InvalidDimensions(m) => Self::InvalidDimensions(m.clone()),
            Self::RenderingContextUnavailable(m) => Self::RenderingContextUnavailable(m.clone()),
            Self::SegmentationFailed(m) => Self::SegmentationFailed(m.clone()),
            Self::DecodeFailed(m) => Self::DecodeFailed(m.clone()),
            Self::Validation(m) => Self::Validation(m.clone()),
            Self::Cancelled(m) => Self::Cancelled(m.clone()),
            Self::Other(e) => Self::Other(anyhow::anyhow!("{e:#}")),
        }
    }

    /// Whether an algorithmic pass may absorb this error and yield an empty result.
    ///
    /// Segmentation and decode failures are terminal for the image they belong to.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidDimensions(_) | Self::RenderingContextUnavailable(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
