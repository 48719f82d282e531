/// Convenience result type used across stardream.
pub type StardreamResult<T> = Result<T, StardreamError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Per-slot failures (`ImageLoad`, `TextureBuild`) are contained by the caller and rendered as a
/// placeholder. `Export` is surfaced to whoever triggered the export. `Persistence` and
/// `ConfigIntegrity` are logged and recovered from locally.
#[derive(thiserror::Error, Debug)]
pub enum StardreamError {
    /// Invalid caller-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Image bytes missing from the store or undecodable.
    #[error("image load error: {0}")]
    ImageLoad(String),

    /// Pixel processing failed while baking a masked texture.
    #[error("texture build error: {0}")]
    TextureBuild(String),

    /// Offscreen render, encode or delivery failed during export.
    #[error("export error: {0}")]
    Export(String),

    /// Settings or image store read/write failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Malformed persisted configuration document.
    #[error("configuration integrity error: {0}")]
    ConfigIntegrity(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StardreamError {
    /// Build a [`StardreamError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StardreamError::ImageLoad`] value.
    pub fn image_load(msg: impl Into<String>) -> Self {
        Self::ImageLoad(msg.into())
    }

    /// Build a [`StardreamError::TextureBuild`] value.
    pub fn texture_build(msg: impl Into<String>) -> Self {
        Self::TextureBuild(msg.into())
    }

    /// Build a [`StardreamError::Export`] value.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build a [`StardreamError::Persistence`] value.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Build a [`StardreamError::ConfigIntegrity`] value.
    pub fn config_integrity(msg: impl Into<String>) -> Self {
        Self::ConfigIntegrity(msg.into())
    }

    /// `true` for failures that only affect a single slot's imagery.
    pub fn is_slot_local(&self) -> bool {
        matches!(self, Self::ImageLoad(_) | Self::TextureBuild(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
