//! Error types for the post-processing stack.
//!
//! This module provides a unified error type [`PostFxError`] and a convenient [`Result`] alias.

use thiserror::Error;

use crate::core::types::{TextureDesc, TextureId};

/// Main error type for the compositor.
///
/// Most per-effect problems never surface here: an effect whose prerequisites are
/// missing reports itself inactive instead. What remains are hard failures that
/// stop the frame.
#[derive(Debug, Error)]
pub enum PostFxError {
    /// The device has no program registered under this name.
    #[error("Shader not found: {0}")]
    ShaderNotFound(String),
    /// The device refused to allocate a texture.
    #[error("Texture allocation failed for {desc:?}: {reason}")]
    AllocationFailed { desc: TextureDesc, reason: String },
    /// A handle does not refer to a live texture.
    #[error("Invalid texture: {0}")]
    InvalidTexture(TextureId),
    /// A blit that cannot be executed (same source and destination, size mismatch...).
    #[error("Invalid blit: {0}")]
    InvalidBlit(String),
    /// A command buffer referenced a temporary that was never acquired.
    #[error("Unknown temporary render target: {0}")]
    UnknownTemporary(&'static str),
    /// Profile (de)serialisation failed.
    #[error("Profile error: {0}")]
    Profile(#[from] serde_json::Error),
}

/// Convenient Result type alias for compositor operations.
pub type Result<T> = std::result::Result<T, PostFxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PostFxError::ShaderNotFound("Hidden/Post FX/Bloom".to_string());
        assert!(err.to_string().contains("Shader not found"));
        assert!(err.to_string().contains("Bloom"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: PostFxError = json_err.into();
        assert!(matches!(err, PostFxError::Profile(_)));
    }
}
