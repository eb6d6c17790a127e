//! Error Types
//!
//! This module defines the error type used throughout the viewer.
//!
//! # Overview
//!
//! [`PeopleError`] covers every failure mode of scene construction:
//! - GPU and window initialization failures
//! - Asset reading and decoding errors
//! - Character assembly errors (missing nodes, unskinned meshes, unknown bones)
//!
//! All fallible APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, PeopleError>`.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for the viewer.
#[derive(Error, Debug)]
pub enum PeopleError {
    // ========================================================================
    // GPU & Window Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the presentation surface.
    #[error("Failed to create surface: {0}")]
    SurfaceCreateFailed(#[from] wgpu::CreateSurfaceError),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// Event loop error (winit).
    #[error("Event loop error: {0}")]
    EventLoopError(#[from] winit::error::EventLoopError),

    /// Window creation error (winit).
    #[error("Window creation error: {0}")]
    WindowCreateFailed(#[from] winit::error::OsError),

    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// Reading an asset from disk failed.
    #[error("Failed to read asset {path}: {source}")]
    AssetRead {
        /// Resolved path of the asset
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// File I/O error without path context.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// glTF parsing or accessor error.
    #[error("glTF error: {0}")]
    GltfError(String),

    /// Image decoding error.
    #[error("Image decode error: {0}")]
    ImageDecodeError(String),

    /// Data URI parsing error.
    #[error("Data URI error: {0}")]
    DataUriError(String),

    /// Base64 decoding error.
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    /// JSON parse error (manifests).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Asset index out of bounds.
    #[error("Asset index out of bounds: {context} (index: {index})")]
    AssetIndexOutOfBounds {
        /// Description of what was being accessed
        context: String,
        /// The invalid index
        index: usize,
    },

    // ========================================================================
    // Character Assembly Errors
    // ========================================================================
    /// A named node was expected in a loaded model but is absent.
    #[error("Node '{name}' not found in {asset}")]
    NodeNotFound {
        /// Node name that was looked up
        name: String,
        /// Asset the lookup ran against
        asset: String,
    },

    /// A node was expected to carry a skinned mesh.
    #[error("Node '{0}' is not a skinned mesh")]
    NotSkinned(String),

    /// A slot mesh references a bone the shared skeleton does not have.
    #[error("Mesh '{mesh}' uses bone '{bone}' which the shared skeleton does not contain")]
    MissingBone {
        /// Mesh being bound
        mesh: String,
        /// Bone name that could not be resolved
        bone: String,
    },

    /// The requested animation clip does not exist.
    #[error("Animation clip index {index} out of range ({count} clips loaded)")]
    ClipIndexOutOfRange {
        /// Requested clip index
        index: usize,
        /// Number of available clips
        count: usize,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A color string could not be parsed.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Unknown preset name.
    #[error("Unknown preset '{0}' (expected one of: people, room, room-grid)")]
    UnknownPreset(String),

    // ========================================================================
    // Async Errors
    // ========================================================================
    /// A background load task panicked or was cancelled.
    #[error("Task join error: {0}")]
    TaskJoinError(String),
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<image::ImageError> for PeopleError {
    fn from(err: image::ImageError) -> Self {
        PeopleError::ImageDecodeError(err.to_string())
    }
}

impl From<gltf::Error> for PeopleError {
    fn from(err: gltf::Error) -> Self {
        PeopleError::GltfError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for PeopleError {
    fn from(err: tokio::task::JoinError) -> Self {
        PeopleError::TaskJoinError(err.to_string())
    }
}

/// Alias for `Result<T, PeopleError>`.
pub type Result<T> = std::result::Result<T, PeopleError>;
