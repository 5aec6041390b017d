//! Error types for the Helios render abstraction
//!
//! This module defines the error type used throughout the backend contract.
//! Errors never cross the public backend boundary during the frame loop:
//! initialization failures surface as `is_initialized() == false` and
//! resource-creation failures surface as invalid handles. `RenderResult` is
//! used by the internal fallible steps backends are built from.

use std::fmt;

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Rendering errors
#[derive(Debug, Clone)]
pub enum RenderError {
    /// Backend-specific error (Vulkan, OpenGL, ...)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (buffer, mesh, shader, binding set)
    InvalidResource(String),

    /// Initialization failed (instance, device, context, swapchain)
    InitializationFailed(String),

    /// Operation not supported by the active backend
    UnsupportedOperation(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::BackendError(msg) => write!(f, "Backend error: {}", msg),
            RenderError::OutOfMemory => write!(f, "Out of GPU memory"),
            RenderError::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            RenderError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            RenderError::UnsupportedOperation(msg) => write!(f, "Unsupported operation: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
