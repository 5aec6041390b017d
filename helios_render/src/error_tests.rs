//! Unit tests for the RenderError type.

use crate::error::RenderError;

#[test]
fn test_display_backend_error() {
    let err = RenderError::BackendError("queue submit failed".to_string());
    assert_eq!(err.to_string(), "Backend error: queue submit failed");
}

#[test]
fn test_display_out_of_memory() {
    let err = RenderError::OutOfMemory;
    assert_eq!(err.to_string(), "Out of GPU memory");
}

#[test]
fn test_display_invalid_resource() {
    let err = RenderError::InvalidResource("destroyed buffer".to_string());
    assert_eq!(err.to_string(), "Invalid resource: destroyed buffer");
}

#[test]
fn test_display_initialization_failed() {
    let err = RenderError::InitializationFailed("no device".to_string());
    assert_eq!(err.to_string(), "Initialization failed: no device");
}

#[test]
fn test_display_unsupported_operation() {
    let err = RenderError::UnsupportedOperation("binary shaders".to_string());
    assert_eq!(err.to_string(), "Unsupported operation: binary shaders");
}

#[test]
fn test_error_is_std_error() {
    let err: Box<dyn std::error::Error> = Box::new(RenderError::OutOfMemory);
    assert_eq!(err.to_string(), "Out of GPU memory");
}

#[test]
fn test_error_is_cloneable() {
    let err = RenderError::BackendError("original".to_string());
    let clone = err.clone();
    assert_eq!(err.to_string(), clone.to_string());
}
