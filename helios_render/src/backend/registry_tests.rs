use super::*;
use crate::backend::mock_backend::MockBackend;

fn mock_constructor() -> Box<dyn RenderBackend> {
    Box::new(MockBackend::new())
}

#[test]
fn test_create_registered_backend() {
    let mut registry = BackendRegistry::new();
    registry.register("mock", mock_constructor, || true, 0);

    let backend = registry.create("mock");
    assert!(backend.is_some());
    assert!(!backend.unwrap().is_initialized());
}

#[test]
fn test_create_unregistered_backend_returns_none() {
    let registry = BackendRegistry::new();
    assert!(registry.create("nonexistent").is_none());
}

#[test]
fn test_is_backend_available_follows_probe() {
    let mut registry = BackendRegistry::new();
    registry.register("present", mock_constructor, || true, 0);
    registry.register("absent", mock_constructor, || false, 0);

    assert!(registry.is_backend_available("present"));
    assert!(!registry.is_backend_available("absent"));
    assert!(!registry.is_backend_available("unregistered"));
}

#[test]
fn test_available_backends_filters_failed_probes() {
    let mut registry = BackendRegistry::new();
    registry.register("a", mock_constructor, || true, 0);
    registry.register("b", mock_constructor, || false, 5);
    registry.register("c", mock_constructor, || true, 10);

    let available = registry.available_backends();
    assert_eq!(available, vec!["a", "c"]);
}

#[test]
fn test_detect_best_backend_picks_highest_priority() {
    let mut registry = BackendRegistry::new();
    registry.register("opengl", mock_constructor, || true, 0);
    registry.register("vulkan", mock_constructor, || true, 10);

    assert_eq!(registry.detect_best_backend(), "vulkan");
}

#[test]
fn test_detect_best_backend_skips_failed_probe() {
    let mut registry = BackendRegistry::new();
    registry.register("opengl", mock_constructor, || true, 0);
    registry.register("vulkan", mock_constructor, || false, 10);

    assert_eq!(registry.detect_best_backend(), "opengl");
}

#[test]
fn test_detect_best_backend_tie_broken_by_registration_order() {
    let mut registry = BackendRegistry::new();
    registry.register("first", mock_constructor, || true, 5);
    registry.register("second", mock_constructor, || true, 5);

    assert_eq!(registry.detect_best_backend(), "first");
}

#[test]
fn test_detect_best_backend_falls_back_to_default() {
    let mut registry = BackendRegistry::new();
    registry.register("vulkan", mock_constructor, || false, 10);

    assert_eq!(registry.detect_best_backend(), DEFAULT_BACKEND);

    let empty = BackendRegistry::new();
    assert_eq!(empty.detect_best_backend(), DEFAULT_BACKEND);
}

#[test]
fn test_reregistration_replaces_entry_and_keeps_order() {
    let mut registry = BackendRegistry::new();
    registry.register("a", mock_constructor, || true, 1);
    registry.register("b", mock_constructor, || true, 1);
    // Same priority as "b": original position must still win the tie.
    registry.register("a", mock_constructor, || true, 1);

    assert_eq!(registry.detect_best_backend(), "a");
    assert_eq!(registry.available_backends().len(), 2);
}

#[test]
fn test_select_backend_prefers_available_choice() {
    let mut registry = BackendRegistry::new();
    registry.register("opengl", mock_constructor, || true, 0);
    registry.register("vulkan", mock_constructor, || true, 10);

    let selection = BackendSelection {
        preferred: Some("opengl".to_string()),
        force: false,
    };
    assert_eq!(select_backend(&registry, &selection), "opengl");
}

#[test]
fn test_select_backend_falls_back_when_preferred_unavailable() {
    let mut registry = BackendRegistry::new();
    registry.register("opengl", mock_constructor, || true, 0);
    registry.register("vulkan", mock_constructor, || false, 10);

    let selection = BackendSelection {
        preferred: Some("vulkan".to_string()),
        force: false,
    };
    assert_eq!(select_backend(&registry, &selection), "opengl");
}

#[test]
fn test_select_backend_force_overrides_probe() {
    let mut registry = BackendRegistry::new();
    registry.register("opengl", mock_constructor, || true, 0);
    registry.register("vulkan", mock_constructor, || false, 10);

    let selection = BackendSelection {
        preferred: Some("vulkan".to_string()),
        force: true,
    };
    assert_eq!(select_backend(&registry, &selection), "vulkan");
}

#[test]
fn test_select_backend_without_preference_auto_detects() {
    let mut registry = BackendRegistry::new();
    registry.register("opengl", mock_constructor, || true, 0);
    registry.register("vulkan", mock_constructor, || true, 10);

    assert_eq!(select_backend(&registry, &BackendSelection::default()), "vulkan");
}
