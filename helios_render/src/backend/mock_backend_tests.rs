use std::sync::Arc;

use super::*;
use crate::backend::{UniformLayout, VertexFormat, VertexLayout};

fn headless_backend() -> MockBackend {
    let mut backend = MockBackend::new();
    backend.initialize_headless(800, 600);
    backend
}

fn test_shader(backend: &MockBackend) -> Arc<dyn ShaderProgram> {
    let layout = VertexLayout::from_formats(&[VertexFormat::FLOAT3, VertexFormat::FLOAT4]);
    let uniforms = UniformLayout {
        bindings: vec![UniformBinding {
            name: "scene".to_string(),
            slot: 0,
            binding_type: BindingType::UniformBuffer,
            size: 128,
            stages: crate::backend::ShaderStageFlags::VERTEX,
        }],
    };
    backend.shader_manager().create_from_source(&ShaderProgramDesc {
        vertex_source: "void main() {}",
        fragment_source: "void main() {}",
        vertex_layout: &layout,
        uniform_layout: &uniforms,
    })
}

fn test_draw_command(backend: &MockBackend, frame_index: u32) -> DrawCommand {
    let shader = test_shader(backend);
    let uniform_set = backend.uniform_manager().create_binding_for_shader(&shader);
    let layout = VertexLayout::from_formats(&[VertexFormat::FLOAT3, VertexFormat::FLOAT4]);
    let mesh = backend.buffer_manager().create_mesh(&layout, IndexType::U16);
    // One triangle: three vertices of 28 bytes each, no indices
    mesh.set_vertex_data(&[0u8; 84]);
    DrawCommand {
        shader,
        uniform_set,
        frame_index,
        mesh,
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_initialize_without_window_stays_uninitialized() {
    let mut backend = MockBackend::new();
    backend.initialize(None, 800, 600);

    assert!(!backend.is_initialized());
    assert!(!backend.begin_frame());
    // Teardown of a never-initialized backend must be safe
    backend.destroy();
    backend.destroy();
}

#[test]
fn test_begin_frame_fails_before_initialization() {
    let mut backend = MockBackend::new();
    assert!(!backend.begin_frame());
}

#[test]
fn test_destroy_is_idempotent() {
    let mut backend = headless_backend();
    backend.destroy();
    assert!(!backend.is_initialized());
    backend.destroy();
    assert!(!backend.begin_frame());
}

// ============================================================================
// Frame cycle
// ============================================================================

#[test]
fn test_frame_counter_cycles_through_slots() {
    let mut backend = headless_backend();
    let max = backend.max_frames_in_flight();
    assert_eq!(backend.current_frame(), 0);

    for i in 0..(max * 2) {
        assert_eq!(backend.current_frame(), i % max);
        assert!(backend.begin_frame());
        backend.end_frame();
    }
    assert_eq!(backend.current_frame(), 0);
}

#[test]
fn test_one_triangle_frame_advances_current_frame() {
    let mut backend = headless_backend();
    let command = test_draw_command(&backend, backend.current_frame());

    assert!(backend.begin_frame());
    backend.submit_draw_command(command);
    backend.execute_draw_commands();
    backend.end_frame();

    assert_eq!(backend.current_frame(), 1);
    assert_eq!(backend.executed_draws, 1);
    assert!(backend
        .queue
        .buffer
        .commands
        .contains(&"draw_mesh:3".to_string()));
}

#[test]
fn test_end_frame_without_begin_is_noop() {
    let mut backend = headless_backend();
    backend.end_frame();
    assert_eq!(backend.current_frame(), 0);
}

#[test]
fn test_stats_reset_each_frame() {
    let mut backend = headless_backend();

    assert!(backend.begin_frame());
    backend.submit_draw_command(test_draw_command(&backend, 0));
    backend.execute_draw_commands();
    assert_eq!(backend.stats().draw_calls, 1);
    backend.end_frame();

    assert!(backend.begin_frame());
    assert_eq!(backend.stats().draw_calls, 0);
    backend.end_frame();
}

// ============================================================================
// Draw queue
// ============================================================================

#[test]
fn test_execute_drains_queue_exactly_once() {
    let mut backend = headless_backend();
    assert!(backend.begin_frame());

    backend.submit_draw_command(test_draw_command(&backend, 0));
    backend.submit_draw_command(test_draw_command(&backend, 0));
    assert_eq!(backend.queued_draws(), 2);

    backend.execute_draw_commands();
    assert_eq!(backend.queued_draws(), 0);
    assert_eq!(backend.executed_draws, 2);

    // Second execute sees an empty queue and does nothing
    backend.execute_draw_commands();
    assert_eq!(backend.executed_draws, 2);
    backend.end_frame();
}

#[test]
fn test_execute_with_empty_queue_is_noop() {
    let mut backend = headless_backend();
    assert!(backend.begin_frame());
    backend.execute_draw_commands();
    assert_eq!(backend.executed_draws, 0);
    backend.end_frame();
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn test_resize_to_same_size_is_deduplicated() {
    let mut backend = headless_backend();
    backend.on_resize(800, 600);
    backend.on_resize(800, 600);
    assert_eq!(backend.rebuild_count, 0);

    backend.on_resize(1024, 768);
    assert_eq!(backend.rebuild_count, 1);
    backend.on_resize(1024, 768);
    assert_eq!(backend.rebuild_count, 1);
}

#[test]
fn test_zero_size_resize_defers_rebuild() {
    let mut backend = headless_backend();
    backend.on_resize(0, 0);
    assert_eq!(backend.rebuild_count, 0);

    // Restoring a real size performs the deferred rebuild
    backend.on_resize(800, 601);
    assert_eq!(backend.rebuild_count, 1);
}

// ============================================================================
// Resources
// ============================================================================

#[test]
fn test_buffer_validity_around_destroy() {
    let backend = headless_backend();
    let buffer = backend
        .buffer_manager()
        .create_vertex_buffer(BufferUsage::Static, 256, Some(&[1u8; 256]));
    assert!(buffer.is_valid());
    assert_eq!(buffer.size(), 256);
    assert_eq!(buffer.kind(), BufferKind::Vertex);

    backend.buffer_manager().destroy_buffer(&buffer);
    assert!(!buffer.is_valid());
    // Writing through a destroyed handle is ignored, not a fault
    buffer.set_data(0, &[2u8; 16]);
}

#[test]
fn test_mesh_counts_follow_uploads() {
    let backend = headless_backend();
    let layout = VertexLayout::from_formats(&[VertexFormat::FLOAT3]);
    let mesh = backend.buffer_manager().create_mesh(&layout, IndexType::U32);

    mesh.set_vertex_data(&[0u8; 48]);
    mesh.set_index_data(&[0u8; 24]);
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.index_count(), 6);
    assert_eq!(mesh.index_type(), IndexType::U32);
}

#[test]
fn test_failed_shader_compilation_yields_invalid_handle() {
    let backend = headless_backend();
    backend
        .shaders
        .fail_compilation
        .store(true, std::sync::atomic::Ordering::Release);

    let shader = test_shader(&backend);
    assert!(!shader.is_valid());
}

#[test]
fn test_uniform_set_rejects_unknown_slot() {
    let backend = headless_backend();
    let shader = test_shader(&backend);
    let set = backend.uniform_manager().create_binding_for_shader(&shader);
    let buffer = backend
        .buffer_manager()
        .create_uniform_buffer(BufferUsage::Dynamic, 128, None);

    set.update_buffer(0, &buffer, 128);
    set.update_buffer(7, &buffer, 128);

    let mock = set
        .as_any()
        .downcast_ref::<MockUniformBindingSet>()
        .unwrap();
    let updates = mock.updates.lock().unwrap();
    assert_eq!(updates.as_slice(), &[(0, 128)]);
}

#[test]
fn test_manager_records_per_frame_uniform_writes() {
    let backend = headless_backend();
    let shader = test_shader(&backend);
    let set = backend.uniform_manager().create_binding_for_shader(&shader);

    backend.uniform_manager().update_uniform_buffer(&set, 0, 0, &[1u8; 16]);
    backend.uniform_manager().update_uniform_buffer(&set, 0, 2, &[2u8; 16]);

    let mock = set
        .as_any()
        .downcast_ref::<MockUniformBindingSet>()
        .unwrap();
    let writes = mock.writes.lock().unwrap();
    assert_eq!(writes.len(), 2);
    assert_eq!((writes[0].0, writes[0].1), (0, 0));
    assert_eq!((writes[1].0, writes[1].1), (0, 2));
    assert_eq!(writes[1].2, vec![2u8; 16]);
}

#[test]
fn test_manager_rejects_unknown_slot_and_bad_frame() {
    let backend = headless_backend();
    let shader = test_shader(&backend);
    let set = backend.uniform_manager().create_binding_for_shader(&shader);

    // Slot 7 is not in the layout; frame 3 is past the flight count
    backend.uniform_manager().update_uniform_buffer(&set, 7, 0, &[0u8; 16]);
    backend
        .uniform_manager()
        .update_uniform_buffer(&set, 0, MOCK_MAX_FRAMES_IN_FLIGHT, &[0u8; 16]);

    let mock = set
        .as_any()
        .downcast_ref::<MockUniformBindingSet>()
        .unwrap();
    assert!(mock.writes.lock().unwrap().is_empty());
}

// ============================================================================
// Command buffer state guard
// ============================================================================

#[test]
fn test_commands_outside_recording_are_ignored() {
    let mut buffer = MockCommandBuffer::default();
    assert!(!buffer.is_recording());
    buffer.draw(3, 0);
    assert!(buffer.commands.is_empty());

    buffer.begin();
    assert!(buffer.is_recording());
    buffer.draw(3, 0);
    buffer.end();
    assert!(!buffer.is_recording());
    buffer.draw_indexed(6, 0, 0);

    assert_eq!(buffer.commands, vec!["begin", "draw:3", "end"]);
}
