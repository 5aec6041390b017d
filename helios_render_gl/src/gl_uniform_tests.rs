use super::*;
use helios_render::backend::ShaderStageFlags;

fn test_layout() -> UniformLayout {
    UniformLayout {
        bindings: vec![UniformBinding {
            name: "scene".to_string(),
            slot: 0,
            binding_type: BindingType::UniformBuffer,
            size: 128,
            stages: ShaderStageFlags::VERTEX,
        }],
    }
}

#[test]
fn test_update_rejects_unknown_slot() {
    let set = GlUniformBindingSet::new(test_layout(), true);
    let buffer: Arc<dyn GpuBuffer> = Arc::new(GlBuffer::invalid(
        BufferKind::Uniform,
        BufferUsage::Dynamic,
        128,
    ));
    set.update_buffer(5, &buffer, 128);
    assert!(set.buffer_at(5).is_none());
}

#[test]
fn test_update_rejects_oversized_range() {
    let set = GlUniformBindingSet::new(test_layout(), true);
    let buffer: Arc<dyn GpuBuffer> = Arc::new(GlBuffer::invalid(
        BufferKind::Uniform,
        BufferUsage::Dynamic,
        256,
    ));
    set.update_buffer(0, &buffer, 256);
    assert!(set.buffer_at(0).is_none());
}

#[test]
fn test_update_attaches_buffer_to_slot() {
    let set = GlUniformBindingSet::new(test_layout(), true);
    let buffer: Arc<dyn GpuBuffer> = Arc::new(GlBuffer::invalid(
        BufferKind::Uniform,
        BufferUsage::Dynamic,
        128,
    ));
    set.update_buffer(0, &buffer, 128);
    assert!(set.buffer_at(0).is_some());
}

#[test]
fn test_destroy_invalidates_set() {
    let set = GlUniformBindingSet::new(test_layout(), true);
    assert!(set.is_valid());
    set.destroy();
    assert!(!set.is_valid());

    let buffer: Arc<dyn GpuBuffer> = Arc::new(GlBuffer::invalid(
        BufferKind::Uniform,
        BufferUsage::Dynamic,
        128,
    ));
    set.update_buffer(0, &buffer, 128);
    assert!(set.buffer_at(0).is_none());
}

#[test]
fn test_manager_without_context_yields_invalid_handles() {
    let manager = GlUniformManager::new();
    let binding = test_layout().bindings[0].clone();
    let buffer = manager.create_uniform_buffer("scene", &binding);
    assert!(!buffer.is_valid());
}
