use super::*;

#[test]
fn test_bind_target_mapping() {
    assert_eq!(gl_target(BufferKind::Vertex), glow::ARRAY_BUFFER);
    assert_eq!(gl_target(BufferKind::Index), glow::ELEMENT_ARRAY_BUFFER);
    assert_eq!(gl_target(BufferKind::Uniform), glow::UNIFORM_BUFFER);
    assert_eq!(gl_target(BufferKind::Storage), glow::SHADER_STORAGE_BUFFER);
}

#[test]
fn test_usage_hint_mapping() {
    assert_eq!(gl_usage_hint(BufferUsage::Static), glow::STATIC_DRAW);
    assert_eq!(gl_usage_hint(BufferUsage::Dynamic), glow::DYNAMIC_DRAW);
    assert_eq!(gl_usage_hint(BufferUsage::Stream), glow::STREAM_DRAW);
}

#[test]
fn test_invalid_buffer_reports_metadata() {
    let buffer = GlBuffer::invalid(BufferKind::Vertex, BufferUsage::Static, 64);
    assert!(!buffer.is_valid());
    assert_eq!(buffer.size(), 64);
    assert_eq!(buffer.kind(), BufferKind::Vertex);
    assert_eq!(buffer.usage(), BufferUsage::Static);
    // Writing through an invalid handle is ignored, not a fault
    buffer.set_data(0, &[0u8; 16]);
    buffer.destroy();
}

#[test]
fn test_manager_without_context_yields_invalid_handles() {
    let manager = GlBufferManager::new();
    let buffer = manager.create_buffer(BufferKind::Uniform, BufferUsage::Dynamic, 128, None);
    assert!(!buffer.is_valid());

    let layout = VertexLayout::from_formats(&[helios_render::backend::VertexFormat::FLOAT3]);
    let mesh = manager.create_mesh(&layout, IndexType::U16);
    assert!(!mesh.is_valid());
}
