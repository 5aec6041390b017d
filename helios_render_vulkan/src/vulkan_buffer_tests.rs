use super::*;

#[test]
fn test_usage_flags_mapping() {
    assert!(vk_buffer_usage(BufferKind::Vertex).contains(vk::BufferUsageFlags::VERTEX_BUFFER));
    assert!(vk_buffer_usage(BufferKind::Index).contains(vk::BufferUsageFlags::INDEX_BUFFER));
    assert!(vk_buffer_usage(BufferKind::Uniform).contains(vk::BufferUsageFlags::UNIFORM_BUFFER));
    assert!(vk_buffer_usage(BufferKind::Storage).contains(vk::BufferUsageFlags::STORAGE_BUFFER));
    // Every kind accepts staged uploads
    for kind in [
        BufferKind::Vertex,
        BufferKind::Index,
        BufferKind::Uniform,
        BufferKind::Storage,
    ] {
        assert!(vk_buffer_usage(kind).contains(vk::BufferUsageFlags::TRANSFER_DST));
    }
}

#[test]
fn test_memory_location_follows_usage() {
    assert_eq!(vk_memory_location(BufferUsage::Static), MemoryLocation::GpuOnly);
    assert_eq!(vk_memory_location(BufferUsage::Dynamic), MemoryLocation::CpuToGpu);
    assert_eq!(vk_memory_location(BufferUsage::Stream), MemoryLocation::CpuToGpu);
}

#[test]
fn test_invalid_buffer_is_inert() {
    let buffer = VulkanBuffer::invalid(BufferKind::Vertex, BufferUsage::Static, 64);
    assert!(!buffer.is_valid());
    assert!(buffer.raw().is_none());
    buffer.set_data(0, &[0u8; 16]);
    buffer.destroy();
    buffer.destroy();
}

#[test]
fn test_manager_without_context_yields_invalid_handles() {
    let manager = VulkanBufferManager::new();
    let buffer = manager.create_buffer(BufferKind::Index, BufferUsage::Static, 32, None);
    assert!(!buffer.is_valid());
}
