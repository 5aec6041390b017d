use super::*;
use helios_render::backend::VertexFormat;

#[test]
fn test_index_type_mapping() {
    assert_eq!(vk_index_type(IndexType::U16), vk::IndexType::UINT16);
    assert_eq!(vk_index_type(IndexType::U32), vk::IndexType::UINT32);
}

#[test]
fn test_invalid_mesh_is_inert() {
    let layout = VertexLayout::from_formats(&[VertexFormat::FLOAT3, VertexFormat::FLOAT2]);
    let mesh = VulkanMesh::invalid(layout, IndexType::U32);
    assert!(!mesh.is_valid());
    assert!(mesh.raw_vertex_buffer().is_none());
    assert!(mesh.raw_index_buffer().is_none());

    mesh.set_vertex_data(&[0u8; 40]);
    mesh.set_index_data(&[0u8; 12]);
    assert_eq!(mesh.vertex_count(), 0);
    assert_eq!(mesh.index_count(), 0);
    mesh.destroy();
}
