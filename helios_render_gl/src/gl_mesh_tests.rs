use super::*;
use helios_render::backend::VertexFormat;

#[test]
fn test_index_type_mapping() {
    assert_eq!(gl_index_type(IndexType::U16), glow::UNSIGNED_SHORT);
    assert_eq!(gl_index_type(IndexType::U32), glow::UNSIGNED_INT);
}

#[test]
fn test_component_mapping() {
    assert_eq!(gl_component(VertexComponent::F32), (glow::FLOAT, false, false));
    assert_eq!(
        gl_component(VertexComponent::U8Norm),
        (glow::UNSIGNED_BYTE, true, false)
    );
    assert_eq!(gl_component(VertexComponent::U32), (glow::UNSIGNED_INT, false, true));
    assert_eq!(gl_component(VertexComponent::I32), (glow::INT, false, true));
}

#[test]
fn test_invalid_mesh_is_inert() {
    let layout = VertexLayout::from_formats(&[VertexFormat::FLOAT3, VertexFormat::FLOAT2]);
    let mesh = GlMesh::invalid(layout, IndexType::U16);
    assert!(!mesh.is_valid());
    assert!(!mesh.bind());

    mesh.set_vertex_data(&[0u8; 40]);
    mesh.set_index_data(&[0u8; 12]);
    assert_eq!(mesh.vertex_count(), 0);
    assert_eq!(mesh.index_count(), 0);
    mesh.destroy();
}
