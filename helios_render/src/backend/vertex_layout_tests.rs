//! Unit tests for vertex layout construction and count derivation.

use crate::backend::vertex_layout::*;

#[test]
fn test_vertex_format_sizes() {
    assert_eq!(VertexFormat::FLOAT2.size_bytes(), 8);
    assert_eq!(VertexFormat::FLOAT3.size_bytes(), 12);
    assert_eq!(VertexFormat::FLOAT4.size_bytes(), 16);

    let rgba8 = VertexFormat { component: VertexComponent::U8Norm, count: 4 };
    assert_eq!(rgba8.size_bytes(), 4);
}

#[test]
fn test_from_formats_packs_offsets() {
    // position (vec3) + normal (vec3) + uv (vec2)
    let layout = VertexLayout::from_formats(&[
        VertexFormat::FLOAT3,
        VertexFormat::FLOAT3,
        VertexFormat::FLOAT2,
    ]);

    assert_eq!(layout.stride, 32);
    assert_eq!(layout.attributes.len(), 3);
    assert_eq!(layout.attributes[0].location, 0);
    assert_eq!(layout.attributes[0].offset, 0);
    assert_eq!(layout.attributes[1].offset, 12);
    assert_eq!(layout.attributes[2].offset, 24);
}

#[test]
fn test_vertex_count_derivation() {
    let layout = VertexLayout::from_formats(&[VertexFormat::FLOAT3]);
    assert_eq!(layout.stride, 12);
    assert_eq!(layout.vertex_count(36), 3);
    // Trailing partial vertex is ignored
    assert_eq!(layout.vertex_count(40), 3);
    assert_eq!(layout.vertex_count(0), 0);
}

#[test]
fn test_empty_layout_has_zero_count() {
    let layout = VertexLayout::default();
    assert_eq!(layout.stride, 0);
    assert_eq!(layout.vertex_count(1024), 0);
}
