//! Mesh trait - vertex/index buffers bound to a vertex layout

use std::any::Any;

use crate::backend::{IndexType, VertexLayout};

/// Mesh resource handle
///
/// A mesh binds a `VertexLayout` to concrete vertex and index buffers.
/// Vertex and index counts are re-derived from the byte size of each
/// upload (`byte_size / stride`, `byte_size / index_width`).
pub trait Mesh {
    /// Upload vertex data; the vertex count becomes `data.len() / stride`
    fn set_vertex_data(&self, data: &[u8]);

    /// Upload index data; the index count becomes `data.len() / index_width`
    fn set_index_data(&self, data: &[u8]);

    /// Number of vertices currently uploaded
    fn vertex_count(&self) -> u32;

    /// Number of indices currently uploaded (0 for non-indexed meshes)
    fn index_count(&self) -> u32;

    /// Index element type
    fn index_type(&self) -> IndexType;

    /// The layout this mesh was created with
    fn layout(&self) -> &VertexLayout;

    /// Whether the handle still owns live native objects
    fn is_valid(&self) -> bool;

    /// Release the native buffers; calling twice is a no-op
    fn destroy(&self);

    /// Backend-internal access to the concrete type
    fn as_any(&self) -> &dyn Any;
}
