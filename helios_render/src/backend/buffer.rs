//! GpuBuffer trait and the BufferManager factory contract

use std::any::Any;
use std::sync::Arc;

use crate::backend::{IndexType, Mesh, VertexLayout};

/// What a buffer is bound as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Vertex buffer
    Vertex,
    /// Index buffer
    Index,
    /// Uniform/constant buffer
    Uniform,
    /// Storage buffer
    Storage,
}

/// How often a buffer's contents change
///
/// Selects the native allocation strategy: `Static` buffers live in
/// device-local memory and are written through a staged copy; `Dynamic`
/// and `Stream` buffers are host-visible and written by direct mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Written once, drawn many times
    Static,
    /// Rewritten occasionally
    Dynamic,
    /// Rewritten every frame
    Stream,
}

/// Buffer resource handle
///
/// Handles are opaque and owned by the manager that created them. Validity
/// must be checked before use; operating on a destroyed handle is a
/// defensive no-op, not a fault.
pub trait GpuBuffer {
    /// Write data into the buffer at a byte offset
    ///
    /// Static buffers go through a staged upload; dynamic/stream buffers
    /// are written by direct memory mapping.
    fn set_data(&self, offset: u64, data: &[u8]);

    /// Size of the buffer in bytes
    fn size(&self) -> u64;

    /// What the buffer is bound as
    fn kind(&self) -> BufferKind;

    /// Allocation strategy the buffer was created with
    fn usage(&self) -> BufferUsage;

    /// Whether the handle still owns a live native object
    fn is_valid(&self) -> bool;

    /// Release the native allocation; calling twice is a no-op
    fn destroy(&self);

    /// Backend-internal access to the concrete type
    fn as_any(&self) -> &dyn Any;
}

/// Buffer factory owned by a backend
///
/// Creation never returns an error: a failed creation yields a handle with
/// `is_valid() == false` and a logged diagnostic.
pub trait BufferManager {
    /// Create a buffer, optionally uploading initial data
    fn create_buffer(
        &self,
        kind: BufferKind,
        usage: BufferUsage,
        size: u64,
        initial_data: Option<&[u8]>,
    ) -> Arc<dyn GpuBuffer>;

    /// Create a vertex buffer (convenience wrapper over `create_buffer`)
    fn create_vertex_buffer(
        &self,
        usage: BufferUsage,
        size: u64,
        initial_data: Option<&[u8]>,
    ) -> Arc<dyn GpuBuffer> {
        self.create_buffer(BufferKind::Vertex, usage, size, initial_data)
    }

    /// Create an index buffer (convenience wrapper over `create_buffer`)
    fn create_index_buffer(
        &self,
        usage: BufferUsage,
        size: u64,
        initial_data: Option<&[u8]>,
    ) -> Arc<dyn GpuBuffer> {
        self.create_buffer(BufferKind::Index, usage, size, initial_data)
    }

    /// Create a uniform buffer (convenience wrapper over `create_buffer`)
    fn create_uniform_buffer(
        &self,
        usage: BufferUsage,
        size: u64,
        initial_data: Option<&[u8]>,
    ) -> Arc<dyn GpuBuffer> {
        self.create_buffer(BufferKind::Uniform, usage, size, initial_data)
    }

    /// Create a mesh bound to a vertex layout
    ///
    /// The same layout instance must be used for the pipeline that draws
    /// the mesh.
    fn create_mesh(&self, layout: &VertexLayout, index_type: IndexType) -> Arc<dyn Mesh>;

    /// Release a buffer's native allocation
    ///
    /// Waits for the GPU to be idle with respect to the buffer before
    /// freeing. Destroying the same handle twice is a no-op.
    fn destroy_buffer(&self, buffer: &Arc<dyn GpuBuffer>);
}
