//! Buffer - OpenGL implementation of GpuBuffer and BufferManager

use std::any::Any;
use std::cell::Cell;
use std::sync::Arc;

use glow::HasContext;

use helios_render::backend::{
    BufferKind, BufferManager, BufferUsage, GpuBuffer, IndexType, Mesh, VertexLayout,
};
use helios_render::{render_error, render_warn};

use crate::gl_mesh::GlMesh;

/// GL bind target for a buffer kind
pub(crate) fn gl_target(kind: BufferKind) -> u32 {
    match kind {
        BufferKind::Vertex => glow::ARRAY_BUFFER,
        BufferKind::Index => glow::ELEMENT_ARRAY_BUFFER,
        BufferKind::Uniform => glow::UNIFORM_BUFFER,
        BufferKind::Storage => glow::SHADER_STORAGE_BUFFER,
    }
}

/// GL usage hint for an allocation strategy
pub(crate) fn gl_usage_hint(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::Static => glow::STATIC_DRAW,
        BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
        BufferUsage::Stream => glow::STREAM_DRAW,
    }
}

/// OpenGL buffer
///
/// GL has no explicit memory domains, so every usage maps to a plain
/// buffer object with the matching usage hint; `set_data` is a direct
/// `glBufferSubData` for all strategies.
pub struct GlBuffer {
    gl: Option<Arc<glow::Context>>,
    raw: Cell<Option<glow::Buffer>>,
    kind: BufferKind,
    usage: BufferUsage,
    size: u64,
}

impl GlBuffer {
    pub(crate) fn new(
        gl: Arc<glow::Context>,
        kind: BufferKind,
        usage: BufferUsage,
        size: u64,
        initial_data: Option<&[u8]>,
    ) -> Self {
        let target = gl_target(kind);
        let raw = unsafe {
            match gl.create_buffer() {
                Ok(buffer) => {
                    gl.bind_buffer(target, Some(buffer));
                    gl.buffer_data_size(target, size as i32, gl_usage_hint(usage));
                    if let Some(data) = initial_data {
                        gl.buffer_sub_data_u8_slice(target, 0, data);
                    }
                    gl.bind_buffer(target, None);
                    Some(buffer)
                }
                Err(e) => {
                    render_error!("helios::gl", "Buffer creation failed: {}", e);
                    None
                }
            }
        };
        Self {
            gl: Some(gl),
            raw: Cell::new(raw),
            kind,
            usage,
            size,
        }
    }

    /// Handle that is invalid from birth, for creation paths that cannot
    /// reach the native API
    pub(crate) fn invalid(kind: BufferKind, usage: BufferUsage, size: u64) -> Self {
        Self {
            gl: None,
            raw: Cell::new(None),
            kind,
            usage,
            size,
        }
    }

    /// Native buffer object, when still alive
    pub(crate) fn raw(&self) -> Option<glow::Buffer> {
        self.raw.get()
    }
}

impl GpuBuffer for GlBuffer {
    fn set_data(&self, offset: u64, data: &[u8]) {
        let (Some(gl), Some(raw)) = (self.gl.as_ref(), self.raw.get()) else {
            render_warn!("helios::gl", "set_data on invalid buffer ignored");
            return;
        };
        if offset + data.len() as u64 > self.size {
            render_error!(
                "helios::gl",
                "set_data out of bounds: offset {} + len {} > size {}",
                offset,
                data.len(),
                self.size
            );
            return;
        }
        let target = gl_target(self.kind);
        unsafe {
            gl.bind_buffer(target, Some(raw));
            gl.buffer_sub_data_u8_slice(target, offset as i32, data);
            gl.bind_buffer(target, None);
        }
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn kind(&self) -> BufferKind {
        self.kind
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn is_valid(&self) -> bool {
        self.raw.get().is_some()
    }

    fn destroy(&self) {
        if let (Some(gl), Some(raw)) = (self.gl.as_ref(), self.raw.take()) {
            unsafe { gl.delete_buffer(raw) };
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for GlBuffer {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// OpenGL buffer factory
///
/// Holds no context until the backend finishes initialization; creation
/// before that point yields invalid handles with a logged diagnostic.
pub struct GlBufferManager {
    gl: Option<Arc<glow::Context>>,
}

impl GlBufferManager {
    pub(crate) fn new() -> Self {
        Self { gl: None }
    }

    pub(crate) fn attach(&mut self, gl: Arc<glow::Context>) {
        self.gl = Some(gl);
    }

    pub(crate) fn detach(&mut self) {
        self.gl = None;
    }
}

impl BufferManager for GlBufferManager {
    fn create_buffer(
        &self,
        kind: BufferKind,
        usage: BufferUsage,
        size: u64,
        initial_data: Option<&[u8]>,
    ) -> Arc<dyn GpuBuffer> {
        let Some(gl) = self.gl.as_ref() else {
            render_error!("helios::gl", "create_buffer before initialization");
            return Arc::new(GlBuffer::invalid(kind, usage, size));
        };
        if kind == BufferKind::Storage {
            // Storage buffers need GL 4.3; the 3.3 baseline has none
            render_error!("helios::gl", "Storage buffers are not supported on OpenGL 3.3");
            return Arc::new(GlBuffer::invalid(kind, usage, size));
        }
        Arc::new(GlBuffer::new(gl.clone(), kind, usage, size, initial_data))
    }

    fn create_mesh(&self, layout: &VertexLayout, index_type: IndexType) -> Arc<dyn Mesh> {
        let Some(gl) = self.gl.as_ref() else {
            render_error!("helios::gl", "create_mesh before initialization");
            return Arc::new(GlMesh::invalid(layout.clone(), index_type));
        };
        Arc::new(GlMesh::new(gl.clone(), layout.clone(), index_type))
    }

    fn destroy_buffer(&self, buffer: &Arc<dyn GpuBuffer>) {
        if buffer.as_any().downcast_ref::<GlBuffer>().is_none() {
            render_error!("helios::gl", "destroy_buffer: handle from another backend");
            return;
        }
        // GL buffer deletion is deferred by the driver until the GPU is
        // done with the object, so no explicit wait is needed.
        buffer.destroy();
    }
}

#[cfg(test)]
#[path = "gl_buffer_tests.rs"]
mod tests;
