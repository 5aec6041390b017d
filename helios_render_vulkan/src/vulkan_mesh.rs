//! Mesh - Vulkan implementation of the Mesh trait
//!
//! Owns one device-local vertex buffer and an optional index buffer,
//! both filled through staged uploads. Buffers are reallocated when an
//! upload changes size.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use ash::vk;

use helios_render::backend::{BufferKind, BufferUsage, GpuBuffer, IndexType, Mesh, VertexLayout};
use helios_render::{render_error, render_warn};

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_context::GpuContext;

/// Vulkan index element type
pub(crate) fn vk_index_type(index_type: IndexType) -> vk::IndexType {
    match index_type {
        IndexType::U16 => vk::IndexType::UINT16,
        IndexType::U32 => vk::IndexType::UINT32,
    }
}

#[derive(Default)]
struct MeshBuffers {
    vertex: Option<VulkanBuffer>,
    index: Option<VulkanBuffer>,
}

/// Vulkan mesh
pub struct VulkanMesh {
    ctx: Option<Arc<GpuContext>>,
    buffers: Mutex<MeshBuffers>,
    layout: VertexLayout,
    index_type: IndexType,
    vertex_count: AtomicU32,
    index_count: AtomicU32,
    destroyed: AtomicBool,
}

impl VulkanMesh {
    pub(crate) fn new(ctx: Arc<GpuContext>, layout: VertexLayout, index_type: IndexType) -> Self {
        Self {
            ctx: Some(ctx),
            buffers: Mutex::new(MeshBuffers::default()),
            layout,
            index_type,
            vertex_count: AtomicU32::new(0),
            index_count: AtomicU32::new(0),
            destroyed: AtomicBool::new(false),
        }
    }

    pub(crate) fn invalid(layout: VertexLayout, index_type: IndexType) -> Self {
        Self {
            ctx: None,
            buffers: Mutex::new(MeshBuffers::default()),
            layout,
            index_type,
            vertex_count: AtomicU32::new(0),
            index_count: AtomicU32::new(0),
            destroyed: AtomicBool::new(true),
        }
    }

    /// Native vertex buffer for command recording
    pub(crate) fn raw_vertex_buffer(&self) -> Option<vk::Buffer> {
        self.buffers
            .lock()
            .ok()
            .and_then(|guard| guard.vertex.as_ref().and_then(|b| b.raw()))
    }

    /// Native index buffer for command recording
    pub(crate) fn raw_index_buffer(&self) -> Option<vk::Buffer> {
        self.buffers
            .lock()
            .ok()
            .and_then(|guard| guard.index.as_ref().and_then(|b| b.raw()))
    }

    fn upload(&self, kind: BufferKind, data: &[u8]) -> bool {
        let Some(ctx) = self.ctx.as_ref() else {
            render_warn!("helios::vulkan", "Upload on invalid mesh ignored");
            return false;
        };
        if self.destroyed.load(Ordering::Acquire) {
            render_warn!("helios::vulkan", "Upload on destroyed mesh ignored");
            return false;
        }
        let Ok(mut guard) = self.buffers.lock() else {
            return false;
        };
        let slot = match kind {
            BufferKind::Vertex => &mut guard.vertex,
            _ => &mut guard.index,
        };
        // Reuse the allocation when the size still fits, otherwise rebuild
        let fits = slot
            .as_ref()
            .map(|b| b.size() == data.len() as u64 && b.is_valid())
            .unwrap_or(false);
        if fits {
            if let Some(buffer) = slot.as_ref() {
                buffer.set_data(0, data);
                return true;
            }
        }
        if let Some(old) = slot.take() {
            // The GPU may still read the old buffer from an in-flight frame
            unsafe { ctx.device.device_wait_idle().ok() };
            old.destroy();
        }
        match VulkanBuffer::create(
            ctx.clone(),
            kind,
            BufferUsage::Static,
            data.len() as u64,
            Some(data),
        ) {
            Ok(buffer) => {
                *slot = Some(buffer);
                true
            }
            Err(e) => {
                render_error!("helios::vulkan", "Mesh upload failed: {}", e);
                false
            }
        }
    }
}

impl Mesh for VulkanMesh {
    fn set_vertex_data(&self, data: &[u8]) {
        if self.upload(BufferKind::Vertex, data) {
            self.vertex_count
                .store(self.layout.vertex_count(data.len()), Ordering::Release);
        }
    }

    fn set_index_data(&self, data: &[u8]) {
        if self.upload(BufferKind::Index, data) {
            self.index_count
                .store(data.len() as u32 / self.index_type.size_bytes(), Ordering::Release);
        }
    }

    fn vertex_count(&self) -> u32 {
        self.vertex_count.load(Ordering::Acquire)
    }

    fn index_count(&self) -> u32 {
        self.index_count.load(Ordering::Acquire)
    }

    fn index_type(&self) -> IndexType {
        self.index_type
    }

    fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    fn is_valid(&self) -> bool {
        !self.destroyed.load(Ordering::Acquire)
    }

    fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Ok(mut guard) = self.buffers.lock() {
            if let Some(buffer) = guard.vertex.take() {
                buffer.destroy();
            }
            if let Some(buffer) = guard.index.take() {
                buffer.destroy();
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanMesh {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "vulkan_mesh_tests.rs"]
mod tests;
