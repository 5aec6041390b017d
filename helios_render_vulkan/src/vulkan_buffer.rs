//! Buffer - Vulkan implementation of GpuBuffer and BufferManager

use std::any::Any;
use std::sync::{Arc, Mutex};

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;

use helios_render::backend::{
    BufferKind, BufferManager, BufferUsage, GpuBuffer, IndexType, Mesh, VertexLayout,
};
use helios_render::{render_error, render_warn, RenderError, RenderResult};

use crate::vulkan_context::GpuContext;
use crate::vulkan_mesh::VulkanMesh;

/// Vulkan usage flags for a buffer kind (transfer-dst is always added for
/// staged uploads)
pub(crate) fn vk_buffer_usage(kind: BufferKind) -> vk::BufferUsageFlags {
    let base = match kind {
        BufferKind::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
        BufferKind::Index => vk::BufferUsageFlags::INDEX_BUFFER,
        BufferKind::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
        BufferKind::Storage => vk::BufferUsageFlags::STORAGE_BUFFER,
    };
    base | vk::BufferUsageFlags::TRANSFER_DST
}

/// Memory domain for an allocation strategy
///
/// Static buffers live in device-local memory and are filled through a
/// staging copy; dynamic and stream buffers stay host-visible for direct
/// mapped writes.
pub(crate) fn vk_memory_location(usage: BufferUsage) -> MemoryLocation {
    match usage {
        BufferUsage::Static => MemoryLocation::GpuOnly,
        BufferUsage::Dynamic | BufferUsage::Stream => MemoryLocation::CpuToGpu,
    }
}

struct NativeBuffer {
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
}

/// Vulkan buffer
pub struct VulkanBuffer {
    ctx: Option<Arc<GpuContext>>,
    native: Mutex<Option<NativeBuffer>>,
    kind: BufferKind,
    usage: BufferUsage,
    size: u64,
}

impl VulkanBuffer {
    /// Create a buffer and its allocation, optionally filling it
    pub(crate) fn create(
        ctx: Arc<GpuContext>,
        kind: BufferKind,
        usage: BufferUsage,
        size: u64,
        initial_data: Option<&[u8]>,
    ) -> RenderResult<Self> {
        let create_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(vk_buffer_usage(kind))
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { ctx.device.create_buffer(&create_info, None) }
            .map_err(|e| RenderError::BackendError(format!("Buffer creation: {:?}", e)))?;
        let requirements = unsafe { ctx.device.get_buffer_memory_requirements(buffer) };

        let allocation = ctx
            .allocator
            .lock()
            .map_err(|_| RenderError::BackendError("Allocator lock poisoned".to_string()))?
            .allocate(&AllocationCreateDesc {
                name: "buffer",
                requirements,
                location: vk_memory_location(usage),
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|_| {
                unsafe { ctx.device.destroy_buffer(buffer, None) };
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                render_error!(
                    "helios::vulkan",
                    "Out of GPU memory for buffer (required: {:.2} MB)",
                    size_mb
                );
                RenderError::OutOfMemory
            })?;

        unsafe {
            ctx.device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
        }
        .map_err(|e| RenderError::BackendError(format!("Buffer memory bind: {:?}", e)))?;

        let result = Self {
            ctx: Some(ctx),
            native: Mutex::new(Some(NativeBuffer {
                buffer,
                allocation: Some(allocation),
            })),
            kind,
            usage,
            size,
        };
        if let Some(data) = initial_data {
            result.write(0, data)?;
        }
        Ok(result)
    }

    /// Handle that is invalid from birth
    pub(crate) fn invalid(kind: BufferKind, usage: BufferUsage, size: u64) -> Self {
        Self {
            ctx: None,
            native: Mutex::new(None),
            kind,
            usage,
            size,
        }
    }

    /// Native buffer object, when still alive
    pub(crate) fn raw(&self) -> Option<vk::Buffer> {
        self.native
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|n| n.buffer))
    }

    fn write(&self, offset: u64, data: &[u8]) -> RenderResult<()> {
        let ctx = self
            .ctx
            .as_ref()
            .ok_or_else(|| RenderError::InvalidResource("Buffer has no context".to_string()))?;
        let guard = self
            .native
            .lock()
            .map_err(|_| RenderError::BackendError("Buffer lock poisoned".to_string()))?;
        let native = guard
            .as_ref()
            .ok_or_else(|| RenderError::InvalidResource("Buffer destroyed".to_string()))?;

        match self.usage {
            BufferUsage::Static => self.staged_write(ctx, native.buffer, offset, data),
            BufferUsage::Dynamic | BufferUsage::Stream => {
                let allocation = native.allocation.as_ref().ok_or_else(|| {
                    RenderError::InvalidResource("Buffer has no allocation".to_string())
                })?;
                let mapped = allocation.mapped_ptr().ok_or_else(|| {
                    RenderError::BackendError("Buffer is not CPU-accessible".to_string())
                })?;
                unsafe {
                    std::ptr::copy_nonoverlapping(
                        data.as_ptr(),
                        (mapped.as_ptr() as *mut u8).add(offset as usize),
                        data.len(),
                    );
                }
                Ok(())
            }
        }
    }

    /// Upload through a transient host-visible staging buffer
    fn staged_write(
        &self,
        ctx: &Arc<GpuContext>,
        dst: vk::Buffer,
        offset: u64,
        data: &[u8],
    ) -> RenderResult<()> {
        let staging_info = vk::BufferCreateInfo::default()
            .size(data.len() as u64)
            .usage(vk::BufferUsageFlags::TRANSFER_SRC)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let staging = unsafe { ctx.device.create_buffer(&staging_info, None) }
            .map_err(|e| RenderError::BackendError(format!("Staging buffer: {:?}", e)))?;
        let requirements = unsafe { ctx.device.get_buffer_memory_requirements(staging) };

        let allocation = ctx
            .allocator
            .lock()
            .map_err(|_| RenderError::BackendError("Allocator lock poisoned".to_string()))?
            .allocate(&AllocationCreateDesc {
                name: "staging_buffer",
                requirements,
                location: MemoryLocation::CpuToGpu,
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|_| {
                unsafe { ctx.device.destroy_buffer(staging, None) };
                RenderError::OutOfMemory
            })?;

        let result = unsafe {
            ctx.device
                .bind_buffer_memory(staging, allocation.memory(), allocation.offset())
        }
        .map_err(|e| RenderError::BackendError(format!("Staging bind: {:?}", e)))
        .and_then(|_| {
            let mapped = allocation.mapped_ptr().ok_or_else(|| {
                RenderError::BackendError("Staging buffer not mapped".to_string())
            })?;
            unsafe {
                std::ptr::copy_nonoverlapping(
                    data.as_ptr(),
                    mapped.as_ptr() as *mut u8,
                    data.len(),
                );
            }
            ctx.one_shot_submit(|cmd| {
                let region = vk::BufferCopy {
                    src_offset: 0,
                    dst_offset: offset,
                    size: data.len() as u64,
                };
                unsafe { ctx.device.cmd_copy_buffer(cmd, staging, dst, &[region]) };
            })
        });

        if let Ok(mut allocator) = ctx.allocator.lock() {
            allocator.free(allocation).ok();
        }
        unsafe { ctx.device.destroy_buffer(staging, None) };
        result
    }

    fn release(&self) {
        let Some(ctx) = self.ctx.as_ref() else {
            return;
        };
        let Ok(mut guard) = self.native.lock() else {
            return;
        };
        if let Some(mut native) = guard.take() {
            if let Some(allocation) = native.allocation.take() {
                if let Ok(mut allocator) = ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
            unsafe { ctx.device.destroy_buffer(native.buffer, None) };
        }
    }
}

impl GpuBuffer for VulkanBuffer {
    fn set_data(&self, offset: u64, data: &[u8]) {
        if offset + data.len() as u64 > self.size {
            render_error!(
                "helios::vulkan",
                "set_data out of bounds: offset {} + len {} > size {}",
                offset,
                data.len(),
                self.size
            );
            return;
        }
        if let Err(e) = self.write(offset, data) {
            render_warn!("helios::vulkan", "set_data failed: {}", e);
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
        self.native
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    fn destroy(&self) {
        self.release();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

/// Vulkan buffer factory
pub struct VulkanBufferManager {
    ctx: Option<Arc<GpuContext>>,
}

impl VulkanBufferManager {
    pub(crate) fn new() -> Self {
        Self { ctx: None }
    }

    pub(crate) fn attach(&mut self, ctx: Arc<GpuContext>) {
        self.ctx = Some(ctx);
    }

    pub(crate) fn detach(&mut self) {
        self.ctx = None;
    }
}

impl BufferManager for VulkanBufferManager {
    fn create_buffer(
        &self,
        kind: BufferKind,
        usage: BufferUsage,
        size: u64,
        initial_data: Option<&[u8]>,
    ) -> Arc<dyn GpuBuffer> {
        let Some(ctx) = self.ctx.as_ref() else {
            render_error!("helios::vulkan", "create_buffer before initialization");
            return Arc::new(VulkanBuffer::invalid(kind, usage, size));
        };
        match VulkanBuffer::create(ctx.clone(), kind, usage, size, initial_data) {
            Ok(buffer) => Arc::new(buffer),
            Err(e) => {
                render_error!("helios::vulkan", "Buffer creation failed: {}", e);
                Arc::new(VulkanBuffer::invalid(kind, usage, size))
            }
        }
    }

    fn create_mesh(&self, layout: &VertexLayout, index_type: IndexType) -> Arc<dyn Mesh> {
        let Some(ctx) = self.ctx.as_ref() else {
            render_error!("helios::vulkan", "create_mesh before initialization");
            return Arc::new(VulkanMesh::invalid(layout.clone(), index_type));
        };
        Arc::new(VulkanMesh::new(ctx.clone(), layout.clone(), index_type))
    }

    fn destroy_buffer(&self, buffer: &Arc<dyn GpuBuffer>) {
        let Some(vk_buffer) = buffer.as_any().downcast_ref::<VulkanBuffer>() else {
            render_error!("helios::vulkan", "destroy_buffer: handle from another backend");
            return;
        };
        // The GPU may still reference the buffer in an in-flight frame
        if let Some(ctx) = self.ctx.as_ref() {
            unsafe { ctx.device.device_wait_idle().ok() };
        }
        vk_buffer.destroy();
    }
}

#[cfg(test)]
#[path = "vulkan_buffer_tests.rs"]
mod tests;
