//! GpuContext - shared GPU resources for all Vulkan objects
//!
//! Contains everything a resource needs to talk to the GPU: the device,
//! the allocator, the graphics queue and a command pool for one-shot
//! upload submissions.

use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

use ash::vk;
use gpu_allocator::vulkan::Allocator;

use helios_render::{RenderError, RenderResult};

/// Frames the CPU may record ahead of the GPU
pub(crate) const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Shared GPU context for all Vulkan resources
///
/// Shared via `Arc` by buffers, meshes, shaders and descriptor sets so
/// each resource can free its native objects without holding a reference
/// back into the backend.
///
/// Device and instance destruction is handled by `VulkanBackend::destroy`
/// to keep teardown ordering in one place.
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator, dropped by the backend before the device
    pub allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Graphics queue for command submission
    pub graphics_queue: vk::Queue,

    /// Graphics queue family index
    pub graphics_queue_family: u32,

    /// Reusable command pool for one-shot upload operations
    /// (created with TRANSIENT + RESET_COMMAND_BUFFER flags)
    pub upload_command_pool: Mutex<vk::CommandPool>,

    /// Vulkan instance, destroyed by the backend
    pub(crate) instance: ash::Instance,
}

impl GpuContext {
    pub fn new(
        device: ash::Device,
        allocator: Arc<Mutex<Allocator>>,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
        upload_command_pool: vk::CommandPool,
        instance: ash::Instance,
    ) -> Self {
        Self {
            device,
            allocator: ManuallyDrop::new(allocator),
            graphics_queue,
            graphics_queue_family,
            upload_command_pool: Mutex::new(upload_command_pool),
            instance,
        }
    }

    /// Record and submit a one-shot command buffer, then wait for it
    ///
    /// Used for staged buffer uploads; blocks until the GPU finishes, so
    /// it must never run on the per-frame hot path.
    pub fn one_shot_submit<F>(&self, record: F) -> RenderResult<()>
    where
        F: FnOnce(vk::CommandBuffer),
    {
        unsafe {
            let pool = *self
                .upload_command_pool
                .lock()
                .map_err(|_| RenderError::BackendError("Upload pool lock poisoned".to_string()))?;

            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffer = self
                .device
                .allocate_command_buffers(&alloc_info)
                .map_err(|e| {
                    RenderError::BackendError(format!("One-shot buffer allocation: {:?}", e))
                })?[0];

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            if let Err(e) = self.device.begin_command_buffer(command_buffer, &begin_info) {
                self.device.free_command_buffers(pool, &[command_buffer]);
                return Err(RenderError::BackendError(format!("One-shot begin: {:?}", e)));
            }

            record(command_buffer);

            let result = self
                .device
                .end_command_buffer(command_buffer)
                .map_err(|e| RenderError::BackendError(format!("One-shot end: {:?}", e)))
                .and_then(|_| {
                    let command_buffers = [command_buffer];
                    let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
                    self.device
                        .queue_submit(self.graphics_queue, &[submit_info], vk::Fence::null())
                        .map_err(|e| {
                            RenderError::BackendError(format!("One-shot submit: {:?}", e))
                        })
                })
                .and_then(|_| {
                    self.device.queue_wait_idle(self.graphics_queue).map_err(|e| {
                        RenderError::BackendError(format!("One-shot wait: {:?}", e))
                    })
                });

            self.device.free_command_buffers(pool, &[command_buffer]);
            result
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        // Device and instance destruction is handled by
        // VulkanBackend::destroy; nothing to do here.
    }
}
