//! Swapchain - presentation, depth target, framebuffers and frame sync
//!
//! Owns everything tied to the window surface: the swapchain images and
//! views, the shared depth attachment, the render pass frames are recorded
//! in, one framebuffer per image and the acquire/present semaphores.
//! Recreation on resize rebuilds all of it under a device-idle wait.

use std::sync::Arc;

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;

use helios_render::{render_debug, RenderError, RenderResult};

use crate::vulkan_context::{GpuContext, MAX_FRAMES_IN_FLIGHT};
use crate::vulkan_shader::VulkanShaderManager;

const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

struct DepthTarget {
    image: vk::Image,
    view: vk::ImageView,
    allocation: Option<Allocation>,
}

/// Result of an acquire attempt
pub(crate) enum AcquireResult {
    /// Image index to render into
    Acquired(u32),
    /// Swapchain no longer matches the surface; recreate and retry
    OutOfDate,
}

/// Vulkan swapchain
pub struct VulkanSwapchain {
    ctx: Arc<GpuContext>,
    physical_device: vk::PhysicalDevice,
    present_queue: vk::Queue,

    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,

    swapchain_loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::Format,
    extent: vk::Extent2D,

    depth: Option<DepthTarget>,
    render_pass: vk::RenderPass,
    framebuffers: Vec<vk::Framebuffer>,

    /// One per frame in flight, waited by the acquire
    image_available_semaphores: Vec<vk::Semaphore>,
    /// One per swapchain image, signaled by the submit
    render_finished_semaphores: Vec<vk::Semaphore>,
}

impl VulkanSwapchain {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        physical_device: vk::PhysicalDevice,
        present_queue: vk::Queue,
        surface: vk::SurfaceKHR,
        surface_loader: ash::khr::surface::Instance,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        let swapchain_loader = ash::khr::swapchain::Device::new(&ctx.instance, &ctx.device);
        let mut result = Self {
            ctx,
            physical_device,
            present_queue,
            surface,
            surface_loader,
            swapchain_loader,
            swapchain: vk::SwapchainKHR::null(),
            images: Vec::new(),
            image_views: Vec::new(),
            format: vk::Format::UNDEFINED,
            extent: vk::Extent2D::default(),
            depth: None,
            render_pass: vk::RenderPass::null(),
            framebuffers: Vec::new(),
            image_available_semaphores: Vec::new(),
            render_finished_semaphores: Vec::new(),
        };
        result.build(width, height)?;

        let semaphore_info = vk::SemaphoreCreateInfo::default();
        for _ in 0..MAX_FRAMES_IN_FLIGHT {
            result.image_available_semaphores.push(
                unsafe { result.ctx.device.create_semaphore(&semaphore_info, None) }
                    .map_err(|e| RenderError::BackendError(format!("Semaphore: {:?}", e)))?,
            );
        }
        Ok(result)
    }

    /// Create swapchain, views, depth target, render pass and framebuffers
    fn build(&mut self, width: u32, height: u32) -> RenderResult<()> {
        let device = &self.ctx.device;
        unsafe {
            let capabilities = self
                .surface_loader
                .get_physical_device_surface_capabilities(self.physical_device, self.surface)
                .map_err(|e| {
                    RenderError::InitializationFailed(format!("Surface capabilities: {:?}", e))
                })?;
            let formats = self
                .surface_loader
                .get_physical_device_surface_formats(self.physical_device, self.surface)
                .map_err(|e| {
                    RenderError::InitializationFailed(format!("Surface formats: {:?}", e))
                })?;
            let surface_format = formats
                .iter()
                .find(|f| {
                    f.format == vk::Format::B8G8R8A8_SRGB || f.format == vk::Format::R8G8B8A8_SRGB
                })
                .or_else(|| formats.first())
                .copied()
                .ok_or_else(|| {
                    RenderError::InitializationFailed("No surface formats".to_string())
                })?;

            let extent = if capabilities.current_extent.width != u32::MAX {
                capabilities.current_extent
            } else {
                vk::Extent2D {
                    width: width.clamp(
                        capabilities.min_image_extent.width,
                        capabilities.max_image_extent.width,
                    ),
                    height: height.clamp(
                        capabilities.min_image_extent.height,
                        capabilities.max_image_extent.height,
                    ),
                }
            };

            let mut image_count = capabilities.min_image_count + 1;
            if capabilities.max_image_count > 0 {
                image_count = image_count.min(capabilities.max_image_count);
            }

            let old_swapchain = self.swapchain;
            let create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(self.surface)
                .min_image_count(image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(vk::PresentModeKHR::FIFO)
                .clipped(true)
                .old_swapchain(old_swapchain);

            let swapchain = self
                .swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| {
                    RenderError::InitializationFailed(format!("Swapchain creation: {:?}", e))
                })?;
            if old_swapchain != vk::SwapchainKHR::null() {
                self.swapchain_loader.destroy_swapchain(old_swapchain, None);
            }
            self.swapchain = swapchain;
            self.format = surface_format.format;
            self.extent = extent;

            self.images = self
                .swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| {
                    RenderError::InitializationFailed(format!("Swapchain images: {:?}", e))
                })?;

            for &image in &self.images {
                let view_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(self.format)
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });
                self.image_views.push(
                    device.create_image_view(&view_info, None).map_err(|e| {
                        RenderError::InitializationFailed(format!("Image view: {:?}", e))
                    })?,
                );
            }

            self.depth = Some(self.create_depth_target(extent)?);
            self.render_pass =
                VulkanShaderManager::create_compatible_render_pass(device, self.format)?;

            let depth_view = self.depth.as_ref().map(|d| d.view).ok_or_else(|| {
                RenderError::InitializationFailed("Missing depth target".to_string())
            })?;
            for &view in &self.image_views {
                let attachments = [view, depth_view];
                let framebuffer_info = vk::FramebufferCreateInfo::default()
                    .render_pass(self.render_pass)
                    .attachments(&attachments)
                    .width(extent.width)
                    .height(extent.height)
                    .layers(1);
                self.framebuffers.push(
                    device
                        .create_framebuffer(&framebuffer_info, None)
                        .map_err(|e| {
                            RenderError::InitializationFailed(format!("Framebuffer: {:?}", e))
                        })?,
                );
            }

            // One render-finished semaphore per image; recreation may
            // change the image count, so these rebuild with the chain
            let semaphore_info = vk::SemaphoreCreateInfo::default();
            for _ in 0..self.images.len() {
                self.render_finished_semaphores.push(
                    device.create_semaphore(&semaphore_info, None).map_err(|e| {
                        RenderError::BackendError(format!("Semaphore: {:?}", e))
                    })?,
                );
            }
        }
        render_debug!(
            "helios::vulkan",
            "Swapchain built: {}x{}, {} images",
            self.extent.width,
            self.extent.height,
            self.images.len()
        );
        Ok(())
    }

    fn create_depth_target(&self, extent: vk::Extent2D) -> RenderResult<DepthTarget> {
        let device = &self.ctx.device;
        unsafe {
            let image_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(DEPTH_FORMAT)
                .extent(vk::Extent3D {
                    width: extent.width,
                    height: extent.height,
                    depth: 1,
                })
                .mip_levels(1)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);
            let image = device
                .create_image(&image_info, None)
                .map_err(|e| RenderError::BackendError(format!("Depth image: {:?}", e)))?;
            let requirements = device.get_image_memory_requirements(image);

            let allocation = self
                .ctx
                .allocator
                .lock()
                .map_err(|_| RenderError::BackendError("Allocator lock poisoned".to_string()))?
                .allocate(&AllocationCreateDesc {
                    name: "depth_target",
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_| {
                    device.destroy_image(image, None);
                    RenderError::OutOfMemory
                })?;
            device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| RenderError::BackendError(format!("Depth bind: {:?}", e)))?;

            let view_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(DEPTH_FORMAT)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::DEPTH,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });
            let view = device
                .create_image_view(&view_info, None)
                .map_err(|e| RenderError::BackendError(format!("Depth view: {:?}", e)))?;

            Ok(DepthTarget {
                image,
                view,
                allocation: Some(allocation),
            })
        }
    }

    fn destroy_framebuffer_chain(&mut self) {
        let device = &self.ctx.device;
        unsafe {
            for semaphore in self.render_finished_semaphores.drain(..) {
                device.destroy_semaphore(semaphore, None);
            }
            for framebuffer in self.framebuffers.drain(..) {
                device.destroy_framebuffer(framebuffer, None);
            }
            if self.render_pass != vk::RenderPass::null() {
                device.destroy_render_pass(self.render_pass, None);
                self.render_pass = vk::RenderPass::null();
            }
            if let Some(mut depth) = self.depth.take() {
                device.destroy_image_view(depth.view, None);
                device.destroy_image(depth.image, None);
                if let Some(allocation) = depth.allocation.take() {
                    if let Ok(mut allocator) = self.ctx.allocator.lock() {
                        allocator.free(allocation).ok();
                    }
                }
            }
            for view in self.image_views.drain(..) {
                device.destroy_image_view(view, None);
            }
        }
    }

    /// Recreate the swapchain and everything derived from it
    ///
    /// Waits for the device to go idle first; in-flight frames must not
    /// reference the old framebuffers.
    pub(crate) fn recreate(&mut self, width: u32, height: u32) -> RenderResult<()> {
        unsafe {
            self.ctx.device.device_wait_idle().map_err(|e| {
                RenderError::BackendError(format!("Wait before swapchain recreate: {:?}", e))
            })?;
        }
        self.destroy_framebuffer_chain();
        self.build(width, height)
    }

    /// Acquire the next image, waiting on the frame's acquire semaphore
    pub(crate) fn acquire_next_image(&mut self, frame_index: u32) -> RenderResult<AcquireResult> {
        unsafe {
            match self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                self.image_available_semaphores[frame_index as usize % MAX_FRAMES_IN_FLIGHT],
                vk::Fence::null(),
            ) {
                Ok((image_index, _suboptimal)) => Ok(AcquireResult::Acquired(image_index)),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireResult::OutOfDate),
                Err(e) => Err(RenderError::BackendError(format!(
                    "Swapchain acquire: {:?}",
                    e
                ))),
            }
        }
    }

    /// Present an image; returns true when the swapchain needs recreation
    pub(crate) fn present(&mut self, image_index: u32) -> RenderResult<bool> {
        unsafe {
            let swapchains = [self.swapchain];
            let image_indices = [image_index];
            let wait_semaphores = [self.render_finished_semaphores[image_index as usize]];
            let present_info = vk::PresentInfoKHR::default()
                .wait_semaphores(&wait_semaphores)
                .swapchains(&swapchains)
                .image_indices(&image_indices);
            match self
                .swapchain_loader
                .queue_present(self.present_queue, &present_info)
            {
                Ok(suboptimal) => Ok(suboptimal),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(true),
                Err(e) => Err(RenderError::BackendError(format!(
                    "Swapchain present: {:?}",
                    e
                ))),
            }
        }
    }

    pub(crate) fn sync_info(&self, frame_index: u32, image_index: u32) -> (vk::Semaphore, vk::Semaphore) {
        (
            self.image_available_semaphores[frame_index as usize % MAX_FRAMES_IN_FLIGHT],
            self.render_finished_semaphores[image_index as usize],
        )
    }

    pub(crate) fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    pub(crate) fn framebuffer(&self, image_index: u32) -> Option<vk::Framebuffer> {
        self.framebuffers.get(image_index as usize).copied()
    }

    pub(crate) fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub(crate) fn format(&self) -> vk::Format {
        self.format
    }
}

impl Drop for VulkanSwapchain {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
            for &semaphore in &self.image_available_semaphores {
                self.ctx.device.destroy_semaphore(semaphore, None);
            }
        }
        self.destroy_framebuffer_chain();
        unsafe {
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}
