//! VulkanBackend - explicit implementation of the RenderBackend trait
//!
//! Frames-in-flight model: the CPU records frame N+1 while the GPU executes
//! frame N, synchronized per frame slot by a fence and per image by the
//! acquire/present semaphore pair. Resizes are deferred behind a pending
//! flag and consumed at the next frame boundary.

use std::ffi::CStr;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::Window;

use helios_render::backend::{
    BackendCapabilities, BufferManager, DrawCommand, Rect2D, RenderBackend, RenderCommandBuffer,
    RenderCommandQueue, RenderStats, ShaderCompiler, ShaderManager, UniformManager, Viewport,
};
use helios_render::{render_error, render_info, render_warn, RenderError, RenderResult};

use crate::vulkan_buffer::VulkanBufferManager;
use crate::vulkan_command::VulkanCommandQueue;
use crate::vulkan_context::{GpuContext, MAX_FRAMES_IN_FLIGHT};
use crate::vulkan_descriptor::VulkanUniformManager;
use crate::vulkan_shader::VulkanShaderManager;
use crate::vulkan_swapchain::{AcquireResult, VulkanSwapchain};

const CLEAR_COLOR: [f32; 4] = [0.01, 0.01, 0.02, 1.0];

#[cfg(feature = "vulkan-validation")]
const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Everything created during device setup, before the swapchain exists
struct DeviceBundle {
    entry: ash::Entry,
    instance: ash::Instance,
    #[cfg(feature = "vulkan-validation")]
    debug_utils: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
    physical_device: vk::PhysicalDevice,
    device: ash::Device,
    graphics_queue: vk::Queue,
    graphics_family: u32,
    present_queue: vk::Queue,
}

/// Vulkan render backend
pub struct VulkanBackend {
    entry: Option<ash::Entry>,
    instance: Option<ash::Instance>,
    device: Option<ash::Device>,
    #[cfg(feature = "vulkan-validation")]
    debug_utils: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    ctx: Option<Arc<GpuContext>>,
    swapchain: Option<VulkanSwapchain>,

    buffers: VulkanBufferManager,
    shaders: VulkanShaderManager,
    uniforms: VulkanUniformManager,
    queue: VulkanCommandQueue,
    draw_queue: Vec<DrawCommand>,

    /// One fence per frame slot, signaled when that slot's submit retires
    in_flight_fences: Vec<vk::Fence>,
    current_frame: u32,
    /// Swapchain image acquired for the frame being recorded
    current_image: Option<u32>,

    capabilities: BackendCapabilities,
    width: u32,
    height: u32,
    resize_pending: bool,
    in_frame: bool,
}

impl VulkanBackend {
    pub fn new() -> Self {
        Self {
            entry: None,
            instance: None,
            device: None,
            #[cfg(feature = "vulkan-validation")]
            debug_utils: None,
            ctx: None,
            swapchain: None,
            buffers: VulkanBufferManager::new(),
            shaders: VulkanShaderManager::new(),
            uniforms: VulkanUniformManager::new(),
            queue: VulkanCommandQueue::new(),
            draw_queue: Vec::new(),
            in_flight_fences: Vec::new(),
            current_frame: 0,
            current_image: None,
            capabilities: BackendCapabilities::default(),
            width: 0,
            height: 0,
            resize_pending: false,
            in_frame: false,
        }
    }

    /// Install the compiler used by `create_from_source`
    ///
    /// Without one, source compilation yields invalid handles; binary
    /// SPIR-V creation works either way.
    pub fn set_shader_compiler(&mut self, compiler: Arc<dyn ShaderCompiler>) {
        self.shaders.set_compiler(compiler);
    }

    fn create_device(window: &Window) -> RenderResult<DeviceBundle> {
        let entry = unsafe { ash::Entry::load() }
            .map_err(|e| RenderError::InitializationFailed(format!("Vulkan loader: {}", e)))?;

        let display_handle = window
            .display_handle()
            .map_err(|e| RenderError::InitializationFailed(format!("Display handle: {}", e)))?;
        let window_handle = window
            .window_handle()
            .map_err(|e| RenderError::InitializationFailed(format!("Window handle: {}", e)))?;

        let surface_extensions =
            ash_window::enumerate_required_extensions(display_handle.as_raw()).map_err(|e| {
                RenderError::InitializationFailed(format!("Surface extensions: {:?}", e))
            })?;
        #[allow(unused_mut)]
        let mut instance_extensions = surface_extensions.to_vec();
        #[cfg(feature = "vulkan-validation")]
        instance_extensions.push(ash::ext::debug_utils::NAME.as_ptr());

        #[allow(unused_mut)]
        let mut layers: Vec<*const std::os::raw::c_char> = Vec::new();
        #[cfg(feature = "vulkan-validation")]
        layers.push(VALIDATION_LAYER.as_ptr());

        let app_info = vk::ApplicationInfo::default()
            .application_name(c"helios")
            .engine_name(c"helios")
            .api_version(vk::API_VERSION_1_2);
        let instance_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&instance_extensions)
            .enabled_layer_names(&layers);
        let instance = unsafe { entry.create_instance(&instance_info, None) }
            .map_err(|e| RenderError::InitializationFailed(format!("Instance: {:?}", e)))?;

        #[cfg(feature = "vulkan-validation")]
        let debug_utils = {
            let loader = ash::ext::debug_utils::Instance::new(&entry, &instance);
            let messenger_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                .message_severity(
                    vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                        | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                        | vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
                )
                .message_type(
                    vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                        | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                        | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                )
                .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));
            match unsafe { loader.create_debug_utils_messenger(&messenger_info, None) } {
                Ok(messenger) => Some((loader, messenger)),
                Err(e) => {
                    render_warn!("helios::vulkan", "Debug messenger unavailable: {:?}", e);
                    None
                }
            }
        };

        let surface = unsafe {
            ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
        }
        .map_err(|e| RenderError::InitializationFailed(format!("Surface: {:?}", e)))?;
        let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

        let (physical_device, graphics_family, present_family) =
            Self::pick_physical_device(&instance, &surface_loader, surface)?;

        let mut queue_infos = Vec::new();
        let priorities = [1.0f32];
        queue_infos.push(
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family)
                .queue_priorities(&priorities),
        );
        if present_family != graphics_family {
            queue_infos.push(
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(present_family)
                    .queue_priorities(&priorities),
            );
        }

        let device_extensions = [ash::khr::swapchain::NAME.as_ptr()];
        let features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(true);
        let device_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&device_extensions)
            .enabled_features(&features);
        let device = unsafe { instance.create_device(physical_device, &device_info, None) }
            .map_err(|e| RenderError::InitializationFailed(format!("Device: {:?}", e)))?;

        let graphics_queue = unsafe { device.get_device_queue(graphics_family, 0) };
        let present_queue = unsafe { device.get_device_queue(present_family, 0) };

        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let device_name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) };
        render_info!(
            "helios::vulkan",
            "Using device: {}",
            device_name.to_string_lossy()
        );

        Ok(DeviceBundle {
            entry,
            instance,
            #[cfg(feature = "vulkan-validation")]
            debug_utils,
            surface,
            surface_loader,
            physical_device,
            device,
            graphics_queue,
            graphics_family,
            present_queue,
        })
    }

    /// Pick a device with graphics and present support, preferring discrete
    fn pick_physical_device(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
    ) -> RenderResult<(vk::PhysicalDevice, u32, u32)> {
        let devices = unsafe { instance.enumerate_physical_devices() }
            .map_err(|e| RenderError::InitializationFailed(format!("Device enumeration: {:?}", e)))?;

        let mut best: Option<(vk::PhysicalDevice, u32, u32, bool)> = None;
        for device in devices {
            let families =
                unsafe { instance.get_physical_device_queue_family_properties(device) };
            let mut graphics = None;
            let mut present = None;
            for (index, family) in families.iter().enumerate() {
                let index = index as u32;
                if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) && graphics.is_none() {
                    graphics = Some(index);
                }
                let supports_present = unsafe {
                    surface_loader.get_physical_device_surface_support(device, index, surface)
                }
                .unwrap_or(false);
                if supports_present && present.is_none() {
                    present = Some(index);
                }
            }
            let (Some(graphics), Some(present)) = (graphics, present) else {
                continue;
            };
            let properties = unsafe { instance.get_physical_device_properties(device) };
            let discrete = properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU;
            match best {
                Some((_, _, _, true)) => {}
                _ if discrete || best.is_none() => {
                    best = Some((device, graphics, present, discrete));
                }
                _ => {}
            }
        }
        best.map(|(device, graphics, present, _)| (device, graphics, present))
            .ok_or_else(|| {
                RenderError::InitializationFailed("No suitable Vulkan device".to_string())
            })
    }

    fn query_capabilities(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> BackendCapabilities {
        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let features = unsafe { instance.get_physical_device_features(physical_device) };
        BackendCapabilities {
            compute_shaders: true,
            multi_draw_indirect: features.multi_draw_indirect == vk::TRUE,
            bindless_textures: false,
            max_uniform_buffer_size: properties.limits.max_uniform_buffer_range as u64,
            max_texture_size: properties.limits.max_image_dimension2_d,
            max_frames_in_flight: MAX_FRAMES_IN_FLIGHT as u32,
        }
    }

    fn try_initialize(&mut self, window: &Window, width: u32, height: u32) -> RenderResult<()> {
        #[cfg(feature = "vulkan-validation")]
        crate::debug::reset_validation_stats();
        let bundle = Self::create_device(window)?;
        self.capabilities = Self::query_capabilities(&bundle.instance, bundle.physical_device);

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: bundle.instance.clone(),
            device: bundle.device.clone(),
            physical_device: bundle.physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })
        .map_err(|e| RenderError::InitializationFailed(format!("Allocator: {:?}", e)))?;

        let pool_info = vk::CommandPoolCreateInfo::default()
            .flags(
                vk::CommandPoolCreateFlags::TRANSIENT
                    | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            )
            .queue_family_index(bundle.graphics_family);
        let upload_pool = unsafe { bundle.device.create_command_pool(&pool_info, None) }
            .map_err(|e| RenderError::InitializationFailed(format!("Upload pool: {:?}", e)))?;

        let ctx = Arc::new(GpuContext::new(
            bundle.device.clone(),
            Arc::new(Mutex::new(allocator)),
            bundle.graphics_queue,
            bundle.graphics_family,
            upload_pool,
            bundle.instance.clone(),
        ));

        let swapchain = VulkanSwapchain::new(
            Arc::clone(&ctx),
            bundle.physical_device,
            bundle.present_queue,
            bundle.surface,
            bundle.surface_loader,
            width,
            height,
        )?;

        let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
        let mut fences = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for _ in 0..MAX_FRAMES_IN_FLIGHT {
            let fence = unsafe { bundle.device.create_fence(&fence_info, None) }
                .map_err(|e| RenderError::InitializationFailed(format!("Fence: {:?}", e)))?;
            fences.push(fence);
        }
        self.in_flight_fences = fences;

        self.queue.attach(Arc::clone(&ctx))?;
        self.buffers.attach(Arc::clone(&ctx));
        self.shaders.attach(Arc::clone(&ctx), swapchain.format());
        self.uniforms.attach(Arc::clone(&ctx));

        self.entry = Some(bundle.entry);
        self.instance = Some(bundle.instance);
        self.device = Some(bundle.device);
        #[cfg(feature = "vulkan-validation")]
        {
            self.debug_utils = bundle.debug_utils;
        }
        self.ctx = Some(ctx);
        self.swapchain = Some(swapchain);
        self.width = width;
        self.height = height;
        self.current_frame = 0;
        self.resize_pending = false;
        Ok(())
    }

    /// Submit the recorded frame and present the acquired image
    fn submit_and_present(&mut self, image_index: u32) {
        let (Some(ctx), Some(swapchain)) = (self.ctx.as_ref(), self.swapchain.as_mut()) else {
            return;
        };
        let (image_available, render_finished) =
            swapchain.sync_info(self.current_frame, image_index);
        let command_buffer = self.queue.frame_buffer().raw();

        let wait_semaphores = [image_available];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [render_finished];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);
        let fence = self.in_flight_fences[self.current_frame as usize];
        if let Err(e) = unsafe {
            ctx.device
                .queue_submit(ctx.graphics_queue, &[submit_info], fence)
        } {
            render_error!("helios::vulkan", "Frame submit failed: {:?}", e);
            return;
        }

        match swapchain.present(image_index) {
            Ok(needs_recreate) => {
                if needs_recreate {
                    self.resize_pending = true;
                }
            }
            Err(e) => render_error!("helios::vulkan", "Present failed: {}", e),
        }
    }
}

impl Default for VulkanBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for VulkanBackend {
    fn initialize(&mut self, window: Option<&Window>, width: u32, height: u32) {
        if self.ctx.is_some() {
            render_warn!("helios::vulkan", "initialize called twice, ignoring");
            return;
        }
        let Some(window) = window else {
            render_error!("helios::vulkan", "initialize: no window handle supplied");
            return;
        };
        if let Err(e) = self.try_initialize(window, width, height) {
            render_error!("helios::vulkan", "Vulkan initialization failed: {}", e);
            return;
        }
        render_info!(
            "helios::vulkan",
            "Vulkan backend initialized ({}x{}, {} frames in flight)",
            width,
            height,
            MAX_FRAMES_IN_FLIGHT
        );
    }

    fn is_initialized(&self) -> bool {
        self.ctx.is_some()
    }

    fn destroy(&mut self) {
        let Some(device) = self.device.take() else {
            return;
        };
        unsafe { device.device_wait_idle().ok() };
        self.draw_queue.clear();
        self.in_frame = false;
        self.current_image = None;

        // Teardown in reverse construction order
        self.queue.detach();
        self.uniforms.detach();
        self.shaders.detach();
        self.buffers.detach();
        self.swapchain = None;
        for fence in self.in_flight_fences.drain(..) {
            unsafe { device.destroy_fence(fence, None) };
        }

        // The allocator must be dropped before the device; both require
        // the context Arc to be unshared. Resources still held by the
        // application keep it alive, in which case we leak rather than
        // destroy a device they reference.
        match self.ctx.take().and_then(Arc::into_inner) {
            Some(mut ctx) => unsafe {
                if let Ok(pool) = ctx.upload_command_pool.lock() {
                    device.destroy_command_pool(*pool, None);
                }
                drop(ManuallyDrop::take(&mut ctx.allocator));
                device.destroy_device(None);
            },
            None => {
                render_warn!(
                    "helios::vulkan",
                    "GPU resources still alive at destroy, skipping device teardown"
                );
                self.instance = None;
                self.entry = None;
                return;
            }
        }

        #[cfg(feature = "vulkan-validation")]
        if let Some((loader, messenger)) = self.debug_utils.take() {
            unsafe { loader.destroy_debug_utils_messenger(messenger, None) };
        }
        if let Some(instance) = self.instance.take() {
            unsafe { instance.destroy_instance(None) };
        }
        self.entry = None;
        render_info!("helios::vulkan", "Vulkan backend destroyed");
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        // Consumed at the next frame boundary; zero sizes wait for a
        // real extent
        self.resize_pending = true;
    }

    fn begin_frame(&mut self) -> bool {
        let Some(ctx) = self.ctx.as_ref() else {
            return false;
        };
        if self.width == 0 || self.height == 0 {
            return false;
        }
        if self.resize_pending {
            let Some(swapchain) = self.swapchain.as_mut() else {
                return false;
            };
            if let Err(e) = swapchain.recreate(self.width, self.height) {
                render_error!("helios::vulkan", "Swapchain recreation failed: {}", e);
                return false;
            }
            self.resize_pending = false;
        }

        let fence = self.in_flight_fences[self.current_frame as usize];
        unsafe {
            if let Err(e) = ctx.device.wait_for_fences(&[fence], true, u64::MAX) {
                render_error!("helios::vulkan", "Frame fence wait failed: {:?}", e);
                return false;
            }
        }

        let Some(swapchain) = self.swapchain.as_mut() else {
            return false;
        };
        let image_index = match swapchain.acquire_next_image(self.current_frame) {
            Ok(AcquireResult::Acquired(index)) => index,
            Ok(AcquireResult::OutOfDate) => {
                self.resize_pending = true;
                return false;
            }
            Err(e) => {
                render_error!("helios::vulkan", "Image acquire failed: {}", e);
                return false;
            }
        };
        // Reset only after a successful acquire so a skipped frame never
        // leaves the fence unsignaled
        let Some(ctx) = self.ctx.as_ref() else {
            return false;
        };
        unsafe {
            if let Err(e) = ctx.device.reset_fences(&[fence]) {
                render_error!("helios::vulkan", "Frame fence reset failed: {:?}", e);
                return false;
            }
        }

        let extent = self
            .swapchain
            .as_ref()
            .map(VulkanSwapchain::extent)
            .unwrap_or_default();
        let render_pass = self
            .swapchain
            .as_ref()
            .map(VulkanSwapchain::render_pass)
            .unwrap_or_else(vk::RenderPass::null);
        let Some(framebuffer) = self
            .swapchain
            .as_ref()
            .and_then(|s| s.framebuffer(image_index))
        else {
            render_error!("helios::vulkan", "No framebuffer for acquired image");
            return false;
        };

        self.queue.set_frame(self.current_frame);
        let buffer = self.queue.frame_buffer();
        buffer.stats = RenderStats::default();
        buffer.begin();
        if !buffer.is_recording() {
            return false;
        }
        buffer.begin_render_pass(render_pass, framebuffer, extent, CLEAR_COLOR);
        buffer.set_viewport(Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        });
        buffer.set_scissor(Rect2D {
            x: 0,
            y: 0,
            width: extent.width,
            height: extent.height,
        });

        self.current_image = Some(image_index);
        self.in_frame = true;
        true
    }

    fn end_frame(&mut self) {
        if !self.in_frame {
            return;
        }
        self.in_frame = false;
        let Some(image_index) = self.current_image.take() else {
            return;
        };
        let buffer = self.queue.frame_buffer();
        buffer.end_render_pass();
        buffer.end();

        self.submit_and_present(image_index);
        self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT as u32;
    }

    fn submit_draw_command(&mut self, command: DrawCommand) {
        self.draw_queue.push(command);
    }

    fn execute_draw_commands(&mut self) {
        let commands: Vec<DrawCommand> = self.draw_queue.drain(..).collect();
        let buffer = self.queue.frame_buffer();
        for command in commands {
            buffer.bind_pipeline(&command.shader);
            buffer.bind_uniform_set(&command.uniform_set, command.frame_index);
            buffer.draw_mesh(&command.mesh);
        }
    }

    fn wait_idle(&self) {
        if let Some(ctx) = self.ctx.as_ref() {
            unsafe { ctx.device.device_wait_idle().ok() };
        }
    }

    fn current_frame(&self) -> u32 {
        self.current_frame
    }

    fn max_frames_in_flight(&self) -> u32 {
        MAX_FRAMES_IN_FLIGHT as u32
    }

    fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    fn stats(&self) -> RenderStats {
        self.queue.frame_stats()
    }

    fn buffer_manager(&self) -> &dyn BufferManager {
        &self.buffers
    }

    fn shader_manager(&self) -> &dyn ShaderManager {
        &self.shaders
    }

    fn uniform_manager(&self) -> &dyn UniformManager {
        &self.uniforms
    }

    fn command_queue(&mut self) -> &mut dyn RenderCommandQueue {
        &mut self.queue
    }
}

impl Drop for VulkanBackend {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "vulkan_backend_tests.rs"]
mod tests;
