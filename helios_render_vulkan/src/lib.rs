/*!
# Helios Render - Vulkan Backend

Vulkan implementation of the helios_render backend traits, built on Ash
for the Vulkan bindings and gpu-allocator for memory management.

This is the explicit backend: two frames in flight, per-frame fences and
command buffers, frame-indexed uniform copies and a swapchain that is
recreated at frame boundaries when the window resizes. It registers at
priority 10 and is preferred over OpenGL whenever a Vulkan loader is
present.
*/

mod debug;
mod vulkan_backend;
mod vulkan_buffer;
mod vulkan_command;
mod vulkan_context;
mod vulkan_descriptor;
mod vulkan_mesh;
mod vulkan_shader;
mod vulkan_swapchain;

pub use vulkan_backend::VulkanBackend;

#[cfg(feature = "vulkan-validation")]
pub use debug::{reset_validation_stats, validation_stats, ValidationStats};

use helios_render::backend::BackendRegistry;

/// Identifier under which this backend registers itself
pub const BACKEND_ID: &str = "vulkan";

/// Register the Vulkan backend
///
/// The availability probe attempts to load the Vulkan library; device
/// enumeration failures are deferred to `initialize`, which reports them
/// through `is_initialized() == false`.
pub fn register(registry: &mut BackendRegistry) {
    registry.register(
        BACKEND_ID,
        || Box::new(VulkanBackend::new()),
        || unsafe { ash::Entry::load().is_ok() },
        10,
    );
}
