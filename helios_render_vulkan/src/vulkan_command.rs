//! Command recording - Vulkan implementation
//!
//! Unlike GL, nothing executes at record time: commands go into a native
//! `vk::CommandBuffer` and run when the backend submits it at the end of
//! the frame. The queue pre-allocates one command buffer per frame in
//! flight so a frame never re-records a buffer the GPU is still reading.

use std::sync::Arc;

use ash::vk;

use helios_render::backend::{
    GpuBuffer, IndexType, Mesh, Rect2D, RenderCommandBuffer, RenderCommandQueue, RenderStats,
    ShaderProgram, UniformBindingSet, Viewport,
};
use helios_render::{render_error, RenderError, RenderResult};

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_context::{GpuContext, MAX_FRAMES_IN_FLIGHT};
use crate::vulkan_descriptor::VulkanUniformBindingSet;
use crate::vulkan_mesh::{vk_index_type, VulkanMesh};
use crate::vulkan_shader::VulkanShaderProgram;

/// Vulkan command buffer
///
/// Wraps one pre-allocated native command buffer. Descriptor set binding
/// needs the pipeline layout, so `bind_pipeline` must precede
/// `bind_uniform_set`; the layout of the last bound pipeline is kept for
/// that purpose.
pub struct VulkanCommandBuffer {
    ctx: Option<Arc<GpuContext>>,
    raw: vk::CommandBuffer,
    recording: bool,
    /// Layout of the last bound pipeline
    bound_layout: Option<vk::PipelineLayout>,
    /// Element type of the most recently bound index source
    index_type: IndexType,
    pub(crate) stats: RenderStats,
}

impl VulkanCommandBuffer {
    fn new() -> Self {
        Self {
            ctx: None,
            raw: vk::CommandBuffer::null(),
            recording: false,
            bound_layout: None,
            index_type: IndexType::U32,
            stats: RenderStats::default(),
        }
    }

    fn attach(&mut self, ctx: Arc<GpuContext>, raw: vk::CommandBuffer) {
        self.ctx = Some(ctx);
        self.raw = raw;
    }

    fn detach(&mut self) {
        self.ctx = None;
        self.raw = vk::CommandBuffer::null();
        self.recording = false;
        self.bound_layout = None;
    }

    pub(crate) fn raw(&self) -> vk::CommandBuffer {
        self.raw
    }

    fn device(&self) -> Option<&ash::Device> {
        if !self.recording {
            debug_assert!(false, "command recorded outside begin/end");
            return None;
        }
        self.ctx.as_ref().map(|ctx| &ctx.device)
    }

    /// Begin the frame's render pass with color and depth clears
    pub(crate) fn begin_render_pass(
        &mut self,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        clear_color: [f32; 4],
    ) {
        let Some(ctx) = self.ctx.as_ref() else { return };
        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: clear_color,
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .clear_values(&clear_values);
        unsafe {
            ctx.device
                .cmd_begin_render_pass(self.raw, &begin_info, vk::SubpassContents::INLINE);
        }
    }

    pub(crate) fn end_render_pass(&mut self) {
        let Some(ctx) = self.ctx.as_ref() else { return };
        unsafe { ctx.device.cmd_end_render_pass(self.raw) };
    }
}

impl RenderCommandBuffer for VulkanCommandBuffer {
    fn begin(&mut self) {
        let Some(ctx) = self.ctx.as_ref() else { return };
        let begin_info = vk::CommandBufferBeginInfo::default();
        unsafe {
            if let Err(e) = ctx
                .device
                .reset_command_buffer(self.raw, vk::CommandBufferResetFlags::empty())
            {
                render_error!("helios::vulkan", "Command buffer reset failed: {:?}", e);
                return;
            }
            if let Err(e) = ctx.device.begin_command_buffer(self.raw, &begin_info) {
                render_error!("helios::vulkan", "Command buffer begin failed: {:?}", e);
                return;
            }
        }
        self.recording = true;
        self.bound_layout = None;
    }

    fn end(&mut self) {
        if !self.recording {
            return;
        }
        if let Some(ctx) = self.ctx.as_ref() {
            unsafe {
                if let Err(e) = ctx.device.end_command_buffer(self.raw) {
                    render_error!("helios::vulkan", "Command buffer end failed: {:?}", e);
                }
            }
        }
        self.recording = false;
    }

    fn is_recording(&self) -> bool {
        self.recording
    }

    fn bind_pipeline(&mut self, program: &Arc<dyn ShaderProgram>) {
        let Some(device) = self.device() else { return };
        let Some(vk_program) = program.as_any().downcast_ref::<VulkanShaderProgram>() else {
            render_error!("helios::vulkan", "bind_pipeline: program from another backend");
            return;
        };
        let (Some(pipeline), Some(layout)) =
            (vk_program.raw_pipeline(), vk_program.raw_pipeline_layout())
        else {
            render_error!("helios::vulkan", "bind_pipeline: invalid program");
            return;
        };
        unsafe {
            device.cmd_bind_pipeline(self.raw, vk::PipelineBindPoint::GRAPHICS, pipeline);
        }
        self.bound_layout = Some(layout);
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn GpuBuffer>, offset: u64) {
        let Some(device) = self.device() else { return };
        let Some(vk_buffer) = buffer.as_any().downcast_ref::<VulkanBuffer>() else {
            render_error!(
                "helios::vulkan",
                "bind_vertex_buffer: buffer from another backend"
            );
            return;
        };
        if let Some(raw) = vk_buffer.raw() {
            unsafe { device.cmd_bind_vertex_buffers(self.raw, 0, &[raw], &[offset]) };
        }
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn GpuBuffer>, offset: u64) {
        let Some(device) = self.device() else { return };
        let Some(vk_buffer) = buffer.as_any().downcast_ref::<VulkanBuffer>() else {
            render_error!(
                "helios::vulkan",
                "bind_index_buffer: buffer from another backend"
            );
            return;
        };
        if let Some(raw) = vk_buffer.raw() {
            unsafe {
                device.cmd_bind_index_buffer(self.raw, raw, offset, vk_index_type(self.index_type));
            }
        }
    }

    fn bind_uniform_set(&mut self, set: &Arc<dyn UniformBindingSet>, frame_index: u32) {
        let Some(device) = self.device() else { return };
        let Some(vk_set) = set.as_any().downcast_ref::<VulkanUniformBindingSet>() else {
            render_error!(
                "helios::vulkan",
                "bind_uniform_set: set from another backend"
            );
            return;
        };
        let Some(layout) = self.bound_layout else {
            render_error!("helios::vulkan", "bind_uniform_set: no pipeline bound");
            return;
        };
        let Some(descriptor_set) = vk_set.descriptor_set(frame_index) else {
            render_error!("helios::vulkan", "bind_uniform_set: invalid set");
            return;
        };
        unsafe {
            device.cmd_bind_descriptor_sets(
                self.raw,
                vk::PipelineBindPoint::GRAPHICS,
                layout,
                0,
                &[descriptor_set],
                &[],
            );
        }
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) {
        let Some(device) = self.device() else { return };
        unsafe { device.cmd_draw(self.raw, vertex_count, 1, first_vertex, 0) };
        self.stats.draw_calls += 1;
        self.stats.triangles += vertex_count / 3;
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) {
        let Some(device) = self.device() else { return };
        unsafe {
            device.cmd_draw_indexed(self.raw, index_count, 1, first_index, vertex_offset, 0);
        }
        self.stats.draw_calls += 1;
        self.stats.triangles += index_count / 3;
    }

    fn draw_mesh(&mut self, mesh: &Arc<dyn Mesh>) {
        // Owned handle: the stats and index-type fields are written while
        // the device is still in use below
        let Some(device) = self.device().cloned() else { return };
        let Some(vk_mesh) = mesh.as_any().downcast_ref::<VulkanMesh>() else {
            render_error!("helios::vulkan", "draw_mesh: mesh from another backend");
            return;
        };
        let Some(vertex_buffer) = vk_mesh.raw_vertex_buffer() else {
            render_error!("helios::vulkan", "draw_mesh: invalid mesh");
            return;
        };
        self.index_type = mesh.index_type();
        unsafe {
            device.cmd_bind_vertex_buffers(self.raw, 0, &[vertex_buffer], &[0]);
            if let Some(index_buffer) = vk_mesh.raw_index_buffer() {
                device.cmd_bind_index_buffer(
                    self.raw,
                    index_buffer,
                    0,
                    vk_index_type(mesh.index_type()),
                );
                device.cmd_draw_indexed(self.raw, mesh.index_count(), 1, 0, 0, 0);
                self.stats.triangles += mesh.index_count() / 3;
            } else {
                device.cmd_draw(self.raw, mesh.vertex_count(), 1, 0, 0);
                self.stats.triangles += mesh.vertex_count() / 3;
            }
        }
        self.stats.draw_calls += 1;
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        let Some(device) = self.device() else { return };
        // Flip Y so the result matches GL's bottom-left origin
        let vk_viewport = vk::Viewport {
            x: viewport.x,
            y: viewport.y + viewport.height,
            width: viewport.width,
            height: -viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        };
        unsafe { device.cmd_set_viewport(self.raw, 0, &[vk_viewport]) };
    }

    fn set_scissor(&mut self, scissor: Rect2D) {
        let Some(device) = self.device() else { return };
        let vk_scissor = vk::Rect2D {
            offset: vk::Offset2D {
                x: scissor.x,
                y: scissor.y,
            },
            extent: vk::Extent2D {
                width: scissor.width,
                height: scissor.height,
            },
        };
        unsafe { device.cmd_set_scissor(self.raw, 0, &[vk_scissor]) };
    }
}

/// Vulkan command queue
///
/// Owns a command pool and one command buffer per frame in flight. The
/// backend advances `current_frame` after each submit; acquisition always
/// hands out the buffer for the active slot.
pub struct VulkanCommandQueue {
    ctx: Option<Arc<GpuContext>>,
    pool: Option<vk::CommandPool>,
    buffers: Vec<VulkanCommandBuffer>,
    current_frame: u32,
}

impl VulkanCommandQueue {
    pub(crate) fn new() -> Self {
        Self {
            ctx: None,
            pool: None,
            buffers: (0..MAX_FRAMES_IN_FLIGHT)
                .map(|_| VulkanCommandBuffer::new())
                .collect(),
            current_frame: 0,
        }
    }

    pub(crate) fn attach(&mut self, ctx: Arc<GpuContext>) -> RenderResult<()> {
        let pool_info = vk::CommandPoolCreateInfo::default()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(ctx.graphics_queue_family);
        let pool = unsafe { ctx.device.create_command_pool(&pool_info, None) }
            .map_err(|e| RenderError::BackendError(format!("Frame command pool: {:?}", e)))?;

        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(MAX_FRAMES_IN_FLIGHT as u32);
        let raw_buffers = match unsafe { ctx.device.allocate_command_buffers(&alloc_info) } {
            Ok(buffers) => buffers,
            Err(e) => {
                unsafe { ctx.device.destroy_command_pool(pool, None) };
                return Err(RenderError::BackendError(format!(
                    "Frame command buffers: {:?}",
                    e
                )));
            }
        };

        for (buffer, raw) in self.buffers.iter_mut().zip(raw_buffers) {
            buffer.attach(Arc::clone(&ctx), raw);
        }
        self.pool = Some(pool);
        self.ctx = Some(ctx);
        self.current_frame = 0;
        Ok(())
    }

    pub(crate) fn detach(&mut self) {
        for buffer in &mut self.buffers {
            buffer.detach();
        }
        if let (Some(ctx), Some(pool)) = (self.ctx.take(), self.pool.take()) {
            // Frees the per-frame command buffers with it
            unsafe { ctx.device.destroy_command_pool(pool, None) };
        }
    }

    pub(crate) fn set_frame(&mut self, frame: u32) {
        self.current_frame = frame % MAX_FRAMES_IN_FLIGHT as u32;
    }

    pub(crate) fn frame_buffer(&mut self) -> &mut VulkanCommandBuffer {
        let index = self.current_frame as usize;
        &mut self.buffers[index]
    }

    pub(crate) fn frame_stats(&self) -> RenderStats {
        self.buffers[self.current_frame as usize].stats
    }
}

impl RenderCommandQueue for VulkanCommandQueue {
    fn acquire_command_buffer(&mut self) -> &mut dyn RenderCommandBuffer {
        self.frame_buffer()
    }

    fn current_frame(&self) -> u32 {
        self.current_frame
    }
}

#[cfg(test)]
#[path = "vulkan_command_tests.rs"]
mod tests;
