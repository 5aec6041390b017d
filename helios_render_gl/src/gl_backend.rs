//! GlBackend - OpenGL implementation of the RenderBackend trait
//!
//! Single frame in flight: `begin_frame` clears the default framebuffer,
//! recorded commands execute immediately, `end_frame` swaps buffers. The
//! swap blocks until the previous frame presents, which is the implicit
//! CPU/GPU synchronization of this backend.

use glow::HasContext;
use winit::window::Window;

use helios_render::backend::{
    BackendCapabilities, BufferManager, DrawCommand, RenderBackend, RenderCommandBuffer,
    RenderCommandQueue, RenderStats, ShaderManager, UniformManager,
};
use helios_render::{render_error, render_info, render_warn};

use crate::gl_buffer::GlBufferManager;
use crate::gl_command::GlCommandQueue;
use crate::gl_context::GlContext;
use crate::gl_shader::GlShaderManager;
use crate::gl_uniform::GlUniformManager;

const CLEAR_COLOR: [f32; 4] = [0.01, 0.01, 0.02, 1.0];

/// OpenGL render backend
pub struct GlBackend {
    context: Option<GlContext>,
    buffers: GlBufferManager,
    shaders: GlShaderManager,
    uniforms: GlUniformManager,
    queue: GlCommandQueue,
    draw_queue: Vec<DrawCommand>,
    capabilities: BackendCapabilities,
    width: u32,
    height: u32,
    resize_pending: bool,
    in_frame: bool,
}

impl GlBackend {
    pub fn new() -> Self {
        Self {
            context: None,
            buffers: GlBufferManager::new(),
            shaders: GlShaderManager::new(),
            uniforms: GlUniformManager::new(),
            queue: GlCommandQueue::new(),
            draw_queue: Vec::new(),
            capabilities: BackendCapabilities::default(),
            width: 0,
            height: 0,
            resize_pending: false,
            in_frame: false,
        }
    }

    fn query_capabilities(gl: &glow::Context) -> BackendCapabilities {
        let max_uniform_buffer_size =
            unsafe { gl.get_parameter_i32(glow::MAX_UNIFORM_BLOCK_SIZE) }.max(0) as u64;
        let max_texture_size =
            unsafe { gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE) }.max(0) as u32;
        BackendCapabilities {
            compute_shaders: false,
            multi_draw_indirect: false,
            bindless_textures: false,
            max_uniform_buffer_size,
            max_texture_size,
            max_frames_in_flight: 1,
        }
    }
}

impl Default for GlBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for GlBackend {
    fn initialize(&mut self, window: Option<&Window>, width: u32, height: u32) {
        if self.context.is_some() {
            render_warn!("helios::gl", "initialize called twice, ignoring");
            return;
        }
        let Some(window) = window else {
            render_error!("helios::gl", "initialize: no window handle supplied");
            return;
        };
        let context = match GlContext::new(window, width, height) {
            Ok(context) => context,
            Err(e) => {
                render_error!("helios::gl", "OpenGL initialization failed: {}", e);
                return;
            }
        };

        let gl = context.gl.clone();
        unsafe {
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);
            gl.viewport(0, 0, width as i32, height as i32);
        }
        self.capabilities = Self::query_capabilities(&gl);
        self.buffers.attach(gl.clone());
        self.shaders.attach(gl.clone());
        self.uniforms.attach(gl.clone());
        self.queue.buffer.attach(gl);
        self.context = Some(context);
        self.width = width;
        self.height = height;
        render_info!("helios::gl", "OpenGL backend initialized ({}x{})", width, height);
    }

    fn is_initialized(&self) -> bool {
        self.context.is_some()
    }

    fn destroy(&mut self) {
        if self.context.is_none() {
            return;
        }
        self.wait_idle();
        self.draw_queue.clear();
        // Teardown in reverse construction order
        self.queue.buffer.detach();
        self.uniforms.detach();
        self.shaders.detach();
        self.buffers.detach();
        self.context = None;
        self.in_frame = false;
        render_info!("helios::gl", "OpenGL backend destroyed");
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        // A pending resize must still be applied even when the window
        // restores to its previous dimensions
        if width == self.width && height == self.height && !self.resize_pending {
            return;
        }
        if width == 0 || height == 0 {
            // Minimized; pick the resize up when a real size arrives
            self.resize_pending = true;
            return;
        }
        self.width = width;
        self.height = height;
        self.resize_pending = false;
        let Some(context) = self.context.as_ref() else {
            return;
        };
        if let Err(e) = context.resize(width, height) {
            render_error!("helios::gl", "Surface resize failed: {}", e);
            return;
        }
        unsafe { context.gl.viewport(0, 0, width as i32, height as i32) };
    }

    fn begin_frame(&mut self) -> bool {
        let Some(context) = self.context.as_ref() else {
            return false;
        };
        if self.width == 0 || self.height == 0 || self.resize_pending {
            return false;
        }
        unsafe {
            context.gl.clear_color(
                CLEAR_COLOR[0],
                CLEAR_COLOR[1],
                CLEAR_COLOR[2],
                CLEAR_COLOR[3],
            );
            context
                .gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
        self.queue.buffer.stats = RenderStats::default();
        self.queue.buffer.begin();
        self.in_frame = true;
        true
    }

    fn end_frame(&mut self) {
        if !self.in_frame {
            return;
        }
        self.queue.buffer.end();
        self.in_frame = false;
        let Some(context) = self.context.as_ref() else {
            return;
        };
        if let Err(e) = context.swap_buffers() {
            render_error!("helios::gl", "Present failed: {}", e);
        }
    }

    fn submit_draw_command(&mut self, command: DrawCommand) {
        self.draw_queue.push(command);
    }

    fn execute_draw_commands(&mut self) {
        for command in self.draw_queue.drain(..) {
            let buffer = &mut self.queue.buffer;
            buffer.bind_pipeline(&command.shader);
            buffer.bind_uniform_set(&command.uniform_set, command.frame_index);
            buffer.draw_mesh(&command.mesh);
        }
    }

    fn wait_idle(&self) {
        if let Some(context) = self.context.as_ref() {
            unsafe { context.gl.finish() };
        }
    }

    fn current_frame(&self) -> u32 {
        0
    }

    fn max_frames_in_flight(&self) -> u32 {
        1
    }

    fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    fn stats(&self) -> RenderStats {
        self.queue.buffer.stats
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

#[cfg(test)]
#[path = "gl_backend_tests.rs"]
mod tests;
