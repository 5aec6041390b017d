//! Command recording - OpenGL implementation
//!
//! GL is immediate: every recorded command executes against the context as
//! soon as it is recorded. `begin`/`end` only gate recording state, and the
//! queue always reports frame slot 0.

use std::sync::Arc;

use glow::HasContext;

use helios_render::backend::{
    GpuBuffer, IndexType, Mesh, Rect2D, RenderCommandBuffer, RenderCommandQueue, RenderStats,
    ShaderProgram, UniformBindingSet, Viewport,
};
use helios_render::render_error;

use crate::gl_buffer::GlBuffer;
use crate::gl_mesh::{gl_index_type, GlMesh};
use crate::gl_shader::GlShaderProgram;
use crate::gl_uniform::GlUniformBindingSet;

/// OpenGL command buffer
pub struct GlCommandBuffer {
    gl: Option<Arc<glow::Context>>,
    recording: bool,
    /// Element type of the most recently bound index source
    index_type: IndexType,
    pub(crate) stats: RenderStats,
}

impl GlCommandBuffer {
    pub(crate) fn new() -> Self {
        Self {
            gl: None,
            recording: false,
            index_type: IndexType::U32,
            stats: RenderStats::default(),
        }
    }

    pub(crate) fn attach(&mut self, gl: Arc<glow::Context>) {
        self.gl = Some(gl);
    }

    pub(crate) fn detach(&mut self) {
        self.gl = None;
        self.recording = false;
    }

    fn context(&self) -> Option<&Arc<glow::Context>> {
        if !self.recording {
            debug_assert!(false, "command recorded outside begin/end");
            return None;
        }
        self.gl.as_ref()
    }
}

impl RenderCommandBuffer for GlCommandBuffer {
    fn begin(&mut self) {
        self.recording = true;
    }

    fn end(&mut self) {
        self.recording = false;
    }

    fn is_recording(&self) -> bool {
        self.recording
    }

    fn bind_pipeline(&mut self, program: &Arc<dyn ShaderProgram>) {
        let Some(gl) = self.context() else { return };
        let Some(gl_program) = program.as_any().downcast_ref::<GlShaderProgram>() else {
            render_error!("helios::gl", "bind_pipeline: program from another backend");
            return;
        };
        match gl_program.raw() {
            Some(raw) => unsafe { gl.use_program(Some(raw)) },
            None => render_error!("helios::gl", "bind_pipeline: invalid program"),
        }
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn GpuBuffer>, _offset: u64) {
        let Some(gl) = self.context() else { return };
        let Some(gl_buffer) = buffer.as_any().downcast_ref::<GlBuffer>() else {
            render_error!("helios::gl", "bind_vertex_buffer: buffer from another backend");
            return;
        };
        if let Some(raw) = gl_buffer.raw() {
            unsafe { gl.bind_buffer(glow::ARRAY_BUFFER, Some(raw)) };
        }
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn GpuBuffer>, _offset: u64) {
        let Some(gl) = self.context() else { return };
        let Some(gl_buffer) = buffer.as_any().downcast_ref::<GlBuffer>() else {
            render_error!("helios::gl", "bind_index_buffer: buffer from another backend");
            return;
        };
        if let Some(raw) = gl_buffer.raw() {
            unsafe { gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(raw)) };
        }
    }

    fn bind_uniform_set(&mut self, set: &Arc<dyn UniformBindingSet>, _frame_index: u32) {
        let Some(gl) = self.context() else { return };
        let Some(gl_set) = set.as_any().downcast_ref::<GlUniformBindingSet>() else {
            render_error!("helios::gl", "bind_uniform_set: set from another backend");
            return;
        };
        gl_set.bind(gl);
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) {
        let Some(gl) = self.context() else { return };
        unsafe { gl.draw_arrays(glow::TRIANGLES, first_vertex as i32, vertex_count as i32) };
        self.stats.draw_calls += 1;
        self.stats.triangles += vertex_count / 3;
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, _vertex_offset: i32) {
        let Some(gl) = self.context() else { return };
        let offset = first_index * self.index_type.size_bytes();
        unsafe {
            gl.draw_elements(
                glow::TRIANGLES,
                index_count as i32,
                gl_index_type(self.index_type),
                offset as i32,
            );
        }
        self.stats.draw_calls += 1;
        self.stats.triangles += index_count / 3;
    }

    fn draw_mesh(&mut self, mesh: &Arc<dyn Mesh>) {
        // Owned handle: the stats and index-type fields are written while
        // the context is still in use below
        let Some(gl) = self.context().cloned() else { return };
        let Some(gl_mesh) = mesh.as_any().downcast_ref::<GlMesh>() else {
            render_error!("helios::gl", "draw_mesh: mesh from another backend");
            return;
        };
        if !gl_mesh.bind() {
            render_error!("helios::gl", "draw_mesh: invalid mesh");
            return;
        }
        self.index_type = mesh.index_type();
        let index_count = mesh.index_count();
        unsafe {
            if index_count > 0 {
                gl.draw_elements(
                    glow::TRIANGLES,
                    index_count as i32,
                    gl_index_type(mesh.index_type()),
                    0,
                );
                self.stats.triangles += index_count / 3;
            } else {
                gl.draw_arrays(glow::TRIANGLES, 0, mesh.vertex_count() as i32);
                self.stats.triangles += mesh.vertex_count() / 3;
            }
            gl.bind_vertex_array(None);
        }
        self.stats.draw_calls += 1;
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        let Some(gl) = self.context() else { return };
        unsafe {
            gl.viewport(
                viewport.x as i32,
                viewport.y as i32,
                viewport.width as i32,
                viewport.height as i32,
            );
        }
    }

    fn set_scissor(&mut self, scissor: Rect2D) {
        let Some(gl) = self.context() else { return };
        unsafe {
            gl.enable(glow::SCISSOR_TEST);
            gl.scissor(
                scissor.x,
                scissor.y,
                scissor.width as i32,
                scissor.height as i32,
            );
        }
    }
}

/// OpenGL command queue
///
/// One reusable command buffer; with a single frame in flight the current
/// frame slot is always 0.
pub struct GlCommandQueue {
    pub(crate) buffer: GlCommandBuffer,
}

impl GlCommandQueue {
    pub(crate) fn new() -> Self {
        Self {
            buffer: GlCommandBuffer::new(),
        }
    }
}

impl RenderCommandQueue for GlCommandQueue {
    fn acquire_command_buffer(&mut self) -> &mut dyn RenderCommandBuffer {
        &mut self.buffer
    }

    fn current_frame(&self) -> u32 {
        0
    }
}
