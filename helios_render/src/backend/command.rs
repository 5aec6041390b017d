//! Command abstraction: RenderCommandBuffer and RenderCommandQueue

use std::sync::Arc;

use crate::backend::{
    GpuBuffer, Mesh, Rect2D, ShaderProgram, UniformBindingSet, Viewport,
};

/// Command buffer for recording draw work
///
/// Calling any bind/draw method while not between `begin` and `end` is a
/// defensive no-op, not a fault; `is_recording()` reports the state and
/// debug builds assert.
pub trait RenderCommandBuffer {
    /// Begin recording commands
    fn begin(&mut self);

    /// End recording commands
    fn end(&mut self);

    /// Whether the buffer is currently recording
    fn is_recording(&self) -> bool;

    /// Bind a shader program's pipeline
    fn bind_pipeline(&mut self, program: &Arc<dyn ShaderProgram>);

    /// Bind a vertex buffer
    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn GpuBuffer>, offset: u64);

    /// Bind an index buffer
    fn bind_index_buffer(&mut self, buffer: &Arc<dyn GpuBuffer>, offset: u64);

    /// Bind the frame-indexed copy of a uniform binding set
    fn bind_uniform_set(&mut self, set: &Arc<dyn UniformBindingSet>, frame_index: u32);

    /// Draw vertices
    fn draw(&mut self, vertex_count: u32, first_vertex: u32);

    /// Draw indexed vertices
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32);

    /// Bind a mesh's buffers and draw it (indexed when indices are present)
    fn draw_mesh(&mut self, mesh: &Arc<dyn Mesh>);

    /// Set the viewport
    fn set_viewport(&mut self, viewport: Viewport);

    /// Set the scissor rectangle
    fn set_scissor(&mut self, scissor: Rect2D);
}

/// Command queue owned by a backend
///
/// Hands out command buffers bound to the current frame slot: the
/// pre-allocated native buffer for `current_frame` on the explicit
/// backend, a buffer from a small reusable pool on the immediate-mode
/// backend.
pub trait RenderCommandQueue {
    /// Acquire the command buffer for the current frame slot
    fn acquire_command_buffer(&mut self) -> &mut dyn RenderCommandBuffer;

    /// The frame slot commands are currently recorded for
    fn current_frame(&self) -> u32;
}
