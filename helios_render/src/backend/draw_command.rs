//! DrawCommand - one queued draw submission

use std::sync::Arc;

use crate::backend::{Mesh, ShaderProgram, UniformBindingSet};

/// One queued draw: pipeline, frame-indexed uniforms, mesh
///
/// Queued by `RenderBackend::submit_draw_command`, consumed exactly once by
/// `execute_draw_commands`. The queue is empty after execution and before
/// the next frame's submissions begin.
#[derive(Clone)]
pub struct DrawCommand {
    /// Shader program whose pipeline is bound for the draw
    pub shader: Arc<dyn ShaderProgram>,
    /// Uniform binding set; the copy for `frame_index` is bound
    pub uniform_set: Arc<dyn UniformBindingSet>,
    /// Frame slot whose uniform copy the draw reads
    pub frame_index: u32,
    /// Mesh to draw
    pub mesh: Arc<dyn Mesh>,
}
