//! RenderBackend trait - the full backend contract
//!
//! State machine: Uninitialized -> Initializing -> Ready, with a per-frame
//! Recording -> Submitted cycle between `begin_frame` and `end_frame`, and
//! a terminal Destroyed state entered through `destroy()`.

use winit::window::Window;

use crate::backend::{
    BackendCapabilities, BufferManager, DrawCommand, RenderCommandQueue, RenderStats,
    ShaderManager, UniformManager,
};

/// The render backend contract
///
/// All methods are invoked from one rendering thread; concurrency exists
/// only between the CPU (recording frame N+1) and the GPU (executing
/// frame N). The only blocking operation on the hot path is the per-frame
/// fence wait inside `begin_frame` on the explicit backend.
pub trait RenderBackend {
    /// Perform native context/device setup and construct the sub-managers
    ///
    /// A `None` window or any unrecoverable native failure is logged and
    /// leaves `is_initialized() == false`; no error escapes this boundary.
    fn initialize(&mut self, window: Option<&Window>, width: u32, height: u32);

    /// Whether native initialization succeeded
    fn is_initialized(&self) -> bool;

    /// Wait for all in-flight GPU work, then release native objects in
    /// reverse construction order. Idempotent.
    fn destroy(&mut self);

    /// Notify the backend of a framebuffer size change
    ///
    /// Immediate-mode backend: updates the viewport directly.
    /// Explicit backend: marks a pending resize consumed at the next frame
    /// boundary. Repeated calls with the current size are no-ops; a zero
    /// size defers recreation.
    fn on_resize(&mut self, width: u32, height: u32);

    /// Begin a frame
    ///
    /// Explicit backend: fence wait, image acquire, command recording and
    /// render pass begin. Immediate-mode backend: clear the default
    /// framebuffer. Returns false when the frame must be skipped (swapchain
    /// recreation, zero-sized surface, uninitialized backend).
    fn begin_frame(&mut self) -> bool;

    /// End the frame: submit, present, advance `current_frame`
    fn end_frame(&mut self);

    /// Append a draw to the internal queue
    fn submit_draw_command(&mut self, command: DrawCommand);

    /// Drain the draw queue exactly once, issuing all binds and draws
    ///
    /// The queue is empty afterwards; executing with zero queued commands
    /// is a safe no-op.
    fn execute_draw_commands(&mut self);

    /// Full stop-the-world synchronization
    ///
    /// Used only at shutdown, swapchain recreation and teardown; never on
    /// the per-frame hot path.
    fn wait_idle(&self);

    /// Current frame slot, in `[0, max_frames_in_flight)`
    fn current_frame(&self) -> u32;

    /// Number of frames the CPU may run ahead of the GPU
    fn max_frames_in_flight(&self) -> u32;

    /// Capability description produced at initialization
    fn capabilities(&self) -> BackendCapabilities;

    /// Statistics for the frame being recorded
    fn stats(&self) -> RenderStats;

    /// Buffer factory
    fn buffer_manager(&self) -> &dyn BufferManager;

    /// Shader factory
    fn shader_manager(&self) -> &dyn ShaderManager;

    /// Uniform resource factory
    fn uniform_manager(&self) -> &dyn UniformManager;

    /// Command queue
    fn command_queue(&mut self) -> &mut dyn RenderCommandQueue;
}
