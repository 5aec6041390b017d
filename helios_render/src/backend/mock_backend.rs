//! Mock backend for unit tests (no GPU required)
//!
//! Implements the full backend contract with in-memory state so the frame
//! lifecycle, the draw queue and the manager factories can be tested
//! without a native graphics API.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use winit::window::Window;

use crate::backend::{
    BackendCapabilities, BindingType, BufferKind, BufferManager, BufferUsage, DrawCommand,
    GpuBuffer, IndexType, Mesh, Rect2D, RenderBackend, RenderCommandBuffer, RenderCommandQueue,
    RenderStats, ShaderBinaryDesc, ShaderManager, ShaderProgram, ShaderProgramDesc,
    UniformBinding, UniformBindingSet, UniformLayout, UniformManager, VertexLayout, Viewport,
};
use crate::{render_error, render_warn};

// ============================================================================
// Mock Buffer
// ============================================================================

pub struct MockBuffer {
    pub kind: BufferKind,
    pub usage: BufferUsage,
    pub size: u64,
    pub data: Mutex<Vec<u8>>,
    valid: AtomicBool,
}

impl MockBuffer {
    pub fn new(kind: BufferKind, usage: BufferUsage, size: u64) -> Self {
        Self {
            kind,
            usage,
            size,
            data: Mutex::new(vec![0u8; size as usize]),
            valid: AtomicBool::new(true),
        }
    }
}

impl GpuBuffer for MockBuffer {
    fn set_data(&self, offset: u64, data: &[u8]) {
        if !self.is_valid() {
            render_warn!("helios::mock", "set_data on destroyed buffer ignored");
            return;
        }
        let mut stored = self.data.lock().unwrap();
        let start = offset as usize;
        let end = (start + data.len()).min(stored.len());
        if end > start {
            stored[start..end].copy_from_slice(&data[..end - start]);
        }
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn kind(&self) -> BufferKind {
        self.kind
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    fn destroy(&self) {
        self.valid.store(false, Ordering::Release);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Mesh
// ============================================================================

pub struct MockMesh {
    layout: VertexLayout,
    index_type: IndexType,
    vertex_count: AtomicU32,
    index_count: AtomicU32,
    valid: AtomicBool,
}

impl MockMesh {
    pub fn new(layout: VertexLayout, index_type: IndexType) -> Self {
        Self {
            layout,
            index_type,
            vertex_count: AtomicU32::new(0),
            index_count: AtomicU32::new(0),
            valid: AtomicBool::new(true),
        }
    }
}

impl Mesh for MockMesh {
    fn set_vertex_data(&self, data: &[u8]) {
        self.vertex_count
            .store(self.layout.vertex_count(data.len()), Ordering::Release);
    }

    fn set_index_data(&self, data: &[u8]) {
        let count = data.len() as u32 / self.index_type.size_bytes();
        self.index_count.store(count, Ordering::Release);
    }

    fn vertex_count(&self) -> u32 {
        self.vertex_count.load(Ordering::Acquire)
    }

    fn index_count(&self) -> u32 {
        self.index_count.load(Ordering::Acquire)
    }

    fn index_type(&self) -> IndexType {
        self.index_type
    }

    fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    fn destroy(&self) {
        self.valid.store(false, Ordering::Release);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Shader
// ============================================================================

pub struct MockShaderProgram {
    uniform_layout: UniformLayout,
    compute: bool,
    valid: AtomicBool,
}

impl MockShaderProgram {
    pub fn new(uniform_layout: UniformLayout, compute: bool, valid: bool) -> Self {
        Self {
            uniform_layout,
            compute,
            valid: AtomicBool::new(valid),
        }
    }
}

impl ShaderProgram for MockShaderProgram {
    fn is_compute(&self) -> bool {
        self.compute
    }

    fn uniform_layout(&self) -> &UniformLayout {
        &self.uniform_layout
    }

    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    fn destroy(&self) {
        self.valid.store(false, Ordering::Release);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Uniform Binding Set
// ============================================================================

pub struct MockUniformBindingSet {
    layout: UniformLayout,
    /// (slot, buffer size) of every accepted update
    pub updates: Mutex<Vec<(u32, u64)>>,
    /// (slot, frame index, bytes) of every accepted per-frame write
    pub writes: Mutex<Vec<(u32, u32, Vec<u8>)>>,
    valid: AtomicBool,
}

impl MockUniformBindingSet {
    pub fn new(layout: UniformLayout) -> Self {
        Self {
            layout,
            updates: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
            valid: AtomicBool::new(true),
        }
    }
}

impl UniformBindingSet for MockUniformBindingSet {
    fn update_buffer(&self, slot: u32, _buffer: &Arc<dyn GpuBuffer>, size: u64) {
        if !self.layout.has_slot(slot) {
            render_error!("helios::mock", "update_buffer: slot {} not in layout", slot);
            return;
        }
        self.updates.lock().unwrap().push((slot, size));
    }

    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    fn destroy(&self) {
        self.valid.store(false, Ordering::Release);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Command Buffer / Queue
// ============================================================================

#[derive(Default)]
pub struct MockCommandBuffer {
    pub commands: Vec<String>,
    recording: bool,
}

impl RenderCommandBuffer for MockCommandBuffer {
    fn begin(&mut self) {
        self.recording = true;
        self.commands.push("begin".to_string());
    }

    fn end(&mut self) {
        if self.recording {
            self.commands.push("end".to_string());
        }
        self.recording = false;
    }

    fn is_recording(&self) -> bool {
        self.recording
    }

    fn bind_pipeline(&mut self, _program: &Arc<dyn ShaderProgram>) {
        if !self.recording {
            return;
        }
        self.commands.push("bind_pipeline".to_string());
    }

    fn bind_vertex_buffer(&mut self, _buffer: &Arc<dyn GpuBuffer>, _offset: u64) {
        if !self.recording {
            return;
        }
        self.commands.push("bind_vertex_buffer".to_string());
    }

    fn bind_index_buffer(&mut self, _buffer: &Arc<dyn GpuBuffer>, _offset: u64) {
        if !self.recording {
            return;
        }
        self.commands.push("bind_index_buffer".to_string());
    }

    fn bind_uniform_set(&mut self, _set: &Arc<dyn UniformBindingSet>, frame_index: u32) {
        if !self.recording {
            return;
        }
        self.commands.push(format!("bind_uniform_set:{}", frame_index));
    }

    fn draw(&mut self, vertex_count: u32, _first_vertex: u32) {
        if !self.recording {
            return;
        }
        self.commands.push(format!("draw:{}", vertex_count));
    }

    fn draw_indexed(&mut self, index_count: u32, _first_index: u32, _vertex_offset: i32) {
        if !self.recording {
            return;
        }
        self.commands.push(format!("draw_indexed:{}", index_count));
    }

    fn draw_mesh(&mut self, mesh: &Arc<dyn Mesh>) {
        if !self.recording {
            return;
        }
        if mesh.index_count() > 0 {
            self.commands.push(format!("draw_mesh_indexed:{}", mesh.index_count()));
        } else {
            self.commands.push(format!("draw_mesh:{}", mesh.vertex_count()));
        }
    }

    fn set_viewport(&mut self, _viewport: Viewport) {
        if !self.recording {
            return;
        }
        self.commands.push("set_viewport".to_string());
    }

    fn set_scissor(&mut self, _scissor: Rect2D) {
        if !self.recording {
            return;
        }
        self.commands.push("set_scissor".to_string());
    }
}

pub struct MockCommandQueue {
    pub buffer: MockCommandBuffer,
    pub current_frame: u32,
}

impl RenderCommandQueue for MockCommandQueue {
    fn acquire_command_buffer(&mut self) -> &mut dyn RenderCommandBuffer {
        &mut self.buffer
    }

    fn current_frame(&self) -> u32 {
        self.current_frame
    }
}

// ============================================================================
// Mock Managers
// ============================================================================

#[derive(Default)]
pub struct MockBufferManager {
    /// Sizes of created buffers, in creation order
    pub created: Arc<Mutex<Vec<u64>>>,
}

impl BufferManager for MockBufferManager {
    fn create_buffer(
        &self,
        kind: BufferKind,
        usage: BufferUsage,
        size: u64,
        initial_data: Option<&[u8]>,
    ) -> Arc<dyn GpuBuffer> {
        self.created.lock().unwrap().push(size);
        let buffer = MockBuffer::new(kind, usage, size);
        if let Some(data) = initial_data {
            buffer.set_data(0, data);
        }
        Arc::new(buffer)
    }

    fn create_mesh(&self, layout: &VertexLayout, index_type: IndexType) -> Arc<dyn Mesh> {
        Arc::new(MockMesh::new(layout.clone(), index_type))
    }

    fn destroy_buffer(&self, buffer: &Arc<dyn GpuBuffer>) {
        buffer.destroy();
    }
}

#[derive(Default)]
pub struct MockShaderManager {
    pub created: Arc<Mutex<Vec<String>>>,
    /// When set, `create_from_source` produces invalid handles
    pub fail_compilation: AtomicBool,
}

impl ShaderManager for MockShaderManager {
    fn create_from_source(&self, desc: &ShaderProgramDesc) -> Arc<dyn ShaderProgram> {
        self.created.lock().unwrap().push("source".to_string());
        let valid = !self.fail_compilation.load(Ordering::Acquire);
        if !valid {
            render_error!("helios::mock", "shader compilation failed (forced by test)");
        }
        Arc::new(MockShaderProgram::new(desc.uniform_layout.clone(), false, valid))
    }

    fn create_from_binary(&self, desc: &ShaderBinaryDesc) -> Arc<dyn ShaderProgram> {
        self.created.lock().unwrap().push("binary".to_string());
        Arc::new(MockShaderProgram::new(desc.uniform_layout.clone(), false, true))
    }

    fn create_compute_from_source(&self, _source: &str) -> Arc<dyn ShaderProgram> {
        self.created.lock().unwrap().push("compute".to_string());
        Arc::new(MockShaderProgram::new(UniformLayout::default(), true, true))
    }
}

#[derive(Default)]
pub struct MockUniformManager {
    pub created: Arc<Mutex<Vec<String>>>,
}

impl UniformManager for MockUniformManager {
    fn create_uniform_buffer(&self, name: &str, binding: &UniformBinding) -> Arc<dyn GpuBuffer> {
        self.created.lock().unwrap().push(name.to_string());
        debug_assert_eq!(binding.binding_type, BindingType::UniformBuffer);
        Arc::new(MockBuffer::new(
            BufferKind::Uniform,
            BufferUsage::Dynamic,
            binding.size,
        ))
    }

    fn create_binding_for_shader(
        &self,
        program: &Arc<dyn ShaderProgram>,
    ) -> Arc<dyn UniformBindingSet> {
        Arc::new(MockUniformBindingSet::new(program.uniform_layout().clone()))
    }

    fn update_uniform_buffer(
        &self,
        set: &Arc<dyn UniformBindingSet>,
        slot: u32,
        frame_index: u32,
        data: &[u8],
    ) {
        let Some(mock) = set.as_any().downcast_ref::<MockUniformBindingSet>() else {
            render_error!("helios::mock", "update_uniform_buffer: foreign binding set");
            return;
        };
        if !mock.layout.has_slot(slot) {
            render_error!("helios::mock", "update_uniform_buffer: slot {} not in layout", slot);
            return;
        }
        if frame_index >= MOCK_MAX_FRAMES_IN_FLIGHT {
            render_error!(
                "helios::mock",
                "update_uniform_buffer: frame index {} out of range",
                frame_index
            );
            return;
        }
        mock.writes
            .lock()
            .unwrap()
            .push((slot, frame_index, data.to_vec()));
    }
}

// ============================================================================
// Mock Backend
// ============================================================================

const MOCK_MAX_FRAMES_IN_FLIGHT: u32 = 3;

pub struct MockBackend {
    initialized: bool,
    destroyed: bool,
    in_frame: bool,
    width: u32,
    height: u32,
    /// Number of simulated swapchain rebuilds triggered by resizes
    pub rebuild_count: u32,
    resize_pending: bool,
    stats: RenderStats,
    draw_queue: Vec<DrawCommand>,
    /// Total draws issued by `execute_draw_commands`
    pub executed_draws: u32,
    queue: MockCommandQueue,
    buffers: MockBufferManager,
    shaders: MockShaderManager,
    uniforms: MockUniformManager,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            initialized: false,
            destroyed: false,
            in_frame: false,
            width: 0,
            height: 0,
            rebuild_count: 0,
            resize_pending: false,
            stats: RenderStats::default(),
            draw_queue: Vec::new(),
            executed_draws: 0,
            queue: MockCommandQueue {
                buffer: MockCommandBuffer::default(),
                current_frame: 0,
            },
            buffers: MockBufferManager::default(),
            shaders: MockShaderManager::default(),
            uniforms: MockUniformManager::default(),
        }
    }

    /// Initialize without a window (tests have no display server)
    pub fn initialize_headless(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.initialized = true;
        self.destroyed = false;
    }

    /// Draws queued but not yet executed
    pub fn queued_draws(&self) -> usize {
        self.draw_queue.len()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for MockBackend {
    fn initialize(&mut self, window: Option<&Window>, width: u32, height: u32) {
        match window {
            Some(_) => self.initialize_headless(width, height),
            None => {
                render_error!("helios::mock", "initialize: no window handle supplied");
            }
        }
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.wait_idle();
        self.draw_queue.clear();
        self.initialized = false;
        self.destroyed = true;
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        if width == 0 || height == 0 {
            self.resize_pending = true;
            return;
        }
        self.width = width;
        self.height = height;
        self.resize_pending = false;
        self.rebuild_count += 1;
    }

    fn begin_frame(&mut self) -> bool {
        if !self.initialized || self.destroyed {
            return false;
        }
        self.stats = RenderStats::default();
        self.in_frame = true;
        self.queue.buffer.begin();
        true
    }

    fn end_frame(&mut self) {
        if !self.in_frame {
            return;
        }
        self.queue.buffer.end();
        self.in_frame = false;
        self.queue.current_frame = (self.queue.current_frame + 1) % MOCK_MAX_FRAMES_IN_FLIGHT;
    }

    fn submit_draw_command(&mut self, command: DrawCommand) {
        self.draw_queue.push(command);
    }

    fn execute_draw_commands(&mut self) {
        for command in self.draw_queue.drain(..) {
            self.queue.buffer.bind_pipeline(&command.shader);
            self.queue
                .buffer
                .bind_uniform_set(&command.uniform_set, command.frame_index);
            self.queue.buffer.draw_mesh(&command.mesh);
            self.executed_draws += 1;
            self.stats.draw_calls += 1;
        }
    }

    fn wait_idle(&self) {
        // Nothing in flight for the mock
    }

    fn current_frame(&self) -> u32 {
        self.queue.current_frame
    }

    fn max_frames_in_flight(&self) -> u32 {
        MOCK_MAX_FRAMES_IN_FLIGHT
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            max_frames_in_flight: MOCK_MAX_FRAMES_IN_FLIGHT,
            ..BackendCapabilities::default()
        }
    }

    fn stats(&self) -> RenderStats {
        self.stats
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
#[path = "mock_backend_tests.rs"]
mod tests;
