//! Uniform bindings - OpenGL implementation
//!
//! GL keeps a single copy of every uniform buffer: draws execute
//! immediately, so there is no frame overlap and the frame index passed to
//! updates and binds is ignored.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::sync::Arc;

use glow::HasContext;
use rustc_hash::FxHashMap;

use helios_render::backend::{
    BindingType, BufferKind, BufferUsage, GpuBuffer, ShaderProgram, UniformBinding,
    UniformBindingSet, UniformLayout, UniformManager,
};
use helios_render::{render_debug, render_error};

use crate::gl_buffer::GlBuffer;

/// OpenGL uniform binding set
///
/// Remembers which buffer is attached to each slot; `bind` emits one
/// `glBindBufferBase` per occupied slot.
pub struct GlUniformBindingSet {
    layout: UniformLayout,
    buffers: RefCell<FxHashMap<u32, Arc<dyn GpuBuffer>>>,
    valid: Cell<bool>,
}

impl GlUniformBindingSet {
    fn new(layout: UniformLayout, valid: bool) -> Self {
        Self {
            layout,
            buffers: RefCell::new(FxHashMap::default()),
            valid: Cell::new(valid),
        }
    }

    /// Bind every attached buffer to its uniform block slot
    pub(crate) fn bind(&self, gl: &glow::Context) {
        for (slot, buffer) in self.buffers.borrow().iter() {
            let Some(gl_buffer) = buffer.as_any().downcast_ref::<GlBuffer>() else {
                continue;
            };
            if let Some(raw) = gl_buffer.raw() {
                unsafe { gl.bind_buffer_base(glow::UNIFORM_BUFFER, *slot, Some(raw)) };
            }
        }
    }

    /// Buffer attached at a slot, if any
    pub(crate) fn buffer_at(&self, slot: u32) -> Option<Arc<dyn GpuBuffer>> {
        self.buffers.borrow().get(&slot).cloned()
    }
}

impl UniformBindingSet for GlUniformBindingSet {
    fn update_buffer(&self, slot: u32, buffer: &Arc<dyn GpuBuffer>, size: u64) {
        if !self.valid.get() {
            render_error!("helios::gl", "update_buffer on invalid binding set");
            return;
        }
        let Some(binding) = self.layout.binding(slot) else {
            render_error!("helios::gl", "update_buffer: slot {} not in layout", slot);
            return;
        };
        if size > binding.size {
            render_error!(
                "helios::gl",
                "update_buffer: size {} exceeds slot {} size {}",
                size,
                slot,
                binding.size
            );
            return;
        }
        if buffer.as_any().downcast_ref::<GlBuffer>().is_none() {
            render_error!("helios::gl", "update_buffer: buffer from another backend");
            return;
        }
        self.buffers.borrow_mut().insert(slot, buffer.clone());
    }

    fn is_valid(&self) -> bool {
        self.valid.get()
    }

    fn destroy(&self) {
        self.buffers.borrow_mut().clear();
        self.valid.set(false);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// OpenGL uniform resource factory
pub struct GlUniformManager {
    gl: Option<Arc<glow::Context>>,
}

impl GlUniformManager {
    pub(crate) fn new() -> Self {
        Self { gl: None }
    }

    pub(crate) fn attach(&mut self, gl: Arc<glow::Context>) {
        self.gl = Some(gl);
    }

    pub(crate) fn detach(&mut self) {
        self.gl = None;
    }
}

impl UniformManager for GlUniformManager {
    fn create_uniform_buffer(&self, name: &str, binding: &UniformBinding) -> Arc<dyn GpuBuffer> {
        let Some(gl) = self.gl.as_ref() else {
            render_error!("helios::gl", "create_uniform_buffer before initialization");
            return Arc::new(GlBuffer::invalid(
                BufferKind::Uniform,
                BufferUsage::Dynamic,
                binding.size,
            ));
        };
        if binding.binding_type != BindingType::UniformBuffer {
            render_error!(
                "helios::gl",
                "create_uniform_buffer: binding '{}' is not a uniform buffer",
                name
            );
            return Arc::new(GlBuffer::invalid(
                BufferKind::Uniform,
                BufferUsage::Dynamic,
                binding.size,
            ));
        }
        render_debug!(
            "helios::gl",
            "Creating uniform buffer '{}' ({} bytes, slot {})",
            name,
            binding.size,
            binding.slot
        );
        Arc::new(GlBuffer::new(
            gl.clone(),
            BufferKind::Uniform,
            BufferUsage::Dynamic,
            binding.size,
            None,
        ))
    }

    fn create_binding_for_shader(
        &self,
        program: &Arc<dyn ShaderProgram>,
    ) -> Arc<dyn UniformBindingSet> {
        if !program.is_valid() {
            render_error!("helios::gl", "create_binding_for_shader: invalid shader program");
            return Arc::new(GlUniformBindingSet::new(UniformLayout::default(), false));
        }
        Arc::new(GlUniformBindingSet::new(program.uniform_layout().clone(), true))
    }

    fn update_uniform_buffer(
        &self,
        set: &Arc<dyn UniformBindingSet>,
        slot: u32,
        _frame_index: u32,
        data: &[u8],
    ) {
        let Some(gl_set) = set.as_any().downcast_ref::<GlUniformBindingSet>() else {
            render_error!("helios::gl", "update_uniform_buffer: foreign binding set");
            return;
        };
        let Some(buffer) = gl_set.buffer_at(slot) else {
            render_error!("helios::gl", "update_uniform_buffer: no buffer at slot {}", slot);
            return;
        };
        buffer.set_data(0, data);
    }
}

#[cfg(test)]
#[path = "gl_uniform_tests.rs"]
mod tests;
