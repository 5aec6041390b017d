//! UniformBindingSet trait and the UniformManager contract

use std::any::Any;
use std::sync::Arc;

use crate::backend::{GpuBuffer, ShaderProgram, UniformBinding};

/// A set of uniform bindings for one shader program
///
/// Encapsulates however many frame-indexed copies of each uniform resource
/// the backend's frame-pacing model requires: one native descriptor set per
/// frame in flight on the explicit backend, a single slot table re-pointed
/// per draw on the immediate-mode backend.
pub trait UniformBindingSet {
    /// Re-point which buffer a logical slot reads from, for all frame copies
    ///
    /// Per-frame content is still written through `GpuBuffer::set_data` or
    /// `UniformManager::update_uniform_buffer`. Updates that target a slot
    /// absent from the program's uniform layout are rejected with a logged
    /// diagnostic.
    fn update_buffer(&self, slot: u32, buffer: &Arc<dyn GpuBuffer>, size: u64);

    /// Whether the handle still owns live native objects
    fn is_valid(&self) -> bool;

    /// Release the native descriptor resources; calling twice is a no-op
    fn destroy(&self);

    /// Backend-internal access to the concrete type
    fn as_any(&self) -> &dyn Any;
}

/// Uniform resource factory owned by a backend
pub trait UniformManager {
    /// Create a named uniform buffer sized for a binding slot
    fn create_uniform_buffer(&self, name: &str, binding: &UniformBinding) -> Arc<dyn GpuBuffer>;

    /// Create a binding set for a shader program's uniform layout
    fn create_binding_for_shader(&self, program: &Arc<dyn ShaderProgram>)
        -> Arc<dyn UniformBindingSet>;

    /// Write per-frame uniform content into one frame copy of a slot
    fn update_uniform_buffer(
        &self,
        set: &Arc<dyn UniformBindingSet>,
        slot: u32,
        frame_index: u32,
        data: &[u8],
    );
}
