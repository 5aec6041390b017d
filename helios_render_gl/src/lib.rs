/*!
# Helios Render - OpenGL Backend

OpenGL 3.3 implementation of the helios_render backend traits, built on
glow for the GL bindings and glutin for context and surface management.

OpenGL is an immediate-mode API from the backend's point of view: recorded
commands execute as soon as they are recorded, there is a single frame in
flight and `current_frame()` is always 0. This backend serves as the
portable fallback and is registered at priority 0.
*/

mod gl_backend;
mod gl_buffer;
mod gl_command;
mod gl_context;
mod gl_mesh;
mod gl_shader;
mod gl_uniform;

pub use gl_backend::GlBackend;

use helios_render::backend::BackendRegistry;

/// Identifier under which this backend registers itself
pub const BACKEND_ID: &str = "opengl";

/// Register the OpenGL backend
///
/// The availability probe always succeeds: a GL 3.3 context is the
/// portability baseline, and actual context creation failures surface
/// later through `is_initialized() == false`.
pub fn register(registry: &mut BackendRegistry) {
    registry.register(
        BACKEND_ID,
        || Box::new(GlBackend::new()),
        || true,
        0,
    );
}
