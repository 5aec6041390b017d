//! ShaderProgram trait, shader descriptors and the ShaderManager contract

use std::any::Any;
use std::sync::Arc;

use crate::backend::{UniformLayout, VertexLayout};

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment/Pixel shader
    Fragment,
    /// Compute shader
    Compute,
}

/// Descriptor for creating a shader program from source text
///
/// The vertex and uniform layouts are carried here so the explicit-API
/// backend can build its pipeline object and descriptor-set layouts at
/// creation time from the same layout instances the meshes use.
#[derive(Debug, Clone)]
pub struct ShaderProgramDesc<'a> {
    /// Vertex shader source text
    pub vertex_source: &'a str,
    /// Fragment shader source text
    pub fragment_source: &'a str,
    /// Vertex input layout (shared with mesh creation)
    pub vertex_layout: &'a VertexLayout,
    /// Uniform binding layout (shared with binding-set creation)
    pub uniform_layout: &'a UniformLayout,
}

/// Descriptor for creating a shader program from precompiled bytecode
#[derive(Debug, Clone)]
pub struct ShaderBinaryDesc<'a> {
    /// Compiled vertex stage bytecode
    pub vertex_binary: &'a [u8],
    /// Compiled fragment stage bytecode
    pub fragment_binary: &'a [u8],
    /// Vertex input layout (shared with mesh creation)
    pub vertex_layout: &'a VertexLayout,
    /// Uniform binding layout (shared with binding-set creation)
    pub uniform_layout: &'a UniformLayout,
}

/// Shader program handle
///
/// `is_valid()` reflects compilation/link success: a failed compile yields
/// an invalid handle plus a logged diagnostic, never an error.
pub trait ShaderProgram {
    /// Whether this is a compute-only program
    fn is_compute(&self) -> bool;

    /// The uniform layout the program was created with
    fn uniform_layout(&self) -> &UniformLayout;

    /// Whether compilation/linking succeeded and the handle is live
    fn is_valid(&self) -> bool;

    /// Release the native modules/pipeline; calling twice is a no-op
    fn destroy(&self);

    /// Backend-internal access to the concrete type
    fn as_any(&self) -> &dyn Any;
}

/// Shader factory owned by a backend
pub trait ShaderManager {
    /// Compile and link a graphics program from source text
    fn create_from_source(&self, desc: &ShaderProgramDesc) -> Arc<dyn ShaderProgram>;

    /// Load a graphics program from precompiled bytecode, skipping compilation
    fn create_from_binary(&self, desc: &ShaderBinaryDesc) -> Arc<dyn ShaderProgram>;

    /// Compile a compute-only program from source text
    fn create_compute_from_source(&self, source: &str) -> Arc<dyn ShaderProgram>;
}

/// External shader-compilation collaborator
///
/// Pure function boundary: source text in one dialect goes in, compiled
/// bytecode for the native API comes out. The explicit-API backend invokes
/// this for `create_from_source`; an implementer may back it with an
/// embedded compiler library or an external compiler process.
pub trait ShaderCompiler {
    /// Compile source text for one stage into native bytecode
    fn compile(&self, source: &str, stage: ShaderStage) -> Result<Vec<u8>, String>;
}
