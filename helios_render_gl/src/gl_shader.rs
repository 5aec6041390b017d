//! Shader - OpenGL implementation of ShaderProgram and ShaderManager
//!
//! Programs are compiled from GLSL source and linked at creation. Uniform
//! blocks are rebound to the slots named by the uniform layout right after
//! linking, so the layout's slot numbers are authoritative on both
//! backends.

use std::any::Any;
use std::cell::Cell;
use std::sync::Arc;

use glow::HasContext;

use helios_render::backend::{
    BindingType, ShaderBinaryDesc, ShaderManager, ShaderProgram, ShaderProgramDesc, UniformLayout,
};
use helios_render::render_error;

/// OpenGL shader program
pub struct GlShaderProgram {
    gl: Option<Arc<glow::Context>>,
    program: Cell<Option<glow::Program>>,
    uniform_layout: UniformLayout,
    compute: bool,
}

impl GlShaderProgram {
    fn new(gl: Arc<glow::Context>, program: glow::Program, uniform_layout: UniformLayout) -> Self {
        Self {
            gl: Some(gl),
            program: Cell::new(Some(program)),
            uniform_layout,
            compute: false,
        }
    }

    pub(crate) fn invalid(uniform_layout: UniformLayout, compute: bool) -> Self {
        Self {
            gl: None,
            program: Cell::new(None),
            uniform_layout,
            compute,
        }
    }

    /// Native program object, when still alive
    pub(crate) fn raw(&self) -> Option<glow::Program> {
        self.program.get()
    }
}

impl ShaderProgram for GlShaderProgram {
    fn is_compute(&self) -> bool {
        self.compute
    }

    fn uniform_layout(&self) -> &UniformLayout {
        &self.uniform_layout
    }

    fn is_valid(&self) -> bool {
        self.program.get().is_some()
    }

    fn destroy(&self) {
        if let (Some(gl), Some(program)) = (self.gl.as_ref(), self.program.take()) {
            unsafe { gl.delete_program(program) };
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for GlShaderProgram {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Compile one GLSL stage, returning the info log on failure
fn compile_stage(gl: &glow::Context, source: &str, stage: u32) -> Result<glow::Shader, String> {
    unsafe {
        let shader = gl.create_shader(stage)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(log);
        }
        Ok(shader)
    }
}

/// Link a vertex/fragment pair into a program
fn link_program(
    gl: &glow::Context,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<glow::Program, String> {
    let vertex = compile_stage(gl, vertex_source, glow::VERTEX_SHADER)
        .map_err(|log| format!("vertex stage: {}", log))?;
    let fragment = match compile_stage(gl, fragment_source, glow::FRAGMENT_SHADER) {
        Ok(shader) => shader,
        Err(log) => {
            unsafe { gl.delete_shader(vertex) };
            return Err(format!("fragment stage: {}", log));
        }
    };
    unsafe {
        let program = match gl.create_program() {
            Ok(program) => program,
            Err(e) => {
                gl.delete_shader(vertex);
                gl.delete_shader(fragment);
                return Err(e);
            }
        };
        gl.attach_shader(program, vertex);
        gl.attach_shader(program, fragment);
        gl.link_program(program);
        // Shaders are no longer needed once the program is linked
        gl.detach_shader(program, vertex);
        gl.detach_shader(program, fragment);
        gl.delete_shader(vertex);
        gl.delete_shader(fragment);
        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            return Err(format!("link: {}", log));
        }
        Ok(program)
    }
}

/// OpenGL shader factory
pub struct GlShaderManager {
    gl: Option<Arc<glow::Context>>,
}

impl GlShaderManager {
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

impl ShaderManager for GlShaderManager {
    fn create_from_source(&self, desc: &ShaderProgramDesc) -> Arc<dyn ShaderProgram> {
        let Some(gl) = self.gl.as_ref() else {
            render_error!("helios::gl", "create_from_source before initialization");
            return Arc::new(GlShaderProgram::invalid(desc.uniform_layout.clone(), false));
        };
        match link_program(gl, desc.vertex_source, desc.fragment_source) {
            Ok(program) => {
                unsafe {
                    for binding in &desc.uniform_layout.bindings {
                        if binding.binding_type != BindingType::UniformBuffer {
                            continue;
                        }
                        match gl.get_uniform_block_index(program, &binding.name) {
                            Some(index) => {
                                gl.uniform_block_binding(program, index, binding.slot);
                            }
                            None => {
                                render_error!(
                                    "helios::gl",
                                    "Uniform block '{}' not found in program",
                                    binding.name
                                );
                            }
                        }
                    }
                }
                Arc::new(GlShaderProgram::new(
                    gl.clone(),
                    program,
                    desc.uniform_layout.clone(),
                ))
            }
            Err(log) => {
                render_error!("helios::gl", "Shader compilation failed: {}", log);
                Arc::new(GlShaderProgram::invalid(desc.uniform_layout.clone(), false))
            }
        }
    }

    fn create_from_binary(&self, desc: &ShaderBinaryDesc) -> Arc<dyn ShaderProgram> {
        // SPIR-V ingestion needs GL 4.6; the 3.3 baseline has none
        render_error!("helios::gl", "Binary shaders are not supported on OpenGL 3.3");
        Arc::new(GlShaderProgram::invalid(desc.uniform_layout.clone(), false))
    }

    fn create_compute_from_source(&self, _source: &str) -> Arc<dyn ShaderProgram> {
        render_error!("helios::gl", "Compute shaders are not supported on OpenGL 3.3");
        Arc::new(GlShaderProgram::invalid(UniformLayout::default(), true))
    }
}

#[cfg(test)]
#[path = "gl_shader_tests.rs"]
mod tests;
