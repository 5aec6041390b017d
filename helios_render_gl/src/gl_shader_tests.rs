use super::*;
use helios_render::backend::{ShaderStageFlags, UniformBinding, VertexLayout};

fn test_layout() -> UniformLayout {
    UniformLayout {
        bindings: vec![UniformBinding {
            name: "scene".to_string(),
            slot: 0,
            binding_type: BindingType::UniformBuffer,
            size: 128,
            stages: ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
        }],
    }
}

#[test]
fn test_invalid_program_keeps_layout() {
    let program = GlShaderProgram::invalid(test_layout(), false);
    assert!(!program.is_valid());
    assert!(!program.is_compute());
    assert!(program.uniform_layout().has_slot(0));
    program.destroy();
}

#[test]
fn test_manager_without_context_yields_invalid_handles() {
    let manager = GlShaderManager::new();
    let vertex_layout = VertexLayout::default();
    let uniform_layout = test_layout();
    let program = manager.create_from_source(&ShaderProgramDesc {
        vertex_source: "void main() {}",
        fragment_source: "void main() {}",
        vertex_layout: &vertex_layout,
        uniform_layout: &uniform_layout,
    });
    assert!(!program.is_valid());
}

#[test]
fn test_binary_shaders_unsupported() {
    let manager = GlShaderManager::new();
    let vertex_layout = VertexLayout::default();
    let uniform_layout = test_layout();
    let program = manager.create_from_binary(&ShaderBinaryDesc {
        vertex_binary: &[0u8; 4],
        fragment_binary: &[0u8; 4],
        vertex_layout: &vertex_layout,
        uniform_layout: &uniform_layout,
    });
    assert!(!program.is_valid());
}

#[test]
fn test_compute_shaders_unsupported() {
    let manager = GlShaderManager::new();
    let program = manager.create_compute_from_source("void main() {}");
    assert!(!program.is_valid());
    assert!(program.is_compute());
}
