use super::*;

#[test]
fn test_vertex_format_mapping() {
    assert_eq!(
        vk_vertex_format(VertexFormat::FLOAT2),
        Some(vk::Format::R32G32_SFLOAT)
    );
    assert_eq!(
        vk_vertex_format(VertexFormat::FLOAT3),
        Some(vk::Format::R32G32B32_SFLOAT)
    );
    assert_eq!(
        vk_vertex_format(VertexFormat::FLOAT4),
        Some(vk::Format::R32G32B32A32_SFLOAT)
    );
    assert_eq!(
        vk_vertex_format(VertexFormat {
            component: VertexComponent::U8Norm,
            count: 4
        }),
        Some(vk::Format::R8G8B8A8_UNORM)
    );
    assert_eq!(
        vk_vertex_format(VertexFormat {
            component: VertexComponent::U32,
            count: 1
        }),
        Some(vk::Format::R32_UINT)
    );
    // Component counts outside 1-4 have no Vulkan format
    assert_eq!(
        vk_vertex_format(VertexFormat {
            component: VertexComponent::F32,
            count: 5
        }),
        None
    );
}

#[test]
fn test_stage_flags_mapping() {
    assert_eq!(
        vk_stage_flags(ShaderStageFlags::VERTEX),
        vk::ShaderStageFlags::VERTEX
    );
    assert_eq!(
        vk_stage_flags(ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT),
        vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT
    );
    assert_eq!(
        vk_stage_flags(ShaderStageFlags::COMPUTE),
        vk::ShaderStageFlags::COMPUTE
    );
}

#[test]
fn test_descriptor_type_mapping() {
    assert_eq!(
        vk_descriptor_type(BindingType::UniformBuffer),
        vk::DescriptorType::UNIFORM_BUFFER
    );
    assert_eq!(
        vk_descriptor_type(BindingType::StorageBuffer),
        vk::DescriptorType::STORAGE_BUFFER
    );
    assert_eq!(
        vk_descriptor_type(BindingType::SampledImage),
        vk::DescriptorType::COMBINED_IMAGE_SAMPLER
    );
}

#[test]
fn test_spirv_words_rejects_misaligned_binary() {
    assert!(spirv_words(&[0u8; 7]).is_err());
    let words = spirv_words(&[1, 0, 0, 0, 2, 0, 0, 0]).unwrap();
    assert_eq!(words, vec![1, 2]);
}

#[test]
fn test_invalid_program_keeps_layout() {
    let layout = UniformLayout::default();
    let program = VulkanShaderProgram::invalid(layout, false);
    assert!(!program.is_valid());
    assert!(program.raw_pipeline().is_none());
    assert!(program.raw_pipeline_layout().is_none());
    program.destroy();
}

#[test]
fn test_manager_without_compiler_rejects_source() {
    let manager = VulkanShaderManager::new();
    let vertex_layout = VertexLayout::default();
    let uniform_layout = UniformLayout::default();
    let program = manager.create_from_source(&ShaderProgramDesc {
        vertex_source: "void main() {}",
        fragment_source: "void main() {}",
        vertex_layout: &vertex_layout,
        uniform_layout: &uniform_layout,
    });
    assert!(!program.is_valid());
}
