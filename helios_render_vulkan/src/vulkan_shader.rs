//! Shader - Vulkan implementation of ShaderProgram and ShaderManager
//!
//! A shader program owns its whole pipeline state object: descriptor set
//! layout, pipeline layout, a compatible render pass and the graphics
//! pipeline itself, all built at creation from the vertex and uniform
//! layouts in the program description. SPIR-V binaries are cross-checked
//! against the declared uniform layout with spirq reflection.

use std::any::Any;
use std::sync::{Arc, Mutex};

use ash::vk;
use rustc_hash::FxHashSet;

use helios_render::backend::{
    BindingType, ShaderBinaryDesc, ShaderCompiler, ShaderManager, ShaderProgram,
    ShaderProgramDesc, ShaderStage, ShaderStageFlags, UniformLayout, VertexComponent,
    VertexFormat, VertexLayout,
};
use helios_render::{render_error, render_warn, RenderError, RenderResult};

use crate::vulkan_context::GpuContext;

/// Vulkan vertex attribute format for a layout format
pub(crate) fn vk_vertex_format(format: VertexFormat) -> Option<vk::Format> {
    match (format.component, format.count) {
        (VertexComponent::F32, 1) => Some(vk::Format::R32_SFLOAT),
        (VertexComponent::F32, 2) => Some(vk::Format::R32G32_SFLOAT),
        (VertexComponent::F32, 3) => Some(vk::Format::R32G32B32_SFLOAT),
        (VertexComponent::F32, 4) => Some(vk::Format::R32G32B32A32_SFLOAT),
        (VertexComponent::U32, 1) => Some(vk::Format::R32_UINT),
        (VertexComponent::U32, 2) => Some(vk::Format::R32G32_UINT),
        (VertexComponent::U32, 3) => Some(vk::Format::R32G32B32_UINT),
        (VertexComponent::U32, 4) => Some(vk::Format::R32G32B32A32_UINT),
        (VertexComponent::I32, 1) => Some(vk::Format::R32_SINT),
        (VertexComponent::I32, 2) => Some(vk::Format::R32G32_SINT),
        (VertexComponent::I32, 3) => Some(vk::Format::R32G32B32_SINT),
        (VertexComponent::I32, 4) => Some(vk::Format::R32G32B32A32_SINT),
        (VertexComponent::U8Norm, 1) => Some(vk::Format::R8_UNORM),
        (VertexComponent::U8Norm, 2) => Some(vk::Format::R8G8_UNORM),
        (VertexComponent::U8Norm, 3) => Some(vk::Format::R8G8B8_UNORM),
        (VertexComponent::U8Norm, 4) => Some(vk::Format::R8G8B8A8_UNORM),
        _ => None,
    }
}

/// Vulkan stage flags for layout stage flags
pub(crate) fn vk_stage_flags(stages: ShaderStageFlags) -> vk::ShaderStageFlags {
    let mut flags = vk::ShaderStageFlags::empty();
    if stages.contains(ShaderStageFlags::VERTEX) {
        flags |= vk::ShaderStageFlags::VERTEX;
    }
    if stages.contains(ShaderStageFlags::FRAGMENT) {
        flags |= vk::ShaderStageFlags::FRAGMENT;
    }
    if stages.contains(ShaderStageFlags::COMPUTE) {
        flags |= vk::ShaderStageFlags::COMPUTE;
    }
    flags
}

/// Vulkan descriptor type for a binding type
pub(crate) fn vk_descriptor_type(binding_type: BindingType) -> vk::DescriptorType {
    match binding_type {
        BindingType::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        BindingType::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        BindingType::SampledImage => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
    }
}

struct NativePipeline {
    pipeline: vk::Pipeline,
    pipeline_layout: vk::PipelineLayout,
    descriptor_set_layout: Option<vk::DescriptorSetLayout>,
    render_pass: vk::RenderPass,
}

/// Vulkan shader program
pub struct VulkanShaderProgram {
    ctx: Option<Arc<GpuContext>>,
    native: Mutex<Option<NativePipeline>>,
    uniform_layout: UniformLayout,
    compute: bool,
}

impl VulkanShaderProgram {
    pub(crate) fn invalid(uniform_layout: UniformLayout, compute: bool) -> Self {
        Self {
            ctx: None,
            native: Mutex::new(None),
            uniform_layout,
            compute,
        }
    }

    pub(crate) fn raw_pipeline(&self) -> Option<vk::Pipeline> {
        self.native
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|n| n.pipeline))
    }

    pub(crate) fn raw_pipeline_layout(&self) -> Option<vk::PipelineLayout> {
        self.native
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|n| n.pipeline_layout))
    }

    pub(crate) fn raw_descriptor_set_layout(&self) -> Option<vk::DescriptorSetLayout> {
        self.native
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().and_then(|n| n.descriptor_set_layout))
    }

    fn release(&self) {
        let Some(ctx) = self.ctx.as_ref() else {
            return;
        };
        let Ok(mut guard) = self.native.lock() else {
            return;
        };
        if let Some(native) = guard.take() {
            unsafe {
                ctx.device.device_wait_idle().ok();
                ctx.device.destroy_pipeline(native.pipeline, None);
                ctx.device
                    .destroy_pipeline_layout(native.pipeline_layout, None);
                if let Some(dsl) = native.descriptor_set_layout {
                    ctx.device.destroy_descriptor_set_layout(dsl, None);
                }
                ctx.device.destroy_render_pass(native.render_pass, None);
            }
        }
    }
}

impl ShaderProgram for VulkanShaderProgram {
    fn is_compute(&self) -> bool {
        self.compute
    }

    fn uniform_layout(&self) -> &UniformLayout {
        &self.uniform_layout
    }

    fn is_valid(&self) -> bool {
        self.native
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    fn destroy(&self) {
        self.release();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanShaderProgram {
    fn drop(&mut self) {
        self.release();
    }
}

/// Slots of all uniform-buffer descriptors found in a SPIR-V binary
fn reflect_uniform_slots(code: &[u32]) -> RenderResult<FxHashSet<u32>> {
    let entry_points = spirq::ReflectConfig::new()
        .spv(code)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| RenderError::BackendError(format!("SPIR-V reflection failed: {:?}", e)))?;

    let mut slots = FxHashSet::default();
    for entry_point in &entry_points {
        for var in entry_point.vars.iter() {
            if let spirq::var::Variable::Descriptor { desc_bind, desc_ty, .. } = var {
                if matches!(desc_ty, spirq::ty::DescriptorType::UniformBuffer()) {
                    slots.insert(desc_bind.bind());
                }
            }
        }
    }
    Ok(slots)
}

/// Reinterpret a byte binary as SPIR-V words
fn spirv_words(binary: &[u8]) -> RenderResult<Vec<u32>> {
    if binary.len() % 4 != 0 {
        return Err(RenderError::BackendError(format!(
            "Shader binary not 4-byte aligned (size: {} bytes)",
            binary.len()
        )));
    }
    Ok(binary
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Vulkan shader factory
///
/// Holds the swapchain color format so every pipeline is created against
/// a render pass compatible with the one frames are recorded in. Source
/// compilation goes through an injected `ShaderCompiler`; without one,
/// only precompiled SPIR-V can be used.
pub struct VulkanShaderManager {
    ctx: Option<Arc<GpuContext>>,
    color_format: vk::Format,
    compiler: Option<Arc<dyn ShaderCompiler>>,
}

impl VulkanShaderManager {
    pub(crate) fn new() -> Self {
        Self {
            ctx: None,
            color_format: vk::Format::B8G8R8A8_SRGB,
            compiler: None,
        }
    }

    pub(crate) fn attach(&mut self, ctx: Arc<GpuContext>, color_format: vk::Format) {
        self.ctx = Some(ctx);
        self.color_format = color_format;
    }

    pub(crate) fn detach(&mut self) {
        self.ctx = None;
    }

    pub(crate) fn set_compiler(&mut self, compiler: Arc<dyn ShaderCompiler>) {
        self.compiler = Some(compiler);
    }

    /// Render pass with one color and one depth attachment
    ///
    /// Also used by the swapchain for its real pass, which keeps pipeline
    /// and frame recording compatible by construction.
    pub(crate) fn create_compatible_render_pass(
        device: &ash::Device,
        color_format: vk::Format,
    ) -> RenderResult<vk::RenderPass> {
        let attachments = [
            vk::AttachmentDescription::default()
                .format(color_format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::PRESENT_SRC_KHR),
            vk::AttachmentDescription::default()
                .format(vk::Format::D32_SFLOAT)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
        ];
        let color_ref = vk::AttachmentReference::default()
            .attachment(0)
            .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
        let depth_ref = vk::AttachmentReference::default()
            .attachment(1)
            .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
        let subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(std::slice::from_ref(&color_ref))
            .depth_stencil_attachment(&depth_ref);
        let dependency = vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            )
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            )
            .dst_access_mask(
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            );

        let info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(std::slice::from_ref(&dependency));
        unsafe { device.create_render_pass(&info, None) }
            .map_err(|e| RenderError::BackendError(format!("Pipeline render pass: {:?}", e)))
    }

    fn build_graphics_pipeline(
        &self,
        ctx: &Arc<GpuContext>,
        vertex_code: &[u32],
        fragment_code: &[u32],
        vertex_layout: &VertexLayout,
        uniform_layout: &UniformLayout,
    ) -> RenderResult<NativePipeline> {
        let device = &ctx.device;

        // Cross-check the declared layout against the reflected binaries
        let mut reflected = reflect_uniform_slots(vertex_code)?;
        reflected.extend(reflect_uniform_slots(fragment_code)?);
        for binding in &uniform_layout.bindings {
            if binding.binding_type == BindingType::UniformBuffer
                && !reflected.contains(&binding.slot)
            {
                render_warn!(
                    "helios::vulkan",
                    "Uniform binding '{}' (slot {}) not present in SPIR-V",
                    binding.name,
                    binding.slot
                );
            }
        }

        unsafe {
            let vertex_module_info = vk::ShaderModuleCreateInfo::default().code(vertex_code);
            let vertex_module = device
                .create_shader_module(&vertex_module_info, None)
                .map_err(|e| RenderError::BackendError(format!("Vertex module: {:?}", e)))?;
            let fragment_module_info = vk::ShaderModuleCreateInfo::default().code(fragment_code);
            let fragment_module = match device.create_shader_module(&fragment_module_info, None) {
                Ok(module) => module,
                Err(e) => {
                    device.destroy_shader_module(vertex_module, None);
                    return Err(RenderError::BackendError(format!("Fragment module: {:?}", e)));
                }
            };

            let build = || -> RenderResult<NativePipeline> {
                // Descriptor set layout from the declared uniform layout
                let descriptor_set_layout = if uniform_layout.bindings.is_empty() {
                    None
                } else {
                    let bindings: Vec<vk::DescriptorSetLayoutBinding> = uniform_layout
                        .bindings
                        .iter()
                        .map(|binding| {
                            vk::DescriptorSetLayoutBinding::default()
                                .binding(binding.slot)
                                .descriptor_type(vk_descriptor_type(binding.binding_type))
                                .descriptor_count(1)
                                .stage_flags(vk_stage_flags(binding.stages))
                        })
                        .collect();
                    let info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
                    Some(device.create_descriptor_set_layout(&info, None).map_err(|e| {
                        RenderError::BackendError(format!("Descriptor set layout: {:?}", e))
                    })?)
                };

                let set_layouts: Vec<vk::DescriptorSetLayout> =
                    descriptor_set_layout.into_iter().collect();
                let layout_info =
                    vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
                let pipeline_layout = device
                    .create_pipeline_layout(&layout_info, None)
                    .map_err(|e| {
                        RenderError::BackendError(format!("Pipeline layout: {:?}", e))
                    })?;

                let render_pass =
                    Self::create_compatible_render_pass(device, self.color_format)?;

                let shader_stages = [
                    vk::PipelineShaderStageCreateInfo::default()
                        .stage(vk::ShaderStageFlags::VERTEX)
                        .module(vertex_module)
                        .name(c"main"),
                    vk::PipelineShaderStageCreateInfo::default()
                        .stage(vk::ShaderStageFlags::FRAGMENT)
                        .module(fragment_module)
                        .name(c"main"),
                ];

                // Single interleaved vertex stream at binding 0
                let vertex_bindings = [vk::VertexInputBindingDescription {
                    binding: 0,
                    stride: vertex_layout.stride,
                    input_rate: vk::VertexInputRate::VERTEX,
                }];
                let mut vertex_attributes = Vec::with_capacity(vertex_layout.attributes.len());
                for attribute in &vertex_layout.attributes {
                    let format = vk_vertex_format(attribute.format).ok_or_else(|| {
                        RenderError::UnsupportedOperation(format!(
                            "Vertex format {:?} x{}",
                            attribute.format.component, attribute.format.count
                        ))
                    })?;
                    vertex_attributes.push(vk::VertexInputAttributeDescription {
                        location: attribute.location,
                        binding: 0,
                        format,
                        offset: attribute.offset,
                    });
                }
                let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
                    .vertex_binding_descriptions(&vertex_bindings)
                    .vertex_attribute_descriptions(&vertex_attributes);

                let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
                    .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
                    .primitive_restart_enable(false);

                // Viewport and scissor are dynamic, set per frame
                let viewports = [vk::Viewport::default()];
                let scissors = [vk::Rect2D::default()];
                let viewport_state = vk::PipelineViewportStateCreateInfo::default()
                    .viewports(&viewports)
                    .scissors(&scissors);

                let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
                    .depth_clamp_enable(false)
                    .rasterizer_discard_enable(false)
                    .polygon_mode(vk::PolygonMode::FILL)
                    .line_width(1.0)
                    .cull_mode(vk::CullModeFlags::BACK)
                    .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
                    .depth_bias_enable(false);

                let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
                    .depth_test_enable(true)
                    .depth_write_enable(true)
                    .depth_compare_op(vk::CompareOp::LESS)
                    .depth_bounds_test_enable(false)
                    .stencil_test_enable(false);

                let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
                    .sample_shading_enable(false)
                    .rasterization_samples(vk::SampleCountFlags::TYPE_1);

                let color_blend_attachment = vk::PipelineColorBlendAttachmentState::default()
                    .color_write_mask(vk::ColorComponentFlags::RGBA)
                    .blend_enable(false);
                let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
                    .logic_op_enable(false)
                    .attachments(std::slice::from_ref(&color_blend_attachment));

                let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
                let dynamic_state =
                    vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

                let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
                    .stages(&shader_stages)
                    .vertex_input_state(&vertex_input_state)
                    .input_assembly_state(&input_assembly_state)
                    .viewport_state(&viewport_state)
                    .rasterization_state(&rasterization_state)
                    .depth_stencil_state(&depth_stencil_state)
                    .multisample_state(&multisample_state)
                    .color_blend_state(&color_blend_state)
                    .dynamic_state(&dynamic_state)
                    .layout(pipeline_layout)
                    .render_pass(render_pass)
                    .subpass(0);

                let pipeline = device
                    .create_graphics_pipelines(
                        vk::PipelineCache::null(),
                        std::slice::from_ref(&pipeline_info),
                        None,
                    )
                    .map_err(|(_, e)| {
                        device.destroy_pipeline_layout(pipeline_layout, None);
                        if let Some(dsl) = set_layouts.first() {
                            device.destroy_descriptor_set_layout(*dsl, None);
                        }
                        device.destroy_render_pass(render_pass, None);
                        RenderError::BackendError(format!("Graphics pipeline: {:?}", e))
                    })?[0];

                Ok(NativePipeline {
                    pipeline,
                    pipeline_layout,
                    descriptor_set_layout: set_layouts.first().copied(),
                    render_pass,
                })
            };

            let result = build();
            device.destroy_shader_module(vertex_module, None);
            device.destroy_shader_module(fragment_module, None);
            result
        }
    }

    fn build_from_binaries(
        &self,
        vertex_binary: &[u8],
        fragment_binary: &[u8],
        vertex_layout: &VertexLayout,
        uniform_layout: &UniformLayout,
    ) -> Arc<dyn ShaderProgram> {
        let Some(ctx) = self.ctx.as_ref() else {
            render_error!("helios::vulkan", "Shader creation before initialization");
            return Arc::new(VulkanShaderProgram::invalid(uniform_layout.clone(), false));
        };
        let build = || -> RenderResult<NativePipeline> {
            let vertex_code = spirv_words(vertex_binary)?;
            let fragment_code = spirv_words(fragment_binary)?;
            self.build_graphics_pipeline(
                ctx,
                &vertex_code,
                &fragment_code,
                vertex_layout,
                uniform_layout,
            )
        };
        match build() {
            Ok(native) => Arc::new(VulkanShaderProgram {
                ctx: Some(ctx.clone()),
                native: Mutex::new(Some(native)),
                uniform_layout: uniform_layout.clone(),
                compute: false,
            }),
            Err(e) => {
                render_error!("helios::vulkan", "Shader program creation failed: {}", e);
                Arc::new(VulkanShaderProgram::invalid(uniform_layout.clone(), false))
            }
        }
    }
}

impl ShaderManager for VulkanShaderManager {
    fn create_from_source(&self, desc: &ShaderProgramDesc) -> Arc<dyn ShaderProgram> {
        let Some(compiler) = self.compiler.as_ref() else {
            render_error!(
                "helios::vulkan",
                "No shader compiler installed; use create_from_binary or set a compiler"
            );
            return Arc::new(VulkanShaderProgram::invalid(desc.uniform_layout.clone(), false));
        };
        let vertex_binary = match compiler.compile(desc.vertex_source, ShaderStage::Vertex) {
            Ok(binary) => binary,
            Err(log) => {
                render_error!("helios::vulkan", "Vertex compilation failed: {}", log);
                return Arc::new(VulkanShaderProgram::invalid(desc.uniform_layout.clone(), false));
            }
        };
        let fragment_binary = match compiler.compile(desc.fragment_source, ShaderStage::Fragment) {
            Ok(binary) => binary,
            Err(log) => {
                render_error!("helios::vulkan", "Fragment compilation failed: {}", log);
                return Arc::new(VulkanShaderProgram::invalid(desc.uniform_layout.clone(), false));
            }
        };
        self.build_from_binaries(
            &vertex_binary,
            &fragment_binary,
            desc.vertex_layout,
            desc.uniform_layout,
        )
    }

    fn create_from_binary(&self, desc: &ShaderBinaryDesc) -> Arc<dyn ShaderProgram> {
        self.build_from_binaries(
            desc.vertex_binary,
            desc.fragment_binary,
            desc.vertex_layout,
            desc.uniform_layout,
        )
    }

    fn create_compute_from_source(&self, source: &str) -> Arc<dyn ShaderProgram> {
        let Some(ctx) = self.ctx.as_ref() else {
            render_error!("helios::vulkan", "Compute creation before initialization");
            return Arc::new(VulkanShaderProgram::invalid(UniformLayout::default(), true));
        };
        let Some(compiler) = self.compiler.as_ref() else {
            render_error!("helios::vulkan", "No shader compiler installed for compute");
            return Arc::new(VulkanShaderProgram::invalid(UniformLayout::default(), true));
        };
        let build = || -> RenderResult<NativePipeline> {
            let binary = compiler
                .compile(source, ShaderStage::Compute)
                .map_err(|log| {
                    RenderError::BackendError(format!("Compute compilation failed: {}", log))
                })?;
            let code = spirv_words(&binary)?;
            unsafe {
                let module_info = vk::ShaderModuleCreateInfo::default().code(&code);
                let module = ctx
                    .device
                    .create_shader_module(&module_info, None)
                    .map_err(|e| RenderError::BackendError(format!("Compute module: {:?}", e)))?;

                let layout_info = vk::PipelineLayoutCreateInfo::default();
                let pipeline_layout = match ctx.device.create_pipeline_layout(&layout_info, None) {
                    Ok(layout) => layout,
                    Err(e) => {
                        ctx.device.destroy_shader_module(module, None);
                        return Err(RenderError::BackendError(format!(
                            "Compute pipeline layout: {:?}",
                            e
                        )));
                    }
                };

                let stage = vk::PipelineShaderStageCreateInfo::default()
                    .stage(vk::ShaderStageFlags::COMPUTE)
                    .module(module)
                    .name(c"main");
                let pipeline_info = vk::ComputePipelineCreateInfo::default()
                    .stage(stage)
                    .layout(pipeline_layout);
                let pipeline = ctx
                    .device
                    .create_compute_pipelines(
                        vk::PipelineCache::null(),
                        std::slice::from_ref(&pipeline_info),
                        None,
                    )
                    .map_err(|(_, e)| {
                        ctx.device.destroy_pipeline_layout(pipeline_layout, None);
                        RenderError::BackendError(format!("Compute pipeline: {:?}", e))
                    });
                ctx.device.destroy_shader_module(module, None);
                let pipeline = pipeline?[0];

                // Compute pipelines do not touch the render pass; keep a
                // null handle so teardown stays uniform
                Ok(NativePipeline {
                    pipeline,
                    pipeline_layout,
                    descriptor_set_layout: None,
                    render_pass: vk::RenderPass::null(),
                })
            }
        };
        match build() {
            Ok(native) => Arc::new(VulkanShaderProgram {
                ctx: Some(ctx.clone()),
                native: Mutex::new(Some(native)),
                uniform_layout: UniformLayout::default(),
                compute: true,
            }),
            Err(e) => {
                render_error!("helios::vulkan", "Compute program creation failed: {}", e);
                Arc::new(VulkanShaderProgram::invalid(UniformLayout::default(), true))
            }
        }
    }
}

#[cfg(test)]
#[path = "vulkan_shader_tests.rs"]
mod tests;
