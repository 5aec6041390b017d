//! Uniform bindings - Vulkan implementation
//!
//! A binding set owns one descriptor set per frame in flight plus one
//! host-visible buffer per uniform slot per frame, so frame N+1 can write
//! its uniforms while the GPU still reads frame N's copies. Descriptor
//! sets are allocated from a pool owned by the manager and reclaimed when
//! the pool is destroyed at backend teardown.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use ash::vk;
use rustc_hash::FxHashMap;

use helios_render::backend::{
    BindingType, BufferKind, BufferUsage, GpuBuffer, ShaderProgram, UniformBinding,
    UniformBindingSet, UniformLayout, UniformManager,
};
use helios_render::{render_debug, render_error};

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_context::{GpuContext, MAX_FRAMES_IN_FLIGHT};
use crate::vulkan_shader::VulkanShaderProgram;

/// Vulkan uniform binding set
pub struct VulkanUniformBindingSet {
    ctx: Option<Arc<GpuContext>>,
    layout: UniformLayout,
    /// One descriptor set per frame in flight
    sets: Vec<vk::DescriptorSet>,
    /// Per-slot per-frame uniform buffers owned by the set
    owned: FxHashMap<u32, Vec<VulkanBuffer>>,
    /// Externally attached buffers, kept alive while bound
    external: Mutex<FxHashMap<u32, Arc<dyn GpuBuffer>>>,
    valid: AtomicBool,
}

impl VulkanUniformBindingSet {
    fn invalid(layout: UniformLayout) -> Self {
        Self {
            ctx: None,
            layout,
            sets: Vec::new(),
            owned: FxHashMap::default(),
            external: Mutex::new(FxHashMap::default()),
            valid: AtomicBool::new(false),
        }
    }

    /// Descriptor set for a frame slot
    pub(crate) fn descriptor_set(&self, frame_index: u32) -> Option<vk::DescriptorSet> {
        if !self.valid.load(Ordering::Acquire) {
            return None;
        }
        self.sets.get(frame_index as usize).copied()
    }

    /// Owned uniform buffer for a slot and frame
    fn owned_buffer(&self, slot: u32, frame_index: u32) -> Option<&VulkanBuffer> {
        self.owned
            .get(&slot)
            .and_then(|frames| frames.get(frame_index as usize))
    }

    fn write_descriptor(&self, slot: u32, frame_index: usize, buffer: vk::Buffer, range: u64) {
        let (Some(ctx), Some(&set)) = (self.ctx.as_ref(), self.sets.get(frame_index)) else {
            return;
        };
        let Some(binding) = self.layout.binding(slot) else {
            return;
        };
        let buffer_info = vk::DescriptorBufferInfo {
            buffer,
            offset: 0,
            range,
        };
        let descriptor_type = match binding.binding_type {
            BindingType::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
            BindingType::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
            BindingType::SampledImage => return,
        };
        let write = vk::WriteDescriptorSet::default()
            .dst_set(set)
            .dst_binding(slot)
            .descriptor_type(descriptor_type)
            .buffer_info(std::slice::from_ref(&buffer_info));
        unsafe { ctx.device.update_descriptor_sets(std::slice::from_ref(&write), &[]) };
    }
}

impl UniformBindingSet for VulkanUniformBindingSet {
    fn update_buffer(&self, slot: u32, buffer: &Arc<dyn GpuBuffer>, size: u64) {
        if !self.valid.load(Ordering::Acquire) {
            render_error!("helios::vulkan", "update_buffer on invalid binding set");
            return;
        }
        let Some(binding) = self.layout.binding(slot) else {
            render_error!("helios::vulkan", "update_buffer: slot {} not in layout", slot);
            return;
        };
        if size > binding.size {
            render_error!(
                "helios::vulkan",
                "update_buffer: size {} exceeds slot {} size {}",
                size,
                slot,
                binding.size
            );
            return;
        }
        let Some(vk_buffer) = buffer.as_any().downcast_ref::<VulkanBuffer>() else {
            render_error!("helios::vulkan", "update_buffer: buffer from another backend");
            return;
        };
        let Some(raw) = vk_buffer.raw() else {
            render_error!("helios::vulkan", "update_buffer: destroyed buffer");
            return;
        };
        // The attached buffer replaces the owned copy for every frame
        for frame_index in 0..self.sets.len() {
            self.write_descriptor(slot, frame_index, raw, size);
        }
        if let Ok(mut external) = self.external.lock() {
            external.insert(slot, buffer.clone());
        }
    }

    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    fn destroy(&self) {
        if !self.valid.swap(false, Ordering::AcqRel) {
            return;
        }
        // Descriptor sets are reclaimed with the manager's pool; only the
        // owned buffers are released here
        for buffers in self.owned.values() {
            for buffer in buffers {
                buffer.destroy();
            }
        }
        if let Ok(mut external) = self.external.lock() {
            external.clear();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanUniformBindingSet {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Vulkan uniform resource factory
pub struct VulkanUniformManager {
    ctx: Option<Arc<GpuContext>>,
    pool: Option<vk::DescriptorPool>,
}

impl VulkanUniformManager {
    pub(crate) fn new() -> Self {
        Self { ctx: None, pool: None }
    }

    pub(crate) fn attach(&mut self, ctx: Arc<GpuContext>) {
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: 1024,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::STORAGE_BUFFER,
                descriptor_count: 256,
            },
        ];
        let info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(1024);
        match unsafe { ctx.device.create_descriptor_pool(&info, None) } {
            Ok(pool) => self.pool = Some(pool),
            Err(e) => {
                render_error!("helios::vulkan", "Descriptor pool creation failed: {:?}", e);
            }
        }
        self.ctx = Some(ctx);
    }

    pub(crate) fn detach(&mut self) {
        if let (Some(ctx), Some(pool)) = (self.ctx.as_ref(), self.pool.take()) {
            unsafe { ctx.device.destroy_descriptor_pool(pool, None) };
        }
        self.ctx = None;
    }
}

impl UniformManager for VulkanUniformManager {
    fn create_uniform_buffer(&self, name: &str, binding: &UniformBinding) -> Arc<dyn GpuBuffer> {
        let Some(ctx) = self.ctx.as_ref() else {
            render_error!("helios::vulkan", "create_uniform_buffer before initialization");
            return Arc::new(VulkanBuffer::invalid(
                BufferKind::Uniform,
                BufferUsage::Dynamic,
                binding.size,
            ));
        };
        if binding.binding_type != BindingType::UniformBuffer {
            render_error!(
                "helios::vulkan",
                "create_uniform_buffer: binding '{}' is not a uniform buffer",
                name
            );
            return Arc::new(VulkanBuffer::invalid(
                BufferKind::Uniform,
                BufferUsage::Dynamic,
                binding.size,
            ));
        }
        render_debug!(
            "helios::vulkan",
            "Creating uniform buffer '{}' ({} bytes, slot {})",
            name,
            binding.size,
            binding.slot
        );
        match VulkanBuffer::create(
            ctx.clone(),
            BufferKind::Uniform,
            BufferUsage::Dynamic,
            binding.size,
            None,
        ) {
            Ok(buffer) => Arc::new(buffer),
            Err(e) => {
                render_error!("helios::vulkan", "Uniform buffer creation failed: {}", e);
                Arc::new(VulkanBuffer::invalid(
                    BufferKind::Uniform,
                    BufferUsage::Dynamic,
                    binding.size,
                ))
            }
        }
    }

    fn create_binding_for_shader(
        &self,
        program: &Arc<dyn ShaderProgram>,
    ) -> Arc<dyn UniformBindingSet> {
        let layout = program.uniform_layout().clone();
        let (Some(ctx), Some(pool)) = (self.ctx.as_ref(), self.pool) else {
            render_error!("helios::vulkan", "create_binding_for_shader before initialization");
            return Arc::new(VulkanUniformBindingSet::invalid(layout));
        };
        let Some(vk_program) = program.as_any().downcast_ref::<VulkanShaderProgram>() else {
            render_error!("helios::vulkan", "create_binding_for_shader: foreign program");
            return Arc::new(VulkanUniformBindingSet::invalid(layout));
        };
        let Some(set_layout) = vk_program.raw_descriptor_set_layout() else {
            render_error!(
                "helios::vulkan",
                "create_binding_for_shader: program has no bindings or is invalid"
            );
            return Arc::new(VulkanUniformBindingSet::invalid(layout));
        };

        let set_layouts = [set_layout; MAX_FRAMES_IN_FLIGHT];
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(pool)
            .set_layouts(&set_layouts);
        let sets = match unsafe { ctx.device.allocate_descriptor_sets(&alloc_info) } {
            Ok(sets) => sets,
            Err(e) => {
                render_error!("helios::vulkan", "Descriptor set allocation failed: {:?}", e);
                return Arc::new(VulkanUniformBindingSet::invalid(layout));
            }
        };

        // One host-visible buffer per uniform slot per frame in flight
        let mut owned: FxHashMap<u32, Vec<VulkanBuffer>> = FxHashMap::default();
        for binding in &layout.bindings {
            if binding.binding_type != BindingType::UniformBuffer {
                continue;
            }
            let mut frames = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
            for _ in 0..MAX_FRAMES_IN_FLIGHT {
                match VulkanBuffer::create(
                    ctx.clone(),
                    BufferKind::Uniform,
                    BufferUsage::Dynamic,
                    binding.size,
                    None,
                ) {
                    Ok(buffer) => frames.push(buffer),
                    Err(e) => {
                        render_error!(
                            "helios::vulkan",
                            "Per-frame uniform buffer for slot {} failed: {}",
                            binding.slot,
                            e
                        );
                        return Arc::new(VulkanUniformBindingSet::invalid(layout));
                    }
                }
            }
            owned.insert(binding.slot, frames);
        }

        let set = VulkanUniformBindingSet {
            ctx: Some(ctx.clone()),
            layout,
            sets,
            owned,
            external: Mutex::new(FxHashMap::default()),
            valid: AtomicBool::new(true),
        };
        // Point every frame's descriptors at the owned buffers
        for binding in &set.layout.bindings {
            if binding.binding_type != BindingType::UniformBuffer {
                continue;
            }
            for frame_index in 0..MAX_FRAMES_IN_FLIGHT {
                if let Some(buffer) = set.owned_buffer(binding.slot, frame_index as u32) {
                    if let Some(raw) = buffer.raw() {
                        set.write_descriptor(binding.slot, frame_index, raw, binding.size);
                    }
                }
            }
        }
        Arc::new(set)
    }

    fn update_uniform_buffer(
        &self,
        set: &Arc<dyn UniformBindingSet>,
        slot: u32,
        frame_index: u32,
        data: &[u8],
    ) {
        let Some(vk_set) = set.as_any().downcast_ref::<VulkanUniformBindingSet>() else {
            render_error!("helios::vulkan", "update_uniform_buffer: foreign binding set");
            return;
        };
        if frame_index as usize >= MAX_FRAMES_IN_FLIGHT {
            render_error!(
                "helios::vulkan",
                "update_uniform_buffer: frame index {} out of range",
                frame_index
            );
            return;
        }
        let Some(buffer) = vk_set.owned_buffer(slot, frame_index) else {
            render_error!("helios::vulkan", "update_uniform_buffer: no buffer at slot {}", slot);
            return;
        };
        buffer.set_data(0, data);
    }
}

#[cfg(test)]
#[path = "vulkan_descriptor_tests.rs"]
mod tests;
