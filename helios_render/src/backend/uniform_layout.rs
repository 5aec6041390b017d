//! Uniform layout description shared between binding sets and pipelines
//!
//! A `UniformLayout` enumerates the named binding slots a shader program
//! exposes. It is used both to allocate native descriptor/uniform-block
//! resources and to validate that a binding update targets an existing slot.

use bitflags::bitflags;

/// Logical type of a binding slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingType {
    /// Uniform (constant) buffer
    UniformBuffer,
    /// Storage buffer
    StorageBuffer,
    /// Sampled image
    SampledImage,
}

bitflags! {
    /// Shader stages that read a binding
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
        const COMPUTE = 1 << 2;
    }
}

/// One named binding slot
#[derive(Debug, Clone)]
pub struct UniformBinding {
    /// Binding name as it appears in the shader
    pub name: String,
    /// Slot index
    pub slot: u32,
    /// Logical binding type
    pub binding_type: BindingType,
    /// Byte size of the bound resource (0 for images)
    pub size: u64,
    /// Stages that read this binding
    pub stages: ShaderStageFlags,
}

/// Uniform input layout of a shader program
#[derive(Debug, Clone, Default)]
pub struct UniformLayout {
    /// Binding slots, in slot order
    pub bindings: Vec<UniformBinding>,
}

impl UniformLayout {
    /// Look up a binding by slot index
    pub fn binding(&self, slot: u32) -> Option<&UniformBinding> {
        self.bindings.iter().find(|b| b.slot == slot)
    }

    /// Whether a slot exists in this layout
    pub fn has_slot(&self, slot: u32) -> bool {
        self.binding(slot).is_some()
    }
}

#[cfg(test)]
#[path = "uniform_layout_tests.rs"]
mod tests;
