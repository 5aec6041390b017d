//! Vertex layout description shared between meshes and pipelines
//!
//! A `VertexLayout` is created once and shared immutably: the pipeline's
//! vertex-input stage and the mesh's attribute bindings must be derived
//! from the same layout instance to remain consistent.

/// Component type of a vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexComponent {
    /// 32-bit float
    F32,
    /// 32-bit unsigned integer
    U32,
    /// 32-bit signed integer
    I32,
    /// 8-bit unsigned normalized
    U8Norm,
}

impl VertexComponent {
    /// Size in bytes of one component
    pub fn size_bytes(&self) -> u32 {
        match self {
            VertexComponent::F32 | VertexComponent::U32 | VertexComponent::I32 => 4,
            VertexComponent::U8Norm => 1,
        }
    }
}

/// Format of a vertex attribute (component type x component count)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexFormat {
    /// Component type
    pub component: VertexComponent,
    /// Number of components (1-4)
    pub count: u32,
}

impl VertexFormat {
    pub const FLOAT2: Self = Self { component: VertexComponent::F32, count: 2 };
    pub const FLOAT3: Self = Self { component: VertexComponent::F32, count: 3 };
    pub const FLOAT4: Self = Self { component: VertexComponent::F32, count: 4 };

    /// Size in bytes of the whole attribute
    pub fn size_bytes(&self) -> u32 {
        self.component.size_bytes() * self.count
    }
}

/// One attribute of a vertex format
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute {
    /// Attribute location in the shader
    pub location: u32,
    /// Format of the attribute (component type and count)
    pub format: VertexFormat,
    /// Offset in bytes from the start of the vertex
    pub offset: u32,
}

/// Vertex input layout
///
/// Describes one interleaved vertex stream. Vertex counts are re-derived
/// from `byte_size / stride` when mesh data is uploaded.
#[derive(Debug, Clone, Default)]
pub struct VertexLayout {
    /// Vertex attributes
    pub attributes: Vec<VertexAttribute>,
    /// Stride in bytes between consecutive vertices
    pub stride: u32,
}

impl VertexLayout {
    /// Build a layout from ordered attribute formats, packing offsets tightly
    pub fn from_formats(formats: &[VertexFormat]) -> Self {
        let mut attributes = Vec::with_capacity(formats.len());
        let mut offset = 0u32;
        for (location, format) in formats.iter().enumerate() {
            attributes.push(VertexAttribute {
                location: location as u32,
                format: *format,
                offset,
            });
            offset += format.size_bytes();
        }
        Self {
            attributes,
            stride: offset,
        }
    }

    /// Number of vertices a byte buffer of this layout holds
    pub fn vertex_count(&self, byte_size: usize) -> u32 {
        if self.stride == 0 {
            return 0;
        }
        (byte_size as u64 / self.stride as u64) as u32
    }
}

#[cfg(test)]
#[path = "vertex_layout_tests.rs"]
mod tests;
