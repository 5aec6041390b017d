//! Mesh - OpenGL implementation of the Mesh trait
//!
//! A mesh owns one VAO, one vertex buffer and an optional index buffer.
//! The VAO captures the attribute layout at creation, so drawing is a
//! single VAO bind plus a draw call.

use std::any::Any;
use std::cell::Cell;
use std::sync::Arc;

use glow::HasContext;

use helios_render::backend::{IndexType, Mesh, VertexComponent, VertexLayout};
use helios_render::{render_error, render_warn};

/// GL element type for an index type
pub(crate) fn gl_index_type(index_type: IndexType) -> u32 {
    match index_type {
        IndexType::U16 => glow::UNSIGNED_SHORT,
        IndexType::U32 => glow::UNSIGNED_INT,
    }
}

/// GL component type and whether it is fed through the normalized
/// fixed-point path or the integer path
pub(crate) fn gl_component(component: VertexComponent) -> (u32, bool, bool) {
    match component {
        VertexComponent::F32 => (glow::FLOAT, false, false),
        VertexComponent::U8Norm => (glow::UNSIGNED_BYTE, true, false),
        VertexComponent::U32 => (glow::UNSIGNED_INT, false, true),
        VertexComponent::I32 => (glow::INT, false, true),
    }
}

/// OpenGL mesh
pub struct GlMesh {
    gl: Option<Arc<glow::Context>>,
    vao: Cell<Option<glow::VertexArray>>,
    vertex_buffer: Cell<Option<glow::Buffer>>,
    index_buffer: Cell<Option<glow::Buffer>>,
    layout: VertexLayout,
    index_type: IndexType,
    vertex_count: Cell<u32>,
    index_count: Cell<u32>,
}

impl GlMesh {
    pub(crate) fn new(gl: Arc<glow::Context>, layout: VertexLayout, index_type: IndexType) -> Self {
        let native = unsafe {
            match (gl.create_vertex_array(), gl.create_buffer()) {
                (Ok(vao), Ok(vertex_buffer)) => {
                    gl.bind_vertex_array(Some(vao));
                    gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
                    for attribute in &layout.attributes {
                        let (gl_type, normalized, integer) =
                            gl_component(attribute.format.component);
                        let count = attribute.format.count as i32;
                        let stride = layout.stride as i32;
                        let offset = attribute.offset as i32;
                        if integer {
                            gl.vertex_attrib_pointer_i32(
                                attribute.location,
                                count,
                                gl_type,
                                stride,
                                offset,
                            );
                        } else {
                            gl.vertex_attrib_pointer_f32(
                                attribute.location,
                                count,
                                gl_type,
                                normalized,
                                stride,
                                offset,
                            );
                        }
                        gl.enable_vertex_attrib_array(attribute.location);
                    }
                    gl.bind_vertex_array(None);
                    gl.bind_buffer(glow::ARRAY_BUFFER, None);
                    Some((vao, vertex_buffer))
                }
                _ => {
                    render_error!("helios::gl", "Mesh creation failed: VAO/buffer allocation");
                    None
                }
            }
        };
        let (vao, vertex_buffer) = match native {
            Some((vao, vertex_buffer)) => (Some(vao), Some(vertex_buffer)),
            None => (None, None),
        };
        Self {
            gl: Some(gl),
            vao: Cell::new(vao),
            vertex_buffer: Cell::new(vertex_buffer),
            index_buffer: Cell::new(None),
            layout,
            index_type,
            vertex_count: Cell::new(0),
            index_count: Cell::new(0),
        }
    }

    pub(crate) fn invalid(layout: VertexLayout, index_type: IndexType) -> Self {
        Self {
            gl: None,
            vao: Cell::new(None),
            vertex_buffer: Cell::new(None),
            index_buffer: Cell::new(None),
            layout,
            index_type,
            vertex_count: Cell::new(0),
            index_count: Cell::new(0),
        }
    }

    /// Bind the mesh's VAO for drawing
    pub(crate) fn bind(&self) -> bool {
        let (Some(gl), Some(vao)) = (self.gl.as_ref(), self.vao.get()) else {
            return false;
        };
        unsafe { gl.bind_vertex_array(Some(vao)) };
        true
    }
}

impl Mesh for GlMesh {
    fn set_vertex_data(&self, data: &[u8]) {
        let (Some(gl), Some(buffer)) = (self.gl.as_ref(), self.vertex_buffer.get()) else {
            render_warn!("helios::gl", "set_vertex_data on invalid mesh ignored");
            return;
        };
        unsafe {
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
        self.vertex_count.set(self.layout.vertex_count(data.len()));
    }

    fn set_index_data(&self, data: &[u8]) {
        let (Some(gl), Some(vao)) = (self.gl.as_ref(), self.vao.get()) else {
            render_warn!("helios::gl", "set_index_data on invalid mesh ignored");
            return;
        };
        unsafe {
            let buffer = match self.index_buffer.get() {
                Some(buffer) => buffer,
                None => match gl.create_buffer() {
                    Ok(buffer) => {
                        self.index_buffer.set(Some(buffer));
                        buffer
                    }
                    Err(e) => {
                        render_error!("helios::gl", "Index buffer creation failed: {}", e);
                        return;
                    }
                },
            };
            // Bind through the VAO so it captures the element buffer
            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer));
            gl.buffer_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, data, glow::STATIC_DRAW);
            gl.bind_vertex_array(None);
        }
        self.index_count
            .set(data.len() as u32 / self.index_type.size_bytes());
    }

    fn vertex_count(&self) -> u32 {
        self.vertex_count.get()
    }

    fn index_count(&self) -> u32 {
        self.index_count.get()
    }

    fn index_type(&self) -> IndexType {
        self.index_type
    }

    fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    fn is_valid(&self) -> bool {
        self.vao.get().is_some()
    }

    fn destroy(&self) {
        let Some(gl) = self.gl.as_ref() else {
            return;
        };
        unsafe {
            if let Some(vao) = self.vao.take() {
                gl.delete_vertex_array(vao);
            }
            if let Some(buffer) = self.vertex_buffer.take() {
                gl.delete_buffer(buffer);
            }
            if let Some(buffer) = self.index_buffer.take() {
                gl.delete_buffer(buffer);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for GlMesh {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "gl_mesh_tests.rs"]
mod tests;
