// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `glow-triangle`.
//
// `glow-triangle` is free software: you can redistribute it and/or modify it under the
// terms of either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
//   version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `glow-triangle` is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE. See the GNU Lesser General Public License or the Mozilla Public License for more
// details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `glow-triangle`. If not, see <https://www.gnu.org/licenses/>.

//! Vertex data and the GPU buffer that holds it.

use crate::backend::{AttributeLayout, GraphicsBackend};

use std::fmt;
use std::mem;

/// The vertex type.
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Vertex {
    /// The position in normalized device coordinates.
    pub position: [f32; 3],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
        }
    }

    /// The layout of [`Vertex::position`], fed to `layout (location = 0)`.
    pub fn position_layout() -> AttributeLayout {
        AttributeLayout {
            location: 0,
            components: 3,
            stride: mem::size_of::<Vertex>() as i32,
            offset: bytemuck::offset_of!(Vertex, position) as i32,
        }
    }
}

/// The triangle that gets drawn.
pub const TRIANGLE: [Vertex; 3] = [
    // left foot
    Vertex::new(-0.5, -0.5, 0.0),
    // right foot
    Vertex::new(0.5, -0.5, 0.0),
    // tip
    Vertex::new(0.0, 0.5, 0.0),
];

/// A vertex array object and the buffer it reads from.
///
/// The contents are uploaded once and never change.
pub struct VertexBuffer<B: GraphicsBackend + ?Sized> {
    vao: B::VertexArray,
    vbo: B::Buffer,
    len: usize,
}

impl<B: GraphicsBackend + ?Sized> fmt::Debug for VertexBuffer<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexBuffer")
            .field("vao", &self.vao)
            .field("vbo", &self.vbo)
            .field("len", &self.len)
            .finish()
    }
}

impl<B: GraphicsBackend + ?Sized> VertexBuffer<B> {
    /// Upload `vertices` into a new buffer.
    pub fn new(backend: &mut B, vertices: &[Vertex]) -> Result<Self, B::Error> {
        let vao = backend.create_vertex_array()?;
        let vbo = match backend.create_buffer() {
            Ok(vbo) => vbo,
            Err(err) => {
                backend.delete_vertex_array(vao);
                return Err(err);
            }
        };

        // The VAO records the buffer binding and attribute layout.
        backend.bind_vertex_array(Some(vao));
        backend.bind_array_buffer(Some(vbo));
        backend.upload_static_data(bytemuck::cast_slice(vertices));
        backend.vertex_attribute(Vertex::position_layout());
        backend.bind_array_buffer(None);
        backend.bind_vertex_array(None);

        tracing::debug!(vertices = vertices.len(), "uploaded vertex buffer");

        Ok(Self {
            vao,
            vbo,
            len: vertices.len(),
        })
    }

    /// The number of vertices.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Draw every vertex as a triangle list. The vertex array is unbound afterwards.
    pub fn draw(&self, backend: &mut B) {
        backend.bind_vertex_array(Some(self.vao));
        backend.draw_triangles(0, self.len as i32);
        backend.bind_vertex_array(None);
    }

    pub fn delete(self, backend: &mut B) {
        backend.delete_vertex_array(self.vao);
        backend.delete_buffer(self.vbo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{Call, MockBackend};

    #[test]
    fn position_layout() {
        let layout = Vertex::position_layout();
        assert_eq!(layout.location, 0);
        assert_eq!(layout.components, 3);
        assert_eq!(layout.stride, 12);
        assert_eq!(layout.offset, 0);
    }

    #[test]
    fn triangle_data() {
        let floats: &[f32] = bytemuck::cast_slice(&TRIANGLE);
        assert_eq!(
            floats,
            [-0.5, -0.5, 0.0, 0.5, -0.5, 0.0, 0.0, 0.5, 0.0]
        );
    }

    #[test]
    fn upload_sequence() {
        let mut backend = MockBackend::new();
        let buffer = VertexBuffer::new(&mut backend, &TRIANGLE).expect("mock never fails");
        assert_eq!(buffer.len(), 3);
        assert!(!buffer.is_empty());

        let bytes = bytemuck::cast_slice::<_, u8>(&TRIANGLE).to_vec();
        assert_eq!(bytes.len(), 36);
        assert_eq!(
            backend.calls(),
            [
                Call::CreateVertexArray(1),
                Call::CreateBuffer(2),
                Call::BindVertexArray(Some(1)),
                Call::BindArrayBuffer(Some(2)),
                Call::UploadStaticData(bytes),
                Call::VertexAttribute(Vertex::position_layout()),
                Call::BindArrayBuffer(None),
                Call::BindVertexArray(None),
            ]
        );
    }

    #[test]
    fn draw_binds_and_unbinds() {
        let mut backend = MockBackend::new();
        let buffer = VertexBuffer::new(&mut backend, &TRIANGLE).expect("mock never fails");
        backend.state.borrow_mut().calls.clear();

        buffer.draw(&mut backend);
        assert_eq!(
            backend.calls(),
            [
                Call::BindVertexArray(Some(1)),
                Call::DrawTriangles(0, 3),
                Call::BindVertexArray(None),
            ]
        );

        buffer.delete(&mut backend);
        assert_eq!(
            backend.calls()[3..],
            [Call::DeleteVertexArray(1), Call::DeleteBuffer(2)]
        );
    }

    #[test]
    fn failed_buffer_cleans_up() {
        let mut backend = MockBackend::new();
        backend.state.borrow_mut().fail_buffers = true;

        let err = VertexBuffer::new(&mut backend, &TRIANGLE).expect_err("buffers fail");
        assert_eq!(err.to_string(), "out of memory");
        assert_eq!(
            backend.calls(),
            [Call::CreateVertexArray(1), Call::DeleteVertexArray(1)]
        );
    }
}
