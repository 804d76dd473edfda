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

//! The [`GraphicsBackend`] implementation for [`glow`].
//!
//! [`glow`]: https://crates.io/crates/glow

use crate::backend::{ApiVersion, AttributeLayout, GraphicsBackend};
use crate::config::{Color, PolygonMode};
use crate::shader::ShaderStage;

use glow::HasContext;

use std::fmt;

/// A wrapper around a `glow` context.
pub struct GlowBackend<H: HasContext> {
    context: H,
}

impl<H: HasContext> GlowBackend<H> {
    /// Wrap a [`glow`] context.
    ///
    /// # Safety
    ///
    /// The context must be current whenever this backend is used, including when it is
    /// dropped along with the renderer that owns it.
    pub unsafe fn new(context: H) -> Self {
        Self { context }
    }

    /// Get a reference to the underlying [`glow`] context.
    pub fn context(&self) -> &H {
        &self.context
    }
}

/// An error from `glow` object creation.
#[derive(Debug)]
pub struct GlError(String);

impl From<String> for GlError {
    fn from(s: String) -> Self {
        GlError(s)
    }
}

impl fmt::Display for GlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gl error: {}", self.0)
    }
}

impl std::error::Error for GlError {}

impl<H: HasContext> GraphicsBackend for GlowBackend<H> {
    type Shader = H::Shader;
    type Program = H::Program;
    type VertexArray = H::VertexArray;
    type Buffer = H::Buffer;
    type Error = GlError;

    fn version(&self) -> ApiVersion {
        let version = self.context.version();

        ApiVersion {
            major: version.major,
            minor: version.minor,
            is_embedded: version.is_embedded,
        }
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Result<Self::Shader, Self::Error> {
        let shader = unsafe { self.context.create_shader(stage.as_raw()).gl_err() };

        // An unknown stage sets GL_INVALID_ENUM; don't let it leak into later checks.
        gl_error(&self.context);

        shader
    }

    fn compile_shader(&mut self, shader: Self::Shader, source: &str) {
        unsafe {
            self.context.shader_source(shader, source);
            self.context.compile_shader(shader);
        }
    }

    fn shader_compile_status(&mut self, shader: Self::Shader) -> bool {
        unsafe { self.context.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&mut self, shader: Self::Shader) -> String {
        unsafe { self.context.get_shader_info_log(shader) }
    }

    fn delete_shader(&mut self, shader: Self::Shader) {
        unsafe {
            self.context.delete_shader(shader);
        }
    }

    fn create_program(&mut self) -> Result<Self::Program, Self::Error> {
        unsafe { self.context.create_program().gl_err() }
    }

    fn attach_shader(&mut self, program: Self::Program, shader: Self::Shader) {
        unsafe {
            self.context.attach_shader(program, shader);
        }
    }

    fn link_program(&mut self, program: Self::Program) {
        unsafe {
            self.context.link_program(program);
        }
    }

    fn program_link_status(&mut self, program: Self::Program) -> bool {
        unsafe { self.context.get_program_link_status(program) }
    }

    fn program_info_log(&mut self, program: Self::Program) -> String {
        unsafe { self.context.get_program_info_log(program) }
    }

    fn use_program(&mut self, program: Option<Self::Program>) {
        unsafe {
            self.context.use_program(program);
        }
    }

    fn delete_program(&mut self, program: Self::Program) {
        unsafe {
            self.context.delete_program(program);
        }
    }

    fn create_vertex_array(&mut self) -> Result<Self::VertexArray, Self::Error> {
        unsafe { self.context.create_vertex_array().gl_err() }
    }

    fn create_buffer(&mut self) -> Result<Self::Buffer, Self::Error> {
        unsafe { self.context.create_buffer().gl_err() }
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<Self::VertexArray>) {
        unsafe {
            self.context.bind_vertex_array(vertex_array);
        }
    }

    fn bind_array_buffer(&mut self, buffer: Option<Self::Buffer>) {
        unsafe {
            self.context.bind_buffer(glow::ARRAY_BUFFER, buffer);
        }
    }

    fn upload_static_data(&mut self, data: &[u8]) {
        unsafe {
            self.context
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW);
        }

        gl_error(&self.context);
    }

    fn vertex_attribute(&mut self, layout: AttributeLayout) {
        unsafe {
            self.context.vertex_attrib_pointer_f32(
                layout.location,
                layout.components,
                glow::FLOAT,
                false,
                layout.stride,
                layout.offset,
            );
            self.context.enable_vertex_attrib_array(layout.location);
        }

        gl_error(&self.context);
    }

    fn delete_vertex_array(&mut self, vertex_array: Self::VertexArray) {
        unsafe {
            self.context.delete_vertex_array(vertex_array);
        }
    }

    fn delete_buffer(&mut self, buffer: Self::Buffer) {
        unsafe {
            self.context.delete_buffer(buffer);
        }
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe {
            self.context.viewport(x, y, width, height);
        }
    }

    fn polygon_mode(&mut self, mode: PolygonMode) {
        // Not available on OpenGL ES; everything is filled there.
        if self.context.version().is_embedded {
            if mode != PolygonMode::Fill {
                tracing::warn!("polygon mode {mode:?} is not supported on OpenGL ES");
            }
            return;
        }

        let mode = match mode {
            PolygonMode::Fill => glow::FILL,
            PolygonMode::Line => glow::LINE,
        };

        unsafe {
            self.context.polygon_mode(glow::FRONT_AND_BACK, mode);
        }

        gl_error(&self.context);
    }

    fn clear(&mut self, color: Color) {
        unsafe {
            self.context.clear_color(color.r, color.g, color.b, color.a);
            self.context.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    fn draw_triangles(&mut self, first: i32, count: i32) {
        unsafe {
            self.context.draw_arrays(glow::TRIANGLES, first, count);
        }

        gl_error(&self.context);
    }
}

fn gl_error(h: &impl HasContext) {
    let err = unsafe { h.get_error() };

    if err != glow::NO_ERROR {
        let error_str = match err {
            glow::INVALID_ENUM => "GL_INVALID_ENUM",
            glow::INVALID_VALUE => "GL_INVALID_VALUE",
            glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
            glow::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
            glow::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
            glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
            glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
            glow::CONTEXT_LOST => "GL_CONTEXT_LOST",
            _ => "Unknown GL error",
        };

        tracing::error!("GL error: {}", error_str)
    }
}

trait ResultExt<T, E> {
    fn gl_err(self) -> Result<T, GlError>;
}

impl<T, E: Into<GlError>> ResultExt<T, E> for Result<T, E> {
    fn gl_err(self) -> Result<T, GlError> {
        self.map_err(Into::into)
    }
}
