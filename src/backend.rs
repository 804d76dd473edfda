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

//! Defines the graphics backend used by the renderer.

use crate::config::{Color, PolygonMode};
use crate::shader::ShaderStage;

use std::error::Error;
use std::fmt;

/// The version of the current graphics context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApiVersion {
    /// The major version.
    pub major: u32,

    /// The minor version.
    pub minor: u32,

    /// Whether this is an OpenGL ES context.
    pub is_embedded: bool,
}

impl ApiVersion {
    /// OpenGL 3.3 core.
    pub const GL_33: ApiVersion = ApiVersion {
        major: 3,
        minor: 3,
        is_embedded: false,
    };

    /// OpenGL ES 3.0.
    pub const GLES_30: ApiVersion = ApiVersion {
        major: 3,
        minor: 0,
        is_embedded: true,
    };

    /// Whether this context can run the triangle shaders.
    ///
    /// That means OpenGL 3.3 or higher, or OpenGL ES 3.0 or higher.
    pub fn is_supported(&self) -> bool {
        if self.is_embedded {
            self.major >= 3
        } else {
            self.major >= 4 || (self.major >= 3 && self.minor >= 3)
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api = if self.is_embedded { "OpenGL ES" } else { "OpenGL" };
        write!(f, "{api} {}.{}", self.major, self.minor)
    }
}

/// How a vertex attribute is laid out inside the vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeLayout {
    /// The attribute location in the vertex shader.
    pub location: u32,

    /// The number of `f32` components.
    pub components: i32,

    /// The distance in bytes between two consecutive vertices.
    pub stride: i32,

    /// The offset in bytes of the attribute inside a vertex.
    pub offset: i32,
}

/// The graphics API calls made by the triangle renderer.
///
/// Every method must be called while the underlying context is current.
pub trait GraphicsBackend {
    /// A shader object.
    type Shader: Copy + fmt::Debug;

    /// A program object.
    type Program: Copy + fmt::Debug;

    /// A vertex array object.
    type VertexArray: Copy + fmt::Debug;

    /// A buffer object.
    type Buffer: Copy + fmt::Debug;

    /// The error type for object creation.
    type Error: Error + 'static;

    /// Get the version of the current context.
    fn version(&self) -> ApiVersion;

    /// Create a new shader object for the given stage.
    fn create_shader(&mut self, stage: ShaderStage) -> Result<Self::Shader, Self::Error>;

    /// Set the source of a shader and compile it.
    fn compile_shader(&mut self, shader: Self::Shader, source: &str);

    /// Whether the last compilation of the shader succeeded.
    fn shader_compile_status(&mut self, shader: Self::Shader) -> bool;

    /// Get the information log of a shader.
    fn shader_info_log(&mut self, shader: Self::Shader) -> String;

    /// Delete a shader object.
    fn delete_shader(&mut self, shader: Self::Shader);

    /// Create a new program object.
    fn create_program(&mut self) -> Result<Self::Program, Self::Error>;

    /// Attach a shader to a program.
    fn attach_shader(&mut self, program: Self::Program, shader: Self::Shader);

    /// Link a program.
    fn link_program(&mut self, program: Self::Program);

    /// Whether the last link of the program succeeded.
    fn program_link_status(&mut self, program: Self::Program) -> bool;

    /// Get the information log of a program.
    fn program_info_log(&mut self, program: Self::Program) -> String;

    /// Install a program for drawing, or uninstall it with `None`.
    fn use_program(&mut self, program: Option<Self::Program>);

    /// Delete a program object.
    fn delete_program(&mut self, program: Self::Program);

    /// Create a new vertex array object.
    fn create_vertex_array(&mut self) -> Result<Self::VertexArray, Self::Error>;

    /// Create a new buffer object.
    fn create_buffer(&mut self) -> Result<Self::Buffer, Self::Error>;

    /// Bind a vertex array, or unbind it with `None`.
    fn bind_vertex_array(&mut self, vertex_array: Option<Self::VertexArray>);

    /// Bind a buffer to the array buffer target, or unbind it with `None`.
    fn bind_array_buffer(&mut self, buffer: Option<Self::Buffer>);

    /// Upload data to the bound array buffer. The data will not change afterwards.
    fn upload_static_data(&mut self, data: &[u8]);

    /// Describe and enable a vertex attribute of the bound array buffer.
    fn vertex_attribute(&mut self, layout: AttributeLayout);

    /// Delete a vertex array object.
    fn delete_vertex_array(&mut self, vertex_array: Self::VertexArray);

    /// Delete a buffer object.
    fn delete_buffer(&mut self, buffer: Self::Buffer);

    /// Set the viewport rectangle.
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);

    /// Set how polygons are rasterized.
    fn polygon_mode(&mut self, mode: PolygonMode);

    /// Clear the color buffer.
    fn clear(&mut self, color: Color);

    /// Draw `count` vertices of the bound vertex array as a triangle list.
    fn draw_triangles(&mut self, first: i32, count: i32);
}


#[cfg(test)]
mod tests {
    use super::ApiVersion;

    #[test]
    fn version_support() {
        assert!(ApiVersion::GL_33.is_supported());
        assert!(ApiVersion::GLES_30.is_supported());
        assert!(ApiVersion {
            major: 4,
            minor: 1,
            is_embedded: false
        }
        .is_supported());

        assert!(!ApiVersion {
            major: 3,
            minor: 2,
            is_embedded: false
        }
        .is_supported());
        assert!(!ApiVersion {
            major: 2,
            minor: 0,
            is_embedded: true
        }
        .is_supported());
    }

    #[test]
    fn version_display() {
        assert_eq!(ApiVersion::GL_33.to_string(), "OpenGL 3.3");
        assert_eq!(ApiVersion::GLES_30.to_string(), "OpenGL ES 3.0");
    }
}
