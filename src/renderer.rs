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

//! Draws the triangle.

use crate::backend::{ApiVersion, GraphicsBackend};
use crate::config::{Color, RenderConfig};
use crate::shader::{self, Diagnostic, ShaderProgram, ShaderStage};
use crate::vertex::{VertexBuffer, TRIANGLE};

use std::error::Error;
use std::fmt;

/// A failure that leaves nothing to render with.
#[derive(Debug)]
pub enum RendererError<E> {
    /// The context is older than OpenGL 3.3 or OpenGL ES 3.0.
    UnsupportedVersion(ApiVersion),

    /// The backend could not create a GPU object.
    Backend(E),
}

impl<E: fmt::Display> fmt::Display for RendererError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RendererError::UnsupportedVersion(version) => write!(
                f,
                "{version} is not supported, OpenGL 3.3 (or OpenGL ES 3.0) or higher is required"
            ),
            RendererError::Backend(err) => write!(f, "failed to create GPU resources: {err}"),
        }
    }
}

impl<E: Error + 'static> Error for RendererError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RendererError::UnsupportedVersion(_) => None,
            RendererError::Backend(err) => Some(err),
        }
    }
}

/// Owns the backend and every GPU object needed to draw the triangle.
///
/// The context must be current whenever a method is called and when this is dropped.
pub struct Renderer<B: GraphicsBackend> {
    program: Option<ShaderProgram<B>>,
    vertices: Option<VertexBuffer<B>>,
    diagnostics: Vec<Diagnostic>,
    clear_color: Color,
    backend: B,
}

impl<B: GraphicsBackend> Renderer<B> {
    /// Set up everything needed to draw.
    ///
    /// Shader failures are not errors here; they are kept in
    /// [`shader_diagnostics`](Self::shader_diagnostics) and the program is used anyway.
    pub fn new(mut backend: B, config: &RenderConfig) -> Result<Self, RendererError<B::Error>> {
        let version = backend.version();
        if !version.is_supported() {
            return Err(RendererError::UnsupportedVersion(version));
        }

        tracing::info!("rendering with {version}");

        let vertices =
            VertexBuffer::new(&mut backend, &TRIANGLE).map_err(RendererError::Backend)?;

        let vertex_source =
            shader::versioned_source(version, ShaderStage::Vertex, shader::VERTEX_SHADER);
        let fragment_source =
            shader::versioned_source(version, ShaderStage::Fragment, shader::FRAGMENT_SHADER);

        let (program, diagnostics) =
            match shader::build_program(&mut backend, &vertex_source, &fragment_source) {
                Ok(program) => (program, Vec::new()),
                Err(failure) => failure.into_parts(),
            };

        // Applied once for the whole session.
        backend.polygon_mode(config.polygon_mode);
        backend.viewport(0, 0, clamp_size(config.width), clamp_size(config.height));

        Ok(Self {
            program: Some(program),
            vertices: Some(vertices),
            diagnostics,
            clear_color: config.clear_color,
            backend,
        })
    }

    /// Compile and link failures from setup. Empty when the program is usable.
    pub fn shader_diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_program_usable(&self) -> bool {
        self.program.as_ref().map_or(false, ShaderProgram::is_usable)
    }

    /// Map rendering onto the whole framebuffer.
    pub fn resize(&mut self, width: u32, height: u32) {
        tracing::trace!(width, height, "resizing viewport");
        self.backend.viewport(0, 0, clamp_size(width), clamp_size(height));
    }

    /// Clear the framebuffer and draw the triangle.
    pub fn draw_frame(&mut self) {
        self.backend.clear(self.clear_color);

        let program = self.program.as_ref().and_then(ShaderProgram::handle);
        let Some(vertices) = &self.vertices else {
            return;
        };

        self.backend.use_program(program);
        vertices.draw(&mut self.backend);
        self.backend.use_program(None);
    }
}

fn clamp_size(size: u32) -> i32 {
    i32::try_from(size).unwrap_or(i32::MAX)
}

impl<B: GraphicsBackend> Drop for Renderer<B> {
    fn drop(&mut self) {
        if let Some(vertices) = self.vertices.take() {
            vertices.delete(&mut self.backend);
        }

        if let Some(program) = self.program.take() {
            program.delete(&mut self.backend);
        }
    }
}
