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

//! Draws one orange triangle with OpenGL 3.3, using [`glow`] on top of [`glutin`].
//!
//! The interesting part is the [`shader`] module, which compiles and links the shader
//! program and hands every failure back as a [`Diagnostic`] instead of stopping. Everything
//! that touches the GPU goes through the [`GraphicsBackend`] trait, so the pipeline runs the
//! same against [`GlowBackend`] and against a recording backend in tests.
//!
//! [`glow`]: https://crates.io/crates/glow
//! [`glutin`]: https://crates.io/crates/glutin

pub mod backend;
pub mod config;
pub mod glow_backend;
pub mod renderer;
pub mod shader;
pub mod vertex;
pub mod window;

pub use backend::{ApiVersion, AttributeLayout, GraphicsBackend};
pub use config::{Color, PolygonMode, RenderConfig};
pub use glow_backend::{GlError, GlowBackend};
pub use renderer::{Renderer, RendererError};
pub use shader::{
    build_program, BuildFailure, Diagnostic, ShaderProgram, ShaderStage, ShaderUnit, Subject,
};
pub use vertex::{Vertex, VertexBuffer, TRIANGLE};
pub use window::{GlRenderer, GlutinSetup, SetupError};
