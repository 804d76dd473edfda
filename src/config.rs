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

//! Settings that stay fixed for the whole session.

/// An RGBA color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// The background behind the triangle.
    pub const SKY: Color = Color::rgba(0.5, 1.0, 1.0, 1.0);

    /// The color the fragment shader paints the triangle with.
    pub const ORANGE: Color = Color::rgba(1.0, 0.5, 0.2, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// How polygons are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonMode {
    /// Fill the interior.
    #[default]
    Fill,

    /// Only draw the edges.
    Line,
}

/// The rendering setup, passed once to the renderer before the loop starts.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Initial window width, in logical pixels.
    pub width: u32,

    /// Initial window height, in logical pixels.
    pub height: u32,

    /// The window title.
    pub title: String,

    /// The color the framebuffer is cleared to every frame.
    pub clear_color: Color,

    /// Rasterization mode for the whole session.
    pub polygon_mode: PolygonMode,

    /// Whether to wait for vertical sync when presenting.
    pub vsync: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Lets Learn OpenGL".into(),
            clear_color: Color::SKY,
            polygon_mode: PolygonMode::Fill,
            vsync: true,
        }
    }
}

impl RenderConfig {
    /// Draw only the triangle's edges.
    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.polygon_mode = if wireframe {
            PolygonMode::Line
        } else {
            PolygonMode::Fill
        };
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Whether only edges are drawn.
    pub fn is_wireframe(&self) -> bool {
        self.polygon_mode == PolygonMode::Line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RenderConfig::default();
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.clear_color, Color::rgba(0.5, 1.0, 1.0, 1.0));
        assert_eq!(config.polygon_mode, PolygonMode::Fill);
        assert!(!config.is_wireframe());
        assert!(config.vsync);
    }

    #[test]
    fn wireframe_toggle() {
        let config = RenderConfig::default().with_wireframe(true);
        assert_eq!(config.polygon_mode, PolygonMode::Line);

        let config = config.with_wireframe(false);
        assert_eq!(config.polygon_mode, PolygonMode::Fill);
    }

    #[test]
    fn orange_matches_the_fragment_shader() {
        let Color { r, g, b, a } = Color::ORANGE;
        let literal = format!("vec4({r:?}, {g:?}, {b:?}, {a:?})");
        assert!(crate::shader::FRAGMENT_SHADER.contains(&literal));
    }

    #[test]
    fn builder_overrides() {
        let config = RenderConfig::default()
            .with_size(1024, 768)
            .with_title("triangle")
            .with_clear_color(Color::ORANGE)
            .with_vsync(false);

        assert_eq!((config.width, config.height), (1024, 768));
        assert_eq!(config.title, "triangle");
        assert_eq!(config.clear_color, Color::ORANGE);
        assert!(!config.vsync);
    }
}
