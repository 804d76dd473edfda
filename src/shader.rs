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

//! Compiling and linking the shader program.
//!
//! Failures here are never fatal. Every step hands back a handle (which may be unusable)
//! along with a [`Diagnostic`] describing what went wrong, and the caller decides what to
//! do about it.

use crate::backend::{ApiVersion, GraphicsBackend};

use std::fmt;

/// The body of the vertex shader, without a version header.
pub const VERTEX_SHADER: &str = include_str!("./shaders/triangle.v.glsl");

/// The body of the fragment shader, without a version header.
pub const FRAGMENT_SHADER: &str = include_str!("./shaders/triangle.f.glsl");

/// The longest information log kept in a [`Diagnostic`], in characters.
pub const MAX_LOG_LEN: usize = 512;

const EMPTY_LOG: &str = "no information log available";

/// A stage of the graphics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// The vertex stage.
    Vertex,

    /// The fragment stage.
    Fragment,

    /// A raw stage value this crate does not know about.
    Other(u32),
}

impl ShaderStage {
    /// Interpret a raw OpenGL shader type.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            glow::VERTEX_SHADER => ShaderStage::Vertex,
            glow::FRAGMENT_SHADER => ShaderStage::Fragment,
            other => ShaderStage::Other(other),
        }
    }

    /// The raw OpenGL shader type.
    pub fn as_raw(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
            ShaderStage::Other(raw) => raw,
        }
    }

    /// The label used when reporting diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VERTEX",
            ShaderStage::Fragment => "FRAGMENT",
            ShaderStage::Other(_) => "UNKNOWN",
        }
    }
}

/// Prefix a shader body with the version header the context understands.
pub fn versioned_source(version: ApiVersion, stage: ShaderStage, body: &str) -> String {
    let header = match (version.is_embedded, stage) {
        (false, _) => "#version 330 core\n",
        (true, ShaderStage::Fragment) => "#version 300 es\nprecision mediump float;\n",
        (true, _) => "#version 300 es\n",
    };

    format!("{header}{body}")
}

/// What a [`Diagnostic`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    /// A shader that failed to compile.
    Shader(ShaderStage),

    /// A program that failed to link.
    Program,
}

/// A compilation or link failure, along with the driver's information log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    subject: Subject,
    log: String,
}

impl Diagnostic {
    /// Create a new diagnostic. The log is cut down to [`MAX_LOG_LEN`] characters.
    pub fn new(subject: Subject, log: &str) -> Self {
        let log = log.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());

        let log = if log.is_empty() {
            EMPTY_LOG.to_string()
        } else {
            log.chars().take(MAX_LOG_LEN).collect()
        };

        Self { subject, log }
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    /// `VERTEX`, `FRAGMENT`, `UNKNOWN` or `PROGRAM`.
    pub fn label(&self) -> &'static str {
        match self.subject {
            Subject::Shader(stage) => stage.label(),
            Subject::Program => "PROGRAM",
        }
    }

    /// The bounded information log. Never empty.
    pub fn log(&self) -> &str {
        &self.log
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subject {
            Subject::Shader(stage) => write!(
                f,
                "ERR:SHADER::{}::COMPILATION_FAILED\n{}",
                stage.label(),
                self.log
            ),
            Subject::Program => write!(f, "ERR:SHADER::PROGRAM::LINKING_FAILED\n{}", self.log),
        }
    }
}

/// A compiled (or failed) shader stage.
///
/// Units must be handed back through [`ShaderUnit::release`] or [`release`] once they are
/// attached to a program. Dropping a unit does not delete its shader object; it leaks until
/// the context is destroyed.
#[must_use = "shader units must be released"]
pub struct ShaderUnit<B: GraphicsBackend + ?Sized> {
    stage: ShaderStage,
    source: String,
    handle: Option<B::Shader>,
    diagnostic: Option<Diagnostic>,
}

impl<B: GraphicsBackend + ?Sized> fmt::Debug for ShaderUnit<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderUnit")
            .field("stage", &self.stage)
            .field("handle", &self.handle)
            .field("diagnostic", &self.diagnostic)
            .finish_non_exhaustive()
    }
}

impl<B: GraphicsBackend + ?Sized> ShaderUnit<B> {
    /// Compile `source` for the given stage.
    pub fn compile(backend: &mut B, stage: ShaderStage, source: &str) -> Self {
        let shader = match backend.create_shader(stage) {
            Ok(shader) => shader,
            Err(err) => {
                return Self {
                    stage,
                    source: source.to_string(),
                    handle: None,
                    diagnostic: Some(Diagnostic::new(Subject::Shader(stage), &err.to_string())),
                };
            }
        };

        backend.compile_shader(shader, source);

        let diagnostic = if backend.shader_compile_status(shader) {
            None
        } else {
            let log = backend.shader_info_log(shader);
            Some(Diagnostic::new(Subject::Shader(stage), &log))
        };

        tracing::debug!(
            stage = stage.label(),
            compiled = diagnostic.is_none(),
            "compiled shader"
        );

        Self {
            stage,
            source: source.to_string(),
            handle: Some(shader),
            diagnostic,
        }
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The shader object, if the backend managed to create one.
    pub fn handle(&self) -> Option<B::Shader> {
        self.handle
    }

    pub fn is_compiled(&self) -> bool {
        self.handle.is_some() && self.diagnostic.is_none()
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        self.diagnostic.as_ref()
    }

    /// Free the shader object.
    pub fn release(self, backend: &mut B) {
        if let Some(shader) = self.handle {
            backend.delete_shader(shader);
        }
    }
}

/// Release every unit in `units`.
pub fn release<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    units: impl IntoIterator<Item = ShaderUnit<B>>,
) {
    for unit in units {
        unit.release(backend);
    }
}

/// A linked (or failed) shader program.
pub struct ShaderProgram<B: GraphicsBackend + ?Sized> {
    handle: Option<B::Program>,
    units_compiled: bool,
    diagnostic: Option<Diagnostic>,
}

impl<B: GraphicsBackend + ?Sized> fmt::Debug for ShaderProgram<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("handle", &self.handle)
            .field("units_compiled", &self.units_compiled)
            .field("diagnostic", &self.diagnostic)
            .finish()
    }
}

impl<B: GraphicsBackend + ?Sized> ShaderProgram<B> {
    /// Attach every unit to a new program and link it.
    ///
    /// Units that failed to compile are still attached as long as they have a handle; the
    /// program just won't be usable.
    pub fn link(backend: &mut B, units: &[ShaderUnit<B>]) -> Self {
        let units_compiled = units.iter().all(ShaderUnit::is_compiled);

        let program = match backend.create_program() {
            Ok(program) => program,
            Err(err) => {
                return Self {
                    handle: None,
                    units_compiled,
                    diagnostic: Some(Diagnostic::new(Subject::Program, &err.to_string())),
                };
            }
        };

        for shader in units.iter().filter_map(ShaderUnit::handle) {
            backend.attach_shader(program, shader);
        }

        backend.link_program(program);

        let diagnostic = if backend.program_link_status(program) {
            None
        } else {
            let log = backend.program_info_log(program);
            Some(Diagnostic::new(Subject::Program, &log))
        };

        tracing::debug!(linked = diagnostic.is_none(), "linked shader program");

        Self {
            handle: Some(program),
            units_compiled,
            diagnostic,
        }
    }

    /// The program object, if the backend managed to create one.
    pub fn handle(&self) -> Option<B::Program> {
        self.handle
    }

    pub fn is_linked(&self) -> bool {
        self.handle.is_some() && self.diagnostic.is_none()
    }

    /// Whether every unit compiled and the link succeeded.
    pub fn is_usable(&self) -> bool {
        self.units_compiled && self.is_linked()
    }

    /// The link failure, if any.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        self.diagnostic.as_ref()
    }

    /// Free the program object.
    pub fn delete(self, backend: &mut B) {
        if let Some(program) = self.handle {
            backend.delete_program(program);
        }
    }
}

/// A program that could not be built cleanly.
pub struct BuildFailure<B: GraphicsBackend + ?Sized> {
    program: ShaderProgram<B>,
    diagnostics: Vec<Diagnostic>,
}

impl<B: GraphicsBackend + ?Sized> BuildFailure<B> {
    /// The program, which still owns a GPU object that must be deleted.
    pub fn program(&self) -> &ShaderProgram<B> {
        &self.program
    }

    /// Every compile and link diagnostic, in pipeline order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (ShaderProgram<B>, Vec<Diagnostic>) {
        (self.program, self.diagnostics)
    }
}

impl<B: GraphicsBackend + ?Sized> fmt::Debug for BuildFailure<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildFailure")
            .field("program", &self.program)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

impl<B: GraphicsBackend + ?Sized> fmt::Display for BuildFailure<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diagnostic}")?;
        }

        Ok(())
    }
}

impl<B: GraphicsBackend + ?Sized> std::error::Error for BuildFailure<B> {}

/// Compile both stages, link them and release the stages.
///
/// The stages are released whatever the outcome.
pub fn build_program<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<ShaderProgram<B>, BuildFailure<B>> {
    let units = [
        ShaderUnit::compile(backend, ShaderStage::Vertex, vertex_source),
        ShaderUnit::compile(backend, ShaderStage::Fragment, fragment_source),
    ];

    let program = ShaderProgram::link(backend, &units);

    let mut diagnostics: Vec<Diagnostic> = units
        .iter()
        .filter_map(|unit| unit.diagnostic().cloned())
        .collect();
    diagnostics.extend(program.diagnostic().cloned());

    release(backend, units);

    if program.is_usable() {
        Ok(program)
    } else {
        Err(BuildFailure {
            program,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{Call, MockBackend, DEFAULT_COMPILE_LOG};

    const BROKEN: &str = "#version 330 core\nvoid main() {\n    gl_Position = vec4(0.0;\n";

    fn desktop(stage: ShaderStage, body: &str) -> String {
        versioned_source(ApiVersion::GL_33, stage, body)
    }

    #[test]
    fn stage_labels() {
        assert_eq!(ShaderStage::Vertex.label(), "VERTEX");
        assert_eq!(ShaderStage::Fragment.label(), "FRAGMENT");
        assert_eq!(ShaderStage::Other(0x8DD9).label(), "UNKNOWN");

        assert_eq!(ShaderStage::from_raw(glow::VERTEX_SHADER), ShaderStage::Vertex);
        assert_eq!(ShaderStage::from_raw(glow::FRAGMENT_SHADER), ShaderStage::Fragment);
        assert_eq!(ShaderStage::from_raw(0x8DD9), ShaderStage::Other(0x8DD9));
        assert_eq!(ShaderStage::Other(0x8DD9).as_raw(), 0x8DD9);
    }

    #[test]
    fn headers_follow_the_context() {
        let vertex = desktop(ShaderStage::Vertex, VERTEX_SHADER);
        assert!(vertex.starts_with("#version 330 core\n"));
        assert!(vertex.contains("layout (location = 0) in vec3 aPos;"));

        let fragment =
            versioned_source(ApiVersion::GLES_30, ShaderStage::Fragment, FRAGMENT_SHADER);
        assert!(fragment.starts_with("#version 300 es\nprecision mediump float;\n"));
        assert!(fragment.contains("FragColor = vec4(1.0, 0.5, 0.2, 1.0);"));

        let vertex = versioned_source(ApiVersion::GLES_30, ShaderStage::Vertex, VERTEX_SHADER);
        assert!(vertex.starts_with("#version 300 es\nlayout"));
    }

    #[test]
    fn valid_pair_links() {
        let mut backend = MockBackend::new();
        let program = build_program(
            &mut backend,
            &desktop(ShaderStage::Vertex, VERTEX_SHADER),
            &desktop(ShaderStage::Fragment, FRAGMENT_SHADER),
        )
        .expect("valid shaders should build");

        assert!(program.is_linked());
        assert!(program.is_usable());
        assert!(program.diagnostic().is_none());
        assert!(program.handle().is_some());
    }

    #[test]
    fn syntax_error_is_reported_per_stage() {
        let mut backend = MockBackend::new();

        let unit = ShaderUnit::compile(&mut backend, ShaderStage::Fragment, BROKEN);
        assert!(!unit.is_compiled());
        assert!(unit.handle().is_some());
        assert_eq!(unit.source(), BROKEN);

        let diagnostic = unit.diagnostic().expect("compile should fail");
        assert_eq!(diagnostic.label(), "FRAGMENT");
        assert_eq!(diagnostic.subject(), Subject::Shader(ShaderStage::Fragment));
        assert_eq!(diagnostic.log(), DEFAULT_COMPILE_LOG);
        assert!(!diagnostic.log().is_empty());
        assert!(diagnostic.log().chars().count() <= MAX_LOG_LEN);

        unit.release(&mut backend);

        let unit = ShaderUnit::compile(&mut backend, ShaderStage::Vertex, BROKEN);
        assert_eq!(unit.diagnostic().map(Diagnostic::label), Some("VERTEX"));
        unit.release(&mut backend);

        assert!(backend.state.borrow().live_shaders().is_empty());
    }

    #[test]
    fn long_logs_are_bounded() {
        let mut backend = MockBackend::new();
        backend.state.borrow_mut().compile_log = Some("é".repeat(2000));

        let unit = ShaderUnit::compile(&mut backend, ShaderStage::Vertex, BROKEN);
        let log = unit.diagnostic().map(Diagnostic::log).unwrap_or_default();
        assert_eq!(log.chars().count(), MAX_LOG_LEN);
        unit.release(&mut backend);
    }

    #[test]
    fn empty_logs_get_a_placeholder() {
        let diagnostic = Diagnostic::new(Subject::Program, "\0\n ");
        assert_eq!(diagnostic.log(), EMPTY_LOG);

        let diagnostic = Diagnostic::new(Subject::Program, "error: oops\n\0");
        assert_eq!(diagnostic.log(), "error: oops");
    }

    #[test]
    fn unknown_stage() {
        let mut backend = MockBackend::new();

        let unit = ShaderUnit::compile(&mut backend, ShaderStage::Other(0x1234), VERTEX_SHADER);
        assert!(unit.handle().is_none());
        assert!(!unit.is_compiled());

        let diagnostic = unit.diagnostic().expect("unknown stages cannot be created");
        assert_eq!(diagnostic.label(), "UNKNOWN");
        assert_eq!(diagnostic.log(), "invalid shader type");

        unit.release(&mut backend);
        assert_eq!(
            backend.state.borrow().count(|c| matches!(c, Call::DeleteShader(_))),
            0
        );
    }

    #[test]
    fn mismatched_stages_fail_to_link() {
        let mut backend = MockBackend::new();
        backend.state.borrow_mut().link_error =
            Some("error: fragment shader input `vColor' has no matching output".into());

        let failure = build_program(
            &mut backend,
            &desktop(ShaderStage::Vertex, VERTEX_SHADER),
            &desktop(ShaderStage::Fragment, FRAGMENT_SHADER),
        )
        .expect_err("link should fail");

        assert_eq!(failure.diagnostics().len(), 1);
        let diagnostic = &failure.diagnostics()[0];
        assert_eq!(diagnostic.label(), "PROGRAM");
        assert!(diagnostic.log().contains("no matching output"));

        let program = failure.program();
        assert!(program.handle().is_some());
        assert!(!program.is_linked());
        assert!(!program.is_usable());
    }

    #[test]
    fn compile_failure_makes_program_unusable() {
        let mut backend = MockBackend::new();

        let failure = build_program(
            &mut backend,
            &desktop(ShaderStage::Vertex, VERTEX_SHADER),
            BROKEN,
        )
        .expect_err("fragment stage is broken");

        let labels: Vec<_> = failure.diagnostics().iter().map(Diagnostic::label).collect();
        assert_eq!(labels, ["FRAGMENT", "PROGRAM"]);
        assert!(!failure.program().is_usable());

        let (program, _) = failure.into_parts();
        program.delete(&mut backend);
        assert_eq!(
            backend.state.borrow().count(|c| matches!(c, Call::DeleteProgram(_))),
            1
        );
    }

    #[test]
    fn units_are_released_exactly_once() {
        let fragment = desktop(ShaderStage::Fragment, FRAGMENT_SHADER);
        let cases = [
            (None, fragment.as_str()),
            (Some("error: link failed".to_string()), fragment.as_str()),
            (None, BROKEN),
        ];

        for (link_error, fragment) in cases {
            let mut backend = MockBackend::new();
            backend.state.borrow_mut().link_error = link_error;

            let _ = build_program(
                &mut backend,
                &desktop(ShaderStage::Vertex, VERTEX_SHADER),
                fragment,
            );

            let state = backend.state.borrow();
            assert!(state.live_shaders().is_empty());
            assert_eq!(state.count(|c| matches!(c, Call::CreateShader(..))), 2);
            assert_eq!(state.count(|c| matches!(c, Call::DeleteShader(_))), 2);
        }
    }

    #[test]
    fn release_happens_after_attach() {
        let mut backend = MockBackend::new();
        let _ = build_program(
            &mut backend,
            &desktop(ShaderStage::Vertex, VERTEX_SHADER),
            &desktop(ShaderStage::Fragment, FRAGMENT_SHADER),
        );

        let calls = backend.calls();
        let last_attach = calls
            .iter()
            .rposition(|c| matches!(c, Call::AttachShader(..)))
            .expect("shaders are attached");
        let first_delete = calls
            .iter()
            .position(|c| matches!(c, Call::DeleteShader(_)))
            .expect("shaders are deleted");
        assert!(last_attach < first_delete);
    }

    #[test]
    fn diagnostic_display() {
        let diagnostic = Diagnostic::new(Subject::Shader(ShaderStage::Vertex), "0:1: bad");
        assert_eq!(
            diagnostic.to_string(),
            "ERR:SHADER::VERTEX::COMPILATION_FAILED\n0:1: bad"
        );

        let diagnostic = Diagnostic::new(Subject::Program, "bad link");
        assert_eq!(
            diagnostic.to_string(),
            "ERR:SHADER::PROGRAM::LINKING_FAILED\nbad link"
        );
    }
}
