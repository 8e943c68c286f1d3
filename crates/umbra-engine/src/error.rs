//! Error taxonomy.
//!
//! Every fatal condition is returned to the caller; nothing here is retried.

use std::fmt;

use thiserror::Error;

use crate::paint::ParseColorError;
use crate::render::{PassKind, UniformId};

pub use crate::render::TypeMismatchError;

/// Shader stage named in compile diagnostics.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProgramStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ProgramStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProgramStage::Vertex => "vertex",
            ProgramStage::Fragment => "fragment",
        })
    }
}

/// The engine could not obtain what it needs to draw at all.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("no compatible GPU adapter: {0}")]
    NoAdapter(String),

    #[error("failed to create GPU device: {0}")]
    Device(String),

    #[error("failed to set up the drawing surface: {0}")]
    Surface(String),

    #[error("drawing surface has zero size")]
    ZeroSizedSurface,

    #[error("background image could not be decoded: {0}")]
    BackgroundDecode(#[from] image::ImageError),

    #[error("background image has zero size")]
    EmptyBackground,

    #[error("background decoder exited without delivering an image")]
    DecoderGone,
}

/// A program failed to compile or link. `log` holds the diagnostic verbatim.
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error("{stage} shader of `{label}` failed to parse:\n{log}")]
    Parse {
        label: String,
        stage: ProgramStage,
        log: String,
    },

    #[error("{stage} shader of `{label}` failed validation:\n{log}")]
    Validate {
        label: String,
        stage: ProgramStage,
        log: String,
    },

    #[error("program `{label}` failed to link: {log}")]
    Link { label: String, log: String },
}

impl CompileError {
    pub fn log(&self) -> &str {
        match self {
            CompileError::Parse { log, .. }
            | CompileError::Validate { log, .. }
            | CompileError::Link { log, .. } => log,
        }
    }
}

/// The map asset violates its invariants.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("map asset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("map extent must be finite and positive, got {width} x {height}")]
    InvalidExtent { width: f32, height: f32 },

    #[error("wall polyline {polyline} has a non-finite point at index {index}")]
    NonFinitePoint { polyline: usize, index: usize },

    #[error("light {index}: {reason}")]
    InvalidLight { index: usize, reason: String },

    #[error("light {index}: {source}")]
    LightColor {
        index: usize,
        #[source]
        source: ParseColorError,
    },
}

/// Errors surfaced by `Engine` operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatchError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error("{pass:?} pass does not declare uniform `{}`", .uniform.name())]
    UnknownUniform { pass: PassKind, uniform: UniformId },

    #[error("graphics context lost; the engine must be rebuilt")]
    ContextLost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_exposes_log() {
        let err = CompileError::Link {
            label: "light".into(),
            log: "fragment entry point `fs_main` not found".into(),
        };
        assert_eq!(err.log(), "fragment entry point `fs_main` not found");
        assert!(err.to_string().contains("light"));
    }

    #[test]
    fn unknown_uniform_names_member() {
        let err = EngineError::UnknownUniform {
            pass: PassKind::Background,
            uniform: UniformId::LightColor,
        };
        assert!(err.to_string().contains("light_color"));
    }
}
