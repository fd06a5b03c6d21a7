//! Error types for Sass compilation and CSS emission

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while compiling Sass modules or emitting aggregated CSS
#[derive(Error, Debug, Diagnostic)]
pub enum SassPluginError {
    /// The Sass compiler rejected a module (syntax error, unresolved import)
    #[error("failed to compile Sass module: {id}")]
    #[diagnostic(
        code(sable::sass::compile_failed),
        help("check the module for syntax errors and missing @import targets")
    )]
    Compile {
        id: String,
        #[source]
        source: Box<grass::Error>,
    },

    /// The caller-supplied post-processor failed for a module
    #[error("style processor failed for module: {id}")]
    #[diagnostic(code(sable::sass::processor_failed))]
    Processor {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    /// Creating the output directory failed
    #[error("failed to create output directory: {path}")]
    #[diagnostic(
        code(sable::sass::create_dir_failed),
        help("check filesystem permissions for the output location")
    )]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the aggregated CSS file failed
    #[error("failed to write aggregated CSS: {path}")]
    #[diagnostic(
        code(sable::sass::write_failed),
        help("check that the output path is writable")
    )]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configured output handler returned an error
    #[error("style output handler failed")]
    #[diagnostic(code(sable::sass::output_handler_failed))]
    OutputHandler {
        #[source]
        source: anyhow::Error,
    },
}

impl SassPluginError {
    pub fn compile(id: impl Into<String>, source: Box<grass::Error>) -> Self {
        Self::Compile {
            id: id.into(),
            source,
        }
    }

    pub fn processor(id: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Processor {
            id: id.into(),
            source,
        }
    }

    pub fn create_dir(path: PathBuf, source: std::io::Error) -> Self {
        Self::CreateDir { path, source }
    }

    pub fn write(path: PathBuf, source: std::io::Error) -> Self {
        Self::Write { path, source }
    }

    pub fn output_handler(source: anyhow::Error) -> Self {
        Self::OutputHandler { source }
    }
}
