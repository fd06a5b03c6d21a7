//! Sass plugin configuration types

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::registry::StyleEntry;

/// Where aggregated CSS goes at the end of a build.
#[derive(Default, Clone)]
pub enum StyleOutput {
    /// Each module default-exports its own compiled CSS string; nothing is
    /// aggregated at the end of the build.
    #[default]
    Inline,
    /// Write the aggregate to this path, creating parent directories as
    /// needed and replacing any existing file.
    File(PathBuf),
    /// Hand the aggregate (plus a snapshot of the per-module entries) to a
    /// caller-supplied handler.
    Callback(Arc<dyn OutputHandler>),
    /// Emit the aggregate as an asset in the bundle, named after the first
    /// chunk with its `.js`/`.ts` suffix swapped for `.css`.
    Bundle,
}

impl fmt::Debug for StyleOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => f.write_str("Inline"),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Bundle => f.write_str("Bundle"),
        }
    }
}

/// Caller-supplied post-processing step applied to each module's compiled
/// CSS before it is recorded (e.g. an autoprefixer).
#[async_trait]
pub trait StyleProcessor: Send + Sync {
    /// Receives the compiled CSS and the module id, returns the CSS to
    /// record in its place.
    async fn process(&self, css: String, id: &str) -> anyhow::Result<String>;
}

/// Receives the aggregated CSS at the end of the build when
/// [`StyleOutput::Callback`] is configured.
#[async_trait]
pub trait OutputHandler: Send + Sync {
    async fn write(&self, css: String, entries: Vec<StyleEntry>) -> anyhow::Result<()>;
}

/// Options forwarded to the `grass` compiler for every module.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Source text prepended to every compiled module (global variables,
    /// shared mixins). Mirrors the `data` field of node-sass configs.
    pub data: Option<String>,

    /// Extra load paths searched for `@import`/`@use` targets. The source
    /// file's directory and the process working directory are always
    /// appended after these.
    pub include_paths: Vec<PathBuf>,

    /// Force indented (`.sass`) or SCSS syntax. When unset, the file
    /// extension decides.
    pub indented_syntax: Option<bool>,

    /// Output style for generated CSS
    pub style: grass::OutputStyle,

    /// Silence `@warn` and `@debug` messages
    pub quiet: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            data: None,
            include_paths: Vec::new(),
            indented_syntax: None,
            style: grass::OutputStyle::Expanded,
            quiet: false,
        }
    }
}

/// Configuration for Sass processing
#[derive(Clone, Default)]
pub struct SassPluginOptions {
    /// Substring patterns a module id must match to be processed. Empty
    /// means every `.sass`/`.scss` module is eligible.
    pub include: Vec<String>,

    /// Substring patterns that exclude a module id. Defaults to
    /// `node_modules`.
    pub exclude: Vec<String>,

    /// Destination for aggregated CSS
    pub output: StyleOutput,

    /// Inject compiled CSS into the document at runtime instead of
    /// exporting it from the module.
    pub insert: bool,

    /// Optional async post-processor applied per module
    pub processor: Option<Arc<dyn StyleProcessor>>,

    /// Passthrough compiler configuration
    pub compiler: CompilerOptions,
}

impl fmt::Debug for SassPluginOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SassPluginOptions")
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("output", &self.output)
            .field("insert", &self.insert)
            .field("processor", &self.processor.as_ref().map(|_| ".."))
            .field("compiler", &self.compiler)
            .finish()
    }
}

impl SassPluginOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self {
            exclude: vec!["node_modules".to_string()],
            ..Self::default()
        }
    }

    /// Add an include pattern
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include.push(pattern.into());
        self
    }

    /// Add an exclude pattern
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Set the output destination
    pub fn with_output(mut self, output: StyleOutput) -> Self {
        self.output = output;
        self
    }

    /// Enable runtime style injection
    pub fn with_insert(mut self, insert: bool) -> Self {
        self.insert = insert;
        self
    }

    /// Set the per-module CSS post-processor
    pub fn with_processor(mut self, processor: Arc<dyn StyleProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Set passthrough compiler options
    pub fn with_compiler(mut self, compiler: CompilerOptions) -> Self {
        self.compiler = compiler;
        self
    }
}
