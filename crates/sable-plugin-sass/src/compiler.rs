//! Per-module Sass compilation
//!
//! Builds the effective `grass` configuration for one module (global
//! preamble, load paths, syntax mode) and runs the compiler. Compilation is
//! synchronous; the async boundary lives in the plugin hooks.

use std::path::{Path, PathBuf};

use crate::config::CompilerOptions;
use crate::error::SassPluginError;

/// Resolve the syntax mode for a module.
///
/// An explicit `indented_syntax` setting always wins; otherwise the `.sass`
/// extension (ASCII case-insensitive) selects indented syntax.
pub(crate) fn uses_indented_syntax(id: &str, explicit: Option<bool>) -> bool {
    match explicit {
        Some(indented) => indented,
        None => Path::new(id)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("sass"))
            .unwrap_or(false),
    }
}

/// Load paths for a module: caller-configured paths first, then the source
/// file's directory, then the process working directory.
fn load_paths(id: &str, options: &CompilerOptions) -> Vec<PathBuf> {
    let mut paths = options.include_paths.clone();
    if let Some(dir) = Path::new(id).parent() {
        if !dir.as_os_str().is_empty() {
            paths.push(dir.to_path_buf());
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd);
    }
    paths
}

/// Compile one Sass module to CSS.
///
/// The global preamble (`options.data`) is prepended to the source before
/// compilation so shared variables and mixins are visible in every module.
/// Compiler errors are propagated unchanged; there is no retry and no
/// partial result.
pub fn compile(id: &str, source: &str, options: &CompilerOptions) -> Result<String, SassPluginError> {
    let input = match &options.data {
        Some(preamble) => {
            let mut merged = String::with_capacity(preamble.len() + source.len());
            merged.push_str(preamble);
            merged.push_str(source);
            merged
        }
        None => source.to_string(),
    };

    let syntax = if uses_indented_syntax(id, options.indented_syntax) {
        grass::InputSyntax::Sass
    } else {
        grass::InputSyntax::Scss
    };

    let paths = load_paths(id, options);
    let grass_options = grass::Options::default()
        .style(options.style)
        .quiet(options.quiet)
        .input_syntax(syntax)
        .load_paths(&paths);

    grass::from_string(input, &grass_options)
        .map_err(|source| SassPluginError::compile(id, source))
}
