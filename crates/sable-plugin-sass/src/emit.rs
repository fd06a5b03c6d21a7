//! End-of-build CSS emission
//!
//! Runs once per build, after all modules have been transformed. The first
//! matching output rule wins:
//!
//! 1. insert off and nothing to emit (empty registry or inline output) -> no-op
//! 2. file output -> write the aggregate to disk
//! 3. callback output -> hand the aggregate to the handler
//! 4. bundle output with insert off -> emit a CSS asset named after the
//!    first chunk
//! 5. otherwise -> no-op (insert mode already delivered the CSS at runtime)

use std::path::Path;

use tracing::debug;

use crate::config::{SassPluginOptions, StyleOutput};
use crate::error::SassPluginError;
use crate::registry::StyleEntry;

/// A CSS asset destined for the bundle output
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BundleCss {
    pub filename: String,
    pub source: String,
}

/// Apply the output policy to the aggregated CSS.
///
/// Returns `Some(BundleCss)` only when the CSS should be added to the
/// bundle as an asset; file writes and callback invocations happen here.
pub(crate) async fn emit_styles(
    options: &SassPluginOptions,
    css: String,
    entries: Vec<StyleEntry>,
    bundle_name: Option<&str>,
) -> Result<Option<BundleCss>, SassPluginError> {
    if !options.insert && (entries.is_empty() || matches!(options.output, StyleOutput::Inline)) {
        return Ok(None);
    }

    match &options.output {
        StyleOutput::File(path) => {
            write_css(path, &css)?;
            debug!("[sable-sass] wrote {} bytes to {}", css.len(), path.display());
            Ok(None)
        }
        StyleOutput::Callback(handler) => {
            handler
                .write(css, entries)
                .await
                .map_err(SassPluginError::output_handler)?;
            Ok(None)
        }
        StyleOutput::Bundle if !options.insert => Ok(bundle_name.map(|name| BundleCss {
            filename: css_sibling(name),
            source: css,
        })),
        _ => Ok(None),
    }
}

/// Write CSS to `path`, creating parent directories first. Full-file
/// overwrite, UTF-8.
fn write_css(path: &Path, css: &str) -> Result<(), SassPluginError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|source| SassPluginError::create_dir(parent.to_path_buf(), source))?;
        }
    }
    std::fs::write(path, css).map_err(|source| SassPluginError::write(path.to_path_buf(), source))
}

/// Derive a CSS sibling name from a chunk filename: strip a trailing
/// `.js`/`.ts` and append `.css`.
fn css_sibling(name: &str) -> String {
    let stem = name
        .strip_suffix(".js")
        .or_else(|| name.strip_suffix(".ts"))
        .unwrap_or(name);
    format!("{stem}.css")
}
