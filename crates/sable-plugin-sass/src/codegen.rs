//! Generated JavaScript module bodies
//!
//! Every eligible Sass module is replaced by a small JavaScript module whose
//! shape depends on configuration: it either default-exports the compiled
//! CSS string, invokes the runtime injection helper with it, or exports an
//! empty string when the CSS is delivered separately at the end of the
//! build.

use crate::config::StyleOutput;

/// Virtual module id of the runtime injection helper. The `\0` prefix marks
/// it as plugin-owned so other resolvers leave it alone.
pub(crate) const INJECT_STYLE_ID: &str = "\0sable-sass:inject-style.js";

/// Source of the runtime helper, served through the `load` hook whenever a
/// generated module imports [`INJECT_STYLE_ID`].
pub(crate) const INJECT_STYLE_SOURCE: &str = include_str!("runtime/inject_style.js");

/// Module body for a module whose compiled CSS is empty or whitespace-only.
pub(crate) fn empty_body() -> String {
    "export default \"\";\n".to_string()
}

/// Module body for a module with non-empty compiled CSS.
///
/// The CSS is embedded as a JSON string literal, which is also a valid
/// JavaScript string literal.
pub(crate) fn module_body(
    css: &str,
    insert: bool,
    output: &StyleOutput,
) -> Result<String, serde_json::Error> {
    let encoded = serde_json::to_string(css)?;

    if insert {
        let helper = serde_json::to_string(INJECT_STYLE_ID)?;
        return Ok(format!(
            "import injectStyle from {helper};\nexport default injectStyle({encoded});\n"
        ));
    }

    match output {
        StyleOutput::Inline => Ok(format!("export default {encoded};\n")),
        // CSS travels through the end-of-build aggregation instead
        _ => Ok(empty_body()),
    }
}
