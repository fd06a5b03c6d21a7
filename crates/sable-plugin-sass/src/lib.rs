//! Rolldown plugin implementation for Sass
//!
//! This module provides a Rolldown plugin that compiles `.sass`/`.scss`
//! modules to CSS with the `grass` compiler and routes the result per
//! configuration. It uses the `transform` hook to replace each stylesheet
//! module with a small generated JavaScript module, and the
//! `generate_bundle` hook to emit the aggregated CSS once at the end of the
//! build.
//!
//! ## Architecture
//!
//! ```text
//! .scss file → transform() → grass compile → processor → StyleRegistry
//!                                ↓
//!              generated JS module (inline export / runtime inject / "")
//!
//! generate_bundle() → aggregate registry → file / callback / bundle asset
//! ```
//!
//! Per-module transforms may complete in any order; the registry pins each
//! module's position when it is first compiled, so the aggregated CSS is
//! deterministic across builds.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use sable_plugin_sass::{SableSassPlugin, SassPluginOptions, StyleOutput};
//! use std::sync::Arc;
//!
//! let options = SassPluginOptions::new()
//!     .with_output(StyleOutput::File("dist/bundle.css".into()));
//! let plugin = Arc::new(SableSassPlugin::with_options(options));
//! ```

use anyhow::Context;
use parking_lot::Mutex;
use rolldown_common::{ModuleType, Output, OutputAsset};
use rolldown_plugin::{
    HookGenerateBundleArgs, HookLoadArgs, HookLoadOutput, HookLoadReturn, HookNoopReturn,
    HookResolveIdArgs, HookResolveIdOutput, HookResolveIdReturn, HookTransformArgs,
    HookTransformOutput, HookTransformReturn, HookUsage, Plugin, PluginContext,
    SharedTransformPluginContext,
};
use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

mod codegen;
mod compiler;
mod config;
mod emit;
mod error;
mod registry;

pub use compiler::compile;
pub use config::{
    CompilerOptions, OutputHandler, SassPluginOptions, StyleOutput, StyleProcessor,
};
pub use error::SassPluginError;
pub use registry::{StyleEntry, StyleRegistry};

/// Rolldown plugin that compiles Sass modules to CSS
///
/// Each eligible module is compiled with `grass`, optionally post-processed,
/// and recorded in a shared registry. The generated JavaScript module either
/// exports the CSS, injects it at runtime, or exports an empty string when
/// the CSS is aggregated and emitted at the end of the build.
///
/// The registry lives for the lifetime of the plugin instance: repeated
/// builds with the same instance refresh entries in place rather than
/// appending duplicates.
#[derive(Debug, Clone)]
pub struct SableSassPlugin {
    /// Configuration options for Sass processing
    options: SassPluginOptions,

    /// Shared registry of compiled styles
    /// Thread-safe to allow concurrent transforms
    registry: Arc<Mutex<StyleRegistry>>,
}

impl SableSassPlugin {
    /// Create a new SableSassPlugin with default options
    ///
    /// # Example
    ///
    /// ```rust
    /// use sable_plugin_sass::SableSassPlugin;
    ///
    /// let plugin = SableSassPlugin::new();
    /// ```
    pub fn new() -> Self {
        Self {
            options: SassPluginOptions::new(),
            registry: Arc::new(Mutex::new(StyleRegistry::new())),
        }
    }

    /// Create a new SableSassPlugin with custom options
    ///
    /// # Example
    ///
    /// ```rust
    /// use sable_plugin_sass::{SableSassPlugin, SassPluginOptions};
    ///
    /// let options = SassPluginOptions::new().with_insert(true);
    /// let plugin = SableSassPlugin::with_options(options);
    /// ```
    pub fn with_options(options: SassPluginOptions) -> Self {
        Self {
            options,
            registry: Arc::new(Mutex::new(StyleRegistry::new())),
        }
    }

    /// Snapshot of the styles recorded so far, in first-seen order
    pub fn styles(&self) -> Vec<StyleEntry> {
        self.registry.lock().snapshot()
    }

    /// Check if a module should be processed
    ///
    /// The extension must be `.sass` or `.scss`, the id must not match an
    /// exclude pattern, and when include patterns are configured the id
    /// must match one of them.
    fn is_eligible(&self, id: &str) -> bool {
        let is_sass = Path::new(id)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("sass") || ext.eq_ignore_ascii_case("scss"))
            .unwrap_or(false);
        if !is_sass {
            return false;
        }

        if self
            .options
            .exclude
            .iter()
            .any(|pattern| id.contains(pattern.as_str()))
        {
            return false;
        }

        if !self.options.include.is_empty() {
            return self
                .options
                .include
                .iter()
                .any(|pattern| id.contains(pattern.as_str()));
        }

        true
    }

    /// Compile one module and produce its generated JavaScript body.
    ///
    /// Returns `None` for ineligible modules. Exactly one compiler
    /// invocation per call; the registry is only touched when the compiled
    /// CSS is non-empty.
    async fn compile_module(&self, id: &str, source: &str) -> anyhow::Result<Option<String>> {
        if !self.is_eligible(id) {
            return Ok(None);
        }

        let css = compiler::compile(id, source, &self.options.compiler)?;

        if css.trim().is_empty() {
            debug!("[sable-sass] {} compiled to empty CSS", id);
            return Ok(Some(codegen::empty_body()));
        }

        // Pin the module's position before suspending so aggregate order
        // follows compile order, not processor completion order.
        self.registry.lock().reserve(id);

        let css = match &self.options.processor {
            Some(processor) => processor
                .process(css, id)
                .await
                .map_err(|source| SassPluginError::processor(id, source))?,
            None => css,
        };

        debug!("[sable-sass] compiled {} ({} bytes)", id, css.len());
        self.registry.lock().record(id, css.clone());

        let body = codegen::module_body(&css, self.options.insert, &self.options.output)
            .with_context(|| format!("Failed to encode compiled CSS for: {}", id))?;
        Ok(Some(body))
    }
}

impl Default for SableSassPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for SableSassPlugin {
    /// Returns the plugin name for debugging and logging
    fn name(&self) -> Cow<'static, str> {
        "sable-sass".into()
    }

    /// Declare which hooks this plugin uses
    ///
    /// This allows Rolldown to optimize by skipping unused hooks.
    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId | HookUsage::Load | HookUsage::Transform | HookUsage::GenerateBundle
    }

    /// Resolve ID hook - claims the virtual runtime helper module
    ///
    /// Generated modules in insert mode import the injection helper by a
    /// `\0`-prefixed id that only this plugin can resolve.
    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs<'_>,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let specifier = args.specifier.to_string();

        async move {
            if specifier == codegen::INJECT_STYLE_ID {
                return Ok(Some(HookResolveIdOutput {
                    id: specifier.into(),
                    ..Default::default()
                }));
            }
            Ok(None)
        }
    }

    /// Load hook - serves the runtime helper module and raw Sass sources
    ///
    /// Eligible `.sass`/`.scss` files are read here with `ModuleType::Js`
    /// so Rolldown accepts the extension; the transform hook replaces the
    /// Sass source with a generated JavaScript body before parsing.
    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let id = args.id.to_string();
        let options = self.options.clone();

        async move {
            if id == codegen::INJECT_STYLE_ID {
                return Ok(Some(HookLoadOutput {
                    code: codegen::INJECT_STYLE_SOURCE.into(),
                    module_type: Some(ModuleType::Js),
                    ..Default::default()
                }));
            }

            let plugin = SableSassPlugin::with_options(options);
            if !plugin.is_eligible(&id) {
                return Ok(None);
            }

            let source = std::fs::read_to_string(&id)
                .with_context(|| format!("Failed to read Sass file: {}", id))?;

            Ok(Some(HookLoadOutput {
                code: source.into(),
                module_type: Some(ModuleType::Js),
                ..Default::default()
            }))
        }
    }

    /// Transform hook - compiles Sass modules and replaces them with
    /// generated JavaScript
    ///
    /// # Returns
    ///
    /// - `Ok(Some(output))` - Module was compiled and replaced
    /// - `Ok(None)` - Module not handled by this plugin
    /// - `Err(e)` - Compilation or post-processing error
    fn transform(
        &self,
        _ctx: SharedTransformPluginContext,
        args: &HookTransformArgs<'_>,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let id = args.id.to_string();
        let code = args.code.to_string();
        let options = self.options.clone();
        let registry = self.registry.clone();

        async move {
            // Reconstruct plugin from captured fields
            let plugin = SableSassPlugin { options, registry };

            let Some(body) = plugin
                .compile_module(&id, &code)
                .await
                .with_context(|| format!("Failed to compile Sass module: {}", id))?
            else {
                return Ok(None);
            };

            Ok(Some(HookTransformOutput {
                code: Some(body),
                map: None,
                side_effects: None,
                module_type: Some(ModuleType::Js),
            }))
        }
    }

    /// Generate bundle hook - emits the aggregated CSS once per build
    ///
    /// Applies the output policy to a snapshot of the registry: write to a
    /// file, invoke the output handler, or add a CSS asset to the bundle.
    fn generate_bundle(
        &self,
        _ctx: &PluginContext,
        args: &mut HookGenerateBundleArgs<'_>,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        let options = self.options.clone();
        let registry = self.registry.clone();

        async move {
            // Snapshot before any await; the guard must not be held across
            // suspension points.
            let (css, entries) = {
                let registry = registry.lock();
                (registry.aggregate(), registry.snapshot())
            };
            let original_ids: Vec<String> =
                entries.iter().map(|entry| entry.id.clone()).collect();

            let bundle_name = args.bundle.iter().find_map(|output| match output {
                Output::Chunk(chunk) => Some(chunk.filename.to_string()),
                Output::Asset(_) => None,
            });

            let emitted =
                emit::emit_styles(&options, css, entries, bundle_name.as_deref()).await?;

            if let Some(asset) = emitted {
                debug!("[sable-sass] emitting bundle asset {}", asset.filename);
                args.bundle.push(Output::Asset(Arc::new(OutputAsset {
                    names: vec![],
                    original_file_names: original_ids,
                    filename: asset.filename.into(),
                    source: asset.source.into(),
                })));
            }

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;

    #[test]
    fn test_plugin_creation() {
        let plugin = SableSassPlugin::new();
        assert_eq!(plugin.name(), "sable-sass");
    }

    #[test]
    fn test_plugin_with_options() {
        let options = SassPluginOptions::new().with_insert(true);
        let plugin = SableSassPlugin::with_options(options);
        assert_eq!(plugin.name(), "sable-sass");
        assert!(plugin.options.insert);
    }

    #[test]
    fn test_plugin_default() {
        let plugin = SableSassPlugin::default();
        assert_eq!(plugin.name(), "sable-sass");
    }

    #[test]
    fn test_eligibility_requires_sass_extension() {
        let plugin = SableSassPlugin::new();
        assert!(plugin.is_eligible("src/app.scss"));
        assert!(plugin.is_eligible("src/app.sass"));
        assert!(plugin.is_eligible("src/APP.SCSS"));
        assert!(!plugin.is_eligible("src/app.css"));
        assert!(!plugin.is_eligible("src/app.js"));
        assert!(!plugin.is_eligible("src/scss"));
    }

    #[test]
    fn test_eligibility_exclusions() {
        let plugin = SableSassPlugin::new();
        assert!(!plugin.is_eligible("node_modules/pkg/styles.scss"));

        let plugin =
            SableSassPlugin::with_options(SassPluginOptions::new().exclude("vendor/"));
        assert!(!plugin.is_eligible("vendor/styles.scss"));
        assert!(plugin.is_eligible("src/styles.scss"));
    }

    #[test]
    fn test_eligibility_inclusions() {
        let plugin =
            SableSassPlugin::with_options(SassPluginOptions::new().include("src/"));
        assert!(plugin.is_eligible("src/styles.scss"));
        assert!(!plugin.is_eligible("lib/styles.scss"));
    }

    #[tokio::test]
    async fn test_compile_module_inline_exports_css() {
        let plugin = SableSassPlugin::new();
        let body = plugin
            .compile_module("app.scss", ".a { color: red; }")
            .await
            .unwrap()
            .expect("eligible module");

        assert!(body.starts_with("export default \""));
        assert!(body.contains("color: red"));

        let styles = plugin.styles();
        assert_eq!(styles.len(), 1);
        assert_eq!(styles[0].id, "app.scss");
    }

    #[tokio::test]
    async fn test_compile_module_insert_invokes_helper() {
        let plugin =
            SableSassPlugin::with_options(SassPluginOptions::new().with_insert(true));
        let body = plugin
            .compile_module("app.scss", ".a { color: red; }")
            .await
            .unwrap()
            .expect("eligible module");

        assert!(body.contains("import injectStyle from"));
        assert!(body.contains("injectStyle("));
    }

    #[tokio::test]
    async fn test_compile_module_file_output_exports_empty() {
        let options = SassPluginOptions::new()
            .with_output(StyleOutput::File(PathBuf::from("out.css")));
        let plugin = SableSassPlugin::with_options(options);
        let body = plugin
            .compile_module("app.scss", ".a { color: red; }")
            .await
            .unwrap()
            .expect("eligible module");

        assert_eq!(body, "export default \"\";\n");
        // CSS is still recorded for end-of-build aggregation
        assert_eq!(plugin.styles().len(), 1);
    }

    #[tokio::test]
    async fn test_compile_module_empty_css_skips_registry() {
        let plugin = SableSassPlugin::new();
        let body = plugin
            .compile_module("empty.scss", "// just a comment\n")
            .await
            .unwrap()
            .expect("eligible module");

        assert_eq!(body, "export default \"\";\n");
        assert!(plugin.styles().is_empty());
    }

    #[tokio::test]
    async fn test_compile_module_ineligible_returns_none() {
        let plugin = SableSassPlugin::new();
        let result = plugin
            .compile_module("app.css", ".a { color: red; }")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_compile_module_error_propagates() {
        let plugin = SableSassPlugin::new();
        let result = plugin.compile_module("broken.scss", ".a { color: ; }").await;
        assert!(result.is_err());
        assert!(plugin.styles().is_empty());
    }

    #[tokio::test]
    async fn test_recompile_updates_in_place() {
        let plugin = SableSassPlugin::new();
        plugin
            .compile_module("a.scss", ".a { color: red; }")
            .await
            .unwrap();
        plugin
            .compile_module("b.scss", ".b { color: blue; }")
            .await
            .unwrap();
        plugin
            .compile_module("a.scss", ".a { color: green; }")
            .await
            .unwrap();

        let styles = plugin.styles();
        assert_eq!(styles.len(), 2);
        assert_eq!(styles[0].id, "a.scss");
        assert!(styles[0].content.contains("green"));
        assert_eq!(styles[1].id, "b.scss");
    }

    struct Uppercase;

    #[async_trait]
    impl StyleProcessor for Uppercase {
        async fn process(&self, css: String, _id: &str) -> anyhow::Result<String> {
            Ok(css.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_processor_runs_before_recording() {
        let options = SassPluginOptions::new().with_processor(Arc::new(Uppercase));
        let plugin = SableSassPlugin::with_options(options);
        plugin
            .compile_module("app.scss", ".a { color: red; }")
            .await
            .unwrap();

        let styles = plugin.styles();
        assert!(styles[0].content.contains("COLOR: RED"));
    }

    struct FailingProcessor;

    #[async_trait]
    impl StyleProcessor for FailingProcessor {
        async fn process(&self, _css: String, _id: &str) -> anyhow::Result<String> {
            anyhow::bail!("postcss exploded")
        }
    }

    #[tokio::test]
    async fn test_processor_error_propagates() {
        let options = SassPluginOptions::new().with_processor(Arc::new(FailingProcessor));
        let plugin = SableSassPlugin::with_options(options);
        let result = plugin.compile_module("app.scss", ".a { color: red; }").await;
        assert!(result.is_err());
    }
}
