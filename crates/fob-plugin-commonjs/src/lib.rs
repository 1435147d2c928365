//! Rolldown plugin implementation for fob-commonjs
//!
//! Wires the CommonJS interop layer into the Rolldown pipeline:
//!
//! - `build_start` hook: opens a fresh session for the build's entry points
//! - `resolve_id` hook: claims proxy, external and helper ids
//! - `load` hook: generates the source of those synthetic modules
//! - `transform` hook: classifies candidates and rewrites CommonJS sources
//!
//! ## Architecture
//!
//! ```text
//! build_start → CommonJsInterop::start_build → CommonJsSession
//!                                                  │
//! transform(id) ─────────── classify/rewrite ──────┤
//! load("\0commonjs-proxy-" + id) ── awaits ────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fob_commonjs::{CommonJsConfig, CommonJsRewriter};
//! use fob_plugin_commonjs::FobCommonJsPlugin;
//! use std::sync::Arc;
//!
//! # fn example(rewriter: Arc<dyn CommonJsRewriter>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = CommonJsConfig::new().with_exclude("src/esm/**");
//! let plugin = Arc::new(FobCommonJsPlugin::new(config, rewriter)?);
//! # Ok(())
//! # }
//! ```

use anyhow::Context;
use fob_commonjs::{
    CommonJsConfig, CommonJsError, CommonJsInterop, CommonJsRewriter, CommonJsSession,
    EntryInput, SyntheticId, TransformedModule,
};
use parking_lot::RwLock;
use rolldown_common::{InputItem, ModuleType};
use rolldown_plugin::{
    HookBuildStartArgs, HookLoadArgs, HookLoadOutput, HookLoadReturn, HookNoopReturn,
    HookResolveIdArgs, HookResolveIdOutput, HookResolveIdReturn, HookTransformArgs,
    HookTransformOutput, HookTransformReturn, Plugin, PluginContext,
    SharedTransformPluginContext,
};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

pub use fob_commonjs;

/// Rolldown plugin that lets ES module builds import CommonJS modules
///
/// Clones share the same interop layer and the same current session.
#[derive(Debug, Clone)]
pub struct FobCommonJsPlugin {
    interop: CommonJsInterop,
    session: Arc<RwLock<Option<Arc<CommonJsSession>>>>,
}

impl FobCommonJsPlugin {
    /// Create the plugin with the default analyzer and resolver
    pub fn new(
        config: CommonJsConfig,
        rewriter: Arc<dyn CommonJsRewriter>,
    ) -> fob_commonjs::Result<Self> {
        Ok(Self::from_interop(CommonJsInterop::new(config, rewriter)?))
    }

    pub fn from_interop(interop: CommonJsInterop) -> Self {
        Self {
            interop,
            session: Arc::new(RwLock::new(None)),
        }
    }

    pub fn interop(&self) -> &CommonJsInterop {
        &self.interop
    }

    /// Open a session for a new build, replacing the previous one.
    ///
    /// Called from `build_start`; exposed for hosts that drive the hooks
    /// themselves.
    pub async fn start_build(&self, input: impl Into<EntryInput>) -> fob_commonjs::Result<()> {
        let session = self.interop.start_build(input).await?;
        *self.session.write() = Some(Arc::new(session));
        Ok(())
    }

    /// The session of the build in progress
    pub fn session(&self) -> fob_commonjs::Result<Arc<CommonJsSession>> {
        self.session
            .read()
            .clone()
            .ok_or(CommonJsError::EntriesNotConfigured)
    }
}

impl Plugin for FobCommonJsPlugin {
    fn name(&self) -> Cow<'static, str> {
        "fob-commonjs".into()
    }

    fn register_hook_usage(&self) -> rolldown_plugin::HookUsage {
        use rolldown_plugin::HookUsage;
        HookUsage::BuildStart | HookUsage::ResolveId | HookUsage::Load | HookUsage::Transform
    }

    fn build_start(
        &self,
        _ctx: &PluginContext,
        args: &HookBuildStartArgs<'_>,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        let input = entry_input(&args.options.input);
        let plugin = self.clone();

        async move {
            debug!(entries = ?input, "[fob-commonjs] starting build");
            plugin
                .start_build(input)
                .await
                .context("Failed to start CommonJS interop for this build")?;
            Ok(())
        }
    }

    /// Claims ids in the proxy, external and helper namespaces.
    ///
    /// Proxy targets are resolved relative to the proxied importer; targets
    /// that cannot be resolved are served as external adapters.
    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs<'_>,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let specifier = args.specifier.to_string();
        let importer = args.importer.map(|s| s.to_string());
        let interop = self.interop.clone();

        async move {
            let resolved = interop
                .resolve_id(&specifier, importer.as_deref())
                .await
                .with_context(|| format!("Failed to resolve CommonJS proxy target: {specifier}"))?;

            Ok(resolved.map(|id| HookResolveIdOutput {
                id: id.into(),
                ..Default::default()
            }))
        }
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let id = args.id.to_string();
        let plugin = self.clone();

        async move {
            let synthetic = SyntheticId::parse(&id);
            if !synthetic.is_synthetic() {
                return Ok(None);
            }

            let session = plugin.session()?;
            let source = session
                .load(synthetic)
                .await
                .with_context(|| format!("Failed to generate CommonJS interop module: {id}"))?;

            Ok(source.map(load_output))
        }
    }

    fn transform(
        &self,
        _ctx: SharedTransformPluginContext,
        args: &HookTransformArgs<'_>,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let id = args.id.to_string();
        let code = args.code.to_string();
        let plugin = self.clone();

        async move {
            let session = plugin.session()?;
            let transformed = session
                .transform(&code, &id)
                .await
                .with_context(|| format!("Failed to transform CommonJS module: {id}"))?;

            Ok(transformed.map(transform_output))
        }
    }
}

/// Entry points in the order Rolldown lists them; entry names are not needed
fn entry_input(items: &[InputItem]) -> EntryInput {
    EntryInput::List(items.iter().map(|item| item.import.clone()).collect())
}

fn load_output(source: String) -> HookLoadOutput {
    HookLoadOutput {
        code: source.into(),
        module_type: Some(ModuleType::Js),
        ..Default::default()
    }
}

fn transform_output(transformed: TransformedModule) -> HookTransformOutput {
    HookTransformOutput {
        code: Some(transformed.code),
        map: transformed.map,
        side_effects: None,
        module_type: None,
    }
}
