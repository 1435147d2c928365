//! Build sessions: classification, rewriting and synthetic module loading
//!
//! ```text
//! start_build(input) ──► entry set (resolved once, lazily)
//!        │
//! transform(code, id) ──► filter ──► analyze ──► ES module?  ── record shape, null
//!        │                                   └─► rewrite ──► CommonJS: true
//!        │                                              └──► no idioms: null
//!        ▼
//! registry[id] (future) ◄── load(proxy id) awaits it, then picks a proxy shape
//! ```
//!
//! A [`CommonJsInterop`] holds configuration and collaborators and outlives
//! builds. Each build gets a fresh [`CommonJsSession`], which owns all the
//! mutable per-build state.

use crate::analyzer::{ModuleAnalyzer, OxcModuleAnalyzer};
use crate::config::{CommonJsConfig, EntryInput};
use crate::entries::{EntrySet, resolve_entries};
use crate::error::{CommonJsError, Result};
use crate::filter::ModuleFilter;
use crate::ids::{HELPERS_SOURCE, SyntheticId};
use crate::memo::Memo;
use crate::proxy::{ProxyShape, external_source, proxy_source};
use crate::registry::ClassificationRegistry;
use crate::resolver::{ModuleResolver, NodeModuleResolver, resolve_or_lexical};
use crate::rewrite::{CommonJsRewriter, RewriteRequest, TransformedModule};
use crate::tracker::{ExportShape, ModuleKindTracker};
use futures::future;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Long-lived CommonJS interop configuration and collaborators
#[derive(Clone)]
pub struct CommonJsInterop {
    config: Arc<CommonJsConfig>,
    cwd: PathBuf,
    filter: Arc<ModuleFilter>,
    analyzer: Arc<dyn ModuleAnalyzer>,
    rewriter: Arc<dyn CommonJsRewriter>,
    resolver: Arc<dyn ModuleResolver>,
}

impl CommonJsInterop {
    /// Create the interop layer with the default oxc-based analyzer and
    /// resolver.
    pub fn new(config: CommonJsConfig, rewriter: Arc<dyn CommonJsRewriter>) -> Result<Self> {
        let cwd = match &config.cwd {
            Some(cwd) => cwd.clone(),
            None => std::env::current_dir()
                .map_err(|e| CommonJsError::WorkingDirectory(e.to_string()))?,
        };

        let filter = ModuleFilter::new(&config.extensions, &config.include, &config.exclude, &cwd)?;
        let resolver = NodeModuleResolver::new(cwd.clone(), &config.extensions);

        Ok(Self {
            config: Arc::new(config),
            cwd,
            filter: Arc::new(filter),
            analyzer: Arc::new(OxcModuleAnalyzer),
            rewriter,
            resolver: Arc::new(resolver),
        })
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn ModuleAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ModuleResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &CommonJsConfig {
        &self.config
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Start a build.
    ///
    /// Resolves the named export overrides and registers entry resolution,
    /// which runs once, the first time a transform needs it.
    pub async fn start_build(&self, input: impl Into<EntryInput>) -> Result<CommonJsSession> {
        let named_exports = self.resolve_named_exports().await?;

        let input = input.into();
        let resolver = Arc::clone(&self.resolver);
        let cwd = self.cwd.clone();
        let entries = Memo::from_future(async move {
            resolve_entries(resolver.as_ref(), &input, &cwd)
                .await
                .map(Arc::new)
        });

        Ok(CommonJsSession {
            interop: self.clone(),
            named_exports,
            entries,
            registry: ClassificationRegistry::new(),
            kinds: ModuleKindTracker::new(),
        })
    }

    async fn resolve_named_exports(&self) -> Result<FxHashMap<String, Vec<String>>> {
        let mut resolved = FxHashMap::default();

        for (specifier, names) in &self.config.named_exports {
            let id = resolve_or_lexical(self.resolver.as_ref(), specifier, &self.cwd).await?;
            if resolved.insert(id.clone(), names.clone()).is_some() {
                warn!(
                    specifier,
                    id, "[fob-commonjs] several namedExports entries resolve to the same module"
                );
            }
        }

        Ok(resolved)
    }

    /// Resolve specifiers in the proxy, external and helper namespaces.
    ///
    /// Proxy targets that cannot be resolved are treated as external.
    /// Everything else is left to the host.
    pub async fn resolve_id(&self, specifier: &str, importer: Option<&str>) -> Result<Option<String>> {
        match SyntheticId::parse(specifier) {
            SyntheticId::Helpers | SyntheticId::External(_) => Ok(Some(specifier.to_string())),
            SyntheticId::Proxy(target) => {
                let importer = importer.map(SyntheticId::unwrap_proxy);
                let resolved = match self.resolver.resolve(target, importer).await? {
                    Some(resolved) => SyntheticId::Proxy(&resolved).to_string(),
                    None => SyntheticId::External(target).to_string(),
                };
                debug!(
                    target,
                    external = !resolved.starts_with(crate::ids::PROXY_PREFIX),
                    "[fob-commonjs] resolved proxy import"
                );
                Ok(Some(resolved))
            }
            SyntheticId::Source(_) => Ok(None),
        }
    }
}

impl std::fmt::Debug for CommonJsInterop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommonJsInterop")
            .field("config", &self.config)
            .field("cwd", &self.cwd)
            .finish_non_exhaustive()
    }
}

/// State of a single build
#[derive(Debug)]
pub struct CommonJsSession {
    interop: CommonJsInterop,
    named_exports: FxHashMap<String, Vec<String>>,
    entries: Memo<Result<Arc<EntrySet>>>,
    registry: ClassificationRegistry,
    kinds: ModuleKindTracker,
}

impl CommonJsSession {
    pub fn registry(&self) -> &ClassificationRegistry {
        &self.registry
    }

    pub fn kinds(&self) -> &ModuleKindTracker {
        &self.kinds
    }

    /// Named export overrides keyed by resolved module id
    pub fn named_exports(&self, id: &str) -> Option<&[String]> {
        self.named_exports.get(id).map(Vec::as_slice)
    }

    /// The build's entry set, resolving it on first use
    pub async fn entries(&self) -> Result<Arc<EntrySet>> {
        let entries = self
            .entries
            .try_get()
            .ok_or(CommonJsError::EntriesNotConfigured)?;
        entries.await.unwrap_or(Err(CommonJsError::EntriesNotConfigured))
    }

    /// Transform one candidate module.
    ///
    /// Returns the rewritten module for CommonJS input and `None` when the
    /// source passes through unchanged. The module's classification is
    /// registered before any work starts and always settles, including when
    /// this returns an error or the future is dropped.
    pub async fn transform(&self, code: &str, id: &str) -> Result<Option<TransformedModule>> {
        if !self.interop.filter.is_candidate(id) {
            self.registry.set_classification(id, future::ready(None))?;
            return Ok(None);
        }

        let (settle, settled) = oneshot::channel::<Option<bool>>();
        self.registry
            .set_classification(id, async move { settled.await.unwrap_or(Some(false)) })?;

        let result = self.classify_and_rewrite(code, id).await;
        let classification = match &result {
            Ok(Some(_)) => Some(true),
            Ok(None) => None,
            Err(_) => Some(false),
        };
        let _ = settle.send(classification);

        result
    }

    async fn classify_and_rewrite(&self, code: &str, id: &str) -> Result<Option<TransformedModule>> {
        let entries = self.entries().await?;
        let analysis = self.interop.analyzer.analyze(code, id)?;

        if analysis.is_es_module {
            let shape = ExportShape::from_has_default(analysis.has_default_export);
            self.kinds.record(id, shape);
            debug!(id, ?shape, "[fob-commonjs] ES module passes through");
            return Ok(None);
        }

        let config = self.interop.config();
        let named_exports = self.named_exports(id);
        let is_entry = entries.contains(id);
        let request = RewriteRequest {
            code,
            id,
            is_entry,
            ignore_global: config.ignore_global,
            ignore_require: &config.ignore,
            named_exports,
            source_map: config.source_map,
            allow_dynamic_require: config.allow_dynamic_require(),
        };

        match self.interop.rewriter.rewrite(request).await? {
            Some(transformed) => {
                debug!(id, is_entry, "[fob-commonjs] rewrote CommonJS module");
                Ok(Some(transformed))
            }
            None => {
                if named_exports.is_some_and(|names| !names.is_empty()) {
                    return Err(CommonJsError::NamedExportsMismatch { id: id.to_string() });
                }
                self.kinds.record(id, ExportShape::LacksDefaultExport);
                debug!(id, "[fob-commonjs] no CommonJS idioms found");
                Ok(None)
            }
        }
    }

    /// Produce the source of a synthetic module, or `None` for anything else
    pub async fn load(&self, id: SyntheticId<'_>) -> Result<Option<String>> {
        match id {
            SyntheticId::Helpers => Ok(Some(HELPERS_SOURCE.to_string())),
            SyntheticId::External(specifier) => Ok(Some(external_source(specifier))),
            SyntheticId::Proxy(target) => self.proxy(target).await.map(Some),
            SyntheticId::Source(_) => Ok(None),
        }
    }

    async fn proxy(&self, target: &str) -> Result<String> {
        let classification = self.registry.get_classification(target);

        let is_commonjs = match self.interop.config().classification_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, classification)
                .await
                .map_err(|_| CommonJsError::ClassificationTimeout {
                    id: target.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })?,
            None => classification.await,
        };

        let shape = ProxyShape::select(is_commonjs, self.kinds.shape(target));
        debug!(id = target, ?shape, "[fob-commonjs] generated proxy");
        Ok(proxy_source(target, shape))
    }
}
