//! Seam to the CommonJS rewrite engine
//!
//! The engine turns `require()`, `module.exports` and `exports.x` into ES
//! import/export syntax backed by the runtime helpers. It is supplied by the
//! embedder; this crate only decides *when* to call it and what to do with
//! the answer.

use crate::config::IgnoreRequire;
use crate::error::Result;
use async_trait::async_trait;
use oxc_sourcemap::SourceMap;

/// Everything the rewrite engine needs to rewrite one module
#[derive(Debug, Clone, Copy)]
pub struct RewriteRequest<'a> {
    pub code: &'a str,
    pub id: &'a str,
    /// The module is a build entry point; `module`/`exports` must be bootstrapped
    pub is_entry: bool,
    /// Leave references to `global` untouched
    pub ignore_global: bool,
    /// `require()` targets to leave dynamic
    pub ignore_require: &'a IgnoreRequire,
    /// Named exports declared by the user for this module
    pub named_exports: Option<&'a [String]>,
    pub source_map: bool,
    pub allow_dynamic_require: bool,
}

/// A module rewritten from CommonJS to ES module syntax
#[derive(Debug, Clone)]
pub struct TransformedModule {
    pub code: String,
    pub map: Option<SourceMap>,
}

impl TransformedModule {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
        }
    }

    pub fn with_map(mut self, map: SourceMap) -> Self {
        self.map = Some(map);
        self
    }
}

#[async_trait]
pub trait CommonJsRewriter: Send + Sync {
    /// Rewrite a module that is not an ES module.
    ///
    /// Returns `Ok(None)` when no CommonJS idioms were found.
    async fn rewrite(&self, request: RewriteRequest<'_>) -> Result<Option<TransformedModule>>;
}
