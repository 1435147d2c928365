//! Configuration for CommonJS interop
//!
//! Mirrors the options users pass to the plugin in a config file:
//!
//! ```json
//! {
//!   "extensions": [".js", ".cjs"],
//!   "exclude": ["src/esm/**"],
//!   "namedExports": { "react": ["createElement", "Component"] },
//!   "ignore": ["conditional-runtime-dependency"]
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Options controlling classification and rewriting of CommonJS modules
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommonJsConfig {
    /// File extensions considered for transformation
    pub extensions: Vec<String>,

    /// Globs a module must match to be transformed (all modules if empty)
    pub include: Vec<String>,

    /// Globs excluding modules from transformation
    pub exclude: Vec<String>,

    /// Leave references to `global` untouched instead of mapping them to the
    /// runtime's global object
    pub ignore_global: bool,

    /// Named exports to declare for modules whose exports cannot be
    /// detected statically, keyed by package name or path
    pub named_exports: IndexMap<String, Vec<String>>,

    /// `require()` targets to leave as dynamic calls
    pub ignore: IgnoreRequire,

    /// Emit source maps for rewritten modules
    pub source_map: bool,

    /// Working directory for resolution and glob anchoring.
    ///
    /// Defaults to the process working directory.
    pub cwd: Option<PathBuf>,

    /// Upper bound on how long a proxy waits for its target's classification
    pub classification_timeout_ms: Option<u64>,
}

impl Default for CommonJsConfig {
    fn default() -> Self {
        Self {
            extensions: vec![".js".to_string()],
            include: Vec::new(),
            exclude: Vec::new(),
            ignore_global: false,
            named_exports: IndexMap::new(),
            ignore: IgnoreRequire::None,
            source_map: true,
            cwd: None,
            classification_timeout_ms: None,
        }
    }
}

impl CommonJsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_include(mut self, pattern: impl Into<String>) -> Self {
        self.include.push(pattern.into());
        self
    }

    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    pub fn with_ignore_global(mut self, ignore_global: bool) -> Self {
        self.ignore_global = ignore_global;
        self
    }

    /// Declare the named exports of a module
    pub fn with_named_exports<I, S>(mut self, specifier: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.named_exports
            .insert(specifier.into(), names.into_iter().map(Into::into).collect());
        self
    }

    /// Leave `require()` calls to any of these ids dynamic
    pub fn with_ignore_list<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore = IgnoreRequire::List(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Leave `require()` calls dynamic when `predicate` returns true
    pub fn with_ignore_fn<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.ignore = IgnoreRequire::Predicate(Arc::new(predicate));
        self
    }

    pub fn with_source_map(mut self, enabled: bool) -> Self {
        self.source_map = enabled;
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_classification_timeout(mut self, timeout: Duration) -> Self {
        // Round up so a sub-millisecond bound never becomes zero
        let millis = timeout.as_micros().div_ceil(1000);
        self.classification_timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    pub fn classification_timeout(&self) -> Option<Duration> {
        self.classification_timeout_ms.map(Duration::from_millis)
    }

    /// Dynamic `require()` is only permitted once something is ignored
    pub fn allow_dynamic_require(&self) -> bool {
        !matches!(self.ignore, IgnoreRequire::None)
    }
}

/// Selects `require()` targets that stay dynamic instead of being linked
#[derive(Clone, Default)]
pub enum IgnoreRequire {
    #[default]
    None,
    List(Vec<String>),
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl IgnoreRequire {
    pub fn is_ignored(&self, id: &str) -> bool {
        match self {
            Self::None => false,
            Self::List(ids) => ids.iter().any(|ignored| ignored == id),
            Self::Predicate(predicate) => predicate(id),
        }
    }
}

impl fmt::Debug for IgnoreRequire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::List(ids) => f.debug_tuple("List").field(ids).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for IgnoreRequire {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Vec<String>>::deserialize(deserializer)? {
            Some(ids) => Self::List(ids),
            None => Self::None,
        })
    }
}

/// The build's configured entry input
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EntryInput {
    Single(String),
    List(Vec<String>),
    Named(IndexMap<String, String>),
}

impl EntryInput {
    /// Entry specifiers in configuration order
    pub fn specifiers(&self) -> Vec<String> {
        match self {
            Self::Single(specifier) => vec![specifier.clone()],
            Self::List(specifiers) => specifiers.clone(),
            Self::Named(named) => named.values().cloned().collect(),
        }
    }
}

impl From<&str> for EntryInput {
    fn from(specifier: &str) -> Self {
        Self::Single(specifier.to_string())
    }
}

impl From<String> for EntryInput {
    fn from(specifier: String) -> Self {
        Self::Single(specifier)
    }
}

impl From<Vec<String>> for EntryInput {
    fn from(specifiers: Vec<String>) -> Self {
        Self::List(specifiers)
    }
}
