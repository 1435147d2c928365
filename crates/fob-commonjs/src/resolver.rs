//! Module resolution seam
//!
//! Resolution proper (package lookup, extension probing) belongs to the host.
//! The interop layer only needs it for three things: entry points, named
//! export override keys and the targets of proxy imports.

use crate::error::{CommonJsError, Result};
use async_trait::async_trait;
use oxc_resolver::{ResolveError, ResolveOptions, Resolver};
use path_clean::PathClean;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Resolves import specifiers to module ids
#[async_trait]
pub trait ModuleResolver: Send + Sync {
    /// Resolve `specifier` as imported from `importer` (or from the working
    /// directory when there is no importer). `Ok(None)` declines.
    async fn resolve(&self, specifier: &str, importer: Option<&str>) -> Result<Option<String>>;
}

/// Node-style resolver backed by `oxc_resolver`
#[derive(Debug)]
pub struct NodeModuleResolver {
    resolver: Resolver,
    cwd: PathBuf,
}

impl NodeModuleResolver {
    pub fn new(cwd: PathBuf, extensions: &[String]) -> Self {
        let resolver = Resolver::new(ResolveOptions {
            condition_names: vec!["require".into(), "node".into(), "default".into()],
            extensions: extensions.to_vec(),
            ..Default::default()
        });

        Self { resolver, cwd }
    }
}

#[async_trait]
impl ModuleResolver for NodeModuleResolver {
    async fn resolve(&self, specifier: &str, importer: Option<&str>) -> Result<Option<String>> {
        let base_dir = importer
            .and_then(|importer| Path::new(importer).parent())
            .unwrap_or(self.cwd.as_path());

        match self.resolver.resolve(base_dir, specifier) {
            Ok(resolution) => Ok(Some(resolution.path().to_string_lossy().into_owned())),
            Err(ResolveError::NotFound(_)) => Ok(None),
            Err(e) => Err(CommonJsError::resolution(specifier, e.to_string())),
        }
    }
}

/// Resolve `specifier` from `cwd`, falling back to a lexical path when the
/// resolver declines.
pub(crate) async fn resolve_or_lexical(
    resolver: &dyn ModuleResolver,
    specifier: &str,
    cwd: &Path,
) -> Result<String> {
    if let Some(resolved) = resolver.resolve(specifier, None).await? {
        return Ok(resolved);
    }

    let lexical = cwd.join(specifier).clean();
    warn!(
        specifier,
        resolved = %lexical.display(),
        "[fob-commonjs] resolver declined, using lexical path"
    );
    Ok(lexical.to_string_lossy().into_owned())
}
