//! Entry point resolution

use crate::config::EntryInput;
use crate::error::Result;
use crate::resolver::{ModuleResolver, resolve_or_lexical};
use futures::future::try_join_all;
use indexmap::IndexSet;
use std::path::Path;
use tracing::debug;

/// Canonical ids of the build's entry points, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrySet {
    ids: IndexSet<String>,
}

impl EntrySet {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<String> for EntrySet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Resolve every configured entry specifier to a module id
pub async fn resolve_entries(
    resolver: &dyn ModuleResolver,
    input: &EntryInput,
    cwd: &Path,
) -> Result<EntrySet> {
    let specifiers = input.specifiers();
    let ids = try_join_all(
        specifiers
            .iter()
            .map(|specifier| resolve_or_lexical(resolver, specifier, cwd)),
    )
    .await?;

    let entries: EntrySet = ids.into_iter().collect();
    debug!(count = entries.len(), "[fob-commonjs] resolved entry points");
    Ok(entries)
}
