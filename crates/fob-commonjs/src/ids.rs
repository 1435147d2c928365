//! Synthetic module identifiers
//!
//! Proxy, external-adapter and helper modules never exist on disk. They are
//! addressed by `\0`-prefixed ids, which keeps other plugins and the host's
//! file loader from touching them. The prefix is decoded exactly once, at the
//! hook boundary, into a [`SyntheticId`].

use std::fmt;

/// Id of the runtime helpers module
pub const HELPERS_ID: &str = "\0commonjsHelpers.js";

/// Prefix of adapters wrapping modules that live outside the project sources
pub const EXTERNAL_PREFIX: &str = "\0commonjs-external-";

/// Prefix of interop proxies wrapping a source module
pub const PROXY_PREFIX: &str = "\0commonjs-proxy-";

/// Source of the runtime helpers module.
///
/// `deriveDefault` picks the most plausible default value of a namespace whose
/// export shape was unknown when its proxy was generated. The remaining shims
/// are consumed by rewritten CommonJS modules.
pub const HELPERS_SOURCE: &str = r#"export var commonjsGlobal = typeof globalThis !== 'undefined' ? globalThis : typeof window !== 'undefined' ? window : typeof global !== 'undefined' ? global : typeof self !== 'undefined' ? self : {};

export function unwrapExports (x) {
	return x && x.__esModule && Object.prototype.hasOwnProperty.call(x, 'default') ? x['default'] : x;
}

export function createCommonjsModule(fn, module) {
	return module = { exports: {} }, fn(module, module.exports), module.exports;
}

export function deriveDefault (n) {
	return n && n['default'] || n;
}
"#;

/// A module id with its namespace decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticId<'a> {
    /// The runtime helpers module
    Helpers,
    /// Adapter for a non-source module; holds the raw external specifier
    External(&'a str),
    /// Interop proxy; holds the wrapped module id
    Proxy(&'a str),
    /// Any other id, passed through untouched
    Source(&'a str),
}

impl<'a> SyntheticId<'a> {
    pub fn parse(id: &'a str) -> Self {
        if id == HELPERS_ID {
            Self::Helpers
        } else if let Some(target) = id.strip_prefix(PROXY_PREFIX) {
            Self::Proxy(target)
        } else if let Some(specifier) = id.strip_prefix(EXTERNAL_PREFIX) {
            Self::External(specifier)
        } else {
            Self::Source(id)
        }
    }

    /// The id with any proxy wrapping removed.
    ///
    /// Used to recover the real importer when a proxy module imports its target.
    pub fn unwrap_proxy(id: &'a str) -> &'a str {
        match Self::parse(id) {
            Self::Proxy(target) => target,
            _ => id,
        }
    }

    /// True for ids owned by this crate
    pub fn is_synthetic(&self) -> bool {
        !matches!(self, Self::Source(_))
    }
}

impl fmt::Display for SyntheticId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Helpers => f.write_str(HELPERS_ID),
            Self::External(specifier) => write!(f, "{EXTERNAL_PREFIX}{specifier}"),
            Self::Proxy(target) => write!(f, "{PROXY_PREFIX}{target}"),
            Self::Source(id) => f.write_str(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_namespace() {
        assert_eq!(SyntheticId::parse(HELPERS_ID), SyntheticId::Helpers);
        assert_eq!(
            SyntheticId::parse("\0commonjs-proxy-/src/a.js"),
            SyntheticId::Proxy("/src/a.js")
        );
        assert_eq!(
            SyntheticId::parse("\0commonjs-external-fs"),
            SyntheticId::External("fs")
        );
        assert_eq!(SyntheticId::parse("/src/a.js"), SyntheticId::Source("/src/a.js"));
    }

    #[test]
    fn test_display_restores_prefix() {
        for id in [
            HELPERS_ID,
            "\0commonjs-proxy-/src/a.js",
            "\0commonjs-external-events",
            "/src/plain.js",
        ] {
            assert_eq!(SyntheticId::parse(id).to_string(), id);
        }
    }

    #[test]
    fn test_unwrap_proxy() {
        assert_eq!(SyntheticId::unwrap_proxy("\0commonjs-proxy-/src/a.js"), "/src/a.js");
        assert_eq!(SyntheticId::unwrap_proxy("/src/b.js"), "/src/b.js");
        assert!(!SyntheticId::parse("/src/b.js").is_synthetic());
        assert!(SyntheticId::parse(HELPERS_ID).is_synthetic());
    }
}
