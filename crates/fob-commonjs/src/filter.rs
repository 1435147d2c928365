//! Include/exclude filtering of candidate modules

use crate::error::{CommonJsError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

/// Decides which module ids are candidates for CommonJS transformation
#[derive(Debug, Clone)]
pub struct ModuleFilter {
    extensions: Vec<String>,
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl ModuleFilter {
    /// Compile the filter. Relative patterns are anchored at `cwd`.
    pub fn new(
        extensions: &[String],
        include: &[String],
        exclude: &[String],
        cwd: &Path,
    ) -> Result<Self> {
        Ok(Self {
            extensions: extensions.to_vec(),
            include: build_globset("include", include, cwd)?,
            exclude: build_globset("exclude", exclude, cwd)?,
        })
    }

    /// True if `id` should be classified and possibly rewritten
    pub fn is_candidate(&self, id: &str) -> bool {
        // Synthetic modules belong to whichever plugin created them
        if id.contains('\0') {
            return false;
        }

        if !self.has_candidate_extension(id) {
            return false;
        }

        if let Some(include) = &self.include {
            if !include.is_match(id) {
                return false;
            }
        }

        if let Some(exclude) = &self.exclude {
            if exclude.is_match(id) {
                return false;
            }
        }

        true
    }

    fn has_candidate_extension(&self, id: &str) -> bool {
        let Some(extension) = Path::new(id).extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|candidate| candidate.strip_prefix('.') == Some(extension))
    }
}

fn build_globset(option: &'static str, patterns: &[String], cwd: &Path) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let anchored = anchor_pattern(pattern, cwd);
        let glob = Glob::new(&anchored).map_err(|e| CommonJsError::InvalidPattern {
            option,
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }

    builder
        .build()
        .map(Some)
        .map_err(|e| CommonJsError::InvalidPattern {
            option,
            pattern: patterns.join(", "),
            message: e.to_string(),
        })
}

fn anchor_pattern(pattern: &str, cwd: &Path) -> String {
    if Path::new(pattern).is_absolute() {
        return pattern.to_string();
    }
    let relative = pattern.trim_start_matches("./");
    format!(
        "{}/{}",
        cwd.to_string_lossy().trim_end_matches('/'),
        relative
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(include: &[&str], exclude: &[&str]) -> ModuleFilter {
        let to_vec = |patterns: &[&str]| patterns.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        ModuleFilter::new(
            &[".js".to_string(), ".cjs".to_string()],
            &to_vec(include),
            &to_vec(exclude),
            Path::new("/project"),
        )
        .unwrap()
    }

    #[test]
    fn test_extension_check() {
        let filter = filter(&[], &[]);
        assert!(filter.is_candidate("/project/src/a.js"));
        assert!(filter.is_candidate("/project/src/b.cjs"));
        assert!(!filter.is_candidate("/project/src/c.ts"));
        assert!(!filter.is_candidate("/project/src/Makefile"));
    }

    #[test]
    fn test_synthetic_ids_never_candidates() {
        let filter = filter(&[], &[]);
        assert!(!filter.is_candidate("\0commonjs-proxy-/project/src/a.js"));
    }

    #[test]
    fn test_include_anchored_at_cwd() {
        let filter = filter(&["node_modules/**"], &[]);
        assert!(filter.is_candidate("/project/node_modules/react/index.js"));
        assert!(!filter.is_candidate("/project/src/a.js"));
    }

    #[test]
    fn test_exclude_wins() {
        let filter = filter(&["./**/*.js"], &["src/esm/**"]);
        assert!(filter.is_candidate("/project/src/cjs/a.js"));
        assert!(!filter.is_candidate("/project/src/esm/b.js"));
    }

    #[test]
    fn test_invalid_pattern_reported() {
        let err = ModuleFilter::new(&[], &["src/[".to_string()], &[], Path::new("/project"))
            .unwrap_err();
        assert!(matches!(err, CommonJsError::InvalidPattern { option: "include", .. }));
    }
}
