//! Static ES module detection

use crate::error::{CommonJsError, Result, SourceLocation};
use oxc_allocator::Allocator;
use oxc_ast::ast::{ModuleDeclaration, ModuleExportName};
use oxc_parser::{ParseOptions, Parser, ParserReturn};
use oxc_span::SourceType;

/// What a static scan of a module's top level found
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModuleAnalysis {
    /// Any top-level import or export declaration
    pub is_es_module: bool,
    /// `export default ...` or an `export { x as default }` specifier
    pub has_default_export: bool,
}

/// Decides whether a source file is an ES module
pub trait ModuleAnalyzer: Send + Sync {
    fn analyze(&self, code: &str, id: &str) -> Result<ModuleAnalysis>;
}

/// [`ModuleAnalyzer`] backed by the oxc parser.
///
/// Sources are parsed as modules with top-level `return` allowed, since
/// CommonJS files are function bodies once wrapped.
#[derive(Debug, Clone, Copy, Default)]
pub struct OxcModuleAnalyzer;

impl ModuleAnalyzer for OxcModuleAnalyzer {
    fn analyze(&self, code: &str, id: &str) -> Result<ModuleAnalysis> {
        let allocator = Allocator::default();
        let options = ParseOptions {
            allow_return_outside_function: true,
            ..ParseOptions::default()
        };

        let ParserReturn {
            program, errors, ..
        } = Parser::new(&allocator, code, SourceType::mjs())
            .with_options(options)
            .parse();

        if let Some(error) = errors.first() {
            let location = error
                .labels
                .as_ref()
                .and_then(|labels| labels.first())
                .map(|label| SourceLocation::from_offset(code, label.offset()));

            return Err(CommonJsError::Parse {
                id: id.to_string(),
                message: error.message.to_string(),
                location,
            });
        }

        let mut analysis = ModuleAnalysis::default();

        for stmt in &program.body {
            let Some(decl) = stmt.as_module_declaration() else {
                continue;
            };
            analysis.is_es_module = true;

            match decl {
                ModuleDeclaration::ExportDefaultDeclaration(_) => {
                    analysis.has_default_export = true;
                }
                ModuleDeclaration::ExportNamedDeclaration(named) => {
                    if named
                        .specifiers
                        .iter()
                        .any(|specifier| is_default_name(&specifier.exported))
                    {
                        analysis.has_default_export = true;
                    }
                }
                _ => {}
            }
        }

        Ok(analysis)
    }
}

fn is_default_name(name: &ModuleExportName<'_>) -> bool {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.as_str() == "default",
        ModuleExportName::IdentifierReference(ident) => ident.name.as_str() == "default",
        ModuleExportName::StringLiteral(lit) => lit.value.as_str() == "default",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(code: &str) -> ModuleAnalysis {
        OxcModuleAnalyzer.analyze(code, "/src/test.js").unwrap()
    }

    #[test]
    fn test_default_export_declaration() {
        let analysis = analyze("export default function main() {}");
        assert!(analysis.is_es_module);
        assert!(analysis.has_default_export);
    }

    #[test]
    fn test_default_via_specifier() {
        let analysis = analyze("const a = 1; export { a as default };");
        assert!(analysis.is_es_module);
        assert!(analysis.has_default_export);
    }

    #[test]
    fn test_named_exports_only() {
        let analysis = analyze("export const a = 1; export function b() {}");
        assert!(analysis.is_es_module);
        assert!(!analysis.has_default_export);
    }

    #[test]
    fn test_import_only_is_es_module() {
        let analysis = analyze("import './polyfill.js'; console.log('ready');");
        assert!(analysis.is_es_module);
        assert!(!analysis.has_default_export);
    }

    #[test]
    fn test_reexport_all() {
        let analysis = analyze("export * from './other.js';");
        assert!(analysis.is_es_module);
        assert!(!analysis.has_default_export);
    }

    #[test]
    fn test_commonjs_is_not_es_module() {
        let analysis = analyze(
            "var dep = require('./dep');\nmodule.exports = function () { return dep; };",
        );
        assert_eq!(analysis, ModuleAnalysis::default());
    }

    #[test]
    fn test_top_level_return_allowed() {
        let analysis = analyze("if (typeof window === 'undefined') return;\nexports.ok = true;");
        assert!(!analysis.is_es_module);
    }

    #[test]
    fn test_syntax_error_reports_location() {
        let err = OxcModuleAnalyzer
            .analyze("var a = 1;\nvar b = ;", "/src/broken.js")
            .unwrap_err();

        match err {
            CommonJsError::Parse { id, location, .. } => {
                assert_eq!(id, "/src/broken.js");
                assert_eq!(location.map(|l| l.line), Some(2));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
