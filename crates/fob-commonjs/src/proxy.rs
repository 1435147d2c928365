//! Source text of interop proxies and external adapters

use crate::ids::HELPERS_ID;
use crate::naming::module_binding_name;
use crate::tracker::ExportShape;

/// Which adapter a proxy module uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyShape {
    /// Target was rewritten from CommonJS; re-export its exports object
    CommonJs,
    /// ES module without a default export; the namespace becomes the default
    Namespace,
    /// ES module with a default export; re-export it directly
    PassThrough,
    /// Shape never observed; pick the default at runtime
    Unknown,
}

impl ProxyShape {
    /// Pick the proxy shape from a settled classification and the recorded
    /// export shape (if any).
    pub fn select(is_commonjs: bool, export_shape: Option<ExportShape>) -> Self {
        if is_commonjs {
            return Self::CommonJs;
        }
        match export_shape {
            Some(ExportShape::LacksDefaultExport) => Self::Namespace,
            Some(ExportShape::HasDefaultExport) => Self::PassThrough,
            None => Self::Unknown,
        }
    }
}

/// Quote a module id as a JavaScript string literal
fn quote(id: &str) -> String {
    serde_json::Value::String(id.to_owned()).to_string()
}

/// Generate the proxy module for `target`
pub fn proxy_source(target: &str, shape: ProxyShape) -> String {
    let specifier = quote(target);

    match shape {
        ProxyShape::CommonJs => {
            format!("import {{ __cjsExports }} from {specifier}; export default __cjsExports;")
        }
        ProxyShape::Namespace => {
            let name = module_binding_name(target);
            format!("import * as {name} from {specifier}; export default {name};")
        }
        ProxyShape::PassThrough => format!("export {{ default }} from {specifier};"),
        ProxyShape::Unknown => {
            let name = module_binding_name(target);
            format!(
                "import * as {name} from {specifier}; import {{ deriveDefault }} from {}; export default deriveDefault({name});",
                quote(HELPERS_ID)
            )
        }
    }
}

/// Generate the adapter for a module resolved outside the project sources.
///
/// External modules are assumed to carry a conventional default export.
pub fn external_source(specifier: &str) -> String {
    let name = module_binding_name(specifier);
    format!(
        "import {name} from {}; export default {name};",
        quote(specifier)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commonjs_proxy() {
        assert_eq!(
            proxy_source("/src/lib.js", ProxyShape::CommonJs),
            r#"import { __cjsExports } from "/src/lib.js"; export default __cjsExports;"#
        );
    }

    #[test]
    fn test_namespace_proxy() {
        assert_eq!(
            proxy_source("/src/utils.js", ProxyShape::Namespace),
            r#"import * as utils from "/src/utils.js"; export default utils;"#
        );
    }

    #[test]
    fn test_pass_through_proxy() {
        assert_eq!(
            proxy_source("/src/app.js", ProxyShape::PassThrough),
            r#"export { default } from "/src/app.js";"#
        );
    }

    #[test]
    fn test_unknown_proxy_uses_helper() {
        let source = proxy_source("/src/pkg/index.js", ProxyShape::Unknown);
        assert_eq!(
            source,
            r#"import * as pkg from "/src/pkg/index.js"; import { deriveDefault } from "\u0000commonjsHelpers.js"; export default deriveDefault(pkg);"#
        );
    }

    #[test]
    fn test_external_adapter() {
        assert_eq!(
            external_source("foo"),
            r#"import foo from "foo"; export default foo;"#
        );
        assert_eq!(
            external_source("string_decoder/"),
            r#"import string_decoder from "string_decoder/"; export default string_decoder;"#
        );
    }

    #[test]
    fn test_ids_are_escaped() {
        let source = proxy_source(r#"C:\src\"odd".js"#, ProxyShape::PassThrough);
        assert_eq!(source, r#"export { default } from "C:\\src\\\"odd\".js";"#);
    }

    #[test]
    fn test_shape_selection() {
        assert_eq!(ProxyShape::select(true, None), ProxyShape::CommonJs);
        assert_eq!(
            ProxyShape::select(true, Some(ExportShape::HasDefaultExport)),
            ProxyShape::CommonJs
        );
        assert_eq!(
            ProxyShape::select(false, Some(ExportShape::LacksDefaultExport)),
            ProxyShape::Namespace
        );
        assert_eq!(
            ProxyShape::select(false, Some(ExportShape::HasDefaultExport)),
            ProxyShape::PassThrough
        );
        assert_eq!(ProxyShape::select(false, None), ProxyShape::Unknown);
    }
}
