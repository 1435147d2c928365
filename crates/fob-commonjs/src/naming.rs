//! Binding names for generated import statements

use std::path::Path;

const RESERVED_WORDS: &[&str] = &[
    "break", "case", "class", "catch", "const", "continue", "debugger", "default", "delete", "do",
    "else", "export", "extends", "finally", "for", "function", "if", "import", "in", "instanceof",
    "let", "new", "return", "super", "switch", "this", "throw", "try", "typeof", "var", "void",
    "while", "with", "yield", "enum", "await", "implements", "package", "protected", "static",
    "interface", "private", "public",
];

const BUILTINS: &[&str] = &[
    "arguments", "Infinity", "NaN", "undefined", "null", "true", "false", "eval", "uneval",
    "isFinite", "isNaN", "parseFloat", "parseInt", "decodeURI", "decodeURIComponent", "encodeURI",
    "encodeURIComponent", "escape", "unescape", "Object", "Function", "Boolean", "Symbol", "Error",
    "EvalError", "InternalError", "RangeError", "ReferenceError", "SyntaxError", "TypeError",
    "URIError", "Number", "Math", "Date", "String", "RegExp", "Array", "Int8Array", "Uint8Array",
    "Uint8ClampedArray", "Int16Array", "Uint16Array", "Int32Array", "Uint32Array", "Float32Array",
    "Float64Array", "Map", "Set", "WeakMap", "WeakSet", "SIMD", "ArrayBuffer", "DataView", "JSON",
    "Promise", "Generator", "GeneratorFunction", "Reflect", "Proxy", "Intl",
];

/// Bindings emitted by proxy modules themselves
const GENERATED_BINDINGS: &[&str] = &["__cjsExports", "deriveDefault"];

/// Turn an arbitrary string into a legal JavaScript identifier.
///
/// `-x` sequences are camel-cased, other illegal characters become `_`, and
/// names that start with a digit or shadow a keyword/builtin get a `_` prefix.
pub fn make_legal_identifier(input: &str) -> String {
    let mut name = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '-' {
            if let Some(next) = chars.peek().copied().filter(|c| is_word_char(*c)) {
                chars.next();
                name.push(next.to_ascii_uppercase());
                continue;
            }
        }

        if ch == '$' || ch == '_' || ch.is_ascii_alphanumeric() {
            name.push(ch);
        } else {
            name.push('_');
        }
    }

    let starts_with_digit = name.chars().next().is_some_and(|c| c.is_ascii_digit());
    if starts_with_digit || RESERVED_WORDS.contains(&name.as_str()) || BUILTINS.contains(&name.as_str())
    {
        name.insert(0, '_');
    }

    if name.is_empty() {
        name.push('_');
    }

    name
}

fn is_word_char(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphanumeric()
}

/// Derive the local binding name used when importing `id`.
///
/// Uses the file stem, or the parent directory's name for `index` files.
pub fn module_binding_name(id: &str) -> String {
    let path = Path::new(id);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    let mut name = make_legal_identifier(&stem);

    if name == "index" {
        let parent = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        name = make_legal_identifier(&parent);
    }

    if GENERATED_BINDINGS.contains(&name.as_str()) {
        name.insert(0, '_');
    }

    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_identifier_passthrough() {
        assert_eq!(make_legal_identifier("foo"), "foo");
        assert_eq!(make_legal_identifier("$jq_1"), "$jq_1");
    }

    #[test]
    fn test_legal_identifier_camel_cases_dashes() {
        assert_eq!(make_legal_identifier("my-module"), "myModule");
        assert_eq!(make_legal_identifier("lodash.merge"), "lodash_merge");
        assert_eq!(make_legal_identifier("trailing-"), "trailing_");
    }

    #[test]
    fn test_legal_identifier_prefixes() {
        assert_eq!(make_legal_identifier("1up"), "_1up");
        assert_eq!(make_legal_identifier("default"), "_default");
        assert_eq!(make_legal_identifier("Object"), "_Object");
        assert_eq!(make_legal_identifier(""), "_");
    }

    #[test]
    fn test_binding_name_from_path() {
        assert_eq!(module_binding_name("foo"), "foo");
        assert_eq!(module_binding_name("/project/src/utils.js"), "utils");
        assert_eq!(module_binding_name("/project/node_modules/left-pad/index.js"), "leftPad");
        assert_eq!(module_binding_name("@scope/pkg"), "pkg");
    }

    #[test]
    fn test_binding_name_keeps_scheme() {
        // `:` is not a separator, so the scheme stays part of the name
        assert_eq!(module_binding_name("node:path"), "node_path");
        assert_eq!(module_binding_name("node:fs/promises"), "promises");
    }

    #[test]
    fn test_binding_name_avoids_generated_bindings() {
        assert_eq!(module_binding_name("/src/deriveDefault.js"), "_deriveDefault");
        assert_eq!(module_binding_name("/src/__cjsExports.js"), "___cjsExports");
    }
}
