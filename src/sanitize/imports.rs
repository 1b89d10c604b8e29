//! Parser for top-level `import` / `export` statements.

use super::scan::{statement_offsets, top_level_offsets, Cursor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub imported: String,
    pub local: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub start: usize,
    pub end: usize,
    pub module: String,
    pub default: Option<String>,
    pub namespace: Option<String>,
    pub named: Vec<Specifier>,
    pub type_only: bool,
}

/// One text replacement over a byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

pub fn apply_edits(src: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| e.start);
    let mut out = String::with_capacity(src.len());
    let mut last = 0;
    for e in edits {
        if e.start < last {
            continue;
        }
        out.push_str(&src[last..e.start]);
        out.push_str(&e.replacement);
        last = e.end;
    }
    out.push_str(&src[last..]);
    out
}

/// Parses `{ a, b as c, type D }`; the cursor must sit on `{`.
fn parse_specifiers(c: &mut Cursor<'_>) -> Option<Vec<Specifier>> {
    if !c.eat(b'{') {
        return None;
    }
    let mut out = Vec::new();
    loop {
        c.skip_ws();
        if c.eat(b'}') {
            return Some(out);
        }
        let save = c.pos;
        let mut type_only = false;
        if c.keyword("type") {
            c.skip_ws();
            if matches!(c.peek(), Some(b',') | Some(b'}')) || c.rest().starts_with("as ") {
                c.pos = save;
            } else {
                type_only = true;
            }
        }
        let imported = c.ident().or_else(|| c.string())?;
        c.skip_ws();
        let local = if c.keyword("as") {
            c.skip_ws();
            c.ident()?
        } else {
            imported.clone()
        };
        if !type_only {
            out.push(Specifier { imported, local });
        }
        c.skip_ws();
        if c.eat(b',') {
            continue;
        }
        if c.eat(b'}') {
            return Some(out);
        }
        return None;
    }
}

/// Parses one import statement at `start`, or `None` if the text there is
/// not a static import the rewriter understands.
pub fn parse_import(src: &str, start: usize) -> Option<ImportDecl> {
    let mut c = Cursor::new(src, start);
    if !c.keyword("import") {
        return None;
    }
    c.skip_ws();

    let mut decl = ImportDecl {
        start,
        end: start,
        module: String::new(),
        default: None,
        namespace: None,
        named: Vec::new(),
        type_only: false,
    };

    if let Some(module) = c.string() {
        decl.module = module;
        c.statement_end();
        decl.end = c.pos;
        return Some(decl);
    }

    let save = c.pos;
    if c.keyword("type") {
        c.skip_ws();
        if c.keyword("from") || c.peek() == Some(b',') {
            // default binding literally named `type`
            c.pos = save;
        } else {
            decl.type_only = true;
        }
    }

    if let Some(name) = c.ident() {
        decl.default = Some(name);
        c.skip_ws();
        if c.eat(b',') {
            c.skip_ws();
        }
    }

    if c.eat(b'*') {
        c.skip_ws();
        if !c.keyword("as") {
            return None;
        }
        c.skip_ws();
        decl.namespace = Some(c.ident()?);
    } else if c.peek() == Some(b'{') {
        decl.named = parse_specifiers(&mut c)?;
    }

    if decl.default.is_none() && decl.namespace.is_none() && decl.named.is_empty() && !decl.type_only {
        // `import {} from 'x'` is legal and binds nothing
        if !src[start..c.pos].contains('{') {
            return None;
        }
    }

    c.skip_ws();
    if !c.keyword("from") {
        return None;
    }
    c.skip_ws();
    decl.module = c.string()?;
    c.statement_end();
    decl.end = c.pos;
    Some(decl)
}

/// All static imports at the top level of `src`, including several on one
/// line.
pub fn find_imports(src: &str) -> Vec<ImportDecl> {
    let mut out = Vec::new();
    for offset in top_level_offsets(src) {
        let mut at = offset;
        while let Some(decl) = parse_import(src, at) {
            let mut c = Cursor::new(src, decl.end);
            out.push(decl);
            c.skip_inline_ws();
            at = c.pos;
        }
    }
    out
}

fn is_react(module: &str) -> bool {
    module == "react"
}

fn is_component_library(module: &str) -> bool {
    module.ends_with("ComponentLibrary")
}

fn destructure(named: &[Specifier], source: &str) -> String {
    let fields = named
        .iter()
        .map(|s| {
            if s.imported == s.local {
                s.local.clone()
            } else {
                format!("{}: {}", s.imported, s.local)
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("const {{ {} }} = {};", fields, source)
}

/// Sandbox binding text for one import.
fn import_replacement(decl: &ImportDecl) -> String {
    if decl.type_only {
        return String::new();
    }
    let source = if is_react(&decl.module) {
        "React"
    } else if is_component_library(&decl.module) {
        "ComponentLibrary"
    } else {
        return format!("/* import from '{}' is not available in preview */", decl.module.replace("*/", "* /"));
    };

    let mut lines = Vec::new();
    for alias in [&decl.default, &decl.namespace].into_iter().flatten() {
        if alias != source {
            lines.push(format!("const {} = {};", alias, source));
        }
    }
    if !decl.named.is_empty() {
        lines.push(destructure(&decl.named, source));
    }
    lines.join("\n")
}

const DECLARATION_KEYWORDS: [&str; 9] =
    ["function", "const", "let", "var", "class", "async", "interface", "type", "enum"];

/// Edit for a non-default `export` at `start`, if there is one.
fn export_edit(src: &str, start: usize) -> Option<Edit> {
    let mut c = Cursor::new(src, start);
    if !c.keyword("export") {
        return None;
    }
    c.skip_inline_ws();
    if c.rest().starts_with("default") {
        return None;
    }
    if c.peek() == Some(b'{') {
        let specs = parse_specifiers(&mut c)?;
        let save = c.pos;
        c.skip_inline_ws();
        if c.keyword("from") {
            c.skip_ws();
            c.string()?;
        } else {
            c.pos = save;
        }
        c.statement_end();
        let replacement = specs
            .iter()
            .find(|s| s.local == "default")
            .map(|s| format!("export default {};", s.imported))
            .unwrap_or_default();
        return Some(Edit { start, end: c.pos, replacement });
    }
    let body = c.pos;
    if DECLARATION_KEYWORDS.iter().any(|kw| Cursor::new(src, body).keyword(kw)) {
        return Some(Edit { start, end: body, replacement: String::new() });
    }
    None
}

/// Rewrites module syntax into bindings over the injected `React` and
/// `ComponentLibrary` values.
pub fn rewrite_module_syntax(src: &str) -> String {
    let mut edits: Vec<Edit> = find_imports(src)
        .iter()
        .map(|d| {
            let replacement = import_replacement(d);
            let mut end = d.end;
            if replacement.is_empty() && src.as_bytes().get(end) == Some(&b'\n') {
                end += 1;
            }
            Edit { start: d.start, end, replacement }
        })
        .collect();

    for offset in statement_offsets(src) {
        if let Some(mut edit) = export_edit(src, offset) {
            if edit.replacement.is_empty() && edit.end > edit.start && src[edit.start..edit.end].contains('{') {
                if src.as_bytes().get(edit.end) == Some(&b'\n') {
                    edit.end += 1;
                }
            }
            edits.push(edit);
        }
    }
    apply_edits(src, edits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_and_named() {
        let src = "import React, { useState, useEffect as useFx } from 'react';";
        let d = parse_import(src, 0).unwrap();
        assert_eq!(d.default.as_deref(), Some("React"));
        assert_eq!(d.module, "react");
        assert_eq!(d.named.len(), 2);
        assert_eq!(d.named[1], Specifier { imported: "useEffect".into(), local: "useFx".into() });
        assert_eq!(d.end, src.len());
    }

    #[test]
    fn test_parse_multiline_specifiers_with_comments() {
        let src = "import {\n  Button, // primary actions\n  Card,\n  Input,\n} from \"./ComponentLibrary\"\nconst x = 1;";
        let d = parse_import(src, 0).unwrap();
        let names: Vec<_> = d.named.iter().map(|s| s.local.as_str()).collect();
        assert_eq!(names, vec!["Button", "Card", "Input"]);
        assert_eq!(&src[d.end..d.end + 1], "\n");
    }

    #[test]
    fn test_parse_type_only_and_side_effect() {
        let d = parse_import("import type { Props } from './types';", 0).unwrap();
        assert!(d.type_only);
        let d = parse_import("import './styles.css';", 0).unwrap();
        assert_eq!(d.module, "./styles.css");
        assert!(d.named.is_empty());
    }

    #[test]
    fn test_dynamic_import_is_not_a_statement() {
        assert!(parse_import("import('./x').then(m => m)", 0).is_none());
    }

    #[test]
    fn test_rewrite_react_and_library_imports() {
        let src = "import React, { useState } from 'react';\nimport { Button, Card } from '@/components/ComponentLibrary';\n\nexport default function GeneratedUI() {}\n";
        let out = rewrite_module_syntax(src);
        assert_eq!(
            out,
            "const { useState } = React;\nconst { Button, Card } = ComponentLibrary;\n\nexport default function GeneratedUI() {}\n"
        );
    }

    #[test]
    fn test_rewrite_drops_bare_react_import_line() {
        let out = rewrite_module_syntax("import React from 'react';\nconst a = 1;\n");
        assert_eq!(out, "const a = 1;\n");
    }

    #[test]
    fn test_rewrite_aliases_and_namespaces() {
        let out = rewrite_module_syntax("import * as Lib from './ComponentLibrary';\nimport { useState as useS } from 'react';\n");
        assert_eq!(out, "const Lib = ComponentLibrary;\nconst { useState: useS } = React;\n");
    }

    #[test]
    fn test_rewrite_comments_out_unknown_modules() {
        let out = rewrite_module_syntax("import { Home } from 'lucide-react';\n");
        assert_eq!(out, "/* import from 'lucide-react' is not available in preview */\n");
    }

    #[test]
    fn test_unknown_module_comment_keeps_rest_of_line() {
        let out = rewrite_module_syntax("import { Home } from 'lucide-react'; import { Card } from './ComponentLibrary';\n");
        assert_eq!(
            out,
            "/* import from 'lucide-react' is not available in preview */ const { Card } = ComponentLibrary;\n"
        );
    }

    #[test]
    fn test_rewrite_two_imports_on_one_line() {
        let out = rewrite_module_syntax("import React from 'react'; import { useState } from 'react';\n");
        assert_eq!(out.trim(), "const { useState } = React;");
    }

    #[test]
    fn test_rewrite_strips_named_exports() {
        let src = "export const items = [];\nexport function Helper() {}\nfunction GeneratedUI() {}\nexport { GeneratedUI as default };\n";
        let out = rewrite_module_syntax(src);
        assert_eq!(out, "const items = [];\nfunction Helper() {}\nfunction GeneratedUI() {}\nexport default GeneratedUI;\n");
    }

    #[test]
    fn test_rewrite_leaves_nested_import_text_alone() {
        let src = "function F() {\n  const s = `import { x } from 'y'`;\n}\n";
        assert_eq!(rewrite_module_syntax(src), src);
    }
}
