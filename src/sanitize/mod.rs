//! Best-effort repair of generated component source.
//!
//! Each rule is a pure text transform with a documented trigger. Rules run in
//! the order of [`RULES`]; the whole pipeline is idempotent. Malformed input is
//! repaired where a rule recognizes it and otherwise passed through.

pub mod imports;
pub mod markup;
pub mod scan;

use std::sync::OnceLock;

use regex::Regex;

use self::imports::{apply_edits, Edit};
use self::scan::{statement_offsets, Cursor};

pub const DEFAULT_COMPONENT_NAME: &str = "GeneratedUI";

pub struct Rule {
    pub name: &'static str,
    /// What the rule looks for.
    pub trigger: &'static str,
    pub apply: fn(&str) -> String,
}

pub const RULES: [Rule; 4] = [
    Rule {
        name: "strip_fences",
        trigger: "text starting with ``` (optionally ```lang) and/or ending with ```",
        apply: strip_fences,
    },
    Rule {
        name: "rewrite_imports",
        trigger: "top-level import statements and non-default export keywords",
        apply: rewrite_imports,
    },
    Rule {
        name: "ensure_default_export",
        trigger: "no top-level `export default`",
        apply: ensure_default_export,
    },
    Rule {
        name: "repair_markup_in_data",
        trigger: "`label:`, `title:`, `subtitle:` or `footer:` followed by a JSX element",
        apply: repair_markup_in_data,
    },
];

pub fn sanitize(code: &str) -> String {
    let mut out = code.to_string();
    for rule in &RULES {
        let next = (rule.apply)(&out);
        if next != out {
            log::debug!("sanitize: rule '{}' rewrote the code", rule.name);
            out = next;
        }
    }
    out.trim().to_string()
}

/// Removes a leading ```` ```lang ```` line and a trailing ```` ``` ````.
pub fn strip_fences(code: &str) -> String {
    let mut t = code.trim();
    if let Some(rest) = t.strip_prefix("```") {
        t = match rest.find('\n') {
            Some(nl) => &rest[nl + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
        t = t.trim_end();
        if let Some(body) = t.strip_suffix("```") {
            t = body;
        }
    } else if let Some(body) = t.strip_suffix("```") {
        t = body;
    }
    t.trim().to_string()
}

/// Rewrites imports into bindings over the injected `React` and
/// `ComponentLibrary` values and drops `export` from non-default
/// declarations.
pub fn rewrite_imports(code: &str) -> String {
    imports::rewrite_module_syntax(code)
}

/// Whether any top-level statement, including one sharing a line with
/// earlier code, is an `export default`.
pub fn has_default_export(code: &str) -> bool {
    statement_offsets(code).into_iter().any(|o| {
        let mut c = Cursor::new(code, o);
        if !c.keyword("export") {
            return false;
        }
        c.skip_ws();
        c.keyword("default")
    })
}

/// PascalCase names declared at the top level by `function Name` or
/// `const|let|var Name =`.
pub fn top_level_component_names(code: &str) -> Vec<String> {
    let mut out = Vec::new();
    for o in statement_offsets(code) {
        let mut c = Cursor::new(code, o);
        if c.keyword("export") {
            c.skip_ws();
        }
        if c.keyword("async") {
            c.skip_ws();
        }
        let name = if c.keyword("function") {
            c.skip_ws();
            c.ident()
        } else if c.keyword("const") || c.keyword("let") || c.keyword("var") {
            c.skip_ws();
            c.ident().filter(|_| {
                c.skip_ws();
                matches!(c.peek(), Some(b'=') | Some(b':'))
            })
        } else {
            None
        };
        if let Some(name) = name.filter(|n| n.starts_with(|ch: char| ch.is_ascii_uppercase())) {
            out.push(name);
        }
    }
    out
}

/// Appends `export default <Name>;` when the code has no default export.
pub fn ensure_default_export(code: &str) -> String {
    if has_default_export(code) {
        return code.to_string();
    }
    let names = top_level_component_names(code);
    let name = names
        .iter()
        .find(|n| n.as_str() == DEFAULT_COMPONENT_NAME)
        .or_else(|| names.last())
        .map(String::as_str)
        .unwrap_or(DEFAULT_COMPONENT_NAME);
    format!("{}\n\nexport default {};", code.trim_end(), name)
}

fn placeholder_for(field: &str) -> &'static str {
    match field {
        "label" => "\"Item\"",
        "title" => "\"Title\"",
        "subtitle" => "\"Subtitle\"",
        _ => "\"Footer\"",
    }
}

/// Replaces a JSX element used as the value of a `label`, `title`,
/// `subtitle` or `footer` property with a placeholder string.
pub fn repair_markup_in_data(code: &str) -> String {
    static FIELD: OnceLock<Regex> = OnceLock::new();
    let re = FIELD.get_or_init(|| {
        Regex::new(r"\b(label|title|subtitle|footer)\s*:\s*<").expect("static field regex")
    });

    let bytes = code.as_bytes();
    let mut edits = Vec::new();
    for caps in re.captures_iter(code) {
        let (Some(whole), Some(field)) = (caps.get(0), caps.get(1)) else { continue };
        let lt = whole.end() - 1;
        match bytes.get(lt + 1) {
            Some(b) if b.is_ascii_alphabetic() || *b == b'>' => {}
            _ => continue,
        }
        let end = markup::element_end(code, lt)
            .or_else(|| code[lt..].find('>').map(|p| lt + p + 1));
        if let Some(end) = end {
            edits.push(Edit {
                start: lt,
                end,
                replacement: placeholder_for(field.as_str()).to_string(),
            });
        }
    }
    if edits.is_empty() {
        code.to_string()
    } else {
        apply_edits(code, edits)
    }
}
