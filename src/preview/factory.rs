//! Dynamic-function strategy: turns component source into the body of a
//! function `(React, ComponentLibrary) => Component`.

use serde::{Deserialize, Serialize};

use crate::errors::GenError;
use crate::sanitize::imports::{apply_edits, Edit};
use crate::sanitize::scan::{statement_offsets, Cursor};
use crate::sanitize::{self, DEFAULT_COMPONENT_NAME};

/// Names of the only values generated code can reach.
pub const FACTORY_PARAMS: [&str; 2] = ["React", "ComponentLibrary"];

const EXPRESSION_BINDING: &str = "__PreviewComponent";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentFactory {
    pub component_name: String,
    pub params: Vec<String>,
    /// Source for `new Function(...params, body)`; still contains JSX.
    pub body: String,
}

struct DefaultExport {
    name: String,
    edit: Edit,
    /// Whether the export itself declares the component.
    declares: bool,
}

fn locate_default_export(src: &str) -> Option<DefaultExport> {
    for start in statement_offsets(src) {
        let mut c = Cursor::new(src, start);
        if !c.keyword("export") {
            continue;
        }
        c.skip_ws();
        if !c.keyword("default") {
            continue;
        }
        c.skip_ws();
        let decl_start = c.pos;

        let is_async = c.keyword("async");
        if is_async {
            c.skip_ws();
        }
        if c.keyword("function") || (!is_async && c.keyword("class")) {
            let keyword_end = c.pos;
            c.skip_ws();
            if c.eat(b'*') {
                c.skip_ws();
            }
            return Some(match c.ident() {
                Some(name) => DefaultExport {
                    name,
                    edit: Edit { start, end: decl_start, replacement: String::new() },
                    declares: true,
                },
                None => DefaultExport {
                    name: DEFAULT_COMPONENT_NAME.to_string(),
                    edit: Edit {
                        start,
                        end: keyword_end,
                        replacement: format!("{} {}", &src[decl_start..keyword_end], DEFAULT_COMPONENT_NAME),
                    },
                    declares: true,
                },
            });
        }

        c.pos = decl_start;
        if let Some(name) = c.ident() {
            let ident_end = c.pos;
            c.statement_end();
            let terminated = c.pos > ident_end;
            c.skip_inline_ws();
            if terminated || matches!(c.peek(), None | Some(b'\n') | Some(b'\r')) {
                return Some(DefaultExport {
                    name,
                    edit: Edit { start, end: c.pos, replacement: String::new() },
                    declares: false,
                });
            }
        }

        return Some(DefaultExport {
            name: EXPRESSION_BINDING.to_string(),
            edit: Edit { start, end: decl_start, replacement: format!("const {} = ", EXPRESSION_BINDING) },
            declares: true,
        });
    }
    None
}

/// Sanitizes `code` and wraps it so that the function returns the default
/// exported component.
pub fn build_factory(code: &str) -> Result<ComponentFactory, GenError> {
    let src = sanitize::sanitize(code);
    let export = locate_default_export(&src)
        .ok_or_else(|| GenError::Preview("no default-exported component found".into()))?;

    if !export.declares && !sanitize::top_level_component_names(&src).contains(&export.name) {
        return Err(GenError::Preview(format!("default export '{}' is not defined", export.name)));
    }

    let name = export.name.clone();
    let stripped = apply_edits(&src, vec![export.edit]);
    Ok(ComponentFactory {
        component_name: name.clone(),
        params: FACTORY_PARAMS.iter().map(|p| p.to_string()).collect(),
        body: format!("{}\n\nreturn {};", stripped.trim_end(), name),
    })
}
