//! Isolated-document strategy: a complete HTML page that compiles and renders
//! one component inside a sandboxed iframe.

use reqwest::Url;
use serde::Serialize;

use super::factory::{build_factory, ComponentFactory};
use super::ComponentRegistry;
use crate::config::PreviewAssets;
use crate::prompt::render;

const TEMPLATE: &str = include_str!("../../assets/preview.html");

#[derive(Debug, Clone)]
pub struct PreviewDocument {
    pub html: String,
    pub factory: Option<ComponentFactory>,
    /// Set when the factory could not be built; the document shows it too.
    pub error: Option<String>,
}

/// JSON text safe to embed inside a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".into())
        .replace('<', "\\u003c")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

fn cdn_origins(assets: &PreviewAssets) -> Vec<String> {
    let mut origins: Vec<String> = Vec::new();
    for raw in [&assets.react_url, &assets.react_dom_url, &assets.babel_url] {
        match Url::parse(raw) {
            Ok(url) => {
                let origin = url.origin().ascii_serialization();
                if origin != "null" && !origins.contains(&origin) {
                    origins.push(origin);
                }
            }
            Err(e) => log::warn!("preview: ignoring invalid asset url {raw}: {e}"),
        }
    }
    origins
}

/// Network access is limited to the script CDNs; everything else is inline.
pub fn content_security_policy(assets: &PreviewAssets) -> String {
    let mut script_src = String::from("'unsafe-inline' 'unsafe-eval'");
    for origin in cdn_origins(assets) {
        script_src.push(' ');
        script_src.push_str(&origin);
    }
    format!("default-src 'none'; script-src {script_src}; style-src 'unsafe-inline'; img-src data:")
}

fn attr_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Builds a fresh preview document for `code`. Never fails: a factory
/// error is embedded in the page and reported in `error`.
pub fn build_document(code: &str, registry: &ComponentRegistry, assets: &PreviewAssets) -> PreviewDocument {
    let (factory, error) = match build_factory(code) {
        Ok(f) => (Some(f), None),
        Err(e) => {
            log::debug!("preview: {e}");
            (None, Some(e.to_string()))
        }
    };

    let csp = attr_escape(&content_security_policy(assets));
    let react_url = attr_escape(&assets.react_url);
    let react_dom_url = attr_escape(&assets.react_dom_url);
    let babel_url = attr_escape(&assets.babel_url);
    let registry_js = registry.script.replace("</script", "<\\/script");
    let factory_json = script_json(&factory);
    let error_json = script_json(&error);

    let html = render(
        TEMPLATE,
        &[
            ("csp", &csp),
            ("reactUrl", &react_url),
            ("reactDomUrl", &react_dom_url),
            ("babelUrl", &babel_url),
            ("registry", &registry_js),
            ("factory", &factory_json),
            ("buildError", &error_json),
        ],
    );

    PreviewDocument { html, factory, error }
}
