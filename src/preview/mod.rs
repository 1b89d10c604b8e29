//! Live preview of generated components.
//!
//! Two strategies share the same registry: [`factory`] produces a function
//! body a host page can instantiate with `new Function`, and [`document`]
//! wraps that body in a self-contained HTML page meant for a sandboxed iframe.

pub mod document;
pub mod factory;

use std::borrow::Cow;

use crate::usage::AllowedComponent;

pub use document::{build_document, PreviewDocument};
pub use factory::{build_factory, ComponentFactory, FACTORY_PARAMS};

/// `sandbox` attribute for the iframe hosting a preview document.
/// Scripts run, but the frame gets an opaque origin.
pub const SANDBOX: &str = "allow-scripts";

const STANDARD_LIBRARY_JS: &str = include_str!("../../assets/component_library.js");

/// The fixed set of components generated code may render, plus the script
/// that implements them. Must define `createComponentLibrary(React)`.
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    pub components: Vec<AllowedComponent>,
    pub script: Cow<'static, str>,
}

impl ComponentRegistry {
    pub fn standard() -> Self {
        Self {
            components: AllowedComponent::ALL.to_vec(),
            script: Cow::Borrowed(STANDARD_LIBRARY_JS),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.iter().any(|c| c.as_str() == name)
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
