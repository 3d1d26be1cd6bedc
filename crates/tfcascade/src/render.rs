//! rendering of derived fragments
//!
//! Derived fragments are [liquid](https://shopify.github.io/liquid/) templates. Liquid's `{{ }}` and `{% %}` do
//! not collide with terraform's own `${ }` and `%{ }`, so a fragment may mix both:
//!
//! ```text
//! bucket = "state-{{ environment }}-${var.region}"
//! ```
//!
//! See [RenderContext] for the available variables.
use crate::descriptor::Descriptor;
use std::path::{Path, PathBuf};

/// Variables available to a derived fragment
#[derive(Debug, Clone, serde::Serialize)]
pub struct RenderContext<'d> {
    pub environment: &'d str,
    pub root_path: &'d Path,
    pub origin_path: &'d Path,
    pub tmpl_name: &'d str,
    pub tmpl_path: &'d Path,
    pub tmpl_rel_paths: &'d [PathBuf],
    pub templates_dir: &'d str,
    pub walkable_paths: &'d [PathBuf],
    /// The layer (ancestor directory) the fragment belongs to
    pub layer: &'d Path,
    /// Position of `layer` in the chain, root is 0
    pub depth: usize,
}

impl<'d> RenderContext<'d> {
    pub fn new(descriptor: &'d Descriptor, depth: usize) -> Self {
        let walkable_paths = descriptor.walkable_paths();
        Self {
            environment: descriptor.environment(),
            root_path: descriptor.root_path(),
            origin_path: descriptor.origin_path(),
            tmpl_name: descriptor.tmpl_name(),
            tmpl_path: descriptor.tmpl_path(),
            tmpl_rel_paths: descriptor.tmpl_rel_paths(),
            templates_dir: &descriptor.settings().templates_dir,
            walkable_paths,
            layer: &walkable_paths[depth],
            depth,
        }
    }
}

/// Turns a derived fragment into the text that is appended to the combined file
pub trait Render {
    fn render(&self, fragment: &str, context: &RenderContext<'_>) -> Result<String, TemplateError>;
}

/// [Render] with liquid's standard library of tags and filters
pub struct LiquidRenderer {
    parser: liquid::Parser,
}

impl LiquidRenderer {
    pub fn new() -> Result<Self, TemplateError> {
        let parser = liquid::ParserBuilder::with_stdlib()
            .build()
            .map_err(TemplateError::Setup)?;
        Ok(Self { parser })
    }
}

impl Render for LiquidRenderer {
    fn render(&self, fragment: &str, context: &RenderContext<'_>) -> Result<String, TemplateError> {
        let template = self.parser.parse(fragment).map_err(TemplateError::Parse)?;
        let globals = liquid::to_object(context).map_err(TemplateError::Context)?;

        template.render(&globals).map_err(TemplateError::Render)
    }
}

impl std::fmt::Debug for LiquidRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiquidRenderer").finish_non_exhaustive()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error("Unable to set up template parser")]
    Setup(#[source] liquid::Error),
    #[error("Unable to parse template")]
    Parse(#[source] liquid::Error),
    #[error("Unable to build template context")]
    Context(#[source] liquid::Error),
    #[error("Unable to render template")]
    Render(#[source] liquid::Error),
    #[error("Template is not valid UTF-8")]
    Utf8(#[source] std::str::Utf8Error),
}
