//! tinystencil: a small, safe text-templating engine.
//!
//! This crate does one job: compile a template string mixing literal text
//! with `{{ ... }}` interpolations and `{% ... %}` statements into a
//! reusable tree, then render that tree against a data context.
//!
//! Supported syntax:
//! - Interpolation with filter pipelines: `{{ user.name | upper }}`,
//!   `{{ price | formatUSD }}`, `{{ bio | truncate: 80 }}`.
//! - Loops: `{% for item in items %} ... {% endfor %}` (lists in order,
//!   maps by insertion order binding the values).
//! - Conditionals: `{% if cond %} ... {% elif cond %} ... {% else %} ...
//!   {% endif %}`.
//! - Expressions: literals, dotted/bracketed paths (`a.b[0].c`), `!`,
//!   `* / %`, `+ -`, `< <= > >=`, `== !=`, short-circuiting `&&`/`||`.
//!
//! Deliberately not supported:
//! - Template inheritance or includes.
//! - Assignment, function calls, or any user code in expressions; the
//!   only extension point is the named filter registry.
//!
//! Missing data never fails a render: an unresolvable path, a
//! type-mismatched operator or a non-iterable loop subject degrades to
//! null/falsy/no-iterations. Interpolated output is HTML-escaped by
//! default (see [`Engine::with_auto_escape`]).
//!
//! ```
//! use tinystencil::{Context, Engine};
//!
//! let engine = Engine::new();
//! let template = engine.compile("Hello {{ name | upper }}!").unwrap();
//!
//! let mut ctx = Context::new();
//! ctx.insert("name", "ada");
//! assert_eq!(template.render(&ctx).unwrap(), "Hello ADA!");
//! ```
//!
//! A bare filter argument is resolved against the context first and only
//! falls back to a literal string when the lookup misses; quote arguments
//! that must stay literal.

mod ast;
mod error;
mod eval;
mod expr;
mod filters;
mod lexer;
mod parser;
mod render;
mod scan;
mod value;

use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::Node;
use crate::eval::Scope;
use crate::render::Renderer;

pub use crate::error::{Error, Result, SyntaxError};
pub use crate::filters::{FilterFn, FilterResult};
pub use crate::scan::extract_paths;
pub use crate::value::{Context, Value};

const DEFAULT_MAX_DEPTH: usize = 64;

/// Compiles templates and owns the filter registry.
///
/// The registry is copied into each compiled [`Template`] at compile
/// time, so mutating it afterwards never races with an in-flight render
/// of an already-compiled template.
pub struct Engine {
    filters: HashMap<String, FilterFn>,
    auto_escape: bool,
    max_depth: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with the default filters, HTML auto-escaping on and a
    /// nesting depth bound of 64.
    pub fn new() -> Self {
        Self {
            filters: filters::defaults(),
            auto_escape: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Toggle HTML entity escaping of interpolated output.
    pub fn with_auto_escape(mut self, on: bool) -> Self {
        self.auto_escape = on;
        self
    }

    /// Bound on nested `for`/`if` levels during rendering. Rendering a
    /// deeper template aborts with [`Error::DepthExceeded`].
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Register a filter, replacing any same-named one (defaults
    /// included). Affects templates compiled after this call only.
    pub fn add_filter(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&Value, &[Value]) -> FilterResult + Send + Sync + 'static,
    ) {
        self.filters.insert(name.into(), Arc::new(f));
    }

    pub fn remove_filter(&mut self, name: &str) {
        self.filters.remove(name);
    }

    /// The currently effective filter registry.
    pub fn filters(&self) -> &HashMap<String, FilterFn> {
        &self.filters
    }

    /// Compile a template string into a reusable [`Template`]. Either the
    /// whole template is valid or this fails with [`Error::Syntax`].
    pub fn compile(&self, source: &str) -> Result<Template> {
        let nodes = parser::parse(source)?;
        tracing::debug!(nodes = nodes.len(), "compiled template");
        Ok(Template {
            nodes,
            filters: Arc::new(self.filters.clone()),
            auto_escape: self.auto_escape,
            max_depth: self.max_depth,
        })
    }

    /// One-shot compile and render.
    pub fn render(&self, source: &str, context: &Context) -> Result<String> {
        self.compile(source)?.render(context)
    }
}

/// A compiled template: an immutable tree plus a snapshot of the filter
/// registry it was compiled with. Safe to render concurrently from many
/// threads; each render builds its own scope chain.
#[derive(Clone)]
pub struct Template {
    nodes: Vec<Node>,
    filters: Arc<HashMap<String, FilterFn>>,
    auto_escape: bool,
    max_depth: usize,
}

// Derive is off the table: `filters` holds `Arc<dyn Fn>` values.
impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("nodes", &self.nodes)
            .field("auto_escape", &self.auto_escape)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

impl Template {
    pub fn render(&self, context: &Context) -> Result<String> {
        tracing::trace!(nodes = self.nodes.len(), "rendering template");
        Renderer::new(&self.filters, self.auto_escape, self.max_depth)
            .render(&self.nodes, &Scope::Base(context))
    }
}

/// Compile with a default [`Engine`].
pub fn compile(source: &str) -> Result<Template> {
    Engine::new().compile(source)
}

/// Compile and render in one call with a default [`Engine`].
pub fn render(source: &str, context: &Context) -> Result<String> {
    Engine::new().render(source, context)
}
