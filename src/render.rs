//! Tree-walking renderer: depth-first, left-to-right, concatenating into
//! one output string.

use std::collections::HashMap;

use crate::ast::{Expr, FilterCall, Node};
use crate::error::{Error, Result};
use crate::eval::{self, Scope};
use crate::filters::FilterFn;
use crate::value::Value;

pub struct Renderer<'a> {
    filters: &'a HashMap<String, FilterFn>,
    auto_escape: bool,
    max_depth: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(
        filters: &'a HashMap<String, FilterFn>,
        auto_escape: bool,
        max_depth: usize,
    ) -> Self {
        Self {
            filters,
            auto_escape,
            max_depth,
        }
    }

    pub fn render(&self, nodes: &[Node], scope: &Scope) -> Result<String> {
        let mut out = String::new();
        self.render_into(&mut out, nodes, scope, 0)?;
        Ok(out)
    }

    fn render_into(
        &self,
        out: &mut String,
        nodes: &[Node],
        scope: &Scope,
        depth: usize,
    ) -> Result<()> {
        if depth > self.max_depth {
            return Err(Error::DepthExceeded {
                limit: self.max_depth,
            });
        }

        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Variable { expr, filters } => {
                    let value = eval::eval(expr, scope);
                    let value = self.apply_filters(value, filters, scope)?;
                    let text = value.to_string();
                    if self.auto_escape {
                        out.push_str(&escape_html(&text));
                    } else {
                        out.push_str(&text);
                    }
                }
                Node::For {
                    binding,
                    iterable,
                    body,
                } => {
                    // Lists iterate in index order, maps in key insertion
                    // order (binding the values); anything else, null
                    // included, contributes nothing.
                    match eval::eval(iterable, scope) {
                        Value::List(items) => {
                            for item in &items {
                                let child = Scope::Overlay {
                                    name: binding,
                                    value: item,
                                    parent: scope,
                                };
                                self.render_into(out, body, &child, depth + 1)?;
                            }
                        }
                        Value::Map(entries) => {
                            for value in entries.values() {
                                let child = Scope::Overlay {
                                    name: binding,
                                    value,
                                    parent: scope,
                                };
                                self.render_into(out, body, &child, depth + 1)?;
                            }
                        }
                        _ => {}
                    }
                }
                Node::If { branches } => {
                    // First truthy branch wins; the unconditioned else
                    // arm, if present, is last. At most one arm renders.
                    for branch in branches {
                        let taken = match &branch.condition {
                            Some(cond) => eval::eval(cond, scope).is_truthy(),
                            None => true,
                        };
                        if taken {
                            self.render_into(out, &branch.body, scope, depth + 1)?;
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Apply a pipeline left to right. Unregistered names pass the value
    /// through untouched; a registered filter returning an error aborts
    /// the render.
    fn apply_filters(
        &self,
        mut value: Value,
        filters: &[FilterCall],
        scope: &Scope,
    ) -> Result<Value> {
        for call in filters {
            let Some(filter) = self.filters.get(&call.name) else {
                continue;
            };
            let args: Vec<Value> = call.args.iter().map(|arg| eval_arg(arg, scope)).collect();
            value = filter(&value, &args).map_err(|message| Error::Filter {
                name: call.name.clone(),
                message,
            })?;
        }
        Ok(value)
    }
}

/// Filter arguments are literals or plain paths, resolved against the
/// current scope so they can reference loop bindings. A bare token whose
/// path misses degrades to a literal string of its own text; a present
/// null value counts as a hit. Quote arguments in the template to force a
/// literal.
fn eval_arg(arg: &Expr, scope: &Scope) -> Value {
    match arg {
        Expr::Path(segments) => eval::resolve_path(segments, scope)
            .unwrap_or_else(|| Value::String(path_text(segments))),
        other => eval::eval(other, scope),
    }
}

fn path_text(segments: &[crate::ast::PathSegment]) -> String {
    use crate::ast::PathSegment;
    let mut out = String::new();
    for segment in segments {
        match segment {
            PathSegment::Field(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            PathSegment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
        }
    }
    out
}

/// Escape `& < > " '` to their HTML entities. Applied exactly once per
/// interpolation site, after stringification.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
