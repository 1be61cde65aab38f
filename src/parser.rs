//! Template parser: consumes the token stream and builds the node tree,
//! enforcing block nesting with an explicit stack of open-block frames.

use crate::ast::{Branch, Expr, Node};
use crate::error::SyntaxError;
use crate::expr;
use crate::lexer::{self, Token};

/// An open block whose body is still being appended to.
enum Frame {
    For {
        binding: String,
        iterable: Expr,
        body: Vec<Node>,
    },
    If {
        branches: Vec<Branch>,
        has_else: bool,
    },
}

impl Frame {
    fn kind(&self) -> &'static str {
        match self {
            Frame::For { .. } => "for",
            Frame::If { .. } => "if",
        }
    }
}

struct Parser {
    root: Vec<Node>,
    stack: Vec<Frame>,
}

impl Parser {
    fn new() -> Self {
        Self {
            root: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// The node list currently being appended to: the innermost open
    /// block's body, or the root list.
    fn push_node(&mut self, node: Node) {
        let list = match self.stack.last_mut() {
            None => &mut self.root,
            Some(Frame::For { body, .. }) => body,
            Some(Frame::If { branches, .. }) => {
                // An If frame always holds at least its opening branch.
                &mut branches.last_mut().expect("if frame has a branch").body
            }
        };
        list.push(node);
    }

    fn statement(&mut self, tag: &str) -> Result<(), SyntaxError> {
        if let Some(header) = tag.strip_prefix("for ") {
            let (binding, iterable) = parse_for_header(tag, header)?;
            self.stack.push(Frame::For {
                binding,
                iterable,
                body: Vec::new(),
            });
        } else if tag == "endfor" {
            match self.stack.pop() {
                Some(Frame::For {
                    binding,
                    iterable,
                    body,
                }) => self.push_node(Node::For {
                    binding,
                    iterable,
                    body,
                }),
                _ => return Err(SyntaxError::UnexpectedTag("endfor")),
            }
        } else if let Some(cond) = tag.strip_prefix("if ") {
            let condition = expr::parse_expr(cond)
                .map_err(|_| SyntaxError::MalformedIf {
                    kind: "if",
                    text: tag.to_string(),
                })?;
            self.stack.push(Frame::If {
                branches: vec![Branch {
                    condition: Some(condition),
                    body: Vec::new(),
                }],
                has_else: false,
            });
        } else if let Some(cond) = tag.strip_prefix("elif ") {
            let condition = expr::parse_expr(cond)
                .map_err(|_| SyntaxError::MalformedIf {
                    kind: "elif",
                    text: tag.to_string(),
                })?;
            match self.stack.last_mut() {
                Some(Frame::If {
                    branches,
                    has_else: false,
                }) => branches.push(Branch {
                    condition: Some(condition),
                    body: Vec::new(),
                }),
                _ => return Err(SyntaxError::UnexpectedTag("elif")),
            }
        } else if tag == "else" {
            match self.stack.last_mut() {
                Some(Frame::If { has_else: true, .. }) => {
                    return Err(SyntaxError::DuplicateElse)
                }
                Some(Frame::If { branches, has_else }) => {
                    branches.push(Branch {
                        condition: None,
                        body: Vec::new(),
                    });
                    *has_else = true;
                }
                _ => return Err(SyntaxError::UnexpectedTag("else")),
            }
        } else if tag == "endif" {
            match self.stack.pop() {
                Some(Frame::If { branches, .. }) => self.push_node(Node::If { branches }),
                _ => return Err(SyntaxError::UnexpectedTag("endif")),
            }
        } else {
            return Err(SyntaxError::UnknownTag(tag.to_string()));
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Node>, SyntaxError> {
        if let Some(frame) = self.stack.pop() {
            return Err(SyntaxError::Unclosed(frame.kind()));
        }
        Ok(self.root)
    }
}

/// `for <name> in <expr>`; `header` is the text after `for `.
fn parse_for_header(tag: &str, header: &str) -> Result<(String, Expr), SyntaxError> {
    let malformed = || SyntaxError::MalformedFor(tag.to_string());

    let (binding, iterable_text) = header.split_once(" in ").ok_or_else(malformed)?;
    let binding = binding.trim();
    let is_ident = !binding.is_empty()
        && binding
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
        && binding.chars().all(|c| c.is_alphanumeric() || c == '_');
    if !is_ident {
        return Err(malformed());
    }

    let iterable = expr::parse_expr(iterable_text).map_err(|_| malformed())?;
    Ok((binding.to_string(), iterable))
}

/// Compile template source into a node tree. Either the whole template is
/// valid or this fails; no partial tree escapes.
pub fn parse(source: &str) -> Result<Vec<Node>, SyntaxError> {
    let mut parser = Parser::new();
    for token in lexer::tokenize(source) {
        match token {
            Token::Text(text) => parser.push_node(Node::Text(text)),
            Token::Interpolation(inner) => {
                let (expr, filters) = expr::parse_interpolation(&inner)?;
                parser.push_node(Node::Variable { expr, filters });
            }
            Token::Statement(inner) => parser.statement(&inner)?,
        }
    }
    parser.finish()
}
