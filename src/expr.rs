//! Lexer and recursive-descent parser for the expression mini-language
//! used inside `{{ ... }}` bodies, `{% if %}`/`{% elif %}` conditions and
//! `{% for %}` iterables.
//!
//! The grammar is deliberately small: literals, lookup paths, `!`, the
//! arithmetic/relational/equality operators and short-circuiting
//! `&&`/`||`. No assignment, no calls. Interpolation bodies additionally
//! carry a trailing `|filter:arg,...` pipeline, split off before the
//! expression itself is parsed.

use crate::ast::{BinOp, Expr, FilterCall, PathSegment, UnaryOp};
use crate::error::SyntaxError;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,

    Bang,     // !
    Star,     // *
    Slash,    // /
    Percent,  // %
    Plus,     // +
    Minus,    // -
    Lt,       // <
    Le,       // <=
    Gt,       // >
    Ge,       // >=
    EqEq,     // ==
    NotEq,    // !=
    AndAnd,   // &&
    OrOr,     // ||
    Dot,      // .
    LBracket, // [
    RBracket, // ]
    LParen,   // (
    RParen,   // )
}

fn lex(input: &str) -> Result<Vec<Tok>, String> {
    let mut toks = Vec::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        // Two-character operators first.
        let two = [
            ("==", Tok::EqEq),
            ("!=", Tok::NotEq),
            ("<=", Tok::Le),
            (">=", Tok::Ge),
            ("&&", Tok::AndAnd),
            ("||", Tok::OrOr),
        ];
        if let Some((pat, tok)) = two.iter().find(|(pat, _)| rest.starts_with(pat)) {
            toks.push(tok.clone());
            rest = &rest[pat.len()..];
            continue;
        }

        let first = rest.chars().next().unwrap();
        let single = match first {
            '!' => Some(Tok::Bang),
            '*' => Some(Tok::Star),
            '/' => Some(Tok::Slash),
            '%' => Some(Tok::Percent),
            '+' => Some(Tok::Plus),
            '-' => Some(Tok::Minus),
            '<' => Some(Tok::Lt),
            '>' => Some(Tok::Gt),
            '.' => Some(Tok::Dot),
            '[' => Some(Tok::LBracket),
            ']' => Some(Tok::RBracket),
            '(' => Some(Tok::LParen),
            ')' => Some(Tok::RParen),
            _ => None,
        };
        if let Some(tok) = single {
            toks.push(tok);
            rest = &rest[1..];
            continue;
        }

        if first == '\'' || first == '"' {
            let (s, consumed) = lex_string(rest, first)?;
            toks.push(Tok::Str(s));
            rest = &rest[consumed..];
            continue;
        }

        if first.is_ascii_digit() {
            let (n, consumed) = lex_number(rest);
            toks.push(Tok::Number(n));
            rest = &rest[consumed..];
            continue;
        }

        if first.is_alphabetic() || first == '_' {
            let ident: String = rest
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            rest = &rest[ident.len()..];
            toks.push(match ident.as_str() {
                "true" => Tok::True,
                "false" => Tok::False,
                "null" => Tok::Null,
                _ => Tok::Ident(ident),
            });
            continue;
        }

        return Err(format!("unexpected character '{first}'"));
    }

    Ok(toks)
}

/// Lex a quoted string starting at `rest[0] == quote`. Returns the
/// unescaped content and the number of bytes consumed including quotes.
fn lex_string(rest: &str, quote: char) -> Result<(String, usize), String> {
    let mut s = String::new();
    let mut consumed = 1;
    let mut chars = rest[1..].chars();
    while let Some(c) = chars.next() {
        consumed += c.len_utf8();
        if c == quote {
            return Ok((s, consumed));
        }
        if c == '\\' {
            match chars.next() {
                Some(esc) => {
                    consumed += esc.len_utf8();
                    match esc {
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        _ => s.push(esc),
                    }
                }
                None => break,
            }
        } else {
            s.push(c);
        }
    }
    Err("unterminated string literal".to_string())
}

fn lex_number(rest: &str) -> (f64, usize) {
    let bytes = rest.as_bytes();
    let mut end = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    // A fractional part needs a digit after the dot; `a[0].b` must not
    // swallow the dot.
    if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    // The slice is all ASCII digits and at most one dot.
    let n = rest[..end].parse::<f64>().unwrap_or(f64::NAN);
    (n, end)
}

struct ExprParser {
    toks: Vec<Tok>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn consume(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, tok: Tok) -> Result<(), String> {
        match self.consume() {
            Some(t) if t == tok => Ok(()),
            Some(t) => Err(format!("expected {tok:?}, got {t:?}")),
            None => Err(format!("expected {tok:?}, got end of input")),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_and()?;
        while let Some(Tok::OrOr) = self.peek() {
            self.consume();
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(Box::new(lhs), BinOp::Or, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_equality()?;
        while let Some(Tok::AndAnd) = self.peek() {
            self.consume();
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary(Box::new(lhs), BinOp::And, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_relational()?;
        while let Some(op) = match self.peek() {
            Some(Tok::EqEq) => Some(BinOp::Eq),
            Some(Tok::NotEq) => Some(BinOp::Ne),
            _ => None,
        } {
            self.consume();
            let rhs = self.parse_relational()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_additive()?;
        while let Some(op) = match self.peek() {
            Some(Tok::Lt) => Some(BinOp::Lt),
            Some(Tok::Le) => Some(BinOp::Le),
            Some(Tok::Gt) => Some(BinOp::Gt),
            Some(Tok::Ge) => Some(BinOp::Ge),
            _ => None,
        } {
            self.consume();
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_multiplicative()?;
        while let Some(op) = match self.peek() {
            Some(Tok::Plus) => Some(BinOp::Add),
            Some(Tok::Minus) => Some(BinOp::Sub),
            _ => None,
        } {
            self.consume();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_unary()?;
        while let Some(op) = match self.peek() {
            Some(Tok::Star) => Some(BinOp::Mul),
            Some(Tok::Slash) => Some(BinOp::Div),
            Some(Tok::Percent) => Some(BinOp::Rem),
            _ => None,
        } {
            self.consume();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        if let Some(Tok::Bang) = self.peek() {
            self.consume();
            let inner = self.parse_unary()?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.consume() {
            Some(Tok::Number(n)) => Ok(Expr::Literal(Value::Number(n))),
            Some(Tok::Minus) => match self.consume() {
                // Negative literals are a primary form, distinct from
                // binary minus.
                Some(Tok::Number(n)) => Ok(Expr::Literal(Value::Number(-n))),
                t => Err(format!("expected number after '-', got {t:?}")),
            },
            Some(Tok::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Tok::True) => Ok(Expr::Literal(Value::Bool(true))),
            Some(Tok::False) => Ok(Expr::Literal(Value::Bool(false))),
            Some(Tok::Null) => Ok(Expr::Literal(Value::Null)),
            Some(Tok::LParen) => {
                let inner = self.parse_or()?;
                self.expect(Tok::RParen)?;
                Ok(inner)
            }
            Some(Tok::Ident(name)) => self.parse_path(name),
            Some(t) => Err(format!("expected expression, got {t:?}")),
            None => Err("expected expression, got end of input".to_string()),
        }
    }

    /// Continue a path after its leading identifier: `.field` and
    /// `[index]` suffixes, freely mixed.
    fn parse_path(&mut self, head: String) -> Result<Expr, String> {
        let mut segments = vec![PathSegment::Field(head)];
        loop {
            match self.peek() {
                Some(Tok::Dot) => {
                    self.consume();
                    match self.consume() {
                        Some(Tok::Ident(field)) => segments.push(PathSegment::Field(field)),
                        t => return Err(format!("expected field name after '.', got {t:?}")),
                    }
                }
                Some(Tok::LBracket) => {
                    self.consume();
                    let index = match self.consume() {
                        Some(Tok::Number(n)) if n >= 0.0 && n.fract() == 0.0 => n as usize,
                        t => return Err(format!("expected integer index, got {t:?}")),
                    };
                    self.expect(Tok::RBracket)?;
                    segments.push(PathSegment::Index(index));
                }
                _ => break,
            }
        }
        Ok(Expr::Path(segments))
    }

    fn finish(mut self, start: impl FnOnce(&mut Self) -> Result<Expr, String>) -> Result<Expr, String> {
        let expr = start(&mut self)?;
        match self.peek() {
            None => Ok(expr),
            Some(t) => Err(format!("unexpected {t:?} after expression")),
        }
    }
}

/// Parse a full expression (condition bodies, `for` iterables, the head
/// of an interpolation pipeline).
pub fn parse_expr(text: &str) -> Result<Expr, SyntaxError> {
    let toks = lex(text).map_err(|reason| SyntaxError::expr(text, reason))?;
    ExprParser { toks, pos: 0 }
        .finish(ExprParser::parse_or)
        .map_err(|reason| SyntaxError::expr(text, reason))
}

/// Parse an interpolation body: an expression followed by zero or more
/// `|name[:args]` pipeline stages.
pub fn parse_interpolation(text: &str) -> Result<(Expr, Vec<FilterCall>), SyntaxError> {
    let segments = split_pipeline(text);
    let (head, tail) = segments.split_first().expect("split yields >= 1 segment");

    let expr = parse_expr(head)?;
    let filters = tail
        .iter()
        .map(|seg| parse_filter(seg))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((expr, filters))
}

/// Split an interpolation body on top-level pipe characters. `||` is
/// always the OR operator; only a lone `|` outside quotes, parentheses
/// and brackets separates pipeline stages.
fn split_pipeline(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => {
                if matches!(chars.peek(), Some((_, '|'))) {
                    chars.next(); // `||` operator, not a stage boundary
                } else {
                    segments.push(&text[start..i]);
                    start = i + 1;
                }
            }
            _ => {}
        }
    }
    segments.push(&text[start..]);
    segments
}

/// Parse one pipeline stage: `name` or `name: arg1, arg2`.
fn parse_filter(segment: &str) -> Result<FilterCall, SyntaxError> {
    let segment = segment.trim();
    let (name, args_text) = match segment.split_once(':') {
        Some((name, rest)) => (name.trim(), Some(rest)),
        None => (segment, None),
    };

    let valid = !name.is_empty()
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if !valid {
        return Err(SyntaxError::expr(segment, "invalid filter name"));
    }

    let args = match args_text {
        Some(text) => split_args(text).into_iter().map(parse_arg).collect(),
        None => Vec::new(),
    };

    Ok(FilterCall {
        name: name.to_string(),
        args,
    })
}

/// Split a filter argument list on commas and/or whitespace, keeping
/// quoted strings (with escapes) intact.
fn split_args(text: &str) -> Vec<&str> {
    let mut args = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t' || bytes[i] == b',') {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        let start = i;
        if bytes[i] == b'\'' || bytes[i] == b'"' {
            let quote = bytes[i];
            i += 1;
            while i < bytes.len() && bytes[i] != quote {
                if bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(bytes.len()); // past the closing quote
        } else {
            while i < bytes.len() && bytes[i] != b' ' && bytes[i] != b'\t' && bytes[i] != b',' {
                i += 1;
            }
        }
        args.push(text[start..i].trim());
    }

    args
}

/// Parse a single filter argument: a literal or a plain path. Anything
/// that does not parse as one of those degrades to a literal string of
/// the raw token rather than failing the compile.
fn parse_arg(raw: &str) -> Expr {
    let fallback = || Expr::Literal(Value::String(raw.to_string()));
    let Ok(toks) = lex(raw) else {
        return fallback();
    };
    let parsed = ExprParser { toks, pos: 0 }.finish(ExprParser::parse_primary);
    match parsed {
        Ok(expr @ (Expr::Literal(_) | Expr::Path(_))) => expr,
        _ => fallback(),
    }
}
