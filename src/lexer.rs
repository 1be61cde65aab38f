/// A span of the raw template. Inner text of tags is trimmed of
/// surrounding whitespace; empty text spans are dropped entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    Interpolation(String), // {{ ... }}
    Statement(String),     // {% ... %}
}

/// Byte range and payload of the next complete tag in `rest`, if any.
/// Shortest-match: a tag ends at the first matching close delimiter, so
/// adjacent tags stay independent. An opener without a closer is not a
/// tag and cannot shadow a later, complete tag of the other kind.
fn next_tag(rest: &str) -> Option<(usize, usize, Token)> {
    let interp = rest.find("{{").and_then(|start| {
        rest[start + 2..].find("}}").map(|close| {
            let inner = rest[start + 2..start + 2 + close].trim().to_string();
            (start, start + 2 + close + 2, Token::Interpolation(inner))
        })
    });
    let stmt = rest.find("{%").and_then(|start| {
        rest[start + 2..].find("%}").map(|close| {
            let inner = rest[start + 2..start + 2 + close].trim().to_string();
            (start, start + 2 + close + 2, Token::Statement(inner))
        })
    });

    match (interp, stmt) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Split a template into text, interpolation and statement spans.
///
/// Delimiters are not nestable inside one another. This layer never
/// fails; malformed delimiters simply do not match and the surrounding
/// input stays literal text, leaving validation to the template parser.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = input;

    while let Some((start, end, token)) = next_tag(rest) {
        if start > 0 {
            tokens.push(Token::Text(rest[..start].to_string()));
        }
        tokens.push(token);
        rest = &rest[end..];
    }

    if !rest.is_empty() {
        tokens.push(Token::Text(rest.to_string()));
    }

    tokens
}
