use crate::value::Value;

/// One step of a dotted/bracketed lookup path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Field(String), // foo.bar
    Index(usize),  // foo[0]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not, // !x
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Path(Vec<PathSegment>),
    Unary(UnaryOp, Box<Expr>),
    Binary(Box<Expr>, BinOp, Box<Expr>),
}

/// One stage of an interpolation's filter pipeline. The grammar restricts
/// arguments to literals and plain paths; operators never appear here.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<Expr>,
}

/// One arm of an `{% if %}` chain. `condition` is `None` only for the
/// trailing `{% else %}` arm.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: Option<Expr>,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Variable {
        expr: Expr,
        filters: Vec<FilterCall>,
    },
    For {
        binding: String, // e.g., "item"
        iterable: Expr,  // e.g., the path `items`
        body: Vec<Node>,
    },
    If {
        branches: Vec<Branch>, // if and elifs in order, else (if any) last
    },
}
