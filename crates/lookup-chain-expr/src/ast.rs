//! Expression Abstract Syntax Tree types

/// Expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // === Literals ===
    /// String literal
    String(String),
    /// Numeric literal
    Number(f64),
    /// `True` / `False`
    Boolean(bool),
    /// `None`
    None,

    // === References ===
    /// Bare identifier
    Name(String),
    /// `value.attr`
    Attribute { value: Box<Expr>, attr: String },
    /// `value[key, ...]`
    Subscript { value: Box<Expr>, keys: Vec<Expr> },

    // === Operators ===
    /// `a and b and ...` / `a or b or ...`
    BoolOp { op: BoolOperator, values: Vec<Expr> },
    /// Prefix `+` / `-`
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },

    // === Function call ===
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
    },

    // === Conditional ===
    /// `body if test else orelse`
    Conditional {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
}

impl Expr {
    /// Name of the called function when this is a call on a plain name
    /// or attribute chain.
    pub fn call_name(&self) -> Option<String> {
        match self {
            Expr::Call { func, .. } => func.dotted_name(),
            _ => None,
        }
    }

    /// `a.b.c` for names and attribute chains, `None` otherwise.
    pub fn dotted_name(&self) -> Option<String> {
        match self {
            Expr::Name(name) => Some(name.clone()),
            Expr::Attribute { value, attr } => {
                value.dotted_name().map(|base| format!("{base}.{attr}"))
            }
            _ => None,
        }
    }

    /// Check if this is an if/else node
    pub fn is_conditional(&self) -> bool {
        matches!(self, Expr::Conditional { .. })
    }
}

/// Keyword argument of a call (`key=value`)
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub arg: String,
    pub value: Expr,
}

/// Boolean operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOperator {
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
}

/// One program statement: optional assignment target and a body
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub target: Option<Expr>,
    pub value: Expr,
}
