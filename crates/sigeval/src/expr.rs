//! Expression trees for query predicates.
//!
//! A predicate such as `x => x.age > 18 && !x.banned` is built as a [`Lambda`] and can be
//! rendered back into source text with [`Lambda::to_code`], so an engine may either walk
//! the tree or substitute its text into a template.
use std::fmt::{self, Display, Formatter, Write};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::{Number, Value};

pub type Ident = SmolStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    String(String),
    Number(Number),
    Bool(bool),
    None,
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::String(s) => Value::String(s),
            Literal::Number(n) => Value::Number(n),
            Literal::Bool(b) => Value::Bool(b),
            Literal::None => Value::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Binding strength; higher binds tighter.
    fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Literal(Literal),
    Ident(Ident),
    Field(Box<Expr>, Ident),
    Index(Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Ident, Vec<Expr>),
}

const UNARY_PRECEDENCE: u8 = 7;
const ATOM_PRECEDENCE: u8 = 8;

impl Expr {
    pub fn ident(name: &str) -> Self {
        Expr::Ident(SmolStr::new(name))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(s.into()))
    }

    pub fn number(n: impl Into<Number>) -> Self {
        Expr::Literal(Literal::Number(n.into()))
    }

    pub fn bool(b: bool) -> Self {
        Expr::Literal(Literal::Bool(b))
    }

    pub fn call(name: &str, args: Vec<Expr>) -> Self {
        Expr::Call(SmolStr::new(name), args)
    }

    pub fn field(self, name: &str) -> Self {
        Expr::Field(Box::new(self), SmolStr::new(name))
    }

    pub fn index(self, index: Expr) -> Self {
        Expr::Index(Box::new(self), Box::new(index))
    }

    pub fn binary(self, op: BinaryOp, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(self), Box::new(rhs))
    }

    pub fn and(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::And, rhs)
    }

    pub fn or(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::Or, rhs)
    }

    pub fn equals(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::Eq, rhs)
    }

    pub fn gt(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::Gt, rhs)
    }

    pub fn lt(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::Lt, rhs)
    }

    /// Converts the tree back into source text.
    ///
    /// Parentheses are only emitted where operator precedence requires them, so
    /// `(a + b) * c` keeps its grouping while `a + b * c` is printed as is.
    pub fn to_code(&self) -> String {
        let mut output = String::new();
        self.format_to_code(&mut output);
        output
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary(op, _, _) => op.precedence(),
            Expr::Unary(_, _) => UNARY_PRECEDENCE,
            _ => ATOM_PRECEDENCE,
        }
    }

    fn format_operand(&self, buf: &mut String, min_precedence: u8) {
        if self.precedence() < min_precedence {
            buf.push('(');
            self.format_to_code(buf);
            buf.push(')');
        } else {
            self.format_to_code(buf);
        }
    }

    fn format_to_code(&self, buf: &mut String) {
        match self {
            Expr::Literal(lit) => format_literal(lit, buf),
            Expr::Ident(ident) => buf.push_str(ident),
            Expr::Field(target, name) => {
                target.format_operand(buf, ATOM_PRECEDENCE);
                write!(buf, ".{}", name).unwrap();
            }
            Expr::Index(target, index) => {
                target.format_operand(buf, ATOM_PRECEDENCE);
                buf.push('[');
                index.format_to_code(buf);
                buf.push(']');
            }
            Expr::Unary(op, operand) => {
                buf.push(match op {
                    UnaryOp::Not => '!',
                    UnaryOp::Neg => '-',
                });
                operand.format_operand(buf, UNARY_PRECEDENCE);
            }
            Expr::Binary(op, lhs, rhs) => {
                let precedence = op.precedence();
                lhs.format_operand(buf, precedence);
                write!(buf, " {} ", op.symbol()).unwrap();
                // Left associative: an equal-precedence right operand needs grouping.
                rhs.format_operand(buf, precedence + 1);
            }
            Expr::Call(name, args) => {
                write!(buf, "{}(", name).unwrap();
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    arg.format_to_code(buf);
                }
                buf.push(')');
            }
        }
    }
}

fn format_literal(literal: &Literal, buf: &mut String) {
    match literal {
        Literal::String(s) => {
            buf.push('"');
            buf.push_str(&escape_string(s));
            buf.push('"');
        }
        Literal::Number(n) => write!(buf, "{}", n).unwrap(),
        Literal::Bool(b) => buf.push_str(if *b { "true" } else { "false" }),
        Literal::None => buf.push_str("none"),
    }
}

fn escape_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Self::Output {
        Expr::Unary(UnaryOp::Not, Box::new(self))
    }
}

impl std::ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Self::Output {
        Expr::Unary(UnaryOp::Neg, Box::new(self))
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_code())
    }
}

/// An expression tree with named parameters, e.g. `x => x.age > 18`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lambda {
    pub params: Vec<Ident>,
    pub body: Expr,
}

impl Lambda {
    pub fn new(params: &[&str], body: Expr) -> Self {
        Self {
            params: params.iter().map(|p| SmolStr::new(p)).collect(),
            body,
        }
    }

    pub fn to_code(&self) -> String {
        let params = match self.params.as_slice() {
            [single] => single.to_string(),
            params => format!(
                "({})",
                params.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ")
            ),
        };
        format!("{} => {}", params, self.body.to_code())
    }
}

impl Display for Lambda {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_code())
    }
}

/// A query predicate: an expression tree or a code fragment in the engine's syntax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Tree(Lambda),
    Code(String),
}

impl Predicate {
    pub fn to_code(&self) -> String {
        match self {
            Predicate::Tree(lambda) => lambda.to_code(),
            Predicate::Code(code) => code.clone(),
        }
    }
}

impl From<Lambda> for Predicate {
    fn from(lambda: Lambda) -> Self {
        Predicate::Tree(lambda)
    }
}

impl From<&str> for Predicate {
    fn from(code: &str) -> Self {
        Predicate::Code(code.to_string())
    }
}

impl From<String> for Predicate {
    fn from(code: String) -> Self {
        Predicate::Code(code)
    }
}
