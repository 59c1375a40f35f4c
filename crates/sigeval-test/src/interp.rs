//! A small tree-walking evaluator for [`Expr`] used by [`MockEngine`](crate::MockEngine).
use std::cmp::Ordering;

use rustc_hash::{FxHashMap, FxHashSet};
use sigeval::{BinaryOp, EngineError, Expr, Ident, Lambda, Number, UnaryOp, Value};

pub type Env = FxHashMap<Ident, Value>;

/// Builtin functions callable from expressions.
pub const BUILTINS: &[&str] = &["len", "upper", "lower", "contains", "starts_with", "abs"];

/// Collects identifiers `expr` refers to that are neither in `bound` nor builtins.
pub fn free_idents(expr: &Expr, bound: &FxHashSet<Ident>) -> Vec<Ident> {
    let mut free = Vec::new();
    collect_free(expr, bound, &mut free);
    free
}

fn collect_free(expr: &Expr, bound: &FxHashSet<Ident>, free: &mut Vec<Ident>) {
    match expr {
        Expr::Literal(_) => {}
        Expr::Ident(ident) => {
            if !bound.contains(ident) && !free.contains(ident) {
                free.push(ident.clone());
            }
        }
        Expr::Field(target, _) => collect_free(target, bound, free),
        Expr::Index(target, index) => {
            collect_free(target, bound, free);
            collect_free(index, bound, free);
        }
        Expr::Unary(_, operand) => collect_free(operand, bound, free),
        Expr::Binary(_, lhs, rhs) => {
            collect_free(lhs, bound, free);
            collect_free(rhs, bound, free);
        }
        Expr::Call(name, args) => {
            if !BUILTINS.contains(&name.as_str()) && !free.contains(name) {
                free.push(name.clone());
            }
            args.iter().for_each(|arg| collect_free(arg, bound, free));
        }
    }
}

pub fn eval(expr: &Expr, env: &Env) -> Result<Value, EngineError> {
    match expr {
        Expr::Literal(literal) => Ok(literal.clone().into()),
        Expr::Ident(ident) => env
            .get(ident)
            .cloned()
            .ok_or_else(|| EngineError::Execution(format!("undefined identifier `{}`", ident))),
        Expr::Field(target, name) => match eval(target, env)? {
            Value::Dict(map) => Ok(map.get(name.as_str()).cloned().unwrap_or_default()),
            other => Err(type_error(&format!("field `{}`", name), &other)),
        },
        Expr::Index(target, index) => match (eval(target, env)?, eval(index, env)?) {
            (Value::Array(values), Value::Number(n)) => match n.to_i64() {
                Some(i) if i >= 0 => Ok(values.get(i as usize).cloned().unwrap_or_default()),
                _ => Err(EngineError::Execution(format!("invalid array index {}", n))),
            },
            (Value::Dict(map), Value::String(key)) => {
                Ok(map.get(&key).cloned().unwrap_or_default())
            }
            (target, _) => Err(type_error("index", &target)),
        },
        Expr::Unary(UnaryOp::Not, operand) => Ok(Value::Bool(!eval(operand, env)?.is_truthy())),
        Expr::Unary(UnaryOp::Neg, operand) => match eval(operand, env)? {
            Value::Number(n) => Ok(Value::Number(Number::new(-n.value()))),
            other => Err(type_error("-", &other)),
        },
        Expr::Binary(BinaryOp::And, lhs, rhs) => {
            if eval(lhs, env)?.is_truthy() {
                Ok(Value::Bool(eval(rhs, env)?.is_truthy()))
            } else {
                Ok(Value::FALSE)
            }
        }
        Expr::Binary(BinaryOp::Or, lhs, rhs) => {
            if eval(lhs, env)?.is_truthy() {
                Ok(Value::TRUE)
            } else {
                Ok(Value::Bool(eval(rhs, env)?.is_truthy()))
            }
        }
        Expr::Binary(op, lhs, rhs) => binary(*op, eval(lhs, env)?, eval(rhs, env)?),
        Expr::Call(name, args) => {
            let args = args
                .iter()
                .map(|arg| eval(arg, env))
                .collect::<Result<Vec<_>, _>>()?;
            call(name, args)
        }
    }
}

/// Applies a lambda to `args`, binding its parameters by position.
pub fn apply(lambda: &Lambda, env: &Env, args: &[Value]) -> Result<Value, EngineError> {
    let mut scope = env.clone();
    for (param, arg) in lambda.params.iter().zip(args) {
        scope.insert(param.clone(), arg.clone());
    }
    eval(&lambda.body, &scope)
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EngineError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(lhs == rhs)),
        BinaryOp::Ne => Ok(Value::Bool(lhs != rhs)),
        BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
            let ordering = compare(&lhs, &rhs).ok_or_else(|| {
                EngineError::Execution(format!(
                    "cannot compare {} with {}",
                    lhs.type_name(),
                    rhs.type_name()
                ))
            })?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Lte => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        BinaryOp::Add => match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => {
                Ok(Value::Number(Number::new(a.value() + b.value())))
            }
            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            (Value::Array(mut a), Value::Array(b)) => {
                a.extend(b);
                Ok(Value::Array(a))
            }
            (lhs, _) => Err(type_error("+", &lhs)),
        },
        _ => match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => arithmetic(op, a, b).map(Value::Number),
            (lhs, _) => Err(type_error(op.symbol(), &lhs)),
        },
    }
}

fn arithmetic(op: BinaryOp, a: Number, b: Number) -> Result<Number, EngineError> {
    let (a, b) = (a.value(), b.value());
    match op {
        BinaryOp::Sub => Ok(Number::new(a - b)),
        BinaryOp::Mul => Ok(Number::new(a * b)),
        BinaryOp::Div | BinaryOp::Rem if b == 0.0 => {
            Err(EngineError::Execution("division by zero".to_string()))
        }
        BinaryOp::Div => Ok(Number::new(a / b)),
        BinaryOp::Rem => Ok(Number::new(a % b)),
        _ => Err(EngineError::Execution(format!(
            "unsupported operator {}",
            op.symbol()
        ))),
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn call(name: &str, args: Vec<Value>) -> Result<Value, EngineError> {
    match (name, args.as_slice()) {
        ("len", [Value::String(s)]) => Ok(Value::Number(s.chars().count().into())),
        ("len", [Value::Array(a)]) => Ok(Value::Number(a.len().into())),
        ("len", [Value::Dict(d)]) => Ok(Value::Number(d.len().into())),
        ("upper", [Value::String(s)]) => Ok(Value::String(s.to_uppercase())),
        ("lower", [Value::String(s)]) => Ok(Value::String(s.to_lowercase())),
        ("contains", [Value::String(s), Value::String(p)]) => Ok(Value::Bool(s.contains(p))),
        ("contains", [Value::Array(a), v]) => Ok(Value::Bool(a.contains(v))),
        ("starts_with", [Value::String(s), Value::String(p)]) => {
            Ok(Value::Bool(s.starts_with(p.as_str())))
        }
        ("abs", [Value::Number(n)]) => Ok(Value::Number(n.value().abs().into())),
        _ if BUILTINS.contains(&name) => Err(EngineError::Execution(format!(
            "invalid arguments for `{}`: ({})",
            name,
            args.iter().map(Value::type_name).collect::<Vec<_>>().join(", ")
        ))),
        _ => Err(EngineError::Execution(format!("unknown function `{}`", name))),
    }
}

fn type_error(operation: &str, value: &Value) -> EngineError {
    EngineError::Execution(format!(
        "{} is not supported for {}",
        operation,
        value.type_name()
    ))
}
