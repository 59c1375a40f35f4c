//! Evaluation requests as handed to the engine, in typed or dynamic binding mode.
use serde::{Deserialize, Serialize};

use crate::{Predicate, ResolvedSignature, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingMode {
    /// Parameters resolved from a concrete callable shape.
    Typed,
    /// Parameters bound loosely by position, as for sequence templates.
    Dynamic,
}

/// A positional argument of a dynamic request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Argument {
    /// Substituted for `{expression}` in a template.
    Expression(Predicate),
    /// Stands in for an absent context object.
    NoContext,
    Value(Value),
}

impl Argument {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Argument::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&Predicate> {
        match self {
            Argument::Expression(predicate) => Some(predicate),
            _ => None,
        }
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Argument::Value(value)
    }
}

/// The unit handed to a compilation engine. Built per call and consumed by dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EvaluationRequest {
    Typed {
        source: String,
        signature: ResolvedSignature,
    },
    Dynamic {
        template: String,
        arguments: Vec<Argument>,
    },
}

impl EvaluationRequest {
    pub fn typed(source: impl Into<String>, signature: ResolvedSignature) -> Self {
        EvaluationRequest::Typed {
            source: source.into(),
            signature,
        }
    }

    pub fn dynamic(template: impl Into<String>, arguments: Vec<Argument>) -> Self {
        EvaluationRequest::Dynamic {
            template: template.into(),
            arguments,
        }
    }

    pub fn mode(&self) -> BindingMode {
        match self {
            EvaluationRequest::Typed { .. } => BindingMode::Typed,
            EvaluationRequest::Dynamic { .. } => BindingMode::Dynamic,
        }
    }

    /// Source text for typed requests, template text for dynamic ones.
    pub fn source(&self) -> &str {
        match self {
            EvaluationRequest::Typed { source, .. } => source,
            EvaluationRequest::Dynamic { template, .. } => template,
        }
    }

    pub fn arguments(&self) -> &[Argument] {
        match self {
            EvaluationRequest::Typed { .. } => &[],
            EvaluationRequest::Dynamic { arguments, .. } => arguments,
        }
    }

    pub fn signature(&self) -> Option<&ResolvedSignature> {
        match self {
            EvaluationRequest::Typed { signature, .. } => Some(signature),
            EvaluationRequest::Dynamic { .. } => None,
        }
    }
}
