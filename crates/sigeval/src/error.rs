use miette::{Diagnostic, LabeledSpan, SourceSpan};
use smol_str::SmolStr;

use crate::{SequenceOperation, ValueType};

/// Failure reported by a [`CompilationEngine`](crate::CompilationEngine).
///
/// The dispatcher never inspects or rewrites these; they reach the caller unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Signature mismatch, expected {expected}, got {actual}")]
    SignatureMismatch { expected: String, actual: String },
    #[error("Compilation failed: {message}")]
    Compilation {
        message: String,
        /// Source text the engine was translating.
        source_code: String,
        /// Location of the failure within `source_code`, when the engine knows it.
        span: Option<SourceSpan>,
    },
    #[error("Execution failed: {0}")]
    Execution(String),
}

impl EngineError {
    pub fn compilation(message: impl Into<String>, source_code: impl Into<String>) -> Self {
        EngineError::Compilation {
            message: message.into(),
            source_code: source_code.into(),
            span: None,
        }
    }

    pub fn with_span(self, offset: usize, len: usize) -> Self {
        match self {
            EngineError::Compilation {
                message,
                source_code,
                ..
            } => EngineError::Compilation {
                message,
                source_code,
                span: Some(SourceSpan::new(offset.into(), len)),
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unsupported callable shape: {0}")]
    UnsupportedShape(String),
    #[error("Too many parameter names, the shape has {inputs} inputs but {names} names were given")]
    BindingCountMismatch { names: usize, inputs: usize },
    #[error("Duplicate parameter name \"{0}\"")]
    DuplicateParameter(SmolStr),
    #[error("Invalid result type, expected {expected}, got {actual}")]
    ResultType { expected: ValueType, actual: String },
    #[error("No element satisfies the predicate of \"{0}\"")]
    NoMatch(SequenceOperation),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl Error {
    pub fn is_compilation_failure(&self) -> bool {
        matches!(
            self,
            Error::Engine(EngineError::Compilation { .. } | EngineError::SignatureMismatch { .. })
        )
    }

    pub fn is_execution_failure(&self) -> bool {
        matches!(self, Error::Engine(EngineError::Execution(_)))
    }
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let c = match self {
            Error::UnsupportedShape(_) => "Error::UnsupportedShape",
            Error::BindingCountMismatch { .. } => "Error::BindingCountMismatch",
            Error::DuplicateParameter(_) => "Error::DuplicateParameter",
            Error::ResultType { .. } => "Error::ResultType",
            Error::NoMatch(_) => "Error::NoMatch",
            Error::Engine(EngineError::SignatureMismatch { .. }) => "EngineError::SignatureMismatch",
            Error::Engine(EngineError::Compilation { .. }) => "EngineError::Compilation",
            Error::Engine(EngineError::Execution(_)) => "EngineError::Execution",
        };

        Some(Box::new(c))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self {
            Error::BindingCountMismatch { .. } => Some(Box::new(
                "Pass at most one name per input, or set the name overflow policy to `ignore`",
            )),
            Error::DuplicateParameter(_) => Some(Box::new(
                "Parameter names must be unique, including the `{n}` placeholders",
            )),
            _ => None,
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Error::Engine(EngineError::Compilation { source_code, .. }) => Some(source_code),
            _ => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Error::Engine(EngineError::Compilation {
                span: Some(span),
                message,
                ..
            }) => Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
                Some(message.clone()),
                *span,
            )))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::unsupported(Error::UnsupportedShape("x".to_string()), "Error::UnsupportedShape")]
    #[case::binding_count(Error::BindingCountMismatch { names: 3, inputs: 2 }, "Error::BindingCountMismatch")]
    #[case::duplicate(Error::DuplicateParameter("a".into()), "Error::DuplicateParameter")]
    #[case::compilation(
        Error::Engine(EngineError::compilation("bad", "a +")),
        "EngineError::Compilation"
    )]
    #[case::execution(Error::Engine(EngineError::Execution("boom".to_string())), "EngineError::Execution")]
    fn test_diagnostic_code(#[case] error: Error, #[case] expected: &str) {
        assert_eq!(error.code().unwrap().to_string(), expected);
    }

    #[test]
    fn test_engine_error_is_transparent() {
        let error = Error::from(EngineError::Execution("boom".to_string()));
        assert_eq!(error.to_string(), "Execution failed: boom");
        assert!(error.is_execution_failure());
        assert!(!error.is_compilation_failure());
    }

    #[test]
    fn test_compilation_labels() {
        let error = Error::from(EngineError::compilation("unexpected end", "a +").with_span(2, 1));
        assert!(error.is_compilation_failure());
        assert!(error.source_code().is_some());
        let labels = error.labels().unwrap().collect::<Vec<_>>();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 2);
        assert_eq!(labels[0].label(), Some("unexpected end"));
    }

    #[test]
    fn test_labels_without_span() {
        let error = Error::from(EngineError::compilation("bad", "x"));
        assert!(error.labels().is_none());
    }
}
