//! Routes sequence queries through the dynamic compilation path.
//!
//! Every operation owns one fixed template. `{expression}` stands for the predicate,
//! `{0}` for the context object and `{1}` for the sequence, and the request arguments are
//! always ordered `[predicate, context or no-context marker, sequence]`.
//!
//! Element operations (`first`, `last` and the `*_or_default` variants) answer with an array
//! holding the matched element, or an empty array when nothing matched, so a matched `none`
//! element is told apart from no match.
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{Argument, EvaluationRequest, Predicate, Value};

pub const EXPRESSION_PLACEHOLDER: &str = "{expression}";
pub const CONTEXT_PLACEHOLDER: &str = "{0}";
pub const SEQUENCE_PLACEHOLDER: &str = "{1}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceOperation {
    First,
    FirstOrDefault,
    Last,
    LastOrDefault,
    SingleOrDefault,
    Any,
    All,
    Count,
    Filter,
    TakeWhile,
    SkipWhile,
}

impl SequenceOperation {
    pub const ALL: [SequenceOperation; 11] = [
        SequenceOperation::First,
        SequenceOperation::FirstOrDefault,
        SequenceOperation::Last,
        SequenceOperation::LastOrDefault,
        SequenceOperation::SingleOrDefault,
        SequenceOperation::Any,
        SequenceOperation::All,
        SequenceOperation::Count,
        SequenceOperation::Filter,
        SequenceOperation::TakeWhile,
        SequenceOperation::SkipWhile,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SequenceOperation::First => "first",
            SequenceOperation::FirstOrDefault => "first_or_default",
            SequenceOperation::Last => "last",
            SequenceOperation::LastOrDefault => "last_or_default",
            SequenceOperation::SingleOrDefault => "single_or_default",
            SequenceOperation::Any => "any",
            SequenceOperation::All => "all",
            SequenceOperation::Count => "count",
            SequenceOperation::Filter => "filter",
            SequenceOperation::TakeWhile => "take_while",
            SequenceOperation::SkipWhile => "skip_while",
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            SequenceOperation::First => "{1}.first({expression})",
            SequenceOperation::FirstOrDefault => "{1}.first_or_default({expression})",
            SequenceOperation::Last => "{1}.last({expression})",
            SequenceOperation::LastOrDefault => "{1}.last_or_default({expression})",
            SequenceOperation::SingleOrDefault => "{1}.single_or_default({expression})",
            SequenceOperation::Any => "{1}.any({expression})",
            SequenceOperation::All => "{1}.all({expression})",
            SequenceOperation::Count => "{1}.count({expression})",
            SequenceOperation::Filter => "{1}.filter({expression})",
            SequenceOperation::TakeWhile => "{1}.take_while({expression})",
            SequenceOperation::SkipWhile => "{1}.skip_while({expression})",
        }
    }

    pub fn from_template(template: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.template() == template)
    }

    /// Whether the engine answers with a zero- or one-element array.
    pub fn yields_element(&self) -> bool {
        matches!(
            self,
            SequenceOperation::First
                | SequenceOperation::FirstOrDefault
                | SequenceOperation::Last
                | SequenceOperation::LastOrDefault
                | SequenceOperation::SingleOrDefault
        )
    }

    /// Whether an empty match yields the element type's default instead of failing.
    pub fn defaults_when_empty(&self) -> bool {
        matches!(
            self,
            SequenceOperation::FirstOrDefault
                | SequenceOperation::LastOrDefault
                | SequenceOperation::SingleOrDefault
        )
    }
}

impl Display for SequenceOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Builds the dynamic request for `operation` over `sequence`.
///
/// The predicate is not validated; type mismatches inside it are for the engine to report.
pub fn adapt(
    operation: SequenceOperation,
    sequence: impl IntoIterator<Item = Value>,
    predicate: impl Into<Predicate>,
    context: Option<Value>,
) -> EvaluationRequest {
    EvaluationRequest::dynamic(
        operation.template(),
        arguments(sequence, predicate, context),
    )
}

pub(crate) fn arguments(
    sequence: impl IntoIterator<Item = Value>,
    predicate: impl Into<Predicate>,
    context: Option<Value>,
) -> Vec<Argument> {
    vec![
        Argument::Expression(predicate.into()),
        context.map(Argument::Value).unwrap_or(Argument::NoContext),
        Argument::Value(Value::Array(sequence.into_iter().collect())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BindingMode, Expr, Lambda};
    use rstest::rstest;

    fn predicate() -> Lambda {
        Lambda::new(&["x"], Expr::ident("x").gt(Expr::number(2)))
    }

    #[test]
    fn test_last_or_default_without_context() {
        let sequence = (1..=5).map(Value::from).collect::<Vec<_>>();
        let request = adapt(
            SequenceOperation::LastOrDefault,
            sequence.clone(),
            predicate(),
            None,
        );

        assert_eq!(request.mode(), BindingMode::Dynamic);
        assert_eq!(request.source(), "{1}.last_or_default({expression})");
        assert_eq!(
            request.arguments(),
            &[
                Argument::Expression(Predicate::Tree(predicate())),
                Argument::NoContext,
                Argument::Value(Value::Array(sequence)),
            ]
        );
    }

    #[test]
    fn test_context_takes_second_position() {
        let request = adapt(
            SequenceOperation::Any,
            vec![Value::from("a")],
            "x => x == limit",
            Some(Value::from("a")),
        );

        assert_eq!(request.arguments().len(), 3);
        assert_eq!(
            request.arguments()[0].as_expression(),
            Some(&Predicate::Code("x => x == limit".to_string()))
        );
        assert_eq!(request.arguments()[1], Argument::Value(Value::from("a")));
        assert_eq!(
            request.arguments()[2],
            Argument::Value(Value::Array(vec![Value::from("a")]))
        );
    }

    #[rstest]
    #[case(SequenceOperation::First, false)]
    #[case(SequenceOperation::FirstOrDefault, true)]
    #[case(SequenceOperation::LastOrDefault, true)]
    #[case(SequenceOperation::SingleOrDefault, true)]
    #[case(SequenceOperation::Count, false)]
    fn test_defaults_when_empty(#[case] op: SequenceOperation, #[case] expected: bool) {
        assert_eq!(op.defaults_when_empty(), expected);
    }

    #[rstest]
    #[case(SequenceOperation::First, true)]
    #[case(SequenceOperation::Last, true)]
    #[case(SequenceOperation::SingleOrDefault, true)]
    #[case(SequenceOperation::Any, false)]
    #[case(SequenceOperation::Filter, false)]
    fn test_yields_element(#[case] op: SequenceOperation, #[case] expected: bool) {
        assert_eq!(op.yields_element(), expected);
    }

    #[test]
    fn test_templates_are_distinct_and_reversible() {
        for op in SequenceOperation::ALL {
            assert!(op.template().contains(EXPRESSION_PLACEHOLDER));
            assert!(op.template().starts_with(SEQUENCE_PLACEHOLDER));
            assert_eq!(SequenceOperation::from_template(op.template()), Some(op));
        }
        assert_eq!(SequenceOperation::from_template("{1}.unknown()"), None);
    }
}
