//! Property-based tests for signature resolution and sequence adaptation.
use proptest::prelude::*;
use sigeval::{
    Argument, NameOverflow, ParameterBinding, Predicate, SequenceOperation, Value, adapt, resolve,
};
use sigeval_test::strategies::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_one_binding_per_input((shape, names) in arb_shape_with_names()) {
        let signature = resolve(&shape, Some(names.as_slice()), NameOverflow::Ignore).unwrap();
        let (inputs, output) = shape.decompose().unwrap();

        prop_assert_eq!(signature.arity(), inputs.len());
        prop_assert_eq!(signature.return_type(), output);

        for (position, binding) in signature.bindings().iter().enumerate() {
            prop_assert_eq!(binding.position, position);
            prop_assert_eq!(&binding.ty, &inputs[position]);

            if position < names.len() {
                prop_assert_eq!(binding.name.as_str(), names[position].as_str());
            } else {
                prop_assert_eq!(&binding.name, &ParameterBinding::placeholder(position));
            }
        }
    }

    #[test]
    fn test_excess_names_ignored_or_rejected((shape, names) in arb_shape_with_names()) {
        let inputs = shape.input_count();
        let ignored = resolve(&shape, Some(names.as_slice()), NameOverflow::Ignore).unwrap();
        let truncated = resolve(&shape, Some(&names[..names.len().min(inputs)]), NameOverflow::Ignore).unwrap();
        prop_assert_eq!(&ignored, &truncated);

        let rejected = resolve(&shape, Some(names.as_slice()), NameOverflow::Reject);
        prop_assert_eq!(rejected.is_err(), names.len() > inputs);
    }

    #[test]
    fn test_resolution_is_idempotent((shape, names) in arb_shape_with_names()) {
        let first = resolve(&shape, Some(names.as_slice()), NameOverflow::Ignore).unwrap();
        let second = resolve(&shape, Some(names.as_slice()), NameOverflow::Ignore).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_absent_names_are_all_placeholders(shape in arb_shape(6)) {
        let signature = resolve::<&str>(&shape, None, NameOverflow::Reject).unwrap();
        prop_assert!(signature.bindings().iter().all(|b| b.is_placeholder()));
    }

    #[test]
    fn test_adapter_argument_order(
        operation in arb_sequence_operation(),
        sequence in arb_int_sequence(),
        (predicate, _) in arb_threshold_predicate(),
        context in arb_context(),
    ) {
        let values = sequence.iter().copied().map(Value::from).collect::<Vec<_>>();
        let request = adapt(operation, values.clone(), predicate.clone(), context.clone());

        prop_assert_eq!(request.source(), operation.template());
        prop_assert_eq!(SequenceOperation::from_template(request.source()), Some(operation));

        let arguments = request.arguments();
        prop_assert_eq!(arguments.len(), 3);
        prop_assert_eq!(&arguments[0], &Argument::Expression(Predicate::Tree(predicate)));
        prop_assert_eq!(
            &arguments[1],
            &context.map(Argument::Value).unwrap_or(Argument::NoContext)
        );
        prop_assert_eq!(&arguments[2], &Argument::Value(Value::Array(values)));
    }
}
