use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;

use crate::{
    CallableShape, Error, ResolvedSignature, ReturnSlot, SharedInvocable, Signature, Typed, Value,
    Values,
};

/// A compiled artifact whose call signature is the Rust function type `F`.
///
/// ```rust,ignore
/// let add: Compiled<fn(i64, i64) -> i64> = dispatcher.compile_with_names("a + b", &["a", "b"]).await?;
/// assert_eq!(add.call(1, 2)?, 3);
/// ```
pub struct Compiled<F> {
    invocable: SharedInvocable,
    signature: ResolvedSignature,
    _shape: PhantomData<F>,
}

impl<F: Signature> Compiled<F> {
    pub(crate) fn new(invocable: SharedInvocable, signature: ResolvedSignature) -> Self {
        Self {
            invocable,
            signature,
            _shape: PhantomData,
        }
    }

    pub fn shape(&self) -> CallableShape {
        F::shape()
    }
}

impl<F> Compiled<F> {
    pub fn signature(&self) -> &ResolvedSignature {
        &self.signature
    }

    /// Invokes the artifact with loosely typed arguments.
    #[allow(clippy::result_large_err)]
    pub fn invoke(&self, args: Values) -> Result<Value, Error> {
        Ok(self.invocable.invoke(args)?)
    }
}

impl<F> Clone for Compiled<F> {
    fn clone(&self) -> Self {
        Self {
            invocable: SharedInvocable::clone(&self.invocable),
            signature: self.signature.clone(),
            _shape: PhantomData,
        }
    }
}

impl<F> Debug for Compiled<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiled")
            .field("signature", &self.signature)
            .field("invocable", &self.invocable)
            .finish()
    }
}

macro_rules! compiled_call {
    ($($arg:ident: $ty:ident),*) => {
        impl<$($ty: Typed + 'static,)* R: ReturnSlot + 'static> Compiled<fn($($ty),*) -> R> {
            #[allow(clippy::too_many_arguments, clippy::result_large_err)]
            pub fn call(&self, $($arg: $ty),*) -> Result<R, Error> {
                let args: Vec<Value> = vec![$($arg.into_value()),*];
                self.invoke(args.into()).and_then(R::from_return)
            }
        }
    };
}

compiled_call!();
compiled_call!(a: A);
compiled_call!(a: A, b: B);
compiled_call!(a: A, b: B, c: C);
compiled_call!(a: A, b: B, c: C, d: D);
compiled_call!(a: A, b: B, c: C, d: D, e: E);
compiled_call!(a: A, b: B, c: C, d: D, e: E, g: G);

/// A compiled artifact for a shape only known at runtime.
#[derive(Debug, Clone)]
pub struct CompiledShape {
    invocable: SharedInvocable,
    signature: ResolvedSignature,
    shape: CallableShape,
}

impl CompiledShape {
    pub(crate) fn new(
        invocable: SharedInvocable,
        signature: ResolvedSignature,
        shape: CallableShape,
    ) -> Self {
        Self {
            invocable,
            signature,
            shape,
        }
    }

    pub fn shape(&self) -> &CallableShape {
        &self.shape
    }

    pub fn signature(&self) -> &ResolvedSignature {
        &self.signature
    }

    #[allow(clippy::result_large_err)]
    pub fn invoke(&self, args: Values) -> Result<Value, Error> {
        Ok(self.invocable.invoke(args)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EngineError, Invocable, NameOverflow, resolve};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Sum;

    impl Invocable for Sum {
        fn invoke(&self, args: Values) -> Result<Value, EngineError> {
            args.into_iter()
                .map(|v| match v {
                    Value::Number(n) => Ok(n.value()),
                    other => Err(EngineError::Execution(format!("not a number: {:?}", other))),
                })
                .sum::<Result<f64, _>>()
                .map(Value::from)
        }
    }

    fn compiled<F: Signature>() -> Compiled<F> {
        let signature = resolve::<&str>(&F::shape(), None, NameOverflow::Ignore).unwrap();
        Compiled::new(Arc::new(Sum), signature)
    }

    #[test]
    fn test_call_converts_arguments_and_result() {
        let add = compiled::<fn(i64, i64) -> i64>();
        assert_eq!(add.call(2, 3).unwrap(), 5);
        assert_eq!(add.signature().arity(), 2);
        assert_eq!(add.shape(), <fn(i64, i64) -> i64>::shape());
    }

    #[test]
    fn test_call_result_type_mismatch() {
        let add = compiled::<fn(i64, i64) -> String>();
        let err = add.call(2, 3).unwrap_err();
        assert!(matches!(err, Error::ResultType { .. }));
    }

    #[test]
    fn test_non_producing_call_discards_result() {
        let run = compiled::<fn(i64)>();
        assert!(run.call(1).is_ok());
    }

    #[test]
    fn test_execution_failure_passes_through() {
        let run = compiled::<fn(Value) -> f64>();
        let err = run.call(Value::from("x")).unwrap_err();
        assert_eq!(
            err,
            Error::Engine(EngineError::Execution("not a number: \"x\"".to_string()))
        );
    }
}
