//! The boundary to the external compilation engine that turns source text into callables.
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{Argument, EngineError, ParameterBinding, Value, ValueType, Values};

/// A compiled artifact.
///
/// Arguments arrive in binding position order. A non-producing artifact returns
/// [`Value::None`].
pub trait Invocable: Debug + Send + Sync {
    fn invoke(&self, args: Values) -> Result<Value, EngineError>;
}

pub type SharedInvocable = Arc<dyn Invocable>;

/// The collaborator that translates source text into runnable artifacts.
///
/// Implementations must tolerate concurrent calls with different or identical requests,
/// and any caching of identical `(source, bindings)` pairs is theirs to do.
#[async_trait]
pub trait CompilationEngine: Send + Sync {
    /// Compiles `source` into an artifact taking `bindings` and returning `return_type`.
    async fn compile_typed(
        &self,
        source: &str,
        bindings: &[ParameterBinding],
        return_type: Option<&ValueType>,
    ) -> Result<SharedInvocable, EngineError>;

    /// Evaluates `template` once against positional `arguments`.
    async fn evaluate_dynamic(
        &self,
        template: &str,
        arguments: &[Argument],
    ) -> Result<Value, EngineError>;
}

#[async_trait]
impl<E: CompilationEngine + ?Sized> CompilationEngine for Arc<E> {
    async fn compile_typed(
        &self,
        source: &str,
        bindings: &[ParameterBinding],
        return_type: Option<&ValueType>,
    ) -> Result<SharedInvocable, EngineError> {
        (**self).compile_typed(source, bindings, return_type).await
    }

    async fn evaluate_dynamic(
        &self,
        template: &str,
        arguments: &[Argument],
    ) -> Result<Value, EngineError> {
        (**self).evaluate_dynamic(template, arguments).await
    }
}
