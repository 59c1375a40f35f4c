//! Routes resolved requests to the engine and wraps what comes back.
use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    Argument, CallableShape, CompilationEngine, Compiled, CompiledShape, Error, EvaluationRequest,
    NameOverflow, Options, Query, ResolvedSignature, ReturnSlot, SharedInvocable, Signature,
    Typed, Value, resolver,
};

/// Outcome of [`Dispatcher::dispatch`].
#[derive(Debug, Clone)]
pub enum Dispatched {
    /// Artifact produced by a typed request.
    Invocable(SharedInvocable),
    /// Loosely typed result of a dynamic request.
    Value(Value),
}

/// Sends evaluation requests to a [`CompilationEngine`].
///
/// Holds no state across calls besides its options; clones share the engine.
#[derive(Debug)]
pub struct Dispatcher<E> {
    engine: Arc<E>,
    options: Options,
}

impl<E> Clone for Dispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            options: self.options.clone(),
        }
    }
}

impl<E: CompilationEngine> Dispatcher<E> {
    pub fn new(engine: E) -> Self {
        Self::with_options(engine, Options::default())
    }

    pub fn with_options(engine: E, options: Options) -> Self {
        Self::from_shared(Arc::new(engine), options)
    }

    pub fn from_shared(engine: Arc<E>, options: Options) -> Self {
        Self { engine, options }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn set_name_overflow(&mut self, name_overflow: NameOverflow) {
        self.options.name_overflow = name_overflow;
    }

    pub fn set_trace_source(&mut self, trace_source: bool) {
        self.options.trace_source = trace_source;
    }

    /// Resolves `shape` with this dispatcher's name overflow policy.
    #[allow(clippy::result_large_err)]
    pub fn resolve<S: AsRef<str>>(
        &self,
        shape: &CallableShape,
        names: Option<&[S]>,
    ) -> Result<ResolvedSignature, Error> {
        resolver::resolve(shape, names, self.options.name_overflow)
    }

    /// Hands `request` to the engine. Engine failures are returned unchanged.
    pub async fn dispatch(&self, request: EvaluationRequest) -> Result<Dispatched, Error> {
        match request {
            EvaluationRequest::Typed { source, signature } => self
                .dispatch_typed(&source, &signature)
                .await
                .map(Dispatched::Invocable),
            EvaluationRequest::Dynamic {
                template,
                arguments,
            } => self
                .dispatch_dynamic(&template, &arguments)
                .await
                .map(Dispatched::Value),
        }
    }

    async fn dispatch_typed(
        &self,
        source: &str,
        signature: &ResolvedSignature,
    ) -> Result<SharedInvocable, Error> {
        debug!("Dispatching typed request {}", signature);
        if self.options.trace_source {
            trace!("Source: {}", source);
        }

        Ok(self
            .engine
            .compile_typed(source, signature.bindings(), signature.return_type())
            .await?)
    }

    pub(crate) async fn dispatch_dynamic(
        &self,
        template: &str,
        arguments: &[Argument],
    ) -> Result<Value, Error> {
        debug!(
            "Dispatching dynamic request with {} arguments",
            arguments.len()
        );
        if self.options.trace_source {
            trace!("Template: {}", template);
        }

        Ok(self.engine.evaluate_dynamic(template, arguments).await?)
    }

    /// Compiles `code` into `F`, binding inputs to the placeholders `{0}`, `{1}`, ...
    pub async fn compile<F: Signature>(&self, code: &str) -> Result<Compiled<F>, Error> {
        self.compile_with_names(code, &[]).await
    }

    /// Compiles `code` into `F`, binding input `i` to `names[i]` where present.
    pub async fn compile_with_names<F: Signature>(
        &self,
        code: &str,
        names: &[&str],
    ) -> Result<Compiled<F>, Error> {
        let signature = self.resolve(&F::shape(), Some(names))?;
        let invocable = self.dispatch_typed(code, &signature).await?;
        Ok(Compiled::new(invocable, signature))
    }

    /// Compiles `code` for a shape only known at runtime.
    pub async fn compile_shape(
        &self,
        code: &str,
        shape: &CallableShape,
        names: Option<&[&str]>,
    ) -> Result<CompiledShape, Error> {
        let signature = self.resolve(shape, names)?;
        let invocable = self.dispatch_typed(code, &signature).await?;
        Ok(CompiledShape::new(invocable, signature, shape.clone()))
    }

    /// Evaluates `code` once, with `args` bound to `{0}`, `{1}`, ... by position.
    pub async fn execute<R: ReturnSlot>(
        &self,
        code: &str,
        args: impl IntoIterator<Item = Value>,
    ) -> Result<R, Error> {
        let arguments = args.into_iter().map(Argument::Value).collect::<Vec<_>>();
        let value = self.dispatch_dynamic(code, &arguments).await?;
        R::from_return(value)
    }

    /// Starts a predicate query over `sequence`.
    pub fn query<T: Typed>(&self, sequence: impl IntoIterator<Item = T>) -> Query<'_, E, T> {
        Query::new(self, sequence.into_iter().map(Typed::into_value).collect())
    }
}
