use std::marker::PhantomData;

use tracing::debug;

use crate::{
    CompilationEngine, Dispatcher, Error, EvaluationRequest, Predicate, SequenceOperation, Typed,
    Value, ValueType, adapt, adapter,
};

/// A predicate query over a sequence, evaluated through the dynamic path.
///
/// ```rust,ignore
/// let last = dispatcher
///     .query(vec![1, 2, 3, 4, 5])
///     .last_or_default(Lambda::new(&["x"], Expr::ident("x").gt(Expr::number(2))))
///     .await?;
/// assert_eq!(last, 5);
/// ```
#[derive(Debug)]
pub struct Query<'a, E, T> {
    dispatcher: &'a Dispatcher<E>,
    sequence: Vec<Value>,
    context: Option<Value>,
    _elem: PhantomData<fn() -> T>,
}

impl<'a, E: CompilationEngine, T: Typed> Query<'a, E, T> {
    pub(crate) fn new(dispatcher: &'a Dispatcher<E>, sequence: Vec<Value>) -> Self {
        Self {
            dispatcher,
            sequence,
            context: None,
            _elem: PhantomData,
        }
    }

    /// Supplies the object bound to `{0}`.
    pub fn with_context<C: Typed>(mut self, context: C) -> Self {
        self.context = Some(context.into_value());
        self
    }

    pub fn sequence(&self) -> &[Value] {
        &self.sequence
    }

    pub fn context(&self) -> Option<&Value> {
        self.context.as_ref()
    }

    /// Builds the request `operation` would send, without sending it.
    pub fn request(
        &self,
        operation: SequenceOperation,
        predicate: impl Into<Predicate>,
    ) -> EvaluationRequest {
        adapt(
            operation,
            self.sequence.iter().cloned(),
            predicate,
            self.context.clone(),
        )
    }

    async fn run(
        self,
        operation: SequenceOperation,
        predicate: impl Into<Predicate>,
    ) -> Result<Value, Error> {
        debug!(
            "Running {} over {} elements",
            operation,
            self.sequence.len()
        );
        let arguments = adapter::arguments(self.sequence, predicate, self.context);
        self.dispatcher
            .dispatch_dynamic(operation.template(), &arguments)
            .await
    }

    /// Runs an element operation; the engine answers `[]` or `[element]`.
    async fn matched(
        self,
        operation: SequenceOperation,
        predicate: impl Into<Predicate>,
    ) -> Result<Option<T>, Error> {
        debug_assert!(operation.yields_element());
        match self.run(operation, predicate).await? {
            Value::Array(mut values) if values.len() <= 1 => {
                values.pop().map(T::from_value).transpose()
            }
            other => Err(Error::ResultType {
                expected: ValueType::array(T::value_type()),
                actual: other.type_name().to_string(),
            }),
        }
    }

    async fn element(
        self,
        operation: SequenceOperation,
        predicate: impl Into<Predicate>,
    ) -> Result<T, Error> {
        self.matched(operation, predicate)
            .await?
            .ok_or(Error::NoMatch(operation))
    }

    async fn element_or_default(
        self,
        operation: SequenceOperation,
        predicate: impl Into<Predicate>,
    ) -> Result<T, Error>
    where
        T: Default,
    {
        Ok(self.matched(operation, predicate).await?.unwrap_or_default())
    }

    async fn elements(
        self,
        operation: SequenceOperation,
        predicate: impl Into<Predicate>,
    ) -> Result<Vec<T>, Error> {
        Vec::<T>::from_value(self.run(operation, predicate).await?)
    }

    pub async fn first(self, predicate: impl Into<Predicate>) -> Result<T, Error> {
        self.element(SequenceOperation::First, predicate).await
    }

    pub async fn first_or_default(self, predicate: impl Into<Predicate>) -> Result<T, Error>
    where
        T: Default,
    {
        self.element_or_default(SequenceOperation::FirstOrDefault, predicate)
            .await
    }

    pub async fn last(self, predicate: impl Into<Predicate>) -> Result<T, Error> {
        self.element(SequenceOperation::Last, predicate).await
    }

    pub async fn last_or_default(self, predicate: impl Into<Predicate>) -> Result<T, Error>
    where
        T: Default,
    {
        self.element_or_default(SequenceOperation::LastOrDefault, predicate)
            .await
    }

    pub async fn single_or_default(self, predicate: impl Into<Predicate>) -> Result<T, Error>
    where
        T: Default,
    {
        self.element_or_default(SequenceOperation::SingleOrDefault, predicate)
            .await
    }

    pub async fn any(self, predicate: impl Into<Predicate>) -> Result<bool, Error> {
        bool::from_value(self.run(SequenceOperation::Any, predicate).await?)
    }

    pub async fn all(self, predicate: impl Into<Predicate>) -> Result<bool, Error> {
        bool::from_value(self.run(SequenceOperation::All, predicate).await?)
    }

    pub async fn count(self, predicate: impl Into<Predicate>) -> Result<usize, Error> {
        usize::from_value(self.run(SequenceOperation::Count, predicate).await?)
    }

    pub async fn filter(self, predicate: impl Into<Predicate>) -> Result<Vec<T>, Error> {
        self.elements(SequenceOperation::Filter, predicate).await
    }

    pub async fn take_while(self, predicate: impl Into<Predicate>) -> Result<Vec<T>, Error> {
        self.elements(SequenceOperation::TakeWhile, predicate).await
    }

    pub async fn skip_while(self, predicate: impl Into<Predicate>) -> Result<Vec<T>, Error> {
        self.elements(SequenceOperation::SkipWhile, predicate).await
    }
}
