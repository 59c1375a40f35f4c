use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rustc_hash::{FxHashMap, FxHashSet};
use sigeval::{
    Argument, CompilationEngine, EngineError, EvaluationRequest, Expr, Ident, Invocable, Lambda,
    ParameterBinding, Predicate, ResolvedSignature, SequenceOperation, SharedInvocable, Value,
    ValueType, Values,
};
use smol_str::SmolStr;
use tracing::debug;

use crate::interp::{self, Env};

type NativeFn = Arc<dyn Fn(Values) -> Result<Value, EngineError> + Send + Sync>;

#[derive(Clone)]
enum Definition {
    Expr(Expr),
    Native(NativeFn),
}

#[derive(Default)]
struct Registry {
    definitions: FxHashMap<String, Definition>,
    predicates: FxHashMap<String, Lambda>,
    failures: FxHashMap<String, EngineError>,
}

/// An in-memory [`CompilationEngine`].
///
/// Source text is not parsed. Typed sources and `execute` templates are looked up among
/// definitions registered with [`MockEngine::define`] or [`MockEngine::define_native`], and
/// predicates given as code are looked up among [`MockEngine::define_predicate`]. Every
/// request is recorded.
#[derive(Default)]
pub struct MockEngine {
    registry: Mutex<Registry>,
    requests: Mutex<Vec<EvaluationRequest>>,
    compilations: AtomicUsize,
}

impl Debug for MockEngine {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockEngine")
            .field("compilations", &self.compilations)
            .finish_non_exhaustive()
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines `source` as the expression `expr`.
    pub fn define(&self, source: &str, expr: Expr) -> &Self {
        self.registry()
            .definitions
            .insert(source.to_string(), Definition::Expr(expr));
        self
    }

    /// Defines `source` as a host closure taking arguments in binding order.
    pub fn define_native<F>(&self, source: &str, f: F) -> &Self
    where
        F: Fn(Values) -> Result<Value, EngineError> + Send + Sync + 'static,
    {
        self.registry()
            .definitions
            .insert(source.to_string(), Definition::Native(Arc::new(f)));
        self
    }

    /// Makes predicate code `code` evaluate as `lambda`.
    pub fn define_predicate(&self, code: &str, lambda: Lambda) -> &Self {
        self.registry()
            .predicates
            .insert(code.to_string(), lambda);
        self
    }

    /// Makes every request for `source` fail with `error`.
    pub fn fail_with(&self, source: &str, error: EngineError) -> &Self {
        self.registry()
            .failures
            .insert(source.to_string(), error);
        self
    }

    pub fn requests(&self) -> Vec<EvaluationRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<EvaluationRequest> {
        self.requests().pop()
    }

    /// Number of successful typed compilations.
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::SeqCst)
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, request: EvaluationRequest) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
    }

    fn definition(&self, source: &str) -> Result<Definition, EngineError> {
        let registry = self.registry();
        if let Some(error) = registry.failures.get(source) {
            return Err(error.clone());
        }
        registry
            .definitions
            .get(source)
            .cloned()
            .ok_or_else(|| EngineError::compilation("no definition for source", source))
    }

    fn predicate(&self, predicate: &Predicate) -> Result<Lambda, EngineError> {
        match predicate {
            Predicate::Tree(lambda) => Ok(lambda.clone()),
            Predicate::Code(code) => self
                .registry()
                .predicates
                .get(code)
                .cloned()
                .ok_or_else(|| EngineError::compilation("unknown predicate", code.as_str())),
        }
    }

    fn evaluate_sequence(
        &self,
        operation: SequenceOperation,
        arguments: &[Argument],
    ) -> Result<Value, EngineError> {
        let (predicate, context, sequence) = match arguments {
            [Argument::Expression(p), context, Argument::Value(Value::Array(s))] => (p, context, s),
            _ => {
                return Err(EngineError::SignatureMismatch {
                    expected: "(expression, context, array)".to_string(),
                    actual: format!("{} arguments", arguments.len()),
                });
            }
        };
        let lambda = self.predicate(predicate)?;

        let mut env = Env::default();
        if let Argument::Value(context) = context {
            if let Value::Dict(fields) = context {
                env.extend(
                    fields
                        .iter()
                        .map(|(k, v)| (SmolStr::new(k), v.clone())),
                );
            }
            env.insert(ParameterBinding::placeholder(0), context.clone());
        }

        let test = |index: usize, value: &Value| -> Result<bool, EngineError> {
            match interp::apply(&lambda, &env, &[value.clone(), Value::from(index as i64)])? {
                Value::Bool(b) => Ok(b),
                other => Err(EngineError::Execution(format!(
                    "predicate returned {} instead of bool",
                    other.type_name()
                ))),
            }
        };

        let mut matched = Vec::new();
        for (index, value) in sequence.iter().enumerate() {
            if test(index, value)? {
                matched.push(value.clone());
            }
        }

        Ok(match operation {
            SequenceOperation::First | SequenceOperation::FirstOrDefault => {
                matched.truncate(1);
                Value::Array(matched)
            }
            SequenceOperation::Last | SequenceOperation::LastOrDefault => {
                Value::Array(matched.pop().into_iter().collect())
            }
            SequenceOperation::SingleOrDefault => match matched.len() {
                0 | 1 => Value::Array(matched),
                n => {
                    return Err(EngineError::Execution(format!(
                        "expected at most one match, found {}",
                        n
                    )));
                }
            },
            SequenceOperation::Any => Value::Bool(!matched.is_empty()),
            SequenceOperation::All => Value::Bool(matched.len() == sequence.len()),
            SequenceOperation::Count => Value::from(matched.len() as i64),
            SequenceOperation::Filter => Value::Array(matched),
            SequenceOperation::TakeWhile => {
                let mut taken = Vec::new();
                for (index, value) in sequence.iter().enumerate() {
                    if !test(index, value)? {
                        break;
                    }
                    taken.push(value.clone());
                }
                Value::Array(taken)
            }
            SequenceOperation::SkipWhile => {
                let mut rest = sequence.as_slice();
                while let Some((value, tail)) = rest.split_first() {
                    if !test(sequence.len() - rest.len(), value)? {
                        break;
                    }
                    rest = tail;
                }
                Value::Array(rest.to_vec())
            }
        })
    }

    fn evaluate_template(&self, template: &str, arguments: &[Argument]) -> Result<Value, EngineError> {
        let mut env = Env::default();
        for (position, argument) in arguments.iter().enumerate() {
            let value = argument.as_value().cloned().unwrap_or_default();
            env.insert(ParameterBinding::placeholder(position), value);
        }

        match self.definition(template)? {
            Definition::Expr(expr) => interp::eval(&expr, &env),
            Definition::Native(f) => (*f)(arguments
                .iter()
                .map(|a| a.as_value().cloned().unwrap_or_default())
                .collect()),
        }
    }
}

#[async_trait]
impl CompilationEngine for MockEngine {
    async fn compile_typed(
        &self,
        source: &str,
        bindings: &[ParameterBinding],
        return_type: Option<&ValueType>,
    ) -> Result<SharedInvocable, EngineError> {
        self.record(EvaluationRequest::typed(
            source,
            ResolvedSignature::new(bindings.to_vec(), return_type.cloned()),
        ));

        let invocable: SharedInvocable = match self.definition(source)? {
            Definition::Expr(expr) => {
                let bound = bindings.iter().map(|b| b.name.clone()).collect::<FxHashSet<_>>();
                if let Some(ident) = interp::free_idents(&expr, &bound).first() {
                    return Err(EngineError::compilation(
                        format!("unknown identifier `{}`", ident),
                        source,
                    ));
                }
                Arc::new(ExprInvocable {
                    params: bindings.iter().map(|b| b.name.clone()).collect(),
                    body: expr,
                    producing: return_type.is_some(),
                })
            }
            Definition::Native(f) => Arc::new(NativeInvocable(f)),
        };

        self.compilations.fetch_add(1, Ordering::SeqCst);
        debug!("Compiled `{}` with {} bindings", source, bindings.len());
        Ok(invocable)
    }

    async fn evaluate_dynamic(
        &self,
        template: &str,
        arguments: &[Argument],
    ) -> Result<Value, EngineError> {
        self.record(EvaluationRequest::dynamic(template, arguments.to_vec()));

        if let Some(error) = self.registry().failures.get(template) {
            return Err(error.clone());
        }

        match SequenceOperation::from_template(template) {
            Some(operation) => self.evaluate_sequence(operation, arguments),
            None => self.evaluate_template(template, arguments),
        }
    }
}

#[derive(Debug)]
struct ExprInvocable {
    params: Vec<Ident>,
    body: Expr,
    producing: bool,
}

impl Invocable for ExprInvocable {
    fn invoke(&self, args: Values) -> Result<Value, EngineError> {
        if args.len() != self.params.len() {
            return Err(EngineError::Execution(format!(
                "expected {} arguments, got {}",
                self.params.len(),
                args.len()
            )));
        }

        let env = self.params.iter().cloned().zip(args).collect::<Env>();
        let value = interp::eval(&self.body, &env)?;
        Ok(if self.producing { value } else { Value::None })
    }
}

struct NativeInvocable(NativeFn);

impl Debug for NativeInvocable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("NativeInvocable")
    }
}

impl Invocable for NativeInvocable {
    fn invoke(&self, args: Values) -> Result<Value, EngineError> {
        (*self.0)(args)
    }
}
