//! `sigeval` resolves callable signatures and dispatches code to a pluggable compilation engine.
//!
//! A Rust function type describes the shape of the artifact to build, caller-supplied names
//! become its parameter bindings, and the resulting request is handed to a
//! [`CompilationEngine`]. Sequence predicates travel through the same dispatcher as dynamic
//! requests built from fixed templates.
//!
//! ## Examples
//!
//! ```rust,ignore
//! use sigeval::{Dispatcher, Expr, Lambda};
//!
//! let dispatcher = Dispatcher::new(engine);
//!
//! // Typed: bind `a` and `b` to the two inputs of the artifact.
//! let add = dispatcher
//!     .compile_with_names::<fn(i64, i64) -> i64>("a + b", &["a", "b"])
//!     .await?;
//! assert_eq!(add.call(1, 2)?, 3);
//!
//! // Unnamed inputs fall back to positional placeholders.
//! let neg = dispatcher.compile::<fn(i64) -> i64>("-{0}").await?;
//! assert_eq!(neg.call(4)?, -4);
//!
//! // Dynamic: a predicate query over a sequence.
//! let last = dispatcher
//!     .query(vec![1_i64, 2, 3, 4, 5])
//!     .last_or_default(Lambda::new(&["x"], Expr::ident("x").gt(Expr::number(2))))
//!     .await?;
//! assert_eq!(last, 5);
//! ```
mod adapter;
mod compiled;
mod dispatch;
mod engine;
mod error;
mod expr;
mod number;
mod options;
mod query;
mod request;
mod resolver;
mod shape;
mod types;
mod value;

pub use adapter::{
    CONTEXT_PLACEHOLDER, EXPRESSION_PLACEHOLDER, SEQUENCE_PLACEHOLDER, SequenceOperation, adapt,
};
pub use compiled::{Compiled, CompiledShape};
pub use dispatch::{Dispatched, Dispatcher};
pub use engine::{CompilationEngine, Invocable, SharedInvocable};
pub use error::{EngineError, Error};
pub use expr::{BinaryOp, Expr, Ident, Lambda, Literal, Predicate, UnaryOp};
pub use number::Number;
pub use options::{NAME_OVERFLOW_ENV, NameOverflow, Options, TRACE_SOURCE_ENV};
pub use query::Query;
pub use request::{Argument, BindingMode, EvaluationRequest};
pub use resolver::{ParameterBinding, ResolvedSignature, resolve};
pub use shape::{CallableShape, ShapeKind, Signature, Slots};
pub use types::{ReturnSlot, Typed, ValueType};
pub use value::{Value, Values};
