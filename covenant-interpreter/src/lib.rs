//! Expression interpretation for contract tests
//!
//! [`ExpressionInterpreter`] is the interface the contract enforcer talks
//! to. [`Interpreter`] implements it on top of any [`ExpressionBackend`],
//! handling the empty-expression policy, keyword substitution and the
//! folding of errors into [`TestResult`]s. [`ScriptBackend`] is the
//! built-in backend for the contract expression language.

pub mod backend;
pub mod environment;
pub mod error;
pub mod eval;
pub mod interpreter;
pub mod keywords;
pub mod old_refs;
pub mod test_result;

pub use backend::{ExpressionBackend, ExpressionCache, ScriptBackend};
pub use environment::Environment;
pub use error::{EvalError, EvalResult};
pub use interpreter::{ExpressionInterpreter, Interpreter, ScriptInterpreter};
pub use keywords::KeywordSubstitutions;
pub use old_refs::{extract_old_references, OldReferences};
pub use test_result::{FailureCause, TestResult};
