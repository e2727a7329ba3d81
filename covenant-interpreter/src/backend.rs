//! Expression backends: the capability interface and the built-in
//! tree-walking backend

use crate::environment::Environment;
use crate::error::{EvalError, EvalResult};
use crate::eval::Evaluator;
use covenant_core::Value;
use covenant_parser::{Expr, Parser};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::trace;

/// Minimal capability a concrete expression language must provide
pub trait ExpressionBackend: Send {
    /// Evaluate an expression against the current scope
    fn evaluate_value(&mut self, expression: &str) -> EvalResult<Value>;

    fn bind_symbol(&mut self, name: &str, value: Value);

    fn unbind_symbol(&mut self, name: &str);

    fn lookup_symbol(&self, name: &str) -> Option<Value>;

    /// Evaluate and require a boolean outcome
    fn evaluate_boolean(&mut self, expression: &str) -> EvalResult<bool> {
        match self.evaluate_value(expression)? {
            Value::Boolean(b) => Ok(b),
            other => Err(EvalError::NonBoolean {
                actual: other.type_name(),
            }),
        }
    }
}

/// Parsed-expression cache keyed by expression text.
///
/// Clones share the same underlying cache, so enforcers on different
/// threads can reuse each other's parses.
#[derive(Clone)]
pub struct ExpressionCache {
    inner: Arc<Mutex<LruCache<String, Arc<Expr>>>>,
}

impl ExpressionCache {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Fetch a parsed expression, parsing and caching it on a miss.
    /// Parse failures are not cached.
    pub fn get_or_parse(&self, expression: &str) -> EvalResult<Arc<Expr>> {
        if let Some(expr) = self.inner.lock().get(expression) {
            trace!(expression, "expression cache hit");
            return Ok(Arc::clone(expr));
        }

        let expr = Arc::new(Parser::new(expression).parse()?);
        self.inner
            .lock()
            .put(expression.to_string(), Arc::clone(&expr));
        Ok(expr)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl Default for ExpressionCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for ExpressionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionCache")
            .field("len", &self.len())
            .finish()
    }
}

/// Built-in backend for the contract expression language
#[derive(Debug, Default)]
pub struct ScriptBackend {
    env: Environment,
    cache: ExpressionCache,
}

impl ScriptBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend sharing an existing parse cache
    pub fn with_cache(cache: ExpressionCache) -> Self {
        Self {
            env: Environment::new(),
            cache,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn cache(&self) -> &ExpressionCache {
        &self.cache
    }
}

impl ExpressionBackend for ScriptBackend {
    fn evaluate_value(&mut self, expression: &str) -> EvalResult<Value> {
        let expr = self.cache.get_or_parse(expression)?;
        Evaluator::new(&self.env).eval(&expr)
    }

    fn bind_symbol(&mut self, name: &str, value: Value) {
        self.env.define(name, value);
    }

    fn unbind_symbol(&mut self, name: &str) {
        self.env.remove(name);
    }

    fn lookup_symbol(&self, name: &str) -> Option<Value> {
        self.env.lookup(name).cloned()
    }
}
