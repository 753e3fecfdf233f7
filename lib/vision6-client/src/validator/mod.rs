//! Schema-driven argument and response validation.
//!
//! [`Validator`] compiles (sub-)schemas out of the loaded document on demand,
//! caches the compilations per reference, and evaluates payloads with type
//! coercion and strict format checking enabled.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tracing::debug;

use crate::schema::{SchemaDocument, SchemaRef};

mod compile;
mod evaluate;

use self::compile::Compiled;

/// One violated constraint, addressed by instance path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Path into the payload (`/args/1`), empty for the root.
    pub instance_path: String,
    /// The violated rule (`must be integer`).
    pub message: String,
}

impl Violation {
    fn new(instance_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            instance_path: instance_path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data{} {}", self.instance_path, self.message)
    }
}

/// Payload shape/type/format violation.
///
/// The message concatenates every violated constraint; the raw violation list
/// and the original (pre-coercion) payload are kept for diagnostics.
#[derive(Debug, Clone, derive_more::Error, derive_more::Display)]
#[display("{message}")]
pub struct ValidationError {
    /// Aggregated human-readable message.
    pub message: String,
    /// Every violated constraint.
    pub violations: Vec<Violation>,
    /// The payload as supplied by the caller.
    pub payload: Value,
}

impl ValidationError {
    fn undefined_payload() -> Self {
        Self {
            message: "Payload is undefined".to_owned(),
            violations: Vec::new(),
            payload: Value::Null,
        }
    }

    fn schema(message: String, payload: Value) -> Self {
        Self {
            message,
            violations: Vec::new(),
            payload,
        }
    }

    fn from_violations(violations: Vec<Violation>, payload: Value) -> Self {
        let message = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            message,
            violations,
            payload,
        }
    }
}

/// Compiles and evaluates (sub-)schemas from the registered document.
///
/// Cheap to clone; clones share the compilation cache. Validation never
/// mutates the document.
#[derive(Debug, Clone)]
pub struct Validator {
    document: Arc<SchemaDocument>,
    cache: Arc<Mutex<HashMap<String, Arc<Compiled>>>>,
}

impl Validator {
    /// Creates a validator over the loaded schema document.
    pub fn new(document: Arc<SchemaDocument>) -> Self {
        Self {
            document,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Validates `payload` against the referenced (sub-)schema.
    ///
    /// Fails immediately when the payload is absent, before any schema work.
    /// On success the (possibly coerced) payload is returned unchanged in
    /// shape; on failure the error aggregates every violated constraint.
    pub fn validate(
        &self,
        reference: &SchemaRef,
        payload: Option<Value>,
    ) -> Result<Value, ValidationError> {
        let Some(mut payload) = payload else {
            return Err(ValidationError::undefined_payload());
        };

        debug!(target: "vision6::validator", %reference, "performing validation");

        let compiled = self
            .compiled(reference)
            .map_err(|message| ValidationError::schema(message, payload.clone()))?;

        let original = payload.clone();
        let mut violations = Vec::new();
        compiled.evaluate(&mut payload, "", &mut violations);

        if violations.is_empty() {
            Ok(payload)
        } else {
            Err(ValidationError::from_violations(violations, original))
        }
    }

    /// Retrieves (or builds and caches) the compiled schema for a reference.
    ///
    /// A miss recomputes idempotently; no lock is held across compilation
    /// input lookup and evaluation.
    fn compiled(&self, reference: &SchemaRef) -> Result<Arc<Compiled>, String> {
        let key = reference.to_string();
        {
            let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = cache.get(&key) {
                return Ok(Arc::clone(hit));
            }
        }

        let node = self
            .document
            .resolve(reference)
            .ok_or_else(|| format!("can't resolve reference {reference}"))?;
        let compiled = Arc::new(
            Compiled::compile(node)
                .map_err(|error| format!("schema compilation failed for {reference}: {error}"))?,
        );

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(
            cache.entry(key).or_insert_with(|| Arc::clone(&compiled)),
        ))
    }
}
