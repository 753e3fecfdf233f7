use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::store::LoadError;

/// Registry identifier of the bundled schema document.
pub(crate) const REGISTRY: &str = "vision6";

/// A fully dereferenced schema document.
///
/// All internal `$ref` links are resolved at parse time, so every
/// (sub-)schema reachable through [`SchemaDocument::resolve`] is
/// self-contained. The document is immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    id: String,
    root: Value,
}

impl SchemaDocument {
    /// Parses a raw schema document, resolving every internal `$ref`.
    pub fn parse(raw: &Value) -> Result<Self, LoadError> {
        let id = raw
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or(REGISTRY)
            .to_owned();
        let root = dereference(raw)?;
        Ok(Self { id, root })
    }

    /// The document's registry identifier (`"vision6"`).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resolves a schema reference to the (sub-)schema it addresses.
    pub fn resolve(&self, reference: &SchemaRef) -> Option<&Value> {
        if reference.registry != self.id {
            return None;
        }
        let mut node = &self.root;
        for segment in reference.base.iter().chain(&reference.fragment) {
            node = node.get(segment.as_str())?;
        }
        Some(node)
    }
}

/// A reference to a (sub-)schema inside a registered document.
///
/// Rendered as `vision6/methods/{method}#/requestSchema`: the registry id,
/// a path to the method entry, and a fragment pointer below it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaRef {
    registry: String,
    base: Vec<String>,
    fragment: Vec<String>,
}

impl SchemaRef {
    /// Reference to a method's request schema.
    pub fn request(method: &str) -> Self {
        Self::method(method, "requestSchema")
    }

    /// Reference to a method's response schema.
    pub fn response(method: &str) -> Self {
        Self::method(method, "responseSchema")
    }

    fn method(method: &str, section: &str) -> Self {
        Self {
            registry: REGISTRY.to_owned(),
            base: vec!["methods".to_owned(), method.to_owned()],
            fragment: vec![section.to_owned()],
        }
    }

    /// Parses a textual reference such as
    /// `vision6/methods/searchLists#/requestSchema`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (base, fragment) = raw.split_once('#').unwrap_or((raw, ""));
        let mut segments = base.split('/').filter(|segment| !segment.is_empty());
        let registry = segments.next()?.to_owned();
        let base: Vec<String> = segments.map(str::to_owned).collect();
        let fragment = fragment
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect();
        Some(Self {
            registry,
            base,
            fragment,
        })
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.registry)?;
        for segment in &self.base {
            write!(f, "/{segment}")?;
        }
        write!(f, "#")?;
        for segment in &self.fragment {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// Resolves every internal `$ref` into an inlined, self-contained value.
///
/// Only document-local references (`#/...`) are supported; the bundled
/// document never points outside itself. Reference cycles are a load error.
fn dereference(root: &Value) -> Result<Value, LoadError> {
    let mut stack = Vec::new();
    dereference_node(root, root, &mut stack)
}

fn dereference_node(
    root: &Value,
    node: &Value,
    stack: &mut Vec<String>,
) -> Result<Value, LoadError> {
    match node {
        Value::Object(map) => {
            if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                if stack.iter().any(|seen| seen == reference) {
                    return Err(LoadError::CircularRef {
                        reference: reference.to_owned(),
                    });
                }
                let target = lookup_pointer(root, reference).ok_or_else(|| {
                    LoadError::UnresolvedRef {
                        reference: reference.to_owned(),
                    }
                })?;
                stack.push(reference.to_owned());
                let resolved = dereference_node(root, target, stack)?;
                stack.pop();
                Ok(resolved)
            } else {
                let mut out = Map::with_capacity(map.len());
                for (key, value) in map {
                    out.insert(key.clone(), dereference_node(root, value, stack)?);
                }
                Ok(Value::Object(out))
            }
        }
        Value::Array(items) => {
            let out = items
                .iter()
                .map(|item| dereference_node(root, item, stack))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(out))
        }
        other => Ok(other.clone()),
    }
}

fn lookup_pointer<'doc>(root: &'doc Value, reference: &str) -> Option<&'doc Value> {
    let pointer = reference.strip_prefix('#')?;
    root.pointer(pointer)
}

/// Shared handle to a loaded document.
pub(crate) type SharedDocument = Arc<SchemaDocument>;
