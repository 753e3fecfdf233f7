use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// A schema that failed to compile into an evaluatable form.
#[derive(Debug, Clone, derive_more::Error, derive_more::Display)]
#[display("{message}")]
pub(super) struct CompileError {
    pub(super) message: String,
}

impl CompileError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Primitive JSON Schema types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SchemaType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl SchemaType {
    fn parse(name: &str) -> Result<Self, CompileError> {
        match name {
            "null" => Ok(Self::Null),
            "boolean" => Ok(Self::Boolean),
            "integer" => Ok(Self::Integer),
            "number" => Ok(Self::Number),
            "string" => Ok(Self::String),
            "array" => Ok(Self::Array),
            "object" => Ok(Self::Object),
            other => Err(CompileError::new(format!("unknown type '{other}'"))),
        }
    }

    pub(super) fn matches(self, value: &Value) -> bool {
        match self {
            Self::Null => value.is_null(),
            Self::Boolean => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }

    pub(super) fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// Strictly checked string formats (ajv's `format: 'full'` equivalents).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Format {
    Email,
    Date,
    DateTime,
}

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)^
        [A-Za-z0-9.!\#$%&'*+/=?^_`{|}~-]+
        @
        [A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?
        (?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+
        $",
    )
    .expect("email regex is valid")
});

static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").expect("date regex is valid")
});

static DATE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)^
        \d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])
        [Tt\ ]
        ([01]\d|2[0-3]):[0-5]\d:[0-5]\d(\.\d+)?
        ([Zz]|[+-]([01]\d|2[0-3]):[0-5]\d)
        $",
    )
    .expect("date-time regex is valid")
});

impl Format {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "email" => Some(Self::Email),
            "date" => Some(Self::Date),
            "date-time" => Some(Self::DateTime),
            _ => None,
        }
    }

    pub(super) fn check(self, value: &str) -> bool {
        match self {
            Self::Email => EMAIL.is_match(value),
            Self::Date => DATE.is_match(value),
            Self::DateTime => DATE_TIME.is_match(value),
        }
    }

    pub(super) fn name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Date => "date",
            Self::DateTime => "date-time",
        }
    }
}

/// Schema for positions beyond those a tuple/property list covers.
#[derive(Debug)]
pub(super) enum Additional {
    Allowed,
    Forbidden,
    Schema(Box<Compiled>),
}

impl Additional {
    fn compile(node: Option<&Value>) -> Result<Self, CompileError> {
        match node {
            None | Some(Value::Bool(true)) => Ok(Self::Allowed),
            Some(Value::Bool(false)) => Ok(Self::Forbidden),
            Some(schema @ Value::Object(_)) => Ok(Self::Schema(Box::new(Compiled::compile(schema)?))),
            Some(other) => Err(CompileError::new(format!(
                "expected a schema or boolean, got {other}"
            ))),
        }
    }
}

/// Item schemas of an array: a single schema for all items or a positional
/// tuple (the shape every `requestSchema` uses for its `args`).
#[derive(Debug)]
pub(super) enum Items {
    Any,
    Single(Box<Compiled>),
    Tuple(Vec<Compiled>),
}

/// A (sub-)schema compiled into an evaluatable form.
///
/// Compilation is side-effect free and never mutates the source document, so
/// recomputing a cache entry on a miss is idempotent.
#[derive(Debug)]
pub(super) struct Compiled {
    pub(super) types: Option<Vec<SchemaType>>,
    pub(super) properties: IndexMap<String, Compiled>,
    pub(super) required: Vec<String>,
    pub(super) additional_properties: Additional,
    pub(super) items: Items,
    pub(super) additional_items: Additional,
    pub(super) min_items: Option<usize>,
    pub(super) max_items: Option<usize>,
    pub(super) min_length: Option<usize>,
    pub(super) max_length: Option<usize>,
    pub(super) minimum: Option<f64>,
    pub(super) maximum: Option<f64>,
    pub(super) enum_values: Option<Vec<Value>>,
    pub(super) pattern: Option<Regex>,
    pub(super) format: Option<Format>,
}

impl Compiled {
    pub(super) fn compile(node: &Value) -> Result<Self, CompileError> {
        let Value::Object(map) = node else {
            return Err(CompileError::new(format!(
                "schema must be an object, got {node}"
            )));
        };

        let types = match map.get("type") {
            None => None,
            Some(Value::String(name)) => Some(vec![SchemaType::parse(name)?]),
            Some(Value::Array(names)) => {
                let parsed = names
                    .iter()
                    .map(|name| {
                        name.as_str()
                            .ok_or_else(|| CompileError::new(format!("invalid type entry {name}")))
                            .and_then(SchemaType::parse)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Some(parsed)
            }
            Some(other) => {
                return Err(CompileError::new(format!("invalid type keyword {other}")));
            }
        };

        let mut properties = IndexMap::new();
        if let Some(node) = map.get("properties") {
            let Value::Object(entries) = node else {
                return Err(CompileError::new("properties must be an object"));
            };
            for (name, schema) in entries {
                properties.insert(name.clone(), Self::compile(schema)?);
            }
        }

        let required = match map.get("required") {
            None => Vec::new(),
            Some(Value::Array(names)) => names
                .iter()
                .map(|name| {
                    name.as_str().map(str::to_owned).ok_or_else(|| {
                        CompileError::new(format!("invalid required entry {name}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(CompileError::new(format!(
                    "required must be an array, got {other}"
                )));
            }
        };

        let items = match map.get("items") {
            None => Items::Any,
            Some(schema @ Value::Object(_)) => Items::Single(Box::new(Self::compile(schema)?)),
            Some(Value::Array(schemas)) => Items::Tuple(
                schemas
                    .iter()
                    .map(Self::compile)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Some(other) => {
                return Err(CompileError::new(format!("invalid items keyword {other}")));
            }
        };

        let pattern = match map.get("pattern") {
            None => None,
            Some(Value::String(raw)) => Some(Regex::new(raw).map_err(|error| {
                CompileError::new(format!("invalid pattern '{raw}': {error}"))
            })?),
            Some(other) => {
                return Err(CompileError::new(format!(
                    "pattern must be a string, got {other}"
                )));
            }
        };

        let format = match map.get("format").and_then(Value::as_str) {
            None => None,
            Some(name) => {
                let parsed = Format::parse(name);
                if parsed.is_none() {
                    // Unknown formats are not enforced.
                    debug!(target: "vision6::validator", format = name, "ignoring unknown format");
                }
                parsed
            }
        };

        let enum_values = match map.get("enum") {
            None => None,
            Some(Value::Array(values)) => Some(values.clone()),
            Some(other) => {
                return Err(CompileError::new(format!(
                    "enum must be an array, got {other}"
                )));
            }
        };

        Ok(Self {
            types,
            properties,
            required,
            additional_properties: Additional::compile(map.get("additionalProperties"))?,
            items,
            additional_items: Additional::compile(map.get("additionalItems"))?,
            min_items: usize_keyword(map.get("minItems")),
            max_items: usize_keyword(map.get("maxItems")),
            min_length: usize_keyword(map.get("minLength")),
            max_length: usize_keyword(map.get("maxLength")),
            minimum: map.get("minimum").and_then(Value::as_f64),
            maximum: map.get("maximum").and_then(Value::as_f64),
            enum_values,
            pattern,
            format,
        })
    }
}

fn usize_keyword(node: Option<&Value>) -> Option<usize> {
    node.and_then(Value::as_u64)
        .and_then(|bound| usize::try_from(bound).ok())
}
