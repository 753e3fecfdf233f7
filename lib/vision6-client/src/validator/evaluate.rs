use serde_json::{Number, Value};

use super::Violation;
use super::compile::{Additional, Compiled, Items, SchemaType};

impl Compiled {
    /// Evaluates `value` against this schema, coercing simple type mismatches
    /// in place and appending one [`Violation`] per failed constraint.
    pub(super) fn evaluate(&self, value: &mut Value, path: &str, out: &mut Vec<Violation>) {
        if let Some(types) = &self.types
            && !types.iter().any(|schema_type| schema_type.matches(value))
        {
            match coerce(value, types) {
                Some(coerced) => *value = coerced,
                None => {
                    out.push(Violation::new(path, format!("must be {}", type_names(types))));
                    return;
                }
            }
        }

        if let Some(allowed) = &self.enum_values
            && !allowed.contains(value)
        {
            out.push(Violation::new(
                path,
                "must be equal to one of the allowed values",
            ));
        }

        match value {
            Value::String(text) => {
                let chars = text.chars().count();
                if let Some(min) = self.min_length
                    && chars < min
                {
                    out.push(Violation::new(
                        path,
                        format!("must NOT have fewer than {min} characters"),
                    ));
                }
                if let Some(max) = self.max_length
                    && chars > max
                {
                    out.push(Violation::new(
                        path,
                        format!("must NOT have more than {max} characters"),
                    ));
                }
                if let Some(pattern) = &self.pattern
                    && !pattern.is_match(text)
                {
                    out.push(Violation::new(
                        path,
                        format!("must match pattern \"{}\"", pattern.as_str()),
                    ));
                }
                if let Some(format) = self.format
                    && !format.check(text)
                {
                    out.push(Violation::new(
                        path,
                        format!("must match format \"{}\"", format.name()),
                    ));
                }
            }
            Value::Number(number) => {
                if let Some(actual) = number.as_f64() {
                    if let Some(minimum) = self.minimum
                        && actual < minimum
                    {
                        out.push(Violation::new(path, format!("must be >= {minimum}")));
                    }
                    if let Some(maximum) = self.maximum
                        && actual > maximum
                    {
                        out.push(Violation::new(path, format!("must be <= {maximum}")));
                    }
                }
            }
            Value::Array(items) => {
                if let Some(min) = self.min_items
                    && items.len() < min
                {
                    out.push(Violation::new(
                        path,
                        format!("must NOT have fewer than {min} items"),
                    ));
                }
                if let Some(max) = self.max_items
                    && items.len() > max
                {
                    out.push(Violation::new(
                        path,
                        format!("must NOT have more than {max} items"),
                    ));
                }
                self.evaluate_items(items, path, out);
            }
            Value::Object(map) => {
                for name in &self.required {
                    if !map.contains_key(name) {
                        out.push(Violation::new(
                            path,
                            format!("must have required property '{name}'"),
                        ));
                    }
                }
                for (key, item) in map.iter_mut() {
                    if let Some(schema) = self.properties.get(key) {
                        schema.evaluate(item, &format!("{path}/{key}"), out);
                    } else {
                        match &self.additional_properties {
                            Additional::Allowed => {}
                            Additional::Forbidden => out.push(Violation::new(
                                path,
                                format!("must NOT have additional property '{key}'"),
                            )),
                            Additional::Schema(schema) => {
                                schema.evaluate(item, &format!("{path}/{key}"), out);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn evaluate_items(&self, items: &mut [Value], path: &str, out: &mut Vec<Violation>) {
        match &self.items {
            Items::Any => {}
            Items::Single(schema) => {
                for (index, item) in items.iter_mut().enumerate() {
                    schema.evaluate(item, &format!("{path}/{index}"), out);
                }
            }
            Items::Tuple(schemas) => {
                let arity = schemas.len();
                let mut extra_reported = false;
                for (index, item) in items.iter_mut().enumerate() {
                    if let Some(schema) = schemas.get(index) {
                        schema.evaluate(item, &format!("{path}/{index}"), out);
                    } else {
                        match &self.additional_items {
                            Additional::Allowed => {}
                            Additional::Forbidden => {
                                if !extra_reported {
                                    out.push(Violation::new(
                                        path,
                                        format!("must NOT have more than {arity} items"),
                                    ));
                                    extra_reported = true;
                                }
                            }
                            Additional::Schema(schema) => {
                                schema.evaluate(item, &format!("{path}/{index}"), out);
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Attempts the coercions the original validator enables: numeric strings to
/// numbers, numbers and booleans to strings, `"true"`/`"false"`/`0`/`1` to
/// booleans, and a single value to a one-element array where a sequence is
/// expected. Returns `None` when no target type is reachable.
fn coerce(value: &Value, types: &[SchemaType]) -> Option<Value> {
    for target in types {
        let coerced = match target {
            SchemaType::String => match value {
                Value::Number(number) => Some(Value::String(number.to_string())),
                Value::Bool(flag) => Some(Value::String(flag.to_string())),
                _ => None,
            },
            SchemaType::Integer => match value {
                Value::String(text) => text.parse::<i64>().ok().map(Value::from),
                Value::Number(number) => number
                    .as_f64()
                    .filter(|float| float.fract() == 0.0 && float.is_finite())
                    // Outside i64 the cast would saturate; reject instead.
                    .filter(|float| float.abs() < 9_223_372_036_854_775_808.0)
                    .map(|float| Value::from(float as i64)),
                Value::Bool(flag) => Some(Value::from(i64::from(*flag))),
                _ => None,
            },
            SchemaType::Number => match value {
                Value::String(text) => text
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number),
                Value::Bool(flag) => Some(Value::from(i64::from(*flag))),
                _ => None,
            },
            SchemaType::Boolean => match value {
                Value::String(text) => match text.as_str() {
                    "true" => Some(Value::Bool(true)),
                    "false" => Some(Value::Bool(false)),
                    _ => None,
                },
                Value::Number(number) => match number.as_f64() {
                    Some(float) if float == 1.0 => Some(Value::Bool(true)),
                    Some(float) if float == 0.0 => Some(Value::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
            SchemaType::Array => Some(Value::Array(vec![value.clone()])),
            SchemaType::Null | SchemaType::Object => None,
        };
        if coerced.is_some() {
            return coerced;
        }
    }
    None
}

fn type_names(types: &[SchemaType]) -> String {
    types
        .iter()
        .map(|schema_type| schema_type.name())
        .collect::<Vec<_>>()
        .join(" or ")
}
