// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::validation_error::{
    ValidationError, ValidationIssue, ValidationReason, field_path, index_path, json_kind,
};

/// Validator compiled from a GraphQL input type. Nullability is expressed with [`Optional`];
/// everything else must be present and non-null.
///
/// [`Optional`]: ArgumentValidator::Optional
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValidator {
    String,
    Int,
    Float,
    Boolean,
    /// An enum with exactly one value.
    Literal(String),
    Enum(Arc<[String]>),
    List(Box<ArgumentValidator>),
    Object(Arc<ObjectValidator>),
    Optional(Box<ArgumentValidator>),
    /// Accepts anything (input positions holding types that are not legal there).
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValidator {
    pub type_name: Option<String>,
    pub fields: IndexMap<String, ArgumentValidator>,
    /// A placeholder standing in for a cyclic or too-deep input object: every key is passed
    /// through unchecked. Otherwise, keys without a field are dropped.
    pub permissive: bool,
}

impl ObjectValidator {
    pub fn new(type_name: Option<String>, fields: IndexMap<String, ArgumentValidator>) -> Self {
        Self {
            type_name,
            fields,
            permissive: false,
        }
    }

    pub fn permissive(type_name: &str) -> Self {
        Self {
            type_name: Some(type_name.to_string()),
            fields: IndexMap::new(),
            permissive: true,
        }
    }

    /// Validate the variables of an operation. Absent or null variables are treated as an empty
    /// mapping.
    ///
    /// All issues are collected; the first missing required argument is reported if there is
    /// one, else the first issue found.
    pub fn validate_variables(
        &self,
        operation_name: &str,
        variables: Option<&Value>,
    ) -> Result<Map<String, Value>, ValidationError> {
        let empty = Value::Object(Map::new());
        let variables = match variables {
            None | Some(Value::Null) => &empty,
            Some(variables) => variables,
        };

        let mut issues = vec![];
        let validated = self.check(variables, "", &mut issues);

        let reported = issues
            .iter()
            .position(|issue| issue.reason == ValidationReason::MissingRequiredArgument)
            .unwrap_or(0);

        if issues.is_empty() {
            match validated {
                Value::Object(map) => Ok(map),
                _ => Ok(Map::new()),
            }
        } else {
            Err(issues.swap_remove(reported).into_error(operation_name))
        }
    }

    fn check(&self, value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) -> Value {
        let Value::Object(entries) = value else {
            issues.push(mismatch(path, "object", value));
            return Value::Null;
        };

        if self.permissive {
            return value.clone();
        }

        let mut validated = Map::new();

        for (field_name, validator) in &self.fields {
            let entry_path = field_path(path, field_name);

            match entries.get(field_name) {
                Some(field_value) => {
                    let field_value = validator.check(field_value, &entry_path, issues);
                    validated.insert(field_name.clone(), field_value);
                }
                None if validator.is_required() => issues.push(ValidationIssue::new(
                    &entry_path,
                    ValidationReason::MissingRequiredArgument,
                )),
                None => {}
            }
        }

        for stray in entries.keys().filter(|key| !self.fields.contains_key(*key)) {
            debug!(
                "Dropping unknown key '{}' at '{}'",
                stray,
                self.type_name.as_deref().unwrap_or(path)
            );
        }

        Value::Object(validated)
    }

    pub fn json_schema(&self) -> Value {
        if self.permissive {
            return json!({ "type": "object" });
        }

        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, validator)| (name.clone(), validator.json_schema()))
            .collect();
        let required: Vec<&String> = self
            .fields
            .iter()
            .filter(|(_, validator)| validator.is_required())
            .map(|(name, _)| name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

impl ArgumentValidator {
    /// Whether a value must be supplied (absent and null are both rejected).
    pub fn is_required(&self) -> bool {
        !matches!(self, ArgumentValidator::Optional(_) | ArgumentValidator::Any)
    }

    fn check(&self, value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) -> Value {
        match (self, value) {
            (ArgumentValidator::Any, _) => value.clone(),
            (ArgumentValidator::Optional(_), Value::Null) => Value::Null,
            (ArgumentValidator::Optional(inner), _) => inner.check(value, path, issues),
            (_, Value::Null) => {
                issues.push(ValidationIssue::new(
                    path,
                    ValidationReason::MissingRequiredArgument,
                ));
                Value::Null
            }
            (ArgumentValidator::String, Value::String(_))
            | (ArgumentValidator::Float, Value::Number(_))
            | (ArgumentValidator::Boolean, Value::Bool(_)) => value.clone(),
            (ArgumentValidator::Int, Value::Number(number)) if is_integral(number) => {
                value.clone()
            }
            (ArgumentValidator::Literal(expected), Value::String(actual)) => {
                if actual == expected {
                    value.clone()
                } else {
                    issues.push(invalid_enum_value(path, actual, &[expected.clone()]));
                    Value::Null
                }
            }
            (ArgumentValidator::Enum(allowed), Value::String(actual)) => {
                if allowed.contains(actual) {
                    value.clone()
                } else {
                    issues.push(invalid_enum_value(path, actual, allowed));
                    Value::Null
                }
            }
            (ArgumentValidator::List(item), Value::Array(elems)) => Value::Array(
                elems
                    .iter()
                    .enumerate()
                    .map(|(index, elem)| {
                        check_list_item(item, elem, &index_path(path, index), issues)
                    })
                    .collect(),
            ),
            (ArgumentValidator::Object(object), _) => object.check(value, path, issues),
            (_, _) => {
                issues.push(mismatch(path, self.expected(), value));
                Value::Null
            }
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            ArgumentValidator::String => "string",
            ArgumentValidator::Int => "integer",
            ArgumentValidator::Float => "number",
            ArgumentValidator::Boolean => "boolean",
            ArgumentValidator::Literal(_) | ArgumentValidator::Enum(_) => "enum value",
            ArgumentValidator::List(_) => "list",
            ArgumentValidator::Object(_) => "object",
            ArgumentValidator::Optional(inner) => inner.expected(),
            ArgumentValidator::Any => "any value",
        }
    }

    /// JSON Schema describing the values this validator accepts.
    pub fn json_schema(&self) -> Value {
        match self {
            ArgumentValidator::String => json!({ "type": "string" }),
            ArgumentValidator::Int => json!({ "type": "integer" }),
            ArgumentValidator::Float => json!({ "type": "number" }),
            ArgumentValidator::Boolean => json!({ "type": "boolean" }),
            ArgumentValidator::Literal(value) => json!({ "type": "string", "const": value }),
            ArgumentValidator::Enum(values) => json!({ "type": "string", "enum": values.to_vec() }),
            ArgumentValidator::List(item) => json!({ "type": "array", "items": item.json_schema() }),
            ArgumentValidator::Object(object) => object.json_schema(),
            ArgumentValidator::Optional(inner) => inner.json_schema(),
            ArgumentValidator::Any => json!({}),
        }
    }
}

fn check_list_item(
    item: &ArgumentValidator,
    elem: &Value,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Value {
    let mut item_issues = vec![];
    let validated = item.check(elem, path, &mut item_issues);

    // A mismatch of the item itself (rather than something nested in it) is reported as such
    issues.extend(item_issues.into_iter().map(|issue| match issue.reason {
        ValidationReason::ArgumentTypeMismatch { expected, actual } if issue.path == path => {
            ValidationIssue::new(path, ValidationReason::InvalidListItem { expected, actual })
        }
        _ => issue,
    }));

    validated
}

fn is_integral(number: &serde_json::Number) -> bool {
    number.is_i64()
        || number.is_u64()
        || number
            .as_f64()
            .map(|value| value.is_finite() && value.fract() == 0.0)
            .unwrap_or(false)
}

fn mismatch(path: &str, expected: &str, actual: &Value) -> ValidationIssue {
    ValidationIssue::new(
        path,
        ValidationReason::ArgumentTypeMismatch {
            expected: expected.to_string(),
            actual: json_kind(actual).to_string(),
        },
    )
}

fn invalid_enum_value(path: &str, value: &str, allowed: &[String]) -> ValidationIssue {
    ValidationIssue::new(
        path,
        ValidationReason::InvalidEnumValue {
            value: value.to_string(),
            allowed: allowed.to_vec(),
        },
    )
}
