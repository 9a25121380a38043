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

use super::validation_error::{
    ValidationError, ValidationIssue, ValidationReason, field_path, json_kind,
};

pub const TYPENAME_FIELD: &str = "__typename";

static TYPENAME_VALIDATOR: SelectionValidator = SelectionValidator::Leaf;

/// Field name (or inline fragment type name) to what is selected under it.
pub type SelectionSet = IndexMap<String, SelectionNode>;

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionNode {
    /// `false` or `null`: explicitly not selected.
    Excluded,
    /// `true`: a leaf field is selected.
    Included,
    Nested(SelectionSet),
}

/// Validator compiled from a GraphQL output type.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionValidator {
    /// Scalars and enums: selected with `true` or `false`.
    Leaf,
    Composite(Arc<CompositeSelection>),
    /// A placeholder standing in for a cyclic or too-deep type: any selection tree whose keys are
    /// GraphQL names is accepted unchecked.
    Permissive,
}

/// Selectable shape of an object, interface, or union type. Strict: keys that are neither a
/// field, a fragment type, nor `__typename` are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeSelection {
    pub type_name: String,
    pub fields: IndexMap<String, SelectionValidator>,
    /// Union members or interface implementers, selectable as inline fragments under their
    /// type name.
    pub fragments: IndexMap<String, SelectionValidator>,
}

/// The selection validator of an operation's return type, along with the selection used when
/// the caller supplies none.
#[derive(Debug, Clone)]
pub struct SelectionSchema {
    pub root: SelectionValidator,
    pub defaults: SelectionSet,
}

impl SelectionSchema {
    /// Validate a caller-supplied selection. Absent, null, or empty selections are replaced by
    /// the defaults; otherwise the selection is returned as given, `false` entries included.
    pub fn validate(
        &self,
        operation_name: &str,
        selection: Option<&Value>,
    ) -> Result<SelectionSet, ValidationError> {
        let entries = match selection {
            None | Some(Value::Null) => return Ok(self.defaults.clone()),
            Some(Value::Object(entries)) if entries.is_empty() => {
                return Ok(self.defaults.clone());
            }
            Some(Value::Object(entries)) => entries,
            Some(other) => {
                return Err(
                    selection_mismatch("", "object", json_kind(other)).into_error(operation_name)
                );
            }
        };

        let validated = match &self.root {
            SelectionValidator::Composite(composite) => composite.check_entries(entries, ""),
            SelectionValidator::Permissive => parse_unchecked(entries, ""),
            // A leaf-returning operation has nothing to select
            SelectionValidator::Leaf => Err(ValidationIssue::new(
                &field_path("", first_key(entries)),
                ValidationReason::UnknownSelectionField,
            )),
        };

        validated.map_err(|issue| issue.into_error(operation_name))
    }

    /// JSON Schema for the first layer of the selection.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();

        if let SelectionValidator::Composite(composite) = &self.root {
            properties.insert(TYPENAME_FIELD.to_string(), json!({ "type": "boolean" }));

            for (name, validator) in composite.fields.iter().chain(&composite.fragments) {
                let schema = match validator {
                    SelectionValidator::Leaf => json!({ "type": "boolean" }),
                    _ => json!({ "type": "object" }),
                };
                properties.insert(name.clone(), schema);
            }
        }

        json!({
            "type": "object",
            "description": "Fields to return: `true` selects a field, a nested object selects fields of an object-typed field. Leave empty for the default selection.",
            "properties": properties,
            "additionalProperties": false,
        })
    }
}

impl CompositeSelection {
    fn check_entries(
        &self,
        entries: &Map<String, Value>,
        path: &str,
    ) -> Result<SelectionSet, ValidationIssue> {
        entries
            .iter()
            .map(|(key, value)| {
                let entry_path = field_path(path, key);

                let validator = if key == TYPENAME_FIELD {
                    &TYPENAME_VALIDATOR
                } else {
                    self.fields
                        .get(key)
                        .or_else(|| self.fragments.get(key))
                        .ok_or_else(|| {
                            ValidationIssue::new(
                                &entry_path,
                                ValidationReason::UnknownSelectionField,
                            )
                        })?
                };

                Ok((key.clone(), validator.check(value, &entry_path)?))
            })
            .collect()
    }
}

impl SelectionValidator {
    fn check(&self, value: &Value, path: &str) -> Result<SelectionNode, ValidationIssue> {
        match (self, value) {
            (_, Value::Null) | (_, Value::Bool(false)) => Ok(SelectionNode::Excluded),
            (SelectionValidator::Leaf, Value::Bool(true)) => Ok(SelectionNode::Included),
            (SelectionValidator::Leaf, other) => {
                Err(selection_mismatch(path, "boolean", json_kind(other)))
            }
            (SelectionValidator::Composite(composite), Value::Object(entries)) => Ok(
                SelectionNode::Nested(composite.check_entries(entries, path)?),
            ),
            // Selecting an object-typed field requires naming its subfields
            (SelectionValidator::Composite(_), other) => {
                Err(selection_mismatch(path, "object", json_kind(other)))
            }
            (SelectionValidator::Permissive, other) => parse_unchecked_value(other, path),
        }
    }
}

fn parse_unchecked(entries: &Map<String, Value>, path: &str) -> Result<SelectionSet, ValidationIssue> {
    entries
        .iter()
        .map(|(key, value)| {
            let entry_path = field_path(path, key);

            // Keys end up verbatim in the rendered document
            if !is_graphql_name(key) {
                return Err(ValidationIssue::new(
                    &entry_path,
                    ValidationReason::UnknownSelectionField,
                ));
            }

            Ok((key.clone(), parse_unchecked_value(value, &entry_path)?))
        })
        .collect()
}

fn parse_unchecked_value(value: &Value, path: &str) -> Result<SelectionNode, ValidationIssue> {
    match value {
        Value::Null | Value::Bool(false) => Ok(SelectionNode::Excluded),
        Value::Bool(true) => Ok(SelectionNode::Included),
        Value::Object(entries) => Ok(SelectionNode::Nested(parse_unchecked(entries, path)?)),
        other => Err(selection_mismatch(path, "boolean or object", json_kind(other))),
    }
}

/// `[_A-Za-z][_0-9A-Za-z]*`
pub(crate) fn is_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();

    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn first_key(entries: &Map<String, Value>) -> &str {
    entries.keys().next().map(|key| key.as_str()).unwrap_or_default()
}

fn selection_mismatch(path: &str, expected: &str, actual: &str) -> ValidationIssue {
    ValidationIssue::new(
        path,
        ValidationReason::SelectionTypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        },
    )
}
