// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

/// A caller-supplied variable or selection that does not fit the compiled validator.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid input for '{operation_name}' at '{path}': {reason}")]
pub struct ValidationError {
    pub operation_name: String,
    /// Dotted path to the offending value (`filter.tags[1]`). Empty for the root value.
    pub path: String,
    pub reason: ValidationReason,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationReason {
    #[error("required argument is missing")]
    MissingRequiredArgument,

    #[error("expected {expected}, got {actual}")]
    ArgumentTypeMismatch { expected: String, actual: String },

    #[error("'{value}' is not one of {allowed:?}")]
    InvalidEnumValue { value: String, allowed: Vec<String> },

    #[error("list item expected {expected}, got {actual}")]
    InvalidListItem { expected: String, actual: String },

    #[error("field is not selectable on this type")]
    UnknownSelectionField,

    #[error("selection expected {expected}, got {actual}")]
    SelectionTypeMismatch { expected: String, actual: String },
}

/// An issue found at a path, before it is attributed to an operation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidationIssue {
    pub path: String,
    pub reason: ValidationReason,
}

impl ValidationIssue {
    pub fn new(path: &str, reason: ValidationReason) -> Self {
        Self {
            path: path.to_string(),
            reason,
        }
    }

    pub fn into_error(self, operation_name: &str) -> ValidationError {
        ValidationError {
            operation_name: operation_name.to_string(),
            path: self.path,
            reason: self.reason,
        }
    }
}

pub(crate) fn field_path(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else {
        format!("{parent}.{field}")
    }
}

pub(crate) fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

/// Name of the JSON shape of a value, as used in mismatch messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "object",
    }
}
