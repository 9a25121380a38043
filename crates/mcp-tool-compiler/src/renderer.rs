// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::{
    error::ToolError,
    operation::Operation,
    validation::selection::{SelectionNode, SelectionSet, is_graphql_name},
};

/// A GraphQL document ready to be sent, along with the variables it expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedOperation {
    pub query: String,
    pub variables: Map<String, Value>,
}

/// Render the document for a single root-field operation.
///
/// Every declared argument becomes a variable, whether or not the caller supplied a value for it.
/// The call site uses the root field name; the document is named after the tool when that name is
/// a valid GraphQL name.
pub fn render(
    operation: &Operation,
    variables: &Map<String, Value>,
    selection: &SelectionSet,
) -> Result<String, ToolError> {
    if let Some(missing) = operation
        .arguments
        .iter()
        .find(|argument| argument.is_required() && !variables.contains_key(&argument.name))
    {
        return Err(ToolError::MissingRequiredVariable {
            operation_name: operation.name.clone(),
            variable: missing.name.clone(),
        });
    }

    warn_unused_variables(operation, variables);

    let mut query = format!("{} {}", operation.kind.keyword(), document_name(operation));

    if !operation.arguments.is_empty() {
        let declarations = operation
            .arguments
            .iter()
            .map(|argument| format!("${}: {}", argument.name, argument.ty))
            .collect::<Vec<_>>()
            .join(", ");
        query.push_str(&format!("({declarations})"));
    }

    query.push_str(" { ");
    query.push_str(&operation.field_name);

    if !operation.arguments.is_empty() {
        let bindings = operation
            .arguments
            .iter()
            .map(|argument| format!("{}: ${}", argument.name, argument.name))
            .collect::<Vec<_>>()
            .join(", ");
        query.push_str(&format!("({bindings})"));
    }

    if let Some(fields) = render_selection_set(selection) {
        query.push_str(&format!(" {{ {fields} }}"));
    }

    query.push_str(" }");

    Ok(query)
}

/// Keys of `variables` that name none of the operation's arguments.
pub fn unused_variables<'v>(
    operation: &Operation,
    variables: &'v Map<String, Value>,
) -> Vec<&'v str> {
    variables
        .keys()
        .filter(|name| {
            !operation
                .arguments
                .iter()
                .any(|argument| &&argument.name == name)
        })
        .map(String::as_str)
        .collect()
}

/// Report unused variables. They never block rendering.
pub fn warn_unused_variables(operation: &Operation, variables: &Map<String, Value>) {
    for name in unused_variables(operation, variables) {
        warn!(operation = %operation.name, "Variable '{}' is not used by the operation", name);
    }
}

/// Space-separated fields of a selection, or `None` if nothing ends up selected.
fn render_selection_set(selection: &SelectionSet) -> Option<String> {
    let fields: Vec<String> = selection
        .iter()
        .filter_map(|(key, node)| match node {
            SelectionNode::Excluded => None,
            SelectionNode::Included => Some(key.clone()),
            SelectionNode::Nested(nested) => {
                let inner = render_selection_set(nested)?;

                if is_type_condition(key) {
                    Some(format!("... on {key} {{ {inner} }}"))
                } else {
                    Some(format!("{key} {{ {inner} }}"))
                }
            }
        })
        .collect();

    (!fields.is_empty()).then(|| fields.join(" "))
}

// Fields are camelCase; capitalized keys name union members or interface implementers
fn is_type_condition(key: &str) -> bool {
    key.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

fn document_name(operation: &Operation) -> &str {
    if is_graphql_name(&operation.name) {
        &operation.name
    } else {
        &operation.field_name
    }
}
