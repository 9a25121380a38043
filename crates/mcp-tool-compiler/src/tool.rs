// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::{
    compiler::SchemaCompiler,
    error::ToolError,
    operation::Operation,
    renderer::{self, RenderedOperation},
    validation::{
        argument::ObjectValidator,
        selection::{SelectionSchema, SelectionSet},
        validation_error::ValidationError,
    },
};

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> String;

    fn description(&self) -> String;

    fn input_schema(&self) -> Value;

    async fn execute(&self, arguments: Value) -> Result<RenderedOperation, ToolError>;
}

#[derive(serde::Deserialize)]
struct ToolInput {
    variables: Option<Value>,
    selection: Option<Value>,
}

/// A root field of the schema, compiled into everything needed to turn caller input into a
/// GraphQL document.
#[derive(Debug, Clone)]
pub struct OperationTool {
    operation: Operation,
    description: String,
    argument_validator: Arc<ObjectValidator>,
    selection_schema: SelectionSchema,
}

impl OperationTool {
    pub fn compile(operation: Operation, compiler: &mut SchemaCompiler<'_>) -> Self {
        let argument_validator = compiler.compile_operation_arguments(&operation);
        let selection_schema = compiler.compile_operation_selection(&operation);

        let description = operation
            .description
            .clone()
            .unwrap_or_else(|| format!("GraphQL {} {}", operation.kind, operation.field_name));

        Self {
            operation,
            description,
            argument_validator,
            selection_schema,
        }
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn argument_validator(&self) -> &ObjectValidator {
        &self.argument_validator
    }

    pub fn selection_schema(&self) -> &SelectionSchema {
        &self.selection_schema
    }

    pub fn default_selection(&self) -> &SelectionSet {
        &self.selection_schema.defaults
    }

    pub fn validate_arguments(
        &self,
        variables: Option<&Value>,
    ) -> Result<Map<String, Value>, ValidationError> {
        self.argument_validator
            .validate_variables(&self.operation.name, variables)
    }

    pub fn validate_selection(
        &self,
        selection: Option<&Value>,
    ) -> Result<SelectionSet, ValidationError> {
        self.selection_schema
            .validate(&self.operation.name, selection)
    }

    /// Validate both the variables and the selection, then render the document. Nothing is
    /// rendered if either is invalid.
    pub fn render(
        &self,
        variables: Option<&Value>,
        selection: Option<&Value>,
    ) -> Result<RenderedOperation, ToolError> {
        // Validation drops unknown keys, so report them while they are still there
        if let Some(Value::Object(raw_variables)) = variables {
            renderer::warn_unused_variables(&self.operation, raw_variables);
        }

        let variables = self.validate_arguments(variables)?;
        let selection = self.validate_selection(selection)?;

        let query = renderer::render(&self.operation, &variables, &selection)?;

        Ok(RenderedOperation { query, variables })
    }
}

#[async_trait]
impl Tool for OperationTool {
    fn name(&self) -> String {
        self.operation.name.clone()
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn input_schema(&self) -> Value {
        let required: Vec<&str> = if self
            .argument_validator
            .fields
            .values()
            .any(|validator| validator.is_required())
        {
            vec!["variables"]
        } else {
            vec![]
        };

        let mut variables = self.argument_validator.json_schema();
        variables["description"] = json!("The variables to pass to the GraphQL operation");

        json!({
            "type": "object",
            "properties": {
                "variables": variables,
                "selection": self.selection_schema.json_schema(),
            },
            "required": required,
        })
    }

    async fn execute(&self, arguments: Value) -> Result<RenderedOperation, ToolError> {
        let input: ToolInput = match arguments {
            Value::Null => ToolInput {
                variables: None,
                selection: None,
            },
            arguments => serde_json::from_value(arguments)
                .map_err(|e| ToolError::InvalidToolInput(e.to_string()))?,
        };

        self.render(input.variables.as_ref(), input.selection.as_ref())
    }
}
