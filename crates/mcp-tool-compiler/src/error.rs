// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

use crate::{env::EnvError, validation::validation_error::ValidationError};

#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No tool named '{0}'")]
    UnknownOperationName(String),

    #[error("Operation '{operation_name}' requires variable '{variable}'")]
    MissingRequiredVariable {
        operation_name: String,
        variable: String,
    },

    #[error("Failed to parse schema: {0}")]
    SchemaParsing(String),

    #[error(transparent)]
    Environment(#[from] EnvError),

    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),
}

impl From<async_graphql_parser::Error> for ToolError {
    fn from(error: async_graphql_parser::Error) -> Self {
        ToolError::SchemaParsing(error.to_string())
    }
}
