// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Compile the root fields of a GraphQL schema into tools: each validates caller-supplied
//! variables and field selections, then renders a GraphQL document for them.

pub mod compiler;
pub mod config;
pub mod env;
pub mod error;
pub mod operation;
pub mod renderer;
pub mod schema;
pub mod tool;
pub mod tools_creator;
pub mod validation;

pub use config::ToolsConfig;
pub use error::ToolError;
pub use renderer::RenderedOperation;
pub use tool::{OperationTool, Tool};
pub use tools_creator::GraphQLTools;
