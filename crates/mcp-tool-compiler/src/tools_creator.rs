// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{instrument, warn};

use crate::{
    compiler::SchemaCompiler,
    config::ToolsConfig,
    error::ToolError,
    operation::extract_operations,
    renderer::RenderedOperation,
    schema::SchemaGraph,
    tool::OperationTool,
};

/// The tools compiled from one schema, in root-field order.
#[derive(Debug)]
pub struct GraphQLTools {
    tools: Vec<OperationTool>,
    index: HashMap<String, usize>,
}

impl GraphQLTools {
    #[instrument(skip_all)]
    pub fn from_sdl(sdl: &str, config: &ToolsConfig) -> Result<Self, ToolError> {
        let graph = SchemaGraph::parse(sdl)?;
        Ok(Self::from_graph(&graph, config))
    }

    /// Compile every exposed operation with a single compiler, so types shared between operations
    /// are compiled once.
    pub fn from_graph(graph: &SchemaGraph, config: &ToolsConfig) -> Self {
        let mut compiler = SchemaCompiler::new(graph, config.compile_limits());

        let mut tools = vec![];
        let mut index = HashMap::new();

        for operation in extract_operations(graph, config) {
            if index.contains_key(&operation.name) {
                // Possible when prefixes make a query and a mutation share a name
                warn!(
                    "Tool '{}' already exists; skipping {} '{}'",
                    operation.name, operation.kind, operation.field_name
                );
                continue;
            }

            index.insert(operation.name.clone(), tools.len());
            tools.push(OperationTool::compile(operation, &mut compiler));
        }

        Self { tools, index }
    }

    pub fn tools(&self) -> &[OperationTool] {
        &self.tools
    }

    pub fn tool(&self, name: &str) -> Result<&OperationTool, ToolError> {
        self.index
            .get(name)
            .map(|position| &self.tools[*position])
            .ok_or_else(|| ToolError::UnknownOperationName(name.to_string()))
    }

    pub fn render(
        &self,
        name: &str,
        variables: Option<&Value>,
        selection: Option<&Value>,
    ) -> Result<RenderedOperation, ToolError> {
        self.tool(name)?.render(variables, selection)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tool::Tool;

    const SCHEMA: &str = r#"
        type Query { ping: String }
        type Mutation { ping: String reset: Boolean }
    "#;

    #[test]
    fn unknown_tools() {
        let tools = GraphQLTools::from_sdl(SCHEMA, &ToolsConfig::default()).unwrap();

        assert!(matches!(
            tools.tool("reset"),
            Err(ToolError::UnknownOperationName(name)) if name == "reset"
        ));
        assert!(matches!(
            tools.render("nope", None, None),
            Err(ToolError::UnknownOperationName(_))
        ));
    }

    #[test]
    fn name_collisions_keep_the_first_tool() {
        let config = ToolsConfig {
            include_mutations: true,
            ..Default::default()
        };
        let tools = GraphQLTools::from_sdl(SCHEMA, &config).unwrap();

        let names: Vec<String> = tools.tools().iter().map(|tool| tool.name()).collect();
        assert_eq!(names, vec!["ping", "reset"]);

        let rendered = tools.render("ping", None, Some(&json!({}))).unwrap();
        assert_eq!(rendered.query, "query ping { ping }");
    }

    #[test]
    fn prefixes_avoid_collisions() {
        let config = ToolsConfig {
            include_mutations: true,
            mutation_name_prefix: "m_".to_string(),
            ..Default::default()
        };
        let tools = GraphQLTools::from_sdl(SCHEMA, &config).unwrap();

        let rendered = tools.render("m_ping", None, None).unwrap();
        assert_eq!(rendered.query, "mutation m_ping { ping }");
    }

    #[test]
    fn invalid_schema() {
        assert!(matches!(
            GraphQLTools::from_sdl("type Query {", &ToolsConfig::default()),
            Err(ToolError::SchemaParsing(_))
        ));
    }
}
