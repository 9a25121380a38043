// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use mcp_tool_compiler::{GraphQLTools, Tool, ToolsConfig, env::SystemEnvironment};

/// Expose the root fields of a GraphQL schema as tools, and render the GraphQL document a tool
/// call would send.
///
/// Usage:
///
/// ```bash
/// exo-mcp-tools --schema schema.graphql list
/// exo-mcp-tools --schema schema.graphql render user --variables '{"id": "1"}' --selection '{"name": true}'
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    setup_tracing()?;

    let sdl = tokio::fs::read_to_string(&args.schema)
        .await
        .with_context(|| format!("Failed to read schema file {}", args.schema.display()))?;

    let config = ToolsConfig::from_env(&SystemEnvironment)?;
    let tools = GraphQLTools::from_sdl(&sdl, &config)?;

    let output = match args.command {
        Command::List => {
            let listed: Vec<Value> = tools
                .tools()
                .iter()
                .map(|tool| {
                    json!({
                        "name": tool.name(),
                        "description": tool.description(),
                        "inputSchema": tool.input_schema(),
                    })
                })
                .collect();

            Value::Array(listed)
        }
        Command::Render {
            tool,
            variables,
            selection,
        } => {
            let mut arguments = serde_json::Map::new();
            if let Some(variables) = variables {
                arguments.insert("variables".to_string(), variables);
            }
            if let Some(selection) = selection {
                arguments.insert("selection".to_string(), selection);
            }

            let rendered = tools.tool(&tool)?.execute(Value::Object(arguments)).await?;
            serde_json::to_value(rendered)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the GraphQL schema (SDL)
    #[arg(short, long)]
    schema: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the tools with their input schemas
    List,
    /// Render the document for a tool call
    Render {
        tool: String,

        /// Variables as a JSON object
        #[arg(long, value_parser = parse_json)]
        variables: Option<Value>,

        /// Selection as a JSON object; the default selection is used if omitted
        #[arg(long, value_parser = parse_json)]
        selection: Option<Value>,
    },
}

fn parse_json(s: &str) -> Result<Value> {
    serde_json::from_str(s).context("Invalid JSON")
}

fn setup_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_env("EXO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    Ok(())
}
