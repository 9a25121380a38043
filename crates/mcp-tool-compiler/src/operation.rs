// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{collections::HashSet, fmt::Display};

use async_graphql_parser::types::Type;
use tracing::warn;

use crate::{config::ToolsConfig, schema::SchemaGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [
        OperationKind::Query,
        OperationKind::Mutation,
        OperationKind::Subscription,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone)]
pub struct OperationArgument {
    pub name: String,
    /// Declared type, with its list/non-null wrappers.
    pub ty: Type,
}

impl OperationArgument {
    pub fn is_required(&self) -> bool {
        !self.ty.nullable
    }
}

/// One root field of the query, mutation, or subscription type.
#[derive(Debug, Clone)]
pub struct Operation {
    pub kind: OperationKind,
    /// Tool name: the configured prefix followed by the root field name.
    pub name: String,
    /// Root field name, used at the call site of a rendered document.
    pub field_name: String,
    pub return_type: Type,
    pub arguments: Vec<OperationArgument>,
    pub description: Option<String>,
}

/// Turn the root fields of the schema into operations, applying the kind filters, the ignore
/// phrase, name prefixes, and the operation/argument caps of `config`.
pub fn extract_operations(graph: &SchemaGraph, config: &ToolsConfig) -> Vec<Operation> {
    let mut seen = HashSet::new();
    let mut operations = vec![];

    for kind in OperationKind::ALL {
        if !config.includes(kind) {
            continue;
        }

        for field in graph.root_fields(kind) {
            let field = &field.node;
            let field_name = field.name.node.to_string();
            let description = field.description.as_ref().map(|d| d.node.clone());

            if is_ignored(description.as_deref(), &config.ignore_phrase) {
                continue;
            }

            if !seen.insert((kind, field_name.clone())) {
                continue;
            }

            if operations.len() == config.max_operations {
                warn!(
                    limit = config.max_operations,
                    "Too many operations; dropping '{}' and the ones that follow", field_name
                );
                return operations;
            }

            if field.arguments.len() > config.max_operation_arguments {
                warn!(
                    limit = config.max_operation_arguments,
                    "Operation '{}' declares {} arguments; dropping the excess",
                    field_name,
                    field.arguments.len()
                );
            }

            let arguments = field
                .arguments
                .iter()
                .take(config.max_operation_arguments)
                .map(|argument| OperationArgument {
                    name: argument.node.name.node.to_string(),
                    ty: argument.node.ty.node.clone(),
                })
                .collect();

            operations.push(Operation {
                kind,
                name: format!("{}{}", config.name_prefix(kind), field_name),
                field_name,
                return_type: field.ty.node.clone(),
                arguments,
                description,
            });
        }
    }

    operations
}

fn is_ignored(description: Option<&str>, ignore_phrase: &str) -> bool {
    !ignore_phrase.is_empty()
        && description
            .map(|description| description.contains(ignore_phrase))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
        type Query {
            "Find a user"
            user(id: ID!, verbose: Boolean): User
            users: [User!]!
            "Internal only NO_MCP_TOOL"
            debug: String
        }

        type Mutation {
            createUser(name: String!): User
        }

        type Subscription {
            userCreated: User
        }

        type User { id: ID! name: String }
    "#;

    fn names(operations: &[Operation]) -> Vec<&str> {
        operations.iter().map(|op| op.name.as_str()).collect()
    }

    #[test]
    fn queries_only_by_default() {
        let graph = SchemaGraph::parse(SCHEMA).unwrap();
        let operations = extract_operations(&graph, &ToolsConfig::default());

        assert_eq!(names(&operations), vec!["user", "users"]);

        let user = &operations[0];
        assert_eq!(user.kind, OperationKind::Query);
        assert_eq!(user.description.as_deref(), Some("Find a user"));
        assert_eq!(user.return_type.to_string(), "User");
        assert_eq!(user.arguments.len(), 2);
        assert!(user.arguments[0].is_required());
        assert!(!user.arguments[1].is_required());
        assert_eq!(operations[1].return_type.to_string(), "[User!]!");
    }

    #[test]
    fn kinds_prefixes_and_ignore_phrase() {
        let graph = SchemaGraph::parse(SCHEMA).unwrap();
        let config = ToolsConfig {
            include_mutations: true,
            include_subscriptions: true,
            query_name_prefix: "get_".to_string(),
            mutation_name_prefix: "do_".to_string(),
            ignore_phrase: String::new(),
            ..Default::default()
        };

        let operations = extract_operations(&graph, &config);

        assert_eq!(
            names(&operations),
            vec!["get_user", "get_users", "get_debug", "do_createUser", "userCreated"]
        );
        assert_eq!(operations[3].field_name, "createUser");
        assert_eq!(operations[3].kind, OperationKind::Mutation);
        assert_eq!(operations[4].kind, OperationKind::Subscription);
    }

    #[test]
    fn duplicates_are_dropped_first_seen_wins() {
        let graph = SchemaGraph::parse(
            r#"
            type Query { a: Int }
            extend type Query { a: String }
            "#,
        )
        .unwrap();

        let operations = extract_operations(&graph, &ToolsConfig::default());

        assert_eq!(names(&operations), vec!["a"]);
        assert_eq!(operations[0].return_type.to_string(), "Int");
    }

    #[test]
    fn caps_truncate() {
        let graph = SchemaGraph::parse(
            r#"
            type Query {
                a(x: Int, y: Int, z: Int): Int
                b: Int
                c: Int
            }
            "#,
        )
        .unwrap();
        let config = ToolsConfig {
            max_operations: 2,
            max_operation_arguments: 1,
            ..Default::default()
        };

        let operations = extract_operations(&graph, &config);

        assert_eq!(names(&operations), vec!["a", "b"]);
        assert_eq!(operations[0].arguments.len(), 1);
        assert_eq!(operations[0].arguments[0].name, "x");
    }
}
