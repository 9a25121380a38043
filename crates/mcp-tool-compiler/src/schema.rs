// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use async_graphql_parser::{
    Positioned,
    types::{
        BaseType, FieldDefinition, ServiceDocument, Type, TypeDefinition, TypeKind,
        TypeSystemDefinition,
    },
};
use async_graphql_value::Name;
use indexmap::IndexMap;
use tracing::warn;

use crate::{error::ToolError, operation::OperationKind};

pub const QUERY_ROOT_TYPENAME: &str = "Query";
pub const MUTATION_ROOT_TYPENAME: &str = "Mutation";
pub const SUBSCRIPTION_ROOT_TYPENAME: &str = "Subscription";

const BUILTIN_SCALARS: [&str; 5] = ["String", "ID", "Int", "Float", "Boolean"];

/// The named types of a parsed schema, with extensions folded into their base definitions.
///
/// Types refer to each other by name only, so cyclic schemas are represented without any
/// unrolling.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    type_definitions: IndexMap<String, TypeDefinition>,
    /// Interface name to the object types implementing it, in declaration order.
    implementers: HashMap<String, Vec<String>>,
    query_root: String,
    mutation_root: String,
    subscription_root: String,
}

impl SchemaGraph {
    pub fn parse(sdl: &str) -> Result<Self, ToolError> {
        let document = async_graphql_parser::parse_schema(sdl)?;
        Ok(Self::new(document))
    }

    pub fn new(document: ServiceDocument) -> Self {
        let mut type_definitions: IndexMap<String, TypeDefinition> = IndexMap::new();
        let mut query_root = QUERY_ROOT_TYPENAME.to_string();
        let mut mutation_root = MUTATION_ROOT_TYPENAME.to_string();
        let mut subscription_root = SUBSCRIPTION_ROOT_TYPENAME.to_string();

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Schema(schema) => {
                    let schema = schema.node;
                    if let Some(query) = schema.query {
                        query_root = query.node.to_string();
                    }
                    if let Some(mutation) = schema.mutation {
                        mutation_root = mutation.node.to_string();
                    }
                    if let Some(subscription) = schema.subscription {
                        subscription_root = subscription.node.to_string();
                    }
                }
                TypeSystemDefinition::Type(type_definition) => {
                    let type_definition = type_definition.node;
                    let type_name = type_definition.name.node.to_string();

                    match type_definitions.get_mut(&type_name) {
                        Some(existing) => merge_type_definition(existing, type_definition),
                        None => {
                            type_definitions.insert(type_name, type_definition);
                        }
                    }
                }
                TypeSystemDefinition::Directive(_) => {}
            }
        }

        let mut implementers: HashMap<String, Vec<String>> = HashMap::new();
        for (type_name, type_definition) in &type_definitions {
            if let TypeKind::Object(object_type) = &type_definition.kind {
                for interface in &object_type.implements {
                    implementers
                        .entry(interface.node.to_string())
                        .or_default()
                        .push(type_name.clone());
                }
            }
        }

        Self {
            type_definitions,
            implementers,
            query_root,
            mutation_root,
            subscription_root,
        }
    }

    pub fn get_type_definition(&self, name: &str) -> Option<&TypeDefinition> {
        self.type_definitions.get(name)
    }

    pub fn root_type_name(&self, kind: OperationKind) -> &str {
        match kind {
            OperationKind::Query => &self.query_root,
            OperationKind::Mutation => &self.mutation_root,
            OperationKind::Subscription => &self.subscription_root,
        }
    }

    /// Fields of the root type for `kind`, empty if the schema does not declare it.
    pub fn root_fields(&self, kind: OperationKind) -> &[Positioned<FieldDefinition>] {
        self.fields(self.root_type_name(kind)).unwrap_or_default()
    }

    /// Fields of an object or interface type.
    pub fn fields(&self, type_name: &str) -> Option<&[Positioned<FieldDefinition>]> {
        match &self.get_type_definition(type_name)?.kind {
            TypeKind::Object(object_type) => Some(&object_type.fields),
            TypeKind::Interface(interface_type) => Some(&interface_type.fields),
            _ => None,
        }
    }

    pub fn implementers(&self, interface_name: &str) -> &[String] {
        self.implementers
            .get(interface_name)
            .map(|names| names.as_slice())
            .unwrap_or_default()
    }

    /// Scalars (built-in or custom) and enums: types selected with a plain boolean.
    pub fn is_leaf_type(&self, type_name: &str) -> bool {
        is_builtin_scalar(type_name)
            || matches!(
                self.get_type_definition(type_name).map(|td| &td.kind),
                Some(TypeKind::Scalar | TypeKind::Enum(_))
            )
    }
}

fn merge_type_definition(existing: &mut TypeDefinition, extension: TypeDefinition) {
    let type_name = existing.name.node.to_string();

    if existing.description.is_none() {
        existing.description = extension.description;
    }

    match (&mut existing.kind, extension.kind) {
        (TypeKind::Object(base), TypeKind::Object(extension)) => {
            base.implements.extend(extension.implements);
            base.fields.extend(extension.fields);
        }
        (TypeKind::Interface(base), TypeKind::Interface(extension)) => {
            base.implements.extend(extension.implements);
            base.fields.extend(extension.fields);
        }
        (TypeKind::Union(base), TypeKind::Union(extension)) => {
            base.members.extend(extension.members);
        }
        (TypeKind::Enum(base), TypeKind::Enum(extension)) => {
            base.values.extend(extension.values);
        }
        (TypeKind::InputObject(base), TypeKind::InputObject(extension)) => {
            base.fields.extend(extension.fields);
        }
        (TypeKind::Scalar, TypeKind::Scalar) => {}
        _ => {
            warn!(%type_name, "Ignoring a definition that redefines a type as another kind");
        }
    }
}

pub fn is_builtin_scalar(type_name: &str) -> bool {
    BUILTIN_SCALARS.contains(&type_name)
}

/// The named type under any list/non-null wrappers.
pub fn underlying_type(typ: &Type) -> &Name {
    match &typ.base {
        BaseType::Named(name) => name,
        BaseType::List(typ) => underlying_type(typ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_merged() {
        let graph = SchemaGraph::parse(
            r#"
            type Query { a: Int }
            extend type Query { b: Int }
            enum Color { RED }
            extend enum Color { GREEN }
            "#,
        )
        .unwrap();

        let fields: Vec<_> = graph
            .root_fields(OperationKind::Query)
            .iter()
            .map(|f| f.node.name.node.to_string())
            .collect();
        assert_eq!(fields, vec!["a", "b"]);

        match &graph.get_type_definition("Color").unwrap().kind {
            TypeKind::Enum(e) => assert_eq!(e.values.len(), 2),
            other => panic!("Unexpected kind {other:?}"),
        }
    }

    #[test]
    fn schema_block_renames_roots() {
        let graph = SchemaGraph::parse(
            r#"
            schema { query: RootQuery, mutation: RootMutation }
            type RootQuery { ping: String }
            type RootMutation { touch: Boolean }
            "#,
        )
        .unwrap();

        assert_eq!(graph.root_type_name(OperationKind::Query), "RootQuery");
        assert_eq!(graph.root_fields(OperationKind::Mutation).len(), 1);
        assert_eq!(graph.root_type_name(OperationKind::Subscription), "Subscription");
        assert!(graph.root_fields(OperationKind::Subscription).is_empty());
    }

    #[test]
    fn implementers_and_leaves() {
        let graph = SchemaGraph::parse(
            r#"
            scalar DateTime
            interface Node { id: ID! }
            type User implements Node { id: ID! born: DateTime }
            type Team implements Node { id: ID! }
            "#,
        )
        .unwrap();

        assert_eq!(graph.implementers("Node"), ["User", "Team"]);
        assert!(graph.implementers("User").is_empty());
        assert!(graph.is_leaf_type("DateTime"));
        assert!(graph.is_leaf_type("ID"));
        assert!(!graph.is_leaf_type("User"));
        assert!(!graph.is_leaf_type("Missing"));
    }

    #[test]
    fn parse_errors_are_reported() {
        assert!(matches!(
            SchemaGraph::parse("type Query {"),
            Err(ToolError::SchemaParsing(_))
        ));
    }
}
