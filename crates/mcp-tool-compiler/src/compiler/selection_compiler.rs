// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{collections::HashSet, sync::Arc};

use async_graphql_parser::{
    Positioned,
    types::{FieldDefinition, Type, TypeKind},
};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::{
    schema::underlying_type,
    validation::selection::{CompositeSelection, SelectionValidator},
};

use super::{CompiledType, SchemaCompiler};

impl SchemaCompiler<'_> {
    /// Compile the selection validator for an output type. List and non-null wrappers do not
    /// affect what may be selected, so only the underlying named type matters.
    pub(super) fn compile_output_type(
        &mut self,
        ty: &Type,
        visited: &mut HashSet<String>,
        depth: usize,
    ) -> SelectionValidator {
        self.compile_named_output_type(underlying_type(ty), visited, depth)
    }

    fn compile_named_output_type(
        &mut self,
        type_name: &str,
        visited: &mut HashSet<String>,
        depth: usize,
    ) -> SelectionValidator {
        if self.graph.is_leaf_type(type_name) {
            return SelectionValidator::Leaf;
        }

        if let Some(cached) = self.cache.selection_types.get(type_name) {
            if self.fits_at(cached.height, depth) {
                debug!("Reusing compiled output type '{}'", type_name);
                return cached.validator.clone();
            }
        }

        let graph = self.graph;

        let (field_definitions, fragment_types): (&[Positioned<FieldDefinition>], Vec<&str>) =
            match graph.get_type_definition(type_name).map(|td| &td.kind) {
                Some(TypeKind::Object(object_type)) => (&object_type.fields, vec![]),
                Some(TypeKind::Interface(interface_type)) => (
                    &interface_type.fields,
                    graph
                        .implementers(type_name)
                        .iter()
                        .map(String::as_str)
                        .collect(),
                ),
                Some(TypeKind::Union(union_type)) => (
                    &[],
                    union_type
                        .members
                        .iter()
                        .map(|member| member.node.as_str())
                        .collect(),
                ),
                // Unknown names and input objects have nothing to select into
                _ => return SelectionValidator::Leaf,
            };

        if visited.contains(type_name) {
            debug!("Output type '{}' refers to itself; not validating deeper", type_name);
            self.placeholders += 1;
            return SelectionValidator::Permissive;
        }

        if depth > self.limits.max_depth {
            debug!(
                max_depth = self.limits.max_depth,
                "Output type '{}' is nested too deep; not validating deeper", type_name
            );
            self.placeholders += 1;
            return SelectionValidator::Permissive;
        }

        let placeholders = self.placeholders;

        visited.insert(type_name.to_string());

        let fields = self.compile_selection_fields(type_name, field_definitions, visited, depth);
        let fragments = fragment_types
            .iter()
            .copied()
            .map(|fragment_type| {
                (
                    fragment_type.to_string(),
                    self.compile_named_output_type(fragment_type, visited, depth + 1),
                )
            })
            .collect();

        visited.remove(type_name);

        let validator = SelectionValidator::Composite(Arc::new(CompositeSelection {
            type_name: type_name.to_string(),
            fields,
            fragments,
        }));

        if self.placeholders == placeholders {
            let child_types = field_definitions
                .iter()
                .take(self.limits.max_selection_fields)
                .map(|field| underlying_type(&field.node.ty.node).as_str())
                .chain(fragment_types);

            let height = child_types
                .filter_map(|name| self.cache.selection_types.get(name))
                .map(|child| child.height + 1)
                .max()
                .unwrap_or(0);

            self.cache.selection_types.insert(
                type_name.to_string(),
                CompiledType {
                    validator: validator.clone(),
                    height,
                },
            );
        }

        validator
    }

    fn compile_selection_fields(
        &mut self,
        type_name: &str,
        fields: &[Positioned<FieldDefinition>],
        visited: &mut HashSet<String>,
        depth: usize,
    ) -> IndexMap<String, SelectionValidator> {
        let limit = self.limits.max_selection_fields;

        if fields.len() > limit {
            warn!(
                limit,
                "Output type '{}' has {} fields; omitting the excess",
                type_name,
                fields.len()
            );
        }

        fields
            .iter()
            .take(limit)
            .map(|field| {
                let field = &field.node;
                (
                    field.name.node.to_string(),
                    self.compile_output_type(&field.ty.node, visited, depth + 1),
                )
            })
            .collect()
    }
}
