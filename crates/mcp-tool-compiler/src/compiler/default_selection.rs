// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::types::{FieldDefinition, Type, TypeKind};
use indexmap::IndexMap;

use crate::{
    schema::underlying_type,
    validation::selection::{SelectionNode, SelectionSet, TYPENAME_FIELD},
};

use super::SchemaCompiler;

impl SchemaCompiler<'_> {
    /// The selection used when the caller supplies none: the scalar and enum fields of the
    /// returned type, skipping fields that need arguments we would have no value for.
    ///
    /// Unions have no fields of their own, so they default to `__typename`.
    pub fn compute_defaults(&self, ty: &Type) -> SelectionSet {
        let type_name = underlying_type(ty);

        let fields = match self.graph.get_type_definition(type_name).map(|td| &td.kind) {
            Some(TypeKind::Object(object_type)) => &object_type.fields,
            Some(TypeKind::Interface(interface_type)) => &interface_type.fields,
            Some(TypeKind::Union(_)) => {
                return IndexMap::from([(TYPENAME_FIELD.to_string(), SelectionNode::Included)]);
            }
            _ => return SelectionSet::new(),
        };

        fields
            .iter()
            .take(self.limits.max_selection_fields)
            .map(|field| &field.node)
            .filter(|field| !has_required_arguments(field))
            .filter(|field| self.graph.is_leaf_type(underlying_type(&field.ty.node)))
            .map(|field| (field.name.node.to_string(), SelectionNode::Included))
            .collect()
    }
}

fn has_required_arguments(field: &FieldDefinition) -> bool {
    field
        .arguments
        .iter()
        .any(|argument| !argument.node.ty.node.nullable)
}
