// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{collections::HashSet, sync::Arc};

use async_graphql_parser::types::{BaseType, EnumType, InputObjectType, Type, TypeKind};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::{
    schema::underlying_type,
    validation::argument::{ArgumentValidator, ObjectValidator},
};

use super::{CompiledType, SchemaCompiler};

impl SchemaCompiler<'_> {
    /// Compile an argument (or input field) type. A nullable type compiles to an optional
    /// validator; a list compiles to a list of its item validator.
    pub(super) fn compile_arg_type(
        &mut self,
        ty: &Type,
        visited: &mut HashSet<String>,
        depth: usize,
    ) -> ArgumentValidator {
        let validator = match &ty.base {
            BaseType::Named(name) => self.compile_named_arg_type(name, visited, depth),
            BaseType::List(item) => {
                ArgumentValidator::List(Box::new(self.compile_arg_type(item, visited, depth)))
            }
        };

        if ty.nullable {
            ArgumentValidator::Optional(Box::new(validator))
        } else {
            validator
        }
    }

    fn compile_named_arg_type(
        &mut self,
        type_name: &str,
        visited: &mut HashSet<String>,
        depth: usize,
    ) -> ArgumentValidator {
        match type_name {
            "String" | "ID" => return ArgumentValidator::String,
            "Int" => return ArgumentValidator::Int,
            "Float" => return ArgumentValidator::Float,
            "Boolean" => return ArgumentValidator::Boolean,
            _ => {}
        }

        if let Some(cached) = self.cache.argument_types.get(type_name) {
            if self.fits_at(cached.height, depth) {
                debug!("Reusing compiled input type '{}'", type_name);
                return cached.validator.clone();
            }
        }

        let graph = self.graph;

        match graph.get_type_definition(type_name).map(|td| &td.kind) {
            // Custom scalars are approximated as strings
            Some(TypeKind::Scalar) => ArgumentValidator::String,
            Some(TypeKind::Enum(enum_type)) => {
                if visited.contains(type_name) {
                    return ArgumentValidator::String;
                }

                visited.insert(type_name.to_string());
                let validator = compile_enum(enum_type);
                visited.remove(type_name);

                self.cache.argument_types.insert(
                    type_name.to_string(),
                    CompiledType {
                        validator: validator.clone(),
                        height: 0,
                    },
                );
                validator
            }
            Some(TypeKind::InputObject(input_object_type)) => {
                if visited.contains(type_name) {
                    debug!("Input type '{}' refers to itself; not validating deeper", type_name);
                    self.placeholders += 1;
                    return ArgumentValidator::Object(Arc::new(ObjectValidator::permissive(
                        type_name,
                    )));
                }

                if depth > self.limits.max_depth {
                    debug!(
                        max_depth = self.limits.max_depth,
                        "Input type '{}' is nested too deep; not validating deeper", type_name
                    );
                    self.placeholders += 1;
                    return ArgumentValidator::Object(Arc::new(ObjectValidator::permissive(
                        type_name,
                    )));
                }

                let placeholders = self.placeholders;

                visited.insert(type_name.to_string());
                let validator =
                    self.compile_input_object(type_name, input_object_type, visited, depth);
                visited.remove(type_name);

                if self.placeholders == placeholders {
                    let height = self.input_object_height(input_object_type);
                    self.cache.argument_types.insert(
                        type_name.to_string(),
                        CompiledType {
                            validator: validator.clone(),
                            height,
                        },
                    );
                }
                validator
            }
            _ => {
                debug!("Type '{}' is not an input type; accepting any value", type_name);
                ArgumentValidator::Any
            }
        }
    }

    /// Nesting below a placeholder-free input object, from the cached heights of its input object
    /// fields.
    fn input_object_height(&self, input_object_type: &InputObjectType) -> usize {
        input_object_type
            .fields
            .iter()
            .take(self.limits.max_argument_fields)
            .map(|field| underlying_type(&field.node.ty.node).as_str())
            .filter(|name| {
                matches!(
                    self.graph.get_type_definition(name).map(|td| &td.kind),
                    Some(TypeKind::InputObject(_))
                )
            })
            .filter_map(|name| self.cache.argument_types.get(name))
            .map(|field_type| field_type.height + 1)
            .max()
            .unwrap_or(0)
    }

    fn compile_input_object(
        &mut self,
        type_name: &str,
        input_object_type: &InputObjectType,
        visited: &mut HashSet<String>,
        depth: usize,
    ) -> ArgumentValidator {
        let limit = self.limits.max_argument_fields;

        if input_object_type.fields.len() > limit {
            warn!(
                limit,
                "Input type '{}' has {} fields; omitting the excess",
                type_name,
                input_object_type.fields.len()
            );
        }

        let fields: IndexMap<String, ArgumentValidator> = input_object_type
            .fields
            .iter()
            .take(limit)
            .map(|field| {
                let field = &field.node;
                (
                    field.name.node.to_string(),
                    self.compile_arg_type(&field.ty.node, visited, depth + 1),
                )
            })
            .collect();

        ArgumentValidator::Object(Arc::new(ObjectValidator::new(
            Some(type_name.to_string()),
            fields,
        )))
    }
}

fn compile_enum(enum_type: &EnumType) -> ArgumentValidator {
    let mut values: Vec<String> = enum_type
        .values
        .iter()
        .map(|value| value.node.value.node.to_string())
        .collect();

    match values.len() {
        0 => ArgumentValidator::String,
        1 => ArgumentValidator::Literal(values.remove(0)),
        _ => ArgumentValidator::Enum(values.into()),
    }
}
