// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Translation of GraphQL types into validators.
//!
//! Both compilers walk the type graph depth-first. Cycles are broken by name, using a visited set
//! threaded through the walk (so a type recurring on sibling branches is compiled normally), and
//! the walk gives up past `max_depth` named-type levels. Either way, the compiler substitutes a
//! permissive placeholder instead of failing.
//!
//! Only types compiled without any placeholder beneath them are cached, and a cached type is
//! reused only where it still fits within `max_depth`. A cached validator is therefore what a
//! fresh walk would produce, whichever operation happened to reach the type first.

mod argument_compiler;
mod default_selection;
mod selection_compiler;

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use indexmap::IndexMap;

use crate::{
    operation::Operation,
    schema::SchemaGraph,
    validation::{
        argument::{ArgumentValidator, ObjectValidator},
        selection::{SelectionSchema, SelectionValidator},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileLimits {
    pub max_depth: usize,
    /// Input object fields compiled per type; the rest are omitted.
    pub max_argument_fields: usize,
    /// Output fields compiled per type; the rest are omitted.
    pub max_selection_fields: usize,
}

/// A validator compiled without any cycle or depth placeholder beneath it, so it is the same
/// wherever the type is reached.
#[derive(Debug, Clone)]
struct CompiledType<V> {
    validator: V,
    /// Levels of nested input objects (or composite output types) below this one.
    height: usize,
}

/// Compiled validators by type name, so a type referenced from many operations is compiled once.
#[derive(Debug, Default)]
pub struct CompilationCache {
    argument_types: HashMap<String, CompiledType<ArgumentValidator>>,
    selection_types: HashMap<String, CompiledType<SelectionValidator>>,
}

impl CompilationCache {
    pub fn len(&self) -> usize {
        self.argument_types.len() + self.selection_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One compilation run over a schema. Owns its cache: independent runs never share state.
pub struct SchemaCompiler<'a> {
    graph: &'a SchemaGraph,
    limits: CompileLimits,
    cache: CompilationCache,
    /// Placeholders handed out so far. A type is cached only if compiling it handed out none.
    placeholders: usize,
}

impl<'a> SchemaCompiler<'a> {
    pub fn new(graph: &'a SchemaGraph, limits: CompileLimits) -> Self {
        Self {
            graph,
            limits,
            cache: CompilationCache::default(),
            placeholders: 0,
        }
    }

    pub fn cache(&self) -> &CompilationCache {
        &self.cache
    }

    /// An object validator keyed by the operation's argument names. Arguments declared non-null
    /// are required.
    pub fn compile_operation_arguments(&mut self, operation: &Operation) -> Arc<ObjectValidator> {
        let fields: IndexMap<String, ArgumentValidator> = operation
            .arguments
            .iter()
            .map(|argument| {
                let validator = self.compile_arg_type(&argument.ty, &mut HashSet::new(), 0);
                (argument.name.clone(), validator)
            })
            .collect();

        Arc::new(ObjectValidator::new(None, fields))
    }

    /// The selection validator for the operation's (unwrapped) return type, with its default
    /// selection attached.
    pub fn compile_operation_selection(&mut self, operation: &Operation) -> SelectionSchema {
        let root = self.compile_output_type(&operation.return_type, &mut HashSet::new(), 0);
        let defaults = self.compute_defaults(&operation.return_type);

        SelectionSchema { root, defaults }
    }

    /// Whether a cached type spanning `height` nested levels can be used at `depth` without
    /// crossing the depth limit.
    fn fits_at(&self, height: usize, depth: usize) -> bool {
        depth + height <= self.limits.max_depth
    }
}
