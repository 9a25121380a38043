// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{
    compiler::CompileLimits,
    env::{EnvError, Environment},
    operation::OperationKind,
};

pub const EXO_MCP_INCLUDE_QUERIES: &str = "EXO_MCP_INCLUDE_QUERIES";
pub const EXO_MCP_INCLUDE_MUTATIONS: &str = "EXO_MCP_INCLUDE_MUTATIONS";
pub const EXO_MCP_INCLUDE_SUBSCRIPTIONS: &str = "EXO_MCP_INCLUDE_SUBSCRIPTIONS";

pub const EXO_MCP_QUERY_PREFIX: &str = "EXO_MCP_QUERY_PREFIX";
pub const EXO_MCP_MUTATION_PREFIX: &str = "EXO_MCP_MUTATION_PREFIX";
pub const EXO_MCP_SUBSCRIPTION_PREFIX: &str = "EXO_MCP_SUBSCRIPTION_PREFIX";

pub const EXO_MCP_IGNORE_PHRASE: &str = "EXO_MCP_IGNORE_PHRASE";

pub const EXO_MCP_MAX_OPERATIONS: &str = "EXO_MCP_MAX_OPERATIONS";
pub const EXO_MCP_MAX_OPERATION_ARGUMENTS: &str = "EXO_MCP_MAX_OPERATION_ARGUMENTS";
pub const EXO_MCP_MAX_SCHEMA_DEPTH: &str = "EXO_MCP_MAX_SCHEMA_DEPTH";
pub const EXO_MCP_MAX_ARGUMENT_FIELDS: &str = "EXO_MCP_MAX_ARGUMENT_FIELDS";
pub const EXO_MCP_MAX_SELECTION_FIELDS: &str = "EXO_MCP_MAX_SELECTION_FIELDS";

pub const DEFAULT_IGNORE_PHRASE: &str = "NO_MCP_TOOL";

/// Which root fields become tools, how they are named, and how far the compilers may walk the
/// type graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolsConfig {
    pub include_queries: bool,
    pub include_mutations: bool,
    pub include_subscriptions: bool,
    pub query_name_prefix: String,
    pub mutation_name_prefix: String,
    pub subscription_name_prefix: String,
    /// Root fields whose description contains this phrase are not exposed. Empty disables the
    /// filter.
    pub ignore_phrase: String,
    pub max_operations: usize,
    pub max_operation_arguments: usize,
    pub max_schema_depth: usize,
    pub max_argument_fields_per_type: usize,
    pub max_selection_fields_per_type: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            include_queries: true,
            include_mutations: false,
            include_subscriptions: false,
            query_name_prefix: String::new(),
            mutation_name_prefix: String::new(),
            subscription_name_prefix: String::new(),
            ignore_phrase: DEFAULT_IGNORE_PHRASE.to_string(),
            max_operations: 200,
            max_operation_arguments: 50,
            max_schema_depth: 10,
            max_argument_fields_per_type: 100,
            max_selection_fields_per_type: 50,
        }
    }
}

impl ToolsConfig {
    pub fn from_env(env: &dyn Environment) -> Result<Self, EnvError> {
        let defaults = Self::default();

        Ok(Self {
            include_queries: env.enabled(EXO_MCP_INCLUDE_QUERIES, defaults.include_queries)?,
            include_mutations: env
                .enabled(EXO_MCP_INCLUDE_MUTATIONS, defaults.include_mutations)?,
            include_subscriptions: env.enabled(
                EXO_MCP_INCLUDE_SUBSCRIPTIONS,
                defaults.include_subscriptions,
            )?,
            query_name_prefix: env.get_or_else(EXO_MCP_QUERY_PREFIX, ""),
            mutation_name_prefix: env.get_or_else(EXO_MCP_MUTATION_PREFIX, ""),
            subscription_name_prefix: env.get_or_else(EXO_MCP_SUBSCRIPTION_PREFIX, ""),
            ignore_phrase: env.get_or_else(EXO_MCP_IGNORE_PHRASE, DEFAULT_IGNORE_PHRASE),
            max_operations: env.get_usize(EXO_MCP_MAX_OPERATIONS, defaults.max_operations)?,
            max_operation_arguments: env.get_usize(
                EXO_MCP_MAX_OPERATION_ARGUMENTS,
                defaults.max_operation_arguments,
            )?,
            max_schema_depth: env
                .get_usize(EXO_MCP_MAX_SCHEMA_DEPTH, defaults.max_schema_depth)?,
            max_argument_fields_per_type: env.get_usize(
                EXO_MCP_MAX_ARGUMENT_FIELDS,
                defaults.max_argument_fields_per_type,
            )?,
            max_selection_fields_per_type: env.get_usize(
                EXO_MCP_MAX_SELECTION_FIELDS,
                defaults.max_selection_fields_per_type,
            )?,
        })
    }

    pub fn includes(&self, kind: OperationKind) -> bool {
        match kind {
            OperationKind::Query => self.include_queries,
            OperationKind::Mutation => self.include_mutations,
            OperationKind::Subscription => self.include_subscriptions,
        }
    }

    pub fn name_prefix(&self, kind: OperationKind) -> &str {
        match kind {
            OperationKind::Query => &self.query_name_prefix,
            OperationKind::Mutation => &self.mutation_name_prefix,
            OperationKind::Subscription => &self.subscription_name_prefix,
        }
    }

    pub fn compile_limits(&self) -> CompileLimits {
        CompileLimits {
            max_depth: self.max_schema_depth,
            max_argument_fields: self.max_argument_fields_per_type,
            max_selection_fields: self.max_selection_fields_per_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnvironment;

    #[test]
    fn empty_environment_gives_defaults() {
        let config = ToolsConfig::from_env(&MapEnvironment::new()).unwrap();

        assert_eq!(config, ToolsConfig::default());
        assert!(config.includes(OperationKind::Query));
        assert!(!config.includes(OperationKind::Mutation));
        assert!(!config.includes(OperationKind::Subscription));
        assert_eq!(config.ignore_phrase, "NO_MCP_TOOL");
    }

    #[test]
    fn environment_overrides() {
        let env = MapEnvironment::from([
            (EXO_MCP_INCLUDE_MUTATIONS, "true"),
            (EXO_MCP_MUTATION_PREFIX, "mutate_"),
            (EXO_MCP_IGNORE_PHRASE, "@internal"),
            (EXO_MCP_MAX_SCHEMA_DEPTH, "4"),
            (EXO_MCP_MAX_SELECTION_FIELDS, "12"),
        ]);

        let config = ToolsConfig::from_env(&env).unwrap();

        assert!(config.includes(OperationKind::Mutation));
        assert_eq!(config.name_prefix(OperationKind::Mutation), "mutate_");
        assert_eq!(config.name_prefix(OperationKind::Query), "");
        assert_eq!(config.ignore_phrase, "@internal");

        let limits = config.compile_limits();
        assert_eq!(limits.max_depth, 4);
        assert_eq!(limits.max_selection_fields, 12);
        assert_eq!(limits.max_argument_fields, 100);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let env = MapEnvironment::from([(EXO_MCP_MAX_OPERATIONS, "lots")]);

        assert!(matches!(
            ToolsConfig::from_env(&env),
            Err(EnvError::InvalidNumber { .. })
        ));
    }
}
