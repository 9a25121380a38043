// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use mcp_tool_compiler::{
    GraphQLTools, Tool, ToolError, ToolsConfig, renderer,
    validation::{
        selection::{SelectionNode, SelectionSet},
        validation_error::{ValidationError, ValidationReason},
    },
};
use serde_json::{Map, Value, json};

const BLOG_SCHEMA: &str = r#"
    enum Status { DRAFT PUBLISHED }

    type Query {
        hello: String
        user(id: ID!): User
        pets: [Pet!]!
    }

    type User {
        id: ID!
        name: String
        roles: [String!]!
        posts(status: Status!): [Post!]!
        bestFriend: User
    }

    type Post { title: String status: Status }

    union Pet = Dog | Cat
    type Dog { breed: String }
    type Cat { lives: Int }
"#;

fn blog_tools() -> GraphQLTools {
    GraphQLTools::from_sdl(BLOG_SCHEMA, &ToolsConfig::default()).unwrap()
}

fn selection_to_json(selection: &SelectionSet) -> Value {
    let entries: Map<String, Value> = selection
        .iter()
        .map(|(key, node)| {
            let value = match node {
                SelectionNode::Excluded => Value::Bool(false),
                SelectionNode::Included => Value::Bool(true),
                SelectionNode::Nested(nested) => selection_to_json(nested),
            };
            (key.clone(), value)
        })
        .collect();

    Value::Object(entries)
}

/// Read the field list of a rendered document back into a selection.
fn parse_rendered_selection(query: &str) -> SelectionSet {
    let tokens: Vec<&str> = query.split_whitespace().collect();

    // The field list opens with the brace after the call site
    let start = tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| **token == "{")
        .nth(1)
        .map(|(index, _)| index + 1)
        .unwrap();

    let mut position = start;
    parse_fields(&tokens, &mut position)
}

fn parse_fields(tokens: &[&str], position: &mut usize) -> SelectionSet {
    let mut selection = SelectionSet::new();

    while *position < tokens.len() {
        let token = tokens[*position];
        *position += 1;

        match token {
            "}" => break,
            // ... on Type {
            "..." => {
                let type_name = tokens[*position + 1];
                *position += 3;
                let nested = parse_fields(tokens, position);
                selection.insert(type_name.to_string(), SelectionNode::Nested(nested));
            }
            name if tokens.get(*position) == Some(&"{") => {
                *position += 1;
                let nested = parse_fields(tokens, position);
                selection.insert(name.to_string(), SelectionNode::Nested(nested));
            }
            name => {
                selection.insert(name.to_string(), SelectionNode::Included);
            }
        }
    }

    selection
}

#[test]
fn hello_world() {
    let tools = GraphQLTools::from_sdl("type Query { hello: String }", &ToolsConfig::default())
        .unwrap();

    assert_eq!(tools.tools().len(), 1);
    assert_eq!(tools.tools()[0].name(), "hello");

    let rendered = tools.render("hello", Some(&json!({})), Some(&json!({}))).unwrap();
    insta::assert_snapshot!(rendered.query, @"query hello { hello }");
}

#[test]
fn missing_required_argument() {
    let result = blog_tools().render("user", Some(&json!({})), None);

    assert!(matches!(
        result,
        Err(ToolError::Validation(ValidationError {
            reason: ValidationReason::MissingRequiredArgument,
            ref path,
            ..
        })) if path == "id"
    ));
}

#[test]
fn union_fragments() {
    let rendered = blog_tools()
        .render(
            "pets",
            None,
            Some(&json!({ "__typename": true, "Dog": { "breed": true } })),
        )
        .unwrap();

    insta::assert_snapshot!(rendered.query, @"query pets { pets { __typename ... on Dog { breed } } }");
}

#[test]
fn unknown_selection_field() {
    let result = blog_tools().render(
        "user",
        Some(&json!({ "id": "1" })),
        Some(&json!({ "id": true, "nonExistentField": true })),
    );

    assert!(matches!(
        result,
        Err(ToolError::Validation(ValidationError {
            reason: ValidationReason::UnknownSelectionField,
            ref path,
            ..
        })) if path == "nonExistentField"
    ));
}

#[test]
fn fields_with_required_arguments_are_not_defaulted() {
    let tools = blog_tools();
    let user = tools.tool("user").unwrap();

    assert!(!user.default_selection().contains_key("posts"));
    assert_eq!(
        user.default_selection().keys().collect::<Vec<_>>(),
        vec!["id", "name", "roles"]
    );

    let rendered = user
        .render(
            Some(&json!({ "id": "1" })),
            Some(&json!({ "posts": { "title": true } })),
        )
        .unwrap();
    insta::assert_snapshot!(rendered.query, @"query user($id: ID!) { user(id: $id) { posts { title } } }");
}

#[test]
fn empty_selection_renders_the_defaults() {
    let tools = blog_tools();

    for tool in tools.tools() {
        let variables = match tool.name().as_str() {
            "user" => json!({ "id": "1" }),
            _ => json!({}),
        };
        let defaults = selection_to_json(tool.default_selection());

        let implicit = tool.render(Some(&variables), Some(&json!({}))).unwrap();
        let explicit = tool.render(Some(&variables), Some(&defaults)).unwrap();

        assert_eq!(implicit.query, explicit.query);
    }
}

#[test]
fn rendered_field_lists_render_back_identically() {
    let tools = blog_tools();
    let calls = [
        (
            "user",
            json!({ "id": "1" }),
            json!({
                "id": true,
                "bestFriend": { "name": true, "bestFriend": { "id": true } },
                "posts": { "title": true, "status": true }
            }),
        ),
        (
            "pets",
            json!({}),
            json!({ "__typename": true, "Dog": { "breed": true }, "Cat": { "lives": true } }),
        ),
    ];

    for (name, variables, selection) in calls {
        let tool = tools.tool(name).unwrap();
        let rendered = tool.render(Some(&variables), Some(&selection)).unwrap();

        let reparsed = parse_rendered_selection(&rendered.query);
        assert_eq!(reparsed, tool.validate_selection(Some(&selection)).unwrap());

        let rerendered =
            renderer::render(tool.operation(), &rendered.variables, &reparsed).unwrap();
        assert_eq!(rerendered, rendered.query);
    }
}

#[test]
fn unchecked_subtrees_cannot_inject_syntax() {
    let schema = r#"
        type A { b: B name: String }
        type B { a: A title: String }
        type Query { a: A b: B }
    "#;
    let tools = GraphQLTools::from_sdl(schema, &ToolsConfig::default()).unwrap();

    let result = tools.render(
        "a",
        None,
        Some(&json!({ "b": { "a": { "name } } mutation X { deleteAll { id": true } } })),
    );

    assert!(matches!(
        result,
        Err(ToolError::Validation(ValidationError {
            reason: ValidationReason::UnknownSelectionField,
            ..
        }))
    ));

    // Compiling `a` first must not loosen `b`
    assert!(matches!(
        tools.render("b", None, Some(&json!({ "a": { "bogus": true } }))),
        Err(ToolError::Validation(ValidationError {
            reason: ValidationReason::UnknownSelectionField,
            ref path,
            ..
        })) if path == "a.bogus"
    ));
}

#[test_log::test]
fn cyclic_schemas_compile() {
    let schema = r#"
        input AFilter { b: BFilter name: String }
        input BFilter { a: AFilter }

        type A { b: B name: String }
        type B { a: A }

        type Query { a(filter: AFilter): A }
    "#;
    let config = ToolsConfig {
        max_schema_depth: 2,
        ..Default::default()
    };
    let tools = GraphQLTools::from_sdl(schema, &config).unwrap();

    let deep_filter = json!({ "b": { "a": { "b": { "a": { "b": { "a": { "name": "x" } } } } } } });
    let deep_selection = json!({ "b": { "a": { "b": { "a": { "b": { "a": { "name": true } } } } } } });

    let rendered = tools
        .render(
            "a",
            Some(&json!({ "filter": deep_filter.clone() })),
            Some(&deep_selection),
        )
        .unwrap();

    assert_eq!(rendered.variables["filter"], deep_filter);
    insta::assert_snapshot!(
        rendered.query,
        @"query a($filter: AFilter) { a(filter: $filter) { b { a { b { a { b { a { name } } } } } } } }"
    );
}

#[tokio::test]
async fn execute_through_the_tool_trait() {
    let tools = blog_tools();
    let user = tools.tool("user").unwrap();

    let rendered = user
        .execute(json!({ "variables": { "id": "1", "extra": 2 }, "selection": { "bestFriend": { "name": true } } }))
        .await
        .unwrap();

    insta::assert_snapshot!(rendered.query, @"query user($id: ID!) { user(id: $id) { bestFriend { name } } }");
    assert_eq!(Value::Object(rendered.variables), json!({ "id": "1" }));
}
