//! User lookup endpoints.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE, page_query, to_result};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_users(registry);
    register_get_users_user_id(registry);
    register_get_user(registry);
    register_get_users_user_id_pjs(registry);
}

fn register_get_users(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/users"),
        "List users, filtered by username or a search string",
        Schema::new()
            .string("username", "Return the single user with the given username")
            .string("search", "Search users by name, username or public email")
            .boolean("active", "Return only active users")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_users(client, args)),
    );
}

#[derive(Serialize)]
struct ListUsersQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    active: Option<bool>,
}

async fn handle_get_users(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let query = ListUsersQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        username: args::opt_string(&args, "username")?,
        search: args::opt_string(&args, "search")?,
        active: args::opt_bool(&args, "active")?,
    };
    to_result(client.get_query("/users", &query).await)
}

fn register_get_users_user_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/users/{user_id}"),
        "Get a single user",
        Schema::new().integer_required("user_id", "ID of the user"),
        |client, args| Box::pin(handle_get_users_user_id(client, args)),
    );
}

async fn handle_get_users_user_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let user_id = args::require_u64(&args, "user_id")?;
    to_result(client.get(&format!("/users/{user_id}")).await)
}

fn register_get_user(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/user"),
        "Get the currently authenticated user",
        Schema::new(),
        |client, args| Box::pin(handle_get_user(client, args)),
    );
}

async fn handle_get_user(
    client: Arc<GitlabClient>,
    _args: JsonObject,
) -> Result<CallToolResult, McpError> {
    to_result(client.get("/user").await)
}

fn register_get_users_user_id_pjs(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/users/{user_id}/projects"),
        "List the projects owned by a user",
        Schema::new()
            .integer_required("user_id", "ID of the user")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_users_user_id_pjs(client, args)),
    );
}

async fn handle_get_users_user_id_pjs(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let user_id = args::require_u64(&args, "user_id")?;
    let query = page_query(&args)?;
    to_result(
        client
            .get_query(&format!("/users/{user_id}/projects"), &query)
            .await,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{args, client_for};
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_module_registers_four_tools() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        assert_eq!(registry.len(), 4);
    }

    #[tokio::test]
    async fn test_list_users_by_username() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/users")
                .query_param("username", "jsmith")
                .query_param("page", "1");
            then.status(200).json_body(json!([{"id": 12, "username": "jsmith"}]));
        });

        handle_get_users(
            client_for(&server.base_url()),
            args(json!({"username": "jsmith"})),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_current_user_takes_no_arguments() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/v4/user");
            then.status(200).json_body(json!({"id": 1, "username": "me"}));
        });

        handle_get_user(client_for(&server.base_url()), args(json!({})))
            .await
            .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_user_projects_coerces_string_user_id() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/v4/users/12/projects");
            then.status(200).json_body(json!([]));
        });

        handle_get_users_user_id_pjs(
            client_for(&server.base_url()),
            args(json!({"user_id": "12"})),
        )
        .await
        .unwrap();

        mock.assert();
    }
}
