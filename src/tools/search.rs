//! Search endpoints at global, project and group scope.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE, to_result};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

const SEARCH_SCOPES: &[&str] = &[
    "projects",
    "issues",
    "merge_requests",
    "milestones",
    "users",
    "blobs",
    "commits",
    "wiki_blobs",
    "notes",
];

pub fn register(registry: &mut ToolRegistry) {
    register_get_search(registry);
    register_get_pjs_id_search(registry);
    register_get_groups_id_search(registry);
}

#[derive(Serialize)]
struct SearchQuery {
    scope: String,
    search: String,
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    r#ref: Option<String>,
}

fn search_query(args: &JsonObject) -> Result<SearchQuery, McpError> {
    Ok(SearchQuery {
        scope: args::require_str(args, "scope")?,
        search: args::require_str(args, "search")?,
        page: args::u64_or(args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        r#ref: args::opt_string(args, "ref")?,
    })
}

fn search_schema(schema: Schema) -> Schema {
    schema
        .string_enum_required("scope", "Type of results to search for", SEARCH_SCOPES)
        .string_required("search", "The search term")
        .integer_default("page", "Page number", 1)
        .integer_default("per_page", "Results per page (max 100)", 20)
}

fn register_get_search(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/search"),
        "Search across all resources the authenticated user has access to",
        search_schema(Schema::new()),
        |client, args| Box::pin(handle_get_search(client, args)),
    );
}

async fn handle_get_search(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let query = search_query(&args)?;
    to_result(client.get_query("/search", &query).await)
}

fn register_get_pjs_id_search(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/search"),
        "Search within a single project",
        search_schema(Schema::new().string_required("id", "Project ID or URL-encoded path"))
            .string("ref", "Branch or tag to search in, for blob and commit scopes"),
        |client, args| Box::pin(handle_get_pjs_id_search(client, args)),
    );
}

async fn handle_get_pjs_id_search(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = search_query(&args)?;
    let path = format!("/projects/{}/search", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_groups_id_search(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/groups/{id}/search"),
        "Search within a single group",
        search_schema(Schema::new().string_required("id", "Group ID or URL-encoded path")),
        |client, args| Box::pin(handle_get_groups_id_search(client, args)),
    );
}

async fn handle_get_groups_id_search(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = search_query(&args)?;
    let path = format!("/groups/{}/search", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{args, client_for};
    use httpmock::prelude::*;
    use rmcp::model::ErrorCode;
    use serde_json::json;

    #[test]
    fn test_module_registers_three_tools() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn test_global_search_requires_scope() {
        let err = handle_get_search(
            client_for("http://localhost:1"),
            args(json!({"search": "panic"})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert!(err.message.contains("scope"));
    }

    #[tokio::test]
    async fn test_project_search_forwards_ref() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects/7/search")
                .query_param("scope", "blobs")
                .query_param("search", "fn main")
                .query_param("ref", "main");
            then.status(200).json_body(json!([]));
        });

        handle_get_pjs_id_search(
            client_for(&server.base_url()),
            args(json!({"id": 7, "scope": "blobs", "search": "fn main", "ref": "main"})),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_group_search_hits_group_path() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/groups/9/search")
                .query_param("scope", "issues")
                .query_param("search", "timeout");
            then.status(200).json_body(json!([]));
        });

        handle_get_groups_id_search(
            client_for(&server.base_url()),
            args(json!({"id": 9, "scope": "issues", "search": "timeout"})),
        )
        .await
        .unwrap();

        mock.assert();
    }
}
