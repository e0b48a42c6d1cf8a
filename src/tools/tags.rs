//! Repository tag endpoints.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE, to_result};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_pjs_id_repository_tags(registry);
    register_get_pjs_id_repository_tags_tag_name(registry);
    register_post_pjs_id_repository_tags(registry);
    register_delete_pjs_id_repository_tags_tag_name(registry);
}

fn register_get_pjs_id_repository_tags(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/repository/tags"),
        "List the tags of a project repository",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string("search", "Return tags containing the search string")
            .string_enum_default(
                "order_by",
                "Field to order the results by",
                &["name", "updated", "version"],
                "updated",
            )
            .string_enum_default("sort", "Sort order", &["asc", "desc"], "desc")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_repository_tags(client, args)),
    );
}

#[derive(Serialize)]
struct ListTagsQuery {
    page: u64,
    per_page: u64,
    order_by: String,
    sort: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
}

async fn handle_get_pjs_id_repository_tags(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = ListTagsQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        order_by: args::string_or(&args, "order_by", "updated")?,
        sort: args::string_or(&args, "sort", "desc")?,
        search: args::opt_string(&args, "search")?,
    };
    let path = format!("/projects/{}/repository/tags", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_repository_tags_tag_name(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/repository/tags/{tag_name}"),
        "Get a single repository tag",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("tag_name", "Name of the tag"),
        |client, args| Box::pin(handle_get_pjs_id_repository_tags_tag_name(client, args)),
    );
}

async fn handle_get_pjs_id_repository_tags_tag_name(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let tag_name = args::require_str(&args, "tag_name")?;
    let path = format!(
        "/projects/{}/repository/tags/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&tag_name)
    );
    to_result(client.get(&path).await)
}

fn register_post_pjs_id_repository_tags(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/repository/tags"),
        "Create a new repository tag",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("tag_name", "Name of the new tag")
            .string_required("ref", "Branch name or commit SHA to create the tag from")
            .string("message", "Annotation message, creates an annotated tag when set"),
        |client, args| Box::pin(handle_post_pjs_id_repository_tags(client, args)),
    );
}

#[derive(Serialize)]
struct CreateTagBody {
    tag_name: String,
    r#ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

async fn handle_post_pjs_id_repository_tags(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let body = CreateTagBody {
        tag_name: args::require_str(&args, "tag_name")?,
        r#ref: args::require_str(&args, "ref")?,
        message: args::opt_string(&args, "message")?,
    };
    let path = format!("/projects/{}/repository/tags", GitlabClient::encode_path(&id));
    to_result(client.post(&path, &body).await)
}

fn register_delete_pjs_id_repository_tags_tag_name(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Delete,
            "/projects/{id}/repository/tags/{tag_name}",
        ),
        "Delete a repository tag",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("tag_name", "Name of the tag"),
        |client, args| Box::pin(handle_delete_pjs_id_repository_tags_tag_name(client, args)),
    );
}

async fn handle_delete_pjs_id_repository_tags_tag_name(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let tag_name = args::require_str(&args, "tag_name")?;
    let path = format!(
        "/projects/{}/repository/tags/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&tag_name)
    );
    to_result(client.delete(&path).await)
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
    async fn test_list_tags_orders_by_updated_by_default() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects/7/repository/tags")
                .query_param("order_by", "updated")
                .query_param("sort", "desc");
            then.status(200).json_body(json!([]));
        });

        handle_get_pjs_id_repository_tags(client_for(&server.base_url()), args(json!({"id": 7})))
            .await
            .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_create_annotated_tag() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/projects/7/repository/tags")
                .json_body(json!({
                    "tag_name": "v1.4.0",
                    "ref": "main",
                    "message": "Release v1.4.0",
                }));
            then.status(201).json_body(json!({"name": "v1.4.0"}));
        });

        handle_post_pjs_id_repository_tags(
            client_for(&server.base_url()),
            args(json!({
                "id": 7,
                "tag_name": "v1.4.0",
                "ref": "main",
                "message": "Release v1.4.0",
            })),
        )
        .await
        .unwrap();

        mock.assert();
    }
}
