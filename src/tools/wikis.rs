//! Project wiki page endpoints. Pages are addressed by slug, which may
//! contain slashes.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::to_result;
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_pjs_id_wikis(registry);
    register_get_pjs_id_wikis_slug(registry);
    register_post_pjs_id_wikis(registry);
    register_put_pjs_id_wikis_slug(registry);
    register_delete_pjs_id_wikis_slug(registry);
}

fn register_get_pjs_id_wikis(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/wikis"),
        "List the wiki pages of a project",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .boolean_default("with_content", "Include the content of each page", false),
        |client, args| Box::pin(handle_get_pjs_id_wikis(client, args)),
    );
}

#[derive(Serialize)]
struct ListWikisQuery {
    with_content: bool,
}

async fn handle_get_pjs_id_wikis(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = ListWikisQuery {
        with_content: args::bool_or(&args, "with_content", false)?,
    };
    let path = format!("/projects/{}/wikis", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_wikis_slug(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/wikis/{slug}"),
        "Get a single wiki page",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("slug", "URL-encoded slug of the page, for example dir%2Fpage")
            .boolean("render_html", "Return the content rendered as HTML")
            .string("version", "Commit SHA of the page version to return"),
        |client, args| Box::pin(handle_get_pjs_id_wikis_slug(client, args)),
    );
}

#[derive(Serialize)]
struct GetWikiPageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    render_html: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

async fn handle_get_pjs_id_wikis_slug(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let slug = args::require_str(&args, "slug")?;
    let query = GetWikiPageQuery {
        render_html: args::opt_bool(&args, "render_html")?,
        version: args::opt_string(&args, "version")?,
    };
    let path = format!(
        "/projects/{}/wikis/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&slug)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_post_pjs_id_wikis(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/wikis"),
        "Create a new wiki page",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("title", "Title of the page")
            .string_required("content", "Content of the page")
            .string_enum_default(
                "format",
                "Markup format of the page",
                &["markdown", "rdoc", "asciidoc", "org"],
                "markdown",
            ),
        |client, args| Box::pin(handle_post_pjs_id_wikis(client, args)),
    );
}

#[derive(Serialize)]
struct CreateWikiPageBody {
    title: String,
    content: String,
    format: String,
}

async fn handle_post_pjs_id_wikis(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let body = CreateWikiPageBody {
        title: args::require_str(&args, "title")?,
        content: args::require_str(&args, "content")?,
        format: args::string_or(&args, "format", "markdown")?,
    };
    let path = format!("/projects/{}/wikis", GitlabClient::encode_path(&id));
    to_result(client.post(&path, &body).await)
}

fn register_put_pjs_id_wikis_slug(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Put, "/projects/{id}/wikis/{slug}"),
        "Update an existing wiki page",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("slug", "URL-encoded slug of the page")
            .string("title", "New title of the page")
            .string("content", "New content of the page")
            .string_enum(
                "format",
                "Markup format of the page",
                &["markdown", "rdoc", "asciidoc", "org"],
            ),
        |client, args| Box::pin(handle_put_pjs_id_wikis_slug(client, args)),
    );
}

#[derive(Serialize)]
struct UpdateWikiPageBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

async fn handle_put_pjs_id_wikis_slug(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let slug = args::require_str(&args, "slug")?;
    let body = UpdateWikiPageBody {
        title: args::opt_string(&args, "title")?,
        content: args::opt_string(&args, "content")?,
        format: args::opt_string(&args, "format")?,
    };
    let path = format!(
        "/projects/{}/wikis/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&slug)
    );
    to_result(client.put(&path, &body).await)
}

fn register_delete_pjs_id_wikis_slug(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Delete, "/projects/{id}/wikis/{slug}"),
        "Delete a wiki page",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("slug", "URL-encoded slug of the page"),
        |client, args| Box::pin(handle_delete_pjs_id_wikis_slug(client, args)),
    );
}

async fn handle_delete_pjs_id_wikis_slug(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let slug = args::require_str(&args, "slug")?;
    let path = format!(
        "/projects/{}/wikis/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&slug)
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
    fn test_module_registers_five_tools() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        assert_eq!(registry.len(), 5);
    }

    #[tokio::test]
    async fn test_list_wikis_defaults_to_no_content() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects/7/wikis")
                .query_param("with_content", "false");
            then.status(200).json_body(json!([]));
        });

        handle_get_pjs_id_wikis(client_for(&server.base_url()), args(json!({"id": 7})))
            .await
            .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_create_page_defaults_to_markdown() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/projects/7/wikis")
                .json_body(json!({
                    "title": "Deploy runbook",
                    "content": "# Steps\n",
                    "format": "markdown",
                }));
            then.status(201).json_body(json!({"slug": "Deploy-runbook"}));
        });

        handle_post_pjs_id_wikis(
            client_for(&server.base_url()),
            args(json!({"id": 7, "title": "Deploy runbook", "content": "# Steps\n"})),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_nested_slug_is_encoded() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects/7/wikis/ops%2Frunbooks%2Fdeploy");
            then.status(200).json_body(json!({"slug": "ops/runbooks/deploy"}));
        });

        handle_get_pjs_id_wikis_slug(
            client_for(&server.base_url()),
            args(json!({"id": 7, "slug": "ops/runbooks/deploy"})),
        )
        .await
        .unwrap();

        mock.assert();
    }
}
