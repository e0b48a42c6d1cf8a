//! Release endpoints. Releases are keyed by tag name rather than a
//! numeric ID.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE, to_result};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_pjs_id_releases(registry);
    register_get_pjs_id_releases_tag_name(registry);
    register_post_pjs_id_releases(registry);
    register_put_pjs_id_releases_tag_name(registry);
    register_delete_pjs_id_releases_tag_name(registry);
}

fn register_get_pjs_id_releases(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/releases"),
        "List the releases of a project",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_enum_default(
                "order_by",
                "Field to order the results by",
                &["released_at", "created_at"],
                "released_at",
            )
            .string_enum_default("sort", "Sort order", &["asc", "desc"], "desc")
            .boolean("include_html_description", "Include the description rendered as HTML")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_releases(client, args)),
    );
}

#[derive(Serialize)]
struct ListReleasesQuery {
    page: u64,
    per_page: u64,
    order_by: String,
    sort: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_html_description: Option<bool>,
}

async fn handle_get_pjs_id_releases(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = ListReleasesQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        order_by: args::string_or(&args, "order_by", "released_at")?,
        sort: args::string_or(&args, "sort", "desc")?,
        include_html_description: args::opt_bool(&args, "include_html_description")?,
    };
    let path = format!("/projects/{}/releases", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_releases_tag_name(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/releases/{tag_name}"),
        "Get the release for a given tag",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("tag_name", "Tag the release is attached to")
            .boolean("include_html_description", "Include the description rendered as HTML"),
        |client, args| Box::pin(handle_get_pjs_id_releases_tag_name(client, args)),
    );
}

#[derive(Serialize)]
struct GetReleaseQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    include_html_description: Option<bool>,
}

async fn handle_get_pjs_id_releases_tag_name(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let tag_name = args::require_str(&args, "tag_name")?;
    let query = GetReleaseQuery {
        include_html_description: args::opt_bool(&args, "include_html_description")?,
    };
    let path = format!(
        "/projects/{}/releases/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&tag_name)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_post_pjs_id_releases(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/releases"),
        "Create a release for a tag, creating the tag when a ref is given",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("tag_name", "Tag to attach the release to")
            .string("name", "Name of the release, defaults to the tag name")
            .string("description", "Description of the release, supports Markdown")
            .string("ref", "Branch or commit SHA to create the tag from when it does not exist")
            .string("released_at", "Release date and time (ISO 8601)")
            .string("milestones", "Comma-separated milestone titles to associate"),
        |client, args| Box::pin(handle_post_pjs_id_releases(client, args)),
    );
}

#[derive(Serialize)]
struct CreateReleaseBody {
    tag_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    r#ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    released_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    milestones: Option<Vec<String>>,
}

async fn handle_post_pjs_id_releases(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let body = CreateReleaseBody {
        tag_name: args::require_str(&args, "tag_name")?,
        name: args::opt_string(&args, "name")?,
        description: args::opt_string(&args, "description")?,
        r#ref: args::opt_string(&args, "ref")?,
        released_at: args::opt_string(&args, "released_at")?,
        milestones: args::opt_csv(&args, "milestones")?,
    };
    let path = format!("/projects/{}/releases", GitlabClient::encode_path(&id));
    to_result(client.post(&path, &body).await)
}

fn register_put_pjs_id_releases_tag_name(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Put, "/projects/{id}/releases/{tag_name}"),
        "Update a release",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("tag_name", "Tag the release is attached to")
            .string("name", "New name of the release")
            .string("description", "New description of the release")
            .string("released_at", "New release date and time (ISO 8601)")
            .string("milestones", "Comma-separated milestone titles replacing the current set"),
        |client, args| Box::pin(handle_put_pjs_id_releases_tag_name(client, args)),
    );
}

#[derive(Serialize)]
struct UpdateReleaseBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    released_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    milestones: Option<Vec<String>>,
}

async fn handle_put_pjs_id_releases_tag_name(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let tag_name = args::require_str(&args, "tag_name")?;
    let body = UpdateReleaseBody {
        name: args::opt_string(&args, "name")?,
        description: args::opt_string(&args, "description")?,
        released_at: args::opt_string(&args, "released_at")?,
        milestones: args::opt_csv(&args, "milestones")?,
    };
    let path = format!(
        "/projects/{}/releases/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&tag_name)
    );
    to_result(client.put(&path, &body).await)
}

fn register_delete_pjs_id_releases_tag_name(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Delete, "/projects/{id}/releases/{tag_name}"),
        "Delete a release, keeping the underlying tag",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("tag_name", "Tag the release is attached to"),
        |client, args| Box::pin(handle_delete_pjs_id_releases_tag_name(client, args)),
    );
}

async fn handle_delete_pjs_id_releases_tag_name(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let tag_name = args::require_str(&args, "tag_name")?;
    let path = format!(
        "/projects/{}/releases/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&tag_name)
    );
    to_result(client.delete(&path).await)
}
