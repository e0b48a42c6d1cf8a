//! Project and group label endpoints.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE, to_result};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_pjs_id_labels(registry);
    register_get_pjs_id_labels_label_id(registry);
    register_post_pjs_id_labels(registry);
    register_put_pjs_id_labels_label_id(registry);
    register_delete_pjs_id_labels_label_id(registry);
    register_post_pjs_id_labels_label_id_promote(registry);
    register_put_pjs_id_labels_label_id_subscribe(registry);
    register_put_pjs_id_labels_label_id_unsubscribe(registry);
    register_get_groups_id_labels(registry);
    register_post_groups_id_labels(registry);
}

#[derive(Serialize)]
struct ListLabelsQuery {
    page: u64,
    per_page: u64,
    with_counts: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_ancestor_groups: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
}

fn list_labels_query(args: &JsonObject) -> Result<ListLabelsQuery, McpError> {
    Ok(ListLabelsQuery {
        page: args::u64_or(args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        with_counts: args::bool_or(args, "with_counts", false)?,
        include_ancestor_groups: args::opt_bool(args, "include_ancestor_groups")?,
        search: args::opt_string(args, "search")?,
    })
}

fn list_labels_schema(schema: Schema) -> Schema {
    schema
        .boolean_default("with_counts", "Include issue and merge request counts", false)
        .boolean("include_ancestor_groups", "Include labels of ancestor groups")
        .string("search", "Filter labels by a search keyword")
        .integer_default("page", "Page number", 1)
        .integer_default("per_page", "Results per page (max 100)", 20)
}

fn register_get_pjs_id_labels(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/labels"),
        "List the labels of a project",
        list_labels_schema(Schema::new().string_required("id", "Project ID or URL-encoded path")),
        |client, args| Box::pin(handle_get_pjs_id_labels(client, args)),
    );
}

async fn handle_get_pjs_id_labels(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = list_labels_query(&args)?;
    let path = format!("/projects/{}/labels", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_labels_label_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/labels/{label_id}"),
        "Get a single project label by ID or name",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("label_id", "Label ID or name")
            .boolean("include_ancestor_groups", "Include labels of ancestor groups"),
        |client, args| Box::pin(handle_get_pjs_id_labels_label_id(client, args)),
    );
}

#[derive(Serialize)]
struct GetLabelQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    include_ancestor_groups: Option<bool>,
}

async fn handle_get_pjs_id_labels_label_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let label_id = args::require_str(&args, "label_id")?;
    let query = GetLabelQuery {
        include_ancestor_groups: args::opt_bool(&args, "include_ancestor_groups")?,
    };
    let path = format!(
        "/projects/{}/labels/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&label_id)
    );
    to_result(client.get_query(&path, &query).await)
}

#[derive(Serialize)]
struct CreateLabelBody {
    name: String,
    color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u64>,
}

fn create_label_body(args: &JsonObject) -> Result<CreateLabelBody, McpError> {
    Ok(CreateLabelBody {
        name: args::require_str(args, "name")?,
        color: args::require_str(args, "color")?,
        description: args::opt_string(args, "description")?,
        priority: args::opt_u64(args, "priority")?,
    })
}

fn create_label_schema(schema: Schema) -> Schema {
    schema
        .string_required("name", "Name of the label")
        .string_required("color", "Color of the label in hex notation, for example #FF0000")
        .string("description", "Description of the label")
        .integer("priority", "Priority of the label within the project")
}

fn register_post_pjs_id_labels(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/labels"),
        "Create a new project label",
        create_label_schema(Schema::new().string_required("id", "Project ID or URL-encoded path")),
        |client, args| Box::pin(handle_post_pjs_id_labels(client, args)),
    );
}

async fn handle_post_pjs_id_labels(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let body = create_label_body(&args)?;
    let path = format!("/projects/{}/labels", GitlabClient::encode_path(&id));
    to_result(client.post(&path, &body).await)
}

fn register_put_pjs_id_labels_label_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Put, "/projects/{id}/labels/{label_id}"),
        "Update an existing project label",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("label_id", "Label ID or name")
            .string("new_name", "New name of the label")
            .string("color", "New color of the label in hex notation")
            .string("description", "New description of the label")
            .integer("priority", "New priority of the label"),
        |client, args| Box::pin(handle_put_pjs_id_labels_label_id(client, args)),
    );
}

#[derive(Serialize)]
struct UpdateLabelBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    new_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u64>,
}

async fn handle_put_pjs_id_labels_label_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let label_id = args::require_str(&args, "label_id")?;
    let body = UpdateLabelBody {
        new_name: args::opt_string(&args, "new_name")?,
        color: args::opt_string(&args, "color")?,
        description: args::opt_string(&args, "description")?,
        priority: args::opt_u64(&args, "priority")?,
    };
    let path = format!(
        "/projects/{}/labels/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&label_id)
    );
    to_result(client.put(&path, &body).await)
}

fn register_delete_pjs_id_labels_label_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Delete, "/projects/{id}/labels/{label_id}"),
        "Delete a project label",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("label_id", "Label ID or name"),
        |client, args| Box::pin(handle_delete_pjs_id_labels_label_id(client, args)),
    );
}

async fn handle_delete_pjs_id_labels_label_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let label_id = args::require_str(&args, "label_id")?;
    let path = format!(
        "/projects/{}/labels/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&label_id)
    );
    to_result(client.delete(&path).await)
}

fn register_post_pjs_id_labels_label_id_promote(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/labels/{label_id}/promote"),
        "Promote a project label to a group label",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("label_id", "Label ID or name"),
        |client, args| Box::pin(handle_post_pjs_id_labels_label_id_promote(client, args)),
    );
}

async fn handle_post_pjs_id_labels_label_id_promote(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let label_id = args::require_str(&args, "label_id")?;
    let path = format!(
        "/projects/{}/labels/{}/promote",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&label_id)
    );
    to_result(client.post_empty(&path).await)
}

fn register_put_pjs_id_labels_label_id_subscribe(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Put, "/projects/{id}/labels/{label_id}/subscribe"),
        "Subscribe the authenticated user to a project label",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("label_id", "Label ID or name"),
        |client, args| Box::pin(handle_put_pjs_id_labels_label_id_subscribe(client, args)),
    );
}

async fn handle_put_pjs_id_labels_label_id_subscribe(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let label_id = args::require_str(&args, "label_id")?;
    let path = format!(
        "/projects/{}/labels/{}/subscribe",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&label_id)
    );
    to_result(client.put_empty(&path).await)
}

fn register_put_pjs_id_labels_label_id_unsubscribe(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Put, "/projects/{id}/labels/{label_id}/unsubscribe"),
        "Unsubscribe the authenticated user from a project label",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("label_id", "Label ID or name"),
        |client, args| Box::pin(handle_put_pjs_id_labels_label_id_unsubscribe(client, args)),
    );
}

async fn handle_put_pjs_id_labels_label_id_unsubscribe(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let label_id = args::require_str(&args, "label_id")?;
    let path = format!(
        "/projects/{}/labels/{}/unsubscribe",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&label_id)
    );
    to_result(client.put_empty(&path).await)
}

fn register_get_groups_id_labels(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/groups/{id}/labels"),
        "List the labels of a group",
        list_labels_schema(Schema::new().string_required("id", "Group ID or URL-encoded path")),
        |client, args| Box::pin(handle_get_groups_id_labels(client, args)),
    );
}

async fn handle_get_groups_id_labels(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = list_labels_query(&args)?;
    let path = format!("/groups/{}/labels", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_post_groups_id_labels(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/groups/{id}/labels"),
        "Create a new group label",
        create_label_schema(Schema::new().string_required("id", "Group ID or URL-encoded path")),
        |client, args| Box::pin(handle_post_groups_id_labels(client, args)),
    );
}

async fn handle_post_groups_id_labels(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let body = create_label_body(&args)?;
    let path = format!("/groups/{}/labels", GitlabClient::encode_path(&id));
    to_result(client.post(&path, &body).await)
}
