//! Project milestone endpoints.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE, page_query, to_result};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_pjs_id_milestones(registry);
    register_get_pjs_id_milestones_milestone_id(registry);
    register_post_pjs_id_milestones(registry);
    register_put_pjs_id_milestones_milestone_id(registry);
    register_delete_pjs_id_milestones_milestone_id(registry);
    register_get_pjs_id_milestones_milestone_id_issues(registry);
    register_get_pjs_id_milestones_milestone_id_mrs(registry);
    register_post_pjs_id_milestones_milestone_id_promote(registry);
}

fn register_get_pjs_id_milestones(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/milestones"),
        "List the milestones of a project",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_enum("state", "Return only active or closed milestones", &["active", "closed"])
            .string("title", "Return only milestones with the given title")
            .string("search", "Search milestones by title or description")
            .boolean("include_ancestors", "Include milestones of ancestor groups")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_milestones(client, args)),
    );
}

#[derive(Serialize)]
struct ListMilestonesQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_ancestors: Option<bool>,
}

async fn handle_get_pjs_id_milestones(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = ListMilestonesQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        state: args::opt_string(&args, "state")?,
        title: args::opt_string(&args, "title")?,
        search: args::opt_string(&args, "search")?,
        include_ancestors: args::opt_bool(&args, "include_ancestors")?,
    };
    let path = format!("/projects/{}/milestones", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_milestones_milestone_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/milestones/{milestone_id}"),
        "Get a single project milestone",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("milestone_id", "ID of the milestone"),
        |client, args| Box::pin(handle_get_pjs_id_milestones_milestone_id(client, args)),
    );
}

async fn handle_get_pjs_id_milestones_milestone_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let milestone_id = args::require_u64(&args, "milestone_id")?;
    let path = format!(
        "/projects/{}/milestones/{milestone_id}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get(&path).await)
}

fn register_post_pjs_id_milestones(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/milestones"),
        "Create a new project milestone",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("title", "Title of the milestone")
            .string("description", "Description of the milestone")
            .string("due_date", "Due date (YYYY-MM-DD)")
            .string("start_date", "Start date (YYYY-MM-DD)"),
        |client, args| Box::pin(handle_post_pjs_id_milestones(client, args)),
    );
}

#[derive(Serialize)]
struct CreateMilestoneBody {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<String>,
}

async fn handle_post_pjs_id_milestones(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let body = CreateMilestoneBody {
        title: args::require_str(&args, "title")?,
        description: args::opt_string(&args, "description")?,
        due_date: args::opt_string(&args, "due_date")?,
        start_date: args::opt_string(&args, "start_date")?,
    };
    let path = format!("/projects/{}/milestones", GitlabClient::encode_path(&id));
    to_result(client.post(&path, &body).await)
}

fn register_put_pjs_id_milestones_milestone_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Put, "/projects/{id}/milestones/{milestone_id}"),
        "Update an existing project milestone",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("milestone_id", "ID of the milestone")
            .string("title", "New title")
            .string("description", "New description")
            .string("due_date", "New due date (YYYY-MM-DD)")
            .string("start_date", "New start date (YYYY-MM-DD)")
            .string_enum(
                "state_event",
                "Close or activate the milestone",
                &["close", "activate"],
            ),
        |client, args| Box::pin(handle_put_pjs_id_milestones_milestone_id(client, args)),
    );
}

#[derive(Serialize)]
struct UpdateMilestoneBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_event: Option<String>,
}

async fn handle_put_pjs_id_milestones_milestone_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let milestone_id = args::require_u64(&args, "milestone_id")?;
    let body = UpdateMilestoneBody {
        title: args::opt_string(&args, "title")?,
        description: args::opt_string(&args, "description")?,
        due_date: args::opt_string(&args, "due_date")?,
        start_date: args::opt_string(&args, "start_date")?,
        state_event: args::opt_string(&args, "state_event")?,
    };
    let path = format!(
        "/projects/{}/milestones/{milestone_id}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.put(&path, &body).await)
}

fn register_delete_pjs_id_milestones_milestone_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Delete, "/projects/{id}/milestones/{milestone_id}"),
        "Delete a project milestone",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("milestone_id", "ID of the milestone"),
        |client, args| Box::pin(handle_delete_pjs_id_milestones_milestone_id(client, args)),
    );
}

async fn handle_delete_pjs_id_milestones_milestone_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let milestone_id = args::require_u64(&args, "milestone_id")?;
    let path = format!(
        "/projects/{}/milestones/{milestone_id}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.delete(&path).await)
}

fn register_get_pjs_id_milestones_milestone_id_issues(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/milestones/{milestone_id}/issues",
        ),
        "List the issues assigned to a milestone",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("milestone_id", "ID of the milestone")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_milestones_milestone_id_issues(client, args)),
    );
}

async fn handle_get_pjs_id_milestones_milestone_id_issues(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let milestone_id = args::require_u64(&args, "milestone_id")?;
    let query = page_query(&args)?;
    let path = format!(
        "/projects/{}/milestones/{milestone_id}/issues",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_milestones_milestone_id_mrs(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/milestones/{milestone_id}/merge_requests",
        ),
        "List the merge requests assigned to a milestone",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("milestone_id", "ID of the milestone")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_milestones_milestone_id_mrs(client, args)),
    );
}

async fn handle_get_pjs_id_milestones_milestone_id_mrs(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let milestone_id = args::require_u64(&args, "milestone_id")?;
    let query = page_query(&args)?;
    let path = format!(
        "/projects/{}/milestones/{milestone_id}/merge_requests",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_post_pjs_id_milestones_milestone_id_promote(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Post,
            "/projects/{id}/milestones/{milestone_id}/promote",
        ),
        "Promote a project milestone to a group milestone",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("milestone_id", "ID of the milestone"),
        |client, args| Box::pin(handle_post_pjs_id_milestones_milestone_id_promote(client, args)),
    );
}

async fn handle_post_pjs_id_milestones_milestone_id_promote(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let milestone_id = args::require_u64(&args, "milestone_id")?;
    let path = format!(
        "/projects/{}/milestones/{milestone_id}/promote",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post_empty(&path).await)
}
