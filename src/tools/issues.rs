//! Issue endpoints: global, group and project listings plus the full
//! project-issue lifecycle.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE, page_query, to_result};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_issues(registry);
    register_get_groups_id_issues(registry);
    register_get_pjs_id_issues(registry);
    register_get_pjs_id_issues_issue_iid(registry);
    register_post_pjs_id_issues(registry);
    register_put_pjs_id_issues_issue_iid(registry);
    register_delete_pjs_id_issues_issue_iid(registry);
    register_post_pjs_id_issues_issue_iid_clone(registry);
    register_post_pjs_id_issues_issue_iid_move(registry);
    register_post_pjs_id_issues_issue_iid_subscribe(registry);
    register_post_pjs_id_issues_issue_iid_unsubscribe(registry);
    register_post_pjs_id_issues_issue_iid_todo(registry);
    register_get_pjs_id_issues_issue_iid_related_merge_requests(registry);
    register_get_pjs_id_issues_issue_iid_closed_by(registry);
    register_get_pjs_id_issues_issue_iid_participants(registry);
}

#[derive(Serialize)]
struct ListIssuesQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    milestone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_after: Option<String>,
    order_by: String,
    sort: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    with_labels_details: Option<bool>,
}

fn list_issues_query(
    args: &JsonObject,
    default_scope: Option<&str>,
) -> Result<ListIssuesQuery, McpError> {
    let scope = match args::opt_string(args, "scope")? {
        Some(scope) => Some(scope),
        None => default_scope.map(str::to_string),
    };
    Ok(ListIssuesQuery {
        page: args::u64_or(args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        state: args::opt_string(args, "state")?,
        labels: args::opt_string(args, "labels")?,
        milestone: args::opt_string(args, "milestone")?,
        scope,
        author_id: args::opt_u64(args, "author_id")?,
        assignee_id: args::opt_u64(args, "assignee_id")?,
        search: args::opt_string(args, "search")?,
        created_after: args::opt_string(args, "created_after")?,
        created_before: args::opt_string(args, "created_before")?,
        updated_after: args::opt_string(args, "updated_after")?,
        order_by: args::string_or(args, "order_by", "created_at")?,
        sort: args::string_or(args, "sort", "desc")?,
        with_labels_details: args::opt_bool(args, "with_labels_details")?,
    })
}

fn list_issues_schema(schema: Schema) -> Schema {
    schema
        .string_enum("state", "Return issues in the given state", &["opened", "closed"])
        .string("labels", "Comma-separated label names, issues must have all of them")
        .string("milestone", "Milestone title")
        .integer("author_id", "Return issues created by the given user ID")
        .integer("assignee_id", "Return issues assigned to the given user ID")
        .string("search", "Search issues by title and description")
        .string("created_after", "Return issues created on or after the given time (ISO 8601)")
        .string("created_before", "Return issues created on or before the given time (ISO 8601)")
        .string("updated_after", "Return issues updated on or after the given time (ISO 8601)")
        .string_enum_default(
            "order_by",
            "Field to order the results by",
            &["created_at", "updated_at"],
            "created_at",
        )
        .string_enum_default("sort", "Sort order", &["asc", "desc"], "desc")
        .boolean("with_labels_details", "Return full label details instead of names")
        .integer_default("page", "Page number", 1)
        .integer_default("per_page", "Results per page (max 100)", 20)
}

fn register_get_issues(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/issues"),
        "List issues the authenticated user has access to",
        list_issues_schema(Schema::new().string_enum_default(
            "scope",
            "Return issues for the given scope",
            &["created_by_me", "assigned_to_me", "all"],
            "created_by_me",
        )),
        |client, args| Box::pin(handle_get_issues(client, args)),
    );
}

async fn handle_get_issues(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let query = list_issues_query(&args, Some("created_by_me"))?;
    to_result(client.get_query("/issues", &query).await)
}

fn register_get_groups_id_issues(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/groups/{id}/issues"),
        "List issues of a group and its projects",
        list_issues_schema(
            Schema::new()
                .string_required("id", "Group ID or URL-encoded path")
                .string_enum(
                    "scope",
                    "Return issues for the given scope",
                    &["created_by_me", "assigned_to_me", "all"],
                ),
        ),
        |client, args| Box::pin(handle_get_groups_id_issues(client, args)),
    );
}

async fn handle_get_groups_id_issues(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = list_issues_query(&args, None)?;
    let path = format!("/groups/{}/issues", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_issues(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/issues"),
        "List issues of a project",
        list_issues_schema(
            Schema::new()
                .string_required("id", "Project ID or URL-encoded path")
                .string_enum(
                    "scope",
                    "Return issues for the given scope",
                    &["created_by_me", "assigned_to_me", "all"],
                ),
        ),
        |client, args| Box::pin(handle_get_pjs_id_issues(client, args)),
    );
}

async fn handle_get_pjs_id_issues(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = list_issues_query(&args, None)?;
    let path = format!("/projects/{}/issues", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_issues_issue_iid(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/issues/{issue_iid}"),
        "Get a single project issue",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue"),
        |client, args| Box::pin(handle_get_pjs_id_issues_issue_iid(client, args)),
    );
}

async fn handle_get_pjs_id_issues_issue_iid(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let path = format!(
        "/projects/{}/issues/{issue_iid}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get(&path).await)
}

fn register_post_pjs_id_issues(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/issues"),
        "Create a new project issue",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("title", "Title of the issue")
            .string("description", "Description of the issue")
            .string("labels", "Comma-separated label names to assign")
            .string("assignee_ids", "Comma-separated user IDs to assign")
            .integer("milestone_id", "Global ID of a milestone to assign")
            .string("due_date", "Due date (YYYY-MM-DD)")
            .boolean_default("confidential", "Make the issue confidential", false)
            .string_enum(
                "issue_type",
                "Type of the issue",
                &["issue", "incident", "test_case", "task"],
            ),
        |client, args| Box::pin(handle_post_pjs_id_issues(client, args)),
    );
}

#[derive(Serialize)]
struct CreateIssueBody {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_ids: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    milestone_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<String>,
    confidential: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    issue_type: Option<String>,
}

async fn handle_post_pjs_id_issues(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let body = CreateIssueBody {
        title: args::require_str(&args, "title")?,
        description: args::opt_string(&args, "description")?,
        labels: args::opt_string(&args, "labels")?,
        assignee_ids: args::opt_csv_u64(&args, "assignee_ids")?,
        milestone_id: args::opt_u64(&args, "milestone_id")?,
        due_date: args::opt_string(&args, "due_date")?,
        confidential: args::bool_or(&args, "confidential", false)?,
        issue_type: args::opt_string(&args, "issue_type")?,
    };
    let path = format!("/projects/{}/issues", GitlabClient::encode_path(&id));
    to_result(client.post(&path, &body).await)
}

fn register_put_pjs_id_issues_issue_iid(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Put, "/projects/{id}/issues/{issue_iid}"),
        "Update a project issue",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue")
            .string("title", "New title")
            .string("description", "New description")
            .string("labels", "Comma-separated label names replacing the current set")
            .string("assignee_ids", "Comma-separated user IDs replacing the assignees")
            .integer("milestone_id", "Global ID of a milestone to assign")
            .string("due_date", "Due date (YYYY-MM-DD)")
            .boolean("confidential", "Change the confidential flag")
            .string_enum("state_event", "Close or reopen the issue", &["close", "reopen"])
            .integer("weight", "Weight of the issue"),
        |client, args| Box::pin(handle_put_pjs_id_issues_issue_iid(client, args)),
    );
}

#[derive(Serialize)]
struct UpdateIssueBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_ids: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    milestone_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidential: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<u64>,
}

async fn handle_put_pjs_id_issues_issue_iid(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let body = UpdateIssueBody {
        title: args::opt_string(&args, "title")?,
        description: args::opt_string(&args, "description")?,
        labels: args::opt_string(&args, "labels")?,
        assignee_ids: args::opt_csv_u64(&args, "assignee_ids")?,
        milestone_id: args::opt_u64(&args, "milestone_id")?,
        due_date: args::opt_string(&args, "due_date")?,
        confidential: args::opt_bool(&args, "confidential")?,
        state_event: args::opt_string(&args, "state_event")?,
        weight: args::opt_u64(&args, "weight")?,
    };
    let path = format!(
        "/projects/{}/issues/{issue_iid}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.put(&path, &body).await)
}

fn register_delete_pjs_id_issues_issue_iid(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Delete, "/projects/{id}/issues/{issue_iid}"),
        "Delete a project issue",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue"),
        |client, args| Box::pin(handle_delete_pjs_id_issues_issue_iid(client, args)),
    );
}

async fn handle_delete_pjs_id_issues_issue_iid(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let path = format!(
        "/projects/{}/issues/{issue_iid}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.delete(&path).await)
}

fn register_post_pjs_id_issues_issue_iid_clone(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/issues/{issue_iid}/clone"),
        "Clone an issue to a given project",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue")
            .integer_required("to_project_id", "ID of the project to clone the issue into")
            .boolean_default("with_notes", "Clone the issue with its notes", false),
        |client, args| Box::pin(handle_post_pjs_id_issues_issue_iid_clone(client, args)),
    );
}

#[derive(Serialize)]
struct CloneIssueBody {
    to_project_id: u64,
    with_notes: bool,
}

async fn handle_post_pjs_id_issues_issue_iid_clone(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let body = CloneIssueBody {
        to_project_id: args::require_u64(&args, "to_project_id")?,
        with_notes: args::bool_or(&args, "with_notes", false)?,
    };
    let path = format!(
        "/projects/{}/issues/{issue_iid}/clone",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post(&path, &body).await)
}

fn register_post_pjs_id_issues_issue_iid_move(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/issues/{issue_iid}/move"),
        "Move an issue to a different project",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue")
            .integer_required("to_project_id", "ID of the project to move the issue into"),
        |client, args| Box::pin(handle_post_pjs_id_issues_issue_iid_move(client, args)),
    );
}

#[derive(Serialize)]
struct MoveIssueBody {
    to_project_id: u64,
}

async fn handle_post_pjs_id_issues_issue_iid_move(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let body = MoveIssueBody {
        to_project_id: args::require_u64(&args, "to_project_id")?,
    };
    let path = format!(
        "/projects/{}/issues/{issue_iid}/move",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post(&path, &body).await)
}

fn register_post_pjs_id_issues_issue_iid_subscribe(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/issues/{issue_iid}/subscribe"),
        "Subscribe the authenticated user to an issue",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue"),
        |client, args| Box::pin(handle_post_pjs_id_issues_issue_iid_subscribe(client, args)),
    );
}

async fn handle_post_pjs_id_issues_issue_iid_subscribe(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let path = format!(
        "/projects/{}/issues/{issue_iid}/subscribe",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post_empty(&path).await)
}

fn register_post_pjs_id_issues_issue_iid_unsubscribe(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/issues/{issue_iid}/unsubscribe"),
        "Unsubscribe the authenticated user from an issue",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue"),
        |client, args| {
            Box::pin(handle_post_pjs_id_issues_issue_iid_unsubscribe(client, args))
        },
    );
}

async fn handle_post_pjs_id_issues_issue_iid_unsubscribe(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let path = format!(
        "/projects/{}/issues/{issue_iid}/unsubscribe",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post_empty(&path).await)
}

fn register_post_pjs_id_issues_issue_iid_todo(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/issues/{issue_iid}/todo"),
        "Create a to-do item for the authenticated user on an issue",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue"),
        |client, args| Box::pin(handle_post_pjs_id_issues_issue_iid_todo(client, args)),
    );
}

async fn handle_post_pjs_id_issues_issue_iid_todo(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let path = format!(
        "/projects/{}/issues/{issue_iid}/todo",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post_empty(&path).await)
}

fn register_get_pjs_id_issues_issue_iid_related_merge_requests(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/issues/{issue_iid}/related_merge_requests",
        ),
        "List merge requests related to an issue",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| {
            Box::pin(handle_get_pjs_id_issues_issue_iid_related_merge_requests(
                client, args,
            ))
        },
    );
}

async fn handle_get_pjs_id_issues_issue_iid_related_merge_requests(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let query = page_query(&args)?;
    let path = format!(
        "/projects/{}/issues/{issue_iid}/related_merge_requests",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_issues_issue_iid_closed_by(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/issues/{issue_iid}/closed_by"),
        "List merge requests that will close an issue when merged",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_issues_issue_iid_closed_by(client, args)),
    );
}

async fn handle_get_pjs_id_issues_issue_iid_closed_by(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let query = page_query(&args)?;
    let path = format!(
        "/projects/{}/issues/{issue_iid}/closed_by",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_issues_issue_iid_participants(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/issues/{issue_iid}/participants"),
        "List users participating in an issue",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue"),
        |client, args| {
            Box::pin(handle_get_pjs_id_issues_issue_iid_participants(client, args))
        },
    );
}

async fn handle_get_pjs_id_issues_issue_iid_participants(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let path = format!(
        "/projects/{}/issues/{issue_iid}/participants",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get(&path).await)
}
