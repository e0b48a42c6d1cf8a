//! Merge request endpoints: listings, lifecycle, merge and the
//! subscription shortcuts.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE, page_query, to_result};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_mrs(registry);
    register_get_pjs_id_mrs(registry);
    register_get_pjs_id_mrs_mr_iid(registry);
    register_post_pjs_id_mrs(registry);
    register_put_pjs_id_mrs_mr_iid(registry);
    register_delete_pjs_id_mrs_mr_iid(registry);
    register_put_pjs_id_mrs_mr_iid_merge(registry);
    register_post_pjs_id_mrs_mr_iid_cancel_merge_when_pipeline_succeeds(registry);
    register_put_pjs_id_mrs_mr_iid_rebase(registry);
    register_get_pjs_id_mrs_mr_iid_diffs(registry);
    register_get_pjs_id_mrs_mr_iid_commits(registry);
    register_get_pjs_id_mrs_mr_iid_participants(registry);
    register_get_pjs_id_mrs_mr_iid_pipelines(registry);
    register_get_pjs_id_mrs_mr_iid_closes_issues(registry);
    register_post_pjs_id_mrs_mr_iid_subscribe(registry);
    register_post_pjs_id_mrs_mr_iid_unsubscribe(registry);
    register_post_pjs_id_mrs_mr_iid_todo(registry);
}

#[derive(Serialize)]
struct ListMergeRequestsQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    milestone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_after: Option<String>,
    order_by: String,
    sort: String,
}

fn list_merge_requests_query(
    args: &JsonObject,
    default_scope: Option<&str>,
) -> Result<ListMergeRequestsQuery, McpError> {
    let scope = match args::opt_string(args, "scope")? {
        Some(scope) => Some(scope),
        None => default_scope.map(str::to_string),
    };
    Ok(ListMergeRequestsQuery {
        page: args::u64_or(args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        state: args::opt_string(args, "state")?,
        scope,
        labels: args::opt_string(args, "labels")?,
        milestone: args::opt_string(args, "milestone")?,
        author_id: args::opt_u64(args, "author_id")?,
        assignee_id: args::opt_u64(args, "assignee_id")?,
        search: args::opt_string(args, "search")?,
        source_branch: args::opt_string(args, "source_branch")?,
        target_branch: args::opt_string(args, "target_branch")?,
        created_after: args::opt_string(args, "created_after")?,
        updated_after: args::opt_string(args, "updated_after")?,
        order_by: args::string_or(args, "order_by", "created_at")?,
        sort: args::string_or(args, "sort", "desc")?,
    })
}

fn list_merge_requests_schema(schema: Schema) -> Schema {
    schema
        .string_enum(
            "state",
            "Return merge requests in the given state",
            &["opened", "closed", "locked", "merged"],
        )
        .string("labels", "Comma-separated label names, results must have all of them")
        .string("milestone", "Milestone title")
        .integer("author_id", "Return merge requests created by the given user ID")
        .integer("assignee_id", "Return merge requests assigned to the given user ID")
        .string("search", "Search merge requests by title and description")
        .string("source_branch", "Return merge requests with the given source branch")
        .string("target_branch", "Return merge requests with the given target branch")
        .string("created_after", "Return merge requests created on or after the given time (ISO 8601)")
        .string("updated_after", "Return merge requests updated on or after the given time (ISO 8601)")
        .string_enum_default(
            "order_by",
            "Field to order the results by",
            &["created_at", "updated_at", "title"],
            "created_at",
        )
        .string_enum_default("sort", "Sort order", &["asc", "desc"], "desc")
        .integer_default("page", "Page number", 1)
        .integer_default("per_page", "Results per page (max 100)", 20)
}

fn register_get_mrs(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/merge_requests"),
        "List merge requests the authenticated user has access to",
        list_merge_requests_schema(Schema::new().string_enum_default(
            "scope",
            "Return merge requests for the given scope",
            &["created_by_me", "assigned_to_me", "all"],
            "created_by_me",
        )),
        |client, args| Box::pin(handle_get_mrs(client, args)),
    );
}

async fn handle_get_mrs(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let query = list_merge_requests_query(&args, Some("created_by_me"))?;
    to_result(client.get_query("/merge_requests", &query).await)
}

fn register_get_pjs_id_mrs(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/merge_requests"),
        "List merge requests of a project",
        list_merge_requests_schema(
            Schema::new()
                .string_required("id", "Project ID or URL-encoded path")
                .string_enum(
                    "scope",
                    "Return merge requests for the given scope",
                    &["created_by_me", "assigned_to_me", "all"],
                ),
        ),
        |client, args| Box::pin(handle_get_pjs_id_mrs(client, args)),
    );
}

async fn handle_get_pjs_id_mrs(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = list_merge_requests_query(&args, None)?;
    let path = format!("/projects/{}/merge_requests", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_mrs_mr_iid(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/merge_requests/{merge_request_iid}",
        ),
        "Get a single merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .boolean("include_diverged_commits_count", "Include the commits behind the target branch")
            .boolean("include_rebase_in_progress", "Include whether a rebase is in progress"),
        |client, args| Box::pin(handle_get_pjs_id_mrs_mr_iid(client, args)),
    );
}

#[derive(Serialize)]
struct GetMergeRequestQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    include_diverged_commits_count: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_rebase_in_progress: Option<bool>,
}

async fn handle_get_pjs_id_mrs_mr_iid(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let query = GetMergeRequestQuery {
        include_diverged_commits_count: args::opt_bool(&args, "include_diverged_commits_count")?,
        include_rebase_in_progress: args::opt_bool(&args, "include_rebase_in_progress")?,
    };
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_post_pjs_id_mrs(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/merge_requests"),
        "Create a new merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("source_branch", "Source branch name")
            .string_required("target_branch", "Target branch name")
            .string_required("title", "Title of the merge request")
            .string("description", "Description of the merge request")
            .string("assignee_ids", "Comma-separated user IDs to assign")
            .string("reviewer_ids", "Comma-separated user IDs to request review from")
            .string("labels", "Comma-separated label names to assign")
            .integer("milestone_id", "Global ID of a milestone to assign")
            .integer("target_project_id", "Numeric ID of the target project")
            .boolean_default(
                "remove_source_branch",
                "Delete the source branch after merging",
                false,
            )
            .boolean("squash", "Squash commits when merging")
            .boolean("allow_collaboration", "Allow commits from members who can merge to the target branch"),
        |client, args| Box::pin(handle_post_pjs_id_mrs(client, args)),
    );
}

#[derive(Serialize)]
struct CreateMergeRequestBody {
    source_branch: String,
    target_branch: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_ids: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reviewer_ids: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    milestone_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_project_id: Option<u64>,
    remove_source_branch: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    squash: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allow_collaboration: Option<bool>,
}

async fn handle_post_pjs_id_mrs(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let body = CreateMergeRequestBody {
        source_branch: args::require_str(&args, "source_branch")?,
        target_branch: args::require_str(&args, "target_branch")?,
        title: args::require_str(&args, "title")?,
        description: args::opt_string(&args, "description")?,
        assignee_ids: args::opt_csv_u64(&args, "assignee_ids")?,
        reviewer_ids: args::opt_csv_u64(&args, "reviewer_ids")?,
        labels: args::opt_string(&args, "labels")?,
        milestone_id: args::opt_u64(&args, "milestone_id")?,
        target_project_id: args::opt_u64(&args, "target_project_id")?,
        remove_source_branch: args::bool_or(&args, "remove_source_branch", false)?,
        squash: args::opt_bool(&args, "squash")?,
        allow_collaboration: args::opt_bool(&args, "allow_collaboration")?,
    };
    let path = format!("/projects/{}/merge_requests", GitlabClient::encode_path(&id));
    to_result(client.post(&path, &body).await)
}

fn register_put_pjs_id_mrs_mr_iid(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Put,
            "/projects/{id}/merge_requests/{merge_request_iid}",
        ),
        "Update an existing merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .string("title", "New title")
            .string("description", "New description")
            .string("target_branch", "New target branch")
            .string("labels", "Comma-separated label names replacing the current set")
            .string("assignee_ids", "Comma-separated user IDs replacing the assignees")
            .string("reviewer_ids", "Comma-separated user IDs replacing the reviewers")
            .integer("milestone_id", "Global ID of a milestone to assign")
            .string_enum(
                "state_event",
                "Close or reopen the merge request",
                &["close", "reopen"],
            )
            .boolean("remove_source_branch", "Delete the source branch after merging")
            .boolean("squash", "Squash commits when merging")
            .boolean("discussion_locked", "Lock the discussion to project members"),
        |client, args| Box::pin(handle_put_pjs_id_mrs_mr_iid(client, args)),
    );
}

#[derive(Serialize)]
struct UpdateMergeRequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_ids: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reviewer_ids: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    milestone_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remove_source_branch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    squash: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    discussion_locked: Option<bool>,
}

async fn handle_put_pjs_id_mrs_mr_iid(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let body = UpdateMergeRequestBody {
        title: args::opt_string(&args, "title")?,
        description: args::opt_string(&args, "description")?,
        target_branch: args::opt_string(&args, "target_branch")?,
        labels: args::opt_string(&args, "labels")?,
        assignee_ids: args::opt_csv_u64(&args, "assignee_ids")?,
        reviewer_ids: args::opt_csv_u64(&args, "reviewer_ids")?,
        milestone_id: args::opt_u64(&args, "milestone_id")?,
        state_event: args::opt_string(&args, "state_event")?,
        remove_source_branch: args::opt_bool(&args, "remove_source_branch")?,
        squash: args::opt_bool(&args, "squash")?,
        discussion_locked: args::opt_bool(&args, "discussion_locked")?,
    };
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.put(&path, &body).await)
}

fn register_delete_pjs_id_mrs_mr_iid(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Delete,
            "/projects/{id}/merge_requests/{merge_request_iid}",
        ),
        "Delete a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request"),
        |client, args| Box::pin(handle_delete_pjs_id_mrs_mr_iid(client, args)),
    );
}

async fn handle_delete_pjs_id_mrs_mr_iid(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.delete(&path).await)
}

fn register_put_pjs_id_mrs_mr_iid_merge(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Put,
            "/projects/{id}/merge_requests/{merge_request_iid}/merge",
        ),
        "Merge a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .string("merge_commit_message", "Custom merge commit message")
            .string("squash_commit_message", "Custom squash commit message")
            .string("sha", "Merge only when the source branch head matches this SHA")
            .boolean("squash", "Squash commits before merging")
            .boolean("should_remove_source_branch", "Delete the source branch after merging")
            .boolean("merge_when_pipeline_succeeds", "Merge once the pipeline succeeds"),
        |client, args| Box::pin(handle_put_pjs_id_mrs_mr_iid_merge(client, args)),
    );
}

#[derive(Serialize)]
struct MergeBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    merge_commit_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    squash_commit_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    squash: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    should_remove_source_branch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    merge_when_pipeline_succeeds: Option<bool>,
}

async fn handle_put_pjs_id_mrs_mr_iid_merge(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let body = MergeBody {
        merge_commit_message: args::opt_string(&args, "merge_commit_message")?,
        squash_commit_message: args::opt_string(&args, "squash_commit_message")?,
        sha: args::opt_string(&args, "sha")?,
        squash: args::opt_bool(&args, "squash")?,
        should_remove_source_branch: args::opt_bool(&args, "should_remove_source_branch")?,
        merge_when_pipeline_succeeds: args::opt_bool(&args, "merge_when_pipeline_succeeds")?,
    };
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/merge",
        GitlabClient::encode_path(&id)
    );
    to_result(client.put(&path, &body).await)
}

fn register_post_pjs_id_mrs_mr_iid_cancel_merge_when_pipeline_succeeds(
    registry: &mut ToolRegistry,
) {
    registry.register(
        Endpoint::new(
            Method::Post,
            "/projects/{id}/merge_requests/{merge_request_iid}/cancel_merge_when_pipeline_succeeds",
        ),
        "Cancel a pending merge-when-pipeline-succeeds",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request"),
        |client, args| {
            Box::pin(handle_post_pjs_id_mrs_mr_iid_cancel_merge_when_pipeline_succeeds(
                client, args,
            ))
        },
    );
}

async fn handle_post_pjs_id_mrs_mr_iid_cancel_merge_when_pipeline_succeeds(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/cancel_merge_when_pipeline_succeeds",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post_empty(&path).await)
}

fn register_put_pjs_id_mrs_mr_iid_rebase(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Put,
            "/projects/{id}/merge_requests/{merge_request_iid}/rebase",
        ),
        "Rebase the source branch of a merge request onto its target",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .boolean_default("skip_ci", "Do not start a new pipeline for the rebase", false),
        |client, args| Box::pin(handle_put_pjs_id_mrs_mr_iid_rebase(client, args)),
    );
}

#[derive(Serialize)]
struct RebaseBody {
    skip_ci: bool,
}

async fn handle_put_pjs_id_mrs_mr_iid_rebase(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let body = RebaseBody {
        skip_ci: args::bool_or(&args, "skip_ci", false)?,
    };
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/rebase",
        GitlabClient::encode_path(&id)
    );
    to_result(client.put(&path, &body).await)
}

fn register_get_pjs_id_mrs_mr_iid_diffs(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/merge_requests/{merge_request_iid}/diffs",
        ),
        "List the diffs of a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .boolean("unidiff", "Return diffs in unified format")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_mrs_mr_iid_diffs(client, args)),
    );
}

#[derive(Serialize)]
struct DiffsQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    unidiff: Option<bool>,
}

async fn handle_get_pjs_id_mrs_mr_iid_diffs(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let query = DiffsQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        unidiff: args::opt_bool(&args, "unidiff")?,
    };
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/diffs",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_mrs_mr_iid_commits(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/merge_requests/{merge_request_iid}/commits",
        ),
        "List the commits of a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_mrs_mr_iid_commits(client, args)),
    );
}

async fn handle_get_pjs_id_mrs_mr_iid_commits(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let query = page_query(&args)?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/commits",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_mrs_mr_iid_participants(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/merge_requests/{merge_request_iid}/participants",
        ),
        "List users participating in a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request"),
        |client, args| Box::pin(handle_get_pjs_id_mrs_mr_iid_participants(client, args)),
    );
}

async fn handle_get_pjs_id_mrs_mr_iid_participants(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/participants",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get(&path).await)
}

fn register_get_pjs_id_mrs_mr_iid_pipelines(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/merge_requests/{merge_request_iid}/pipelines",
        ),
        "List the pipelines of a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request"),
        |client, args| Box::pin(handle_get_pjs_id_mrs_mr_iid_pipelines(client, args)),
    );
}

async fn handle_get_pjs_id_mrs_mr_iid_pipelines(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/pipelines",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get(&path).await)
}

fn register_get_pjs_id_mrs_mr_iid_closes_issues(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/merge_requests/{merge_request_iid}/closes_issues",
        ),
        "List issues that the merge request will close when merged",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_mrs_mr_iid_closes_issues(client, args)),
    );
}

async fn handle_get_pjs_id_mrs_mr_iid_closes_issues(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let query = page_query(&args)?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/closes_issues",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_post_pjs_id_mrs_mr_iid_subscribe(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Post,
            "/projects/{id}/merge_requests/{merge_request_iid}/subscribe",
        ),
        "Subscribe the authenticated user to a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request"),
        |client, args| Box::pin(handle_post_pjs_id_mrs_mr_iid_subscribe(client, args)),
    );
}

async fn handle_post_pjs_id_mrs_mr_iid_subscribe(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/subscribe",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post_empty(&path).await)
}

fn register_post_pjs_id_mrs_mr_iid_unsubscribe(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Post,
            "/projects/{id}/merge_requests/{merge_request_iid}/unsubscribe",
        ),
        "Unsubscribe the authenticated user from a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request"),
        |client, args| Box::pin(handle_post_pjs_id_mrs_mr_iid_unsubscribe(client, args)),
    );
}

async fn handle_post_pjs_id_mrs_mr_iid_unsubscribe(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/unsubscribe",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post_empty(&path).await)
}

fn register_post_pjs_id_mrs_mr_iid_todo(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Post,
            "/projects/{id}/merge_requests/{merge_request_iid}/todo",
        ),
        "Create a to-do item for the authenticated user on a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request"),
        |client, args| Box::pin(handle_post_pjs_id_mrs_mr_iid_todo(client, args)),
    );
}

async fn handle_post_pjs_id_mrs_mr_iid_todo(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/todo",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post_empty(&path).await)
}
