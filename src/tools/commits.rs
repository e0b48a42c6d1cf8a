//! Commit endpoints: listing, diffs, comments, refs, cherry-pick and
//! revert, plus commit statuses.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE, page_query, to_result};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_pjs_id_repository_commits(registry);
    register_get_pjs_id_repository_commits_sha(registry);
    register_get_pjs_id_repository_commits_sha_diff(registry);
    register_get_pjs_id_repository_commits_sha_comments(registry);
    register_post_pjs_id_repository_commits_sha_comments(registry);
    register_get_pjs_id_repository_commits_sha_refs(registry);
    register_post_pjs_id_repository_commits_sha_cherry_pick(registry);
    register_post_pjs_id_repository_commits_sha_revert(registry);
    register_get_pjs_id_repository_commits_sha_statuses(registry);
    register_post_pjs_id_statuses_sha(registry);
}

fn register_get_pjs_id_repository_commits(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/repository/commits"),
        "List the commits of a project repository",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string("ref_name", "Branch, tag or commit range to list commits from")
            .string("since", "Only commits after or on this date (ISO 8601)")
            .string("until", "Only commits before or on this date (ISO 8601)")
            .string("path", "Only commits touching this file path")
            .string("author", "Only commits by this author")
            .boolean("all", "Retrieve commits from every branch")
            .boolean("with_stats", "Include stats about each commit")
            .boolean("first_parent", "Follow only the first parent on merge commits")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_repository_commits(client, args)),
    );
}

#[derive(Serialize)]
struct ListCommitsQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    ref_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    until: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    all: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    with_stats: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_parent: Option<bool>,
}

async fn handle_get_pjs_id_repository_commits(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = ListCommitsQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        ref_name: args::opt_string(&args, "ref_name")?,
        since: args::opt_string(&args, "since")?,
        until: args::opt_string(&args, "until")?,
        path: args::opt_string(&args, "path")?,
        author: args::opt_string(&args, "author")?,
        all: args::opt_bool(&args, "all")?,
        with_stats: args::opt_bool(&args, "with_stats")?,
        first_parent: args::opt_bool(&args, "first_parent")?,
    };
    let path = format!(
        "/projects/{}/repository/commits",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_repository_commits_sha(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/repository/commits/{sha}"),
        "Get a single commit",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("sha", "Commit SHA or branch or tag name")
            .boolean_default("stats", "Include the commit stats", true),
        |client, args| Box::pin(handle_get_pjs_id_repository_commits_sha(client, args)),
    );
}

#[derive(Serialize)]
struct GetCommitQuery {
    stats: bool,
}

async fn handle_get_pjs_id_repository_commits_sha(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let sha = args::require_str(&args, "sha")?;
    let query = GetCommitQuery {
        stats: args::bool_or(&args, "stats", true)?,
    };
    let path = format!(
        "/projects/{}/repository/commits/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&sha)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_repository_commits_sha_diff(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/repository/commits/{sha}/diff",
        ),
        "Get the diff of a commit",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("sha", "Commit SHA or branch or tag name")
            .boolean("unidiff", "Return diffs in unified format")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_repository_commits_sha_diff(client, args)),
    );
}

#[derive(Serialize)]
struct CommitDiffQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    unidiff: Option<bool>,
}

async fn handle_get_pjs_id_repository_commits_sha_diff(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let sha = args::require_str(&args, "sha")?;
    let query = CommitDiffQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        unidiff: args::opt_bool(&args, "unidiff")?,
    };
    let path = format!(
        "/projects/{}/repository/commits/{}/diff",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&sha)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_repository_commits_sha_comments(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/repository/commits/{sha}/comments",
        ),
        "List the comments of a commit",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("sha", "Commit SHA or branch or tag name")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| {
            Box::pin(handle_get_pjs_id_repository_commits_sha_comments(client, args))
        },
    );
}

async fn handle_get_pjs_id_repository_commits_sha_comments(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let sha = args::require_str(&args, "sha")?;
    let query = page_query(&args)?;
    let path = format!(
        "/projects/{}/repository/commits/{}/comments",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&sha)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_post_pjs_id_repository_commits_sha_comments(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Post,
            "/projects/{id}/repository/commits/{sha}/comments",
        ),
        "Add a comment to a commit, optionally on a specific line",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("sha", "Commit SHA or branch or tag name")
            .string_required("note", "Content of the comment")
            .string("path", "File path to attach the comment to")
            .integer("line", "Line number to attach the comment to")
            .string_enum(
                "line_type",
                "Side of the diff the line belongs to",
                &["new", "old"],
            ),
        |client, args| {
            Box::pin(handle_post_pjs_id_repository_commits_sha_comments(client, args))
        },
    );
}

#[derive(Serialize)]
struct CommitCommentBody {
    note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line_type: Option<String>,
}

async fn handle_post_pjs_id_repository_commits_sha_comments(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let sha = args::require_str(&args, "sha")?;
    let body = CommitCommentBody {
        note: args::require_str(&args, "note")?,
        path: args::opt_string(&args, "path")?,
        line: args::opt_u64(&args, "line")?,
        line_type: args::opt_string(&args, "line_type")?,
    };
    let path = format!(
        "/projects/{}/repository/commits/{}/comments",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&sha)
    );
    to_result(client.post(&path, &body).await)
}

fn register_get_pjs_id_repository_commits_sha_refs(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/repository/commits/{sha}/refs",
        ),
        "List the branches and tags a commit is pushed to",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("sha", "Commit SHA")
            .string_enum_default(
                "type",
                "Scope of refs to return",
                &["branch", "tag", "all"],
                "all",
            ),
        |client, args| Box::pin(handle_get_pjs_id_repository_commits_sha_refs(client, args)),
    );
}

#[derive(Serialize)]
struct CommitRefsQuery {
    r#type: String,
}

async fn handle_get_pjs_id_repository_commits_sha_refs(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let sha = args::require_str(&args, "sha")?;
    let query = CommitRefsQuery {
        r#type: args::string_or(&args, "type", "all")?,
    };
    let path = format!(
        "/projects/{}/repository/commits/{}/refs",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&sha)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_post_pjs_id_repository_commits_sha_cherry_pick(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Post,
            "/projects/{id}/repository/commits/{sha}/cherry_pick",
        ),
        "Cherry-pick a commit onto a branch",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("sha", "SHA of the commit to cherry-pick")
            .string_required("branch", "Name of the branch to cherry-pick onto")
            .boolean_default("dry_run", "Only check whether the commit applies cleanly", false)
            .string("message", "Custom commit message"),
        |client, args| {
            Box::pin(handle_post_pjs_id_repository_commits_sha_cherry_pick(client, args))
        },
    );
}

#[derive(Serialize)]
struct CherryPickBody {
    branch: String,
    dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

async fn handle_post_pjs_id_repository_commits_sha_cherry_pick(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let sha = args::require_str(&args, "sha")?;
    let body = CherryPickBody {
        branch: args::require_str(&args, "branch")?,
        dry_run: args::bool_or(&args, "dry_run", false)?,
        message: args::opt_string(&args, "message")?,
    };
    let path = format!(
        "/projects/{}/repository/commits/{}/cherry_pick",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&sha)
    );
    to_result(client.post(&path, &body).await)
}

fn register_post_pjs_id_repository_commits_sha_revert(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Post,
            "/projects/{id}/repository/commits/{sha}/revert",
        ),
        "Revert a commit on a branch",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("sha", "SHA of the commit to revert")
            .string_required("branch", "Name of the branch to revert on")
            .boolean_default("dry_run", "Only check whether the commit reverts cleanly", false),
        |client, args| Box::pin(handle_post_pjs_id_repository_commits_sha_revert(client, args)),
    );
}

#[derive(Serialize)]
struct RevertBody {
    branch: String,
    dry_run: bool,
}

async fn handle_post_pjs_id_repository_commits_sha_revert(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let sha = args::require_str(&args, "sha")?;
    let body = RevertBody {
        branch: args::require_str(&args, "branch")?,
        dry_run: args::bool_or(&args, "dry_run", false)?,
    };
    let path = format!(
        "/projects/{}/repository/commits/{}/revert",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&sha)
    );
    to_result(client.post(&path, &body).await)
}

fn register_get_pjs_id_repository_commits_sha_statuses(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/repository/commits/{sha}/statuses",
        ),
        "List the statuses of a commit",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("sha", "Commit SHA")
            .string("ref", "Branch or tag the statuses belong to")
            .string("stage", "Filter by build stage")
            .string("name", "Filter by job name")
            .boolean("all", "Include all statuses instead of only the latest ones")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| {
            Box::pin(handle_get_pjs_id_repository_commits_sha_statuses(client, args))
        },
    );
}

#[derive(Serialize)]
struct CommitStatusesQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    r#ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    all: Option<bool>,
}

async fn handle_get_pjs_id_repository_commits_sha_statuses(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let sha = args::require_str(&args, "sha")?;
    let query = CommitStatusesQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        r#ref: args::opt_string(&args, "ref")?,
        stage: args::opt_string(&args, "stage")?,
        name: args::opt_string(&args, "name")?,
        all: args::opt_bool(&args, "all")?,
    };
    let path = format!(
        "/projects/{}/repository/commits/{}/statuses",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&sha)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_post_pjs_id_statuses_sha(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/statuses/{sha}"),
        "Set the status of a commit",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("sha", "Commit SHA")
            .string_enum_required(
                "state",
                "State of the status",
                &["pending", "running", "success", "failed", "canceled"],
            )
            .string("ref", "Branch or tag the status applies to")
            .string("name", "Label to differentiate this status from others")
            .string("target_url", "URL to associate with the status")
            .string("description", "Short description of the status")
            .integer("pipeline_id", "ID of the pipeline to set the status on"),
        |client, args| Box::pin(handle_post_pjs_id_statuses_sha(client, args)),
    );
}

#[derive(Serialize)]
struct CommitStatusBody {
    state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    r#ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pipeline_id: Option<u64>,
}

async fn handle_post_pjs_id_statuses_sha(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let sha = args::require_str(&args, "sha")?;
    let body = CommitStatusBody {
        state: args::require_str(&args, "state")?,
        r#ref: args::opt_string(&args, "ref")?,
        name: args::opt_string(&args, "name")?,
        target_url: args::opt_string(&args, "target_url")?,
        description: args::opt_string(&args, "description")?,
        pipeline_id: args::opt_u64(&args, "pipeline_id")?,
    };
    let path = format!(
        "/projects/{}/statuses/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&sha)
    );
    to_result(client.post(&path, &body).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{args, client_for};
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_module_registers_ten_tools() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        assert_eq!(registry.len(), 10);
    }

    #[tokio::test]
    async fn test_get_commit_requests_stats_by_default() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects/7/repository/commits/deadbeef")
                .query_param("stats", "true");
            then.status(200).json_body(json!({"id": "deadbeef"}));
        });

        handle_get_pjs_id_repository_commits_sha(
            client_for(&server.base_url()),
            args(json!({"id": 7, "sha": "deadbeef"})),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_commit_comment_without_line_omits_line_type() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/projects/7/repository/commits/deadbeef/comments")
                .json_body(json!({"note": "Nice fix"}));
            then.status(201).json_body(json!({"note": "Nice fix"}));
        });

        handle_post_pjs_id_repository_commits_sha_comments(
            client_for(&server.base_url()),
            args(json!({"id": 7, "sha": "deadbeef", "note": "Nice fix"})),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_commit_refs_default_to_all() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects/7/repository/commits/deadbeef/refs")
                .query_param("type", "all");
            then.status(200).json_body(json!([]));
        });

        handle_get_pjs_id_repository_commits_sha_refs(
            client_for(&server.base_url()),
            args(json!({"id": 7, "sha": "deadbeef"})),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_cherry_pick_defaults_dry_run_off() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/projects/7/repository/commits/deadbeef/cherry_pick")
                .json_body(json!({"branch": "stable", "dry_run": false}));
            then.status(201).json_body(json!({"id": "c0ffee"}));
        });

        handle_post_pjs_id_repository_commits_sha_cherry_pick(
            client_for(&server.base_url()),
            args(json!({"id": 7, "sha": "deadbeef", "branch": "stable"})),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_set_commit_status_posts_state() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/projects/7/statuses/deadbeef")
                .json_body(json!({
                    "state": "success",
                    "name": "ci/lint",
                    "target_url": "https://ci.example.com/builds/42",
                }));
            then.status(201).json_body(json!({"status": "success"}));
        });

        handle_post_pjs_id_statuses_sha(
            client_for(&server.base_url()),
            args(json!({
                "id": 7,
                "sha": "deadbeef",
                "state": "success",
                "name": "ci/lint",
                "target_url": "https://ci.example.com/builds/42",
            })),
        )
        .await
        .unwrap();

        mock.assert();
    }
}
