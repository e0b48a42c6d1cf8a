//! Notes (comments) on issues and merge requests.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE, to_result};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_pjs_id_issues_issue_iid_notes(registry);
    register_post_pjs_id_issues_issue_iid_notes(registry);
    register_get_pjs_id_issues_issue_iid_notes_note_id(registry);
    register_put_pjs_id_issues_issue_iid_notes_note_id(registry);
    register_delete_pjs_id_issues_issue_iid_notes_note_id(registry);
    register_get_pjs_id_mrs_mr_iid_notes(registry);
    register_post_pjs_id_mrs_mr_iid_notes(registry);
    register_get_pjs_id_mrs_mr_iid_notes_note_id(registry);
    register_put_pjs_id_mrs_mr_iid_notes_note_id(registry);
    register_delete_pjs_id_mrs_mr_iid_notes_note_id(registry);
}

#[derive(Serialize)]
struct ListNotesQuery {
    page: u64,
    per_page: u64,
    sort: String,
    order_by: String,
}

fn list_notes_query(args: &JsonObject) -> Result<ListNotesQuery, McpError> {
    Ok(ListNotesQuery {
        page: args::u64_or(args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        sort: args::string_or(args, "sort", "desc")?,
        order_by: args::string_or(args, "order_by", "created_at")?,
    })
}

fn list_notes_schema(schema: Schema) -> Schema {
    schema
        .string_enum_default("sort", "Sort order", &["asc", "desc"], "desc")
        .string_enum_default(
            "order_by",
            "Field to order the results by",
            &["created_at", "updated_at"],
            "created_at",
        )
        .integer_default("page", "Page number", 1)
        .integer_default("per_page", "Results per page (max 100)", 20)
}

#[derive(Serialize)]
struct CreateNoteBody {
    body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    internal: Option<bool>,
}

#[derive(Serialize)]
struct UpdateNoteBody {
    body: String,
}

fn register_get_pjs_id_issues_issue_iid_notes(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/issues/{issue_iid}/notes"),
        "List notes of an issue",
        list_notes_schema(
            Schema::new()
                .string_required("id", "Project ID or URL-encoded path")
                .integer_required("issue_iid", "Internal ID of the issue"),
        ),
        |client, args| Box::pin(handle_get_pjs_id_issues_issue_iid_notes(client, args)),
    );
}

async fn handle_get_pjs_id_issues_issue_iid_notes(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let query = list_notes_query(&args)?;
    let path = format!(
        "/projects/{}/issues/{issue_iid}/notes",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_post_pjs_id_issues_issue_iid_notes(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/issues/{issue_iid}/notes"),
        "Create a note on an issue",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue")
            .string_required("body", "Content of the note")
            .boolean("internal", "Make the note internal"),
        |client, args| Box::pin(handle_post_pjs_id_issues_issue_iid_notes(client, args)),
    );
}

async fn handle_post_pjs_id_issues_issue_iid_notes(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let body = CreateNoteBody {
        body: args::require_str(&args, "body")?,
        internal: args::opt_bool(&args, "internal")?,
    };
    let path = format!(
        "/projects/{}/issues/{issue_iid}/notes",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post(&path, &body).await)
}

fn register_get_pjs_id_issues_issue_iid_notes_note_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/issues/{issue_iid}/notes/{note_id}",
        ),
        "Get a single note of an issue",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue")
            .integer_required("note_id", "ID of the note"),
        |client, args| {
            Box::pin(handle_get_pjs_id_issues_issue_iid_notes_note_id(client, args))
        },
    );
}

async fn handle_get_pjs_id_issues_issue_iid_notes_note_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let note_id = args::require_u64(&args, "note_id")?;
    let path = format!(
        "/projects/{}/issues/{issue_iid}/notes/{note_id}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get(&path).await)
}

fn register_put_pjs_id_issues_issue_iid_notes_note_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Put,
            "/projects/{id}/issues/{issue_iid}/notes/{note_id}",
        ),
        "Update a note on an issue",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue")
            .integer_required("note_id", "ID of the note")
            .string_required("body", "New content of the note"),
        |client, args| {
            Box::pin(handle_put_pjs_id_issues_issue_iid_notes_note_id(client, args))
        },
    );
}

async fn handle_put_pjs_id_issues_issue_iid_notes_note_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let note_id = args::require_u64(&args, "note_id")?;
    let body = UpdateNoteBody {
        body: args::require_str(&args, "body")?,
    };
    let path = format!(
        "/projects/{}/issues/{issue_iid}/notes/{note_id}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.put(&path, &body).await)
}

fn register_delete_pjs_id_issues_issue_iid_notes_note_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Delete,
            "/projects/{id}/issues/{issue_iid}/notes/{note_id}",
        ),
        "Delete a note from an issue",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue")
            .integer_required("note_id", "ID of the note"),
        |client, args| {
            Box::pin(handle_delete_pjs_id_issues_issue_iid_notes_note_id(
                client, args,
            ))
        },
    );
}

async fn handle_delete_pjs_id_issues_issue_iid_notes_note_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let note_id = args::require_u64(&args, "note_id")?;
    let path = format!(
        "/projects/{}/issues/{issue_iid}/notes/{note_id}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.delete(&path).await)
}

fn register_get_pjs_id_mrs_mr_iid_notes(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/merge_requests/{merge_request_iid}/notes",
        ),
        "List notes of a merge request",
        list_notes_schema(
            Schema::new()
                .string_required("id", "Project ID or URL-encoded path")
                .integer_required("merge_request_iid", "Internal ID of the merge request"),
        ),
        |client, args| Box::pin(handle_get_pjs_id_mrs_mr_iid_notes(client, args)),
    );
}

async fn handle_get_pjs_id_mrs_mr_iid_notes(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let query = list_notes_query(&args)?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/notes",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_post_pjs_id_mrs_mr_iid_notes(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Post,
            "/projects/{id}/merge_requests/{merge_request_iid}/notes",
        ),
        "Create a note on a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .string_required("body", "Content of the note")
            .boolean("internal", "Make the note internal"),
        |client, args| Box::pin(handle_post_pjs_id_mrs_mr_iid_notes(client, args)),
    );
}

async fn handle_post_pjs_id_mrs_mr_iid_notes(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let body = CreateNoteBody {
        body: args::require_str(&args, "body")?,
        internal: args::opt_bool(&args, "internal")?,
    };
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/notes",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post(&path, &body).await)
}

fn register_get_pjs_id_mrs_mr_iid_notes_note_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/merge_requests/{merge_request_iid}/notes/{note_id}",
        ),
        "Get a single note of a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .integer_required("note_id", "ID of the note"),
        |client, args| Box::pin(handle_get_pjs_id_mrs_mr_iid_notes_note_id(client, args)),
    );
}

async fn handle_get_pjs_id_mrs_mr_iid_notes_note_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let note_id = args::require_u64(&args, "note_id")?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/notes/{note_id}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get(&path).await)
}

fn register_put_pjs_id_mrs_mr_iid_notes_note_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Put,
            "/projects/{id}/merge_requests/{merge_request_iid}/notes/{note_id}",
        ),
        "Update a note on a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .integer_required("note_id", "ID of the note")
            .string_required("body", "New content of the note"),
        |client, args| Box::pin(handle_put_pjs_id_mrs_mr_iid_notes_note_id(client, args)),
    );
}

async fn handle_put_pjs_id_mrs_mr_iid_notes_note_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let note_id = args::require_u64(&args, "note_id")?;
    let body = UpdateNoteBody {
        body: args::require_str(&args, "body")?,
    };
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/notes/{note_id}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.put(&path, &body).await)
}

fn register_delete_pjs_id_mrs_mr_iid_notes_note_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Delete,
            "/projects/{id}/merge_requests/{merge_request_iid}/notes/{note_id}",
        ),
        "Delete a note from a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .integer_required("note_id", "ID of the note"),
        |client, args| {
            Box::pin(handle_delete_pjs_id_mrs_mr_iid_notes_note_id(client, args))
        },
    );
}

async fn handle_delete_pjs_id_mrs_mr_iid_notes_note_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let note_id = args::require_u64(&args, "note_id")?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/notes/{note_id}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.delete(&path).await)
}
