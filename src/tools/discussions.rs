//! Discussion threads on issues and merge requests, including resolving
//! threads and managing the notes inside them.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::{page_query, to_result};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_pjs_id_issues_issue_iid_discussions(registry);
    register_get_pjs_id_mrs_mr_iid_discussions(registry);
    register_get_pjs_id_mrs_mr_iid_discussions_discussion_id(registry);
    register_post_pjs_id_mrs_mr_iid_discussions(registry);
    register_put_pjs_id_mrs_mr_iid_discussions_discussion_id(registry);
    register_post_pjs_id_mrs_mr_iid_discussions_discussion_id_notes(registry);
    register_put_pjs_id_mrs_mr_iid_discussions_discussion_id_notes_note_id(registry);
    register_delete_pjs_id_mrs_mr_iid_discussions_discussion_id_notes_note_id(registry);
}

fn register_get_pjs_id_issues_issue_iid_discussions(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/issues/{issue_iid}/discussions",
        ),
        "List discussion threads of an issue",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_issues_issue_iid_discussions(client, args)),
    );
}

async fn handle_get_pjs_id_issues_issue_iid_discussions(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let query = page_query(&args)?;
    let path = format!(
        "/projects/{}/issues/{issue_iid}/discussions",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_mrs_mr_iid_discussions(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/merge_requests/{merge_request_iid}/discussions",
        ),
        "List discussion threads of a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_mrs_mr_iid_discussions(client, args)),
    );
}

async fn handle_get_pjs_id_mrs_mr_iid_discussions(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let query = page_query(&args)?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/discussions",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_mrs_mr_iid_discussions_discussion_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/merge_requests/{merge_request_iid}/discussions/{discussion_id}",
        ),
        "Get a single discussion thread of a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .string_required("discussion_id", "ID of the discussion thread"),
        |client, args| {
            Box::pin(handle_get_pjs_id_mrs_mr_iid_discussions_discussion_id(client, args))
        },
    );
}

async fn handle_get_pjs_id_mrs_mr_iid_discussions_discussion_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let discussion_id = args::require_str(&args, "discussion_id")?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/discussions/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&discussion_id)
    );
    to_result(client.get(&path).await)
}

fn register_post_pjs_id_mrs_mr_iid_discussions(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Post,
            "/projects/{id}/merge_requests/{merge_request_iid}/discussions",
        ),
        "Start a new discussion thread on a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .string_required("body", "Content of the first note")
            .string("commit_id", "SHA of a commit to start the thread on"),
        |client, args| Box::pin(handle_post_pjs_id_mrs_mr_iid_discussions(client, args)),
    );
}

#[derive(Serialize)]
struct CreateDiscussionBody {
    body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    commit_id: Option<String>,
}

async fn handle_post_pjs_id_mrs_mr_iid_discussions(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let body = CreateDiscussionBody {
        body: args::require_str(&args, "body")?,
        commit_id: args::opt_string(&args, "commit_id")?,
    };
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/discussions",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post(&path, &body).await)
}

fn register_put_pjs_id_mrs_mr_iid_discussions_discussion_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Put,
            "/projects/{id}/merge_requests/{merge_request_iid}/discussions/{discussion_id}",
        ),
        "Resolve or unresolve a discussion thread of a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .string_required("discussion_id", "ID of the discussion thread")
            .boolean_required("resolved", "Resolve (true) or unresolve (false) the thread"),
        |client, args| {
            Box::pin(handle_put_pjs_id_mrs_mr_iid_discussions_discussion_id(client, args))
        },
    );
}

#[derive(Serialize)]
struct ResolveDiscussionBody {
    resolved: bool,
}

async fn handle_put_pjs_id_mrs_mr_iid_discussions_discussion_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let discussion_id = args::require_str(&args, "discussion_id")?;
    let body = ResolveDiscussionBody {
        resolved: args::require_bool(&args, "resolved")?,
    };
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/discussions/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&discussion_id)
    );
    to_result(client.put(&path, &body).await)
}

fn register_post_pjs_id_mrs_mr_iid_discussions_discussion_id_notes(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Post,
            "/projects/{id}/merge_requests/{merge_request_iid}/discussions/{discussion_id}/notes",
        ),
        "Add a note to an existing discussion thread of a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .string_required("discussion_id", "ID of the discussion thread")
            .string_required("body", "Content of the note"),
        |client, args| {
            Box::pin(handle_post_pjs_id_mrs_mr_iid_discussions_discussion_id_notes(client, args))
        },
    );
}

#[derive(Serialize)]
struct AddDiscussionNoteBody {
    body: String,
}

async fn handle_post_pjs_id_mrs_mr_iid_discussions_discussion_id_notes(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let discussion_id = args::require_str(&args, "discussion_id")?;
    let body = AddDiscussionNoteBody {
        body: args::require_str(&args, "body")?,
    };
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/discussions/{}/notes",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&discussion_id)
    );
    to_result(client.post(&path, &body).await)
}

fn register_put_pjs_id_mrs_mr_iid_discussions_discussion_id_notes_note_id(
    registry: &mut ToolRegistry,
) {
    registry.register(
        Endpoint::new(
            Method::Put,
            "/projects/{id}/merge_requests/{merge_request_iid}/discussions/{discussion_id}/notes/{note_id}",
        ),
        "Modify or resolve a note of a discussion thread",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .string_required("discussion_id", "ID of the discussion thread")
            .integer_required("note_id", "ID of the note")
            .string("body", "New content of the note")
            .boolean("resolved", "Resolve (true) or unresolve (false) the note"),
        |client, args| {
            Box::pin(handle_put_pjs_id_mrs_mr_iid_discussions_discussion_id_notes_note_id(
                client, args,
            ))
        },
    );
}

#[derive(Serialize)]
struct UpdateDiscussionNoteBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<bool>,
}

async fn handle_put_pjs_id_mrs_mr_iid_discussions_discussion_id_notes_note_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let discussion_id = args::require_str(&args, "discussion_id")?;
    let note_id = args::require_u64(&args, "note_id")?;
    let body = UpdateDiscussionNoteBody {
        body: args::opt_string(&args, "body")?,
        resolved: args::opt_bool(&args, "resolved")?,
    };
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/discussions/{}/notes/{note_id}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&discussion_id)
    );
    to_result(client.put(&path, &body).await)
}

fn register_delete_pjs_id_mrs_mr_iid_discussions_discussion_id_notes_note_id(
    registry: &mut ToolRegistry,
) {
    registry.register(
        Endpoint::new(
            Method::Delete,
            "/projects/{id}/merge_requests/{merge_request_iid}/discussions/{discussion_id}/notes/{note_id}",
        ),
        "Delete a note of a discussion thread",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .string_required("discussion_id", "ID of the discussion thread")
            .integer_required("note_id", "ID of the note"),
        |client, args| {
            Box::pin(handle_delete_pjs_id_mrs_mr_iid_discussions_discussion_id_notes_note_id(
                client, args,
            ))
        },
    );
}

async fn handle_delete_pjs_id_mrs_mr_iid_discussions_discussion_id_notes_note_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let discussion_id = args::require_str(&args, "discussion_id")?;
    let note_id = args::require_u64(&args, "note_id")?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/discussions/{}/notes/{note_id}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&discussion_id)
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
    fn test_module_registers_eight_tools() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        assert_eq!(registry.len(), 8);
    }

    #[tokio::test]
    async fn test_resolve_discussion_requires_resolved_flag() {
        let args = args(json!({"id": 7, "merge_request_iid": 12, "discussion_id": "abc"}));
        let err = handle_put_pjs_id_mrs_mr_iid_discussions_discussion_id(
            client_for("http://localhost:1"),
            args,
        )
        .await
        .unwrap_err();
        assert!(err.message.contains("resolved"));
    }

    #[tokio::test]
    async fn test_resolve_discussion_sends_resolved_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/v4/projects/7/merge_requests/12/discussions/6f1c2a")
                .json_body(json!({"resolved": true}));
            then.status(200).json_body(json!({"id": "6f1c2a"}));
        });

        handle_put_pjs_id_mrs_mr_iid_discussions_discussion_id(
            client_for(&server.base_url()),
            args(json!({
                "id": 7,
                "merge_request_iid": 12,
                "discussion_id": "6f1c2a",
                "resolved": true,
            })),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_delete_discussion_note_hits_nested_path() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(DELETE)
                .path("/api/v4/projects/7/merge_requests/12/discussions/6f1c2a/notes/99");
            then.status(204);
        });

        let result = handle_delete_pjs_id_mrs_mr_iid_discussions_discussion_id_notes_note_id(
            client_for(&server.base_url()),
            args(json!({
                "id": 7,
                "merge_request_iid": 12,
                "discussion_id": "6f1c2a",
                "note_id": 99,
            })),
        )
        .await
        .unwrap();

        assert_ne!(result.is_error, Some(true));
        mock.assert();
    }

    #[tokio::test]
    async fn test_create_discussion_posts_body_and_commit() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/projects/7/merge_requests/12/discussions")
                .json_body(json!({"body": "Looks wrong", "commit_id": "deadbeef"}));
            then.status(201).json_body(json!({"id": "6f1c2a"}));
        });

        handle_post_pjs_id_mrs_mr_iid_discussions(
            client_for(&server.base_url()),
            args(json!({
                "id": 7,
                "merge_request_iid": 12,
                "body": "Looks wrong",
                "commit_id": "deadbeef",
            })),
        )
        .await
        .unwrap();

        mock.assert();
    }
}
