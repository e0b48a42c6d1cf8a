//! Draft notes on merge requests: pending review comments that are only
//! visible to their author until published.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::to_result;
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_pjs_id_mrs_mr_iid_draft_notes(registry);
    register_get_pjs_id_mrs_mr_iid_draft_notes_draft_note_id(registry);
    register_post_pjs_id_mrs_mr_iid_draft_notes(registry);
    register_put_pjs_id_mrs_mr_iid_draft_notes_draft_note_id(registry);
    register_delete_pjs_id_mrs_mr_iid_draft_notes_draft_note_id(registry);
    register_put_pjs_id_mrs_mr_iid_draft_notes_draft_note_id_publish(registry);
    register_post_pjs_id_mrs_mr_iid_draft_notes_bulk_publish(registry);
}

fn register_get_pjs_id_mrs_mr_iid_draft_notes(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/merge_requests/{merge_request_iid}/draft_notes",
        ),
        "List the draft notes of a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request"),
        |client, args| Box::pin(handle_get_pjs_id_mrs_mr_iid_draft_notes(client, args)),
    );
}

async fn handle_get_pjs_id_mrs_mr_iid_draft_notes(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/draft_notes",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get(&path).await)
}

fn register_get_pjs_id_mrs_mr_iid_draft_notes_draft_note_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/merge_requests/{merge_request_iid}/draft_notes/{draft_note_id}",
        ),
        "Get a single draft note of a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .integer_required("draft_note_id", "ID of the draft note"),
        |client, args| {
            Box::pin(handle_get_pjs_id_mrs_mr_iid_draft_notes_draft_note_id(client, args))
        },
    );
}

async fn handle_get_pjs_id_mrs_mr_iid_draft_notes_draft_note_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let draft_note_id = args::require_u64(&args, "draft_note_id")?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/draft_notes/{draft_note_id}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get(&path).await)
}

fn register_post_pjs_id_mrs_mr_iid_draft_notes(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Post,
            "/projects/{id}/merge_requests/{merge_request_iid}/draft_notes",
        ),
        "Create a draft note on a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .string_required("note", "Content of the draft note")
            .string("commit_id", "SHA of a commit to attach the draft note to")
            .string(
                "in_reply_to_discussion_id",
                "ID of a discussion the draft note replies to",
            )
            .boolean(
                "resolve_discussion",
                "Resolve the replied-to discussion when the note is published",
            ),
        |client, args| Box::pin(handle_post_pjs_id_mrs_mr_iid_draft_notes(client, args)),
    );
}

#[derive(Serialize)]
struct CreateDraftNoteBody {
    note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    commit_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_reply_to_discussion_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolve_discussion: Option<bool>,
}

async fn handle_post_pjs_id_mrs_mr_iid_draft_notes(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let body = CreateDraftNoteBody {
        note: args::require_str(&args, "note")?,
        commit_id: args::opt_string(&args, "commit_id")?,
        in_reply_to_discussion_id: args::opt_string(&args, "in_reply_to_discussion_id")?,
        resolve_discussion: args::opt_bool(&args, "resolve_discussion")?,
    };
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/draft_notes",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post(&path, &body).await)
}

fn register_put_pjs_id_mrs_mr_iid_draft_notes_draft_note_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Put,
            "/projects/{id}/merge_requests/{merge_request_iid}/draft_notes/{draft_note_id}",
        ),
        "Update the content of a draft note",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .integer_required("draft_note_id", "ID of the draft note")
            .string_required("note", "New content of the draft note"),
        |client, args| {
            Box::pin(handle_put_pjs_id_mrs_mr_iid_draft_notes_draft_note_id(client, args))
        },
    );
}

#[derive(Serialize)]
struct UpdateDraftNoteBody {
    note: String,
}

async fn handle_put_pjs_id_mrs_mr_iid_draft_notes_draft_note_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let draft_note_id = args::require_u64(&args, "draft_note_id")?;
    let body = UpdateDraftNoteBody {
        note: args::require_str(&args, "note")?,
    };
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/draft_notes/{draft_note_id}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.put(&path, &body).await)
}

fn register_delete_pjs_id_mrs_mr_iid_draft_notes_draft_note_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Delete,
            "/projects/{id}/merge_requests/{merge_request_iid}/draft_notes/{draft_note_id}",
        ),
        "Delete a draft note",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .integer_required("draft_note_id", "ID of the draft note"),
        |client, args| {
            Box::pin(handle_delete_pjs_id_mrs_mr_iid_draft_notes_draft_note_id(client, args))
        },
    );
}

async fn handle_delete_pjs_id_mrs_mr_iid_draft_notes_draft_note_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let draft_note_id = args::require_u64(&args, "draft_note_id")?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/draft_notes/{draft_note_id}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.delete(&path).await)
}

fn register_put_pjs_id_mrs_mr_iid_draft_notes_draft_note_id_publish(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Put,
            "/projects/{id}/merge_requests/{merge_request_iid}/draft_notes/{draft_note_id}/publish",
        ),
        "Publish a single draft note",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request")
            .integer_required("draft_note_id", "ID of the draft note"),
        |client, args| {
            Box::pin(handle_put_pjs_id_mrs_mr_iid_draft_notes_draft_note_id_publish(client, args))
        },
    );
}

async fn handle_put_pjs_id_mrs_mr_iid_draft_notes_draft_note_id_publish(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let draft_note_id = args::require_u64(&args, "draft_note_id")?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/draft_notes/{draft_note_id}/publish",
        GitlabClient::encode_path(&id)
    );
    to_result(client.put_empty(&path).await)
}

fn register_post_pjs_id_mrs_mr_iid_draft_notes_bulk_publish(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Post,
            "/projects/{id}/merge_requests/{merge_request_iid}/draft_notes/bulk_publish",
        ),
        "Publish all draft notes of the authenticated user on a merge request",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("merge_request_iid", "Internal ID of the merge request"),
        |client, args| {
            Box::pin(handle_post_pjs_id_mrs_mr_iid_draft_notes_bulk_publish(client, args))
        },
    );
}

async fn handle_post_pjs_id_mrs_mr_iid_draft_notes_bulk_publish(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let merge_request_iid = args::require_u64(&args, "merge_request_iid")?;
    let path = format!(
        "/projects/{}/merge_requests/{merge_request_iid}/draft_notes/bulk_publish",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post_empty(&path).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{args, client_for};
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_module_registers_seven_tools() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        assert_eq!(registry.len(), 7);
    }

    #[tokio::test]
    async fn test_create_draft_note_carries_reply_target() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/projects/7/merge_requests/12/draft_notes")
                .json_body(json!({
                    "note": "Needs a test",
                    "in_reply_to_discussion_id": "6f1c2a",
                    "resolve_discussion": true,
                }));
            then.status(201).json_body(json!({"id": 3}));
        });

        handle_post_pjs_id_mrs_mr_iid_draft_notes(
            client_for(&server.base_url()),
            args(json!({
                "id": 7,
                "merge_request_iid": 12,
                "note": "Needs a test",
                "in_reply_to_discussion_id": "6f1c2a",
                "resolve_discussion": true,
            })),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_publish_sends_empty_put() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/v4/projects/7/merge_requests/12/draft_notes/3/publish");
            then.status(204);
        });

        handle_put_pjs_id_mrs_mr_iid_draft_notes_draft_note_id_publish(
            client_for(&server.base_url()),
            args(json!({"id": 7, "merge_request_iid": 12, "draft_note_id": 3})),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_bulk_publish_posts_to_collection_path() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/projects/7/merge_requests/12/draft_notes/bulk_publish");
            then.status(204);
        });

        handle_post_pjs_id_mrs_mr_iid_draft_notes_bulk_publish(
            client_for(&server.base_url()),
            args(json!({"id": 7, "merge_request_iid": 12})),
        )
        .await
        .unwrap();

        mock.assert();
    }
}
