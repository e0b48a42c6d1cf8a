//! Issue link endpoints, relating issues to each other across projects.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::to_result;
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_pjs_id_issues_issue_iid_links(registry);
    register_post_pjs_id_issues_issue_iid_links(registry);
    register_get_pjs_id_issues_issue_iid_links_issue_link_id(registry);
    register_delete_pjs_id_issues_issue_iid_links_issue_link_id(registry);
}

fn register_get_pjs_id_issues_issue_iid_links(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/issues/{issue_iid}/links"),
        "List issues related to a given issue",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue"),
        |client, args| Box::pin(handle_get_pjs_id_issues_issue_iid_links(client, args)),
    );
}

async fn handle_get_pjs_id_issues_issue_iid_links(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let path = format!(
        "/projects/{}/issues/{issue_iid}/links",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get(&path).await)
}

fn register_post_pjs_id_issues_issue_iid_links(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/issues/{issue_iid}/links"),
        "Create a relation between two issues",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue")
            .string_required(
                "target_project_id",
                "ID or URL-encoded path of the target project",
            )
            .integer_required("target_issue_iid", "Internal ID of the target issue")
            .string_enum_default(
                "link_type",
                "Type of the relation",
                &["relates_to", "blocks", "is_blocked_by"],
                "relates_to",
            ),
        |client, args| Box::pin(handle_post_pjs_id_issues_issue_iid_links(client, args)),
    );
}

#[derive(Serialize)]
struct CreateIssueLinkBody {
    target_project_id: String,
    target_issue_iid: u64,
    link_type: String,
}

async fn handle_post_pjs_id_issues_issue_iid_links(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let body = CreateIssueLinkBody {
        target_project_id: args::require_str(&args, "target_project_id")?,
        target_issue_iid: args::require_u64(&args, "target_issue_iid")?,
        link_type: args::string_or(&args, "link_type", "relates_to")?,
    };
    let path = format!(
        "/projects/{}/issues/{issue_iid}/links",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post(&path, &body).await)
}

fn register_get_pjs_id_issues_issue_iid_links_issue_link_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/issues/{issue_iid}/links/{issue_link_id}",
        ),
        "Get the details of an issue relation",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue")
            .integer_required("issue_link_id", "ID of the issue relation"),
        |client, args| {
            Box::pin(handle_get_pjs_id_issues_issue_iid_links_issue_link_id(
                client, args,
            ))
        },
    );
}

async fn handle_get_pjs_id_issues_issue_iid_links_issue_link_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let issue_link_id = args::require_u64(&args, "issue_link_id")?;
    let path = format!(
        "/projects/{}/issues/{issue_iid}/links/{issue_link_id}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get(&path).await)
}

fn register_delete_pjs_id_issues_issue_iid_links_issue_link_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Delete,
            "/projects/{id}/issues/{issue_iid}/links/{issue_link_id}",
        ),
        "Delete an issue relation",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("issue_iid", "Internal ID of the issue")
            .integer_required("issue_link_id", "ID of the issue relation"),
        |client, args| {
            Box::pin(handle_delete_pjs_id_issues_issue_iid_links_issue_link_id(
                client, args,
            ))
        },
    );
}

async fn handle_delete_pjs_id_issues_issue_iid_links_issue_link_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let issue_iid = args::require_u64(&args, "issue_iid")?;
    let issue_link_id = args::require_u64(&args, "issue_link_id")?;
    let path = format!(
        "/projects/{}/issues/{issue_iid}/links/{issue_link_id}",
        GitlabClient::encode_path(&id)
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
    fn test_module_registers_four_tools() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        assert_eq!(registry.len(), 4);
    }

    #[tokio::test]
    async fn test_create_link_applies_link_type_default() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/projects/7/issues/41/links")
                .json_body(json!({
                    "target_project_id": "9",
                    "target_issue_iid": 3,
                    "link_type": "relates_to",
                }));
            then.status(201).json_body(json!({"source_issue": {}, "target_issue": {}}));
        });

        handle_post_pjs_id_issues_issue_iid_links(
            client_for(&server.base_url()),
            args(json!({"id": 7, "issue_iid": 41, "target_project_id": 9, "target_issue_iid": 3})),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_delete_link_builds_full_path() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(DELETE).path("/api/v4/projects/7/issues/41/links/5");
            then.status(200).json_body(json!({}));
        });

        handle_delete_pjs_id_issues_issue_iid_links_issue_link_id(
            client_for(&server.base_url()),
            args(json!({"id": 7, "issue_iid": 41, "issue_link_id": 5})),
        )
        .await
        .unwrap();

        mock.assert();
    }
}
