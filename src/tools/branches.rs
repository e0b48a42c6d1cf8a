//! Repository branch and protected branch endpoints.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE, to_result};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_pjs_id_repository_branches(registry);
    register_get_pjs_id_repository_branches_branch(registry);
    register_post_pjs_id_repository_branches(registry);
    register_delete_pjs_id_repository_branches_branch(registry);
    register_delete_pjs_id_repository_merged_branches(registry);
    register_get_pjs_id_protected_branches(registry);
    register_get_pjs_id_protected_branches_name(registry);
    register_post_pjs_id_protected_branches(registry);
    register_delete_pjs_id_protected_branches_name(registry);
}

fn register_get_pjs_id_repository_branches(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/repository/branches"),
        "List the branches of a project repository",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string("search", "Return branches containing the search string")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_repository_branches(client, args)),
    );
}

#[derive(Serialize)]
struct ListBranchesQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
}

async fn handle_get_pjs_id_repository_branches(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = ListBranchesQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        search: args::opt_string(&args, "search")?,
    };
    let path = format!(
        "/projects/{}/repository/branches",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_repository_branches_branch(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/repository/branches/{branch}"),
        "Get a single repository branch",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("branch", "Name of the branch"),
        |client, args| Box::pin(handle_get_pjs_id_repository_branches_branch(client, args)),
    );
}

async fn handle_get_pjs_id_repository_branches_branch(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let branch = args::require_str(&args, "branch")?;
    let path = format!(
        "/projects/{}/repository/branches/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&branch)
    );
    to_result(client.get(&path).await)
}

fn register_post_pjs_id_repository_branches(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/repository/branches"),
        "Create a new repository branch",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("branch", "Name of the new branch")
            .string_required("ref", "Branch name or commit SHA to create the branch from"),
        |client, args| Box::pin(handle_post_pjs_id_repository_branches(client, args)),
    );
}

#[derive(Serialize)]
struct CreateBranchBody {
    branch: String,
    r#ref: String,
}

async fn handle_post_pjs_id_repository_branches(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let body = CreateBranchBody {
        branch: args::require_str(&args, "branch")?,
        r#ref: args::require_str(&args, "ref")?,
    };
    let path = format!(
        "/projects/{}/repository/branches",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post(&path, &body).await)
}

fn register_delete_pjs_id_repository_branches_branch(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Delete,
            "/projects/{id}/repository/branches/{branch}",
        ),
        "Delete a repository branch",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("branch", "Name of the branch"),
        |client, args| Box::pin(handle_delete_pjs_id_repository_branches_branch(client, args)),
    );
}

async fn handle_delete_pjs_id_repository_branches_branch(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let branch = args::require_str(&args, "branch")?;
    let path = format!(
        "/projects/{}/repository/branches/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&branch)
    );
    to_result(client.delete(&path).await)
}

fn register_delete_pjs_id_repository_merged_branches(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Delete, "/projects/{id}/repository/merged_branches"),
        "Delete all branches that are merged into the default branch",
        Schema::new().string_required("id", "Project ID or URL-encoded path"),
        |client, args| Box::pin(handle_delete_pjs_id_repository_merged_branches(client, args)),
    );
}

async fn handle_delete_pjs_id_repository_merged_branches(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let path = format!(
        "/projects/{}/repository/merged_branches",
        GitlabClient::encode_path(&id)
    );
    to_result(client.delete(&path).await)
}

fn register_get_pjs_id_protected_branches(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/protected_branches"),
        "List the protected branches of a project",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string("search", "Return protected branches containing the search string")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_protected_branches(client, args)),
    );
}

async fn handle_get_pjs_id_protected_branches(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = ListBranchesQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        search: args::opt_string(&args, "search")?,
    };
    let path = format!(
        "/projects/{}/protected_branches",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_protected_branches_name(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/protected_branches/{name}"),
        "Get a single protected branch or wildcard rule",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("name", "Name of the branch or wildcard, for example release/*"),
        |client, args| Box::pin(handle_get_pjs_id_protected_branches_name(client, args)),
    );
}

async fn handle_get_pjs_id_protected_branches_name(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let name = args::require_str(&args, "name")?;
    let path = format!(
        "/projects/{}/protected_branches/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&name)
    );
    to_result(client.get(&path).await)
}

fn register_post_pjs_id_protected_branches(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/protected_branches"),
        "Protect a branch or set of wildcard-matched branches",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("name", "Name of the branch or wildcard, for example release/*")
            .integer(
                "push_access_level",
                "Access level allowed to push (0 none, 30 developer, 40 maintainer)",
            )
            .integer(
                "merge_access_level",
                "Access level allowed to merge (0 none, 30 developer, 40 maintainer)",
            )
            .boolean_default("allow_force_push", "Allow force pushes to the branch", false),
        |client, args| Box::pin(handle_post_pjs_id_protected_branches(client, args)),
    );
}

#[derive(Serialize)]
struct ProtectBranchBody {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    push_access_level: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    merge_access_level: Option<u64>,
    allow_force_push: bool,
}

async fn handle_post_pjs_id_protected_branches(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let body = ProtectBranchBody {
        name: args::require_str(&args, "name")?,
        push_access_level: args::opt_u64(&args, "push_access_level")?,
        merge_access_level: args::opt_u64(&args, "merge_access_level")?,
        allow_force_push: args::bool_or(&args, "allow_force_push", false)?,
    };
    let path = format!(
        "/projects/{}/protected_branches",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post(&path, &body).await)
}

fn register_delete_pjs_id_protected_branches_name(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Delete, "/projects/{id}/protected_branches/{name}"),
        "Remove protection from a branch",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("name", "Name of the branch or wildcard"),
        |client, args| Box::pin(handle_delete_pjs_id_protected_branches_name(client, args)),
    );
}

async fn handle_delete_pjs_id_protected_branches_name(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let name = args::require_str(&args, "name")?;
    let path = format!(
        "/projects/{}/protected_branches/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&name)
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
    fn test_module_registers_nine_tools() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        assert_eq!(registry.len(), 9);
    }

    #[tokio::test]
    async fn test_create_branch_sends_ref_in_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/projects/7/repository/branches")
                .json_body(json!({"branch": "feature/login", "ref": "main"}));
            then.status(201).json_body(json!({"name": "feature/login"}));
        });

        handle_post_pjs_id_repository_branches(
            client_for(&server.base_url()),
            args(json!({"id": 7, "branch": "feature/login", "ref": "main"})),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_branch_name_with_slash_is_encoded() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(DELETE)
                .path("/api/v4/projects/7/repository/branches/feature%2Flogin");
            then.status(204);
        });

        handle_delete_pjs_id_repository_branches_branch(
            client_for(&server.base_url()),
            args(json!({"id": 7, "branch": "feature/login"})),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_protect_branch_carries_access_levels() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/projects/7/protected_branches")
                .json_body(json!({
                    "name": "release/*",
                    "push_access_level": 40,
                    "merge_access_level": 30,
                    "allow_force_push": false,
                }));
            then.status(201).json_body(json!({"name": "release/*"}));
        });

        handle_post_pjs_id_protected_branches(
            client_for(&server.base_url()),
            args(json!({
                "id": 7,
                "name": "release/*",
                "push_access_level": 40,
                "merge_access_level": "30",
            })),
        )
        .await
        .unwrap();

        mock.assert();
    }
}
