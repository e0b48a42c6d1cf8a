//! Namespace endpoints. A namespace is either a user or a group.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE, to_result};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_namespaces(registry);
    register_get_namespaces_id(registry);
    register_get_namespaces_id_exists(registry);
}

fn register_get_namespaces(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/namespaces"),
        "List the namespaces visible to the authenticated user",
        Schema::new()
            .string("search", "Return namespaces matching the search string")
            .boolean("owned_only", "Return only namespaces owned by the authenticated user")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_namespaces(client, args)),
    );
}

#[derive(Serialize)]
struct ListNamespacesQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    owned_only: Option<bool>,
}

async fn handle_get_namespaces(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let query = ListNamespacesQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        search: args::opt_string(&args, "search")?,
        owned_only: args::opt_bool(&args, "owned_only")?,
    };
    to_result(client.get_query("/namespaces", &query).await)
}

fn register_get_namespaces_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/namespaces/{id}"),
        "Get a single namespace",
        Schema::new().string_required("id", "Namespace ID or URL-encoded path"),
        |client, args| Box::pin(handle_get_namespaces_id(client, args)),
    );
}

async fn handle_get_namespaces_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let path = format!("/namespaces/{}", GitlabClient::encode_path(&id));
    to_result(client.get(&path).await)
}

fn register_get_namespaces_id_exists(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/namespaces/{id}/exists"),
        "Check whether a namespace path exists and get suggested alternatives",
        Schema::new()
            .string_required("id", "Namespace path to check")
            .integer("parent_id", "Check within the parent namespace with this ID"),
        |client, args| Box::pin(handle_get_namespaces_id_exists(client, args)),
    );
}

#[derive(Serialize)]
struct NamespaceExistsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<u64>,
}

async fn handle_get_namespaces_id_exists(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = NamespaceExistsQuery {
        parent_id: args::opt_u64(&args, "parent_id")?,
    };
    let path = format!("/namespaces/{}/exists", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{args, client_for};
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_module_registers_three_tools() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn test_exists_forwards_parent_id() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/namespaces/tooling/exists")
                .query_param("parent_id", "9");
            then.status(200).json_body(json!({"exists": true, "suggests": ["tooling1"]}));
        });

        handle_get_namespaces_id_exists(
            client_for(&server.base_url()),
            args(json!({"id": "tooling", "parent_id": 9})),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_get_namespace_encodes_path() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/v4/namespaces/devtools%2Fplatform");
            then.status(200).json_body(json!({"id": 9}));
        });

        handle_get_namespaces_id(
            client_for(&server.base_url()),
            args(json!({"id": "devtools/platform"})),
        )
        .await
        .unwrap();

        mock.assert();
    }
}
