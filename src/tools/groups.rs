//! Group endpoints: listing, membership and the projects inside a group.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE, to_result};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_groups(registry);
    register_get_groups_id(registry);
    register_get_groups_id_pjs(registry);
    register_get_groups_id_subgroups(registry);
    register_get_groups_id_descendant_groups(registry);
    register_get_groups_id_members(registry);
    register_get_groups_id_members_all(registry);
}

fn register_get_groups(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/groups"),
        "List groups visible to the authenticated user",
        Schema::new()
            .string("search", "Search groups by name or path")
            .boolean("owned", "Return only groups owned by the authenticated user")
            .integer("min_access_level", "Return only groups where the user has at least this access level")
            .boolean("top_level_only", "Return only top-level groups")
            .string_enum_default(
                "order_by",
                "Field to order the results by",
                &["name", "path", "id"],
                "name",
            )
            .string_enum_default("sort", "Sort order", &["asc", "desc"], "asc")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_groups(client, args)),
    );
}

#[derive(Serialize)]
struct ListGroupsQuery {
    page: u64,
    per_page: u64,
    order_by: String,
    sort: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    owned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_access_level: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_level_only: Option<bool>,
}

async fn handle_get_groups(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let query = ListGroupsQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        order_by: args::string_or(&args, "order_by", "name")?,
        sort: args::string_or(&args, "sort", "asc")?,
        search: args::opt_string(&args, "search")?,
        owned: args::opt_bool(&args, "owned")?,
        min_access_level: args::opt_u64(&args, "min_access_level")?,
        top_level_only: args::opt_bool(&args, "top_level_only")?,
    };
    to_result(client.get_query("/groups", &query).await)
}

fn register_get_groups_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/groups/{id}"),
        "Get a single group",
        Schema::new()
            .string_required("id", "Group ID or URL-encoded path")
            .boolean_default("with_projects", "Include the projects of the group", true),
        |client, args| Box::pin(handle_get_groups_id(client, args)),
    );
}

#[derive(Serialize)]
struct GetGroupQuery {
    with_projects: bool,
}

async fn handle_get_groups_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = GetGroupQuery {
        with_projects: args::bool_or(&args, "with_projects", true)?,
    };
    let path = format!("/groups/{}", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_groups_id_pjs(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/groups/{id}/projects"),
        "List the projects of a group",
        Schema::new()
            .string_required("id", "Group ID or URL-encoded path")
            .string("search", "Search projects by name")
            .boolean("archived", "Limit by archived status")
            .boolean("include_subgroups", "Include projects of subgroups")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_groups_id_pjs(client, args)),
    );
}

#[derive(Serialize)]
struct GroupProjectsQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_subgroups: Option<bool>,
}

async fn handle_get_groups_id_pjs(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = GroupProjectsQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        search: args::opt_string(&args, "search")?,
        archived: args::opt_bool(&args, "archived")?,
        include_subgroups: args::opt_bool(&args, "include_subgroups")?,
    };
    let path = format!("/groups/{}/projects", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

#[derive(Serialize)]
struct SubgroupsQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
}

fn subgroups_query(args: &JsonObject) -> Result<SubgroupsQuery, McpError> {
    Ok(SubgroupsQuery {
        page: args::u64_or(args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        search: args::opt_string(args, "search")?,
    })
}

fn register_get_groups_id_subgroups(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/groups/{id}/subgroups"),
        "List the direct subgroups of a group",
        Schema::new()
            .string_required("id", "Group ID or URL-encoded path")
            .string("search", "Search subgroups by name or path")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_groups_id_subgroups(client, args)),
    );
}

async fn handle_get_groups_id_subgroups(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = subgroups_query(&args)?;
    let path = format!("/groups/{}/subgroups", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_groups_id_descendant_groups(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/groups/{id}/descendant_groups"),
        "List all descendant groups of a group, at any depth",
        Schema::new()
            .string_required("id", "Group ID or URL-encoded path")
            .string("search", "Search descendant groups by name or path")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_groups_id_descendant_groups(client, args)),
    );
}

async fn handle_get_groups_id_descendant_groups(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = subgroups_query(&args)?;
    let path = format!(
        "/groups/{}/descendant_groups",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

#[derive(Serialize)]
struct MembersQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<String>,
}

fn members_query(args: &JsonObject) -> Result<MembersQuery, McpError> {
    Ok(MembersQuery {
        page: args::u64_or(args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        query: args::opt_string(args, "query")?,
    })
}

fn register_get_groups_id_members(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/groups/{id}/members"),
        "List the direct members of a group",
        Schema::new()
            .string_required("id", "Group ID or URL-encoded path")
            .string("query", "Search members by name or username")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_groups_id_members(client, args)),
    );
}

async fn handle_get_groups_id_members(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = members_query(&args)?;
    let path = format!("/groups/{}/members", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_groups_id_members_all(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/groups/{id}/members/all"),
        "List all members of a group, including inherited ones",
        Schema::new()
            .string_required("id", "Group ID or URL-encoded path")
            .string("query", "Search members by name or username")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_groups_id_members_all(client, args)),
    );
}

async fn handle_get_groups_id_members_all(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = members_query(&args)?;
    let path = format!("/groups/{}/members/all", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
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
    async fn test_list_groups_orders_by_name_ascending() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/groups")
                .query_param("order_by", "name")
                .query_param("sort", "asc")
                .query_param("owned", "true");
            then.status(200).json_body(json!([]));
        });

        handle_get_groups(client_for(&server.base_url()), args(json!({"owned": true})))
            .await
            .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_get_group_includes_projects_by_default() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/groups/devtools%2Fplatform")
                .query_param("with_projects", "true");
            then.status(200).json_body(json!({"id": 9}));
        });

        handle_get_groups_id(
            client_for(&server.base_url()),
            args(json!({"id": "devtools/platform"})),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_members_all_forwards_query() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/groups/9/members/all")
                .query_param("query", "smith");
            then.status(200).json_body(json!([]));
        });

        handle_get_groups_id_members_all(
            client_for(&server.base_url()),
            args(json!({"id": 9, "query": "smith"})),
        )
        .await
        .unwrap();

        mock.assert();
    }
}
