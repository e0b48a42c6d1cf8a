//! Project listing, lifecycle and membership endpoints.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE, page_query, to_result};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_pjs(registry);
    register_get_pjs_id(registry);
    register_post_pjs(registry);
    register_put_pjs_id(registry);
    register_delete_pjs_id(registry);
    register_post_pjs_id_archive(registry);
    register_post_pjs_id_unarchive(registry);
    register_post_pjs_id_star(registry);
    register_post_pjs_id_unstar(registry);
    register_post_pjs_id_fork(registry);
    register_get_pjs_id_forks(registry);
    register_get_pjs_id_users(registry);
    register_get_pjs_id_members(registry);
    register_get_pjs_id_members_all(registry);
    register_get_pjs_id_languages(registry);
}

fn register_get_pjs(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects"),
        "List projects visible to the authenticated user",
        Schema::new()
            .string("search", "Return projects matching the search term")
            .string_enum(
                "visibility",
                "Limit by visibility level",
                &["public", "internal", "private"],
            )
            .boolean("archived", "Limit to archived projects")
            .boolean("membership", "Limit to projects the current user is a member of")
            .boolean("owned", "Limit to projects owned by the current user")
            .boolean("starred", "Limit to projects starred by the current user")
            .string_enum_default(
                "order_by",
                "Field to order the results by",
                &["id", "name", "path", "created_at", "updated_at", "last_activity_at"],
                "created_at",
            )
            .string_enum_default("sort", "Sort order", &["asc", "desc"], "desc")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs(client, args)),
    );
}

#[derive(Serialize)]
struct ListProjectsQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    membership: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    owned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    starred: Option<bool>,
    order_by: String,
    sort: String,
}

async fn handle_get_pjs(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let query = ListProjectsQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        search: args::opt_string(&args, "search")?,
        visibility: args::opt_string(&args, "visibility")?,
        archived: args::opt_bool(&args, "archived")?,
        membership: args::opt_bool(&args, "membership")?,
        owned: args::opt_bool(&args, "owned")?,
        starred: args::opt_bool(&args, "starred")?,
        order_by: args::string_or(&args, "order_by", "created_at")?,
        sort: args::string_or(&args, "sort", "desc")?,
    };
    to_result(client.get_query("/projects", &query).await)
}

fn register_get_pjs_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}"),
        "Get a single project",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .boolean("statistics", "Include project statistics")
            .boolean("license", "Include project license data"),
        |client, args| Box::pin(handle_get_pjs_id(client, args)),
    );
}

#[derive(Serialize)]
struct GetProjectQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    statistics: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license: Option<bool>,
}

async fn handle_get_pjs_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = GetProjectQuery {
        statistics: args::opt_bool(&args, "statistics")?,
        license: args::opt_bool(&args, "license")?,
    };
    let path = format!("/projects/{}", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_post_pjs(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects"),
        "Create a new project owned by the authenticated user",
        Schema::new()
            .string_required("name", "Name of the new project")
            .string("path", "Repository path, derived from the name when absent")
            .string("description", "Short project description")
            .string_enum(
                "visibility",
                "Project visibility level",
                &["public", "internal", "private"],
            )
            .integer("namespace_id", "Namespace to create the project in")
            .boolean_default(
                "initialize_with_readme",
                "Create an initial commit with a README",
                false,
            ),
        |client, args| Box::pin(handle_post_pjs(client, args)),
    );
}

#[derive(Serialize)]
struct CreateProjectBody {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace_id: Option<u64>,
    initialize_with_readme: bool,
}

async fn handle_post_pjs(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let body = CreateProjectBody {
        name: args::require_str(&args, "name")?,
        path: args::opt_string(&args, "path")?,
        description: args::opt_string(&args, "description")?,
        visibility: args::opt_string(&args, "visibility")?,
        namespace_id: args::opt_u64(&args, "namespace_id")?,
        initialize_with_readme: args::bool_or(&args, "initialize_with_readme", false)?,
    };
    to_result(client.post("/projects", &body).await)
}

fn register_put_pjs_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Put, "/projects/{id}"),
        "Update an existing project",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string("name", "New project name")
            .string("path", "New repository path")
            .string("description", "New project description")
            .string("default_branch", "New default branch")
            .string_enum(
                "visibility",
                "New visibility level",
                &["public", "internal", "private"],
            )
            .string("topics", "Comma-separated topic names replacing the current topics"),
        |client, args| Box::pin(handle_put_pjs_id(client, args)),
    );
}

#[derive(Serialize)]
struct UpdateProjectBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    topics: Option<String>,
}

async fn handle_put_pjs_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let body = UpdateProjectBody {
        name: args::opt_string(&args, "name")?,
        path: args::opt_string(&args, "path")?,
        description: args::opt_string(&args, "description")?,
        default_branch: args::opt_string(&args, "default_branch")?,
        visibility: args::opt_string(&args, "visibility")?,
        topics: args::opt_string(&args, "topics")?,
    };
    let path = format!("/projects/{}", GitlabClient::encode_path(&id));
    to_result(client.put(&path, &body).await)
}

fn register_delete_pjs_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Delete, "/projects/{id}"),
        "Delete a project",
        Schema::new().string_required("id", "Project ID or URL-encoded path"),
        |client, args| Box::pin(handle_delete_pjs_id(client, args)),
    );
}

async fn handle_delete_pjs_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let path = format!("/projects/{}", GitlabClient::encode_path(&id));
    to_result(client.delete(&path).await)
}

fn register_post_pjs_id_archive(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/archive"),
        "Archive a project",
        Schema::new().string_required("id", "Project ID or URL-encoded path"),
        |client, args| Box::pin(handle_post_pjs_id_archive(client, args)),
    );
}

async fn handle_post_pjs_id_archive(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let path = format!("/projects/{}/archive", GitlabClient::encode_path(&id));
    to_result(client.post_empty(&path).await)
}

fn register_post_pjs_id_unarchive(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/unarchive"),
        "Unarchive a project",
        Schema::new().string_required("id", "Project ID or URL-encoded path"),
        |client, args| Box::pin(handle_post_pjs_id_unarchive(client, args)),
    );
}

async fn handle_post_pjs_id_unarchive(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let path = format!("/projects/{}/unarchive", GitlabClient::encode_path(&id));
    to_result(client.post_empty(&path).await)
}

fn register_post_pjs_id_star(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/star"),
        "Star a project",
        Schema::new().string_required("id", "Project ID or URL-encoded path"),
        |client, args| Box::pin(handle_post_pjs_id_star(client, args)),
    );
}

async fn handle_post_pjs_id_star(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let path = format!("/projects/{}/star", GitlabClient::encode_path(&id));
    to_result(client.post_empty(&path).await)
}

fn register_post_pjs_id_unstar(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/unstar"),
        "Unstar a project",
        Schema::new().string_required("id", "Project ID or URL-encoded path"),
        |client, args| Box::pin(handle_post_pjs_id_unstar(client, args)),
    );
}

async fn handle_post_pjs_id_unstar(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let path = format!("/projects/{}/unstar", GitlabClient::encode_path(&id));
    to_result(client.post_empty(&path).await)
}

fn register_post_pjs_id_fork(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/fork"),
        "Fork a project into the current user's namespace or a given one",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer("namespace_id", "Namespace to fork the project into")
            .string("name", "Name of the forked project")
            .string("path", "Path of the forked project"),
        |client, args| Box::pin(handle_post_pjs_id_fork(client, args)),
    );
}

#[derive(Serialize)]
struct ForkProjectBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

async fn handle_post_pjs_id_fork(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let body = ForkProjectBody {
        namespace_id: args::opt_u64(&args, "namespace_id")?,
        name: args::opt_string(&args, "name")?,
        path: args::opt_string(&args, "path")?,
    };
    let path = format!("/projects/{}/fork", GitlabClient::encode_path(&id));
    to_result(client.post(&path, &body).await)
}

fn register_get_pjs_id_forks(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/forks"),
        "List the forks of a project",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_forks(client, args)),
    );
}

async fn handle_get_pjs_id_forks(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = page_query(&args)?;
    let path = format!("/projects/{}/forks", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_users(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/users"),
        "List users of a project",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string("search", "Search for users by name or username")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_users(client, args)),
    );
}

#[derive(Serialize)]
struct ProjectUsersQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
}

async fn handle_get_pjs_id_users(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = ProjectUsersQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        search: args::opt_string(&args, "search")?,
    };
    let path = format!("/projects/{}/users", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_members(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/members"),
        "List direct members of a project",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string("query", "Search for members by name, username or email")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_members(client, args)),
    );
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

async fn handle_get_pjs_id_members(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = members_query(&args)?;
    let path = format!("/projects/{}/members", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_members_all(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/members/all"),
        "List all members of a project including inherited ones",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string("query", "Search for members by name, username or email")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_members_all(client, args)),
    );
}

async fn handle_get_pjs_id_members_all(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = members_query(&args)?;
    let path = format!("/projects/{}/members/all", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_languages(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/languages"),
        "Get the language distribution of a project",
        Schema::new().string_required("id", "Project ID or URL-encoded path"),
        |client, args| Box::pin(handle_get_pjs_id_languages(client, args)),
    );
}

async fn handle_get_pjs_id_languages(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let path = format!("/projects/{}/languages", GitlabClient::encode_path(&id));
    to_result(client.get(&path).await)
}
