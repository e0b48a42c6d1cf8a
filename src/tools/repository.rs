//! Repository browsing and file management endpoints.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE, to_raw_result, to_result};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry) {
    register_get_pjs_id_repository_tree(registry);
    register_get_pjs_id_repository_files_file_path(registry);
    register_get_pjs_id_repository_files_file_path_raw(registry);
    register_post_pjs_id_repository_files_file_path(registry);
    register_put_pjs_id_repository_files_file_path(registry);
    register_delete_pjs_id_repository_files_file_path(registry);
    register_get_pjs_id_repository_compare(registry);
    register_get_pjs_id_repository_contributors(registry);
}

fn register_get_pjs_id_repository_tree(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/repository/tree"),
        "List the files and directories of a repository tree",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string("path", "Path inside the repository to list")
            .string("ref", "Branch, tag or commit to list the tree of")
            .boolean_default("recursive", "Descend into subdirectories", false)
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_repository_tree(client, args)),
    );
}

#[derive(Serialize)]
struct TreeQuery {
    page: u64,
    per_page: u64,
    recursive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    r#ref: Option<String>,
}

async fn handle_get_pjs_id_repository_tree(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = TreeQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        recursive: args::bool_or(&args, "recursive", false)?,
        path: args::opt_string(&args, "path")?,
        r#ref: args::opt_string(&args, "ref")?,
    };
    let path = format!("/projects/{}/repository/tree", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_repository_files_file_path(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/repository/files/{file_path}",
        ),
        "Get a file from the repository with its content base64-encoded",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("file_path", "Path of the file inside the repository")
            .string_required("ref", "Branch, tag or commit to read the file from"),
        |client, args| Box::pin(handle_get_pjs_id_repository_files_file_path(client, args)),
    );
}

#[derive(Serialize)]
struct FileRefQuery {
    r#ref: String,
}

async fn handle_get_pjs_id_repository_files_file_path(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let file_path = args::require_str(&args, "file_path")?;
    let query = FileRefQuery {
        r#ref: args::require_str(&args, "ref")?,
    };
    let path = format!(
        "/projects/{}/repository/files/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&file_path)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_repository_files_file_path_raw(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/repository/files/{file_path}/raw",
        ),
        "Get the raw content of a repository file",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("file_path", "Path of the file inside the repository")
            .string("ref", "Branch, tag or commit to read the file from"),
        |client, args| {
            Box::pin(handle_get_pjs_id_repository_files_file_path_raw(client, args))
        },
    );
}

#[derive(Serialize)]
struct RawFileQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    r#ref: Option<String>,
}

async fn handle_get_pjs_id_repository_files_file_path_raw(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let file_path = args::require_str(&args, "file_path")?;
    let query = RawFileQuery {
        r#ref: args::opt_string(&args, "ref")?,
    };
    let path = format!(
        "/projects/{}/repository/files/{}/raw",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&file_path)
    );
    to_raw_result(client.get_raw(&path, &query).await)
}

#[derive(Serialize)]
struct WriteFileBody {
    branch: String,
    content: String,
    commit_message: String,
    encoding: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_commit_id: Option<String>,
}

fn write_file_body(args: &JsonObject) -> Result<WriteFileBody, McpError> {
    Ok(WriteFileBody {
        branch: args::require_str(args, "branch")?,
        content: args::require_str(args, "content")?,
        commit_message: args::require_str(args, "commit_message")?,
        encoding: args::string_or(args, "encoding", "text")?,
        author_email: args::opt_string(args, "author_email")?,
        author_name: args::opt_string(args, "author_name")?,
        // last_commit_id is declared only by the update tool, which fills it in.
        last_commit_id: None,
    })
}

fn write_file_schema(schema: Schema) -> Schema {
    schema
        .string_required("branch", "Branch to commit the change to")
        .string_required("content", "Content of the file")
        .string_required("commit_message", "Commit message")
        .string_enum_default(
            "encoding",
            "Encoding of the content parameter",
            &["text", "base64"],
            "text",
        )
        .string("author_email", "Commit author email")
        .string("author_name", "Commit author name")
}

fn register_post_pjs_id_repository_files_file_path(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Post,
            "/projects/{id}/repository/files/{file_path}",
        ),
        "Create a new file in the repository",
        write_file_schema(
            Schema::new()
                .string_required("id", "Project ID or URL-encoded path")
                .string_required("file_path", "Path of the file inside the repository"),
        ),
        |client, args| Box::pin(handle_post_pjs_id_repository_files_file_path(client, args)),
    );
}

async fn handle_post_pjs_id_repository_files_file_path(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let file_path = args::require_str(&args, "file_path")?;
    let body = write_file_body(&args)?;
    let path = format!(
        "/projects/{}/repository/files/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&file_path)
    );
    to_result(client.post(&path, &body).await)
}

fn register_put_pjs_id_repository_files_file_path(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Put,
            "/projects/{id}/repository/files/{file_path}",
        ),
        "Update an existing file in the repository",
        write_file_schema(
            Schema::new()
                .string_required("id", "Project ID or URL-encoded path")
                .string_required("file_path", "Path of the file inside the repository"),
        )
        .string("last_commit_id", "Last known commit SHA of the file, rejects concurrent edits"),
        |client, args| Box::pin(handle_put_pjs_id_repository_files_file_path(client, args)),
    );
}

async fn handle_put_pjs_id_repository_files_file_path(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let file_path = args::require_str(&args, "file_path")?;
    let mut body = write_file_body(&args)?;
    body.last_commit_id = args::opt_string(&args, "last_commit_id")?;
    let path = format!(
        "/projects/{}/repository/files/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&file_path)
    );
    to_result(client.put(&path, &body).await)
}

fn register_delete_pjs_id_repository_files_file_path(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Delete,
            "/projects/{id}/repository/files/{file_path}",
        ),
        "Delete a file from the repository",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("file_path", "Path of the file inside the repository")
            .string_required("branch", "Branch to commit the deletion to")
            .string_required("commit_message", "Commit message")
            .string("author_email", "Commit author email")
            .string("author_name", "Commit author name"),
        |client, args| {
            Box::pin(handle_delete_pjs_id_repository_files_file_path(client, args))
        },
    );
}

#[derive(Serialize)]
struct DeleteFileQuery {
    branch: String,
    commit_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_name: Option<String>,
}

async fn handle_delete_pjs_id_repository_files_file_path(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let file_path = args::require_str(&args, "file_path")?;
    let query = DeleteFileQuery {
        branch: args::require_str(&args, "branch")?,
        commit_message: args::require_str(&args, "commit_message")?,
        author_email: args::opt_string(&args, "author_email")?,
        author_name: args::opt_string(&args, "author_name")?,
    };
    let path = format!(
        "/projects/{}/repository/files/{}",
        GitlabClient::encode_path(&id),
        GitlabClient::encode_path(&file_path)
    );
    to_result(client.delete_query(&path, &query).await)
}

fn register_get_pjs_id_repository_compare(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/repository/compare"),
        "Compare two branches, tags or commits",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("from", "Commit SHA or branch name to compare from")
            .string_required("to", "Commit SHA or branch name to compare to")
            .boolean_default(
                "straight",
                "Compare with a straight diff instead of the merge base",
                false,
            )
            .boolean("unidiff", "Return diffs in unified format"),
        |client, args| Box::pin(handle_get_pjs_id_repository_compare(client, args)),
    );
}

#[derive(Serialize)]
struct CompareQuery {
    from: String,
    to: String,
    straight: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    unidiff: Option<bool>,
}

async fn handle_get_pjs_id_repository_compare(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = CompareQuery {
        from: args::require_str(&args, "from")?,
        to: args::require_str(&args, "to")?,
        straight: args::bool_or(&args, "straight", false)?,
        unidiff: args::opt_bool(&args, "unidiff")?,
    };
    let path = format!(
        "/projects/{}/repository/compare",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_repository_contributors(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/repository/contributors"),
        "List the contributors of a repository",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_enum(
                "order_by",
                "Field to order the results by",
                &["name", "email", "commits"],
            )
            .string_enum("sort", "Sort order", &["asc", "desc"])
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_repository_contributors(client, args)),
    );
}

#[derive(Serialize)]
struct ContributorsQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<String>,
}

async fn handle_get_pjs_id_repository_contributors(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = ContributorsQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        order_by: args::opt_string(&args, "order_by")?,
        sort: args::opt_string(&args, "sort")?,
    };
    let path = format!(
        "/projects/{}/repository/contributors",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{args, client_for, result_text};
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_module_registers_eight_tools() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        assert_eq!(registry.len(), 8);
    }

    #[tokio::test]
    async fn test_raw_file_returns_text_unchanged() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects/7/repository/files/src%2Fmain.rs/raw")
                .query_param("ref", "main");
            then.status(200).body("fn main() {}\n");
        });

        let result = handle_get_pjs_id_repository_files_file_path_raw(
            client_for(&server.base_url()),
            args(json!({"id": 7, "file_path": "src/main.rs", "ref": "main"})),
        )
        .await
        .unwrap();

        assert_ne!(result.is_error, Some(true));
        assert_eq!(result_text(&result), "fn main() {}\n");
    }

    #[tokio::test]
    async fn test_create_file_applies_text_encoding_default() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/projects/7/repository/files/docs%2Fguide.md")
                .json_body(json!({
                    "branch": "main",
                    "content": "# Guide\n",
                    "commit_message": "Add guide",
                    "encoding": "text",
                }));
            then.status(201).json_body(json!({"file_path": "docs/guide.md"}));
        });

        handle_post_pjs_id_repository_files_file_path(
            client_for(&server.base_url()),
            args(json!({
                "id": 7,
                "file_path": "docs/guide.md",
                "branch": "main",
                "content": "# Guide\n",
                "commit_message": "Add guide",
            })),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_create_file_ignores_last_commit_id() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/projects/7/repository/files/docs%2Fguide.md")
                .json_body(json!({
                    "branch": "main",
                    "content": "# Guide\n",
                    "commit_message": "Add guide",
                    "encoding": "text",
                }));
            then.status(201).json_body(json!({"file_path": "docs/guide.md"}));
        });

        handle_post_pjs_id_repository_files_file_path(
            client_for(&server.base_url()),
            args(json!({
                "id": 7,
                "file_path": "docs/guide.md",
                "branch": "main",
                "content": "# Guide\n",
                "commit_message": "Add guide",
                "last_commit_id": "5ea43f0e",
            })),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_update_file_sends_last_commit_id() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/v4/projects/7/repository/files/docs%2Fguide.md")
                .json_body(json!({
                    "branch": "main",
                    "content": "# Guide v2\n",
                    "commit_message": "Update guide",
                    "encoding": "text",
                    "last_commit_id": "5ea43f0e",
                }));
            then.status(200).json_body(json!({"file_path": "docs/guide.md"}));
        });

        handle_put_pjs_id_repository_files_file_path(
            client_for(&server.base_url()),
            args(json!({
                "id": 7,
                "file_path": "docs/guide.md",
                "branch": "main",
                "content": "# Guide v2\n",
                "commit_message": "Update guide",
                "last_commit_id": "5ea43f0e",
            })),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_delete_file_sends_commit_details_as_query() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(DELETE)
                .path("/api/v4/projects/7/repository/files/old.txt")
                .query_param("branch", "main")
                .query_param("commit_message", "Remove old file");
            then.status(204);
        });

        handle_delete_pjs_id_repository_files_file_path(
            client_for(&server.base_url()),
            args(json!({
                "id": 7,
                "file_path": "old.txt",
                "branch": "main",
                "commit_message": "Remove old file",
            })),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_compare_requires_both_ends() {
        let args = args(json!({"id": 7, "from": "main"}));
        let err = handle_get_pjs_id_repository_compare(client_for("http://localhost:1"), args)
            .await
            .unwrap_err();
        assert!(err.message.contains("to"));
    }

    #[tokio::test]
    async fn test_tree_sends_recursive_default() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects/7/repository/tree")
                .query_param("recursive", "false")
                .query_param("path", "src");
            then.status(200).json_body(json!([]));
        });

        handle_get_pjs_id_repository_tree(
            client_for(&server.base_url()),
            args(json!({"id": 7, "path": "src"})),
        )
        .await
        .unwrap();

        mock.assert();
    }
}
