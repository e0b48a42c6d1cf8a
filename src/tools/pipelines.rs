//! Pipeline and job endpoints, including job control actions and the raw
//! trace log.

use crate::client::GitlabClient;
use crate::registry::{Endpoint, Method, Schema, ToolRegistry};
use crate::tools::args;
use crate::tools::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE, to_raw_result, to_result};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use std::sync::Arc;

const PIPELINE_STATUSES: &[&str] = &[
    "created",
    "waiting_for_resource",
    "preparing",
    "pending",
    "running",
    "success",
    "failed",
    "canceled",
    "skipped",
    "manual",
    "scheduled",
];

const JOB_SCOPES: &[&str] = &[
    "created",
    "pending",
    "running",
    "failed",
    "success",
    "canceled",
    "skipped",
    "waiting_for_resource",
    "manual",
];

pub fn register(registry: &mut ToolRegistry) {
    register_get_pjs_id_pipelines(registry);
    register_get_pjs_id_pipelines_pipeline_id(registry);
    register_post_pjs_id_pipeline(registry);
    register_get_pjs_id_pipelines_pipeline_id_variables(registry);
    register_get_pjs_id_pipelines_pipeline_id_test_report(registry);
    register_post_pjs_id_pipelines_pipeline_id_retry(registry);
    register_post_pjs_id_pipelines_pipeline_id_cancel(registry);
    register_delete_pjs_id_pipelines_pipeline_id(registry);
    register_get_pjs_id_pipelines_pipeline_id_jobs(registry);
    register_get_pjs_id_jobs(registry);
    register_get_pjs_id_jobs_job_id(registry);
    register_get_pjs_id_jobs_job_id_trace(registry);
    register_post_pjs_id_jobs_job_id_retry(registry);
    register_post_pjs_id_jobs_job_id_cancel(registry);
    register_post_pjs_id_jobs_job_id_play(registry);
    register_post_pjs_id_jobs_job_id_erase(registry);
}

fn register_get_pjs_id_pipelines(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/pipelines"),
        "List the pipelines of a project",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_enum("status", "Return pipelines with the given status", PIPELINE_STATUSES)
            .string("ref", "Return pipelines for the given branch or tag")
            .string("sha", "Return pipelines for the given commit SHA")
            .string("source", "Return pipelines triggered by the given source, for example push or schedule")
            .string("username", "Return pipelines triggered by the given user")
            .string("updated_after", "Return pipelines updated after the given time (ISO 8601)")
            .string_enum_default(
                "order_by",
                "Field to order the results by",
                &["id", "status", "ref", "updated_at", "user_id"],
                "id",
            )
            .string_enum_default("sort", "Sort order", &["asc", "desc"], "desc")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_pipelines(client, args)),
    );
}

#[derive(Serialize)]
struct ListPipelinesQuery {
    page: u64,
    per_page: u64,
    order_by: String,
    sort: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    r#ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_after: Option<String>,
}

async fn handle_get_pjs_id_pipelines(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = ListPipelinesQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        order_by: args::string_or(&args, "order_by", "id")?,
        sort: args::string_or(&args, "sort", "desc")?,
        status: args::opt_string(&args, "status")?,
        r#ref: args::opt_string(&args, "ref")?,
        sha: args::opt_string(&args, "sha")?,
        source: args::opt_string(&args, "source")?,
        username: args::opt_string(&args, "username")?,
        updated_after: args::opt_string(&args, "updated_after")?,
    };
    let path = format!("/projects/{}/pipelines", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_pipelines_pipeline_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/pipelines/{pipeline_id}"),
        "Get a single pipeline",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("pipeline_id", "ID of the pipeline"),
        |client, args| Box::pin(handle_get_pjs_id_pipelines_pipeline_id(client, args)),
    );
}

async fn handle_get_pjs_id_pipelines_pipeline_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let pipeline_id = args::require_u64(&args, "pipeline_id")?;
    let path = format!(
        "/projects/{}/pipelines/{pipeline_id}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get(&path).await)
}

fn register_post_pjs_id_pipeline(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/pipeline"),
        "Create a new pipeline for a branch or tag",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_required("ref", "Branch or tag to run the pipeline on"),
        |client, args| Box::pin(handle_post_pjs_id_pipeline(client, args)),
    );
}

#[derive(Serialize)]
struct CreatePipelineBody {
    r#ref: String,
}

async fn handle_post_pjs_id_pipeline(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let body = CreatePipelineBody {
        r#ref: args::require_str(&args, "ref")?,
    };
    let path = format!("/projects/{}/pipeline", GitlabClient::encode_path(&id));
    to_result(client.post(&path, &body).await)
}

fn register_get_pjs_id_pipelines_pipeline_id_variables(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/pipelines/{pipeline_id}/variables",
        ),
        "List the variables of a pipeline",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("pipeline_id", "ID of the pipeline"),
        |client, args| {
            Box::pin(handle_get_pjs_id_pipelines_pipeline_id_variables(client, args))
        },
    );
}

async fn handle_get_pjs_id_pipelines_pipeline_id_variables(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let pipeline_id = args::require_u64(&args, "pipeline_id")?;
    let path = format!(
        "/projects/{}/pipelines/{pipeline_id}/variables",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get(&path).await)
}

fn register_get_pjs_id_pipelines_pipeline_id_test_report(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Get,
            "/projects/{id}/pipelines/{pipeline_id}/test_report",
        ),
        "Get the test report of a pipeline",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("pipeline_id", "ID of the pipeline"),
        |client, args| {
            Box::pin(handle_get_pjs_id_pipelines_pipeline_id_test_report(client, args))
        },
    );
}

async fn handle_get_pjs_id_pipelines_pipeline_id_test_report(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let pipeline_id = args::require_u64(&args, "pipeline_id")?;
    let path = format!(
        "/projects/{}/pipelines/{pipeline_id}/test_report",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get(&path).await)
}

fn register_post_pjs_id_pipelines_pipeline_id_retry(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/pipelines/{pipeline_id}/retry"),
        "Retry the failed jobs of a pipeline",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("pipeline_id", "ID of the pipeline"),
        |client, args| Box::pin(handle_post_pjs_id_pipelines_pipeline_id_retry(client, args)),
    );
}

async fn handle_post_pjs_id_pipelines_pipeline_id_retry(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let pipeline_id = args::require_u64(&args, "pipeline_id")?;
    let path = format!(
        "/projects/{}/pipelines/{pipeline_id}/retry",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post_empty(&path).await)
}

fn register_post_pjs_id_pipelines_pipeline_id_cancel(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(
            Method::Post,
            "/projects/{id}/pipelines/{pipeline_id}/cancel",
        ),
        "Cancel the running jobs of a pipeline",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("pipeline_id", "ID of the pipeline"),
        |client, args| Box::pin(handle_post_pjs_id_pipelines_pipeline_id_cancel(client, args)),
    );
}

async fn handle_post_pjs_id_pipelines_pipeline_id_cancel(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let pipeline_id = args::require_u64(&args, "pipeline_id")?;
    let path = format!(
        "/projects/{}/pipelines/{pipeline_id}/cancel",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post_empty(&path).await)
}

fn register_delete_pjs_id_pipelines_pipeline_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Delete, "/projects/{id}/pipelines/{pipeline_id}"),
        "Delete a pipeline",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("pipeline_id", "ID of the pipeline"),
        |client, args| Box::pin(handle_delete_pjs_id_pipelines_pipeline_id(client, args)),
    );
}

async fn handle_delete_pjs_id_pipelines_pipeline_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let pipeline_id = args::require_u64(&args, "pipeline_id")?;
    let path = format!(
        "/projects/{}/pipelines/{pipeline_id}",
        GitlabClient::encode_path(&id)
    );
    to_result(client.delete(&path).await)
}

fn register_get_pjs_id_pipelines_pipeline_id_jobs(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/pipelines/{pipeline_id}/jobs"),
        "List the jobs of a pipeline",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("pipeline_id", "ID of the pipeline")
            .string_enum("scope", "Return jobs with the given status", JOB_SCOPES)
            .boolean("include_retried", "Include retried jobs")
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_pipelines_pipeline_id_jobs(client, args)),
    );
}

#[derive(Serialize)]
struct PipelineJobsQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_retried: Option<bool>,
}

async fn handle_get_pjs_id_pipelines_pipeline_id_jobs(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let pipeline_id = args::require_u64(&args, "pipeline_id")?;
    let query = PipelineJobsQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        scope: args::opt_string(&args, "scope")?,
        include_retried: args::opt_bool(&args, "include_retried")?,
    };
    let path = format!(
        "/projects/{}/pipelines/{pipeline_id}/jobs",
        GitlabClient::encode_path(&id)
    );
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_jobs(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/jobs"),
        "List the jobs of a project",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .string_enum("scope", "Return jobs with the given status", JOB_SCOPES)
            .integer_default("page", "Page number", 1)
            .integer_default("per_page", "Results per page (max 100)", 20),
        |client, args| Box::pin(handle_get_pjs_id_jobs(client, args)),
    );
}

#[derive(Serialize)]
struct ProjectJobsQuery {
    page: u64,
    per_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

async fn handle_get_pjs_id_jobs(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let query = ProjectJobsQuery {
        page: args::u64_or(&args, "page", DEFAULT_PAGE)?,
        per_page: args::u64_or(&args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
        scope: args::opt_string(&args, "scope")?,
    };
    let path = format!("/projects/{}/jobs", GitlabClient::encode_path(&id));
    to_result(client.get_query(&path, &query).await)
}

fn register_get_pjs_id_jobs_job_id(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/jobs/{job_id}"),
        "Get a single job",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("job_id", "ID of the job"),
        |client, args| Box::pin(handle_get_pjs_id_jobs_job_id(client, args)),
    );
}

async fn handle_get_pjs_id_jobs_job_id(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let job_id = args::require_u64(&args, "job_id")?;
    let path = format!("/projects/{}/jobs/{job_id}", GitlabClient::encode_path(&id));
    to_result(client.get(&path).await)
}

fn register_get_pjs_id_jobs_job_id_trace(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Get, "/projects/{id}/jobs/{job_id}/trace"),
        "Get the trace log of a job as plain text",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("job_id", "ID of the job"),
        |client, args| Box::pin(handle_get_pjs_id_jobs_job_id_trace(client, args)),
    );
}

async fn handle_get_pjs_id_jobs_job_id_trace(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let job_id = args::require_u64(&args, "job_id")?;
    let path = format!(
        "/projects/{}/jobs/{job_id}/trace",
        GitlabClient::encode_path(&id)
    );
    to_raw_result(client.get_raw(&path, &[] as &[(&str, &str)]).await)
}

fn register_post_pjs_id_jobs_job_id_retry(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/jobs/{job_id}/retry"),
        "Retry a job",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("job_id", "ID of the job"),
        |client, args| Box::pin(handle_post_pjs_id_jobs_job_id_retry(client, args)),
    );
}

async fn handle_post_pjs_id_jobs_job_id_retry(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let job_id = args::require_u64(&args, "job_id")?;
    let path = format!(
        "/projects/{}/jobs/{job_id}/retry",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post_empty(&path).await)
}

fn register_post_pjs_id_jobs_job_id_cancel(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/jobs/{job_id}/cancel"),
        "Cancel a job",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("job_id", "ID of the job"),
        |client, args| Box::pin(handle_post_pjs_id_jobs_job_id_cancel(client, args)),
    );
}

async fn handle_post_pjs_id_jobs_job_id_cancel(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let job_id = args::require_u64(&args, "job_id")?;
    let path = format!(
        "/projects/{}/jobs/{job_id}/cancel",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post_empty(&path).await)
}

fn register_post_pjs_id_jobs_job_id_play(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/jobs/{job_id}/play"),
        "Start a manual job",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("job_id", "ID of the job"),
        |client, args| Box::pin(handle_post_pjs_id_jobs_job_id_play(client, args)),
    );
}

async fn handle_post_pjs_id_jobs_job_id_play(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let job_id = args::require_u64(&args, "job_id")?;
    let path = format!(
        "/projects/{}/jobs/{job_id}/play",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post_empty(&path).await)
}

fn register_post_pjs_id_jobs_job_id_erase(registry: &mut ToolRegistry) {
    registry.register(
        Endpoint::new(Method::Post, "/projects/{id}/jobs/{job_id}/erase"),
        "Erase a job, removing its trace and artifacts",
        Schema::new()
            .string_required("id", "Project ID or URL-encoded path")
            .integer_required("job_id", "ID of the job"),
        |client, args| Box::pin(handle_post_pjs_id_jobs_job_id_erase(client, args)),
    );
}

async fn handle_post_pjs_id_jobs_job_id_erase(
    client: Arc<GitlabClient>,
    args: JsonObject,
) -> Result<CallToolResult, McpError> {
    let id = args::require_str(&args, "id")?;
    let job_id = args::require_u64(&args, "job_id")?;
    let path = format!(
        "/projects/{}/jobs/{job_id}/erase",
        GitlabClient::encode_path(&id)
    );
    to_result(client.post_empty(&path).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{args, client_for, result_text};
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_module_registers_sixteen_tools() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        assert_eq!(registry.len(), 16);
    }

    #[tokio::test]
    async fn test_list_pipelines_orders_by_id_descending_by_default() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects/7/pipelines")
                .query_param("order_by", "id")
                .query_param("sort", "desc")
                .query_param("status", "failed");
            then.status(200).json_body(json!([]));
        });

        handle_get_pjs_id_pipelines(
            client_for(&server.base_url()),
            args(json!({"id": 7, "status": "failed"})),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_create_pipeline_posts_ref() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/projects/7/pipeline")
                .json_body(json!({"ref": "main"}));
            then.status(201).json_body(json!({"id": 9001, "status": "pending"}));
        });

        handle_post_pjs_id_pipeline(
            client_for(&server.base_url()),
            args(json!({"id": 7, "ref": "main"})),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_job_trace_returns_log_text() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v4/projects/7/jobs/42/trace");
            then.status(200).body("$ cargo test\nok\n");
        });

        let result = handle_get_pjs_id_jobs_job_id_trace(
            client_for(&server.base_url()),
            args(json!({"id": 7, "job_id": "42"})),
        )
        .await
        .unwrap();

        assert_ne!(result.is_error, Some(true));
        assert_eq!(result_text(&result), "$ cargo test\nok\n");
    }

    #[tokio::test]
    async fn test_retry_pipeline_uses_empty_post() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/v4/projects/7/pipelines/9001/retry");
            then.status(201).json_body(json!({"id": 9001, "status": "pending"}));
        });

        handle_post_pjs_id_pipelines_pipeline_id_retry(
            client_for(&server.base_url()),
            args(json!({"id": 7, "pipeline_id": 9001})),
        )
        .await
        .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_pipeline_jobs_forwards_scope() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects/7/pipelines/9001/jobs")
                .query_param("scope", "failed")
                .query_param("include_retried", "true");
            then.status(200).json_body(json!([]));
        });

        handle_get_pjs_id_pipelines_pipeline_id_jobs(
            client_for(&server.base_url()),
            args(json!({
                "id": 7,
                "pipeline_id": 9001,
                "scope": "failed",
                "include_retried": true,
            })),
        )
        .await
        .unwrap();

        mock.assert();
    }
}
