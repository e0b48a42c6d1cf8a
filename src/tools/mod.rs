//! Tool registrations for the GitLab REST surface, grouped by resource.
//! Every tool wraps exactly one endpoint: the registration declares the
//! schema, the handler reads typed arguments and forwards to the client.

pub mod args;

mod branches;
mod commits;
mod discussions;
mod draft_notes;
mod groups;
mod issue_links;
mod issues;
mod labels;
mod merge_requests;
mod milestones;
mod namespaces;
mod notes;
mod pipelines;
mod projects;
mod releases;
mod repository;
mod search;
mod tags;
mod users;
mod wikis;

use crate::client::{ApiError, ApiResult};
use crate::registry::ToolRegistry;
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, Content, JsonObject};
use serde::Serialize;

/// Page size cap enforced on every paginated endpoint.
pub(crate) const MAX_PER_PAGE: u64 = 100;
pub(crate) const DEFAULT_PAGE: u64 = 1;
pub(crate) const DEFAULT_PER_PAGE: u64 = 20;

/// Pagination pair shared by list endpoints whose only query parameters
/// are `page` and `per_page`.
#[derive(Serialize)]
pub(crate) struct PageQuery {
    pub(crate) page: u64,
    pub(crate) per_page: u64,
}

pub(crate) fn page_query(args: &JsonObject) -> Result<PageQuery, McpError> {
    Ok(PageQuery {
        page: self::args::u64_or(args, "page", DEFAULT_PAGE)?,
        per_page: self::args::u64_or(args, "per_page", DEFAULT_PER_PAGE)?.min(MAX_PER_PAGE),
    })
}

pub fn register_all(registry: &mut ToolRegistry) {
    branches::register(registry);
    commits::register(registry);
    discussions::register(registry);
    draft_notes::register(registry);
    groups::register(registry);
    issue_links::register(registry);
    issues::register(registry);
    labels::register(registry);
    merge_requests::register(registry);
    milestones::register(registry);
    namespaces::register(registry);
    notes::register(registry);
    pipelines::register(registry);
    projects::register(registry);
    releases::register(registry);
    repository::register(registry);
    search::register(registry);
    tags::register(registry);
    users::register(registry);
    wikis::register(registry);
}

/// Converts an API outcome into a tool result. Upstream failures become a
/// tool error result rather than a protocol error, so the caller always
/// gets content back.
pub(crate) fn to_result(outcome: ApiResult) -> Result<CallToolResult, McpError> {
    match outcome {
        Ok(value) => {
            let text =
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            Ok(CallToolResult::success(vec![Content::text(text)]))
        }
        Err(err) => Ok(error_result(&err)),
    }
}

/// Same contract as [`to_result`] for endpoints that answer plain text.
pub(crate) fn to_raw_result(outcome: Result<String, ApiError>) -> Result<CallToolResult, McpError> {
    match outcome {
        Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
        Err(err) => Ok(error_result(&err)),
    }
}

pub(crate) fn error_result(err: &ApiError) -> CallToolResult {
    CallToolResult::error(vec![Content::text(format!("Error: {err}"))])
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::client::GitlabClient;
    use crate::config::GitlabConfig;
    use rmcp::model::{CallToolResult, JsonObject};
    use serde_json::Value;
    use std::sync::Arc;

    pub(crate) fn client_for(base_url: &str) -> Arc<GitlabClient> {
        let config = GitlabConfig {
            url: base_url.to_string(),
            token: None,
            timeout_secs: 5,
        };
        Arc::new(GitlabClient::new(&config).expect("client should build"))
    }

    pub(crate) fn args(value: Value) -> JsonObject {
        value.as_object().expect("args must be an object").clone()
    }

    pub(crate) fn result_text(result: &CallToolResult) -> String {
        result.content[0]
            .as_text()
            .expect("text content")
            .text
            .clone()
    }
}
