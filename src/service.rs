use crate::{
    client::GitlabClient,
    config::Config,
    registry::{RegisteredTool, ToolRegistry},
    tools,
};
use anyhow::Result;
use regex::Regex;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::*,
    service::{RequestContext, RoleServer},
};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// MCP server over the GitLab REST API. Holds the static tool catalog and a
/// lazily built HTTP client shared by all tool calls.
pub struct GitlabService {
    config: Config,
    registry: ToolRegistry,
    skip_tools: Option<Regex>,
    client: OnceCell<Arc<GitlabClient>>,
}

impl GitlabService {
    pub fn new(config: &Config) -> Result<Self> {
        let skip_tools = config.skip_tools_regex()?;
        let mut registry = ToolRegistry::new();
        tools::register_all(&mut registry);
        tracing::info!("Registered {} GitLab tools", registry.len());

        Ok(Self {
            config: config.clone(),
            registry,
            skip_tools,
            client: OnceCell::new(),
        })
    }

    fn tool_enabled(&self, entry: &RegisteredTool) -> bool {
        if self.config.read_only && !entry.read_only {
            return false;
        }
        match &self.skip_tools {
            Some(skip_tools) => !skip_tools.is_match(entry.name()),
            None => true,
        }
    }

    /// The client is built on first use so that configuration problems
    /// (bad URL, malformed token) surface as tool errors instead of
    /// preventing startup.
    async fn api_client(&self) -> Result<Arc<GitlabClient>, crate::client::ApiError> {
        self.client
            .get_or_try_init(|| async { GitlabClient::new(&self.config.gitlab).map(Arc::new) })
            .await
            .cloned()
    }
}

impl ServerHandler for GitlabService {
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!("got tools/call request for {}", request.name);
        let Some(entry) = self.registry.get(request.name.as_ref()) else {
            return Err(McpError::method_not_found::<CallToolRequestMethod>());
        };
        if !self.tool_enabled(entry) {
            tracing::warn!("Tool {} is disabled by configuration", entry.name());
            return Err(McpError::method_not_found::<CallToolRequestMethod>());
        }

        let client = match self.api_client().await {
            Ok(client) => client,
            Err(err) => {
                tracing::error!("Failed to build GitLab client: {err}");
                return Ok(tools::error_result(&err));
            }
        };

        let arguments = request.arguments.unwrap_or_default();
        (entry.handler)(client, arguments).await
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "gitlab-mcp".to_string(),
                title: Some("GitLab MCP".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),

                ..Default::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),

            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        tracing::info!("got tools/list request {:?}", request);
        let tools = self
            .registry
            .iter()
            .filter(|entry| self.tool_enabled(entry))
            .map(|entry| entry.tool.clone())
            .collect();
        Ok(ListToolsResult {
            next_cursor: None,
            tools,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GitlabConfig;
    use httpmock::prelude::*;
    use rmcp::service::{RoleClient, RunningService, serve_client, serve_server};
    use tokio::io::duplex;
    use tokio_test::assert_ok;
    use tokio_util::sync::CancellationToken;

    fn test_config(url: &str) -> Config {
        Config {
            gitlab: GitlabConfig {
                url: url.to_string(),
                token: None,
                timeout_secs: 5,
            },
            read_only: false,
            skip_tools: None,
        }
    }

    fn create_test_service(config: Config) -> GitlabService {
        GitlabService::new(&config).expect("service should build")
    }

    async fn create_test_pair(
        service: GitlabService,
    ) -> (
        RunningService<RoleServer, GitlabService>,
        RunningService<RoleClient, ClientInfo>,
    ) {
        let (srv_io, cli_io) = duplex(64 * 1024);
        tokio::try_join!(
            async {
                serve_server(service, srv_io)
                    .await
                    .map_err(anyhow::Error::from)
            },
            async {
                serve_client(ClientInfo::default(), cli_io)
                    .await
                    .map_err(anyhow::Error::from)
            }
        )
        .expect("Failed to create test pair")
    }

    fn create_test_ctx(
        running: &RunningService<RoleServer, GitlabService>,
    ) -> RequestContext<RoleServer> {
        RequestContext {
            ct: CancellationToken::new(),
            extensions: Extensions::default(),
            id: RequestId::Number(1),
            meta: Meta::default(),
            peer: running.peer().clone(),
        }
    }

    fn call(name: &'static str, arguments: Option<serde_json::Value>) -> CallToolRequestParam {
        CallToolRequestParam {
            name: std::borrow::Cow::Borrowed(name),
            arguments: arguments
                .map(|v| v.as_object().expect("arguments must be an object").clone()),
        }
    }

    #[test]
    fn test_service_registers_full_catalog() {
        let service = create_test_service(Config::default());
        assert!(!service.registry.is_empty());
        assert!(service.registry.get("get_pjs").is_some());
        assert!(service.registry.get("post_pjs_id_issues").is_some());
    }

    #[test]
    fn test_service_rejects_invalid_skip_tools_pattern() {
        let config = Config {
            skip_tools: Some("(".to_string()),
            ..Config::default()
        };
        assert!(GitlabService::new(&config).is_err());
    }

    #[test]
    fn test_get_info_advertises_tools() {
        let service = create_test_service(Config::default());
        let info = rmcp::ServerHandler::get_info(&service);
        assert_eq!(info.protocol_version, ProtocolVersion::LATEST);
        assert_eq!(info.server_info.name, "gitlab-mcp");
        assert!(!info.server_info.version.is_empty());
        assert!(info.capabilities.tools.is_some());
    }

    #[tokio::test]
    async fn test_list_tools_returns_whole_catalog() {
        let expected = {
            let mut registry = ToolRegistry::new();
            tools::register_all(&mut registry);
            registry.len()
        };
        let (server, client) = create_test_pair(create_test_service(Config::default())).await;

        let ctx = create_test_ctx(&server);
        let result = server.service().list_tools(None, ctx).await.unwrap();
        assert_eq!(result.tools.len(), expected);

        let names: Vec<&str> = result.tools.iter().map(|t| t.name.as_ref()).collect();
        assert!(names.contains(&"get_pjs"));
        assert!(names.contains(&"post_pjs_id_mrs"));
        assert!(names.contains(&"delete_pjs_id"));

        assert_ok!(server.cancel().await);
        assert_ok!(client.cancel().await);
    }

    #[tokio::test]
    async fn test_list_tools_read_only_hides_write_tools() {
        let config = Config {
            read_only: true,
            ..Config::default()
        };
        let (server, client) = create_test_pair(create_test_service(config)).await;

        let ctx = create_test_ctx(&server);
        let result = server.service().list_tools(None, ctx).await.unwrap();
        assert!(!result.tools.is_empty());
        for tool in &result.tools {
            assert!(
                tool.name.starts_with("get_"),
                "write tool {} listed in read-only mode",
                tool.name
            );
        }

        assert_ok!(server.cancel().await);
        assert_ok!(client.cancel().await);
    }

    #[tokio::test]
    async fn test_list_tools_skip_tools_matches_whole_names() {
        let config = Config {
            skip_tools: Some("delete_.*|get_pjs".to_string()),
            ..Config::default()
        };
        let (server, client) = create_test_pair(create_test_service(config)).await;

        let ctx = create_test_ctx(&server);
        let result = server.service().list_tools(None, ctx).await.unwrap();
        let names: Vec<&str> = result.tools.iter().map(|t| t.name.as_ref()).collect();
        assert!(!names.iter().any(|name| name.starts_with("delete_")));
        assert!(!names.contains(&"get_pjs"));
        // The pattern has to cover the whole name, so longer names survive.
        assert!(names.contains(&"get_pjs_id"));

        assert_ok!(server.cancel().await);
        assert_ok!(client.cancel().await);
    }

    #[tokio::test]
    async fn test_call_tool_unknown_name_is_method_not_found() {
        let (server, client) = create_test_pair(create_test_service(Config::default())).await;

        let ctx = create_test_ctx(&server);
        let err = server
            .service()
            .call_tool(call("get_nonexistent", None), ctx)
            .await
            .expect_err("unknown tool should not resolve");
        assert_eq!(err.code, ErrorCode::METHOD_NOT_FOUND);

        assert_ok!(server.cancel().await);
        assert_ok!(client.cancel().await);
    }

    #[tokio::test]
    async fn test_call_tool_read_only_blocks_write_tools() {
        let config = Config {
            read_only: true,
            ..Config::default()
        };
        let (server, client) = create_test_pair(create_test_service(config)).await;

        let ctx = create_test_ctx(&server);
        let err = server
            .service()
            .call_tool(
                call("post_pjs", Some(serde_json::json!({"name": "blocked"}))),
                ctx,
            )
            .await
            .expect_err("write tool should be rejected in read-only mode");
        assert_eq!(err.code, ErrorCode::METHOD_NOT_FOUND);

        assert_ok!(server.cancel().await);
        assert_ok!(client.cancel().await);
    }

    #[tokio::test]
    async fn test_call_tool_skipped_tool_is_not_callable() {
        let config = Config {
            skip_tools: Some("get_user".to_string()),
            ..Config::default()
        };
        let (server, client) = create_test_pair(create_test_service(config)).await;

        let ctx = create_test_ctx(&server);
        let err = server
            .service()
            .call_tool(call("get_user", None), ctx)
            .await
            .expect_err("skipped tool should be rejected");
        assert_eq!(err.code, ErrorCode::METHOD_NOT_FOUND);

        assert_ok!(server.cancel().await);
        assert_ok!(client.cancel().await);
    }

    #[tokio::test]
    async fn test_call_tool_client_failure_short_circuits() {
        let (server, client) =
            create_test_pair(create_test_service(test_config("not a url"))).await;

        let ctx = create_test_ctx(&server);
        let result = server
            .service()
            .call_tool(call("get_user", None), ctx)
            .await
            .expect("construction failure should be a tool error, not a protocol error");
        assert_eq!(result.is_error, Some(true));
        let text = &result.content[0].as_text().expect("text content").text;
        assert!(text.contains("invalid GitLab URL"), "unexpected text: {text}");

        assert_ok!(server.cancel().await);
        assert_ok!(client.cancel().await);
    }

    #[tokio::test]
    async fn test_call_tool_missing_required_argument_is_invalid_params() {
        let (server, client) =
            create_test_pair(create_test_service(test_config("http://127.0.0.1:9"))).await;

        let ctx = create_test_ctx(&server);
        let err = server
            .service()
            .call_tool(call("get_pjs_id", None), ctx)
            .await
            .expect_err("missing id should fail validation");
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);

        assert_ok!(server.cancel().await);
        assert_ok!(client.cancel().await);
    }

    #[tokio::test]
    async fn test_call_tool_forwards_arguments_upstream() {
        let api = MockServer::start();
        let mock = api.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects")
                .query_param("search", "etl")
                .query_param("page", "1")
                .query_param("per_page", "20");
            then.status(200).json_body(serde_json::json!([{"id": 1}]));
        });

        let (server, client) =
            create_test_pair(create_test_service(test_config(&api.base_url()))).await;

        let ctx = create_test_ctx(&server);
        let result = server
            .service()
            .call_tool(
                call("get_pjs", Some(serde_json::json!({"search": "etl"}))),
                ctx,
            )
            .await
            .unwrap();

        mock.assert();
        assert_eq!(result.is_error, Some(false));
        let text = &result.content[0].as_text().expect("text content").text;
        assert!(text.contains("\"id\": 1"), "unexpected text: {text}");

        assert_ok!(server.cancel().await);
        assert_ok!(client.cancel().await);
    }

    #[tokio::test]
    async fn test_call_tool_upstream_error_is_tool_error() {
        let api = MockServer::start();
        api.mock(|when, then| {
            when.method(GET).path("/api/v4/user");
            then.status(401)
                .json_body(serde_json::json!({"message": "401 Unauthorized"}));
        });

        let (server, client) =
            create_test_pair(create_test_service(test_config(&api.base_url()))).await;

        let ctx = create_test_ctx(&server);
        let result = server
            .service()
            .call_tool(call("get_user", None), ctx)
            .await
            .expect("upstream failure should be a tool error, not a protocol error");
        assert_eq!(result.is_error, Some(true));
        let text = &result.content[0].as_text().expect("text content").text;
        assert!(text.contains("401 Unauthorized"), "unexpected text: {text}");

        assert_ok!(server.cancel().await);
        assert_ok!(client.cancel().await);
    }
}
