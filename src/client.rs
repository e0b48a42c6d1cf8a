use crate::config::GitlabConfig;
use reqwest::{Client, RequestBuilder, StatusCode, header};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub type ApiResult = Result<Value, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid GitLab URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("token is not usable as a header value: {0}")]
    InvalidToken(#[source] header::InvalidHeaderValue),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GitLab API returned {status}: {message}")]
    Status { status: StatusCode, message: String },
}

/// Thin client for the GitLab v4 REST API. Paths passed to the verb helpers
/// are relative to `/api/v4` and start with `/`.
pub struct GitlabClient {
    http: Client,
    api_base: String,
}

impl GitlabClient {
    pub fn new(config: &GitlabConfig) -> Result<Self, ApiError> {
        let api_base = format!("{}/api/v4", config.url.trim_end_matches('/'));
        Url::parse(&api_base).map_err(|source| ApiError::InvalidUrl {
            url: config.url.clone(),
            source,
        })?;

        let mut headers = header::HeaderMap::new();
        match &config.token {
            Some(token) => {
                let mut value =
                    header::HeaderValue::from_str(token).map_err(ApiError::InvalidToken)?;
                value.set_sensitive(true);
                headers.insert("PRIVATE-TOKEN", value);
            }
            None => {
                tracing::warn!("No GitLab token configured, requests will be anonymous");
            }
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self { http, api_base })
    }

    /// URL-encodes one path segment. Project paths like `group/project`
    /// must travel as a single segment (`group%2Fproject`).
    pub fn encode_path(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    pub async fn get(&self, path: &str) -> ApiResult {
        self.execute(self.http.get(self.endpoint(path))).await
    }

    pub async fn get_query<Q: Serialize>(&self, path: &str, query: &Q) -> ApiResult {
        self.execute(self.http.get(self.endpoint(path)).query(query))
            .await
    }

    /// GET for endpoints that answer with plain text rather than JSON
    /// (raw file contents, job traces). `?Sized` so callers can pass a
    /// bare `&[(&str, &str)]` slice, like `reqwest`'s own `query`.
    pub async fn get_raw<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<String, ApiError> {
        let response = self
            .http
            .get(self.endpoint(path))
            .query(query)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                message: error_message(&text),
            });
        }
        Ok(text)
    }

    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> ApiResult {
        self.execute(self.http.post(self.endpoint(path)).json(body))
            .await
    }

    pub async fn post_empty(&self, path: &str) -> ApiResult {
        self.execute(self.http.post(self.endpoint(path))).await
    }

    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> ApiResult {
        self.execute(self.http.put(self.endpoint(path)).json(body))
            .await
    }

    pub async fn put_empty(&self, path: &str) -> ApiResult {
        self.execute(self.http.put(self.endpoint(path))).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult {
        self.execute(self.http.delete(self.endpoint(path))).await
    }

    pub async fn delete_query<Q: Serialize>(&self, path: &str, query: &Q) -> ApiResult {
        self.execute(self.http.delete(self.endpoint(path)).query(query))
            .await
    }

    async fn execute(&self, request: RequestBuilder) -> ApiResult {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                message: error_message(&text),
            });
        }
        if text.is_empty() {
            return Ok(Value::Null);
        }
        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            // 2xx with a non-JSON body still counts as a result.
            Err(_) => Ok(Value::String(text)),
        }
    }
}

/// Pulls the human-readable part out of a GitLab error body. Error bodies
/// are usually `{"message": ...}` or `{"error": ...}`, but not always JSON.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            match value.get(key) {
                Some(Value::String(s)) => return s.clone(),
                Some(other) if !other.is_null() => return other.to_string(),
                _ => {}
            }
        }
    }
    if body.is_empty() {
        "empty response body".to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn test_config(base_url: &str, token: Option<&str>) -> GitlabConfig {
        GitlabConfig {
            url: base_url.to_string(),
            token: token.map(str::to_string),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_invalid_base_url_fails_construction() {
        let config = test_config("not a url", None);
        let result = GitlabClient::new(&config);
        assert!(matches!(result, Err(ApiError::InvalidUrl { .. })));
    }

    #[test]
    fn test_token_with_control_chars_fails_construction() {
        let config = test_config("https://gitlab.com", Some("bad\ntoken"));
        let result = GitlabClient::new(&config);
        assert!(matches!(result, Err(ApiError::InvalidToken(_))));
    }

    #[test]
    fn test_encode_path_keeps_ids_and_escapes_slashes() {
        assert_eq!(GitlabClient::encode_path("42"), "42");
        assert_eq!(GitlabClient::encode_path("group/project"), "group%2Fproject");
        assert_eq!(
            GitlabClient::encode_path("group/sub/project"),
            "group%2Fsub%2Fproject"
        );
    }

    #[tokio::test]
    async fn test_private_token_header_is_sent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects")
                .header("PRIVATE-TOKEN", "glpat-secret");
            then.status(200).json_body(serde_json::json!([]));
        });

        let client = GitlabClient::new(&test_config(&server.base_url(), Some("glpat-secret")))
            .expect("client should build");
        let result = client.get("/projects").await.expect("request should succeed");

        mock.assert();
        assert_eq!(result, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_query_struct_none_fields_are_omitted() {
        #[derive(Serialize)]
        struct Query {
            page: u32,
            per_page: u32,
            #[serde(skip_serializing_if = "Option::is_none")]
            search: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            archived: Option<bool>,
        }

        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects")
                .query_param("page", "1")
                .query_param("per_page", "20")
                .query_param("search", "etl");
            then.status(200).json_body(serde_json::json!([]));
        });

        let client = GitlabClient::new(&test_config(&server.base_url(), None))
            .expect("client should build");
        let query = Query {
            page: 1,
            per_page: 20,
            search: Some("etl".to_string()),
            archived: None,
        };
        client
            .get_query("/projects", &query)
            .await
            .expect("request should succeed");

        mock.assert();
    }

    #[tokio::test]
    async fn test_error_status_maps_to_status_error_with_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v4/projects/1");
            then.status(404)
                .json_body(serde_json::json!({"message": "404 Project Not Found"}));
        });

        let client = GitlabClient::new(&test_config(&server.base_url(), None))
            .expect("client should build");
        let err = client.get("/projects/1").await.expect_err("should fail");

        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "404 Project Not Found");
            }
            other => panic!("Expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_with_plain_body_keeps_body_text() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v4/projects/1");
            then.status(500).body("upstream exploded");
        });

        let client = GitlabClient::new(&test_config(&server.base_url(), None))
            .expect("client should build");
        let err = client.get("/projects/1").await.expect_err("should fail");

        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("Expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_success_body_yields_null() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(DELETE).path("/api/v4/projects/1/issues/3");
            then.status(204);
        });

        let client = GitlabClient::new(&test_config(&server.base_url(), None))
            .expect("client should build");
        let result = client
            .delete("/projects/1/issues/3")
            .await
            .expect("delete should succeed");
        assert_eq!(result, Value::Null);
    }

    #[tokio::test]
    async fn test_get_raw_returns_plain_text() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects/1/jobs/7/trace");
            then.status(200).body("line one\nline two\n");
        });

        let client = GitlabClient::new(&test_config(&server.base_url(), None))
            .expect("client should build");
        let text = client
            .get_raw("/projects/1/jobs/7/trace", &[] as &[(&str, &str)])
            .await
            .expect("trace should succeed");
        assert_eq!(text, "line one\nline two\n");
    }

    #[tokio::test]
    async fn test_get_raw_accepts_slice_query() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects/1/repository/files/README.md/raw")
                .query_param("ref", "main");
            then.status(200).body("# readme\n");
        });

        let client = GitlabClient::new(&test_config(&server.base_url(), None))
            .expect("client should build");
        let text = client
            .get_raw(
                "/projects/1/repository/files/README.md/raw",
                &[("ref", "main")] as &[(&str, &str)],
            )
            .await
            .expect("raw file should succeed");

        mock.assert();
        assert_eq!(text, "# readme\n");
    }

    #[tokio::test]
    async fn test_json_body_is_posted() {
        #[derive(Serialize)]
        struct Body<'a> {
            title: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<&'a str>,
        }

        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/projects/1/issues")
                .header("content-type", "application/json")
                .json_body(serde_json::json!({"title": "Crash on start"}));
            then.status(201).json_body(serde_json::json!({"iid": 11}));
        });

        let client = GitlabClient::new(&test_config(&server.base_url(), None))
            .expect("client should build");
        let result = client
            .post(
                "/projects/1/issues",
                &Body {
                    title: "Crash on start",
                    description: None,
                },
            )
            .await
            .expect("create should succeed");

        mock.assert();
        assert_eq!(result["iid"], 11);
    }

    #[tokio::test]
    async fn test_base_url_with_trailing_slash_is_normalized() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/v4/user");
            then.status(200).json_body(serde_json::json!({"id": 1}));
        });

        let url = format!("{}/", server.base_url());
        let client =
            GitlabClient::new(&test_config(&url, None)).expect("client should build");
        client.get("/user").await.expect("request should succeed");
        mock.assert();
    }
}
