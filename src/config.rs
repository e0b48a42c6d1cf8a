use crate::cli::Cli;
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_GITLAB_URL: &str = "https://gitlab.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gitlab: GitlabConfig,
    /// Hide every tool that is not a plain GET and reject calls to them.
    #[serde(default)]
    pub read_only: bool,
    /// Regex matched against whole tool names. Matching tools are neither
    /// listed nor callable.
    #[serde(default)]
    pub skip_tools: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gitlab: GitlabConfig::default(),
            read_only: false,
            skip_tools: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitlabConfig {
    #[serde(default = "default_gitlab_url")]
    pub url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GitlabConfig {
    fn default() -> Self {
        Self {
            url: default_gitlab_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_gitlab_url() -> String {
    DEFAULT_GITLAB_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Config {
    /// Compiles `skip_tools` into a full-match regex. A pattern like
    /// `delete_.*|post_pjs` must cover the whole tool name to count.
    pub fn skip_tools_regex(&self) -> Result<Option<Regex>> {
        match self.skip_tools.as_deref() {
            Some(pattern) if !pattern.is_empty() => {
                let regex = Regex::new(&format!("^(?:{pattern})$"))
                    .with_context(|| format!("Invalid skip_tools pattern: {pattern}"))?;
                Ok(Some(regex))
            }
            _ => Ok(None),
        }
    }
}

/// Builds the effective config: file values first, then CLI/env overrides,
/// then `${ENVVAR}` references resolved.
pub async fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match config_path(cli) {
        Some(path) => load_file(&path).await?,
        None => Config::default(),
    };

    if let Some(url) = &cli.gitlab_url {
        config.gitlab.url = url.clone();
    }
    if let Some(token) = &cli.gitlab_token {
        config.gitlab.token = Some(token.clone());
    }
    if let Some(read_only) = cli.read_only {
        config.read_only = read_only;
    }
    if let Some(skip_tools) = &cli.skip_tools {
        config.skip_tools = Some(skip_tools.clone());
    }

    config.gitlab.url = resolve_env_reference(&config.gitlab.url)?;
    if let Some(token) = config.gitlab.token.take() {
        config.gitlab.token = Some(resolve_env_reference(&token)?);
    }

    Ok(config)
}

/// An explicit `--config-file` must exist. The default location is only
/// consulted when a file is actually there.
fn config_path(cli: &Cli) -> Option<PathBuf> {
    if let Some(path) = &cli.config_file {
        return Some(path.clone());
    }
    let default_path = dirs::config_dir()?.join("gitlab-mcp").join("config.yaml");
    default_path.exists().then_some(default_path)
}

async fn load_file(path: &Path) -> Result<Config> {
    tracing::info!("Loading config from: {}", path.display());
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    parse_config(&content, path)
}

pub(crate) fn parse_config<T: serde::de::DeserializeOwned>(
    content: &str,
    file_path: &Path,
) -> Result<T> {
    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("json");

    match extension.to_lowercase().as_str() {
        "json" => serde_json::from_str(content).context("Failed to parse JSON config"),
        "yaml" | "yml" => serde_yaml::from_str(content).context("Failed to parse YAML config"),
        "toml" => toml::from_str(content).context("Failed to parse TOML config"),
        _ => Err(anyhow::anyhow!(
            "Unsupported config file format: {}",
            extension
        )),
    }
}

/// Resolves a `${VAR}` reference against the environment so secrets can
/// stay out of config files. Any other value passes through unchanged.
fn resolve_env_reference(value: &str) -> Result<String> {
    match value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        Some(name) => std::env::var(name).with_context(|| {
            format!("Environment variable '{name}' referenced in config is not set")
        }),
        None => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("create config file");
        file.write_all(content.as_bytes()).expect("write config file");
        path
    }

    #[test]
    fn test_parse_yaml_config() {
        let content = r#"
gitlab:
  url: https://gitlab.example.com
  token: glpat-abc
  timeout_secs: 10
read_only: true
skip_tools: "delete_.*"
"#;
        let config: Config = parse_config(content, Path::new("config.yaml")).unwrap();
        assert_eq!(config.gitlab.url, "https://gitlab.example.com");
        assert_eq!(config.gitlab.token.as_deref(), Some("glpat-abc"));
        assert_eq!(config.gitlab.timeout_secs, 10);
        assert!(config.read_only);
        assert_eq!(config.skip_tools.as_deref(), Some("delete_.*"));
    }

    #[test]
    fn test_parse_json_config() {
        let content = r#"{"gitlab": {"url": "https://gitlab.example.com"}}"#;
        let config: Config = parse_config(content, Path::new("config.json")).unwrap();
        assert_eq!(config.gitlab.url, "https://gitlab.example.com");
        assert_eq!(config.gitlab.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(!config.read_only);
    }

    #[test]
    fn test_parse_toml_config() {
        let content = r#"
read_only = true

[gitlab]
url = "https://gitlab.example.com"
"#;
        let config: Config = parse_config(content, Path::new("config.toml")).unwrap();
        assert_eq!(config.gitlab.url, "https://gitlab.example.com");
        assert!(config.read_only);
    }

    #[test]
    fn test_parse_empty_yaml_uses_defaults() {
        let config: Config = parse_config("{}", Path::new("config.yaml")).unwrap();
        assert_eq!(config.gitlab.url, DEFAULT_GITLAB_URL);
        assert_eq!(config.gitlab.token, None);
        assert!(!config.read_only);
        assert!(config.skip_tools.is_none());
    }

    #[test]
    fn test_parse_config_formats() {
        // Missing extension falls back to JSON, unknown extensions fail.
        let content = r#"{"read_only": true}"#;
        let config: Config = parse_config(content, Path::new("config")).unwrap();
        assert!(config.read_only);

        let result: Result<Config> = parse_config(content, Path::new("config.ini"));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_reference_resolution() {
        unsafe { std::env::set_var("GITLAB_MCP_TEST_REF_TOKEN", "glpat-from-env") };
        assert_eq!(
            resolve_env_reference("${GITLAB_MCP_TEST_REF_TOKEN}").unwrap(),
            "glpat-from-env"
        );
        assert_eq!(
            resolve_env_reference("glpat-literal").unwrap(),
            "glpat-literal"
        );
        assert!(resolve_env_reference("${GITLAB_MCP_TEST_REF_UNSET}").is_err());
    }

    #[test]
    fn test_skip_tools_regex_matches_whole_names() {
        let config = Config {
            skip_tools: Some("delete_.*|post_pjs".to_string()),
            ..Config::default()
        };
        let regex = config.skip_tools_regex().unwrap().unwrap();
        assert!(regex.is_match("delete_pjs_id_issues_issue_iid"));
        assert!(regex.is_match("post_pjs"));
        assert!(!regex.is_match("post_pjs_id_issues"));
        assert!(!regex.is_match("get_pjs"));
    }

    #[test]
    fn test_skip_tools_regex_absent_or_invalid() {
        let config = Config::default();
        assert!(config.skip_tools_regex().unwrap().is_none());

        let config = Config {
            skip_tools: Some("(".to_string()),
            ..Config::default()
        };
        assert!(config.skip_tools_regex().is_err());
    }

    #[tokio::test]
    async fn test_load_config_prefers_cli_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "config.yaml",
            "gitlab:\n  url: https://file.example.com\n  token: file-token\nread_only: true\n",
        );

        let cli = Cli {
            config_file: Some(path),
            gitlab_url: Some("https://cli.example.com".to_string()),
            read_only: Some(false),
            ..Cli::default()
        };
        let config = load_config(&cli).await.unwrap();
        assert_eq!(config.gitlab.url, "https://cli.example.com");
        assert_eq!(config.gitlab.token.as_deref(), Some("file-token"));
        assert!(!config.read_only);
    }

    #[tokio::test]
    async fn test_load_config_resolves_env_references_from_file() {
        unsafe { std::env::set_var("GITLAB_MCP_TEST_FILE_TOKEN", "glpat-resolved") };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "config.yaml",
            "gitlab:\n  token: ${GITLAB_MCP_TEST_FILE_TOKEN}\n",
        );

        let cli = Cli {
            config_file: Some(path),
            ..Cli::default()
        };
        let config = load_config(&cli).await.unwrap();
        assert_eq!(config.gitlab.token.as_deref(), Some("glpat-resolved"));
    }

    #[tokio::test]
    async fn test_load_config_missing_explicit_file_fails() {
        let cli = Cli {
            config_file: Some(PathBuf::from("/nonexistent/config.yaml")),
            ..Cli::default()
        };
        assert!(load_config(&cli).await.is_err());
    }
}
