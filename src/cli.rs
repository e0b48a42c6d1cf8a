use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3001";

#[derive(Parser, Clone)]
#[command(version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct Cli {
    #[arg(short, long, value_name = "FILE", env = "GITLAB_MCP_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    #[arg(
        long = "transport",
        value_name = "TRANSPORT",
        env = "GITLAB_MCP_TRANSPORT",
        default_value = "stdio",
        value_parser = ["stdio", "sse", "streamable-http"]
    )]
    pub transport: String,

    #[arg(
        long = "bind-address",
        value_name = "ADDRESS",
        env = "GITLAB_MCP_BIND_ADDRESS",
        default_value = DEFAULT_BIND_ADDRESS
    )]
    pub bind_address: String,

    #[arg(
        long = "gitlab-url",
        value_name = "URL",
        help = "Base URL of the GitLab instance, without the /api/v4 suffix. Will override the value in your config file if set.",
        env = "GITLAB_URL"
    )]
    pub gitlab_url: Option<String>,

    #[arg(
        long = "gitlab-token",
        value_name = "TOKEN",
        help = "Personal/project access token used for the PRIVATE-TOKEN header. Will override the value in your config file if set.",
        env = "GITLAB_TOKEN",
        hide_env_values = true
    )]
    pub gitlab_token: Option<String>,

    #[arg(
        long = "read-only",
        help = "Expose only tools that perform GET requests. Will override the value in your config file if set.",
        env = "GITLAB_READ_ONLY"
    )]
    pub read_only: Option<bool>,

    #[arg(
        long = "skip-tools",
        value_name = "REGEX",
        help = "Regex of tool names to hide and reject. Will override the value in your config file if set.",
        env = "GITLAB_MCP_SKIP_TOOLS"
    )]
    pub skip_tools: Option<String>,
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config_file: None,
            transport: "stdio".to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            gitlab_url: None,
            gitlab_token: None,
            read_only: None,
            skip_tools: None,
        }
    }
}
