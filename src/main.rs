use anyhow::Result;
use clap::Parser;
use rmcp::transport::sse_server::SseServer;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use rmcp::{ServiceExt, transport::stdio};

mod cli;
mod client;
mod config;
mod logging;
mod naming;
mod registry;
mod service;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = config::load_config(&cli).await?;

    tracing::info!("Starting gitlab-mcp server");

    match cli.transport.as_str() {
        "stdio" => {
            tracing::info!("Starting gitlab-mcp with stdio transport");
            let service = service::GitlabService::new(&config)?
                .serve(stdio())
                .await
                .inspect_err(|e| {
                    tracing::error!("Serving error: {:?}", e);
                })?;
            service.waiting().await?;
        }
        "sse" => {
            tracing::info!(
                "Starting gitlab-mcp with SSE transport at {}",
                cli.bind_address
            );
            let ct = SseServer::serve(cli.bind_address.parse()?)
                .await?
                .with_service(move || {
                    service::GitlabService::new(&config).expect("Failed to create GitLab service")
                });

            tokio::signal::ctrl_c().await?;
            ct.cancel();
        }
        "streamable-http" => {
            let bind_address = cli.bind_address.clone();
            tracing::info!(
                "Starting gitlab-mcp with streamable-http transport at {}/mcp",
                bind_address
            );

            let service = StreamableHttpService::new(
                move || service::GitlabService::new(&config).map_err(std::io::Error::other),
                LocalSessionManager::default().into(),
                Default::default(),
            );

            let router = axum::Router::new().nest_service("/mcp", service);

            let _ = axum::serve(tokio::net::TcpListener::bind(bind_address).await?, router)
                .with_graceful_shutdown(async {
                    tokio::signal::ctrl_c().await.unwrap();
                    tracing::info!("Received Ctrl+C, shutting down gitlab-mcp server...");
                    // Give the log a moment to flush
                    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                    std::process::exit(0);
                })
                .await;
        }
        _ => unreachable!(),
    }

    Ok(())
}
