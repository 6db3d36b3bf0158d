//! Preview server command.

use std::path::PathBuf;

use anyhow::Result;
use zbuild_server::{DevServer, DevServerConfig};

use crate::config::ConfigFile;

/// Run the preview server, optionally rebuilding on changes.
pub async fn run(
    file_config: &ConfigFile,
    output: Option<PathBuf>,
    port: Option<u16>,
    open: bool,
    watch: bool,
) -> Result<()> {
    let config = DevServerConfig {
        build: file_config.build_config(output),
        port: port.unwrap_or(file_config.serve.port),
        host: file_config.serve.host.clone(),
        open,
        watch,
    };

    if watch {
        tracing::info!("Watching for changes on port {}", config.port);
    }

    DevServer::new(config).start().await?;

    Ok(())
}
