//! Preview server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::sync::mpsc;
use tower_http::services::ServeDir;

use zbuild_site::{BuildConfig, BuildError, BuildMode, SiteBuilder};

use crate::watcher::{FileWatcher, WatchEvent, WatchRoots};

/// Configuration for the preview server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Site build settings; the output dir is what gets served
    pub build: BuildConfig,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,

    /// Rebuild on template, data and static changes
    pub watch: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            build: BuildConfig::default(),
            port: 8080,
            host: "127.0.0.1".to_string(),
            open: false,
            watch: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),

    #[error("Directory not found: {0}. Run a build first.")]
    MissingOutput(String),

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Preview server with optional rebuild-on-change.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    /// Create a new preview server.
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Socket address the server binds to.
    pub fn address(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| ServerError::InvalidAddress(format!("{}: {}", self.config.host, e)))
    }

    /// Start serving. Runs until the server stops.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr = self.address()?;
        let output_dir = self.config.build.output_dir.clone();

        if self.config.watch {
            let builder = Arc::new(SiteBuilder::new(self.config.build.clone()));

            // Initial build so there is something to serve
            for mode in [BuildMode::Template, BuildMode::Static] {
                let result = run_build(Arc::clone(&builder), mode).await?;
                tracing::info!("Initial {:?} build finished in {}ms", mode, result.duration_ms);
            }

            let roots = WatchRoots {
                templates: self.config.build.templates_dir.clone(),
                data: self.config.build.data_dir.clone(),
                static_dir: self.config.build.static_dir.clone(),
            };

            let (watcher, rx) =
                FileWatcher::new(&roots).map_err(|e| ServerError::WatchError(e.to_string()))?;

            tokio::spawn(async move {
                rebuild_on_change(builder, rx).await;
                // Keep watcher alive
                drop(watcher);
            });
        } else if !output_dir.exists() {
            return Err(ServerError::MissingOutput(output_dir.display().to_string()));
        }

        let app = Router::new().fallback_service(ServeDir::new(&output_dir));

        tracing::info!("Serving {} at http://{}", output_dir.display(), addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        // Open browser if configured
        if self.config.open {
            let url = format!("http://{}", addr);
            let _ = open::that(&url);
        }

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }
}

/// The build step a change calls for.
pub fn mode_for(event: &WatchEvent) -> BuildMode {
    match event {
        WatchEvent::Template(_) | WatchEvent::Data(_) => BuildMode::Template,
        WatchEvent::Static(_) => BuildMode::Static,
    }
}

/// Rebuild for each event, one build at a time. Failures are logged and the
/// watcher keeps running.
async fn rebuild_on_change(builder: Arc<SiteBuilder>, mut rx: mpsc::Receiver<WatchEvent>) {
    while let Some(event) = rx.recv().await {
        let mode = mode_for(&event);
        tracing::info!("Change detected: {:?}", event);

        match run_build(Arc::clone(&builder), mode).await {
            Ok(result) => tracing::info!("Rebuilt in {}ms", result.duration_ms),
            Err(e) => tracing::warn!("Rebuild failed: {}", e),
        }
    }
}

/// Run a synchronous build off the async runtime.
async fn run_build(
    builder: Arc<SiteBuilder>,
    mode: BuildMode,
) -> Result<zbuild_site::BuildResult, ServerError> {
    tokio::task::spawn_blocking(move || builder.build(mode))
        .await
        .map_err(|e| ServerError::WatchError(format!("build task failed: {}", e)))?
        .map_err(ServerError::from)
}
