//! Template, static and production builds.

use std::path::PathBuf;

use anyhow::{Context, Result};
use zbuild_site::{BuildMode, SiteBuilder};

use crate::config::ConfigFile;

/// Run a build in the given mode.
pub async fn run(file_config: &ConfigFile, output: Option<PathBuf>, mode: BuildMode) -> Result<()> {
    tracing::info!("Executing build script ({:?})", mode);

    let config = file_config.build_config(output);
    let builder = SiteBuilder::new(config);

    let result = tokio::task::spawn_blocking(move || builder.build(mode))
        .await
        .context("Build task panicked")?
        .with_context(|| format!("{:?} build failed", mode))?;

    tracing::info!(
        "Built {} pages ({} math fragments), {} static files, {} submodules in {}ms",
        result.pages,
        result.math_fragments,
        result.static_files,
        result.submodules,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
