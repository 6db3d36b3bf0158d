//! Site builder.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use zbuild_math::{MathError, MathOptions, MathPass};

use crate::assets::{AssetPipeline, StaticOptions};
use crate::data::{chunk_arrays, load_data};
use crate::submodules::{SubmoduleConfig, SubmoduleSync};
use crate::templates::TemplateRenderer;

/// Configuration for building a site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Template source directory
    pub templates_dir: PathBuf,

    /// Directory of JSON data files
    pub data_dir: PathBuf,

    /// Static assets directory
    pub static_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Placement of static assets in the output
    pub static_options: StaticOptions,

    /// Data keys to regroup into chunks of the given size
    pub chunk: BTreeMap<String, usize>,

    /// Convert LaTeX fragments in rendered HTML
    pub math: bool,

    /// Delimiters recognised by the math pass
    pub math_options: MathOptions,

    /// Submodule sync settings
    pub submodules: SubmoduleConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
            data_dir: PathBuf::from("data"),
            static_dir: PathBuf::from("static"),
            output_dir: PathBuf::from("dist"),
            static_options: StaticOptions::default(),
            chunk: BTreeMap::new(),
            math: true,
            math_options: MathOptions::default(),
            submodules: SubmoduleConfig::default(),
        }
    }
}

/// Which steps a build runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Load data, render templates, convert math
    Template,

    /// Copy static assets
    Static,

    /// Template and static steps, then refresh and sync submodules
    Production,
}

/// Result of a build operation.
#[derive(Debug, Default)]
pub struct BuildResult {
    /// Number of templates rendered
    pub pages: usize,

    /// Number of math fragments converted
    pub math_fragments: usize,

    /// Number of static files copied
    pub static_files: usize,

    /// Number of submodules synced
    pub submodules: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read {0}")]
    ReadError(String),

    #[error("Failed to parse JSON: {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Invalid data: {0}")]
    DataError(String),

    #[error("Failed to render template {name}: {message}")]
    TemplateError { name: String, message: String },

    #[error(transparent)]
    MathError(#[from] MathError),

    #[error("Failed to write output: {0}")]
    WriteError(String),

    #[error("Failed to run `{command}`: {message}")]
    CommandError { command: String, message: String },
}

/// Static site builder.
pub struct SiteBuilder {
    config: BuildConfig,
    math: MathPass,
}

impl SiteBuilder {
    /// Create a builder using the `latex2mathml` converter.
    pub fn new(config: BuildConfig) -> Self {
        let math = MathPass::new(config.math_options);
        Self { config, math }
    }

    /// Create a builder with a custom math pass.
    pub fn with_math(config: BuildConfig, math: MathPass) -> Self {
        Self { config, math }
    }

    /// Run the steps selected by `mode`, in order.
    pub fn build(&self, mode: BuildMode) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        // Ensure output directory exists
        fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            BuildError::WriteError(format!("{}: {}", self.config.output_dir.display(), e))
        })?;

        let mut result = BuildResult {
            output_dir: self.config.output_dir.clone(),
            ..Default::default()
        };

        if matches!(mode, BuildMode::Template | BuildMode::Production) {
            let (pages, fragments) = self.render_templates()?;
            result.pages = pages;
            result.math_fragments = fragments;
        }

        if matches!(mode, BuildMode::Static | BuildMode::Production) {
            result.static_files = self.copy_static()?;
        }

        if mode == BuildMode::Production {
            result.submodules = self.sync_submodules()?;
        }

        result.duration_ms = start.elapsed().as_millis() as u64;

        Ok(result)
    }

    /// Render all templates and convert math in the rendered HTML.
    ///
    /// Returns the number of pages rendered and math fragments converted.
    pub fn render_templates(&self) -> Result<(usize, usize), BuildError> {
        tracing::info!("Templating");

        let mut data = load_data(&self.config.data_dir)?;
        chunk_arrays(&mut data, &self.config.chunk)?;

        let renderer = TemplateRenderer::new(&self.config.templates_dir, &data);
        let written = renderer.render_all(&self.config.output_dir)?;

        let mut fragments = 0;
        if self.config.math {
            for path in written
                .iter()
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("html"))
            {
                fragments += self.math.apply_to_file(path)?;
            }
        }

        Ok((written.len(), fragments))
    }

    /// Copy static assets into the output dir.
    pub fn copy_static(&self) -> Result<usize, BuildError> {
        tracing::info!("Copying static");

        AssetPipeline::new(
            &self.config.static_dir,
            &self.config.output_dir,
            self.config.static_options.clone(),
        )
        .copy()
    }

    /// Refresh submodules and sync each into the output dir.
    pub fn sync_submodules(&self) -> Result<usize, BuildError> {
        let sync = SubmoduleSync::new(self.config.submodules.clone(), &self.config.output_dir);
        sync.refresh()?;
        sync.sync_all()
    }
}
