//! zbuild CLI - static site build tool.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "zbuild")]
#[command(about = "Render templates with JSON data, convert LaTeX to MathML and assemble a static site")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    mode: Mode,

    /// Path to site.toml config file
    #[arg(short, long, default_value = "site.toml", global = true)]
    config: PathBuf,

    /// Output directory (defaults to config or "dist")
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Mode {
    /// Render templates and convert math
    Template,

    /// Copy static assets
    Static,

    /// Render, copy static assets, then refresh and sync submodules
    Production,

    /// Build, then rebuild on changes while serving the output
    Watch {
        /// Port to listen on (defaults to config or 8080)
        #[arg(short, long)]
        port: Option<u16>,

        /// Open the site in a browser
        #[arg(long)]
        open: bool,
    },

    /// Serve the output directory
    Serve {
        /// Port to listen on (defaults to config or 8080)
        #[arg(short, long)]
        port: Option<u16>,

        /// Open the site in a browser
        #[arg(long)]
        open: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let file_config = config::load_config(&cli.config)?;

    match cli.mode {
        Mode::Template => {
            commands::build::run(&file_config, cli.output, zbuild_site::BuildMode::Template)
                .await?;
        }
        Mode::Static => {
            commands::build::run(&file_config, cli.output, zbuild_site::BuildMode::Static).await?;
        }
        Mode::Production => {
            commands::build::run(&file_config, cli.output, zbuild_site::BuildMode::Production)
                .await?;
        }
        Mode::Watch { port, open } => {
            commands::serve::run(&file_config, cli.output, port, open, true).await?;
        }
        Mode::Serve { port, open } => {
            commands::serve::run(&file_config, cli.output, port, open, false).await?;
        }
    }

    Ok(())
}
