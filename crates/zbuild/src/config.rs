//! Configuration file (site.toml).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use zbuild_site::{BuildConfig, MathOptions, StaticOptions, SubmoduleConfig};

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default, rename = "static")]
    pub static_files: StaticConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub math: MathConfig,
    #[serde(default)]
    pub submodules: SubmodulesConfig,
    #[serde(default)]
    pub serve: ServeConfig,
}

#[derive(Debug, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_templates")]
    pub templates: String,
    #[serde(default = "default_data")]
    pub data: String,
    #[serde(default = "default_static", rename = "static")]
    pub static_dir: String,
    #[serde(default = "default_output")]
    pub output: String,
}

#[derive(Debug, Deserialize)]
pub struct StaticConfig {
    /// Subdirectory of the output that receives the static tree
    #[serde(default = "default_static")]
    pub prefix: String,
    /// Files moved from the static tree to the output root
    #[serde(default = "default_hoist")]
    pub hoist: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DataConfig {
    #[serde(default)]
    pub chunk: BTreeMap<String, usize>,
}

#[derive(Debug, Deserialize)]
pub struct MathConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub dollar_delimiters: bool,
}

#[derive(Debug, Deserialize)]
pub struct SubmodulesConfig {
    #[serde(default = "default_gitmodules")]
    pub gitmodules: String,
    #[serde(default = "default_manifest")]
    pub manifest: String,
    #[serde(default = "default_git")]
    pub git: String,
    #[serde(default = "default_rsync")]
    pub rsync: String,
}

#[derive(Debug, Deserialize)]
pub struct ServeConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            templates: default_templates(),
            data: default_data(),
            static_dir: default_static(),
            output: default_output(),
        }
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            prefix: default_static(),
            hoist: default_hoist(),
        }
    }
}

impl Default for MathConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dollar_delimiters: false,
        }
    }
}

impl Default for SubmodulesConfig {
    fn default() -> Self {
        Self {
            gitmodules: default_gitmodules(),
            manifest: default_manifest(),
            git: default_git(),
            rsync: default_rsync(),
        }
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

fn default_templates() -> String {
    "templates".to_string()
}
fn default_data() -> String {
    "data".to_string()
}
fn default_static() -> String {
    "static".to_string()
}
fn default_output() -> String {
    "dist".to_string()
}
fn default_hoist() -> Vec<String> {
    vec!["favicon.ico".to_string()]
}
fn default_true() -> bool {
    true
}
fn default_gitmodules() -> String {
    ".gitmodules".to_string()
}
fn default_manifest() -> String {
    ".build".to_string()
}
fn default_git() -> String {
    "git".to_string()
}
fn default_rsync() -> String {
    "rsync".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    tracing::debug!("No config at {}, using defaults", path.display());
    Ok(ConfigFile::default())
}

impl ConfigFile {
    /// Build settings, with `output` overriding the configured output dir.
    pub fn build_config(&self, output: Option<PathBuf>) -> BuildConfig {
        BuildConfig {
            templates_dir: PathBuf::from(&self.paths.templates),
            data_dir: PathBuf::from(&self.paths.data),
            static_dir: PathBuf::from(&self.paths.static_dir),
            output_dir: output.unwrap_or_else(|| PathBuf::from(&self.paths.output)),
            static_options: StaticOptions {
                prefix: PathBuf::from(&self.static_files.prefix),
                hoist: self.static_files.hoist.clone(),
            },
            chunk: self.data.chunk.clone(),
            math: self.math.enabled,
            math_options: MathOptions {
                dollar_delimiters: self.math.dollar_delimiters,
            },
            submodules: SubmoduleConfig {
                gitmodules: PathBuf::from(&self.submodules.gitmodules),
                manifest: self.submodules.manifest.clone(),
                git: self.submodules.git.clone(),
                rsync: self.submodules.rsync.clone(),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();
        let config = load_config(&temp.path().join("site.toml")).unwrap();
        let build = config.build_config(None);

        assert_eq!(build.templates_dir, PathBuf::from("templates"));
        assert_eq!(build.output_dir, PathBuf::from("dist"));
        assert_eq!(build.static_options.hoist, vec!["favicon.ico"]);
        assert!(build.math);
        assert!(!build.math_options.dollar_delimiters);
        assert_eq!(config.serve.port, 8080);
    }

    #[test]
    fn reads_partial_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("site.toml");
        fs::write(
            &path,
            r#"
[paths]
output = "public"

[data]
chunk = { projects = 2 }

[math]
dollar_delimiters = true
"#,
        )
        .unwrap();

        let build = load_config(&path).unwrap().build_config(None);

        assert_eq!(build.output_dir, PathBuf::from("public"));
        assert_eq!(build.data_dir, PathBuf::from("data"));
        assert_eq!(build.chunk.get("projects"), Some(&2));
        assert!(build.math_options.dollar_delimiters);
    }

    #[test]
    fn cli_output_overrides_file() {
        let build = ConfigFile::default().build_config(Some(PathBuf::from("out")));
        assert_eq!(build.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("site.toml");
        fs::write(&path, "[paths\noutput = ").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn unknown_section_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("site.toml");
        fs::write(&path, "[mathh]\nenabled = false\n").unwrap();

        assert!(load_config(&path).is_err());
    }
}
