//! Git submodule refresh and selective sync into the output tree.

use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Output};

use serde::Deserialize;

use crate::builder::BuildError;

/// Per-submodule manifest, read from `<submodule>/.build`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BuildManifest {
    /// Patterns passed to rsync as `--exclude`
    pub exclude: Vec<String>,

    /// Destination, relative to the output dir
    pub to: String,
}

impl BuildManifest {
    /// Resolve `to` under `output_dir`. Leading `/` is dropped so the target
    /// always stays inside the output; `..` is rejected.
    pub fn destination(&self, output_dir: &Path) -> Result<PathBuf, BuildError> {
        let mut destination = output_dir.to_path_buf();

        for component in Path::new(&self.to).components() {
            match component {
                Component::Normal(part) => destination.push(part),
                Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
                Component::ParentDir => {
                    return Err(BuildError::DataError(format!(
                        "submodule destination '{}' leaves the output directory",
                        self.to
                    )))
                }
            }
        }

        Ok(destination)
    }
}

/// Settings for submodule syncing.
#[derive(Debug, Clone)]
pub struct SubmoduleConfig {
    /// Repository root; git runs here and submodule paths are relative to it
    pub root: PathBuf,

    /// `.gitmodules` file name, relative to `root`
    pub gitmodules: PathBuf,

    /// Manifest file name inside each submodule
    pub manifest: String,

    /// git executable
    pub git: String,

    /// rsync executable
    pub rsync: String,
}

impl Default for SubmoduleConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            gitmodules: PathBuf::from(".gitmodules"),
            manifest: ".build".to_string(),
            git: "git".to_string(),
            rsync: "rsync".to_string(),
        }
    }
}

/// Refreshes submodules and copies them into the output dir.
pub struct SubmoduleSync {
    config: SubmoduleConfig,
    output_dir: PathBuf,
}

impl SubmoduleSync {
    pub fn new(config: SubmoduleConfig, output_dir: &Path) -> Self {
        Self {
            config,
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Initialise submodules and pull their remote heads.
    pub fn refresh(&self) -> Result<(), BuildError> {
        tracing::info!("Updating submodules");
        let root = Some(self.config.root.as_path());
        self.run(
            &self.config.git,
            &to_args(&["submodule", "update", "--init", "--recursive"]),
            root,
        )?;
        self.run(
            &self.config.git,
            &to_args(&["submodule", "update", "--remote", "--merge"]),
            root,
        )?;
        tracing::info!("Submodules updated");
        Ok(())
    }

    /// Sync every submodule listed in `.gitmodules`. Returns how many were synced.
    pub fn sync_all(&self) -> Result<usize, BuildError> {
        let gitmodules = self.config.root.join(&self.config.gitmodules);
        if !gitmodules.exists() {
            tracing::warn!("No submodules file at {}", gitmodules.display());
            return Ok(0);
        }

        let content = fs::read_to_string(&gitmodules)
            .map_err(|e| BuildError::ReadError(format!("{}: {}", gitmodules.display(), e)))?;

        let paths = read_gitmodules(&content);
        for path in &paths {
            self.sync_one(path)?;
        }

        Ok(paths.len())
    }

    /// Sync a single submodule according to its manifest.
    pub fn sync_one(&self, path: &str) -> Result<(), BuildError> {
        let source = self.config.root.join(path);
        let manifest = self.read_manifest(&source)?;
        let destination = manifest.destination(&self.output_dir)?;

        tracing::info!("Syncing {} -> {}", path, destination.display());

        self.run(
            &self.config.rsync,
            &rsync_args(&manifest, &source, &destination),
            None,
        )
    }

    fn read_manifest(&self, submodule: &Path) -> Result<BuildManifest, BuildError> {
        let path = submodule.join(&self.config.manifest);
        let content = fs::read_to_string(&path)
            .map_err(|e| BuildError::ReadError(format!("{}: {}", path.display(), e)))?;

        serde_json::from_str(&content).map_err(|e| BuildError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Run an external tool. A non-zero exit is logged and otherwise ignored;
    /// failing to start the tool is an error.
    fn run(&self, program: &str, args: &[OsString], cwd: Option<&Path>) -> Result<(), BuildError> {
        let rendered = format!("{} {}", program, display_args(args));
        tracing::debug!("Running {}", rendered);

        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output: Output = command
            .output()
            .map_err(|e| BuildError::CommandError {
                command: rendered.clone(),
                message: e.to_string(),
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            tracing::debug!("{}", line);
        }

        if !output.status.success() {
            tracing::warn!(
                "{} exited with {}: {}",
                rendered,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(())
    }
}

/// Extract submodule paths from `.gitmodules` content.
pub fn read_gitmodules(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let (key, value) = line.trim().split_once('=')?;
            if key.trim() != "path" {
                return None;
            }
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        })
        .collect()
}

/// Arguments for `rsync -av --exclude=... <source> <destination>`.
pub fn rsync_args(manifest: &BuildManifest, source: &Path, destination: &Path) -> Vec<OsString> {
    let mut args = vec![OsString::from("-av")];
    args.extend(
        manifest
            .exclude
            .iter()
            .map(|pattern| OsString::from(format!("--exclude={}", pattern))),
    );
    args.push(source.as_os_str().to_os_string());
    args.push(destination.as_os_str().to_os_string());
    args
}

fn to_args(args: &[&str]) -> Vec<OsString> {
    args.iter().map(OsString::from).collect()
}

fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const GITMODULES: &str = r#"[submodule "projects/editor"]
	path = projects/editor
	url = https://example.com/editor.git
[submodule "projects/2tetris"]
	path = projects/2tetris
	url = https://example.com/2tetris.git
	branch = main
"#;

    #[test]
    fn reads_submodule_paths() {
        assert_eq!(
            read_gitmodules(GITMODULES),
            vec!["projects/editor", "projects/2tetris"]
        );
    }

    #[test]
    fn ignores_keys_that_merely_contain_path() {
        let content = "[submodule \"x\"]\n\tpathname = nope\n\tpath = x\n";
        assert_eq!(read_gitmodules(content), vec!["x"]);
    }

    #[test]
    fn parses_manifest() {
        let manifest: BuildManifest =
            serde_json::from_str(r#"{"exclude": [".git", "node_modules"], "to": "projects"}"#)
                .unwrap();

        assert_eq!(manifest.exclude, vec![".git", "node_modules"]);
        assert_eq!(manifest.to, "projects");
    }

    #[test]
    fn builds_rsync_arguments() {
        let manifest = BuildManifest {
            exclude: vec![".git".to_string(), "*.md".to_string()],
            to: "projects".to_string(),
        };

        let args = rsync_args(
            &manifest,
            Path::new("projects/editor"),
            Path::new("dist/projects"),
        );

        assert_eq!(
            args,
            to_args(&[
                "-av",
                "--exclude=.git",
                "--exclude=*.md",
                "projects/editor",
                "dist/projects"
            ])
        );
    }

    #[test]
    fn manifest_requires_exclude() {
        let result = serde_json::from_str::<BuildManifest>(r#"{"to": "projects"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn absolute_destination_stays_in_output() {
        let manifest: BuildManifest =
            serde_json::from_str(r#"{"exclude": [], "to": "/projects"}"#).unwrap();

        let destination = manifest.destination(Path::new("dist")).unwrap();
        let args = rsync_args(&manifest, Path::new("projects/editor"), &destination);

        assert_eq!(destination, PathBuf::from("dist/projects"));
        assert_eq!(args.last().unwrap(), &OsString::from("dist/projects"));
    }

    #[test]
    fn nested_destination_is_kept() {
        let manifest = BuildManifest {
            exclude: vec![],
            to: "./projects/editor/".to_string(),
        };

        assert_eq!(
            manifest.destination(Path::new("dist")).unwrap(),
            PathBuf::from("dist/projects/editor")
        );
    }

    #[test]
    fn parent_components_are_rejected() {
        let manifest = BuildManifest {
            exclude: vec![],
            to: "../outside".to_string(),
        };

        assert!(matches!(
            manifest.destination(Path::new("dist")),
            Err(BuildError::DataError(_))
        ));
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("mod")).unwrap();

        let sync = SubmoduleSync::new(
            SubmoduleConfig {
                root: temp.path().to_path_buf(),
                ..Default::default()
            },
            &temp.path().join("dist"),
        );

        assert!(matches!(sync.sync_one("mod"), Err(BuildError::ReadError(_))));
    }

    #[test]
    fn manifest_without_exclude_is_a_parse_error() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("mod")).unwrap();
        fs::write(temp.path().join("mod/.build"), r#"{"to": "mod"}"#).unwrap();

        let sync = SubmoduleSync::new(
            SubmoduleConfig {
                root: temp.path().to_path_buf(),
                ..Default::default()
            },
            &temp.path().join("dist"),
        );

        assert!(matches!(
            sync.sync_one("mod"),
            Err(BuildError::ParseError { .. })
        ));
    }

    #[test]
    fn missing_tool_is_a_command_error() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("mod")).unwrap();
        fs::write(temp.path().join("mod/.build"), r#"{"exclude": [], "to": "mod"}"#).unwrap();

        let sync = SubmoduleSync::new(
            SubmoduleConfig {
                root: temp.path().to_path_buf(),
                rsync: "zbuild-test-no-such-rsync".to_string(),
                ..Default::default()
            },
            &temp.path().join("dist"),
        );

        assert!(matches!(
            sync.sync_one("mod"),
            Err(BuildError::CommandError { .. })
        ));
    }

    #[test]
    fn no_gitmodules_syncs_nothing() {
        let temp = tempdir().unwrap();
        let sync = SubmoduleSync::new(
            SubmoduleConfig {
                root: temp.path().to_path_buf(),
                ..Default::default()
            },
            &temp.path().join("dist"),
        );

        assert_eq!(sync.sync_all().unwrap(), 0);
    }
}
