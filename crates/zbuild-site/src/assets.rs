//! Static asset copying.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::builder::BuildError;

/// Where static assets land in the output tree.
#[derive(Debug, Clone)]
pub struct StaticOptions {
    /// Subdirectory of the output dir that receives the static tree
    pub prefix: PathBuf,

    /// Files (relative to the static dir) moved up to the output root after copying
    pub hoist: Vec<String>,
}

impl Default for StaticOptions {
    fn default() -> Self {
        Self {
            prefix: PathBuf::from("static"),
            hoist: vec!["favicon.ico".to_string()],
        }
    }
}

/// Copies a static directory into the output tree.
pub struct AssetPipeline {
    source_dir: PathBuf,
    output_dir: PathBuf,
    options: StaticOptions,
}

impl AssetPipeline {
    pub fn new(source_dir: &Path, output_dir: &Path, options: StaticOptions) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            options,
        }
    }

    /// Directory the static tree is copied into.
    pub fn destination(&self) -> PathBuf {
        self.output_dir.join(&self.options.prefix)
    }

    /// Copy every file, then hoist the configured files to the output root.
    ///
    /// Returns the number of files copied.
    pub fn copy(&self) -> Result<usize, BuildError> {
        if !self.source_dir.exists() {
            tracing::warn!("Static directory not found: {}", self.source_dir.display());
            return Ok(0);
        }

        let destination = self.destination();
        let mut copied = 0;

        for entry in WalkDir::new(&self.source_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let relative = entry
                .path()
                .strip_prefix(&self.source_dir)
                .unwrap_or(entry.path());
            let target = destination.join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)
                    .map_err(|e| BuildError::WriteError(format!("{}: {}", target.display(), e)))?;
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    BuildError::WriteError(format!("{}: {}", parent.display(), e))
                })?;
            }

            fs::copy(entry.path(), &target).map_err(|e| {
                BuildError::WriteError(format!(
                    "{} -> {}: {}",
                    entry.path().display(),
                    target.display(),
                    e
                ))
            })?;
            copied += 1;
        }

        self.hoist()?;

        Ok(copied)
    }

    fn hoist(&self) -> Result<(), BuildError> {
        let destination = self.destination();

        for name in &self.options.hoist {
            let from = destination.join(name);
            if !from.exists() {
                tracing::warn!("Nothing to hoist at {}", from.display());
                continue;
            }

            let to = self.output_dir.join(name);
            if let Some(parent) = to.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    BuildError::WriteError(format!("{}: {}", parent.display(), e))
                })?;
            }

            fs::rename(&from, &to).map_err(|e| {
                BuildError::WriteError(format!("{} -> {}: {}", from.display(), to.display(), e))
            })?;
            tracing::debug!("Moved {} to {}", from.display(), to.display());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fixture(root: &Path) -> PathBuf {
        let src = root.join("static");
        fs::create_dir_all(src.join("img")).unwrap();
        fs::write(src.join("favicon.ico"), "icon").unwrap();
        fs::write(src.join("style.css"), "body {}").unwrap();
        fs::write(src.join("img/logo.svg"), "<svg/>").unwrap();
        src
    }

    #[test]
    fn copies_under_prefix() {
        let temp = tempdir().unwrap();
        let src = fixture(temp.path());
        let out = temp.path().join("dist");

        let copied = AssetPipeline::new(&src, &out, StaticOptions::default())
            .copy()
            .unwrap();

        assert_eq!(copied, 3);
        assert_eq!(
            fs::read_to_string(out.join("static/style.css")).unwrap(),
            "body {}"
        );
        assert!(out.join("static/img/logo.svg").exists());
    }

    #[test]
    fn hoists_favicon_to_root() {
        let temp = tempdir().unwrap();
        let src = fixture(temp.path());
        let out = temp.path().join("dist");

        AssetPipeline::new(&src, &out, StaticOptions::default())
            .copy()
            .unwrap();

        assert_eq!(fs::read_to_string(out.join("favicon.ico")).unwrap(), "icon");
        assert!(!out.join("static/favicon.ico").exists());
        assert!(src.join("favicon.ico").exists());
    }

    #[test]
    fn empty_prefix_copies_into_root() {
        let temp = tempdir().unwrap();
        let src = fixture(temp.path());
        let out = temp.path().join("dist");

        let options = StaticOptions {
            prefix: PathBuf::new(),
            hoist: vec![],
        };
        AssetPipeline::new(&src, &out, options).copy().unwrap();

        assert!(out.join("style.css").exists());
        assert!(out.join("img/logo.svg").exists());
    }

    #[test]
    fn hoist_write_error_names_the_directory() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("static");
        let out = temp.path().join("dist");
        fs::create_dir_all(src.join("icons")).unwrap();
        fs::write(src.join("icons/favicon.ico"), "icon").unwrap();
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("icons"), "not a directory").unwrap();

        let options = StaticOptions {
            prefix: PathBuf::from("static"),
            hoist: vec!["icons/favicon.ico".to_string()],
        };
        let result = AssetPipeline::new(&src, &out, options).copy();

        let expected = out.join("icons").display().to_string();
        assert!(matches!(
            result,
            Err(BuildError::WriteError(ref message)) if message.starts_with(&expected)
        ));
    }

    #[test]
    fn missing_static_dir_copies_nothing() {
        let temp = tempdir().unwrap();
        let copied = AssetPipeline::new(
            &temp.path().join("static"),
            &temp.path().join("dist"),
            StaticOptions::default(),
        )
        .copy()
        .unwrap();

        assert_eq!(copied, 0);
    }
}
