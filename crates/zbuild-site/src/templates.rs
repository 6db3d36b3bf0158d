//! Template rendering with minijinja.

use std::fs;
use std::path::{Component, Path, PathBuf};

use minijinja::{context, path_loader, Environment, Value};
use walkdir::WalkDir;

use crate::builder::BuildError;
use crate::data::DataMap;

/// Renders a template directory into a mirrored output tree.
///
/// Templates see every data entry as a global. Any path component starting with
/// `_` marks a partial, which can be included or extended but is never rendered on
/// its own. Components starting with `.` are ignored entirely.
pub struct TemplateRenderer {
    env: Environment<'static>,
    source_dir: PathBuf,
}

impl TemplateRenderer {
    /// Create a renderer for `source_dir` with `data` as template globals.
    pub fn new(source_dir: &Path, data: &DataMap) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(source_dir));

        for (key, value) in data {
            env.add_global(key.clone(), Value::from_serialize(value));
        }

        Self {
            env,
            source_dir: source_dir.to_path_buf(),
        }
    }

    /// Names of all renderable templates, relative to the source dir, `/` separated.
    pub fn template_names(&self) -> Result<Vec<String>, BuildError> {
        if !self.source_dir.exists() {
            return Err(BuildError::ReadError(format!(
                "{}: template directory not found",
                self.source_dir.display()
            )));
        }

        let mut names = Vec::new();

        for entry in WalkDir::new(&self.source_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.source_dir)
                .unwrap_or(entry.path());

            if let Some(name) = template_name(relative) {
                names.push(name);
            }
        }

        Ok(names)
    }

    /// Render a single template by name.
    pub fn render(&self, name: &str) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(name)?;
        tmpl.render(context! {})
    }

    /// Render every template into `output_dir`, returning the written paths.
    pub fn render_all(&self, output_dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
        let mut written = Vec::new();

        for name in self.template_names()? {
            let html = self
                .render(&name)
                .map_err(|e: minijinja::Error| BuildError::TemplateError {
                    name: name.clone(),
                    message: format!("{:#}", e),
                })?;

            let output_path = output_dir.join(&name);

            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    BuildError::WriteError(format!("{}: {}", parent.display(), e))
                })?;
            }

            fs::write(&output_path, html).map_err(|e| {
                BuildError::WriteError(format!("{}: {}", output_path.display(), e))
            })?;

            tracing::debug!("Rendered {} -> {}", name, output_path.display());
            written.push(output_path);
        }

        Ok(written)
    }
}

/// Loader name for a template path, or `None` for partials and ignored files.
fn template_name(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();

    for component in relative.components() {
        let Component::Normal(part) = component else {
            return None;
        };
        let part = part.to_str()?;
        if part.starts_with('_') || part.starts_with('.') {
            return None;
        }
        parts.push(part);
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
