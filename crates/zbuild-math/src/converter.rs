//! Converter seam between the math pass and a LaTeX backend.

use std::path::PathBuf;

use latex2mathml::{latex_to_mathml, DisplayStyle};

/// How a fragment is laid out in the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathMode {
    /// Display math on its own line (`\[...\]`, `$$...$$`)
    Block,

    /// Math inside running text (`\(...\)`, `$...$`)
    Inline,
}

/// Errors that can occur while rewriting math.
#[derive(Debug, thiserror::Error)]
pub enum MathError {
    #[error("Failed to convert LaTeX `{latex}`: {message}")]
    Convert { latex: String, message: String },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Trait for LaTeX to markup converters.
pub trait MathConverter: Send + Sync {
    /// Converter identifier, used in logs
    fn name(&self) -> &'static str;

    /// Convert a stripped LaTeX body into markup.
    ///
    /// # Arguments
    /// * `latex` - The fragment body, without delimiters and surrounding whitespace
    /// * `mode` - Whether the fragment came from a block or inline delimiter
    fn convert(&self, latex: &str, mode: MathMode) -> Result<String, MathError>;
}

/// Converter backed by the `latex2mathml` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latex2MathmlConverter;

impl Latex2MathmlConverter {
    pub fn new() -> Self {
        Self
    }
}

impl MathConverter for Latex2MathmlConverter {
    fn name(&self) -> &'static str {
        "latex2mathml"
    }

    fn convert(&self, latex: &str, mode: MathMode) -> Result<String, MathError> {
        let style = match mode {
            MathMode::Block => DisplayStyle::Block,
            MathMode::Inline => DisplayStyle::Inline,
        };

        latex_to_mathml(latex, style).map_err(|e| MathError::Convert {
            latex: latex.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_simple_expression() {
        let mathml = Latex2MathmlConverter::new()
            .convert("E=mc^2", MathMode::Inline)
            .unwrap();

        assert!(mathml.starts_with("<math"));
        assert!(mathml.ends_with("</math>"));
        assert!(mathml.contains("<mi>E</mi>"));
    }

    #[test]
    fn block_mode_marks_display() {
        let mathml = Latex2MathmlConverter::new()
            .convert("x", MathMode::Block)
            .unwrap();

        assert!(mathml.contains("display=\"block\""));
    }
}
