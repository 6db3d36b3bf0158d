//! The math substitution pass over rendered HTML.

use std::fs;
use std::path::Path;

use crate::converter::{Latex2MathmlConverter, MathConverter, MathError, MathMode};
use crate::delimiters::Delimiter;

/// Options controlling which delimiters are recognised.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathOptions {
    /// Also convert `$$...$$` and `$...$` fragments
    pub dollar_delimiters: bool,
}

/// Result of rewriting a piece of HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Rewritten HTML
    pub html: String,

    /// Number of fragments replaced
    pub fragments: usize,
}

/// Rewrites math fragments in HTML using a [`MathConverter`].
pub struct MathPass {
    converter: Box<dyn MathConverter>,
    options: MathOptions,
}

impl MathPass {
    /// Create a pass backed by `latex2mathml`.
    pub fn new(options: MathOptions) -> Self {
        Self::with_converter(Latex2MathmlConverter::new(), options)
    }

    /// Create a pass with a custom converter.
    pub fn with_converter(converter: impl MathConverter + 'static, options: MathOptions) -> Self {
        Self {
            converter: Box::new(converter),
            options,
        }
    }

    /// Delimiters in the order their sweeps run: block styles before inline styles.
    pub fn delimiters(&self) -> Vec<Delimiter> {
        if self.options.dollar_delimiters {
            vec![
                Delimiter::DoubleDollar,
                Delimiter::Brackets,
                Delimiter::Dollar,
                Delimiter::Parens,
            ]
        } else {
            vec![Delimiter::Brackets, Delimiter::Parens]
        }
    }

    /// Rewrite every math fragment in `html`.
    ///
    /// Each delimiter gets one left-to-right sweep over the output of the previous
    /// one. The first converter error aborts the whole rewrite.
    pub fn rewrite(&self, html: &str) -> Result<Rewrite, MathError> {
        let mut current = html.to_string();
        let mut fragments = 0;

        for delimiter in self.delimiters() {
            let (next, count) = self.sweep(&current, delimiter)?;
            current = next;
            fragments += count;
        }

        Ok(Rewrite {
            html: current,
            fragments,
        })
    }

    /// Rewrite an HTML file in place. The file is only written when something changed.
    ///
    /// Returns the number of fragments replaced.
    pub fn apply_to_file(&self, path: &Path) -> Result<usize, MathError> {
        let html = fs::read_to_string(path).map_err(|source| MathError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let rewrite = self.rewrite(&html)?;

        if rewrite.fragments > 0 {
            fs::write(path, &rewrite.html).map_err(|source| MathError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::debug!(
                "Converted {} math fragments in {} with {}",
                rewrite.fragments,
                path.display(),
                self.converter.name()
            );
        }

        Ok(rewrite.fragments)
    }

    fn sweep(&self, text: &str, delimiter: Delimiter) -> Result<(String, usize), MathError> {
        let spans = delimiter.find_spans(text);
        if spans.is_empty() {
            return Ok((text.to_string(), 0));
        }

        let mode = delimiter.mode();
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for span in &spans {
            out.push_str(&text[last..span.outer.start]);

            let markup = self
                .converter
                .convert(text[span.body.clone()].trim(), mode)?;

            match mode {
                MathMode::Block => {
                    out.push_str("<div class=\"math-block\">");
                    out.push_str(&markup);
                    out.push_str("</div>");
                }
                MathMode::Inline => out.push_str(&markup),
            }

            last = span.outer.end;
        }

        out.push_str(&text[last..]);

        Ok((out, spans.len()))
    }
}
