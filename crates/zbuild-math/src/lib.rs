//! LaTeX to MathML post-processing for rendered HTML.
//!
//! Finds math fragments delimited by `\[...\]` (block) and `\(...\)` (inline),
//! optionally `$$...$$` and `$...$`, and replaces each one with the markup produced
//! by a [`MathConverter`].

pub mod converter;
pub mod delimiters;
pub mod pass;

pub use converter::{Latex2MathmlConverter, MathConverter, MathError, MathMode};
pub use delimiters::Delimiter;
pub use pass::{MathOptions, MathPass, Rewrite};
