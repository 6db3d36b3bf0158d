//! Static site builder for zbuild.
//!
//! Renders a template directory with JSON side data, rewrites embedded LaTeX as
//! MathML, copies static assets and syncs git submodules into the output tree.

pub mod assets;
pub mod builder;
pub mod data;
pub mod submodules;
pub mod templates;

pub use assets::{AssetPipeline, StaticOptions};
pub use builder::{BuildConfig, BuildError, BuildMode, BuildResult, SiteBuilder};
pub use data::{chunk_arrays, load_data, DataMap};
pub use submodules::{BuildManifest, SubmoduleConfig, SubmoduleSync};
pub use templates::TemplateRenderer;
pub use zbuild_math::MathOptions;
