//! Development server for zbuild sites.
//!
//! Serves the output directory and, when watching, rebuilds the affected step
//! whenever templates, data or static assets change.

pub mod server;
pub mod watcher;

pub use server::{DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent, WatchRoots};
