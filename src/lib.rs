#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![allow(clippy::module_inception)]

pub mod asset_paths;
pub mod builder;
pub mod config;
pub mod document;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod revved;
pub mod rewrite;

pub use builder::{RewrittenFile, TaskBuilder};
pub use config::BlockrevConfig;
pub use document::Document;
pub use error::{BlockrevError, Result};
pub use models::{Block, BlockKind, LoaderDescriptor};
pub use pipeline::{ConfigDirs, ConfigWriter, TaskConfig};
pub use revved::RevvedFinder;
pub use rewrite::{FileProcessor, PatternCatalog};
