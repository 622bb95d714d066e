//! Documents carrying build blocks, parsed once and immutable afterwards.

mod parser;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::asset_paths::{dirname, normalize};
use crate::error::{BlockrevError, Result};
use crate::models::Block;

pub use parser::parse_blocks;

/// A markup file together with the build blocks found in it.
#[derive(Debug, Clone)]
pub struct Document {
  path: String,
  content: String,
  blocks: Vec<Block>,
}

impl Document {
  /// Parse in-memory content attributed to `path`.
  pub fn parse(path: impl Into<String>, content: impl Into<String>) -> Result<Self> {
    let path = normalize(&path.into());
    let content = content.into();
    let blocks = parse_blocks(&content).map_err(|err| match err {
      BlockrevError::Parse { line, message } => BlockrevError::Parse {
        line,
        message: format!("{path}: {message}"),
      },
      other => other,
    })?;

    debug!(%path, blocks = blocks.len(), "parsed document");
    Ok(Self {
      path,
      content,
      blocks,
    })
  }

  /// Read and parse a document from disk.
  pub fn from_path(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path).map_err(|err| BlockrevError::io(path, err))?;
    Self::parse(path.to_string_lossy(), content)
  }

  /// Path the document was loaded from, with forward slashes.
  pub fn path(&self) -> &str {
    &self.path
  }

  /// Directory containing the document, empty for a bare file name.
  pub fn dir(&self) -> &str {
    dirname(&self.path)
  }

  /// Original textual content.
  pub fn content(&self) -> &str {
    &self.content
  }

  /// Build blocks in source order.
  pub fn blocks(&self) -> &[Block] {
    &self.blocks
  }
}
