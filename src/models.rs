//! Data structures produced by the block parser and consumed by the rewriter and pipeline.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Kind of asset a build block collapses into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
  /// `build:js` blocks, replaced by a script tag.
  Js,
  /// `build:css` blocks, replaced by a stylesheet link.
  Css,
}

impl BlockKind {
  /// Parse the marker type token (`js` or `css`).
  pub fn from_marker(value: &str) -> Option<Self> {
    match value {
      "js" => Some(Self::Js),
      "css" => Some(Self::Css),
      _ => None,
    }
  }

  /// Marker token for this kind.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Js => "js",
      Self::Css => "css",
    }
  }
}

impl fmt::Display for BlockKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Deferred module-loader bootstrap found inside a script block (`data-main`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderDescriptor {
  /// Entry module name: basename of the bootstrap path without `.js`.
  pub name: String,
  /// Directory portion of the bootstrap path, `.` when it has none.
  pub base_url: String,
  /// Bootstrap module file (`base_url/name.js`).
  pub main_config_file: String,
  /// Destination of the enclosing block.
  pub dest: String,
  /// The loader runtime script as authored in the tag's `src`.
  pub runtime_src: String,
  /// Final location of the loader runtime referenced by the replacement tag.
  pub runtime_dest: String,
}

/// Author-delimited span of markup declaring one output asset and its sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
  /// Kind declared by the open marker.
  pub kind: BlockKind,
  /// Destination path as authored.
  pub dest: String,
  /// Source references in document order.
  pub src: Vec<String>,
  /// Raw lines of the block, both markers and blank lines included.
  pub raw: Vec<String>,
  /// Leading whitespace of the open marker line.
  pub indent: String,
  /// Alternate search-path roots given in parentheses on the open marker.
  pub search_paths: Vec<String>,
  /// Loader descriptor when a script tag declared `data-main`.
  pub loader: Option<LoaderDescriptor>,
  /// Byte range of the raw span in the parsed content, without the final line terminator.
  pub span: Range<usize>,
}

impl Block {
  /// Create an empty block for the given marker values.
  pub fn new(kind: BlockKind, dest: impl Into<String>, indent: impl Into<String>) -> Self {
    Self {
      kind,
      dest: dest.into(),
      src: Vec::new(),
      raw: Vec::new(),
      indent: indent.into(),
      search_paths: Vec::new(),
      loader: None,
      span: 0..0,
    }
  }
}
