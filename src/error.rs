//! Error types shared by the parser, resolver, rewriter and pipeline writer.

use std::path::PathBuf;

/// Top-level error type for all blockrev operations.
#[derive(Debug, thiserror::Error)]
pub enum BlockrevError {
  /// A required constructor parameter was not furnished.
  #[error("missing parameter: {0}")]
  MissingParameter(&'static str),

  /// The requested built-in pattern catalog does not exist.
  #[error("unsupported pattern: {0}")]
  UnsupportedPattern(String),

  /// Malformed or unterminated build block markup.
  #[error("parse error at line {line}: {message}")]
  Parse {
    /// 1-based line the problem was found on.
    line: usize,
    /// Description of the problem.
    message: String,
  },

  /// Configuration loading or validation error.
  #[error("config error: {message}")]
  Config {
    /// Description of the problem.
    message: String,
  },

  /// A flow referenced a step that is not registered.
  #[error("unknown step: {0}")]
  UnknownStep(String),

  /// A flow referenced a post-processor that is not registered.
  #[error("unknown post-processor: {0}")]
  UnknownPostProcessor(String),

  /// Filesystem I/O error.
  #[error("I/O error at {path:?}: {source}")]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },

  /// JSON (de)serialisation error.
  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  /// YAML deserialisation error.
  #[error("YAML error: {0}")]
  Yaml(#[from] serde_yaml::Error),

  /// Invalid glob pattern handed to the candidate lister.
  #[error("glob error: {0}")]
  Glob(#[from] glob::PatternError),

  /// Invalid custom reference pattern.
  #[error("regex error: {0}")]
  Regex(#[from] regex::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BlockrevError>;

impl BlockrevError {
  /// Create a parse error for the given 1-based line.
  pub fn parse(line: usize, msg: impl Into<String>) -> Self {
    Self::Parse {
      line,
      message: msg.into(),
    }
  }

  /// Create a config error from any displayable message.
  pub fn config(msg: impl Into<String>) -> Self {
    Self::Config {
      message: msg.into(),
    }
  }

  /// Wrap a `std::io::Error` with a path for context.
  pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }
}
