//! Discoverable configuration for the prepare and rewrite tasks.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::asset_paths::{CandidateSelection, RevConvention};
use crate::document::Document;
use crate::error::{BlockrevError, Result};
use crate::pipeline::{ConfigDirs, FlowOptions};
use crate::rewrite::CustomPattern;

/// File names searched for, in order, by [`BlockrevConfig::discover`].
pub const CONFIG_FILES: [&str; 3] = [
  "blockrev.config.json",
  "blockrev.config.yaml",
  "blockrev.config.yml",
];

/// Task configuration shared by `prepare` and `rewrite`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlockrevConfig {
  /// Destination root written by the final pipeline step.
  pub dest: String,
  /// Root for intermediate step outputs.
  pub staging: String,
  /// Directory block sources are relative to. Defaults to each document's own directory.
  pub input: Option<String>,
  /// Search paths for revved assets. Defaults to each document's own directory.
  #[serde(deserialize_with = "one_or_many")]
  pub assets_dirs: Option<Vec<String>>,
  /// Global and per-target flows.
  pub flow: FlowOptions,
  /// Extra reference patterns keyed by content type.
  pub patterns: BTreeMap<String, Vec<CustomPattern>>,
  /// Where the content hash sits in revved file names.
  pub rev_convention: RevConvention,
  /// Disambiguation of several revved candidates.
  pub candidate_selection: CandidateSelection,
  /// Explicit `source -> revved` table used instead of globbing the filesystem.
  pub mapping: Option<BTreeMap<String, String>>,
}

impl Default for BlockrevConfig {
  fn default() -> Self {
    Self {
      dest: "dist".into(),
      staging: ".tmp".into(),
      input: None,
      assets_dirs: None,
      flow: FlowOptions::default(),
      patterns: BTreeMap::new(),
      rev_convention: RevConvention::default(),
      candidate_selection: CandidateSelection::default(),
      mapping: None,
    }
  }
}

impl BlockrevConfig {
  /// Load the first configuration file found in `dir`.
  ///
  /// Missing files yield the defaults. Unreadable or invalid files are reported and also
  /// yield the defaults.
  pub fn discover(dir: &Path) -> Self {
    let Some(path) = Self::locate(dir) else {
      debug!(dir = %dir.display(), "no configuration file, using defaults");
      return Self::default();
    };

    match Self::from_path(&path) {
      Ok(config) => config,
      Err(err) => {
        warn!(path = %path.display(), error = %err, "ignoring unreadable configuration");
        Self::default()
      }
    }
  }

  /// First existing configuration file in `dir`.
  pub fn locate(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILES
      .iter()
      .map(|name| dir.join(name))
      .find(|path| path.is_file())
  }

  /// Read configuration from a JSON or YAML file, chosen by extension.
  pub fn from_path(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path).map_err(|err| BlockrevError::io(path, err))?;
    let yaml = matches!(
      path.extension().and_then(|ext| ext.to_str()),
      Some("yaml" | "yml")
    );

    let config = if yaml {
      serde_yaml::from_str(&content)?
    } else {
      serde_json::from_str(&content)?
    };
    Ok(config)
  }

  /// Pipeline roots for `document`.
  pub fn dirs_for(&self, document: &Document) -> ConfigDirs {
    ConfigDirs {
      input: self
        .input
        .clone()
        .unwrap_or_else(|| document.dir().to_string()),
      dest: self.dest.clone(),
      staging: self.staging.clone(),
    }
  }

  /// Revved asset search paths for `document`.
  pub fn search_paths_for(&self, document: &Document) -> Vec<String> {
    match &self.assets_dirs {
      Some(dirs) => dirs.clone(),
      None => vec![document.dir().to_string()],
    }
  }

  /// Custom patterns configured for `content_type`.
  pub fn patterns_for(&self, content_type: &str) -> &[CustomPattern] {
    self
      .patterns
      .get(content_type)
      .map(Vec::as_slice)
      .unwrap_or_default()
  }
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum OneOrMany {
    One(String),
    Many(Vec<String>),
  }

  Ok(
    Option::<OneOrMany>::deserialize(deserializer)?.map(|value| match value {
      OneOrMany::One(dir) => vec![dir],
      OneOrMany::Many(dirs) => dirs,
    }),
  )
}
