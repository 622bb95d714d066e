//! Locate the revved (content-hashed) counterpart of an asset reference.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{trace, warn};

use crate::asset_paths::{
  CandidateSelection, RevConvention, RevvedPattern, basename, expected_directory, join,
  replace_file_name, select_candidate, should_ignore_asset_reference,
};
use crate::error::{BlockrevError, Result};

/// Callback listing the files on disk matching one glob pattern.
pub type CandidateLister = Box<dyn Fn(&str) -> Vec<String>>;

/// Where revved file names come from.
pub enum RevvedSource {
  /// Explicit table from `search_path/reference` to its revved path.
  Mapping(BTreeMap<String, String>),
  /// Glob-based lookup, invoked fresh for every reference.
  Lister(CandidateLister),
}

impl fmt::Debug for RevvedSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Mapping(mapping) => f.debug_tuple("Mapping").field(mapping).finish(),
      Self::Lister(_) => f.write_str("Lister(..)"),
    }
  }
}

/// Resolver mapping references to their revved counterparts.
#[derive(Debug)]
pub struct RevvedFinder {
  source: RevvedSource,
  convention: RevConvention,
  selection: CandidateSelection,
}

impl RevvedFinder {
  /// Resolver backed by a candidate lister (usually a filesystem glob).
  pub fn with_lister<F>(lister: F) -> Self
  where
    F: Fn(&str) -> Vec<String> + 'static,
  {
    Self::from_source(RevvedSource::Lister(Box::new(lister)))
  }

  /// Resolver backed by an explicit `source -> revved` table.
  pub fn with_mapping(mapping: BTreeMap<String, String>) -> Self {
    Self::from_source(RevvedSource::Mapping(mapping))
  }

  /// Build a resolver from optional parts, preferring the mapping when both are present.
  pub fn from_options(
    mapping: Option<BTreeMap<String, String>>,
    lister: Option<CandidateLister>,
  ) -> Result<Self> {
    match (mapping, lister) {
      (Some(mapping), _) => Ok(Self::with_mapping(mapping)),
      (None, Some(lister)) => Ok(Self::from_source(RevvedSource::Lister(lister))),
      (None, None) => Err(BlockrevError::MissingParameter("finder")),
    }
  }

  fn from_source(source: RevvedSource) -> Self {
    Self {
      source,
      convention: RevConvention::default(),
      selection: CandidateSelection::default(),
    }
  }

  /// Override the revved naming convention.
  pub fn with_convention(mut self, convention: RevConvention) -> Self {
    self.convention = convention;
    self
  }

  /// Override how several candidates for one search path are disambiguated.
  pub fn with_selection(mut self, selection: CandidateSelection) -> Self {
    self.selection = selection;
    self
  }

  /// Resolve `reference` against `search_paths`, returning it unchanged when nothing matches.
  ///
  /// Only the final file name segment is substituted, so a leading `/`, leading `../`
  /// segments and the authored directory are all preserved.
  pub fn find<S: AsRef<str>>(&self, reference: &str, search_paths: &[S]) -> String {
    if should_ignore_asset_reference(reference) {
      return reference.to_string();
    }

    let (path, suffix) = split_query(reference);
    if path.is_empty() || path.ends_with('/') {
      return reference.to_string();
    }

    let current = [""];
    let roots: Vec<&str> = if search_paths.is_empty() {
      current.to_vec()
    } else {
      search_paths.iter().map(|value| value.as_ref()).collect()
    };

    let revved = match &self.source {
      RevvedSource::Mapping(mapping) => roots
        .iter()
        .find_map(|root| mapping.get(&join(root, path)))
        .map(|found| basename(found).to_string()),
      RevvedSource::Lister(lister) => self.find_with_lister(lister, path, &roots),
    };

    match revved {
      Some(file_name) => {
        let resolved = format!("{}{}", replace_file_name(path, &file_name), suffix);
        trace!(%reference, %resolved, "resolved revved reference");
        resolved
      }
      None => reference.to_string(),
    }
  }

  fn find_with_lister(&self, lister: &CandidateLister, path: &str, roots: &[&str]) -> Option<String> {
    let pattern = match RevvedPattern::new(basename(path), self.convention) {
      Ok(pattern) => pattern,
      Err(err) => {
        warn!(%path, error = %err, "could not build revved pattern");
        return None;
      }
    };

    for root in roots {
      let expected = expected_directory(root, path);
      let candidates: Vec<String> = pattern
        .globs_in(&expected)
        .iter()
        .flat_map(|glob| lister(glob.as_str()))
        .collect();

      if let Some(found) = select_candidate(&candidates, &pattern, &expected, self.selection) {
        return Some(basename(&found).to_string());
      }
    }

    None
  }
}

/// Split a trailing `?query` or `#fragment` off a reference.
fn split_query(reference: &str) -> (&str, &str) {
  match reference.find(['?', '#']) {
    Some(idx) => reference.split_at(idx),
    None => (reference, ""),
  }
}
