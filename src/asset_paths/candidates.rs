//! Revved file name conventions and selection among listed candidates.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::asset_paths::paths::{basename, dirname, join, normalize};
use crate::error::Result;

/// Where the content hash sits in a revved file name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RevConvention {
  /// `<hash>.<name>`, e.g. `11916fba.image.png`.
  #[default]
  Prefix,
  /// `<stem>.<hash>.<ext>`, e.g. `image.11916fba.png`.
  Suffix,
  /// Accept either convention, prefix first.
  Either,
}

/// How to pick one candidate when the lister returns several for one search path.
///
/// Disambiguation compares the candidate's directory with the reference's own sub-path under
/// the search path. It is a heuristic: a lister that returns files from unrelated directories
/// can still produce surprising picks under [`CandidateSelection::PreferExactDirectory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CandidateSelection {
  /// Only a candidate living exactly in `search_path/<reference dir>` is accepted.
  #[default]
  ExactDirectory,
  /// Prefer the exact directory, otherwise fall back to the first revved candidate.
  PreferExactDirectory,
}

/// Glob patterns and validation regexes describing the revved forms of one file name.
#[derive(Debug, Clone)]
pub struct RevvedPattern {
  globs: Vec<String>,
  matchers: Vec<Regex>,
}

impl RevvedPattern {
  /// Build the revved forms of `file_name` under the given convention.
  pub fn new(file_name: &str, convention: RevConvention) -> Result<Self> {
    let (stem, ext) = match file_name.rfind('.') {
      Some(idx) if idx > 0 => (&file_name[..idx], &file_name[idx..]),
      _ => (file_name, ""),
    };

    let mut globs = Vec::new();
    let mut matchers = Vec::new();

    if matches!(convention, RevConvention::Prefix | RevConvention::Either) {
      globs.push(format!("*.{}", escape_glob(file_name)));
      matchers.push(Regex::new(&format!(
        r"^[0-9A-Za-z_\-]+\.{}$",
        regex::escape(file_name)
      ))?);
    }

    if matches!(convention, RevConvention::Suffix | RevConvention::Either) {
      globs.push(format!("{}.*{}", escape_glob(stem), escape_glob(ext)));
      matchers.push(Regex::new(&format!(
        r"^{}\.[0-9A-Za-z_\-]+{}$",
        regex::escape(stem),
        regex::escape(ext)
      ))?);
    }

    Ok(Self { globs, matchers })
  }

  /// Glob patterns scoped to `dir` (empty for the current directory).
  pub fn globs_in(&self, dir: &str) -> Vec<String> {
    self
      .globs
      .iter()
      .map(|glob| {
        if dir.is_empty() {
          glob.clone()
        } else {
          format!("{}/{}", escape_glob(dir), glob)
        }
      })
      .collect()
  }

  /// Whether `file_name` is a revved form of the original file name.
  pub fn matches(&self, file_name: &str) -> bool {
    self.matchers.iter().any(|matcher| matcher.is_match(file_name))
  }
}

/// Directory a revved counterpart of `reference` is expected in under `search_path`.
pub fn expected_directory(search_path: &str, reference: &str) -> String {
  join(search_path, dirname(reference))
}

/// Pick the revved candidate for one search path, returning its normalised path.
pub fn select_candidate(
  candidates: &[String],
  pattern: &RevvedPattern,
  expected_dir: &str,
  selection: CandidateSelection,
) -> Option<String> {
  let mut fallback = None;

  for candidate in candidates {
    let normalized = normalize(candidate);
    if !pattern.matches(basename(&normalized)) {
      continue;
    }

    if dirname(&normalized) == expected_dir {
      return Some(normalized);
    }

    if fallback.is_none() {
      fallback = Some(normalized);
    }
  }

  match selection {
    CandidateSelection::ExactDirectory => None,
    CandidateSelection::PreferExactDirectory => fallback,
  }
}

fn escape_glob(value: &str) -> String {
  let mut escaped = String::with_capacity(value.len());
  for c in value.chars() {
    match c {
      '*' | '?' | '[' | ']' => {
        escaped.push('[');
        escaped.push(c);
        escaped.push(']');
      }
      _ => escaped.push(c),
    }
  }
  escaped
}
