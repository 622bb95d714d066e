//! Which steps and post-processors run for a target.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Ordered step names followed by post-processor names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Flow {
  /// Step names, first to last.
  pub steps: Vec<String>,
  /// Post-processor names, run once per block after the steps.
  pub post: Vec<String>,
}

impl Default for Flow {
  fn default() -> Self {
    Self {
      steps: vec!["concat".into(), "uglifyjs".into()],
      post: vec!["requirejs".into()],
    }
  }
}

/// Flow configuration: one global flow, per-target flows, or both.
///
/// ```json
/// { "steps": ["concat"], "post": [], "html": { "steps": ["concat", "uglifyjs"] } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FlowOptions {
  /// Global step names.
  pub steps: Option<Vec<String>>,
  /// Global post-processor names.
  pub post: Option<Vec<String>>,
  /// Flows keyed by target name.
  #[serde(flatten)]
  pub targets: BTreeMap<String, Flow>,
}

impl FlowOptions {
  /// Flow for `target`: its own entry first, then the global flow, then the default one.
  ///
  /// Fields left out of a configured flow keep their default value.
  pub fn for_target(&self, target: Option<&str>) -> Flow {
    if let Some(flow) = target.and_then(|target| self.targets.get(target)) {
      return flow.clone();
    }

    let defaults = Flow::default();
    Flow {
      steps: self.steps.clone().unwrap_or(defaults.steps),
      post: self.post.clone().unwrap_or(defaults.post),
    }
  }
}
