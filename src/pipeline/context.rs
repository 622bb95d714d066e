//! State threaded through the steps of one block's pipeline.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Aggregate configuration keyed by task name.
pub type TaskConfig = Map<String, Value>;

/// Configuration fragment of one step: output path to its ordered inputs.
pub type StepFragment = BTreeMap<String, Vec<String>>;

/// Inputs and outputs of the step currently being configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineContext {
  /// Directory the input files are relative to.
  pub in_dir: String,
  /// Files consumed by the step, relative to `in_dir`.
  pub in_files: Vec<String>,
  /// Directory the step writes into.
  pub out_dir: String,
  /// Files produced by the step, relative to `out_dir`. Set by the step.
  pub out_files: Vec<String>,
  /// Whether the step is the final one of the flow.
  pub last: bool,
}

impl PipelineContext {
  /// Context for the first step of a block.
  pub fn new(in_dir: impl Into<String>, in_files: Vec<String>) -> Self {
    Self {
      in_dir: in_dir.into(),
      in_files,
      ..Self::default()
    }
  }

  /// Feed this step's outputs to the next step.
  pub fn advance(&mut self) {
    self.in_files = std::mem::take(&mut self.out_files);
    self.in_dir = std::mem::take(&mut self.out_dir);
    self.last = false;
  }
}

/// Directories handed to post-processors once a block's chain has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContext {
  /// Directory the block's sources were read from.
  pub input_dir: String,
  /// Final destination root.
  pub dest_dir: String,
}
