//! Turns the blocks of a document into staged build-step configuration.

use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::asset_paths::join;
use crate::document::Document;
use crate::error::Result;
use crate::models::Block;
use crate::pipeline::context::{PipelineContext, PostContext, TaskConfig};
use crate::pipeline::flow::Flow;
use crate::pipeline::merge::deep_merge;
use crate::pipeline::post::{PostProcessor, PostRegistry};
use crate::pipeline::steps::{StepConfigurator, StepRegistry};

/// Root directories of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDirs {
  /// Directory block sources are read from.
  pub input: String,
  /// Directory the final step writes into.
  pub dest: String,
  /// Directory intermediate steps write under, one subdirectory per step.
  pub staging: String,
}

impl Default for ConfigDirs {
  fn default() -> Self {
    Self {
      input: String::new(),
      dest: "dist".into(),
      staging: ".tmp".into(),
    }
  }
}

/// Chains step configurators for each block and runs post-processors over the result.
pub struct ConfigWriter {
  steps: Vec<Rc<dyn StepConfigurator>>,
  post: Vec<Rc<dyn PostProcessor>>,
  dirs: ConfigDirs,
}

impl std::fmt::Debug for ConfigWriter {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ConfigWriter")
      .field("steps", &self.step_names())
      .field("post", &self.post_names())
      .field("dirs", &self.dirs)
      .finish()
  }
}

impl ConfigWriter {
  /// Writer running `steps` in order, then `post` for every block.
  pub fn new(
    steps: Vec<Rc<dyn StepConfigurator>>,
    post: Vec<Rc<dyn PostProcessor>>,
    dirs: ConfigDirs,
  ) -> Self {
    Self { steps, post, dirs }
  }

  /// Writer for a named flow, resolving its names through the registries.
  pub fn from_flow(
    flow: &Flow,
    steps: &StepRegistry,
    post: &PostRegistry,
    dirs: ConfigDirs,
  ) -> Result<Self> {
    Ok(Self::new(
      steps.resolve(&flow.steps)?,
      post.resolve(&flow.post)?,
      dirs,
    ))
  }

  /// Names of the configured steps, in order.
  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|step| step.name()).collect()
  }

  /// Names of the configured post-processors, in order.
  pub fn post_names(&self) -> Vec<&str> {
    self.post.iter().map(|post| post.name()).collect()
  }

  /// Root directories in use.
  pub fn dirs(&self) -> &ConfigDirs {
    &self.dirs
  }

  /// Merge the configuration of every block of `document` into `existing`.
  ///
  /// Keys already present in `existing` survive unless a fragment writes the same output.
  pub fn process(&self, document: &Document, existing: Option<TaskConfig>) -> Result<TaskConfig> {
    let mut config = existing.unwrap_or_default();

    for block in document.blocks() {
      self.process_block(block, &mut config)?;
    }

    Ok(config)
  }

  fn process_block(&self, block: &Block, config: &mut TaskConfig) -> Result<()> {
    let in_dir = match block.search_paths.first() {
      Some(alternate) => join(&self.dirs.input, alternate),
      None => self.dirs.input.clone(),
    };
    let mut context = PipelineContext::new(in_dir.clone(), block.src.clone());

    for (index, step) in self.steps.iter().enumerate() {
      context.last = index + 1 == self.steps.len();
      context.out_dir = if context.last {
        self.dirs.dest.clone()
      } else {
        join(&self.dirs.staging, step.name())
      };

      let fragment = step.create_config(&mut context, block);
      debug!(step = step.name(), dest = %block.dest, outputs = fragment.len(), "configured step");

      let target = config
        .entry(step.name())
        .or_insert_with(|| Value::Object(Map::new()));
      deep_merge(target, serde_json::to_value(fragment)?);

      context.advance();
    }

    let post_context = PostContext {
      input_dir: in_dir,
      dest_dir: self.dirs.dest.clone(),
    };
    for post in &self.post {
      post.update_config(&post_context, block, config)?;
    }

    Ok(())
  }
}
