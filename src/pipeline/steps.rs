//! Step configurators: each turns a block into the configuration fragment of one build step.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::asset_paths::join;
use crate::error::{BlockrevError, Result};
use crate::models::Block;
use crate::pipeline::context::{PipelineContext, StepFragment};

/// Produces the configuration fragment of one named build step.
pub trait StepConfigurator {
  /// Task name the fragment is merged under.
  fn name(&self) -> &str;

  /// Build the fragment for `block` and record the produced files in `context.out_files`.
  fn create_config(&self, context: &mut PipelineContext, block: &Block) -> StepFragment;
}

/// Collapse every input into the block destination under `out_dir`.
fn collapse(context: &mut PipelineContext, block: &Block) -> StepFragment {
  let output = join(&context.out_dir, &block.dest);
  let inputs = context
    .in_files
    .iter()
    .map(|file| join(&context.in_dir, file))
    .collect();
  context.out_files = vec![block.dest.clone()];
  BTreeMap::from([(output, inputs)])
}

/// Concatenation: always collapses the inputs into the block destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct Concat;

impl StepConfigurator for Concat {
  fn name(&self) -> &str {
    "concat"
  }

  fn create_config(&self, context: &mut PipelineContext, block: &Block) -> StepFragment {
    collapse(context, block)
  }
}

/// A per-file transformation (minifiers): one output per input, collapsing when last.
#[derive(Debug, Clone)]
pub struct PassThrough {
  name: String,
}

impl PassThrough {
  /// Pass-through step registered under `name`.
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into() }
  }
}

impl StepConfigurator for PassThrough {
  fn name(&self) -> &str {
    &self.name
  }

  fn create_config(&self, context: &mut PipelineContext, block: &Block) -> StepFragment {
    if context.last {
      return collapse(context, block);
    }

    let fragment = context
      .in_files
      .iter()
      .map(|file| {
        (
          join(&context.out_dir, file),
          vec![join(&context.in_dir, file)],
        )
      })
      .collect();
    context.out_files = context.in_files.clone();
    fragment
  }
}

/// Adapter registering a closure as a step.
pub struct StepFn<F> {
  name: String,
  create: F,
}

impl<F> StepFn<F>
where
  F: Fn(&mut PipelineContext, &Block) -> StepFragment,
{
  /// Wrap `create` under `name`.
  pub fn new(name: impl Into<String>, create: F) -> Self {
    Self {
      name: name.into(),
      create,
    }
  }
}

impl<F> fmt::Debug for StepFn<F> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StepFn").field("name", &self.name).finish()
  }
}

impl<F> StepConfigurator for StepFn<F>
where
  F: Fn(&mut PipelineContext, &Block) -> StepFragment,
{
  fn name(&self) -> &str {
    &self.name
  }

  fn create_config(&self, context: &mut PipelineContext, block: &Block) -> StepFragment {
    (self.create)(context, block)
  }
}

/// Known steps by name: the built-ins plus whatever the caller registers.
#[derive(Clone)]
pub struct StepRegistry {
  steps: BTreeMap<String, Rc<dyn StepConfigurator>>,
}

impl Default for StepRegistry {
  fn default() -> Self {
    let mut registry = Self::empty();
    registry.register(Concat);
    registry.register(PassThrough::new("uglifyjs"));
    registry.register(PassThrough::new("cssmin"));
    registry
  }
}

impl fmt::Debug for StepRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.steps.keys()).finish()
  }
}

impl StepRegistry {
  /// Registry without any step, built-ins included.
  pub fn empty() -> Self {
    Self {
      steps: BTreeMap::new(),
    }
  }

  /// Add `step`, replacing any step already registered under its name.
  pub fn register<S: StepConfigurator + 'static>(&mut self, step: S) -> &mut Self {
    self.steps.insert(step.name().to_string(), Rc::new(step));
    self
  }

  /// Look up one step.
  pub fn get(&self, name: &str) -> Option<Rc<dyn StepConfigurator>> {
    self.steps.get(name).cloned()
  }

  /// Resolve a flow's step names, in order.
  pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Rc<dyn StepConfigurator>>> {
    names
      .iter()
      .map(|name| {
        let name = name.as_ref();
        self
          .get(name)
          .ok_or_else(|| BlockrevError::UnknownStep(name.to_string()))
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::BlockKind;

  fn site_block() -> Block {
    let mut block = Block::new(BlockKind::Js, "scripts/site.js", "    ");
    block.src = vec!["foo.js".into(), "bar.js".into(), "baz.js".into()];
    block
  }

  fn context(in_dir: &str, out_dir: &str, last: bool) -> PipelineContext {
    let mut context = PipelineContext::new(in_dir, site_block().src);
    context.out_dir = out_dir.into();
    context.last = last;
    context
  }

  #[test]
  fn concat_collapses_into_destination() {
    let mut ctx = context(".", "tmp/concat", false);
    let fragment = Concat.create_config(&mut ctx, &site_block());
    assert_eq!(Concat.name(), "concat");
    assert_eq!(
      fragment["tmp/concat/scripts/site.js"],
      vec!["foo.js", "bar.js", "baz.js"]
    );
    assert_eq!(ctx.out_files, vec!["scripts/site.js"]);
  }

  #[test]
  fn pass_through_maps_each_file() {
    let step = PassThrough::new("uglifyjs");
    let mut ctx = context("zzz", "tmp/uglifyjs", false);
    let fragment = step.create_config(&mut ctx, &site_block());
    assert_eq!(fragment.len(), 3);
    assert_eq!(fragment["tmp/uglifyjs/foo.js"], vec!["zzz/foo.js"]);
    assert_eq!(fragment["tmp/uglifyjs/bar.js"], vec!["zzz/bar.js"]);
    assert_eq!(fragment["tmp/uglifyjs/baz.js"], vec!["zzz/baz.js"]);
    assert_eq!(ctx.out_files, vec!["foo.js", "bar.js", "baz.js"]);
  }

  #[test]
  fn pass_through_collapses_when_last() {
    let step = PassThrough::new("uglifyjs");
    let mut ctx = context("zzz", "dist", true);
    let fragment = step.create_config(&mut ctx, &site_block());
    assert_eq!(
      fragment["dist/scripts/site.js"],
      vec!["zzz/foo.js", "zzz/bar.js", "zzz/baz.js"]
    );
    assert_eq!(ctx.out_files, vec!["scripts/site.js"]);
  }

  #[test]
  fn registry_resolves_builtins_and_custom_steps() {
    let mut registry = StepRegistry::default();
    registry.register(StepFn::new("copy", |ctx: &mut PipelineContext, _: &Block| {
      ctx.out_files = ctx.in_files.clone();
      StepFragment::new()
    }));

    let steps = registry.resolve(&["concat", "cssmin", "copy"]).unwrap();
    let names: Vec<&str> = steps.iter().map(|step| step.name()).collect();
    assert_eq!(names, vec!["concat", "cssmin", "copy"]);
  }

  #[test]
  fn registry_rejects_unknown_steps() {
    let err = StepRegistry::default().resolve(&["concat", "nope"]).err().unwrap();
    assert!(matches!(err, BlockrevError::UnknownStep(name) if name == "nope"));
  }
}
