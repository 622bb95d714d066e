//! Post-processors adjusting the aggregate configuration once a block's steps have run.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::asset_paths::join;
use crate::error::{BlockrevError, Result};
use crate::models::Block;
use crate::pipeline::context::{PostContext, TaskConfig};

/// Adjusts the whole aggregate configuration for one block.
pub trait PostProcessor {
  /// Name the post-processor is selected by in a flow.
  fn name(&self) -> &str;

  /// Update `config` for `block`.
  fn update_config(
    &self,
    context: &PostContext,
    block: &Block,
    config: &mut TaskConfig,
  ) -> Result<()>;
}

/// Points every module-loader optimizer task at a block's bootstrap module.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireJs;

const REQUIREJS: &str = "requirejs";

impl PostProcessor for RequireJs {
  fn name(&self) -> &str {
    REQUIREJS
  }

  fn update_config(
    &self,
    context: &PostContext,
    block: &Block,
    config: &mut TaskConfig,
  ) -> Result<()> {
    let Some(loader) = &block.loader else {
      return Ok(());
    };

    let tasks = config
      .entry(REQUIREJS)
      .or_insert_with(|| Value::Object(Map::new()))
      .as_object_mut()
      .ok_or_else(|| BlockrevError::config("`requirejs` configuration must be an object"))?;

    if tasks.is_empty() {
      tasks.insert("default".into(), Value::Object(Map::new()));
    }

    let out = join(&context.dest_dir, &block.dest);
    let base_url = current_dir_if_empty(join(&context.input_dir, &loader.base_url));
    let main_config_file = join(&context.input_dir, &loader.main_config_file);

    for (task, entry) in tasks.iter_mut() {
      let options = entry
        .as_object_mut()
        .map(|entry| {
          entry
            .entry("options")
            .or_insert_with(|| Value::Object(Map::new()))
        })
        .and_then(Value::as_object_mut)
        .ok_or_else(|| {
          BlockrevError::config(format!("`requirejs.{task}` must be an object with object options"))
        })?;

      options.insert("name".into(), Value::String(loader.name.clone()));
      options.insert("out".into(), Value::String(out.clone()));
      options
        .entry("baseUrl")
        .or_insert_with(|| Value::String(base_url.clone()));
      options
        .entry("mainConfigFile")
        .or_insert_with(|| Value::String(main_config_file.clone()));
    }

    Ok(())
  }
}

fn current_dir_if_empty(path: String) -> String {
  if path.is_empty() { ".".to_string() } else { path }
}

/// Adapter registering a closure as a post-processor.
pub struct PostFn<F> {
  name: String,
  update: F,
}

impl<F> PostFn<F>
where
  F: Fn(&PostContext, &Block, &mut TaskConfig) -> Result<()>,
{
  /// Wrap `update` under `name`.
  pub fn new(name: impl Into<String>, update: F) -> Self {
    Self {
      name: name.into(),
      update,
    }
  }
}

impl<F> fmt::Debug for PostFn<F> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PostFn").field("name", &self.name).finish()
  }
}

impl<F> PostProcessor for PostFn<F>
where
  F: Fn(&PostContext, &Block, &mut TaskConfig) -> Result<()>,
{
  fn name(&self) -> &str {
    &self.name
  }

  fn update_config(
    &self,
    context: &PostContext,
    block: &Block,
    config: &mut TaskConfig,
  ) -> Result<()> {
    (self.update)(context, block, config)
  }
}

/// Known post-processors by name.
#[derive(Clone)]
pub struct PostRegistry {
  processors: BTreeMap<String, Rc<dyn PostProcessor>>,
}

impl Default for PostRegistry {
  fn default() -> Self {
    let mut registry = Self::empty();
    registry.register(RequireJs);
    registry
  }
}

impl fmt::Debug for PostRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.processors.keys()).finish()
  }
}

impl PostRegistry {
  /// Registry without any post-processor.
  pub fn empty() -> Self {
    Self {
      processors: BTreeMap::new(),
    }
  }

  /// Add `processor`, replacing any registered under its name.
  pub fn register<P: PostProcessor + 'static>(&mut self, processor: P) -> &mut Self {
    self
      .processors
      .insert(processor.name().to_string(), Rc::new(processor));
    self
  }

  /// Look up one post-processor.
  pub fn get(&self, name: &str) -> Option<Rc<dyn PostProcessor>> {
    self.processors.get(name).cloned()
  }

  /// Resolve a flow's post-processor names, in order.
  pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Rc<dyn PostProcessor>>> {
    names
      .iter()
      .map(|name| {
        let name = name.as_ref();
        self
          .get(name)
          .ok_or_else(|| BlockrevError::UnknownPostProcessor(name.to_string()))
      })
      .collect()
  }
}
