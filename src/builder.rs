//! Task layer: runs the prepare and rewrite tasks over documents on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::BlockrevConfig;
use crate::document::Document;
use crate::error::{BlockrevError, Result};
use crate::pipeline::{
  ConfigWriter, PostProcessor, PostRegistry, StepConfigurator, StepRegistry, TaskConfig,
};
use crate::revved::{CandidateLister, RevvedFinder};
use crate::rewrite::{FileProcessor, PatternCatalog};

/// Outcome of rewriting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenFile {
  /// Document path relative to the builder root.
  pub path: String,
  /// Whether the content differs from what was read.
  pub changed: bool,
}

/// Runs both tasks for documents living under one root directory.
///
/// Document paths, search paths and pipeline roots are all relative to the root, and so are
/// the paths written into the generated configuration.
#[derive(Debug)]
pub struct TaskBuilder {
  root: PathBuf,
  config: BlockrevConfig,
  steps: StepRegistry,
  post: PostRegistry,
}

impl TaskBuilder {
  /// Builder for documents under `root`, using the built-in steps and post-processors.
  pub fn new(root: impl Into<PathBuf>, config: BlockrevConfig) -> Self {
    Self {
      root: root.into(),
      config,
      steps: StepRegistry::default(),
      post: PostRegistry::default(),
    }
  }

  /// Builder for `root` using the configuration discovered there.
  pub fn discover(root: impl Into<PathBuf>) -> Self {
    let root = root.into();
    let config = BlockrevConfig::discover(&root);
    Self::new(root, config)
  }

  /// Make a custom step available to flows.
  pub fn register_step<S: StepConfigurator + 'static>(&mut self, step: S) -> &mut Self {
    self.steps.register(step);
    self
  }

  /// Make a custom post-processor available to flows.
  pub fn register_post_processor<P: PostProcessor + 'static>(&mut self, post: P) -> &mut Self {
    self.post.register(post);
    self
  }

  /// Root directory the builder resolves relative paths against.
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Configuration in use.
  pub fn config(&self) -> &BlockrevConfig {
    &self.config
  }

  /// Expand file arguments (literal paths or glob patterns) into existing files.
  ///
  /// A literal path that does not exist is kept so reading it reports the error.
  pub fn expand_files<S: AsRef<str>>(&self, patterns: &[S]) -> Result<Vec<String>> {
    let mut files = Vec::new();

    for pattern in patterns {
      let pattern = pattern.as_ref();
      if !pattern.contains(['*', '?', '[']) {
        files.push(pattern.to_string());
        continue;
      }

      let mut matched = glob_files(&self.root, pattern)?;
      if matched.is_empty() {
        warn!(%pattern, "pattern matched no files");
      }
      files.append(&mut matched);
    }

    Ok(files)
  }

  /// Read and parse one document relative to the root.
  pub fn load_document(&self, file: &str) -> Result<Document> {
    let path = self.root.join(file);
    let content = fs::read_to_string(&path).map_err(|err| BlockrevError::io(&path, err))?;
    Document::parse(file, content)
  }

  /// Build the aggregate pipeline configuration for `files`, seeded with `base`.
  pub fn prepare<S: AsRef<str>>(
    &self,
    files: &[S],
    target: Option<&str>,
    base: Option<TaskConfig>,
  ) -> Result<TaskConfig> {
    let flow = self.config.flow.for_target(target);
    debug!(steps = ?flow.steps, post = ?flow.post, "selected flow");

    let mut config = base.unwrap_or_default();
    for file in files {
      let document = self.load_document(file.as_ref())?;
      let writer = ConfigWriter::from_flow(
        &flow,
        &self.steps,
        &self.post,
        self.config.dirs_for(&document),
      )?;
      config = writer.process(&document, Some(config))?;
      info!(
        path = document.path(),
        blocks = document.blocks().len(),
        "prepared document"
      );
    }

    Ok(config)
  }

  /// Rewrite `files` in place as `content_type`, returning what changed.
  pub fn rewrite<S: AsRef<str>>(&self, files: &[S], content_type: &str) -> Result<Vec<RewrittenFile>> {
    let processor = self.processor(content_type)?;
    let mut outcomes = Vec::new();

    for file in files {
      let document = self.load_document(file.as_ref())?;
      let search_paths = self.config.search_paths_for(&document);
      let content = processor.process(&document, &search_paths);
      let changed = content != document.content();

      let path = self.root.join(file.as_ref());
      fs::write(&path, &content).map_err(|err| BlockrevError::io(&path, err))?;
      info!(
        path = document.path(),
        content_type,
        changed,
        "rewrote document"
      );

      outcomes.push(RewrittenFile {
        path: document.path().to_string(),
        changed,
      });
    }

    Ok(outcomes)
  }

  /// Processor for `content_type` backed by the configured mapping or the filesystem.
  pub fn processor(&self, content_type: &str) -> Result<FileProcessor> {
    let catalog = PatternCatalog::for_type(content_type, self.config.patterns_for(content_type))?;
    let lister: CandidateLister = Box::new(glob_lister(self.root.clone()));
    let finder = RevvedFinder::from_options(self.config.mapping.clone(), Some(lister))?
      .with_convention(self.config.rev_convention)
      .with_selection(self.config.candidate_selection);

    FileProcessor::builder().patterns(catalog).finder(finder).build()
  }
}

/// Candidate lister globbing files under `root`.
///
/// Relative patterns yield root-relative paths; absolute patterns are globbed as given and
/// yield absolute paths.
pub fn glob_lister(root: PathBuf) -> impl Fn(&str) -> Vec<String> + 'static {
  move |pattern| match glob_files(&root, pattern) {
    Ok(files) => files,
    Err(err) => {
      warn!(%pattern, error = %err, "skipping invalid glob");
      Vec::new()
    }
  }
}

fn glob_files(root: &Path, pattern: &str) -> std::result::Result<Vec<String>, glob::PatternError> {
  let absolute = Path::new(pattern).is_absolute();
  let rooted = if absolute || is_current_dir(root) {
    pattern.to_string()
  } else {
    format!("{}/{}", glob::Pattern::escape(&root.to_string_lossy()), pattern)
  };

  Ok(
    glob::glob(&rooted)?
      .flatten()
      .filter(|path| path.is_file())
      .map(|path| {
        if absolute {
          forward_slashes(&path)
        } else {
          relative_to(root, &path)
        }
      })
      .collect(),
  )
}

fn is_current_dir(root: &Path) -> bool {
  root.as_os_str().is_empty() || root == Path::new(".")
}

fn relative_to(root: &Path, path: &Path) -> String {
  let relative = forward_slashes(path.strip_prefix(root).unwrap_or(path));
  match relative.strip_prefix("./") {
    Some(stripped) => stripped.to_string(),
    None => relative,
  }
}

fn forward_slashes(path: &Path) -> String {
  path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::asset_paths::join;
  use crate::pipeline::{PipelineContext, StepFn, StepFragment};
  use serde_json::json;
  use tempfile::tempdir;

  const INDEX: &str = "<html>\n<head>\n  <!-- build:css styles/main.css -->\n  <link rel=\"stylesheet\" href=\"styles/a.css\">\n  <link rel=\"stylesheet\" href=\"styles/b.css\">\n  <!-- endbuild -->\n</head>\n<body>\n  <img src=\"images/logo.png\">\n  <!-- build:js scripts/app.js -->\n  <script src=\"scripts/one.js\"></script>\n  <script src=\"scripts/two.js\"></script>\n  <!-- endbuild -->\n</body>\n</html>\n";

  fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  #[test]
  fn prepare_uses_document_directory_as_input() {
    let dir = tempdir().unwrap();
    write(dir.path(), "app/index.html", INDEX);

    let builder = TaskBuilder::new(dir.path(), BlockrevConfig::default());
    let config = builder.prepare(&["app/index.html"], None, None).unwrap();
    let config = serde_json::Value::Object(config);

    assert_eq!(
      config["concat"][".tmp/concat/scripts/app.js"],
      json!(["app/scripts/one.js", "app/scripts/two.js"])
    );
    assert_eq!(
      config["concat"][".tmp/concat/styles/main.css"],
      json!(["app/styles/a.css", "app/styles/b.css"])
    );
    assert_eq!(
      config["uglifyjs"]["dist/scripts/app.js"],
      json!([".tmp/concat/scripts/app.js"])
    );
  }

  #[test]
  fn prepare_keeps_base_configuration() {
    let dir = tempdir().unwrap();
    write(dir.path(), "index.html", INDEX);

    let base = match json!({"concat": {"vendor.js": ["a.js"]}, "clean": ["dist"]}) {
      serde_json::Value::Object(map) => map,
      _ => unreachable!(),
    };
    let builder = TaskBuilder::new(dir.path(), BlockrevConfig::default());
    let config = builder.prepare(&["index.html"], None, Some(base)).unwrap();

    assert_eq!(config["clean"], json!(["dist"]));
    assert_eq!(config["concat"]["vendor.js"], json!(["a.js"]));
    assert_eq!(
      config["concat"][".tmp/concat/scripts/app.js"],
      json!(["scripts/one.js", "scripts/two.js"])
    );
  }

  #[test]
  fn prepare_honours_target_flow() {
    let dir = tempdir().unwrap();
    write(dir.path(), "index.html", INDEX);

    let config: BlockrevConfig = serde_json::from_value(json!({
      "flow": {"html": {"steps": ["concat", "cssmin"], "post": []}}
    }))
    .unwrap();
    let builder = TaskBuilder::new(dir.path(), config);
    let aggregate = builder.prepare(&["index.html"], Some("html"), None).unwrap();

    assert!(aggregate.get("uglifyjs").is_none());
    assert_eq!(
      aggregate["cssmin"]["dist/styles/main.css"],
      json!([".tmp/concat/styles/main.css"])
    );
  }

  #[test]
  fn prepare_runs_registered_steps() {
    let dir = tempdir().unwrap();
    write(dir.path(), "index.html", INDEX);

    let config: BlockrevConfig =
      serde_json::from_value(json!({"flow": {"steps": ["concat", "copy"], "post": []}})).unwrap();
    let mut builder = TaskBuilder::new(dir.path(), config);
    builder.register_step(StepFn::new(
      "copy",
      |ctx: &mut PipelineContext, block: &crate::models::Block| {
        ctx.out_files = vec![block.dest.clone()];
        StepFragment::from([(
          join(&ctx.out_dir, &block.dest),
          vec![join(&ctx.in_dir, &block.dest)],
        )])
      },
    ));

    let aggregate = builder.prepare(&["index.html"], None, None).unwrap();
    assert_eq!(
      aggregate["copy"]["dist/scripts/app.js"],
      json!([".tmp/concat/scripts/app.js"])
    );
  }

  #[test]
  fn prepare_reports_unknown_steps() {
    let dir = tempdir().unwrap();
    write(dir.path(), "index.html", INDEX);

    let config: BlockrevConfig =
      serde_json::from_value(json!({"flow": {"steps": ["concat", "imagemin"]}})).unwrap();
    let err = TaskBuilder::new(dir.path(), config)
      .prepare(&["index.html"], None, None)
      .unwrap_err();
    assert!(matches!(err, BlockrevError::UnknownStep(name) if name == "imagemin"));
  }

  #[test]
  fn prepare_reports_parse_errors_with_path() {
    let dir = tempdir().unwrap();
    write(dir.path(), "broken.html", "<!-- build:js app.js -->\n<script src=\"a.js\"></script>\n");

    let err = TaskBuilder::new(dir.path(), BlockrevConfig::default())
      .prepare(&["broken.html"], None, None)
      .unwrap_err();
    match err {
      BlockrevError::Parse { line, message } => {
        assert_eq!(line, 1);
        assert!(message.starts_with("broken.html: "));
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn rewrite_replaces_blocks_and_revved_references() {
    let dir = tempdir().unwrap();
    write(dir.path(), "dist/index.html", INDEX);
    write(dir.path(), "dist/scripts/9f3a.app.js", "");
    write(dir.path(), "dist/styles/77aa.main.css", "");
    write(dir.path(), "dist/images/abcd.logo.png", "");
    write(dir.path(), "dist/images/old/1111.logo.png", "");

    let builder = TaskBuilder::new(dir.path(), BlockrevConfig::default());
    let outcomes = builder.rewrite(&["dist/index.html"], "html").unwrap();
    assert_eq!(
      outcomes,
      vec![RewrittenFile {
        path: "dist/index.html".into(),
        changed: true,
      }]
    );

    let content = fs::read_to_string(dir.path().join("dist/index.html")).unwrap();
    assert!(content.contains("  <link rel=\"stylesheet\" href=\"styles/77aa.main.css\">\n"));
    assert!(content.contains("  <script src=\"scripts/9f3a.app.js\"></script>\n"));
    assert!(content.contains("<img src=\"images/abcd.logo.png\">"));
    assert!(!content.contains("build:"));
  }

  #[test]
  fn rewrite_searches_configured_asset_dirs() {
    let dir = tempdir().unwrap();
    write(dir.path(), "views/page.html", "<img src=\"/images/logo.png\">\n");
    write(dir.path(), "public/images/logo.5e2b.png", "");

    let config: BlockrevConfig = serde_json::from_value(json!({
      "assetsDirs": "public",
      "revConvention": "suffix"
    }))
    .unwrap();
    let builder = TaskBuilder::new(dir.path(), config);
    builder.rewrite(&["views/page.html"], "html").unwrap();

    let content = fs::read_to_string(dir.path().join("views/page.html")).unwrap();
    assert_eq!(content, "<img src=\"/images/logo.5e2b.png\">\n");
  }

  #[test]
  fn rewrite_applies_custom_patterns_for_custom_types() {
    let dir = tempdir().unwrap();
    write(dir.path(), "misc.js", "var referenceToImage = 'image.png';\n");
    write(dir.path(), "images/2132.image.png", "");

    let config: BlockrevConfig = serde_json::from_value(json!({
      "assetsDirs": ["images"],
      "patterns": {"js": [{"pattern": "referenceToImage = '([^']+)'", "description": "Replacing image"}]}
    }))
    .unwrap();
    let outcomes = TaskBuilder::new(dir.path(), config)
      .rewrite(&["misc.js"], "js")
      .unwrap();
    assert!(outcomes[0].changed);

    let content = fs::read_to_string(dir.path().join("misc.js")).unwrap();
    assert_eq!(content, "var referenceToImage = '2132.image.png';\n");
  }

  #[test]
  fn rewrite_rejects_unknown_type_without_patterns() {
    let dir = tempdir().unwrap();
    write(dir.path(), "misc.js", "");
    let err = TaskBuilder::new(dir.path(), BlockrevConfig::default())
      .rewrite(&["misc.js"], "js")
      .unwrap_err();
    assert!(matches!(err, BlockrevError::UnsupportedPattern(_)));
  }

  #[test]
  fn rewrite_prefers_explicit_mapping() {
    let dir = tempdir().unwrap();
    write(dir.path(), "index.html", "<script src=\"app.js\"></script>\n");
    write(dir.path(), "ffff.app.js", "");

    let config: BlockrevConfig = serde_json::from_value(json!({
      "mapping": {"app.js": "1234.app.js"}
    }))
    .unwrap();
    TaskBuilder::new(dir.path(), config)
      .rewrite(&["index.html"], "html")
      .unwrap();

    let content = fs::read_to_string(dir.path().join("index.html")).unwrap();
    assert_eq!(content, "<script src=\"1234.app.js\"></script>\n");
  }

  #[test]
  fn relative_paths_ignore_current_dir_root() {
    assert_eq!(
      relative_to(Path::new("."), Path::new("images/abcd.logo.png")),
      "images/abcd.logo.png"
    );
    assert_eq!(
      relative_to(Path::new("."), Path::new("./images/abcd.logo.png")),
      "images/abcd.logo.png"
    );
    assert_eq!(
      relative_to(Path::new("site"), Path::new("site/app/a.html")),
      "app/a.html"
    );
  }

  #[test]
  fn works_from_current_directory_root() {
    let dir = tempdir().unwrap();
    write(dir.path(), "app/index.html", "<img src=\"images/logo.png\">\n");
    write(dir.path(), "app/images/abcd.logo.png", "");

    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();
    let builder = TaskBuilder::new(".", BlockrevConfig::default());
    let listed = glob_lister(PathBuf::from("."))("app/images/*.logo.png");
    let files = builder.expand_files(&["app/*.html"]);
    let outcome = files
      .as_ref()
      .map_err(|err| err.to_string())
      .and_then(|files| builder.rewrite(files, "html").map_err(|err| err.to_string()));
    std::env::set_current_dir(previous).unwrap();

    assert_eq!(listed, vec!["app/images/abcd.logo.png"]);
    assert_eq!(files.unwrap(), vec!["app/index.html"]);
    assert!(outcome.unwrap()[0].changed);
    let content = fs::read_to_string(dir.path().join("app/index.html")).unwrap();
    assert_eq!(content, "<img src=\"images/abcd.logo.png\">\n");
  }

  #[test]
  fn resolves_against_absolute_asset_dirs() {
    let site = tempdir().unwrap();
    let assets = tempdir().unwrap();
    write(site.path(), "index.html", "<img src=\"images/logo.png\">\n");
    write(assets.path(), "images/abcd.logo.png", "");

    let assets_dir = assets.path().to_string_lossy().replace('\\', "/");
    let config: BlockrevConfig =
      serde_json::from_value(json!({"assetsDirs": [assets_dir]})).unwrap();
    TaskBuilder::new(site.path(), config)
      .rewrite(&["index.html"], "html")
      .unwrap();

    let content = fs::read_to_string(site.path().join("index.html")).unwrap();
    assert_eq!(content, "<img src=\"images/abcd.logo.png\">\n");
  }

  #[test]
  fn expands_glob_arguments() {
    let dir = tempdir().unwrap();
    write(dir.path(), "app/a.html", "");
    write(dir.path(), "app/b.html", "");
    write(dir.path(), "app/c.css", "");

    let builder = TaskBuilder::new(dir.path(), BlockrevConfig::default());
    let mut files = builder.expand_files(&["app/*.html", "missing.html"]).unwrap();
    files.sort();
    assert_eq!(files, vec!["app/a.html", "app/b.html", "missing.html"]);
  }
}
