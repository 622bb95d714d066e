//! Rewrites references to revved assets and collapses build blocks into final tags.

use regex::Captures;
use tracing::debug;

use crate::asset_paths::should_ignore_asset_reference;
use crate::document::Document;
use crate::error::{BlockrevError, Result};
use crate::models::{Block, BlockKind};
use crate::revved::RevvedFinder;
use crate::rewrite::patterns::{PatternCatalog, ReferencePattern, ReferenceRule};

/// Applies a pattern catalog and a revved finder to document content.
#[derive(Debug)]
pub struct FileProcessor {
  catalog: PatternCatalog,
  finder: RevvedFinder,
}

/// Collects the parts of a [`FileProcessor`], failing on the missing ones.
#[derive(Debug, Default)]
pub struct FileProcessorBuilder {
  catalog: Option<PatternCatalog>,
  finder: Option<RevvedFinder>,
}

impl FileProcessorBuilder {
  /// Pattern catalog used to locate references.
  pub fn patterns(mut self, catalog: PatternCatalog) -> Self {
    self.catalog = Some(catalog);
    self
  }

  /// Resolver used to look up revved counterparts.
  pub fn finder(mut self, finder: RevvedFinder) -> Self {
    self.finder = Some(finder);
    self
  }

  /// Assemble the processor.
  pub fn build(self) -> Result<FileProcessor> {
    let catalog = self
      .catalog
      .ok_or(BlockrevError::MissingParameter("patterns"))?;
    let finder = self.finder.ok_or(BlockrevError::MissingParameter("finder"))?;
    Ok(FileProcessor::new(catalog, finder))
  }
}

impl FileProcessor {
  /// Create a processor from its two collaborators.
  pub fn new(catalog: PatternCatalog, finder: RevvedFinder) -> Self {
    Self { catalog, finder }
  }

  /// Start a builder.
  pub fn builder() -> FileProcessorBuilder {
    FileProcessorBuilder::default()
  }

  /// Catalog the processor applies.
  pub fn catalog(&self) -> &PatternCatalog {
    &self.catalog
  }

  /// Replace every block of the document, then rewrite references to revved assets.
  pub fn process<S: AsRef<str>>(&self, document: &Document, search_paths: &[S]) -> String {
    let replaced = self.replace_blocks(document);
    self.rewrite_references(&replaced, search_paths)
  }

  /// Replace each block's raw span with the single tag it collapses into.
  ///
  /// Blocks are spliced by the byte span recorded at parse time, so line terminators around
  /// and inside a block never have to match each other.
  pub fn replace_blocks(&self, document: &Document) -> String {
    let content = document.content();
    let mut replaced = String::with_capacity(content.len());
    let mut cursor = 0;

    for block in document.blocks() {
      replaced.push_str(&content[cursor..block.span.start]);
      replaced.push_str(&replacement_tag(block));
      cursor = block.span.end;
    }

    replaced.push_str(&content[cursor..]);
    replaced
  }

  /// Rewrite every eligible reference in `content` to its revved counterpart.
  ///
  /// References that are external, empty, the bare root or templating placeholders are left
  /// untouched, as are references with no revved counterpart in any search path.
  pub fn rewrite_references<S: AsRef<str>>(&self, content: &str, search_paths: &[S]) -> String {
    let mut content = content.to_string();

    for pattern in self.catalog.patterns() {
      let rewritten = pattern
        .regex
        .replace_all(&content, |caps: &Captures| {
          self.rewrite_match(pattern, caps, search_paths)
        })
        .into_owned();
      content = rewritten;
    }

    content
  }

  fn rewrite_match<S: AsRef<str>>(
    &self,
    pattern: &ReferencePattern,
    caps: &Captures,
    search_paths: &[S],
  ) -> String {
    let whole = caps.get_match();
    let Some(found) = pattern.reference(caps) else {
      return whole.as_str().to_string();
    };

    let reference = found.as_str();
    if should_ignore_asset_reference(reference) {
      return whole.as_str().to_string();
    }

    let resolved = match pattern.rule {
      ReferenceRule::Plain => self.finder.find(reference, search_paths),
      ReferenceRule::LoaderEntry if reference.ends_with(".js") => {
        self.finder.find(reference, search_paths)
      }
      ReferenceRule::LoaderEntry => {
        let module = format!("{reference}.js");
        let revved = self.finder.find(&module, search_paths);
        match revved.strip_suffix(".js") {
          Some(stripped) => stripped.to_string(),
          None => revved,
        }
      }
    };

    if resolved == reference {
      return whole.as_str().to_string();
    }

    debug!(
      description = %pattern.description,
      from = %reference,
      to = %resolved,
      "replaced reference"
    );

    let start = found.start() - whole.start();
    let end = found.end() - whole.start();
    let text = whole.as_str();
    format!("{}{}{}", &text[..start], resolved, &text[end..])
  }
}

/// The tag a block collapses into, prefixed with the block's indentation.
pub fn replacement_tag(block: &Block) -> String {
  match block.kind {
    BlockKind::Css => format!(r#"{}<link rel="stylesheet" href="{}">"#, block.indent, block.dest),
    BlockKind::Js => match &block.loader {
      Some(loader) => {
        let entry = loader.dest.strip_suffix(".js").unwrap_or(&loader.dest);
        format!(
          r#"{}<script data-main="{}" src="{}"></script>"#,
          block.indent, entry, loader.runtime_dest
        )
      }
      None => format!(r#"{}<script src="{}"></script>"#, block.indent, block.dest),
    },
  }
}
