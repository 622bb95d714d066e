//! Tagged catalog of reference-bearing constructs, per content type.

use regex::{Captures, Match, Regex};
use serde::Deserialize;

use crate::error::{BlockrevError, Result};

/// How a matched reference is resolved and written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceRule {
  /// Resolved and written back as authored.
  Plain,
  /// Module loader entry written without extension: resolved as `<value>.js` and written
  /// back with the `.js` stripped again.
  LoaderEntry,
}

/// One reference-bearing construct: where the reference sits and how to resolve it.
#[derive(Debug, Clone)]
pub struct ReferencePattern {
  /// Content type the pattern belongs to (`html`, `css`, or a custom type).
  pub content_type: String,
  /// Extraction regex; the reference is the `ref` group, or group 1 when it is absent.
  pub regex: Regex,
  /// Human readable description used when logging replacements.
  pub description: String,
  /// Resolution rule for the extracted reference.
  pub rule: ReferenceRule,
}

impl ReferencePattern {
  /// Compile a pattern entry.
  pub fn new(
    content_type: impl Into<String>,
    pattern: &str,
    description: impl Into<String>,
    rule: ReferenceRule,
  ) -> Result<Self> {
    Ok(Self {
      content_type: content_type.into(),
      regex: Regex::new(pattern)?,
      description: description.into(),
      rule,
    })
  }

  /// The reference captured by this pattern within one match.
  pub fn reference<'h>(&self, caps: &Captures<'h>) -> Option<Match<'h>> {
    caps.name("ref").or_else(|| caps.get(1))
  }
}

/// Caller supplied pattern, as written in configuration files.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomPattern {
  /// Regex with the reference in group `ref` or group 1.
  pub pattern: String,
  /// Description used when logging replacements.
  #[serde(default)]
  pub description: String,
}

const ATTR_VALUE: &str = r#"\s*=\s*["'](?P<ref>[^"']+)["']"#;
const CSS_URL: &str = r#"url\(\s*["']?(?P<ref>[^"'()\s]+)["']?\s*\)"#;

fn tag_attribute(tag: &str, attribute: &str) -> String {
  format!(r"(?i)<{tag}\b[^>]*\s{attribute}{ATTR_VALUE}")
}

fn html_catalog() -> Result<Vec<ReferencePattern>> {
  let entries = [
    (
      tag_attribute("script", "data-main"),
      "Update the HTML to reference our revved loader entry",
      ReferenceRule::LoaderEntry,
    ),
    (
      tag_attribute("script", "src"),
      "Update the HTML to reference our concat/min/revved script files",
      ReferenceRule::Plain,
    ),
    (
      tag_attribute("link", "href"),
      "Update the HTML with the new css filenames",
      ReferenceRule::Plain,
    ),
    (
      tag_attribute("img", "src"),
      "Update the HTML with the new img filenames",
      ReferenceRule::Plain,
    ),
    (
      tag_attribute("source", "src"),
      "Update the HTML with the new media source filenames",
      ReferenceRule::Plain,
    ),
    (
      tag_attribute("video", "poster"),
      "Update the HTML with the new video poster filenames",
      ReferenceRule::Plain,
    ),
    (
      format!(r"(?i)\sdata-[\w-]*(?:src|href|url|img|image|background|poster)[\w-]*{ATTR_VALUE}"),
      "Update the HTML with data-* source attributes",
      ReferenceRule::Plain,
    ),
    (
      format!("(?i){CSS_URL}"),
      "Update the HTML with background imgs, case there is some inline style",
      ReferenceRule::Plain,
    ),
    (
      tag_attribute("a", "href"),
      "Update the HTML with anchors images",
      ReferenceRule::Plain,
    ),
    (
      tag_attribute("input", "src"),
      "Update the HTML with reference in input",
      ReferenceRule::Plain,
    ),
  ];

  entries
    .into_iter()
    .map(|(pattern, description, rule)| ReferencePattern::new("html", &pattern, description, rule))
    .collect()
}

fn css_catalog() -> Result<Vec<ReferencePattern>> {
  Ok(vec![ReferencePattern::new(
    "css",
    &format!("(?i){CSS_URL}"),
    "Update the CSS to reference our revved images",
    ReferenceRule::Plain,
  )?])
}

/// Ordered set of reference patterns applied to one content type.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
  content_type: String,
  patterns: Vec<ReferencePattern>,
}

impl PatternCatalog {
  /// Built-in catalog for `html` or `css`.
  pub fn named(name: &str) -> Result<Self> {
    let patterns = match name {
      "html" => html_catalog()?,
      "css" => css_catalog()?,
      other => return Err(BlockrevError::UnsupportedPattern(other.to_string())),
    };

    Ok(Self {
      content_type: name.to_string(),
      patterns,
    })
  }

  /// Catalog made only of caller supplied patterns.
  pub fn custom(content_type: impl Into<String>, patterns: Vec<ReferencePattern>) -> Self {
    Self {
      content_type: content_type.into(),
      patterns,
    }
  }

  /// Built-in catalog for `content_type` extended with configured patterns.
  ///
  /// Content types without a built-in catalog are accepted only when custom patterns exist.
  pub fn for_type(content_type: &str, custom: &[CustomPattern]) -> Result<Self> {
    let mut catalog = match Self::named(content_type) {
      Ok(catalog) => catalog,
      Err(BlockrevError::UnsupportedPattern(_)) if !custom.is_empty() => {
        Self::custom(content_type, Vec::new())
      }
      Err(err) => return Err(err),
    };

    for entry in custom {
      catalog.patterns.push(ReferencePattern::new(
        content_type,
        &entry.pattern,
        entry.description.clone(),
        ReferenceRule::Plain,
      )?);
    }

    Ok(catalog)
  }

  /// Append patterns after the existing ones.
  pub fn extend(&mut self, patterns: impl IntoIterator<Item = ReferencePattern>) {
    self.patterns.extend(patterns);
  }

  /// Content type this catalog applies to.
  pub fn content_type(&self) -> &str {
    &self.content_type
  }

  /// Patterns in application order.
  pub fn patterns(&self) -> &[ReferencePattern] {
    &self.patterns
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn references(catalog: &PatternCatalog, content: &str) -> Vec<String> {
    catalog
      .patterns()
      .iter()
      .flat_map(|pattern| {
        pattern
          .regex
          .captures_iter(content)
          .filter_map(|caps| pattern.reference(&caps).map(|m| m.as_str().to_string()))
          .collect::<Vec<_>>()
      })
      .collect()
  }

  #[test]
  fn rejects_unknown_catalog_names() {
    let err = PatternCatalog::named("foo").unwrap_err();
    assert_eq!(err.to_string(), "unsupported pattern: foo");
  }

  #[test]
  fn html_catalog_finds_source_like_attributes() {
    let catalog = PatternCatalog::named("html").unwrap();
    let found = references(
      &catalog,
      r#"<li data-lang="fr" data-src="a.png"></li><img class="x" src="b.png"><a href="c.html"></a>"#,
    );
    assert_eq!(found, vec!["b.png", "a.png", "c.html"]);
  }

  #[test]
  fn html_catalog_does_not_confuse_data_src_with_src() {
    let catalog = PatternCatalog::named("html").unwrap();
    let found = references(&catalog, r#"<img data-src="lazy.png">"#);
    assert_eq!(found, vec!["lazy.png"]);
  }

  #[test]
  fn loader_entry_is_tagged() {
    let catalog = PatternCatalog::named("html").unwrap();
    let loader = &catalog.patterns()[0];
    assert_eq!(loader.rule, ReferenceRule::LoaderEntry);
    let caps = loader
      .regex
      .captures(r#"<script data-main="scripts/main" src="require.js"></script>"#)
      .unwrap();
    assert_eq!(loader.reference(&caps).unwrap().as_str(), "scripts/main");
  }

  #[test]
  fn css_catalog_matches_quoted_and_bare_urls() {
    let catalog = PatternCatalog::named("css").unwrap();
    let found = references(&catalog, ".a { background: url( 'x.png' ) } .b { background: url(y.png) }");
    assert_eq!(found, vec!["x.png", "y.png"]);
  }

  #[test]
  fn custom_patterns_extend_builtin_catalog() {
    let custom = vec![CustomPattern {
      pattern: r"referenceToImage = '([^']+)'".into(),
      description: "Replacing image".into(),
    }];
    let catalog = PatternCatalog::for_type("css", &custom).unwrap();
    assert_eq!(catalog.patterns().len(), 2);

    let catalog = PatternCatalog::for_type("js", &custom).unwrap();
    assert_eq!(catalog.content_type(), "js");
    assert_eq!(catalog.patterns().len(), 1);
  }

  #[test]
  fn unknown_type_without_custom_patterns_fails() {
    assert!(matches!(
      PatternCatalog::for_type("js", &[]),
      Err(BlockrevError::UnsupportedPattern(_))
    ));
  }
}
