//! Skip rules for references that can never name a revved file.

use regex::Regex;

const TEMPLATE_MARKERS: [&str; 5] = ["<%", "{{", "{%", "${", "<?"];

fn external_reference_pattern() -> &'static Regex {
  use std::sync::OnceLock;

  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]+:").expect("invalid external reference regex")
  })
}

/// Whether the reference carries a URL scheme (`http:`, `data:`, `mailto:`, ...).
pub fn is_external_reference(value: &str) -> bool {
  external_reference_pattern().is_match(value.trim())
}

/// Whether the value embeds a templating placeholder rather than a file name.
pub fn is_template_expression(value: &str) -> bool {
  TEMPLATE_MARKERS.iter().any(|marker| value.contains(marker))
}

/// Whether the value is nothing but the root separator.
pub fn is_root_reference(value: &str) -> bool {
  !value.is_empty() && value.chars().all(|c| c == '/')
}

/// Determine whether a reference must be left untouched by the revved asset resolver.
///
/// Empty values, external URLs, bare roots and templating placeholders never name a file
/// that could have a revved counterpart on disk.
pub fn should_ignore_asset_reference(value: &str) -> bool {
  let trimmed = value.trim();
  trimmed.is_empty()
    || is_external_reference(trimmed)
    || is_root_reference(trimmed)
    || is_template_expression(trimmed)
}
