//! Line scanner extracting build blocks from markup.

use std::sync::OnceLock;

use regex::Regex;

use crate::asset_paths::{basename, dirname, join, normalize};
use crate::error::{BlockrevError, Result};
use crate::models::{Block, BlockKind, LoaderDescriptor};

struct Markers {
  opener: Regex,
  open: Regex,
  end: Regex,
  tag: Regex,
  script_src: Regex,
  link_href: Regex,
  data_main: Regex,
}

fn markers() -> &'static Markers {
  static MARKERS: OnceLock<Markers> = OnceLock::new();
  MARKERS.get_or_init(|| Markers {
    opener: Regex::new(r"<!--\s*build:").expect("invalid opener regex"),
    open: Regex::new(
      r"<!--\s*build:(?P<kind>\w+)(?:\((?P<alt>[^)]+)\))?\s+(?P<dest>[^\s>]+)\s*-->",
    )
    .expect("invalid build marker regex"),
    end: Regex::new(r"<!--\s*endbuild\s*-->").expect("invalid endbuild regex"),
    tag: Regex::new(r"(?i)<(?P<name>script|link)\b[^>]*>").expect("invalid tag regex"),
    script_src: Regex::new(r#"(?i)\ssrc\s*=\s*["'](?P<value>[^"']+)["']"#)
      .expect("invalid src regex"),
    link_href: Regex::new(r#"(?i)\shref\s*=\s*["'](?P<value>[^"']+)["']"#)
      .expect("invalid href regex"),
    data_main: Regex::new(r#"(?i)\sdata-main\s*=\s*["'](?P<value>[^"']+)["']"#)
      .expect("invalid data-main regex"),
  })
}

/// Extract the ordered list of build blocks from a document's content.
///
/// Every line between an opening `<!-- build:<type> <dest> -->` marker and the matching
/// `<!-- endbuild -->` is captured verbatim, blank lines included, so the block can later be
/// replaced in place.
pub fn parse_blocks(content: &str) -> Result<Vec<Block>> {
  let markers = markers();
  let mut blocks = Vec::new();
  let mut current: Option<(usize, Block)> = None;

  let mut offset = 0;
  for (index, terminated) in content.split_inclusive('\n').enumerate() {
    let line_no = index + 1;
    let start = offset;
    offset += terminated.len();
    let line = terminated
      .strip_suffix('\n')
      .map(|line| line.strip_suffix('\r').unwrap_or(line))
      .unwrap_or(terminated);

    if markers.opener.is_match(line) {
      if let Some((open_line, _)) = &current {
        return Err(BlockrevError::parse(
          line_no,
          format!("build block opened while the block from line {open_line} is still open"),
        ));
      }
      let mut block = open_block(line, line_no)?;
      block.span = start..start + line.len();
      current = Some((line_no, block));
      continue;
    }

    if let Some((_, block)) = current.as_mut() {
      block.raw.push(line.to_string());
      block.span.end = start + line.len();
      if markers.end.is_match(line) {
        if let Some((_, block)) = current.take() {
          blocks.push(block);
        }
      } else {
        collect_sources(line, block);
      }
      continue;
    }

    if markers.end.is_match(line) {
      return Err(BlockrevError::parse(
        line_no,
        "endbuild without a matching build marker",
      ));
    }
  }

  if let Some((open_line, block)) = current {
    return Err(BlockrevError::parse(
      open_line,
      format!("unterminated build block for {}", block.dest),
    ));
  }

  Ok(blocks)
}

fn open_block(line: &str, line_no: usize) -> Result<Block> {
  let caps = markers()
    .open
    .captures(line)
    .ok_or_else(|| BlockrevError::parse(line_no, format!("malformed build marker: {}", line.trim())))?;

  let kind_token = &caps["kind"];
  let kind = BlockKind::from_marker(kind_token).ok_or_else(|| {
    BlockrevError::parse(line_no, format!("unsupported build block type `{kind_token}`"))
  })?;

  let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
  let mut block = Block::new(kind, &caps["dest"], indent);
  if let Some(alt) = caps.name("alt") {
    block.search_paths = alt
      .as_str()
      .split(',')
      .map(|value| value.trim().to_string())
      .filter(|value| !value.is_empty())
      .collect();
  }
  block.raw.push(line.to_string());
  Ok(block)
}

fn collect_sources(line: &str, block: &mut Block) {
  let markers = markers();

  for tag in markers.tag.captures_iter(line) {
    let text = &tag[0];
    if tag["name"].eq_ignore_ascii_case("link") {
      if let Some(href) = markers.link_href.captures(text) {
        block.src.push(href["value"].to_string());
      }
      continue;
    }

    let Some(src) = markers.script_src.captures(text) else {
      continue;
    };
    let runtime = src["value"].to_string();

    match markers.data_main.captures(text) {
      Some(main) => {
        let loader = loader_descriptor(&main["value"], &runtime, &block.dest);
        block.src.push(loader.main_config_file.clone());
        block.loader = Some(loader);
      }
      None => block.src.push(runtime),
    }
  }
}

fn loader_descriptor(main: &str, runtime: &str, dest: &str) -> LoaderDescriptor {
  let file = basename(main);
  let name = file.strip_suffix(".js").unwrap_or(file).to_string();
  let base_url = match dirname(main) {
    "" => ".".to_string(),
    dir => dir.to_string(),
  };
  let main_config_file = join(&base_url, &format!("{name}.js"));

  LoaderDescriptor {
    name,
    base_url,
    main_config_file,
    dest: dest.to_string(),
    runtime_src: runtime.to_string(),
    runtime_dest: normalize(runtime),
  }
}
