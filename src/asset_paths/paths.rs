//! Forward-slash path algebra used for references, search paths and pipeline outputs.
//!
//! References are authored in markup, so they are handled as `/`-separated strings rather
//! than native paths. Backslashes coming from Windows inputs are normalised on the way in.

/// Collapse `.` and `..` segments and duplicate separators.
///
/// A single leading `/` is kept for absolute paths. Leading `..` segments of a relative path
/// are kept since there is nothing left to pop them against.
pub fn normalize(path: &str) -> String {
  let unified = path.replace('\\', "/");
  let absolute = unified.starts_with('/');
  let mut segments: Vec<&str> = Vec::new();

  for segment in unified.split('/') {
    match segment {
      "" | "." => {}
      ".." => match segments.last() {
        Some(last) if *last != ".." => {
          segments.pop();
        }
        _ if absolute => {}
        _ => segments.push(".."),
      },
      other => segments.push(other),
    }
  }

  let joined = segments.join("/");
  if absolute {
    format!("/{joined}")
  } else {
    joined
  }
}

/// Join `relative` onto `base`, treating a rooted `relative` as relative to `base`.
pub fn join(base: &str, relative: &str) -> String {
  let relative = relative.trim_start_matches(['/', '\\']);
  if base.is_empty() {
    normalize(relative)
  } else {
    normalize(&format!("{base}/{relative}"))
  }
}

/// Directory portion of a path, empty when it has none.
pub fn dirname(path: &str) -> &str {
  path.rfind('/').map(|idx| &path[..idx]).unwrap_or("")
}

/// Final segment of a path.
pub fn basename(path: &str) -> &str {
  path.rfind('/').map(|idx| &path[idx + 1..]).unwrap_or(path)
}

/// Substitute the final segment of `reference` while keeping everything before it as authored.
pub fn replace_file_name(reference: &str, file_name: &str) -> String {
  match reference.rfind('/') {
    Some(idx) => format!("{}{}", &reference[..=idx], file_name),
    None => file_name.to_string(),
  }
}
