//! Deep merge of JSON configuration values.

use serde_json::Value;

/// Merge `source` into `target`.
///
/// Objects are merged key by key, recursively. Any other value in `source` (arrays included)
/// replaces what `target` held at that position, so keys only present in `target` survive.
pub fn deep_merge(target: &mut Value, source: Value) {
  match (target, source) {
    (Value::Object(target), Value::Object(source)) => {
      for (key, value) in source {
        match target.get_mut(&key) {
          Some(existing) => deep_merge(existing, value),
          None => {
            target.insert(key, value);
          }
        }
      }
    }
    (target, source) => *target = source,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn keeps_keys_only_present_in_target() {
    let mut target = json!({"concat": {"foo.js": "bar.js"}});
    deep_merge(
      &mut target,
      json!({"concat": {".tmp/concat/site.js": ["a.js", "b.js"]}}),
    );
    assert_eq!(
      target,
      json!({"concat": {"foo.js": "bar.js", ".tmp/concat/site.js": ["a.js", "b.js"]}})
    );
  }

  #[test]
  fn replaces_leaves_and_arrays() {
    let mut target = json!({"out.js": ["old.js"], "options": {"name": "a", "keep": true}});
    deep_merge(&mut target, json!({"out.js": ["new.js"], "options": {"name": "b"}}));
    assert_eq!(
      target,
      json!({"out.js": ["new.js"], "options": {"name": "b", "keep": true}})
    );
  }

  #[test]
  fn replaces_non_object_targets() {
    let mut target = json!("scalar");
    deep_merge(&mut target, json!({"a": 1}));
    assert_eq!(target, json!({"a": 1}));
  }
}
