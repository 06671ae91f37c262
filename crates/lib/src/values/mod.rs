//! Configuration values.
//!
//! Overlays are plain YAML mappings read from user-supplied files. They are
//! folded into one effective configuration with [`merge_all`], then projected
//! together with chart defaults and release options into the values tree that
//! templates see (see [`render_values`]).

pub mod overlay;
pub mod render_values;

use serde_yaml::{Mapping, Value};

pub use overlay::{OverlayError, display_overlay_name, load_overlay, load_overlays};
pub use render_values::{ReleaseOptions, ValuesError, coalesce_values, to_render_values};

/// A nested configuration mapping as read from YAML.
pub type Values = Mapping;

/// Deep-merge `overlay` onto `base`, returning the merged mapping.
///
/// Keys holding a mapping on both sides are merged recursively. Every other
/// conflict takes the overlay's value as is: sequences are replaced rather
/// than concatenated, and a scalar never merges with a mapping.
pub fn merge(base: &Values, overlay: &Values) -> Values {
  let mut result = base.clone();

  for (key, overlay_val) in overlay {
    match (result.get(key), overlay_val) {
      (Some(Value::Mapping(base_map)), Value::Mapping(overlay_map)) => {
        let merged = merge(base_map, overlay_map);
        result.insert(key.clone(), Value::Mapping(merged));
      }
      _ => {
        result.insert(key.clone(), overlay_val.clone());
      }
    }
  }

  result
}

/// Fold overlays left to right onto an empty mapping.
///
/// The last overlay has the highest precedence on every conflicting leaf.
pub fn merge_all<'a, I>(overlays: I) -> Values
where
  I: IntoIterator<Item = &'a Values>,
{
  overlays
    .into_iter()
    .fold(Values::new(), |acc, overlay| merge(&acc, overlay))
}

/// Look up a dotted path such as `db.enabled` in a values tree.
pub fn lookup<'a>(values: &'a Values, path: &str) -> Option<&'a Value> {
  let mut segments = path.split('.').filter(|s| !s.is_empty());
  let mut current = values.get(segments.next()?)?;
  for segment in segments {
    current = current.as_mapping()?.get(segment)?;
  }
  Some(current)
}

/// The mapping stored under `key`, or an empty one when the key is absent or null.
///
/// Returns `None` when the key holds something other than a mapping.
pub fn child_table(values: &Values, key: &str) -> Option<Values> {
  match values.get(key) {
    None | Some(Value::Null) => Some(Values::new()),
    Some(Value::Mapping(m)) => Some(m.clone()),
    Some(_) => None,
  }
}

/// Short human name of a YAML value's kind, for error messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Sequence(_) => "sequence",
    Value::Mapping(_) => "mapping",
    Value::Tagged(_) => "tagged value",
  }
}
