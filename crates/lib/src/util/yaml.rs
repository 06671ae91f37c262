//! YAML rendering for display.
//!
//! Mapping keys are sorted at every level so the same data always renders to
//! the same text, whatever order it was built in. The output is meant for
//! people, not for round-tripping.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// Serialize `value` as YAML with mapping keys sorted recursively.
pub fn to_display_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_yaml::Error> {
  let value = serde_yaml::to_value(value)?;
  serde_yaml::to_string(&sort_keys(value))
}

/// Sort mapping keys recursively.
pub fn sort_keys(value: Value) -> Value {
  match value {
    Value::Mapping(mapping) => {
      let mut entries: Vec<(Value, Value)> = mapping.into_iter().collect();
      entries.sort_by_cached_key(|(key, _)| key_text(key));
      Value::Mapping(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect::<Mapping>())
    }
    Value::Sequence(items) => Value::Sequence(items.into_iter().map(sort_keys).collect()),
    other => other,
  }
}

fn key_text(key: &Value) -> String {
  match key {
    Value::String(s) => s.clone(),
    other => serde_yaml::to_string(other).unwrap_or_default(),
  }
}
