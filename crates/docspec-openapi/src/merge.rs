//! Deep merge for annotation options

use serde_json::{Map, Value};

/// Merge a sequence of JSON values, earlier values winning on conflict.
///
/// Objects are merged key by key; any other value (lists included) is taken
/// whole from the first value that is not `null`.
pub fn merge_recursive<I>(values: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    values
        .into_iter()
        .fold(Value::Object(Map::new()), merge_pair)
}

fn merge_pair(child: Value, parent: Value) -> Value {
    match (child, parent) {
        (Value::Object(mut child), Value::Object(parent)) => {
            for (key, parent_value) in parent {
                let merged = match child.remove(&key) {
                    Some(child_value) => merge_pair(child_value, parent_value),
                    None => parent_value,
                };
                child.insert(key, merged);
            }
            Value::Object(child)
        }
        (Value::Null, parent) => parent,
        (child, _) => child,
    }
}
