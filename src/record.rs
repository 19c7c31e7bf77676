//! Purpose: In-place field rewrites for decoded API records.
//! Exports: `Mapping`, `replace`, `decimal_field`, `datetime_field`.
//! Role: Lets callers normalize loosely typed response fields one key at a time.
//! Invariants: Absent mappings and absent keys are silent no-ops.
//! Invariants: Only the targeted key is touched; other entries and ordering are preserved.

use crate::parse::{parse_datetime_string, parse_float_string};
use serde_json::Value;
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// A keyed container whose values can be rewritten in place.
pub trait Mapping<Q: ?Sized> {
    type Value;

    fn value_mut(&mut self, key: &Q) -> Option<&mut Self::Value>;
}

impl<K, V, Q, S> Mapping<Q> for HashMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: Eq + Hash + ?Sized,
    S: std::hash::BuildHasher,
{
    type Value = V;

    fn value_mut(&mut self, key: &Q) -> Option<&mut V> {
        self.get_mut(key)
    }
}

impl<K, V, Q> Mapping<Q> for BTreeMap<K, V>
where
    K: Ord + Borrow<Q>,
    Q: Ord + ?Sized,
{
    type Value = V;

    fn value_mut(&mut self, key: &Q) -> Option<&mut V> {
        self.get_mut(key)
    }
}

impl Mapping<str> for serde_json::Map<String, Value> {
    type Value = Value;

    fn value_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.get_mut(key)
    }
}

/// Replaces `mapping[key]` with `transform(mapping[key])` when both exist.
///
/// Returns whether a replacement happened. The old value is moved into
/// `transform`; the slot briefly holds `Default::default()` while it runs.
pub fn replace<M, Q, F>(mapping: Option<&mut M>, key: &Q, transform: F) -> bool
where
    M: Mapping<Q> + ?Sized,
    M::Value: Default,
    Q: ?Sized,
    F: FnOnce(M::Value) -> M::Value,
{
    let Some(slot) = mapping.and_then(|mapping| mapping.value_mut(key)) else {
        return false;
    };
    let current = std::mem::take(slot);
    *slot = transform(current);
    true
}

/// Normalizes a JSON string number (`"1,234.50"`) to its decimal text (`"1234.50"`).
/// Unparsable or non-string values become `null`.
pub fn decimal_field(value: Value) -> Value {
    match parse_float_string(value.as_str()) {
        Some(decimal) => Value::String(decimal.to_string()),
        None => Value::Null,
    }
}

/// Normalizes a JSON date/time string to RFC 3339 (zoned) or ISO (naive) text.
/// `null` stays `null`; unparsable or non-string values become `null`.
pub fn datetime_field(value: Value) -> Value {
    match parse_datetime_string(value.as_str()) {
        Ok(Some(timestamp)) => Value::String(timestamp.to_string()),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::{datetime_field, decimal_field, replace};
    use crate::parse::parse_float_string;
    use bigdecimal::BigDecimal;
    use serde_json::{Map, Value, json};
    use std::collections::{BTreeMap, HashMap};
    use std::str::FromStr;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn replaces_json_field_with_decimal() {
        let mut item = record(json!({"a": "1,234", "b": "keep"}));
        assert!(replace(Some(&mut item), "a", decimal_field));
        let text = item["a"].as_str().expect("decimal text");
        assert_eq!(
            BigDecimal::from_str(text).expect("decimal"),
            BigDecimal::from_str("1234").expect("decimal")
        );
        assert_eq!(item["b"], json!("keep"));
    }

    #[test]
    fn typed_map_uses_transform_result() {
        let mut amounts: HashMap<&str, Option<BigDecimal>> = HashMap::new();
        amounts.insert("stake", None);
        let replaced = replace(Some(&mut amounts), "stake", |_| parse_float_string(Some("1,234")));
        assert!(replaced);
        assert_eq!(amounts["stake"], BigDecimal::from_str("1234").ok());
    }

    #[test]
    fn btree_map_with_owned_keys() {
        let mut fields = BTreeMap::from([("round".to_string(), 41u32)]);
        assert!(replace(Some(&mut fields), "round", |round| round + 1));
        assert_eq!(fields["round"], 42);
    }

    #[test]
    fn missing_key_is_noop() {
        let mut item = Map::new();
        let mut called = false;
        assert!(!replace(Some(&mut item), "a", |value| {
            called = true;
            value
        }));
        assert!(!called);
        assert!(item.is_empty());
    }

    #[test]
    fn absent_mapping_is_noop() {
        let absent: Option<&mut Map<String, Value>> = None;
        assert!(!replace(absent, "a", decimal_field));
    }

    #[test]
    fn field_adapters_null_out_garbage() {
        assert_eq!(decimal_field(json!("abc")), Value::Null);
        assert_eq!(decimal_field(json!(12)), Value::Null);
        assert_eq!(datetime_field(Value::Null), Value::Null);
        assert_eq!(datetime_field(json!("someday")), Value::Null);
        assert_eq!(
            datetime_field(json!("2021-03-04T12:00:00+00:00")),
            json!("2021-03-04T12:00:00Z")
        );
    }
}
