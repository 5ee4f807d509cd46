//! Safe nested lookup over parsed state trees.

use serde_json::Value;

/// Follows a dot-separated path. Numeric segments index arrays; on objects
/// they are ordinary keys. Any absent key or scalar intermediate yields
/// `None`.
pub fn lookup<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(tree, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Whether `value` counts as found when probing candidates.
///
/// Null, blank strings, empty containers, and numbers equal to `unset` are
/// all treated as missing.
pub fn is_non_trivial(value: &Value, unset: Option<f64>) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(_) => true,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Number(n) => match (n.as_f64(), unset) {
            (Some(v), Some(unset)) => (v - unset).abs() > f64::EPSILON,
            _ => true,
        },
    }
}

/// First non-trivial value among `paths`.
pub fn probe<'a, S: AsRef<str>>(
    tree: &'a Value,
    paths: &[S],
    unset: Option<f64>,
) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|path| lookup(tree, path.as_ref()))
        .find(|value| is_non_trivial(value, unset))
}

/// First non-trivial value under one of `keys` of an object.
pub fn first_field<'a>(object: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| is_non_trivial(value, None))
}

/// Renders a scalar as text. Strings are trimmed; containers and null give
/// `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_owned()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn first_text(object: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find_map(scalar_text)
}

/// Numeric value of a number or a numeric string.
pub fn as_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

/// Integral value; fractional inputs are truncated.
#[allow(clippy::cast_possible_truncation)]
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn lookup_walks_objects_and_arrays() {
        let tree = json!({"a": {"b": [{"c": 1}, {"c": 2}]}, "m": {"0": "zero"}});
        assert_eq!(lookup(&tree, "a.b.1.c"), Some(&json!(2)));
        assert_eq!(lookup(&tree, "m.0"), Some(&json!("zero")));
        assert_eq!(lookup(&tree, "a.x.c"), None);
        assert_eq!(lookup(&tree, "a.b.c"), None);
        assert_eq!(lookup(&tree, "a.b.1.c.d"), None);
    }

    #[test]
    fn trivial_values_are_skipped_by_probe() {
        let tree = json!({"data": {"id": 0, "blank": "  ", "list": [], "productId": "55512"}});
        let paths = ["data.sourceId", "data.blank", "data.list", "data.id", "data.productId"];
        assert_eq!(probe(&tree, &paths, Some(0.0)), Some(&json!("55512")));
    }

    #[test]
    fn zero_counts_when_no_unset_sentinel() {
        let tree = json!({"stock": 0});
        assert_eq!(probe(&tree, &["stock"], None), Some(&json!(0)));
    }

    #[test]
    fn numeric_helpers_accept_strings() {
        assert_eq!(as_f64(&json!(" 19.99 ")), Some(19.99));
        assert_eq!(as_f64(&json!("abc")), None);
        assert_eq!(as_i64(&json!("10")), Some(10));
        assert_eq!(as_i64(&json!(2.9)), Some(2));
        assert_eq!(scalar_text(&json!(953_742_824_238_u64)).as_deref(), Some("953742824238"));
    }
}
