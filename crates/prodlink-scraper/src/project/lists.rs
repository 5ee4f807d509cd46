//! Images, SKU properties, and SKU entries.
//!
//! Each builder walks its candidate paths in order and keeps the first one
//! that yields at least one usable item.

use prodlink_core::{SkuEntry, SkuProperty, SkuPropertyValue};
use serde_json::Value;

use super::lookup::{first_field, first_text, lookup, scalar_text};

const IMAGE_KEYS: [&str; 7] = [
    "fullPathImageURI",
    "imageURI",
    "url",
    "imageUrl",
    "src",
    "image",
    "original",
];
const PROPERTY_NAME_KEYS: [&str; 3] = ["prop", "name", "propertyName"];
const PROPERTY_VALUES_KEYS: [&str; 2] = ["value", "values"];
const VALUE_NAME_KEYS: [&str; 3] = ["name", "valueName", "value"];
const VALUE_IMAGE_KEYS: [&str; 3] = ["imageUrl", "image", "img"];
const SPEC_KEYS: [&str; 4] = ["specAttrs", "specAttributes", "spec", "propPath"];
const SKU_PRICE_KEYS: [&str; 3] = ["price", "salePrice", "discountPrice"];
const STOCK_KEYS: [&str; 3] = ["canBookCount", "stock", "quantity"];

fn first_non_empty<T, S: AsRef<str>>(
    tree: &Value,
    paths: &[S],
    build: impl Fn(&Value) -> Vec<T>,
) -> Vec<T> {
    paths
        .iter()
        .filter_map(|path| lookup(tree, path.as_ref()))
        .map(build)
        .find(|items| !items.is_empty())
        .unwrap_or_default()
}

/// Makes an image reference absolute: `//host/x` gets `https:`, and
/// `img/...` is joined onto `base` when one is known.
pub fn absolute_image(raw: &str, base: Option<&str>) -> String {
    let raw = raw.trim();
    if raw.starts_with("//") {
        return format!("https:{raw}");
    }
    match base {
        Some(base) if raw.starts_with("img/") => {
            format!("{}/{raw}", base.trim_end_matches('/'))
        }
        _ => raw.to_owned(),
    }
}

pub fn images<S: AsRef<str>>(tree: &Value, paths: &[S], base: Option<&str>) -> Vec<String> {
    first_non_empty(tree, paths, |node| {
        let Value::Array(items) = node else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_owned()).filter(|s| !s.is_empty()),
                Value::Object(_) => first_text(item, &IMAGE_KEYS),
                _ => None,
            })
            .map(|raw| absolute_image(&raw, base))
            .collect()
    })
}

pub fn sku_properties<S: AsRef<str>>(
    tree: &Value,
    paths: &[S],
    base: Option<&str>,
) -> Vec<SkuProperty> {
    first_non_empty(tree, paths, |node| {
        let Value::Array(props) = node else {
            return Vec::new();
        };
        props
            .iter()
            .filter_map(|prop| sku_property(prop, base))
            .collect()
    })
}

fn sku_property(prop: &Value, base: Option<&str>) -> Option<SkuProperty> {
    let name = first_text(prop, &PROPERTY_NAME_KEYS)?;
    let Some(Value::Array(raw_values)) = first_field(prop, &PROPERTY_VALUES_KEYS) else {
        return None;
    };
    let values: Vec<SkuPropertyValue> = raw_values
        .iter()
        .filter_map(|value| match value {
            Value::Object(_) => Some(SkuPropertyValue {
                name: first_text(value, &VALUE_NAME_KEYS)?,
                image: first_text(value, &VALUE_IMAGE_KEYS)
                    .map(|img| absolute_image(&img, base)),
            }),
            other => scalar_text(other).map(|name| SkuPropertyValue { name, image: None }),
        })
        .collect();
    if values.is_empty() {
        return None;
    }
    Some(SkuProperty { name, values })
}

/// SKU entries from an array or an id-keyed map. Map entries come out in
/// key order.
pub fn sku_list<S: AsRef<str>>(tree: &Value, paths: &[S]) -> Vec<SkuEntry> {
    first_non_empty(tree, paths, |node| {
        let entries: Vec<&Value> = match node {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => map.values().collect(),
            _ => return Vec::new(),
        };
        entries
            .into_iter()
            .filter(|entry| entry.is_object())
            .map(|entry| SkuEntry {
                spec_attrs: first_text(entry, &SPEC_KEYS)
                    .unwrap_or_default()
                    .replace("&gt;", "|"),
                price: first_text(entry, &SKU_PRICE_KEYS).unwrap_or_default(),
                can_book_count: first_text(entry, &STOCK_KEYS).unwrap_or_default(),
            })
            .collect()
    })
}
