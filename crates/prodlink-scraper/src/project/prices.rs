use percent_encoding::percent_decode_str;
use prodlink_core::{PriceRange, OPEN_TIER_END};
use reqwest::Url;
use serde_json::Value;

use super::lookup::{as_f64, as_i64, first_field, lookup, probe};

const BEGIN_KEYS: [&str; 3] = ["beginAmount", "minQuantity", "begin"];
const END_KEYS: [&str; 3] = ["endAmount", "maxQuantity", "end"];
const PRICE_KEYS: [&str; 2] = ["price", "unitPrice"];
const DISCOUNT_KEYS: [&str; 1] = ["discountPrice"];

/// Quantity tiers from the first candidate path holding a non-empty tier
/// list; otherwise one open tier built from the first scalar price.
pub fn price_ranges<S: AsRef<str>>(
    tree: &Value,
    tier_paths: &[S],
    scalar_paths: &[S],
) -> Vec<PriceRange> {
    let tiers = tier_paths
        .iter()
        .filter_map(|path| lookup(tree, path.as_ref()))
        .map(tiers_from)
        .find(|tiers| !tiers.is_empty());
    if let Some(tiers) = tiers {
        return tiers;
    }

    probe(tree, scalar_paths, Some(0.0))
        .and_then(as_f64)
        .map(|price| vec![PriceRange::single(price)])
        .unwrap_or_default()
}

/// `item_price` from the JSON payload in `url`'s `param` query value.
///
/// Share links land on item URLs whose tracking parameter is percent-encoded
/// twice, so the value is decoded once more after query parsing.
pub fn url_param_price(url: &str, param: &str) -> Option<f64> {
    let parsed = Url::parse(url).ok()?;
    let (_, raw) = parsed.query_pairs().find(|(key, _)| key == param)?;
    let decoded = percent_decode_str(&raw).decode_utf8_lossy();
    let payload: Value = match serde_json::from_str(&decoded) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::debug!(param, error = %err, "price parameter is not JSON");
            return None;
        }
    };
    payload
        .get("item_price")
        .and_then(as_f64)
        .filter(|price| *price > 0.0)
}

fn int_field(entry: &Value, keys: &[&str]) -> Option<i64> {
    first_field(entry, keys).and_then(as_i64).filter(|n| *n > 0)
}

fn price_field(entry: &Value, keys: &[&str]) -> Option<f64> {
    first_field(entry, keys).and_then(as_f64)
}

/// Builds inclusive tiers. A missing end closes one below the next tier's
/// start, or stays open for the last tier.
fn tiers_from(node: &Value) -> Vec<PriceRange> {
    let Value::Array(entries) = node else {
        return Vec::new();
    };
    let entries: Vec<&Value> = entries.iter().filter(|e| e.is_object()).collect();

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let begin_amount = int_field(entry, &BEGIN_KEYS).unwrap_or(1);
            let end_amount = int_field(entry, &END_KEYS).unwrap_or_else(|| {
                entries
                    .get(i + 1)
                    .and_then(|next| int_field(next, &BEGIN_KEYS))
                    .map_or(OPEN_TIER_END, |next_begin| next_begin - 1)
            });
            let price = price_field(entry, &PRICE_KEYS).unwrap_or(0.0);
            let discount_price = price_field(entry, &DISCOUNT_KEYS).unwrap_or(price);
            PriceRange {
                begin_amount,
                end_amount,
                price,
                discount_price,
            }
        })
        .collect()
}

/// Explicit max price when present, else the highest tier price, always
/// with two decimals for numbers.
pub fn max_price(explicit: Option<&Value>, tiers: &[PriceRange], default: &str) -> String {
    if let Some(value) = explicit {
        match value {
            Value::Number(_) => {
                if let Some(n) = as_f64(value) {
                    return format!("{n:.2}");
                }
            }
            Value::String(s) if !s.trim().is_empty() => return s.trim().to_owned(),
            _ => {}
        }
    }
    tiers
        .iter()
        .map(|tier| tier.price)
        .reduce(f64::max)
        .map_or_else(|| default.to_owned(), |max| format!("{max:.2}"))
}
