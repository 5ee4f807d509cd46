//! Projection of parsed vendor state into [`NormalizedProduct`].
//!
//! The family always comes from the product URL through the domain
//! registry, never from the tree itself.

mod lists;
mod lookup;
mod prices;
mod profiles;

use prodlink_core::{
    extract_product_id, family_for_url, NormalizedProduct, PriceRange, VendorFamily,
};
use serde_json::Value;

use crate::error::ProjectError;

pub use lists::absolute_image;
pub use lookup::{is_non_trivial, lookup, probe};
pub use profiles::{profile_for, FieldProjection, ProjectionProfile};

/// Key under which transform endpoints wrap the raw page state.
const RAW_DATA_ENVELOPE: &str = "raw_data";

/// Projects `tree` for the product at `url`.
///
/// # Errors
///
/// - [`ProjectError::UnsupportedUrl`] when `url` belongs to no known family.
/// - [`ProjectError::SchemaMismatch`] when nothing in the tree matched.
pub fn project(tree: &Value, url: &str) -> Result<NormalizedProduct, ProjectError> {
    let family = family_for_url(url).ok_or_else(|| ProjectError::UnsupportedUrl {
        url: url.to_owned(),
    })?;
    project_with_family(tree, family, url)
}

/// Projects `tree` with the profile for `family`.
///
/// # Errors
///
/// Returns [`ProjectError::SchemaMismatch`] when every tree-derived field
/// fell back to its default.
pub fn project_with_family(
    tree: &Value,
    family: VendorFamily,
    url: &str,
) -> Result<NormalizedProduct, ProjectError> {
    let tree = unwrap_envelope(tree);
    let profile = profile_for(family);
    let base = profile.image_base;

    let name = profile.name.probe_text(tree);
    let tree_source_id = profile.source_id.probe_text(tree);
    let description = profile.description.probe_text(tree);
    let explicit_max = profile.max_price.probe(tree);
    let images = lists::images(tree, &profile.image_paths, base);
    let sku_properties = lists::sku_properties(tree, &profile.sku_property_paths, base);
    let sku_list = lists::sku_list(tree, &profile.sku_list_paths);
    let price_ranges =
        prices::price_ranges(tree, &profile.tier_price_paths, &profile.scalar_price_paths);

    let matched_anything = name.is_some()
        || tree_source_id.is_some()
        || description.is_some()
        || explicit_max.is_some()
        || !images.is_empty()
        || !sku_properties.is_empty()
        || !sku_list.is_empty()
        || !price_ranges.is_empty();
    if !matched_anything {
        tracing::warn!(family = %family, url, "state tree matched no projection");
        return Err(ProjectError::SchemaMismatch { family });
    }

    let price_ranges = if price_ranges.is_empty() {
        profile
            .url_price_param
            .and_then(|param| prices::url_param_price(url, param))
            .map(|price| {
                tracing::debug!(family = %family, price, "price recovered from URL");
                vec![PriceRange::single(price)]
            })
            .unwrap_or_default()
    } else {
        price_ranges
    };
    let max_price = prices::max_price(explicit_max, &price_ranges, profile.max_price.default_value);
    let source_id = tree_source_id
        .or_else(|| extract_product_id(url))
        .unwrap_or_else(|| profile.source_id.default_value.to_owned());

    tracing::debug!(
        family = %family,
        source_id = %source_id,
        images = images.len(),
        skus = sku_list.len(),
        tiers = price_ranges.len(),
        "projected product"
    );

    Ok(NormalizedProduct {
        name: name.unwrap_or_else(|| profile.name.default_value.to_owned()),
        images,
        sku_properties,
        sku_list,
        price_ranges,
        max_price,
        source_id,
        source_type: family,
        url: url.to_owned(),
        description,
    })
}

fn unwrap_envelope(tree: &Value) -> &Value {
    match tree.get(RAW_DATA_ENVELOPE) {
        Some(inner) if inner.is_object() => inner,
        _ => tree,
    }
}

#[cfg(test)]
#[path = "project_test.rs"]
mod tests;
