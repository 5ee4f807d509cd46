use serde::{Deserialize, Serialize};

use crate::registry::VendorFamily;

/// Upper bound used for the open-ended last quantity tier.
pub const OPEN_TIER_END: i64 = 999_999;

/// A vendor product projected into the canonical schema shared by every
/// vendor family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedProduct {
    pub name: String,
    pub images: Vec<String>,
    pub sku_properties: Vec<SkuProperty>,
    pub sku_list: Vec<SkuEntry>,
    pub price_ranges: Vec<PriceRange>,
    /// Highest listed price as a decimal string, e.g. `"19.99"`.
    pub max_price: String,
    /// Vendor product id, stored as a string to avoid precision loss.
    pub source_id: String,
    /// Always derived from `url` through the Domain Registry.
    pub source_type: VendorFamily,
    /// Canonical desktop product URL.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One selectable dimension, e.g. colour or size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuProperty {
    pub name: String,
    pub values: Vec<SkuPropertyValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuPropertyValue {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A purchasable combination of property values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuEntry {
    /// Property values joined by `|`, e.g. `"Red|XL"`.
    pub spec_attrs: String,
    /// Price as the vendor reported it; empty when only tier prices exist.
    pub price: String,
    pub can_book_count: String,
}

/// Quantity-tier pricing. Bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub begin_amount: i64,
    pub end_amount: i64,
    pub price: f64,
    pub discount_price: f64,
}

impl PriceRange {
    /// The single open tier synthesized from a scalar price.
    #[must_use]
    pub fn single(price: f64) -> Self {
        Self {
            begin_amount: 1,
            end_amount: OPEN_TIER_END,
            price,
            discount_price: price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_product(price_ranges: Vec<PriceRange>) -> NormalizedProduct {
        NormalizedProduct {
            name: "Cotton T-shirt".to_string(),
            images: vec!["https://cbu01.alicdn.com/img/a.jpg".to_string()],
            sku_properties: vec![
                SkuProperty {
                    name: "Color".to_string(),
                    values: vec![
                        SkuPropertyValue {
                            name: "Red".to_string(),
                            image: None,
                        },
                        SkuPropertyValue {
                            name: "Blue".to_string(),
                            image: Some("https://cbu01.alicdn.com/img/b.jpg".to_string()),
                        },
                    ],
                },
                SkuProperty {
                    name: "Size".to_string(),
                    values: vec![SkuPropertyValue {
                        name: "XL".to_string(),
                        image: None,
                    }],
                },
            ],
            sku_list: vec![],
            price_ranges,
            max_price: "12.50".to_string(),
            source_id: "953742824238".to_string(),
            source_type: VendorFamily::Alibaba1688,
            url: "https://detail.1688.com/offer/953742824238.html".to_string(),
            description: None,
        }
    }

    #[test]
    fn tier_for_quantity_picks_matching_range() {
        let product = make_product(vec![
            PriceRange {
                begin_amount: 1,
                end_amount: 9,
                price: 12.5,
                discount_price: 12.5,
            },
            PriceRange {
                begin_amount: 10,
                end_amount: OPEN_TIER_END,
                price: 10.0,
                discount_price: 10.0,
            },
        ]);
        assert!((product.tier_for_quantity(5).unwrap().price - 12.5).abs() < f64::EPSILON);
        assert!((product.tier_for_quantity(10).unwrap().price - 10.0).abs() < f64::EPSILON);
        assert!(product.tier_for_quantity(0).is_none());
    }

    #[test]
    fn single_tier_spans_open_range() {
        let tier = PriceRange::single(19.99);
        assert_eq!(tier.begin_amount, 1);
        assert_eq!(tier.end_amount, OPEN_TIER_END);
        assert!((tier.discount_price - 19.99).abs() < f64::EPSILON);
    }

    #[test]
    fn option_value_count_sums_all_properties() {
        assert_eq!(make_product(vec![]).option_value_count(), 3);
    }

    #[test]
    fn serializes_with_camel_case_and_family_id() {
        let json = serde_json::to_value(make_product(vec![PriceRange::single(1.0)])).unwrap();
        assert_eq!(json["sourceType"], "1688");
        assert_eq!(json["maxPrice"], "12.50");
        assert_eq!(json["priceRanges"][0]["endAmount"], 999_999);
        assert!(json.get("description").is_none());
        assert!(json["skuProperties"][0]["values"][0].get("image").is_none());
    }
}
