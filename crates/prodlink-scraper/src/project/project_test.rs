use prodlink_core::{PriceRange, OPEN_TIER_END};
use serde_json::{json, Value};

use super::*;

const OFFER_URL: &str = "https://detail.1688.com/offer/953742824238.html";
const TAOBAO_URL: &str = "https://item.taobao.com/item.htm?id=123456789";

fn offer_state() -> Value {
    json!({
        "result": {"data": {
            "Root": {"fields": {"dataJson": {
                "tempModel": {"offerTitle": "Cotton T-shirt", "offerId": 953_742_824_238_u64},
                "images": [
                    {"fullPathImageURI": "https://cbu01.alicdn.com/img/ibank/a.jpg"},
                    {"imageURI": "img/ibank/b.jpg"}
                ],
                "skuModel": {
                    "skuProps": [
                        {"prop": "Color", "value": [
                            {"name": "Red", "imageUrl": "https://cbu01.alicdn.com/img/red.jpg"},
                            {"name": "Blue"}
                        ]},
                        {"prop": "Size", "value": [{"name": "M"}, {"name": "XL"}]}
                    ],
                    "skuInfoMap": {
                        "Red&gt;M": {"specAttrs": "Red&gt;M", "canBookCount": 120},
                        "Blue&gt;XL": {"specAttrs": "Blue&gt;XL", "canBookCount": 8}
                    }
                },
                "orderParamModel": {"orderParam": {"skuParam": {"skuRangePrices": [
                    {"beginAmount": 2, "price": "15.00"},
                    {"beginAmount": 50, "price": "13.50"},
                    {"beginAmount": 200, "price": "12.00"}
                ]}}}
            }}},
            "mainPrice": {"fields": {"finalPriceModel": {"tradeWithoutPromotion": {
                "offerMaxPrice": "15.00"
            }}}}
        }}
    })
}

#[test]
fn offer_state_projects_every_field() {
    let product = project(&offer_state(), OFFER_URL).unwrap();

    assert_eq!(product.name, "Cotton T-shirt");
    assert_eq!(product.source_id, "953742824238");
    assert_eq!(product.source_type, VendorFamily::Alibaba1688);
    assert_eq!(product.url, OFFER_URL);
    assert_eq!(
        product.images,
        vec![
            "https://cbu01.alicdn.com/img/ibank/a.jpg",
            "https://cbu01.alicdn.com/img/ibank/b.jpg",
        ]
    );
    assert_eq!(product.sku_properties.len(), 2);
    let option_values: usize = product.sku_properties.iter().map(|p| p.values.len()).sum();
    assert_eq!(option_values, 4);
    assert_eq!(product.sku_list.len(), 2);
    assert!(product.sku_list.iter().any(|s| s.spec_attrs == "Red|M"));
    assert_eq!(product.max_price, "15.00");

    let bounds: Vec<(i64, i64)> = product
        .price_ranges
        .iter()
        .map(|r| (r.begin_amount, r.end_amount))
        .collect();
    assert_eq!(bounds, vec![(2, 49), (50, 199), (200, OPEN_TIER_END)]);
    assert!((product.price_ranges[1].price - 13.5).abs() < f64::EPSILON);
}

#[test]
fn raw_data_envelope_is_unwrapped() {
    let wrapped = json!({"status": "ok", "raw_data": offer_state()});
    let direct = project(&offer_state(), OFFER_URL).unwrap();
    assert_eq!(project(&wrapped, OFFER_URL).unwrap(), direct);
}

#[test]
fn max_price_falls_back_to_highest_tier() {
    let mut state = offer_state();
    state["result"]["data"]
        .as_object_mut()
        .unwrap()
        .remove("mainPrice");
    let product = project(&state, OFFER_URL).unwrap();
    assert_eq!(product.max_price, "15.00");
}

#[test]
fn api_style_tree_uses_generic_paths() {
    let tree = json!({"data": {
        "id": 0,
        "productId": "55512",
        "sourceId": "",
        "product": {"title": "Desk lamp", "images": ["//img.alicdn.com/lamp.jpg"]},
        "price": "19.99",
        "description": "Warm white"
    }});
    let product = project(&tree, TAOBAO_URL).unwrap();

    assert_eq!(product.name, "Desk lamp");
    assert_eq!(product.images, vec!["https://img.alicdn.com/lamp.jpg"]);
    assert_eq!(product.price_ranges, vec![PriceRange::single(19.99)]);
    assert_eq!(product.max_price, "19.99");
    assert_eq!(product.description.as_deref(), Some("Warm white"));
    assert_eq!(product.source_id, "55512");
}

#[test]
fn source_id_falls_back_to_url() {
    let tree = json!({"item": {"title": "Mug", "id": 0}});
    let product = project(&tree, TAOBAO_URL).unwrap();
    assert_eq!(product.source_id, "123456789");
}

#[test]
fn source_type_comes_from_url_not_tree() {
    let tree = json!({"data": {"title": "Mug", "sourceType": "1688"}});
    let product = project(&tree, "https://detail.tmall.com/item.htm?id=555666777").unwrap();
    assert_eq!(product.source_type, VendorFamily::Tmall);
}

#[test]
fn unrecognized_tree_is_a_schema_mismatch() {
    let tree = json!({"result": {"data": {"unrelated": true}}});
    let err = project(&tree, OFFER_URL).unwrap_err();
    assert!(
        matches!(err, ProjectError::SchemaMismatch { family: VendorFamily::Alibaba1688 }),
        "got {err:?}"
    );
}

#[test]
fn unknown_url_is_rejected() {
    let err = project(&offer_state(), "https://example.com/p/1").unwrap_err();
    assert!(matches!(err, ProjectError::UnsupportedUrl { .. }), "got {err:?}");
}

#[test]
fn explicit_family_skips_url_classification() {
    let product = project_with_family(&offer_state(), VendorFamily::Alibaba1688, "").unwrap();
    assert_eq!(product.source_id, "953742824238");
    assert_eq!(product.url, "");
}

#[test]
fn taobao_price_falls_back_to_url_tracking_parameter() {
    let url = "https://item.taobao.com/item.htm?id=123456789&utparam=%7B%22item_price%22%3A%2229.90%22%7D";
    let tree = json!({"data": {"title": "Desk lamp"}});
    let product = project(&tree, url).unwrap();

    assert_eq!(product.price_ranges, vec![PriceRange::single(29.9)]);
    assert_eq!(product.max_price, "29.90");
}

#[test]
fn tree_price_wins_over_url_tracking_parameter() {
    let url = "https://detail.tmall.com/item.htm?id=555666777&utparam=%7B%22item_price%22%3A99%7D";
    let tree = json!({"data": {"title": "Mug", "price": "12.00"}});
    let product = project(&tree, url).unwrap();
    assert_eq!(product.price_ranges, vec![PriceRange::single(12.0)]);
}

#[test]
fn url_price_alone_does_not_satisfy_projection() {
    let url = "https://item.taobao.com/item.htm?id=123456789&utparam=%7B%22item_price%22%3A5%7D";
    let err = project(&json!({"unrelated": 1}), url).unwrap_err();
    assert!(matches!(err, ProjectError::SchemaMismatch { .. }), "got {err:?}");
}
