//! Per-family projection tables.
//!
//! Every family ends with the generic `data.*` / `product.*` / `item.*`
//! candidates so API-style responses project the same way as page state.

use std::sync::LazyLock;

use prodlink_core::VendorFamily;
use serde_json::Value;

use super::lookup::{probe, scalar_text};

/// One canonical output field and the ordered paths that may supply it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldProjection {
    pub output_field: &'static str,
    pub candidate_paths: Vec<String>,
    pub default_value: &'static str,
    /// Numbers equal to this are treated as missing (e.g. `0` ids).
    pub unset_number: Option<f64>,
}

impl FieldProjection {
    pub fn new<S: AsRef<str>>(output_field: &'static str, candidate_paths: &[S]) -> Self {
        Self {
            output_field,
            candidate_paths: candidate_paths
                .iter()
                .map(|p| p.as_ref().to_owned())
                .collect(),
            default_value: "",
            unset_number: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default_value: &'static str) -> Self {
        self.default_value = default_value;
        self
    }

    #[must_use]
    pub fn with_unset_number(mut self, unset: f64) -> Self {
        self.unset_number = Some(unset);
        self
    }

    /// The first non-trivial candidate value, if any.
    pub fn probe<'a>(&self, tree: &'a Value) -> Option<&'a Value> {
        probe(tree, &self.candidate_paths, self.unset_number)
    }

    /// The winning candidate rendered as text; `None` means the default
    /// applies.
    pub fn probe_text(&self, tree: &Value) -> Option<String> {
        self.probe(tree).and_then(scalar_text)
    }

    /// Probed text or the declared default.
    pub fn resolve(&self, tree: &Value) -> String {
        self.probe_text(tree)
            .unwrap_or_else(|| self.default_value.to_owned())
    }
}

/// Everything the projector needs to know about one family's state shape.
#[derive(Debug, Clone)]
pub struct ProjectionProfile {
    pub family: VendorFamily,
    pub name: FieldProjection,
    pub source_id: FieldProjection,
    pub max_price: FieldProjection,
    pub description: FieldProjection,
    pub image_paths: Vec<String>,
    pub sku_property_paths: Vec<String>,
    pub sku_list_paths: Vec<String>,
    pub tier_price_paths: Vec<String>,
    pub scalar_price_paths: Vec<String>,
    /// Prefix for relative `img/...` image paths.
    pub image_base: Option<&'static str>,
    /// URL query parameter whose JSON payload carries `item_price`; read
    /// only when the tree holds no price.
    pub url_price_param: Option<&'static str>,
}

const GENERIC_ROOTS: [&str; 5] = ["data", "data.product", "data.item", "product", "item"];

/// 1688 desktop pages nest the offer model here.
const OFFER_MODEL: &str = "result.data.Root.fields.dataJson";

const ALICDN_IMAGE_BASE: &str = "https://cbu01.alicdn.com/";

/// `{root}.{field}` for every generic root, field-major.
fn generic(fields: &[&str]) -> Vec<String> {
    fields
        .iter()
        .flat_map(|field| GENERIC_ROOTS.iter().map(move |root| format!("{root}.{field}")))
        .collect()
}

fn paths(specific: &[&str], fields: &[&str]) -> Vec<String> {
    specific
        .iter()
        .map(|p| (*p).to_owned())
        .chain(generic(fields))
        .collect()
}

fn offer(suffix: &str) -> String {
    format!("{OFFER_MODEL}.{suffix}")
}

fn marketplace_profile(family: VendorFamily) -> ProjectionProfile {
    ProjectionProfile {
        family,
        name: FieldProjection::new("name", &paths(&[], &["name", "title"])),
        source_id: FieldProjection::new(
            "sourceId",
            &paths(&["data.item.itemId"], &["sourceId", "itemId", "productId", "id"]),
        )
        .with_unset_number(0.0),
        max_price: FieldProjection::new("maxPrice", &paths(&[], &["maxPrice"]))
            .with_default("0.00")
            .with_unset_number(0.0),
        description: FieldProjection::new("description", &paths(&[], &["description", "desc"])),
        image_paths: paths(&[], &["images"]),
        sku_property_paths: paths(&["data.skuBase.props"], &["skuProperties"]),
        sku_list_paths: paths(&["data.skuBase.skus"], &["skuList"]),
        tier_price_paths: generic(&["rangePrices"]),
        scalar_price_paths: paths(
            &["data.skuCore.sku2info.0.price.priceText"],
            &["price"],
        ),
        image_base: None,
        url_price_param: Some("utparam"),
    }
}

fn alibaba_profile() -> ProjectionProfile {
    let mut images = vec![
        offer("images"),
        "result.data.gallery.fields.offerImgList".to_owned(),
    ];
    images.extend(generic(&["images"]));

    ProjectionProfile {
        family: VendorFamily::Alibaba1688,
        name: FieldProjection::new(
            "name",
            &paths(&[&offer("tempModel.offerTitle")], &["name", "title"]),
        ),
        source_id: FieldProjection::new(
            "sourceId",
            &paths(&[&offer("tempModel.offerId")], &["sourceId", "offerId", "productId", "id"]),
        )
        .with_unset_number(0.0),
        max_price: FieldProjection::new(
            "maxPrice",
            &paths(
                &["result.data.mainPrice.fields.finalPriceModel.tradeWithoutPromotion.offerMaxPrice"],
                &["maxPrice"],
            ),
        )
        .with_default("0.00")
        .with_unset_number(0.0),
        description: FieldProjection::new("description", &paths(&[], &["description", "desc"])),
        image_paths: images,
        sku_property_paths: paths(&[&offer("skuModel.skuProps")], &["skuProperties"]),
        sku_list_paths: paths(&[&offer("skuModel.skuInfoMap")], &["skuList"]),
        tier_price_paths: paths(
            &[&offer("orderParamModel.orderParam.skuParam.skuRangePrices")],
            &["rangePrices"],
        ),
        scalar_price_paths: generic(&["price"]),
        image_base: Some(ALICDN_IMAGE_BASE),
        url_price_param: None,
    }
}

static PROFILES: LazyLock<[ProjectionProfile; 3]> = LazyLock::new(|| {
    [
        marketplace_profile(VendorFamily::Taobao),
        marketplace_profile(VendorFamily::Tmall),
        alibaba_profile(),
    ]
});

/// The projection profile for `family`.
pub fn profile_for(family: VendorFamily) -> &'static ProjectionProfile {
    let index = match family {
        VendorFamily::Taobao => 0,
        VendorFamily::Tmall => 1,
        VendorFamily::Alibaba1688 => 2,
    };
    &PROFILES[index]
}
