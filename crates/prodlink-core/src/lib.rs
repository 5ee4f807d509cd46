pub mod app_config;
pub mod config;
pub mod products;
pub mod registry;
pub mod resolution;

pub use app_config::{AppConfig, Environment, EvaluatorKind};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{
    NormalizedProduct, PriceRange, SkuEntry, SkuProperty, SkuPropertyValue, OPEN_TIER_END,
};
pub use registry::{
    classify_host, classify_url, extract_product_id, families, family_for_scheme,
    family_for_url, is_canonical_url, DomainFamily, HostKind, VendorFamily,
};
pub use resolution::{ResolutionMethod, ResolutionResult, ResolveError, ResolveErrorKind};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
