//! Catalog product model as seen by the variation pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use storefront_core::{DomainError, DomainResult, ProductId};

/// Product status lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Draft,
    Active,
    /// Any other server-side status (hidden, deleted, ...).
    Inactive,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
        }
    }

    /// Map a raw status string; unknown statuses are `Inactive`.
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "draft" => ProductStatus::Draft,
            "active" => ProductStatus::Active,
            _ => ProductStatus::Inactive,
        }
    }
}

/// Product shape: standalone, variable parent, or concrete variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Simple,
    Variable,
    Variant,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Simple => "simple",
            ProductType::Variable => "variable",
            ProductType::Variant => "variant",
        }
    }

    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "simple" => Some(ProductType::Simple),
            "variable" => Some(ProductType::Variable),
            "variant" => Some(ProductType::Variant),
            _ => None,
        }
    }
}

pub const DEFAULT_DIMENSION_UNIT: &str = "in";
pub const DEFAULT_WEIGHT_UNIT: &str = "lbs";
pub const DEFAULT_SHIP_METHOD: &str = "free";

/// Package dimensions and weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
    pub depth: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub dimension_unit: String,
    pub weight_unit: String,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            depth: None,
            weight: None,
            dimension_unit: DEFAULT_DIMENSION_UNIT.to_string(),
            weight_unit: DEFAULT_WEIGHT_UNIT.to_string(),
        }
    }
}

/// Shipping configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipping {
    pub ship_method: String,
    pub ship_rate: Option<Decimal>,
    pub shipping_services: String,
}

impl Default for Shipping {
    fn default() -> Self {
        Self {
            ship_method: DEFAULT_SHIP_METHOD.to_string(),
            ship_rate: None,
            shipping_services: String::new(),
        }
    }
}

/// A product image (normalized form).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub friendly_name: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub order: u32,
}

impl ProductImage {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            order: 1,
            ..Self::default()
        }
    }
}

/// Point-in-time copy of a product record (the variable parent or a created draft).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub parent_id: Option<ProductId>,
    pub product_type: Option<ProductType>,
    pub status: ProductStatus,
    /// Server-assigned record version, when the API reports one.
    pub version: Option<u64>,
    pub name: String,
    pub sku: String,
    pub price: Option<Decimal>,
    pub available_qty: Option<i64>,
    pub description: String,
    pub short_description: String,
    pub dimensions: Dimensions,
    pub shipping: Shipping,
    pub images: Vec<ProductImage>,
    /// Fields the pipeline does not model; copied verbatim into drafts.
    pub extra: Map<String, Value>,
}

impl ProductSnapshot {
    /// Minimal snapshot; every optional field empty.
    pub fn new(id: ProductId, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: None,
            product_type: None,
            status: ProductStatus::Draft,
            version: None,
            name: name.into(),
            sku: String::new(),
            price: None,
            available_qty: None,
            description: String::new(),
            short_description: String::new(),
            dimensions: Dimensions::default(),
            shipping: Shipping::default(),
            images: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = sku.into();
        self
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }
}

/// Parse an operator-entered decimal; blank means "not provided".
pub fn parse_optional_decimal(field: &str, raw: &str) -> DomainResult<Option<Decimal>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<Decimal>()
        .map(Some)
        .map_err(|e| DomainError::validation(format!("{field}: {e}")))
}

/// Parse an operator-entered integer; blank means "not provided".
pub fn parse_optional_integer(field: &str, raw: &str) -> DomainResult<Option<i64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|e| DomainError::validation(format!("{field}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn unknown_status_maps_to_inactive() {
        assert_eq!(ProductStatus::from_wire("Active"), ProductStatus::Active);
        assert_eq!(ProductStatus::from_wire("draft"), ProductStatus::Draft);
        assert_eq!(ProductStatus::from_wire("hidden"), ProductStatus::Inactive);
    }

    #[test]
    fn product_type_round_trips_through_wire_names() {
        for t in [ProductType::Simple, ProductType::Variable, ProductType::Variant] {
            assert_eq!(ProductType::from_wire(t.as_str()), Some(t));
        }
        assert_eq!(ProductType::from_wire("bundle"), None);
    }

    #[test]
    fn defaults_use_inches_pounds_and_free_shipping() {
        let d = Dimensions::default();
        assert_eq!(d.dimension_unit, "in");
        assert_eq!(d.weight_unit, "lbs");
        assert_eq!(Shipping::default().ship_method, "free");
    }

    #[test]
    fn blank_form_values_are_not_provided() {
        assert_eq!(parse_optional_decimal("width", "  ").unwrap(), None);
        assert_eq!(
            parse_optional_decimal("width", "4.5").unwrap(),
            Some(Decimal::new(45, 1))
        );
        assert!(parse_optional_decimal("width", "four").is_err());
        assert_eq!(parse_optional_integer("inventory", "").unwrap(), None);
        assert_eq!(parse_optional_integer("inventory", "12").unwrap(), Some(12));
    }
}
