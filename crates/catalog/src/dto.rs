//! Wire shapes of the catalog API.
//!
//! Product records are decoded leniently: the backend stores numbers as
//! strings, blanks as `""` and images either as bare URLs or as objects.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use storefront_core::{AxisId, DomainResult, LinkId, ProductId, ValueId};
use storefront_variations::{
    Dimensions, DraftSeed, FinalizedVariant, ProductImage, ProductSnapshot, ProductStatus,
    ProductType, Shipping, VariationAxis, VariationValue, normalize_name,
};

use crate::error::{CatalogError, CatalogResult};

/// Server-managed keys never copied from a parent into a new draft.
pub const EXCLUDED_FROM_DRAFT: [&str; 5] = ["id", "created_at", "updated_at", "parent_id", "version"];

pub const NEW_PRODUCT_TEMPLATE: &str = "new_product";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisRecord {
    pub id: AxisId,
    pub variation_name: String,
    #[serde(default)]
    pub usage_count: u32,
}

impl From<AxisRecord> for VariationAxis {
    fn from(r: AxisRecord) -> Self {
        VariationAxis {
            id: r.id,
            name: r.variation_name,
            usage_count: r.usage_count,
        }
    }
}

/// Value rows from the list endpoint omit their axis id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRecord {
    pub id: ValueId,
    #[serde(default)]
    pub variation_type_id: Option<AxisId>,
    pub value_name: String,
}

impl ValueRecord {
    pub fn into_value(self, axis_id: AxisId) -> VariationValue {
        VariationValue {
            id: self.id,
            axis_id: self.variation_type_id.unwrap_or(axis_id),
            name: self.value_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAxis {
    pub variation_name: String,
}

impl NewAxis {
    pub fn new(raw_name: &str) -> DomainResult<Self> {
        Ok(Self {
            variation_name: normalize_name(raw_name, "Variation")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewValue {
    pub variation_type_id: AxisId,
    pub value_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
}

impl NewValue {
    pub fn new(axis_id: AxisId, raw_name: &str, product_id: Option<ProductId>) -> DomainResult<Self> {
        Ok(Self {
            variation_type_id: axis_id,
            value_name: normalize_name(raw_name, "Value")?,
            product_id,
        })
    }
}

/// Association of a variant product with one axis/value pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVariationLink {
    pub product_id: ProductId,
    pub variation_type_id: AxisId,
    pub variation_value_id: ValueId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub id: LinkId,
}

/// Create-product payload: an open JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewProduct(Map<String, Value>);

impl NewProduct {
    pub fn from_body(body: Map<String, Value>) -> Self {
        Self(body)
    }

    /// Draft variant payload: every parent field except server-managed keys,
    /// then the seed's name and SKU plus the variant markers.
    pub fn variant(parent: &ProductSnapshot, seed: &DraftSeed) -> Self {
        let mut body = encode_product(parent);
        for key in EXCLUDED_FROM_DRAFT {
            body.remove(key);
        }
        body.insert("name".into(), Value::String(seed.name.clone()));
        body.insert("sku".into(), Value::String(seed.sku.clone()));
        body.insert("parent_id".into(), Value::from(parent.id.get()));
        body.insert("product_type".into(), Value::from(ProductType::Variant.as_str()));
        body.insert("status".into(), Value::from(ProductStatus::Draft.as_str()));
        Self(body)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_body(self) -> Map<String, Value> {
        self.0
    }
}

/// Operator-editable fields sent when a draft is activated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFields {
    pub name: String,
    pub description: String,
    pub short_description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub beginning_inventory: i64,
    pub reorder_qty: i64,
    pub sku: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub width: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub height: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub depth: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub weight: Option<Decimal>,
    pub dimension_unit: String,
    pub weight_unit: String,
    pub ship_method: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub ship_rate: Option<Decimal>,
    pub shipping_services: String,
    pub images: Vec<String>,
}

impl From<&FinalizedVariant> for VariantFields {
    fn from(v: &FinalizedVariant) -> Self {
        Self {
            name: v.name.clone(),
            description: v.description.clone(),
            short_description: v.short_description.clone(),
            price: v.price,
            beginning_inventory: v.inventory,
            reorder_qty: v.inventory,
            sku: v.sku.clone(),
            width: v.dimensions.width,
            height: v.dimensions.height,
            depth: v.dimensions.depth,
            weight: v.dimensions.weight,
            dimension_unit: v.dimensions.dimension_unit.clone(),
            weight_unit: v.dimensions.weight_unit.clone(),
            ship_method: v.shipping.ship_method.clone(),
            ship_rate: v.shipping.ship_rate,
            shipping_services: v.shipping.shipping_services.clone(),
            images: v.image_urls.clone(),
        }
    }
}

impl VariantFields {
    /// Overwrite the matching fields of a stored record.
    pub fn apply_to(&self, product: &mut ProductSnapshot) {
        product.name = self.name.clone();
        product.description = self.description.clone();
        product.short_description = self.short_description.clone();
        product.price = Some(self.price);
        product.available_qty = Some(self.beginning_inventory);
        product.sku = self.sku.clone();
        product.dimensions = Dimensions {
            width: self.width,
            height: self.height,
            depth: self.depth,
            weight: self.weight,
            dimension_unit: self.dimension_unit.clone(),
            weight_unit: self.weight_unit.clone(),
        };
        product.shipping = Shipping {
            ship_method: self.ship_method.clone(),
            ship_rate: self.ship_rate,
            shipping_services: self.shipping_services.clone(),
        };
        product.images = images_from_urls(&self.images);
    }
}

/// Partial product update (`PATCH products/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(flatten)]
    pub fields: Option<VariantFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProductStatus>,
}

impl ProductUpdate {
    pub fn status_only(status: ProductStatus) -> Self {
        Self {
            fields: None,
            status: Some(status),
        }
    }

    pub fn activate_variant(variant: &FinalizedVariant) -> Self {
        Self {
            fields: Some(VariantFields::from(variant)),
            status: Some(ProductStatus::Active),
        }
    }

    pub fn apply_to(&self, product: &mut ProductSnapshot) {
        if let Some(fields) = &self.fields {
            fields.apply_to(product);
        }
        if let Some(status) = self.status {
            product.status = status;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    pub template_key: String,
    pub template_data: Map<String, Value>,
}

impl EmailRequest {
    /// "New product" announcement for an activated variable product.
    pub fn new_product(parent: &ProductSnapshot, variation_count: usize) -> Self {
        let description = if parent.description.is_empty() {
            parent.short_description.clone()
        } else {
            parent.description.clone()
        };
        let price = parent.price.map(|p| format!("${p}")).unwrap_or_default();
        let image = parent
            .images
            .first()
            .map(|i| i.url.clone())
            .unwrap_or_default();

        let mut data = Map::new();
        data.insert("product_name".into(), Value::String(parent.name.clone()));
        data.insert("product_id".into(), Value::from(parent.id.get()));
        data.insert("product_description".into(), Value::String(description));
        data.insert("product_price".into(), Value::String(price));
        data.insert("product_image_url".into(), Value::String(image));
        data.insert(
            "product_variations".into(),
            Value::String(format!("{variation_count} variations available")),
        );

        Self {
            template_key: NEW_PRODUCT_TEMPLATE.to_string(),
            template_data: data,
        }
    }
}

/// Image list entry as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Url(String),
    Object(ProductImage),
}

fn images_from_urls(urls: &[String]) -> Vec<ProductImage> {
    urls.iter()
        .enumerate()
        .map(|(i, url)| ProductImage {
            order: i as u32 + 1,
            is_primary: i == 0,
            ..ProductImage::from_url(url.clone())
        })
        .collect()
}

pub fn decimal_value(d: Decimal) -> Value {
    d.to_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(d.to_string()))
}

fn optional_decimal_value(d: Option<Decimal>) -> Value {
    d.map(decimal_value).unwrap_or(Value::Null)
}

/// Full wire form of a product record (unknown fields first, typed fields win).
pub fn encode_product(p: &ProductSnapshot) -> Map<String, Value> {
    let mut body = p.extra.clone();
    body.insert("id".into(), Value::from(p.id.get()));
    if let Some(parent) = p.parent_id {
        body.insert("parent_id".into(), Value::from(parent.get()));
    }
    if let Some(t) = p.product_type {
        body.insert("product_type".into(), Value::from(t.as_str()));
    }
    body.insert("status".into(), Value::from(p.status.as_str()));
    if let Some(v) = p.version {
        body.insert("version".into(), Value::from(v));
    }
    body.insert("name".into(), Value::String(p.name.clone()));
    body.insert("sku".into(), Value::String(p.sku.clone()));
    body.insert("price".into(), optional_decimal_value(p.price));
    if let Some(qty) = p.available_qty {
        body.insert("available_qty".into(), Value::from(qty));
    }
    body.insert("description".into(), Value::String(p.description.clone()));
    body.insert(
        "short_description".into(),
        Value::String(p.short_description.clone()),
    );

    let d = &p.dimensions;
    body.insert("width".into(), optional_decimal_value(d.width));
    body.insert("height".into(), optional_decimal_value(d.height));
    body.insert("depth".into(), optional_decimal_value(d.depth));
    body.insert("weight".into(), optional_decimal_value(d.weight));
    body.insert("dimension_unit".into(), Value::String(d.dimension_unit.clone()));
    body.insert("weight_unit".into(), Value::String(d.weight_unit.clone()));

    let s = &p.shipping;
    body.insert("ship_method".into(), Value::String(s.ship_method.clone()));
    body.insert("ship_rate".into(), optional_decimal_value(s.ship_rate));
    body.insert(
        "shipping_services".into(),
        Value::String(s.shipping_services.clone()),
    );

    let images = serde_json::to_value(&p.images).unwrap_or(Value::Array(Vec::new()));
    body.insert("images".into(), images);
    body
}

/// Decode a product record, keeping unmodelled fields in `extra`.
pub fn decode_product(value: Value) -> CatalogResult<ProductSnapshot> {
    let Value::Object(mut map) = value else {
        return Err(CatalogError::Parse("product record is not a JSON object".into()));
    };

    let id = integer_field("id", map.remove("id"))?
        .and_then(|v| u64::try_from(v).ok())
        .map(ProductId::new)
        .ok_or_else(|| CatalogError::Parse("product record has no id".into()))?;

    let mut p = ProductSnapshot::new(id, string_field(map.remove("name")).unwrap_or_default());
    p.parent_id = unsigned_field("parent_id", map.remove("parent_id"))?.map(ProductId::new);
    p.product_type = string_field(map.remove("product_type")).and_then(|t| ProductType::from_wire(&t));
    p.status = string_field(map.remove("status"))
        .map(|s| ProductStatus::from_wire(&s))
        .unwrap_or_default();
    p.version = unsigned_field("version", map.remove("version"))?;
    p.sku = string_field(map.remove("sku")).unwrap_or_default();
    p.price = decimal_field("price", map.remove("price"))?;
    p.available_qty = match integer_field("available_qty", map.remove("available_qty"))? {
        Some(qty) => Some(qty),
        None => integer_field("beginning_inventory", map.get("beginning_inventory").cloned())?,
    };
    p.description = string_field(map.remove("description")).unwrap_or_default();
    p.short_description = string_field(map.remove("short_description")).unwrap_or_default();

    let defaults = Dimensions::default();
    p.dimensions = Dimensions {
        width: decimal_field("width", map.remove("width"))?,
        height: decimal_field("height", map.remove("height"))?,
        depth: decimal_field("depth", map.remove("depth"))?,
        weight: decimal_field("weight", map.remove("weight"))?,
        dimension_unit: non_blank(string_field(map.remove("dimension_unit")))
            .unwrap_or(defaults.dimension_unit),
        weight_unit: non_blank(string_field(map.remove("weight_unit"))).unwrap_or(defaults.weight_unit),
    };

    let defaults = Shipping::default();
    p.shipping = Shipping {
        ship_method: non_blank(string_field(map.remove("ship_method"))).unwrap_or(defaults.ship_method),
        ship_rate: decimal_field("ship_rate", map.remove("ship_rate"))?,
        shipping_services: string_field(map.remove("shipping_services")).unwrap_or_default(),
    };

    p.images = images_field(map.remove("images"))?;
    p.extra = map;
    Ok(p)
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

fn string_field(v: Option<Value>) -> Option<String> {
    match v? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_decimal(key: &str, raw: &str) -> CatalogResult<Decimal> {
    raw.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| CatalogError::Parse(format!("{key}: invalid decimal {raw:?}: {e}")))
}

fn decimal_field(key: &str, v: Option<Value>) -> CatalogResult<Option<Decimal>> {
    match v {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => parse_decimal(key, &n.to_string()).map(Some),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => parse_decimal(key, s.trim()).map(Some),
        Some(other) => Err(CatalogError::Parse(format!("{key}: expected a number, got {other}"))),
    }
}

fn integer_field(key: &str, v: Option<Value>) -> CatalogResult<Option<i64>> {
    match v {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| CatalogError::Parse(format!("{key}: expected an integer, got {n}"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|e| CatalogError::Parse(format!("{key}: {e}"))),
        Some(other) => Err(CatalogError::Parse(format!("{key}: expected an integer, got {other}"))),
    }
}

fn unsigned_field(key: &str, v: Option<Value>) -> CatalogResult<Option<u64>> {
    integer_field(key, v)?
        .map(|i| u64::try_from(i).map_err(|_| CatalogError::Parse(format!("{key}: negative value {i}"))))
        .transpose()
}

fn images_field(v: Option<Value>) -> CatalogResult<Vec<ProductImage>> {
    let refs: Vec<ImageRef> = match v {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(v) => serde_json::from_value(v).map_err(|e| CatalogError::Parse(format!("images: {e}")))?,
    };

    Ok(refs
        .into_iter()
        .enumerate()
        .map(|(i, r)| match r {
            ImageRef::Url(url) => ProductImage {
                order: i as u32 + 1,
                is_primary: i == 0,
                ..ProductImage::from_url(url)
            },
            ImageRef::Object(image) => image,
        })
        .collect())
}
