//! Per-combination draft records and the edits applied to them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::{DomainResult, ProductId};

use crate::combination::{Combination, derive_sku};
use crate::product::{
    Dimensions, ProductImage, ProductSnapshot, ProductStatus, Shipping, parse_optional_decimal,
};

/// Inventory assumed for a draft when the parent reports none.
pub const DEFAULT_INVENTORY: i64 = 10;

/// Name and SKU a draft will be created with, derived from the parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSeed {
    /// Zero-based position in the selected combination list.
    pub index: usize,
    pub combination: Combination,
    pub combination_name: String,
    pub name: String,
    pub sku: String,
}

impl DraftSeed {
    pub fn for_combination(parent: &ProductSnapshot, combination: &Combination, index: usize) -> Self {
        let combination_name = combination.display_name();
        Self {
            index,
            name: format!("{} - {}", parent.name, combination_name),
            sku: derive_sku(&parent.sku, &combination_name, index),
            combination: combination.clone(),
            combination_name,
        }
    }
}

/// A persisted draft variant, annotated for editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantDraft {
    pub id: ProductId,
    /// Version observed when the draft was created.
    pub version: Option<u64>,
    pub combination: Combination,
    pub combination_name: String,
    pub status: ProductStatus,
    pub name: String,
    pub sku: String,
    pub price: Option<Decimal>,
    pub inventory: i64,
    pub description: String,
    pub short_description: String,
    pub dimensions: Dimensions,
    pub shipping: Shipping,
    pub images: Vec<ProductImage>,
}

impl VariantDraft {
    /// Annotate the record returned by the catalog with its originating combination.
    pub fn from_created(seed: DraftSeed, record: ProductSnapshot) -> Self {
        Self {
            id: record.id,
            version: record.version,
            combination: seed.combination,
            combination_name: seed.combination_name,
            status: record.status,
            name: record.name,
            sku: record.sku,
            price: record.price,
            inventory: record.available_qty.unwrap_or(DEFAULT_INVENTORY),
            description: record.description,
            short_description: record.short_description,
            dimensions: record.dimensions,
            shipping: record.shipping,
            images: record.images,
        }
    }
}

/// One nested dimension field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionEdit {
    Width(Option<Decimal>),
    Height(Option<Decimal>),
    Depth(Option<Decimal>),
    Weight(Option<Decimal>),
    DimensionUnit(String),
    WeightUnit(String),
}

impl DimensionEdit {
    pub fn apply(self, dims: &mut Dimensions) {
        match self {
            DimensionEdit::Width(v) => dims.width = v,
            DimensionEdit::Height(v) => dims.height = v,
            DimensionEdit::Depth(v) => dims.depth = v,
            DimensionEdit::Weight(v) => dims.weight = v,
            DimensionEdit::DimensionUnit(u) => dims.dimension_unit = u,
            DimensionEdit::WeightUnit(u) => dims.weight_unit = u,
        }
    }
}

/// One nested shipping field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShippingEdit {
    Method(String),
    Rate(Option<Decimal>),
    Services(String),
}

impl ShippingEdit {
    pub fn apply(self, shipping: &mut Shipping) {
        match self {
            ShippingEdit::Method(m) => shipping.ship_method = m,
            ShippingEdit::Rate(r) => shipping.ship_rate = r,
            ShippingEdit::Services(s) => shipping.shipping_services = s,
        }
    }
}

/// A single-field edit on one draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Name(String),
    Sku(String),
    Price(Option<Decimal>),
    Inventory(i64),
    Description(String),
    ShortDescription(String),
    Dimension(DimensionEdit),
    Shipping(ShippingEdit),
}

impl FieldEdit {
    pub fn apply(self, draft: &mut VariantDraft) {
        match self {
            FieldEdit::Name(v) => draft.name = v,
            FieldEdit::Sku(v) => draft.sku = v,
            FieldEdit::Price(v) => draft.price = v,
            FieldEdit::Inventory(v) => draft.inventory = v,
            FieldEdit::Description(v) => draft.description = v,
            FieldEdit::ShortDescription(v) => draft.short_description = v,
            FieldEdit::Dimension(edit) => edit.apply(&mut draft.dimensions),
            FieldEdit::Shipping(edit) => edit.apply(&mut draft.shipping),
        }
    }
}

/// Bulk dimension override; `None` fields leave each record's value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionsPatch {
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
    pub depth: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub dimension_unit: Option<String>,
    pub weight_unit: Option<String>,
}

impl DimensionsPatch {
    /// Build from raw form inputs (blank = not filled in).
    pub fn from_form(
        width: &str,
        height: &str,
        depth: &str,
        weight: &str,
    ) -> DomainResult<Self> {
        Ok(Self {
            width: parse_optional_decimal("width", width)?,
            height: parse_optional_decimal("height", height)?,
            depth: parse_optional_decimal("depth", depth)?,
            weight: parse_optional_decimal("weight", weight)?,
            dimension_unit: None,
            weight_unit: None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.width.is_none()
            && self.height.is_none()
            && self.depth.is_none()
            && self.weight.is_none()
            && self.dimension_unit.is_none()
            && self.weight_unit.is_none()
    }

    pub fn apply_to(&self, dims: &mut Dimensions) {
        if let Some(v) = self.width {
            dims.width = Some(v);
        }
        if let Some(v) = self.height {
            dims.height = Some(v);
        }
        if let Some(v) = self.depth {
            dims.depth = Some(v);
        }
        if let Some(v) = self.weight {
            dims.weight = Some(v);
        }
        if let Some(u) = &self.dimension_unit {
            dims.dimension_unit = u.clone();
        }
        if let Some(u) = &self.weight_unit {
            dims.weight_unit = u.clone();
        }
    }
}

/// A draft that passed validation, ready to be activated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedVariant {
    pub id: ProductId,
    pub version: Option<u64>,
    pub combination_name: String,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub inventory: i64,
    pub description: String,
    pub short_description: String,
    pub dimensions: Dimensions,
    pub shipping: Shipping,
    pub image_urls: Vec<String>,
}

impl FinalizedVariant {
    /// Equal field values, whatever version either side was read at.
    pub fn same_fields(&self, other: &FinalizedVariant) -> bool {
        let rebased = FinalizedVariant {
            version: other.version,
            ..self.clone()
        };
        rebased == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combination::CombinationPart;
    use storefront_core::{AxisId, ValueId};

    fn red_small() -> Combination {
        Combination::new(vec![
            CombinationPart {
                axis_id: AxisId::new(1),
                axis_name: "Color".into(),
                value_id: ValueId::new(10),
                value_name: "Red".into(),
            },
            CombinationPart {
                axis_id: AxisId::new(2),
                axis_name: "Size".into(),
                value_id: ValueId::new(20),
                value_name: "S".into(),
            },
        ])
    }

    #[test]
    fn seed_derives_name_and_sku_from_parent() {
        let parent = ProductSnapshot::new(ProductId::new(1), "Mug").with_sku("MUG");
        let seed = DraftSeed::for_combination(&parent, &red_small(), 0);
        assert_eq!(seed.name, "Mug - Red × S");
        assert_eq!(seed.sku, "MUG-RES");
        assert_eq!(seed.combination_name, "Red × S");
    }

    #[test]
    fn from_created_defaults_missing_inventory() {
        let parent = ProductSnapshot::new(ProductId::new(1), "Mug");
        let seed = DraftSeed::for_combination(&parent, &red_small(), 2);
        let mut record = ProductSnapshot::new(ProductId::new(9), seed.name.clone());
        record.version = Some(1);

        let draft = VariantDraft::from_created(seed, record);
        assert_eq!(draft.id, ProductId::new(9));
        assert_eq!(draft.inventory, DEFAULT_INVENTORY);
        assert_eq!(draft.version, Some(1));
        assert_eq!(draft.combination_name, "Red × S");
    }

    #[test]
    fn dimensions_patch_only_overrides_filled_fields() {
        let mut dims = Dimensions {
            width: Some(Decimal::new(3, 0)),
            height: Some(Decimal::new(7, 0)),
            ..Dimensions::default()
        };
        let patch = DimensionsPatch::from_form("5", "", " ", "").unwrap();
        patch.apply_to(&mut dims);

        assert_eq!(dims.width, Some(Decimal::new(5, 0)));
        assert_eq!(dims.height, Some(Decimal::new(7, 0)));
        assert_eq!(dims.depth, None);
    }

    #[test]
    fn nested_edits_touch_one_field() {
        let mut shipping = Shipping::default();
        ShippingEdit::Rate(Some(Decimal::new(499, 2))).apply(&mut shipping);
        assert_eq!(shipping.ship_method, "free");
        assert_eq!(shipping.ship_rate, Some(Decimal::new(499, 2)));
    }
}
