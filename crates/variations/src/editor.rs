//! In-memory editor over the created drafts.
//!
//! Nothing here performs IO. Edits stay local until the drafts are finalized
//! and handed to activation.

use rust_decimal::Decimal;

use storefront_core::{DomainError, DomainResult, ProductId};

use crate::draft::{DimensionsPatch, FieldEdit, FinalizedVariant, VariantDraft};
use crate::product::{ProductImage, parse_optional_decimal, parse_optional_integer};
use crate::validation::{ValidationReport, validate_drafts};

/// Values the operator entered in the "apply to all" panel.
///
/// `None` (or a blank text) means the field was left empty and is not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOverride {
    pub price: Option<Decimal>,
    pub inventory: Option<i64>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub dimensions: DimensionsPatch,
}

impl BulkOverride {
    /// Build from raw form strings.
    pub fn from_form(
        price: &str,
        inventory: &str,
        description: &str,
        short_description: &str,
        dimensions: DimensionsPatch,
    ) -> DomainResult<Self> {
        Ok(Self {
            price: parse_optional_decimal("price", price)?,
            inventory: parse_optional_integer("inventory", inventory)?,
            description: non_blank(description),
            short_description: non_blank(short_description),
            dimensions,
        })
    }
}

fn non_blank(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkFieldEditor {
    drafts: Vec<VariantDraft>,
}

impl BulkFieldEditor {
    pub fn new(drafts: Vec<VariantDraft>) -> Self {
        Self { drafts }
    }

    pub fn drafts(&self) -> &[VariantDraft] {
        &self.drafts
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&VariantDraft> {
        self.drafts.get(index)
    }

    pub fn into_drafts(self) -> Vec<VariantDraft> {
        self.drafts
    }

    fn draft_mut(&mut self, index: usize) -> DomainResult<&mut VariantDraft> {
        self.drafts
            .get_mut(index)
            .ok_or_else(|| DomainError::not_found(format!("variation #{}", index + 1)))
    }

    /// Overwrite one field of one record.
    pub fn edit(&mut self, index: usize, edit: FieldEdit) -> DomainResult<()> {
        edit.apply(self.draft_mut(index)?);
        Ok(())
    }

    pub fn add_images(&mut self, index: usize, images: Vec<ProductImage>) -> DomainResult<()> {
        self.draft_mut(index)?.images.extend(images);
        Ok(())
    }

    pub fn remove_image(&mut self, index: usize, image_index: usize) -> DomainResult<ProductImage> {
        let draft = self.draft_mut(index)?;
        if image_index >= draft.images.len() {
            return Err(DomainError::not_found(format!(
                "image #{} of variation #{}",
                image_index + 1,
                index + 1
            )));
        }
        Ok(draft.images.remove(image_index))
    }

    pub fn apply_bulk_price(&mut self, price: Decimal) {
        for d in &mut self.drafts {
            d.price = Some(price);
        }
    }

    pub fn apply_bulk_inventory(&mut self, inventory: i64) {
        for d in &mut self.drafts {
            d.inventory = inventory;
        }
    }

    pub fn apply_bulk_description(&mut self, description: &str) {
        for d in &mut self.drafts {
            d.description = description.to_string();
        }
    }

    pub fn apply_bulk_short_description(&mut self, short_description: &str) {
        for d in &mut self.drafts {
            d.short_description = short_description.to_string();
        }
    }

    /// Partial merge: only filled-in dimension fields replace per-record values.
    pub fn apply_bulk_dimensions(&mut self, patch: &DimensionsPatch) {
        for d in &mut self.drafts {
            patch.apply_to(&mut d.dimensions);
        }
    }

    /// Apply every provided field of `bulk`; returns how many fields were applied.
    pub fn apply_bulk(&mut self, bulk: &BulkOverride) -> usize {
        let mut applied = 0;
        if let Some(price) = bulk.price {
            self.apply_bulk_price(price);
            applied += 1;
        }
        if let Some(inventory) = bulk.inventory {
            self.apply_bulk_inventory(inventory);
            applied += 1;
        }
        if let Some(description) = &bulk.description {
            self.apply_bulk_description(description);
            applied += 1;
        }
        if let Some(short) = &bulk.short_description {
            self.apply_bulk_short_description(short);
            applied += 1;
        }
        if !bulk.dimensions.is_empty() {
            self.apply_bulk_dimensions(&bulk.dimensions);
            applied += 1;
        }
        applied
    }

    /// Note the version the backend last reported for a draft, so the next
    /// finalize pins it. Returns false for an id this editor does not hold.
    pub fn record_version(&mut self, id: ProductId, version: u64) -> bool {
        match self.drafts.iter_mut().find(|d| d.id == id) {
            Some(draft) => {
                draft.version = Some(version);
                true
            }
            None => false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationReport> {
        validate_drafts(&self.drafts)
    }

    /// Validate and produce the activation input.
    pub fn finalize(&self) -> Result<Vec<FinalizedVariant>, ValidationReport> {
        self.validate()?;

        Ok(self
            .drafts
            .iter()
            .map(|d| FinalizedVariant {
                id: d.id,
                version: d.version,
                combination_name: d.combination_name.clone(),
                name: d.name.trim().to_string(),
                sku: d.sku.trim().to_string(),
                // validate() guarantees a positive price.
                price: d.price.unwrap_or_default(),
                inventory: d.inventory,
                description: d.description.clone(),
                short_description: d.short_description.clone(),
                dimensions: d.dimensions.clone(),
                shipping: d.shipping.clone(),
                image_urls: d.images.iter().map(|i| i.url.clone()).collect(),
            })
            .collect())
    }
}
