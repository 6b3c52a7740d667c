//! Vendor axis and value management on top of the catalog, kept in step with
//! the operator's in-progress selection.

use storefront_catalog::{CatalogApi, CatalogError, CatalogResult, NewAxis, NewValue};
use storefront_core::{AxisId, ProductId, ValueId};
use storefront_variations::{AxisSelection, VariationAxis, VariationValue};

use crate::config::RetryPolicy;
use crate::retry::with_retry;

pub struct AxisStore<C> {
    api: C,
    retry: RetryPolicy,
    /// Product whose values are loaded and created, when editing one.
    product: Option<ProductId>,
    axes: Vec<VariationAxis>,
}

impl<C: CatalogApi> AxisStore<C> {
    pub fn new(api: C, retry: RetryPolicy) -> Self {
        Self {
            api,
            retry,
            product: None,
            axes: Vec::new(),
        }
    }

    pub fn for_product(mut self, product: ProductId) -> Self {
        self.product = Some(product);
        self
    }

    /// Axes as of the last refresh.
    pub fn axes(&self) -> &[VariationAxis] {
        &self.axes
    }

    pub fn find(&self, id: AxisId) -> Option<&VariationAxis> {
        self.axes.iter().find(|a| a.id == id)
    }

    /// Reload the axis list. A failed lookup keeps the page usable: it is
    /// logged and leaves the cache empty.
    pub async fn refresh(&mut self) -> &[VariationAxis] {
        let api = &self.api;
        match with_retry(&self.retry, "list axes", move || api.list_axes()).await {
            Ok(axes) => self.axes = axes,
            Err(e) => {
                tracing::warn!("Failed to load variation types: {}", e);
                self.axes.clear();
            }
        }
        &self.axes
    }

    /// Values of one axis, scoped to the current product. Failures yield an empty list.
    pub async fn load_values(&self, axis: AxisId) -> Vec<VariationValue> {
        let api = &self.api;
        let product = self.product;
        match with_retry(&self.retry, "list values", move || api.list_values(axis, product)).await {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!("Failed to load values for variation type {}: {}", axis, e);
                Vec::new()
            }
        }
    }

    pub async fn create_axis(&mut self, raw_name: &str) -> CatalogResult<VariationAxis> {
        let payload = NewAxis::new(raw_name)?;
        let api = &self.api;
        let payload = &payload;
        let axis = with_retry(&self.retry, "create axis", move || api.create_axis(payload)).await?;

        tracing::info!("Created variation type {} ({})", axis.name, axis.id);
        self.axes.push(axis.clone());
        Ok(axis)
    }

    /// Delete an axis nothing uses. Axes still linked to products are refused
    /// before any remote call.
    pub async fn delete_axis(&mut self, id: AxisId) -> CatalogResult<VariationAxis> {
        if self.find(id).is_none() {
            self.refresh().await;
        }
        let axis = self
            .find(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("variation type {id}")))?;

        if !axis.is_deletable() {
            return Err(CatalogError::Rejected(format!(
                "Variation \"{}\" is used by {} products and cannot be deleted",
                axis.name, axis.usage_count
            )));
        }

        let api = &self.api;
        with_retry(&self.retry, "delete axis", move || api.delete_axis(id)).await?;
        self.axes.retain(|a| a.id != id);
        tracing::info!("Deleted variation type {} ({})", axis.name, id);
        Ok(axis)
    }

    /// Add a known axis to the selection with its values loaded.
    /// Returns `false` if it was already selected.
    pub async fn select_axis(
        &self,
        id: AxisId,
        selection: &mut AxisSelection,
    ) -> CatalogResult<bool> {
        if selection.contains(id) {
            return Ok(false);
        }
        let axis = self
            .find(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("variation type {id}")))?;
        let values = self.load_values(id).await;
        tracing::debug!("Selected {} with {} values", axis.name, values.len());
        Ok(selection.select(axis, values))
    }

    pub fn deselect_axis(&self, id: AxisId, selection: &mut AxisSelection) -> bool {
        selection.remove(id).is_some()
    }

    /// Create a value under `axis`; if the axis is selected the value joins the selection.
    pub async fn create_value(
        &self,
        axis: AxisId,
        raw_name: &str,
        selection: &mut AxisSelection,
    ) -> CatalogResult<VariationValue> {
        let payload = NewValue::new(axis, raw_name, self.product)?;
        let api = &self.api;
        let payload = &payload;
        let value = with_retry(&self.retry, "create value", move || api.create_value(payload)).await?;

        if selection.contains(axis) {
            selection.add_value(value.clone())?;
        }
        Ok(value)
    }

    pub async fn delete_value(&self, id: ValueId, selection: &mut AxisSelection) -> CatalogResult<()> {
        let api = &self.api;
        with_retry(&self.retry, "delete value", move || api.delete_value(id)).await?;
        selection.remove_value(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use storefront_catalog::{CatalogOp, InMemoryCatalog, NewVariationLink};
    use storefront_variations::ProductSnapshot;

    fn store(catalog: &Arc<InMemoryCatalog>) -> AxisStore<Arc<InMemoryCatalog>> {
        AxisStore::new(catalog.clone(), RetryPolicy::default())
    }

    #[tokio::test]
    async fn axis_in_use_cannot_be_deleted() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let color = catalog.seed_axis("Color").unwrap();
        let red = catalog.seed_value(color.id, "Red").unwrap();
        catalog
            .seed_product(ProductSnapshot::new(ProductId::new(1), "Mug - Red"))
            .unwrap();
        catalog
            .create_variation_link(&NewVariationLink {
                product_id: ProductId::new(1),
                variation_type_id: color.id,
                variation_value_id: red.id,
            })
            .await
            .unwrap();

        let mut store = store(&catalog);
        store.refresh().await;
        let err = store.delete_axis(color.id).await.unwrap_err();

        assert!(matches!(err, CatalogError::Rejected(_)));
        assert_eq!(catalog.call_count(CatalogOp::DeleteAxis), 0);
        assert!(store.find(color.id).is_some());
    }

    #[tokio::test]
    async fn unused_axis_is_deleted_and_dropped_from_cache() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let size = catalog.seed_axis("Size").unwrap();

        let mut store = store(&catalog);
        let deleted = store.delete_axis(size.id).await.unwrap();

        assert_eq!(deleted.name, "Size");
        assert!(store.axes().is_empty());
        assert_eq!(catalog.call_count(CatalogOp::DeleteAxis), 1);
    }

    #[tokio::test]
    async fn failed_lookups_degrade_to_empty_lists() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let color = catalog.seed_axis("Color").unwrap();
        catalog.fail_first(CatalogOp::ListAxes, 1, CatalogError::Network("down".into()));
        catalog.fail_first(CatalogOp::ListValues, 1, CatalogError::Network("down".into()));

        let mut store = store(&catalog);
        assert!(store.refresh().await.is_empty());
        assert!(store.load_values(color.id).await.is_empty());
        assert_eq!(store.refresh().await.len(), 1);
    }

    #[tokio::test]
    async fn created_values_join_a_selected_axis() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let color = catalog.seed_axis("Color").unwrap();
        catalog.seed_value(color.id, "Red").unwrap();

        let mut store = store(&catalog).for_product(ProductId::new(7));
        store.refresh().await;
        let mut selection = AxisSelection::new();

        assert!(store.select_axis(color.id, &mut selection).await.unwrap());
        assert!(!store.select_axis(color.id, &mut selection).await.unwrap());

        let blue = store
            .create_value(color.id, "  Blue ", &mut selection)
            .await
            .unwrap();
        assert_eq!(blue.name, "Blue");
        assert_eq!(selection.get(color.id).unwrap().values.len(), 2);

        store.delete_value(blue.id, &mut selection).await.unwrap();
        assert_eq!(selection.get(color.id).unwrap().values.len(), 1);

        assert!(store.deselect_axis(color.id, &mut selection));
        assert!(selection.is_empty());
    }

    #[tokio::test]
    async fn blank_and_duplicate_names_are_refused() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let mut store = store(&catalog);

        assert!(store.create_axis("   ").await.is_err());
        assert_eq!(catalog.call_count(CatalogOp::CreateAxis), 0);

        store.create_axis("Material").await.unwrap();
        let err = store.create_axis(" Material ").await.unwrap_err();
        assert!(matches!(err, CatalogError::Conflict(_)));
        assert_eq!(store.axes().len(), 1);
    }
}
