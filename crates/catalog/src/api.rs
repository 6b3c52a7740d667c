//! The remote catalog seen as a trait, so the pipeline can run against the
//! HTTP client or the in-memory double.

use std::sync::Arc;

use storefront_core::{AxisId, ExpectedVersion, LinkId, ProductId, ValueId};
use storefront_variations::{ProductSnapshot, VariationAxis, VariationValue};

use crate::dto::{EmailRequest, NewAxis, NewProduct, NewValue, NewVariationLink, ProductUpdate};
use crate::error::CatalogResult;

#[async_trait::async_trait]
pub trait CatalogApi: Send + Sync {
    /// Vendor's axes with server-computed usage counts.
    async fn list_axes(&self) -> CatalogResult<Vec<VariationAxis>>;

    /// Fails with `Conflict` when an axis of that name already exists.
    async fn create_axis(&self, axis: &NewAxis) -> CatalogResult<VariationAxis>;

    /// Removes the axis and every value under it.
    async fn delete_axis(&self, id: AxisId) -> CatalogResult<()>;

    /// Values of one axis sorted by name, optionally scoped to a product.
    async fn list_values(
        &self,
        axis: AxisId,
        product: Option<ProductId>,
    ) -> CatalogResult<Vec<VariationValue>>;

    async fn create_value(&self, value: &NewValue) -> CatalogResult<VariationValue>;

    async fn delete_value(&self, id: ValueId) -> CatalogResult<()>;

    async fn get_product(&self, id: ProductId) -> CatalogResult<ProductSnapshot>;

    async fn create_product(&self, product: &NewProduct) -> CatalogResult<ProductSnapshot>;

    /// Partial update; `expected` pins the record version the caller observed.
    async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
        expected: ExpectedVersion,
    ) -> CatalogResult<ProductSnapshot>;

    /// Deleting a product drops its variation links with it.
    async fn delete_product(&self, id: ProductId) -> CatalogResult<()>;

    async fn create_variation_link(&self, link: &NewVariationLink) -> CatalogResult<LinkId>;

    async fn queue_email(&self, email: &EmailRequest) -> CatalogResult<()>;
}

#[async_trait::async_trait]
impl<C> CatalogApi for Arc<C>
where
    C: CatalogApi + ?Sized,
{
    async fn list_axes(&self) -> CatalogResult<Vec<VariationAxis>> {
        (**self).list_axes().await
    }

    async fn create_axis(&self, axis: &NewAxis) -> CatalogResult<VariationAxis> {
        (**self).create_axis(axis).await
    }

    async fn delete_axis(&self, id: AxisId) -> CatalogResult<()> {
        (**self).delete_axis(id).await
    }

    async fn list_values(
        &self,
        axis: AxisId,
        product: Option<ProductId>,
    ) -> CatalogResult<Vec<VariationValue>> {
        (**self).list_values(axis, product).await
    }

    async fn create_value(&self, value: &NewValue) -> CatalogResult<VariationValue> {
        (**self).create_value(value).await
    }

    async fn delete_value(&self, id: ValueId) -> CatalogResult<()> {
        (**self).delete_value(id).await
    }

    async fn get_product(&self, id: ProductId) -> CatalogResult<ProductSnapshot> {
        (**self).get_product(id).await
    }

    async fn create_product(&self, product: &NewProduct) -> CatalogResult<ProductSnapshot> {
        (**self).create_product(product).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
        expected: ExpectedVersion,
    ) -> CatalogResult<ProductSnapshot> {
        (**self).update_product(id, update, expected).await
    }

    async fn delete_product(&self, id: ProductId) -> CatalogResult<()> {
        (**self).delete_product(id).await
    }

    async fn create_variation_link(&self, link: &NewVariationLink) -> CatalogResult<LinkId> {
        (**self).create_variation_link(link).await
    }

    async fn queue_email(&self, email: &EmailRequest) -> CatalogResult<()> {
        (**self).queue_email(email).await
    }
}
