//! `reqwest` client for the catalog REST API.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use storefront_core::{AxisId, ExpectedVersion, LinkId, ProductId, ValueId};
use storefront_variations::{ProductSnapshot, VariationAxis, VariationValue};

use crate::api::CatalogApi;
use crate::dto::{
    AxisRecord, EmailRequest, LinkRecord, NewAxis, NewProduct, NewValue, NewVariationLink,
    ProductUpdate, ValueRecord, decode_product,
};
use crate::error::{CatalogError, CatalogResult};

/// `{ "error": "..." }` body returned on failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    api_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpCatalogClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        let api_url: String = api_url.into();
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Per-request timeout; a timed-out call surfaces as `CatalogError::Network`.
    pub fn with_timeout(mut self, timeout: Duration) -> CatalogResult<Self> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;
        Ok(self)
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!("{} {}/{}", method, self.api_url, path);
        let mut req = self.client.request(method, format!("{}/{}", self.api_url, path));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send(&self, req: RequestBuilder) -> CatalogResult<Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or(text);
        Err(CatalogError::from_status(status.as_u16(), message))
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> CatalogResult<T> {
        self.send(req)
            .await?
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))
    }

    async fn send_product(&self, req: RequestBuilder) -> CatalogResult<ProductSnapshot> {
        let body: Value = self.send_json(req).await?;
        decode_product(body)
    }
}

#[async_trait::async_trait]
impl CatalogApi for HttpCatalogClient {
    async fn list_axes(&self) -> CatalogResult<Vec<VariationAxis>> {
        let records: Vec<AxisRecord> = self
            .send_json(self.request(Method::GET, "products/variations/types"))
            .await?;
        Ok(records.into_iter().map(VariationAxis::from).collect())
    }

    async fn create_axis(&self, axis: &NewAxis) -> CatalogResult<VariationAxis> {
        let record: AxisRecord = self
            .send_json(self.request(Method::POST, "products/variations/types").json(axis))
            .await?;
        Ok(record.into())
    }

    async fn delete_axis(&self, id: AxisId) -> CatalogResult<()> {
        let path = format!("products/variations/types/{id}");
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn list_values(
        &self,
        axis: AxisId,
        product: Option<ProductId>,
    ) -> CatalogResult<Vec<VariationValue>> {
        let path = match product {
            Some(p) => format!("products/variations/types/{axis}/values?product_id={p}"),
            None => format!("products/variations/types/{axis}/values"),
        };
        let records: Vec<ValueRecord> = self.send_json(self.request(Method::GET, &path)).await?;
        Ok(records.into_iter().map(|r| r.into_value(axis)).collect())
    }

    async fn create_value(&self, value: &NewValue) -> CatalogResult<VariationValue> {
        let record: ValueRecord = self
            .send_json(self.request(Method::POST, "products/variations/values").json(value))
            .await?;
        Ok(record.into_value(value.variation_type_id))
    }

    async fn delete_value(&self, id: ValueId) -> CatalogResult<()> {
        let path = format!("products/variations/values/{id}");
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> CatalogResult<ProductSnapshot> {
        self.send_product(self.request(Method::GET, &format!("products/{id}")))
            .await
    }

    async fn create_product(&self, product: &NewProduct) -> CatalogResult<ProductSnapshot> {
        self.send_product(self.request(Method::POST, "products").json(product))
            .await
    }

    async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
        expected: ExpectedVersion,
    ) -> CatalogResult<ProductSnapshot> {
        let mut req = self
            .request(Method::PATCH, &format!("products/{id}"))
            .json(update);
        if let ExpectedVersion::Exact(v) = expected {
            req = req.header(reqwest::header::IF_MATCH, v.to_string());
        }
        self.send_product(req).await
    }

    async fn delete_product(&self, id: ProductId) -> CatalogResult<()> {
        self.send(self.request(Method::DELETE, &format!("products/{id}")))
            .await?;
        Ok(())
    }

    async fn create_variation_link(&self, link: &NewVariationLink) -> CatalogResult<LinkId> {
        let record: LinkRecord = self
            .send_json(self.request(Method::POST, "products/variations").json(link))
            .await?;
        Ok(record.id)
    }

    async fn queue_email(&self, email: &EmailRequest) -> CatalogResult<()> {
        self.send(self.request(Method::POST, "emails/queue").json(email))
            .await?;
        Ok(())
    }
}
