//! In-memory catalog (intended for tests/dev).
//!
//! Mirrors the REST backend's rules (duplicate names, version checks, link
//! cleanup on delete) and adds failure injection plus a call log.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use serde_json::Value;

use storefront_core::{AxisId, ExpectedVersion, LinkId, ProductId, ValueId};
use storefront_variations::{ProductSnapshot, VariationAxis, VariationValue, normalize_name};

use crate::api::CatalogApi;
use crate::dto::{
    EmailRequest, NewAxis, NewProduct, NewValue, NewVariationLink, ProductUpdate, decode_product,
};
use crate::error::{CatalogError, CatalogResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogOp {
    ListAxes,
    CreateAxis,
    DeleteAxis,
    ListValues,
    CreateValue,
    DeleteValue,
    GetProduct,
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    CreateLink,
    QueueEmail,
}

/// One recorded call, successful or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogCall {
    pub op: CatalogOp,
    /// Id of the addressed record, when the call names one.
    pub target: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// The n-th call (1-based) of the operation.
    Nth(usize),
    /// Every call addressing this record id.
    Target(u64),
    /// The first n calls of the operation.
    FirstN(usize),
}

#[derive(Debug, Clone)]
struct FailureRule {
    op: CatalogOp,
    trigger: Trigger,
    error: CatalogError,
}

#[derive(Debug, Clone)]
struct ValueRow {
    axis_id: AxisId,
    name: String,
    product_id: Option<ProductId>,
}

#[derive(Debug, Default)]
struct State {
    next_axis: u64,
    next_value: u64,
    next_product: u64,
    next_link: u64,
    axes: BTreeMap<AxisId, String>,
    values: BTreeMap<ValueId, ValueRow>,
    products: BTreeMap<ProductId, ProductSnapshot>,
    links: BTreeMap<LinkId, NewVariationLink>,
    emails: Vec<EmailRequest>,
    calls: Vec<CatalogCall>,
    op_counts: HashMap<CatalogOp, usize>,
    failures: Vec<FailureRule>,
}

fn bump(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

impl State {
    /// Log the call and apply any matching failure rule.
    fn enter(&mut self, op: CatalogOp, target: Option<u64>) -> CatalogResult<()> {
        let count = {
            let c = self.op_counts.entry(op).or_insert(0);
            *c += 1;
            *c
        };
        self.calls.push(CatalogCall { op, target });

        let hit = self.failures.iter().find(|rule| {
            rule.op == op
                && match rule.trigger {
                    Trigger::Nth(n) => n == count,
                    Trigger::Target(id) => target == Some(id),
                    Trigger::FirstN(n) => count <= n,
                }
        });
        match hit {
            Some(rule) => {
                tracing::debug!("injected failure for {:?} (call #{})", op, count);
                Err(rule.error.clone())
            }
            None => Ok(()),
        }
    }

    fn usage_count(&self, axis: AxisId) -> u32 {
        let mut products: Vec<ProductId> = self
            .links
            .values()
            .filter(|l| l.variation_type_id == axis)
            .map(|l| l.product_id)
            .collect();
        products.sort();
        products.dedup();
        products.len() as u32
    }

    fn axis(&self, id: AxisId) -> CatalogResult<VariationAxis> {
        let name = self
            .axes
            .get(&id)
            .ok_or_else(|| CatalogError::NotFound("Variation type not found".into()))?;
        Ok(VariationAxis {
            id,
            name: name.clone(),
            usage_count: self.usage_count(id),
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: RwLock<State>,
}

fn poisoned<T>(_: T) -> CatalogError {
    CatalogError::Api {
        status: 500,
        message: "catalog state lock poisoned".to_string(),
    }
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_rule(&self, op: CatalogOp, trigger: Trigger, error: CatalogError) {
        if let Ok(mut state) = self.state.write() {
            state.failures.push(FailureRule { op, trigger, error });
        }
    }

    /// Fail the `nth` (1-based) call of `op`.
    pub fn fail_nth(&self, op: CatalogOp, nth: usize, error: CatalogError) {
        self.add_rule(op, Trigger::Nth(nth), error);
    }

    /// Fail every `op` call addressing record `id`.
    pub fn fail_for(&self, op: CatalogOp, id: u64, error: CatalogError) {
        self.add_rule(op, Trigger::Target(id), error);
    }

    /// Fail the first `times` calls of `op`, then succeed.
    pub fn fail_first(&self, op: CatalogOp, times: usize, error: CatalogError) {
        self.add_rule(op, Trigger::FirstN(times), error);
    }

    pub fn clear_failures(&self) {
        if let Ok(mut state) = self.state.write() {
            state.failures.clear();
        }
    }

    pub fn seed_axis(&self, name: &str) -> CatalogResult<VariationAxis> {
        let mut state = self.state.write().map_err(poisoned)?;
        let id = AxisId::new(bump(&mut state.next_axis));
        state.axes.insert(id, name.to_string());
        state.axis(id)
    }

    pub fn seed_value(&self, axis_id: AxisId, name: &str) -> CatalogResult<VariationValue> {
        let mut state = self.state.write().map_err(poisoned)?;
        let id = ValueId::new(bump(&mut state.next_value));
        state.values.insert(
            id,
            ValueRow {
                axis_id,
                name: name.to_string(),
                product_id: None,
            },
        );
        Ok(VariationValue {
            id,
            axis_id,
            name: name.to_string(),
        })
    }

    /// Store a product as-is; a missing version starts at 1.
    pub fn seed_product(&self, mut product: ProductSnapshot) -> CatalogResult<ProductSnapshot> {
        let mut state = self.state.write().map_err(poisoned)?;
        product.version = Some(product.version.unwrap_or(1));
        state.next_product = state.next_product.max(product.id.get());
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    /// Simulate a write from another session.
    pub fn touch_product(&self, id: ProductId) {
        if let Ok(mut state) = self.state.write() {
            if let Some(p) = state.products.get_mut(&id) {
                p.version = Some(p.version.unwrap_or(0) + 1);
            }
        }
    }

    pub fn product(&self, id: ProductId) -> Option<ProductSnapshot> {
        self.state.read().ok()?.products.get(&id).cloned()
    }

    pub fn children_of(&self, parent: ProductId) -> Vec<ProductSnapshot> {
        match self.state.read() {
            Ok(state) => state
                .products
                .values()
                .filter(|p| p.parent_id == Some(parent))
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn links_for(&self, product: ProductId) -> Vec<NewVariationLink> {
        match self.state.read() {
            Ok(state) => state
                .links
                .values()
                .filter(|l| l.product_id == product)
                .copied()
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn link_count(&self) -> usize {
        self.state.read().map(|s| s.links.len()).unwrap_or(0)
    }

    pub fn emails(&self) -> Vec<EmailRequest> {
        self.state
            .read()
            .map(|s| s.emails.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<CatalogCall> {
        self.state
            .read()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self, op: CatalogOp) -> usize {
        self.calls().iter().filter(|c| c.op == op).count()
    }
}

#[async_trait::async_trait]
impl CatalogApi for InMemoryCatalog {
    async fn list_axes(&self) -> CatalogResult<Vec<VariationAxis>> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.enter(CatalogOp::ListAxes, None)?;

        let mut axes = state
            .axes
            .keys()
            .map(|id| state.axis(*id))
            .collect::<CatalogResult<Vec<_>>>()?;
        axes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(axes)
    }

    async fn create_axis(&self, axis: &NewAxis) -> CatalogResult<VariationAxis> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.enter(CatalogOp::CreateAxis, None)?;

        let name = normalize_name(&axis.variation_name, "Variation").map_err(|e| CatalogError::Api {
            status: 400,
            message: e.to_string(),
        })?;
        if state.axes.values().any(|existing| *existing == name) {
            return Err(CatalogError::Conflict("Variation type already exists".into()));
        }

        let id = AxisId::new(bump(&mut state.next_axis));
        state.axes.insert(id, name);
        state.axis(id)
    }

    async fn delete_axis(&self, id: AxisId) -> CatalogResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.enter(CatalogOp::DeleteAxis, Some(id.get()))?;

        if state.axes.remove(&id).is_none() {
            return Err(CatalogError::NotFound("Variation type not found".into()));
        }
        state.values.retain(|_, v| v.axis_id != id);
        Ok(())
    }

    async fn list_values(
        &self,
        axis: AxisId,
        product: Option<ProductId>,
    ) -> CatalogResult<Vec<VariationValue>> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.enter(CatalogOp::ListValues, Some(axis.get()))?;
        state.axis(axis)?;

        let mut values: Vec<VariationValue> = state
            .values
            .iter()
            .filter(|(_, v)| v.axis_id == axis)
            .filter(|(_, v)| match (product, v.product_id) {
                (Some(wanted), Some(owner)) => wanted == owner,
                _ => true,
            })
            .map(|(id, v)| VariationValue {
                id: *id,
                axis_id: v.axis_id,
                name: v.name.clone(),
            })
            .collect();
        // Same ordering as the backend listing (by value name).
        values.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(values)
    }

    async fn create_value(&self, value: &NewValue) -> CatalogResult<VariationValue> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.enter(CatalogOp::CreateValue, Some(value.variation_type_id.get()))?;
        state.axis(value.variation_type_id)?;

        let name = normalize_name(&value.value_name, "Value").map_err(|e| CatalogError::Api {
            status: 400,
            message: e.to_string(),
        })?;
        let duplicate = state.values.values().any(|v| {
            v.axis_id == value.variation_type_id && v.name == name && v.product_id == value.product_id
        });
        if duplicate {
            return Err(CatalogError::Conflict("Variation value already exists".into()));
        }

        let id = ValueId::new(bump(&mut state.next_value));
        state.values.insert(
            id,
            ValueRow {
                axis_id: value.variation_type_id,
                name: name.clone(),
                product_id: value.product_id,
            },
        );
        Ok(VariationValue {
            id,
            axis_id: value.variation_type_id,
            name,
        })
    }

    async fn delete_value(&self, id: ValueId) -> CatalogResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.enter(CatalogOp::DeleteValue, Some(id.get()))?;

        state
            .values
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CatalogError::NotFound("Variation value not found".into()))
    }

    async fn get_product(&self, id: ProductId) -> CatalogResult<ProductSnapshot> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.enter(CatalogOp::GetProduct, Some(id.get()))?;

        state
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("product {id}")))
    }

    async fn create_product(&self, product: &NewProduct) -> CatalogResult<ProductSnapshot> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.enter(CatalogOp::CreateProduct, None)?;

        let id = ProductId::new(bump(&mut state.next_product));
        let mut body = product.body().clone();
        body.insert("id".into(), Value::from(id.get()));
        body.insert("version".into(), Value::from(1u64));

        let created = decode_product(Value::Object(body))?;
        state.products.insert(id, created.clone());
        Ok(created)
    }

    async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
        expected: ExpectedVersion,
    ) -> CatalogResult<ProductSnapshot> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.enter(CatalogOp::UpdateProduct, Some(id.get()))?;

        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| CatalogError::NotFound(format!("product {id}")))?;

        let current = product.version.unwrap_or(0);
        expected.check(current)?;

        update.apply_to(product);
        product.version = Some(current + 1);
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> CatalogResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.enter(CatalogOp::DeleteProduct, Some(id.get()))?;

        if state.products.remove(&id).is_none() {
            return Err(CatalogError::NotFound(format!("product {id}")));
        }
        state.links.retain(|_, l| l.product_id != id);
        Ok(())
    }

    async fn create_variation_link(&self, link: &NewVariationLink) -> CatalogResult<LinkId> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.enter(CatalogOp::CreateLink, Some(link.product_id.get()))?;

        if !state.products.contains_key(&link.product_id) {
            return Err(CatalogError::NotFound(format!("product {}", link.product_id)));
        }
        state.axis(link.variation_type_id)?;
        if !state.values.contains_key(&link.variation_value_id) {
            return Err(CatalogError::NotFound("Variation value not found".into()));
        }

        let id = LinkId::new(bump(&mut state.next_link));
        state.links.insert(id, *link);
        Ok(id)
    }

    async fn queue_email(&self, email: &EmailRequest) -> CatalogResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.enter(CatalogOp::QueueEmail, None)?;
        state.emails.push(email.clone());
        Ok(())
    }
}
