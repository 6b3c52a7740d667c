use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use storefront_catalog::{
    CatalogApi, CatalogError, EmailRequest, HttpCatalogClient, NewAxis, NewValue,
    NewVariationLink, ProductUpdate,
};
use storefront_core::{AxisId, ExpectedVersion, LinkId, ProductId, ValueId};
use storefront_variations::{ProductSnapshot, ProductStatus};

const TOKEN: &str = "test-token";

#[derive(Default)]
struct Seen {
    value_query: Option<String>,
    patch_body: Option<Value>,
    if_match: Option<String>,
    deleted: Vec<String>,
}

type Shared = Arc<Mutex<Seen>>;

struct TestServer {
    base_url: String,
    seen: Shared,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let seen: Shared = Arc::default();
        let app = Router::new()
            .route("/products/variations/types", get(list_types).post(create_type))
            .route("/products/variations/types/:id", delete(delete_type))
            .route("/products/variations/types/:id/values", get(list_values))
            .route("/products/variations/values", post(create_value))
            .route("/products/variations", post(create_link))
            .route("/products/:id", get(get_product).patch(patch_product))
            .route("/emails/queue", post(queue_email))
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            seen,
            handle,
        }
    }

    fn client(&self) -> HttpCatalogClient {
        HttpCatalogClient::new(format!("{}/", self.base_url)).with_token(TOKEN)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn list_types(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"})));
    }
    (
        StatusCode::OK,
        Json(json!([
            {"id": 1, "variation_name": "Color", "usage_count": 3, "created_at": "2024-01-01"},
            {"id": 2, "variation_name": "Size"}
        ])),
    )
}

async fn create_type(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["variation_name"] == "Color" {
        return (
            StatusCode::CONFLICT,
            Json(json!({"error": "Variation type already exists"})),
        );
    }
    (
        StatusCode::CREATED,
        Json(json!({"id": 9, "variation_name": body["variation_name"]})),
    )
}

async fn delete_type(State(seen): State<Shared>, Path(id): Path<u64>) -> Json<Value> {
    seen.lock().unwrap().deleted.push(format!("type {id}"));
    Json(json!({"message": "Variation type deleted successfully"}))
}

async fn list_values(
    State(seen): State<Shared>,
    Path(_id): Path<u64>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    seen.lock().unwrap().value_query = query.get("product_id").cloned();
    Json(json!([{"id": 11, "value_name": "Red"}, {"id": 12, "value_name": "Blue"}]))
}

async fn create_value(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(json!({"id": 13, "value_name": body["value_name"], "variation_type_id": body["variation_type_id"]})),
    )
}

async fn create_link(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["product_id"].is_null() {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "product_id required"})));
    }
    (StatusCode::CREATED, Json(json!({"id": 77})))
}

async fn get_product(Path(id): Path<u64>) -> (StatusCode, Json<Value>) {
    if id == 404 {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "Product not found"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "id": id,
            "name": "Mug",
            "sku": "MUG",
            "price": "12.00",
            "status": "draft",
            "product_type": "variable",
            "version": 4,
            "width": "",
            "images": ["https://cdn.example/mug.jpg"]
        })),
    )
}

async fn patch_product(
    State(seen): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let if_match = headers
        .get("if-match")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    {
        let mut seen = seen.lock().unwrap();
        seen.patch_body = Some(body.clone());
        seen.if_match = if_match.clone();
    }
    if if_match.as_deref().is_some_and(|v| v != "4") {
        return (
            StatusCode::PRECONDITION_FAILED,
            Json(json!({"error": "Product was modified"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"id": id, "name": "Mug", "status": body["status"], "version": 5})),
    )
}

async fn queue_email() -> (StatusCode, Json<Value>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"error": "Mail queue offline"})),
    )
}

#[tokio::test]
async fn lists_axes_with_bearer_token() {
    let srv = TestServer::spawn().await;
    let axes = srv.client().list_axes().await.unwrap();

    assert_eq!(axes.len(), 2);
    assert_eq!(axes[0].name, "Color");
    assert_eq!(axes[0].usage_count, 3);
    assert!(axes[1].is_deletable());
}

#[tokio::test]
async fn missing_token_surfaces_api_error() {
    let srv = TestServer::spawn().await;
    let err = HttpCatalogClient::new(srv.base_url.clone())
        .list_axes()
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CatalogError::Api {
            status: 401,
            message: "Unauthorized".into()
        }
    );
}

#[tokio::test]
async fn duplicate_axis_maps_to_conflict() {
    let srv = TestServer::spawn().await;
    let client = srv.client();

    let err = client
        .create_axis(&NewAxis::new("Color").unwrap())
        .await
        .unwrap_err();
    assert_eq!(err, CatalogError::Conflict("Variation type already exists".into()));

    let created = client.create_axis(&NewAxis::new("Finish").unwrap()).await.unwrap();
    assert_eq!(created.id, AxisId::new(9));
    assert_eq!(created.usage_count, 0);
}

#[tokio::test]
async fn values_are_scoped_by_product_and_tagged_with_axis() {
    let srv = TestServer::spawn().await;
    let client = srv.client();

    let values = client
        .list_values(AxisId::new(1), Some(ProductId::new(42)))
        .await
        .unwrap();
    assert_eq!(values.len(), 2);
    assert!(values.iter().all(|v| v.axis_id == AxisId::new(1)));
    assert_eq!(srv.seen.lock().unwrap().value_query.as_deref(), Some("42"));

    let created = client
        .create_value(&NewValue::new(AxisId::new(1), "Green", None).unwrap())
        .await
        .unwrap();
    assert_eq!(created.id, ValueId::new(13));
    assert_eq!(created.name, "Green");
}

#[tokio::test]
async fn delete_axis_hits_type_resource() {
    let srv = TestServer::spawn().await;
    srv.client().delete_axis(AxisId::new(5)).await.unwrap();
    assert_eq!(srv.seen.lock().unwrap().deleted, vec!["type 5".to_string()]);
}

#[tokio::test]
async fn decodes_lenient_product_and_maps_not_found() {
    let srv = TestServer::spawn().await;
    let client = srv.client();

    let product = client.get_product(ProductId::new(3)).await.unwrap();
    assert_eq!(product.price, Some(Decimal::new(1200, 2)));
    assert_eq!(product.version, Some(4));
    assert_eq!(product.dimensions.width, None);
    assert_eq!(product.images[0].url, "https://cdn.example/mug.jpg");

    let err = client.get_product(ProductId::new(404)).await.unwrap_err();
    assert_eq!(err, CatalogError::NotFound("Product not found".into()));
}

#[tokio::test]
async fn update_sends_if_match_and_detects_stale_version() {
    let srv = TestServer::spawn().await;
    let client = srv.client();
    let update = ProductUpdate::status_only(ProductStatus::Active);

    let updated = client
        .update_product(ProductId::new(3), &update, ExpectedVersion::Exact(4))
        .await
        .unwrap();
    assert!(updated.is_active());
    {
        let seen = srv.seen.lock().unwrap();
        assert_eq!(seen.if_match.as_deref(), Some("4"));
        assert_eq!(seen.patch_body, Some(json!({"status": "active"})));
    }

    let err = client
        .update_product(ProductId::new(3), &update, ExpectedVersion::Exact(3))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Conflict(_)));

    client
        .update_product(ProductId::new(3), &update, ExpectedVersion::Any)
        .await
        .unwrap();
    assert_eq!(srv.seen.lock().unwrap().if_match, None);
}

#[tokio::test]
async fn link_creation_returns_server_id() {
    let srv = TestServer::spawn().await;
    let id = srv
        .client()
        .create_variation_link(&NewVariationLink {
            product_id: ProductId::new(3),
            variation_type_id: AxisId::new(1),
            variation_value_id: ValueId::new(11),
        })
        .await
        .unwrap();
    assert_eq!(id, LinkId::new(77));
}

#[tokio::test]
async fn server_errors_are_transient() {
    let srv = TestServer::spawn().await;
    let parent = ProductSnapshot::new(ProductId::new(3), "Mug");
    let err = srv
        .client()
        .queue_email(&EmailRequest::new_product(&parent, 2))
        .await
        .unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let client = HttpCatalogClient::new("http://127.0.0.1:9")
        .with_timeout(Duration::from_millis(500))
        .unwrap();
    let err = client.list_axes().await.unwrap_err();
    assert!(matches!(err, CatalogError::Network(_)));
    assert!(err.is_transient());
}
