//! `storefront-catalog`: access to the remote catalog API.
//!
//! - [`CatalogApi`]: the operations the variation pipeline needs
//! - [`HttpCatalogClient`]: `reqwest` implementation (bearer auth, `If-Match`)
//! - [`InMemoryCatalog`]: test/dev double with failure injection

pub mod api;
pub mod dto;
pub mod error;
pub mod http;
pub mod memory;

pub use api::CatalogApi;
pub use dto::{
    AxisRecord, EmailRequest, NewAxis, NewProduct, NewValue, NewVariationLink, ProductUpdate,
    ValueRecord, VariantFields,
};
pub use error::{CatalogError, CatalogResult};
pub use http::HttpCatalogClient;
pub use memory::{CatalogCall, CatalogOp, InMemoryCatalog};
