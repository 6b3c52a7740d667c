//! Variation domain: axes, combination expansion, draft records and the
//! bulk editor, tied together by the per-session workflow.
//!
//! Pure logic only; remote calls live in `storefront-catalog` and
//! `storefront-pipeline`.

pub mod axis;
pub mod combination;
pub mod draft;
pub mod editor;
pub mod picker;
pub mod product;
pub mod validation;
pub mod workflow;

pub use axis::{AxisSelection, SelectedAxis, VariationAxis, VariationValue, normalize_name};
pub use combination::{
    COMBINATION_CAP, Combination, CombinationPart, CombinationSet, derive_sku, generate,
    generate_capped,
};
pub use draft::{
    DEFAULT_INVENTORY, DimensionEdit, DimensionsPatch, DraftSeed, FieldEdit, FinalizedVariant,
    ShippingEdit, VariantDraft,
};
pub use editor::{BulkFieldEditor, BulkOverride};
pub use picker::CombinationPicker;
pub use product::{
    Dimensions, ProductImage, ProductSnapshot, ProductStatus, ProductType, Shipping,
};
pub use validation::{IssueKind, ValidationIssue, ValidationReport, validate_drafts};
pub use workflow::{VariationWorkflow, WorkflowError, WorkflowStage};
