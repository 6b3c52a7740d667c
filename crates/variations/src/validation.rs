//! Pre-activation checks over the edited drafts.
//!
//! Every problem is collected; nothing short-circuits.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::draft::VariantDraft;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    MissingName,
    InvalidPrice,
    MissingSku,
    InvalidInventory,
}

impl IssueKind {
    pub fn message(&self) -> &'static str {
        match self {
            IssueKind::MissingName => "Name is required",
            IssueKind::InvalidPrice => "Valid price is required",
            IssueKind::MissingSku => "SKU is required",
            IssueKind::InvalidInventory => "Valid inventory is required",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Zero-based record index.
    pub index: usize,
    pub combination_name: String,
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variation {}: {}", self.index + 1, self.kind.message())
    }
}

/// All validation problems found in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Issues for one record.
    pub fn for_record(&self, index: usize) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.index == index)
    }
}

/// One line per issue.
impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, issue) in self.issues.iter().enumerate() {
            if n > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

/// Check one draft, appending any issues.
pub fn check_draft(index: usize, draft: &VariantDraft, issues: &mut Vec<ValidationIssue>) {
    let mut push = |kind| {
        issues.push(ValidationIssue {
            index,
            combination_name: draft.combination_name.clone(),
            kind,
        })
    };

    if draft.name.trim().is_empty() {
        push(IssueKind::MissingName);
    }
    if !draft.price.is_some_and(|p| p > Decimal::ZERO) {
        push(IssueKind::InvalidPrice);
    }
    if draft.sku.trim().is_empty() {
        push(IssueKind::MissingSku);
    }
    if draft.inventory < 0 {
        push(IssueKind::InvalidInventory);
    }
}

/// Validate every draft; `Ok` only when no record has an issue.
pub fn validate_drafts(drafts: &[VariantDraft]) -> Result<(), ValidationReport> {
    let mut issues = Vec::new();
    for (index, draft) in drafts.iter().enumerate() {
        check_draft(index, draft, &mut issues);
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationReport { issues })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combination::Combination;
    use crate::draft::DraftSeed;
    use crate::product::ProductSnapshot;
    use storefront_core::ProductId;

    fn draft(price: Option<Decimal>, inventory: i64) -> VariantDraft {
        let parent = ProductSnapshot::new(ProductId::new(1), "Tee").with_sku("TEE");
        let seed = DraftSeed::for_combination(&parent, &Combination::new(Vec::new()), 0);
        let mut record = ProductSnapshot::new(ProductId::new(2), "Tee - Red").with_sku("TEE-RE");
        record.price = price;
        record.available_qty = Some(inventory);
        VariantDraft::from_created(seed, record)
    }

    #[test]
    fn smallest_positive_price_passes() {
        assert!(validate_drafts(&[draft(Some(Decimal::new(1, 2)), 0)]).is_ok());
    }

    #[test]
    fn zero_and_negative_prices_fail() {
        for price in [Decimal::ZERO, Decimal::new(-100, 2)] {
            let report = validate_drafts(&[draft(Some(price), 3)]).unwrap_err();
            assert_eq!(report.issues()[0].kind, IssueKind::InvalidPrice);
        }
    }

    #[test]
    fn issues_are_reported_per_record() {
        let drafts = [
            draft(Some(Decimal::ONE), 1),
            draft(None, -2),
            draft(Some(Decimal::ONE), 1),
        ];
        let report = validate_drafts(&drafts).unwrap_err();
        assert_eq!(report.len(), 2);
        assert_eq!(report.for_record(1).count(), 2);
        assert_eq!(report.for_record(0).count(), 0);
        assert_eq!(
            report.issues()[1].to_string(),
            "Variation 2: Valid inventory is required"
        );
    }
}
