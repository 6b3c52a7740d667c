//! Cartesian-product generation over selected axes.
//!
//! Combinations are produced in fold order: the first axis varies slowest and
//! the last axis fastest, so `Color:[Red,Blue] × Size:[S,M]` yields
//! `Red × S, Red × M, Blue × S, Blue × M`. Only the first [`COMBINATION_CAP`]
//! combinations are materialized.

use serde::{Deserialize, Serialize};

use storefront_core::{AxisId, ValueId};

use crate::axis::SelectedAxis;

/// Maximum number of combinations kept from one generation.
pub const COMBINATION_CAP: usize = 100;

/// Separator between value names in a combination's display name.
pub const DISPLAY_SEPARATOR: &str = " × ";

/// One `(axis, value)` pick inside a combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombinationPart {
    pub axis_id: AxisId,
    pub axis_name: String,
    pub value_id: ValueId,
    pub value_name: String,
}

/// Exactly one value per selected axis, in axis-selection order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Combination {
    parts: Vec<CombinationPart>,
}

impl Combination {
    pub fn new(parts: Vec<CombinationPart>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[CombinationPart] {
        &self.parts
    }

    /// Value names joined by [`DISPLAY_SEPARATOR`].
    pub fn display_name(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.value_name.as_str())
            .collect::<Vec<_>>()
            .join(DISPLAY_SEPARATOR)
    }

    pub fn value_ids(&self) -> Vec<ValueId> {
        self.parts.iter().map(|p| p.value_id).collect()
    }
}

/// Result of one generation: the capped combinations plus the uncapped count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinationSet {
    combinations: Vec<Combination>,
    total_possible: u64,
}

impl CombinationSet {
    pub fn combinations(&self) -> &[Combination] {
        &self.combinations
    }

    pub fn get(&self, index: usize) -> Option<&Combination> {
        self.combinations.get(index)
    }

    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }

    /// Product of the axes' value counts (saturating), before capping.
    pub fn total_possible(&self) -> u64 {
        self.total_possible
    }

    /// True when combinations were dropped by the cap.
    pub fn is_truncated(&self) -> bool {
        self.total_possible > self.combinations.len() as u64
    }

    pub fn into_vec(self) -> Vec<Combination> {
        self.combinations
    }
}

/// Generate combinations capped at [`COMBINATION_CAP`].
pub fn generate(axes: &[SelectedAxis]) -> CombinationSet {
    generate_capped(axes, COMBINATION_CAP)
}

/// Generate combinations capped at `cap`.
///
/// Empty when no axes are given or any axis has no values.
pub fn generate_capped(axes: &[SelectedAxis], cap: usize) -> CombinationSet {
    if axes.is_empty() || axes.iter().any(|a| a.values.is_empty()) {
        return CombinationSet::default();
    }

    let total_possible = axes
        .iter()
        .fold(1u64, |acc, a| acc.saturating_mul(a.values.len() as u64));

    let combinations = Odometer::new(axes).take(cap).collect();

    CombinationSet {
        combinations,
        total_possible,
    }
}

/// Walks the product space in fold order without building the full product.
struct Odometer<'a> {
    axes: &'a [SelectedAxis],
    digits: Vec<usize>,
    exhausted: bool,
}

impl<'a> Odometer<'a> {
    fn new(axes: &'a [SelectedAxis]) -> Self {
        Self {
            axes,
            digits: vec![0; axes.len()],
            exhausted: axes.is_empty(),
        }
    }

    fn advance(&mut self) {
        for pos in (0..self.digits.len()).rev() {
            self.digits[pos] += 1;
            if self.digits[pos] < self.axes[pos].values.len() {
                return;
            }
            self.digits[pos] = 0;
        }
        self.exhausted = true;
    }
}

impl Iterator for Odometer<'_> {
    type Item = Combination;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let parts = self
            .axes
            .iter()
            .zip(&self.digits)
            .map(|(selected, &digit)| {
                let value = &selected.values[digit];
                CombinationPart {
                    axis_id: selected.axis.id,
                    axis_name: selected.axis.name.clone(),
                    value_id: value.id,
                    value_name: value.name.clone(),
                }
            })
            .collect();

        self.advance();
        Some(Combination::new(parts))
    }
}

/// Abbreviation of a display name: first two characters of each value,
/// uppercased and concatenated (`"Red × Large"` -> `"RELA"`).
pub fn sku_code(display_name: &str) -> String {
    display_name
        .split(DISPLAY_SEPARATOR)
        .flat_map(|token| token.chars().take(2))
        .flat_map(char::to_uppercase)
        .collect()
}

/// SKU for the combination at `index` (zero-based) of a generation.
///
/// `BASE-CODE` when a base SKU is present; otherwise a zero-padded ordinal
/// (`VAR-001`). The index is ignored whenever a base SKU exists.
pub fn derive_sku(base_sku: &str, display_name: &str, index: usize) -> String {
    let base = base_sku.trim();
    if base.is_empty() {
        return format!("VAR-{:03}", index + 1);
    }
    format!("{}-{}", base, sku_code(display_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{VariationAxis, VariationValue};

    fn selected(axis_id: u64, name: &str, values: &[&str]) -> SelectedAxis {
        let axis = VariationAxis {
            id: AxisId::new(axis_id),
            name: name.to_string(),
            usage_count: 0,
        };
        let values = values
            .iter()
            .enumerate()
            .map(|(i, v)| VariationValue {
                id: ValueId::new(axis_id * 100 + i as u64),
                axis_id: AxisId::new(axis_id),
                name: v.to_string(),
            })
            .collect();
        SelectedAxis { axis, values }
    }

    #[test]
    fn color_by_size_yields_four_in_fold_order() {
        let axes = vec![
            selected(1, "Color", &["Red", "Blue"]),
            selected(2, "Size", &["S", "M"]),
        ];
        let set = generate(&axes);

        let names: Vec<_> = set.combinations().iter().map(|c| c.display_name()).collect();
        assert_eq!(names, vec!["Red × S", "Red × M", "Blue × S", "Blue × M"]);
        assert!(!set.is_truncated());
        assert_eq!(set.total_possible(), 4);
    }

    #[test]
    fn parts_follow_axis_selection_order() {
        let axes = vec![
            selected(2, "Size", &["S"]),
            selected(1, "Color", &["Red"]),
        ];
        let set = generate(&axes);
        let parts = set.get(0).unwrap().parts();
        assert_eq!(parts[0].axis_name, "Size");
        assert_eq!(parts[1].axis_name, "Color");
    }

    #[test]
    fn empty_axis_list_generates_nothing() {
        assert!(generate(&[]).is_empty());
    }

    #[test]
    fn any_empty_axis_refuses_generation() {
        let axes = vec![
            selected(1, "Color", &["Red", "Blue"]),
            selected(2, "Size", &[]),
        ];
        let set = generate(&axes);
        assert!(set.is_empty());
        assert_eq!(set.total_possible(), 0);
    }

    #[test]
    fn generation_is_capped_at_one_hundred() {
        let axes = vec![
            selected(1, "A", &["a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7", "a8", "a9", "a10"]),
            selected(2, "B", &["b0", "b1", "b2", "b3", "b4", "b5", "b6", "b7", "b8", "b9"]),
        ];
        let set = generate(&axes);
        assert_eq!(set.len(), COMBINATION_CAP);
        assert_eq!(set.total_possible(), 110);
        assert!(set.is_truncated());

        // The kept prefix is the first 100 in fold order.
        assert_eq!(set.get(0).unwrap().display_name(), "a0 × b0");
        assert_eq!(set.get(99).unwrap().display_name(), "a9 × b9");
    }

    #[test]
    fn sku_uses_first_two_letters_of_each_value() {
        assert_eq!(derive_sku("MUG", "Red × S", 0), "MUG-RES");
        assert_eq!(derive_sku("MUG", "Red × Large", 7), "MUG-RELA");
        assert_eq!(derive_sku(" TEE ", "blue × xl", 3), "TEE-BLXL");
    }

    #[test]
    fn sku_falls_back_to_padded_ordinal() {
        assert_eq!(derive_sku("", "Red × S", 0), "VAR-001");
        assert_eq!(derive_sku("   ", "Red × S", 41), "VAR-042");
    }

    #[test]
    fn sku_code_handles_multibyte_values() {
        assert_eq!(sku_code("Ärger × é"), "ÄRÉ");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: count is min(cap, product of value counts).
            #[test]
            fn count_is_capped_product(counts in prop::collection::vec(1usize..7, 1..5)) {
                let axes: Vec<SelectedAxis> = counts
                    .iter()
                    .enumerate()
                    .map(|(i, &n)| {
                        let names: Vec<String> = (0..n).map(|v| format!("v{v}")).collect();
                        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
                        selected(i as u64 + 1, &format!("axis{i}"), &refs)
                    })
                    .collect();

                let product: usize = counts.iter().product();
                let set = generate(&axes);
                prop_assert_eq!(set.len(), product.min(COMBINATION_CAP));
                prop_assert_eq!(set.total_possible(), product as u64);
            }

            /// Property: no two generated combinations are identical.
            #[test]
            fn combinations_are_distinct(counts in prop::collection::vec(1usize..5, 1..4)) {
                let axes: Vec<SelectedAxis> = counts
                    .iter()
                    .enumerate()
                    .map(|(i, &n)| {
                        let names: Vec<String> = (0..n).map(|v| format!("v{v}")).collect();
                        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
                        selected(i as u64 + 1, &format!("axis{i}"), &refs)
                    })
                    .collect();

                let set = generate(&axes);
                let unique: std::collections::HashSet<_> = set.combinations().iter().collect();
                prop_assert_eq!(unique.len(), set.len());
            }

            /// Property: SKU derivation ignores position when a base SKU exists.
            #[test]
            fn sku_is_position_independent(
                base in "[A-Z]{1,6}",
                a in "[A-Za-z]{1,8}",
                b in "[A-Za-z]{1,8}",
                i in 0usize..100,
                j in 0usize..100,
            ) {
                let display = format!("{a}{DISPLAY_SEPARATOR}{b}");
                prop_assert_eq!(derive_sku(&base, &display, i), derive_sku(&base, &display, j));
            }
        }
    }
}
