// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use castguard_core::{Attributions, GuardConfig};

/// Direction a variable should move to reduce the failure probability.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdjustDirection {
    Increase,
    Decrease,
}

impl AdjustDirection {
    pub fn arrow(self) -> char {
        match self {
            Self::Increase => '↑',
            Self::Decrease => '↓',
        }
    }
}

/// One entry of the SHAP-derived adjustment priority list, in raw-variable
/// terms.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct PriorityEntry {
    pub variable: String,
    pub priority: f64,
    pub direction: AdjustDirection,
}

/// Derives the adjustment priority list from per-feature attributions.
///
/// A positive attribution pushes toward failure, so the variable should
/// decrease; a negative one means it should increase. Near-zero attributions
/// and encoded columns with no raw mapping carry no priority. Sorted by
/// `|attribution|` descending with a name tie-break, so equal-magnitude
/// signals always adjust in the same order.
pub fn adjustment_priority(
    attributions: &Attributions,
    config: &GuardConfig,
) -> Vec<PriorityEntry> {
    let mut priorities: Vec<PriorityEntry> = attributions
        .iter()
        .filter(|(_, value)| value.abs() >= config.tuning.near_zero_floor)
        .filter_map(|(encoded, value)| {
            let variable = config.raw_variable(encoded)?.to_string();
            let direction = if value > 0.0 {
                AdjustDirection::Decrease
            } else {
                AdjustDirection::Increase
            };
            Some(PriorityEntry {
                variable,
                priority: value.abs(),
                direction,
            })
        })
        .collect();

    priorities.sort_by(|a, b| {
        b.priority
            .total_cmp(&a.priority)
            .then_with(|| a.variable.cmp(&b.variable))
    });
    priorities
}
