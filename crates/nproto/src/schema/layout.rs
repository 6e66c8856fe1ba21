// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Branch layout for field-number dispatch in generated schemas.
//!
//! Dense layouts index a slot table by `number - lo` (one bounds check,
//! one load). Sparse layouts binary-search the sorted numbers. The
//! choice never changes observable behavior.

/// How a generated schema maps a field number to its branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchLayout {
    /// Slot table covering `lo..lo + span`; gaps skip.
    Dense { lo: u32, span: u32 },
    /// One branch per field, searched by number.
    Sparse,
}

impl BranchLayout {
    pub fn is_dense(&self) -> bool {
        matches!(self, Self::Dense { .. })
    }
}

/// Chooses between dense and sparse layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(default))]
pub struct LayoutPolicy {
    /// Minimum `fields * 100 / span` for a dense layout.
    pub min_occupancy_percent: u32,
    /// Largest `max - min + 1` allowed for a dense layout, clamped to
    /// [`MAX_DENSE_SLOTS`].
    pub max_dense_span: u32,
}

pub const DEFAULT_MIN_OCCUPANCY_PERCENT: u32 = 50;
pub const DEFAULT_MAX_DENSE_SPAN: u32 = 1024;
/// Upper bound on dense slot tables, whatever the policy asks for.
pub const MAX_DENSE_SLOTS: u32 = 1 << 16;

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self {
            min_occupancy_percent: DEFAULT_MIN_OCCUPANCY_PERCENT,
            max_dense_span: DEFAULT_MAX_DENSE_SPAN,
        }
    }
}

impl LayoutPolicy {
    /// Always sparse.
    pub const fn sparse_only() -> Self {
        Self {
            min_occupancy_percent: u32::MAX,
            max_dense_span: 0,
        }
    }

    /// Dense whenever the span fits in `max_dense_span` (and
    /// [`MAX_DENSE_SLOTS`]), however empty.
    pub const fn dense_up_to(max_dense_span: u32) -> Self {
        Self {
            min_occupancy_percent: 0,
            max_dense_span,
        }
    }

    /// Pick a layout for field numbers sorted ascending.
    pub fn choose(&self, sorted_numbers: &[u32]) -> BranchLayout {
        let (Some(&lo), Some(&hi)) = (sorted_numbers.first(), sorted_numbers.last()) else {
            return BranchLayout::Sparse;
        };
        let span = u64::from(hi - lo) + 1;
        if span > u64::from(self.max_dense_span.min(MAX_DENSE_SLOTS)) {
            return BranchLayout::Sparse;
        }
        let occupancy = sorted_numbers.len() as u64 * 100;
        if occupancy < span * u64::from(self.min_occupancy_percent) {
            return BranchLayout::Sparse;
        }
        BranchLayout::Dense {
            lo,
            span: span as u32,
        }
    }
}

/// Materialized number-to-index lookup for a chosen layout.
#[derive(Debug, Clone)]
pub(crate) enum BranchTable {
    Dense {
        lo: u32,
        slots: Box<[Option<usize>]>,
    },
    Sparse {
        numbers: Box<[u32]>,
        targets: Box<[usize]>,
    },
}

impl BranchTable {
    /// `entries` pairs each field number with its target index.
    pub(crate) fn build(layout: BranchLayout, entries: &[(u32, usize)]) -> Self {
        match layout {
            BranchLayout::Dense { lo, span } => {
                let mut slots = vec![None; span as usize];
                for &(number, target) in entries {
                    if let Some(slot) = slots.get_mut(number.wrapping_sub(lo) as usize) {
                        *slot = Some(target);
                    }
                }
                Self::Dense {
                    lo,
                    slots: slots.into_boxed_slice(),
                }
            }
            BranchLayout::Sparse => {
                let mut sorted = entries.to_vec();
                sorted.sort_unstable_by_key(|&(number, _)| number);
                Self::Sparse {
                    numbers: sorted.iter().map(|&(number, _)| number).collect(),
                    targets: sorted.iter().map(|&(_, target)| target).collect(),
                }
            }
        }
    }

    #[inline]
    pub(crate) fn lookup(&self, number: u32) -> Option<usize> {
        match self {
            Self::Dense { lo, slots } => slots
                .get(number.wrapping_sub(*lo) as usize)
                .copied()
                .flatten(),
            Self::Sparse { numbers, targets } => numbers
                .binary_search(&number)
                .ok()
                .and_then(|index| targets.get(index).copied()),
        }
    }
}
