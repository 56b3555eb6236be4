use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{PreparedTable, SalesRecord};

// ---------------------------------------------------------------------------
// FilterSelection – the four user-chosen predicate dimensions
// ---------------------------------------------------------------------------

/// Explicit filter selections over the prepared table.
///
/// Every dimension is an explicit set or range: "select all" is resolved by
/// the caller (see [`FilterSelection::select_all`]) before the mask is built,
/// so the core never branches on a UI toggle. An *empty* set is meaningful
/// and different from select-all: it matches nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSelection {
    /// Store IDs to include.
    pub stores: BTreeSet<u32>,
    /// Inclusive [min, max] Date range.
    pub date_range: (NaiveDate, NaiveDate),
    /// Store types to include.
    pub store_types: BTreeSet<String>,
    /// Assortment levels to include.
    pub assortments: BTreeSet<String>,
}

impl FilterSelection {
    /// The selection equivalent to "everything currently in the table".
    ///
    /// Re-evaluate against the live table whenever it changes; the result is
    /// never snapshotted across table rebuilds.
    pub fn select_all(table: &PreparedTable) -> Self {
        let date_range = table
            .date_bounds
            .unwrap_or_else(|| (NaiveDate::MIN, NaiveDate::MAX));
        FilterSelection {
            stores: table.stores.clone(),
            date_range,
            store_types: table.store_types.clone(),
            assortments: table.assortments.clone(),
        }
    }

    fn matches(&self, rec: &SalesRecord) -> bool {
        let (min_date, max_date) = self.date_range;
        self.stores.contains(&rec.store)
            && rec.date >= min_date
            && rec.date <= max_date
            && self.store_types.contains(&rec.store_type)
            && self.assortments.contains(&rec.assortment)
    }
}

// ---------------------------------------------------------------------------
// Mask construction
// ---------------------------------------------------------------------------

/// One boolean per table row: true iff the row passes all four conditions.
pub fn build_mask(table: &PreparedTable, selection: &FilterSelection) -> Vec<bool> {
    table
        .records
        .iter()
        .map(|rec| selection.matches(rec))
        .collect()
}

/// Indices of the rows passing the current selection, in table order.
pub fn filtered_indices(table: &PreparedTable, selection: &FilterSelection) -> Vec<usize> {
    table
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| selection.matches(rec))
        .map(|(i, _)| i)
        .collect()
}
