use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SalesRecord – one prepared row (one store-day)
// ---------------------------------------------------------------------------

/// A fully prepared store-day observation.
///
/// Every field is dense: rows that still carried a null after the
/// preparation pipeline (missing store attributes, uncoercible numerics,
/// insufficient lag history) have already been dropped.
///
/// Serialized column names match the original dataset schema
/// (`StateHoliday`, `CompetitionDistance`, `Sales_lag_1`, ...), so a CSV
/// export of these records lines up with the source files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SalesRecord {
    pub store: u32,
    pub date: NaiveDate,
    pub sales: f64,
    pub customers: u32,
    /// 0/1 flag: store ran a promotion that day.
    pub promo: u8,
    /// Holiday code kept as text: "0" none, "a" public, "b" Easter, "c" Christmas.
    pub state_holiday: String,
    pub school_holiday: u8,

    // -- Store attributes (joined in, non-null after preparation) --
    pub store_type: String,
    pub assortment: String,
    /// Distance to the nearest competitor in meters.
    pub competition_distance: f64,
    pub competition_open_since_month: f64,
    pub competition_open_since_year: f64,
    pub promo2: u8,
    pub promo2_since_week: f64,
    pub promo2_since_year: f64,
    pub promo_interval: String,

    // -- Calendar features derived from Date --
    pub year: i32,
    pub month: u32,
    /// 0 = Monday .. 6 = Sunday.
    pub day_of_week: u32,
    /// ISO-8601 week number.
    pub week_of_year: u32,
    /// 1 when day_of_week is Saturday or Sunday.
    pub is_weekend: u8,

    // -- Lag features: Sales k rows back in this store's own history --
    #[serde(rename = "Sales_lag_1")]
    pub sales_lag_1: f64,
    #[serde(rename = "Sales_lag_2")]
    pub sales_lag_2: f64,
    #[serde(rename = "Sales_lag_3")]
    pub sales_lag_3: f64,
    #[serde(rename = "Sales_lag_4")]
    pub sales_lag_4: f64,
    #[serde(rename = "Sales_lag_5")]
    pub sales_lag_5: f64,
    #[serde(rename = "Sales_lag_6")]
    pub sales_lag_6: f64,
    #[serde(rename = "Sales_lag_7")]
    pub sales_lag_7: f64,
}

impl SalesRecord {
    /// Lag accessor for k in 1..=7.
    pub fn sales_lag(&self, k: usize) -> f64 {
        match k {
            1 => self.sales_lag_1,
            2 => self.sales_lag_2,
            3 => self.sales_lag_3,
            4 => self.sales_lag_4,
            5 => self.sales_lag_5,
            6 => self.sales_lag_6,
            7 => self.sales_lag_7,
            _ => panic!("lag index {k} out of range 1..=7"),
        }
    }
}

// ---------------------------------------------------------------------------
// PreparedTable – the immutable working table
// ---------------------------------------------------------------------------

/// The prepared dataset with pre-computed filter-dimension indices.
///
/// Built once per input pair and treated as immutable afterwards; filters
/// produce index projections into `records` rather than copies.
#[derive(Debug, Clone, Default)]
pub struct PreparedTable {
    /// All prepared rows, ordered by (Store, Date).
    pub records: Vec<SalesRecord>,
    /// Distinct store IDs present.
    pub stores: BTreeSet<u32>,
    /// Distinct store types present.
    pub store_types: BTreeSet<String>,
    /// Distinct assortment levels present.
    pub assortments: BTreeSet<String>,
    /// Earliest and latest Date present (None for an empty table).
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
}

impl PreparedTable {
    /// Build the filter-dimension indices from the prepared rows.
    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        let mut stores = BTreeSet::new();
        let mut store_types = BTreeSet::new();
        let mut assortments = BTreeSet::new();
        let mut date_bounds: Option<(NaiveDate, NaiveDate)> = None;

        for rec in &records {
            stores.insert(rec.store);
            store_types.insert(rec.store_type.clone());
            assortments.insert(rec.assortment.clone());
            date_bounds = Some(match date_bounds {
                None => (rec.date, rec.date),
                Some((lo, hi)) => (lo.min(rec.date), hi.max(rec.date)),
            });
        }

        PreparedTable {
            records,
            stores,
            store_types,
            assortments,
            date_bounds,
        }
    }

    /// Number of prepared rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A dense record with sensible defaults, for tests across the data layer.
    pub(crate) fn record(store: u32, date: NaiveDate, sales: f64) -> SalesRecord {
        SalesRecord {
            store,
            date,
            sales,
            customers: 100,
            promo: 0,
            state_holiday: "0".to_string(),
            school_holiday: 0,
            store_type: "a".to_string(),
            assortment: "a".to_string(),
            competition_distance: 500.0,
            competition_open_since_month: 3.0,
            competition_open_since_year: 2010.0,
            promo2: 0,
            promo2_since_week: 1.0,
            promo2_since_year: 2012.0,
            promo_interval: "None".to_string(),
            year: 2015,
            month: date.format("%m").to_string().parse().unwrap(),
            day_of_week: 0,
            week_of_year: 1,
            is_weekend: 0,
            sales_lag_1: 0.0,
            sales_lag_2: 0.0,
            sales_lag_3: 0.0,
            sales_lag_4: 0.0,
            sales_lag_5: 0.0,
            sales_lag_6: 0.0,
            sales_lag_7: 0.0,
        }
    }

    #[test]
    fn indices_cover_all_dimensions() {
        let d = |day| NaiveDate::from_ymd_opt(2015, 1, day).unwrap();
        let mut r1 = record(1, d(1), 100.0);
        r1.store_type = "b".to_string();
        let r2 = record(2, d(5), 200.0);

        let table = PreparedTable::from_records(vec![r1, r2]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.stores.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert!(table.store_types.contains("a") && table.store_types.contains("b"));
        assert_eq!(table.date_bounds, Some((d(1), d(5))));
    }

    #[test]
    fn empty_table_has_no_bounds() {
        let table = PreparedTable::from_records(Vec::new());
        assert!(table.is_empty());
        assert_eq!(table.date_bounds, None);
    }
}
