use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::model::{PreparedTable, SalesRecord};

// ---------------------------------------------------------------------------
// Aggregates over the filtered view
// ---------------------------------------------------------------------------
//
// Every function here takes the prepared table plus the current filtered
// indices and reads only; grouping uses BTreeMap so results come out in a
// deterministic order. An empty view is valid everywhere and produces
// zero-valued metrics / empty groupings.

/// Headline metrics for the overview panel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Overview {
    pub total_sales: f64,
    pub mean_sales: f64,
    pub total_customers: u64,
    pub mean_customers: f64,
}

fn view<'a>(
    table: &'a PreparedTable,
    indices: &'a [usize],
) -> impl Iterator<Item = &'a SalesRecord> {
    indices.iter().map(|&i| &table.records[i])
}

/// Totals and means over the filtered view; means are 0 for an empty view.
pub fn overview(table: &PreparedTable, indices: &[usize]) -> Overview {
    let n = indices.len();
    if n == 0 {
        return Overview::default();
    }
    let total_sales: f64 = view(table, indices).map(|r| r.sales).sum();
    let total_customers: u64 = view(table, indices).map(|r| u64::from(r.customers)).sum();
    Overview {
        total_sales,
        mean_sales: total_sales / n as f64,
        total_customers,
        mean_customers: total_customers as f64 / n as f64,
    }
}

/// Sales summed per calendar day.
pub fn sales_by_date(table: &PreparedTable, indices: &[usize]) -> BTreeMap<NaiveDate, f64> {
    let mut out = BTreeMap::new();
    for r in view(table, indices) {
        *out.entry(r.date).or_insert(0.0) += r.sales;
    }
    out
}

/// Customers summed per calendar day.
pub fn customers_by_date(table: &PreparedTable, indices: &[usize]) -> BTreeMap<NaiveDate, u64> {
    let mut out = BTreeMap::new();
    for r in view(table, indices) {
        *out.entry(r.date).or_insert(0u64) += u64::from(r.customers);
    }
    out
}

/// Sales summed per (Year, Month).
pub fn sales_by_month(table: &PreparedTable, indices: &[usize]) -> BTreeMap<(i32, u32), f64> {
    let mut out = BTreeMap::new();
    for r in view(table, indices) {
        *out.entry((r.year, r.month)).or_insert(0.0) += r.sales;
    }
    out
}

fn sales_by_key<K: Ord>(
    table: &PreparedTable,
    indices: &[usize],
    key: impl Fn(&SalesRecord) -> K,
) -> BTreeMap<K, f64> {
    let mut out = BTreeMap::new();
    for r in view(table, indices) {
        *out.entry(key(r)).or_insert(0.0) += r.sales;
    }
    out
}

/// Sales summed per store type.
pub fn sales_by_store_type(table: &PreparedTable, indices: &[usize]) -> BTreeMap<String, f64> {
    sales_by_key(table, indices, |r| r.store_type.clone())
}

/// Sales summed per assortment level.
pub fn sales_by_assortment(table: &PreparedTable, indices: &[usize]) -> BTreeMap<String, f64> {
    sales_by_key(table, indices, |r| r.assortment.clone())
}

/// Sales split by the Promo flag (key 0 = no promotion, 1 = promotion).
pub fn sales_by_promo(table: &PreparedTable, indices: &[usize]) -> BTreeMap<u8, f64> {
    sales_by_key(table, indices, |r| r.promo)
}

/// Sales summed per StateHoliday code ("0", "a", "b", "c").
pub fn sales_by_state_holiday(table: &PreparedTable, indices: &[usize]) -> BTreeMap<String, f64> {
    sales_by_key(table, indices, |r| r.state_holiday.clone())
}

/// The n stores with the largest summed Customers, descending; ties break
/// on store ID.
pub fn top_stores_by_customers(
    table: &PreparedTable,
    indices: &[usize],
    n: usize,
) -> Vec<(u32, u64)> {
    let mut per_store: BTreeMap<u32, u64> = BTreeMap::new();
    for r in view(table, indices) {
        *per_store.entry(r.store).or_insert(0) += u64::from(r.customers);
    }
    let mut ranked: Vec<(u32, u64)> = per_store.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

// ---------------------------------------------------------------------------
// Correlation matrix
// ---------------------------------------------------------------------------

/// Column order of [`correlation_matrix`].
pub const CORRELATION_COLUMNS: [&str; 5] =
    ["Sales", "Customers", "CompetitionDistance", "Promo", "IsWeekend"];

/// Pearson correlation matrix over the numeric dashboard columns.
///
/// Entries are NaN when either column has zero variance in the view (the
/// same convention a dataframe `corr()` uses).
pub fn correlation_matrix(table: &PreparedTable, indices: &[usize]) -> [[f64; 5]; 5] {
    let columns: Vec<Vec<f64>> = (0..5)
        .map(|c| {
            view(table, indices)
                .map(|r| match c {
                    0 => r.sales,
                    1 => f64::from(r.customers),
                    2 => r.competition_distance,
                    3 => f64::from(r.promo),
                    _ => f64::from(r.is_weekend),
                })
                .collect()
        })
        .collect();

    let mut out = [[f64::NAN; 5]; 5];
    for i in 0..5 {
        for j in 0..5 {
            out[i][j] = pearson(&columns[i], &columns[j]);
        }
    }
    out
}

fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len();
    if n == 0 {
        return f64::NAN;
    }
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2015, 1, day).unwrap()
    }

    fn sample_table() -> PreparedTable {
        let mut records = Vec::new();

        let mut r = record(1, d(1), 100.0);
        r.customers = 10;
        r.promo = 1;
        records.push(r);

        let mut r = record(1, d(2), 300.0);
        r.customers = 30;
        r.state_holiday = "a".to_string();
        records.push(r);

        let mut r = record(2, d(1), 500.0);
        r.customers = 50;
        r.store_type = "b".to_string();
        r.assortment = "c".to_string();
        records.push(r);

        PreparedTable::from_records(records)
    }

    #[test]
    fn overview_totals_and_means() {
        let table = sample_table();
        let all: Vec<usize> = (0..table.len()).collect();
        let ov = overview(&table, &all);

        assert_eq!(ov.total_sales, 900.0);
        assert_eq!(ov.mean_sales, 300.0);
        assert_eq!(ov.total_customers, 90);
        assert!((ov.mean_customers - 30.0).abs() < 1e-12);
    }

    #[test]
    fn overview_of_empty_view_is_zero() {
        let table = sample_table();
        assert_eq!(overview(&table, &[]), Overview::default());
    }

    #[test]
    fn groupings_respect_the_view() {
        let table = sample_table();

        // view excludes the store-2 row
        let by_date = sales_by_date(&table, &[0, 1]);
        assert_eq!(by_date.get(&d(1)), Some(&100.0));
        assert_eq!(by_date.get(&d(2)), Some(&300.0));

        let all: Vec<usize> = (0..table.len()).collect();
        let by_type = sales_by_store_type(&table, &all);
        assert_eq!(by_type.get("a"), Some(&400.0));
        assert_eq!(by_type.get("b"), Some(&500.0));

        let by_promo = sales_by_promo(&table, &all);
        assert_eq!(by_promo.get(&1), Some(&100.0));
        assert_eq!(by_promo.get(&0), Some(&800.0));

        let by_holiday = sales_by_state_holiday(&table, &all);
        assert_eq!(by_holiday.get("a"), Some(&300.0));

        let by_month = sales_by_month(&table, &all);
        assert_eq!(by_month.get(&(2015, 1)), Some(&900.0));
    }

    #[test]
    fn top_stores_ranked_by_customers() {
        let table = sample_table();
        let all: Vec<usize> = (0..table.len()).collect();

        let top = top_stores_by_customers(&table, &all, 10);
        assert_eq!(top, vec![(2, 50), (1, 40)]);

        let top1 = top_stores_by_customers(&table, &all, 1);
        assert_eq!(top1, vec![(2, 50)]);
    }

    #[test]
    fn correlation_diagonal_and_symmetry() {
        let table = sample_table();
        let all: Vec<usize> = (0..table.len()).collect();
        let corr = correlation_matrix(&table, &all);

        // Sales and Customers move together exactly in the sample
        assert!((corr[0][1] - 1.0).abs() < 1e-12);
        for i in 0..2 {
            assert!((corr[i][i] - 1.0).abs() < 1e-12);
            for j in 0..2 {
                assert!((corr[i][j] - corr[j][i]).abs() < 1e-12);
            }
        }
        // CompetitionDistance is constant in the sample -> NaN column
        assert!(corr[2][0].is_nan());
    }
}
