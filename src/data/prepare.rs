use chrono::Datelike;
use log::info;

use super::loader::JoinedRow;
use super::model::{PreparedTable, SalesRecord};

/// Number of per-store lag features (`Sales_lag_1` .. `Sales_lag_7`).
pub const LAG_DAYS: usize = 7;

// ---------------------------------------------------------------------------
// Feature preparation pipeline
// ---------------------------------------------------------------------------

/// Turn the joined raw rows into the prepared table.
///
/// Pure and deterministic; steps are order-sensitive:
/// 1. coerce the four `*Since*` columns to numbers (failures become null)
/// 2. fill null `CompetitionDistance` with the table-wide median, computed
///    over the full input before anything is dropped
/// 3. fill null `PromoInterval` with the literal `"None"`
/// 4. derive Year / Month / DayOfWeek (Monday = 0) / ISO WeekOfYear
/// 5. derive IsWeekend
/// 6. keep StateHoliday as its literal text code
/// 7. per store, sort rows by Date and take Sales 1..=7 positions back
/// 8. drop every row with any remaining null
///
/// Step 8 removes the first seven rows of each store's history *and* any row
/// whose attributes never joined or never coerced. The two causes are
/// deliberately not distinguished.
pub fn prepare(rows: Vec<JoinedRow>) -> PreparedTable {
    let input_len = rows.len();

    let distance_median = median(
        rows.iter()
            .filter_map(|r| r.competition_distance)
            .collect(),
    );

    // Stable sort on (Store, Date) so each store's history is contiguous
    // and chronological; lag_k is then a plain offset within the run.
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by_key(|&i| (rows[i].store, rows[i].date));

    let lags = compute_lags(&rows, &order);

    let mut records = Vec::new();
    for (pos, &i) in order.iter().enumerate() {
        if let Some(rec) = densify(&rows[i], &lags[pos], distance_median) {
            records.push(rec);
        }
    }

    info!(
        "prepared {} rows from {} joined rows ({} dropped)",
        records.len(),
        input_len,
        input_len - records.len()
    );
    PreparedTable::from_records(records)
}

/// `Sales_lag_k` for every row, in sorted order: the Sales value k positions
/// earlier within the same store's run, or null when the run is too short.
fn compute_lags(rows: &[JoinedRow], order: &[usize]) -> Vec<[Option<f64>; LAG_DAYS]> {
    let mut lags = vec![[None; LAG_DAYS]; order.len()];

    let mut run_start = 0;
    for pos in 0..order.len() {
        if rows[order[pos]].store != rows[order[run_start]].store {
            run_start = pos;
        }
        for k in 1..=LAG_DAYS {
            if pos >= run_start + k {
                lags[pos][k - 1] = Some(rows[order[pos - k]].sales);
            }
        }
    }
    lags
}

/// Apply fills and coercions, then keep the row only if nothing is null.
fn densify(
    row: &JoinedRow,
    lags: &[Option<f64>; LAG_DAYS],
    distance_median: Option<f64>,
) -> Option<SalesRecord> {
    let competition_distance = row.competition_distance.or(distance_median)?;
    let promo_interval = row
        .promo_interval
        .clone()
        .unwrap_or_else(|| "None".to_string());

    let day_of_week = row.date.weekday().num_days_from_monday();

    Some(SalesRecord {
        store: row.store,
        date: row.date,
        sales: row.sales,
        customers: row.customers,
        promo: row.promo,
        state_holiday: row.state_holiday.clone(),
        school_holiday: row.school_holiday,

        store_type: row.store_type.clone()?,
        assortment: row.assortment.clone()?,
        competition_distance,
        competition_open_since_month: coerce_numeric(&row.competition_open_since_month)?,
        competition_open_since_year: coerce_numeric(&row.competition_open_since_year)?,
        promo2: row.promo2?,
        promo2_since_week: coerce_numeric(&row.promo2_since_week)?,
        promo2_since_year: coerce_numeric(&row.promo2_since_year)?,
        promo_interval,

        year: row.date.year(),
        month: row.date.month(),
        day_of_week,
        week_of_year: row.date.iso_week().week(),
        is_weekend: u8::from(day_of_week >= 5),

        sales_lag_1: lags[0]?,
        sales_lag_2: lags[1]?,
        sales_lag_3: lags[2]?,
        sales_lag_4: lags[3]?,
        sales_lag_5: lags[4]?,
        sales_lag_6: lags[5]?,
        sales_lag_7: lags[6]?,
    })
}

/// `to_numeric(errors='coerce')`: unparseable text becomes null, never an
/// error.
fn coerce_numeric(value: &Option<String>) -> Option<f64> {
    value.as_deref().and_then(|s| s.trim().parse::<f64>().ok())
}

/// Median with linear interpolation between the two middle values.
fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let n = values.len();
    Some(if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2015, 1, day).unwrap()
    }

    /// A joined row with all attributes present and coercible.
    fn joined(store: u32, date: NaiveDate, sales: f64) -> JoinedRow {
        JoinedRow {
            store,
            date,
            sales,
            customers: 100,
            promo: 0,
            state_holiday: "0".to_string(),
            school_holiday: 0,
            store_type: Some("a".to_string()),
            assortment: Some("a".to_string()),
            competition_distance: Some(500.0),
            competition_open_since_month: Some("9".to_string()),
            competition_open_since_year: Some("2008".to_string()),
            promo2: Some(0),
            promo2_since_week: Some("13".to_string()),
            promo2_since_year: Some("2010".to_string()),
            promo_interval: Some("Jan,Apr,Jul,Oct".to_string()),
        }
    }

    /// Ten consecutive days for one store, Sales 100, 110, .. 190.
    fn ten_day_history() -> Vec<JoinedRow> {
        (0..10)
            .map(|i| joined(1, d(1 + i), 100.0 + 10.0 * i as f64))
            .collect()
    }

    #[test]
    fn scenario_ten_days_leaves_three_rows() {
        let table = prepare(ten_day_history());

        assert_eq!(table.len(), 3);
        let dates: Vec<NaiveDate> = table.records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(8), d(9), d(10)]);

        let first = &table.records[0];
        assert_eq!(first.sales_lag_1, 160.0);
        assert_eq!(first.sales_lag_7, 100.0);
    }

    #[test]
    fn lags_follow_each_stores_own_chronology() {
        // Interleave two stores, feed rows out of date order.
        let mut rows = Vec::new();
        for i in (0..9).rev() {
            rows.push(joined(2, d(1 + i), 1000.0 + i as f64));
        }
        for i in 0..8 {
            rows.push(joined(1, d(1 + i), 100.0 + i as f64));
        }

        let table = prepare(rows);
        // store 1: 8 rows -> 1 kept; store 2: 9 rows -> 2 kept
        assert_eq!(table.len(), 3);

        for rec in &table.records {
            for k in 1..=LAG_DAYS {
                let base = if rec.store == 1 { 100.0 } else { 1000.0 };
                let day = rec.date.format("%d").to_string().parse::<f64>().unwrap();
                assert_eq!(rec.sales_lag(k), base + (day - 1.0) - k as f64);
            }
        }
    }

    #[test]
    fn drop_policy_is_max_n_minus_seven() {
        for n in [1usize, 4, 7, 8, 12] {
            let rows: Vec<JoinedRow> = (0..n)
                .map(|i| joined(1, d(1 + i as u32), 100.0))
                .collect();
            let table = prepare(rows);
            assert_eq!(table.len(), n.saturating_sub(LAG_DAYS), "n = {n}");
        }
    }

    #[test]
    fn competition_distance_filled_with_global_median() {
        let mut rows = ten_day_history();
        // distances 10, 20, 30, 40 and six nulls -> median 25
        for (i, row) in rows.iter_mut().enumerate() {
            row.competition_distance = match i {
                0 => Some(10.0),
                1 => Some(20.0),
                2 => Some(30.0),
                3 => Some(40.0),
                _ => None,
            };
        }

        let table = prepare(rows);
        // the three surviving rows all had a null distance
        assert_eq!(table.len(), 3);
        for rec in &table.records {
            assert_eq!(rec.competition_distance, 25.0);
        }
    }

    #[test]
    fn median_is_independent_of_row_order() {
        let mut rows = ten_day_history();
        for (i, row) in rows.iter_mut().enumerate() {
            row.competition_distance = match i {
                0 => Some(40.0),
                5 => Some(10.0),
                _ => None,
            };
        }
        let reversed: Vec<JoinedRow> = rows.iter().rev().cloned().collect();

        let a = prepare(rows);
        let b = prepare(reversed);
        assert_eq!(a.records[0].competition_distance, 25.0);
        assert_eq!(a.records[0].competition_distance, b.records[0].competition_distance);
    }

    #[test]
    fn promo_interval_null_becomes_literal_none() {
        let mut rows = ten_day_history();
        for row in &mut rows {
            row.promo_interval = None;
        }
        let table = prepare(rows);
        assert!(table.records.iter().all(|r| r.promo_interval == "None"));
    }

    #[test]
    fn calendar_features() {
        let mut rows = ten_day_history();
        rows[7].state_holiday = "b".to_string();
        let table = prepare(rows);

        // 2015-01-08 was a Thursday
        let thu = &table.records[0];
        assert_eq!((thu.year, thu.month), (2015, 1));
        assert_eq!(thu.day_of_week, 3);
        assert_eq!(thu.week_of_year, 2);
        assert_eq!(thu.is_weekend, 0);
        assert_eq!(thu.state_holiday, "b");

        // 2015-01-10 was a Saturday
        let sat = &table.records[2];
        assert_eq!(sat.day_of_week, 5);
        assert_eq!(sat.is_weekend, 1);
    }

    #[test]
    fn uncoercible_numeric_drops_the_row() {
        let mut rows = ten_day_history();
        // one mid-history row with garbage in a coercion column
        rows[8].promo2_since_week = Some("n/a".to_string());
        let table = prepare(rows);

        assert_eq!(table.len(), 2);
        assert!(table.records.iter().all(|r| r.date != d(9)));
    }

    #[test]
    fn store_without_attribute_row_vanishes_entirely() {
        let mut rows = ten_day_history();
        rows.extend((0..10).map(|i| {
            let mut row = joined(2, d(1 + i), 900.0);
            row.store_type = None;
            row.assortment = None;
            row.competition_distance = None;
            row.competition_open_since_month = None;
            row.competition_open_since_year = None;
            row.promo2 = None;
            row.promo2_since_week = None;
            row.promo2_since_year = None;
            row.promo_interval = None;
            row
        }));

        let table = prepare(rows);
        assert_eq!(table.len(), 3);
        assert!(table.stores.iter().all(|&s| s == 1));
    }

    #[test]
    fn empty_input_yields_empty_table() {
        assert!(prepare(Vec::new()).is_empty());
    }

    #[test]
    fn median_interpolates_even_counts() {
        assert_eq!(median(vec![3.0, 1.0]), Some(2.0));
        assert_eq!(median(vec![5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(median(Vec::new()), None);
    }
}
