use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use log::info;
use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fatal load failures. Any of these halts the session: no partial or
/// degraded table is ever produced.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A source file is absent or unreadable. The message names the resource
    /// so the host can surface it directly.
    #[error("missing or unreadable source file: {path}")]
    MissingSource {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A row or header failed CSV deserialization.
    #[error("malformed record in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// A Date cell did not parse under any accepted format.
    #[error("unparseable date {value:?} in {path}")]
    Date { path: String, value: String },
}

// ---------------------------------------------------------------------------
// Raw CSV row shapes
// ---------------------------------------------------------------------------

/// One row of the daily transactions file. Columns not listed here
/// (`Open`, the raw `DayOfWeek`) are ignored by the deserializer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TransactionRow {
    store: u32,
    /// Kept as text here; parsed into a [`NaiveDate`] during the join so a
    /// bad cell reports the offending literal.
    date: String,
    sales: f64,
    customers: u32,
    promo: u8,
    state_holiday: String,
    school_holiday: u8,
}

/// One row of the store-attributes file. Everything beyond the key is
/// optional: the dataset has genuinely empty cells, and an unmatched join
/// produces the same `None`s.
///
/// The four `*Since*` columns stay as raw text; the preparator owns their
/// numeric coercion (and its value-becomes-null failure policy).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StoreRow {
    store: u32,
    store_type: Option<String>,
    assortment: Option<String>,
    competition_distance: Option<f64>,
    competition_open_since_month: Option<String>,
    competition_open_since_year: Option<String>,
    promo2: Option<u8>,
    promo2_since_week: Option<String>,
    promo2_since_year: Option<String>,
    promo_interval: Option<String>,
}

// ---------------------------------------------------------------------------
// JoinedRow – transactions left-joined with store attributes
// ---------------------------------------------------------------------------

/// The left-join result the preparator consumes. Transaction fields are
/// dense; store attributes are `None` when the store had no attribute row
/// or the cell was empty.
#[derive(Debug, Clone)]
pub struct JoinedRow {
    pub store: u32,
    pub date: NaiveDate,
    pub sales: f64,
    pub customers: u32,
    pub promo: u8,
    pub state_holiday: String,
    pub school_holiday: u8,

    pub store_type: Option<String>,
    pub assortment: Option<String>,
    pub competition_distance: Option<f64>,
    pub competition_open_since_month: Option<String>,
    pub competition_open_since_year: Option<String>,
    pub promo2: Option<u8>,
    pub promo2_since_week: Option<String>,
    pub promo2_since_year: Option<String>,
    pub promo_interval: Option<String>,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load both sources and left-join transactions with store attributes on
/// `Store`. Every transaction row is retained; stores without an attribute
/// row get all-`None` attributes.
pub fn load(train_path: &Path, store_path: &Path) -> Result<Vec<JoinedRow>, LoadError> {
    let stores = read_store_attributes(store_path)?;
    let rows = read_transactions(train_path, &stores)?;
    info!(
        "loaded {} transaction rows joined against {} stores",
        rows.len(),
        stores.len()
    );
    Ok(rows)
}

fn open_source(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::MissingSource {
        path: path.display().to_string(),
        source,
    })
}

fn read_store_attributes(path: &Path) -> Result<HashMap<u32, StoreRow>, LoadError> {
    let file = open_source(path)?;
    let mut reader = csv::Reader::from_reader(file);

    let mut stores = HashMap::new();
    for result in reader.deserialize() {
        let row: StoreRow = result.map_err(|source| LoadError::Csv {
            path: path.display().to_string(),
            source,
        })?;
        stores.insert(row.store, row);
    }
    Ok(stores)
}

fn read_transactions(
    path: &Path,
    stores: &HashMap<u32, StoreRow>,
) -> Result<Vec<JoinedRow>, LoadError> {
    let file = open_source(path)?;
    let mut reader = csv::Reader::from_reader(file);

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let tx: TransactionRow = result.map_err(|source| LoadError::Csv {
            path: path.display().to_string(),
            source,
        })?;

        let date = parse_date(&tx.date).ok_or_else(|| LoadError::Date {
            path: path.display().to_string(),
            value: tx.date.clone(),
        })?;

        let attrs = stores.get(&tx.store);
        rows.push(JoinedRow {
            store: tx.store,
            date,
            sales: tx.sales,
            customers: tx.customers,
            promo: tx.promo,
            state_holiday: tx.state_holiday,
            school_holiday: tx.school_holiday,
            store_type: attrs.and_then(|a| a.store_type.clone()),
            assortment: attrs.and_then(|a| a.assortment.clone()),
            competition_distance: attrs.and_then(|a| a.competition_distance),
            competition_open_since_month: attrs.and_then(|a| a.competition_open_since_month.clone()),
            competition_open_since_year: attrs.and_then(|a| a.competition_open_since_year.clone()),
            promo2: attrs.and_then(|a| a.promo2),
            promo2_since_week: attrs.and_then(|a| a.promo2_since_week.clone()),
            promo2_since_year: attrs.and_then(|a| a.promo2_since_year.clone()),
            promo_interval: attrs.and_then(|a| a.promo_interval.clone()),
        });
    }
    Ok(rows)
}

/// Parse a Date cell. ISO first, then the common day-first and month-first
/// locale forms; ambiguous values resolve day-first.
fn parse_date(s: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s.trim(), fmt).ok())
}
