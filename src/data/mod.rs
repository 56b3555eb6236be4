/// Data layer: loading, preparation, filtering, aggregation, export.
///
/// Pipeline:
/// ```text
///  train.csv   store.csv
///      │           │
///      └─────┬─────┘
///            ▼
///      ┌──────────┐
///      │  loader   │  read both CSVs, left join on Store
///      └──────────┘
///            │
///            ▼
///      ┌──────────┐
///      │ prepare   │  coerce, fill, calendar + lag features, null drop
///      └──────────┘
///            │
///            ▼
///   ┌────────────────┐
///   │ PreparedTable   │  immutable; Vec<SalesRecord> + dimension indices
///   └────────────────┘
///            │
///            ▼
///      ┌──────────┐
///      │  filter   │  selection → row mask / indices
///      └──────────┘
///            │
///            ├──► summary   (metrics, groupings, correlations)
///            └──► export    (CSV snapshot of the filtered view)
/// ```

pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod prepare;
pub mod summary;
