//! Data core for a retail sales analytics dashboard.
//!
//! Loads the two-file retail dataset (daily transactions + store
//! attributes), prepares an immutable feature table, and serves filtered
//! views with summary aggregates to whatever renders them. Presentation is
//! deliberately outside this crate: consumers get read-only records,
//! indices, and aggregate values.

pub mod data;
pub mod state;
