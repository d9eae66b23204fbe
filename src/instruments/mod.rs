//! Instrumentation-reading aggregation and threshold classification.
//!
//! Station sheets are reduced to per-sensor readings (first/last sample,
//! weekly and cumulative change), typed from their column headers, grouped
//! per (location, instrument type) down to the worst case, and graded against
//! per-discipline safety limits.

pub mod batch;
pub mod classify;
pub mod extract;
pub mod identity;
pub mod reduce;
pub mod types;
pub mod utility;
