//! Shared primitive types and constants used across the simulator.

/// A region identifier (e.g. a neighbourhood name).
pub type Region = String;

/// A unit typology identifier (e.g. "T1").
pub type Typology = String;

/// Booked nights per year.
pub type Days = f64;

/// Upper bound for annual occupancy. Draws are clamped into [0, DAYS_PER_YEAR].
pub const DAYS_PER_YEAR: Days = 365.0;

/// Smallest subgroup the occupancy model may be fitted on.
pub const MIN_COHORT_SIZE: usize = 10;

pub const DEFAULT_SAMPLES: usize = 1000;

pub const DEFAULT_SEED: u64 = 42;

/// Profit percentiles reported in every summary, in ascending order.
pub const PERCENTILE_LEVELS: [f64; 5] = [5.0, 25.0, 50.0, 75.0, 95.0];
