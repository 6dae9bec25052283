//! stayrisk-core: Monte Carlo profit-risk estimation for short-term
//! rental units.
//!
//! Given a historical listing cohort, a (region, typology) selector and a
//! predicted nightly price, the simulator fits a Normal model to the
//! subgroup's annual occupancy, samples it, and reduces the resulting
//! profits to a `RiskSummary`.

pub mod cohort;
pub mod config;
pub mod error;
pub mod rng;
pub mod scenario;
pub mod simulator;
pub mod stats;
pub mod types;

pub use cohort::{Cohort, CohortRecord, SegmentSelector};
pub use config::{ColumnMapping, SimConfig};
pub use error::{SimError, SimResult};
pub use rng::{RngBank, SimRng};
pub use scenario::{run_what_if_batch, WhatIf};
pub use simulator::{
    simulate_risk, ProfitPercentiles, RiskOutcome, RiskSimulator, RiskSummary, SimulationParams,
};
