//! What-if batches: several price/occupancy adjustments evaluated
//! against the same cohort subgroup and baseline.
//!
//! Each scenario draws from its own stream in the RngBank, keyed by its
//! position in the batch, so results for scenario `i` do not depend on
//! how many scenarios follow it.

use crate::{
    cohort::{Cohort, SegmentSelector},
    error::SimResult,
    rng::RngBank,
    simulator::{RiskOutcome, RiskSimulator, SimulationParams},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatIf {
    pub label: String,
    #[serde(default)]
    pub price_delta_pct: f64,
    #[serde(default)]
    pub occupancy_delta_pct: f64,
}

impl WhatIf {
    pub fn new(label: impl Into<String>, price_delta_pct: f64, occupancy_delta_pct: f64) -> Self {
        Self {
            label: label.into(),
            price_delta_pct,
            occupancy_delta_pct,
        }
    }

    pub fn baseline() -> Self {
        Self::new("baseline", 0.0, 0.0)
    }

    fn apply(&self, base: &SimulationParams) -> SimulationParams {
        base.clone()
            .with_price_delta(self.price_delta_pct)
            .with_occupancy_delta(self.occupancy_delta_pct)
    }
}

/// Run every scenario against `base`. The deltas on `base` are replaced
/// by each scenario's own. Fails on the first invalid scenario.
pub fn run_what_if_batch(
    simulator: &RiskSimulator,
    cohort: &Cohort,
    selector: &SegmentSelector,
    base: &SimulationParams,
    scenarios: &[WhatIf],
    bank: &RngBank,
) -> SimResult<Vec<(WhatIf, RiskOutcome)>> {
    let mut results = Vec::with_capacity(scenarios.len());
    for (index, scenario) in scenarios.iter().enumerate() {
        let mut rng = bank.for_scenario(index);
        let outcome = simulator.simulate(cohort, selector, &scenario.apply(base), &mut rng)?;
        results.push((scenario.clone(), outcome));
    }
    log::debug!(
        "what-if: ran {} scenarios for {}/{} (seed {})",
        results.len(),
        selector.region,
        selector.typology,
        bank.master_seed()
    );
    Ok(results)
}
