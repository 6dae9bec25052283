//! What-if batches run each scenario on its own deterministic stream.

use stayrisk_core::{
    run_what_if_batch, Cohort, CohortRecord, RiskOutcome, RiskSimulator, RngBank, SegmentSelector,
    SimConfig, SimError, SimulationParams, WhatIf,
};

fn cohort() -> Cohort {
    Cohort::new(
        (0..30)
            .map(|i| CohortRecord::new("Arroios", "T2", 120.0 + (i % 10) as f64 * 8.0))
            .collect(),
    )
}

fn scenarios() -> Vec<WhatIf> {
    vec![
        WhatIf::baseline(),
        WhatIf::new("price +20%", 20.0, 0.0),
        WhatIf::new("demand -30%", 0.0, -30.0),
    ]
}

fn run(scenarios: &[WhatIf], seed: u64) -> Vec<(WhatIf, RiskOutcome)> {
    let simulator = RiskSimulator::new(&SimConfig::default_test()).unwrap();
    run_what_if_batch(
        &simulator,
        &cohort(),
        &SegmentSelector::new("Arroios", "T2"),
        &SimulationParams::new(80.0, 35.0).with_samples(800),
        scenarios,
        &RngBank::new(seed),
    )
    .unwrap()
}

#[test]
fn batch_returns_one_outcome_per_scenario_in_order() {
    let results = run(&scenarios(), 42);
    assert_eq!(results.len(), 3);
    let labels: Vec<&str> = results.iter().map(|(w, _)| w.label.as_str()).collect();
    assert_eq!(labels, vec!["baseline", "price +20%", "demand -30%"]);

    let base = results[0].1.summary().unwrap();
    let pricier = results[1].1.summary().unwrap();
    let quieter = results[2].1.summary().unwrap();

    assert!((pricier.adjusted_price - 96.0).abs() < 1e-9);
    assert!(pricier.mean_profit > base.mean_profit);
    assert!(quieter.adjusted_occupancy_mean < base.adjusted_occupancy_mean);
    assert!(quieter.mean_profit < base.mean_profit);
}

#[test]
fn appending_scenarios_does_not_change_earlier_results() {
    let short = run(&scenarios()[..2], 7);
    let long = run(&scenarios(), 7);
    assert_eq!(short[0], long[0]);
    assert_eq!(short[1], long[1]);
}

#[test]
fn invalid_scenario_fails_the_batch() {
    let simulator = RiskSimulator::new(&SimConfig::default_test()).unwrap();
    let bad = vec![WhatIf::baseline(), WhatIf::new("broken", f64::NAN, 0.0)];
    let err = run_what_if_batch(
        &simulator,
        &cohort(),
        &SegmentSelector::new("Arroios", "T2"),
        &SimulationParams::new(80.0, 35.0),
        &bad,
        &RngBank::new(1),
    )
    .unwrap_err();
    assert!(matches!(err, SimError::InvalidInput { field: "price_delta_pct", .. }));
}

#[test]
fn small_segment_yields_insufficient_for_every_scenario() {
    let simulator = RiskSimulator::new(&SimConfig::default_test()).unwrap();
    let results = run_what_if_batch(
        &simulator,
        &cohort(),
        &SegmentSelector::new("Arroios", "T4"),
        &SimulationParams::new(80.0, 35.0),
        &scenarios(),
        &RngBank::new(1),
    )
    .unwrap();
    assert!(results.iter().all(|(_, o)| o.is_insufficient()));
}
