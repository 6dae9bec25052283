//! Risk simulator — Monte Carlo estimate of a rental unit's annual profit.
//!
//! PIPELINE (one call, four stages, no retained state):
//!   1. Filter the cohort to the requested (region, typology) subgroup.
//!   2. Fit a Normal model to the subgroup's annual occupancy.
//!   3. Apply what-if deltas, draw occupancies, clamp each into [0, 365].
//!   4. Convert draws to profit and reduce to a RiskSummary.
//!
//! RULES:
//!   - A subgroup below the minimum size is an outcome, not an error.
//!   - Invalid parameters fail the call before any sampling happens.
//!   - The occupancy std is never rescaled by the occupancy delta.
//!   - Clamping is a hard clamp. Mass piles up at 0 and 365.

use crate::{
    cohort::{Cohort, SegmentSelector},
    config::SimConfig,
    error::{SimError, SimResult},
    rng::SimRng,
    stats::{self, OccupancyModel},
    types::{Days, DEFAULT_SAMPLES, PERCENTILE_LEVELS},
};
use rand_distr::{Distribution, Normal};
use serde::Serialize;

/// Inputs for one simulation call.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    /// Nightly price from the prediction model.
    pub predicted_price: f64,
    pub cost_per_night: f64,
    /// Percentage change applied to the price, conventionally in [-100, 100].
    pub price_delta_pct: f64,
    /// Percentage change applied to the occupancy mean, conventionally in [-100, 100].
    pub occupancy_delta_pct: f64,
    pub n_samples: usize,
}

impl SimulationParams {
    pub fn new(predicted_price: f64, cost_per_night: f64) -> Self {
        Self {
            predicted_price,
            cost_per_night,
            price_delta_pct: 0.0,
            occupancy_delta_pct: 0.0,
            n_samples: DEFAULT_SAMPLES,
        }
    }

    pub fn with_price_delta(mut self, pct: f64) -> Self {
        self.price_delta_pct = pct;
        self
    }

    pub fn with_occupancy_delta(mut self, pct: f64) -> Self {
        self.occupancy_delta_pct = pct;
        self
    }

    pub fn with_samples(mut self, n_samples: usize) -> Self {
        self.n_samples = n_samples;
        self
    }

    /// Negative prices and out-of-convention percentages are accepted;
    /// only values that would poison the arithmetic are refused.
    pub fn validate(&self) -> SimResult<()> {
        let finite = [
            ("predicted_price", self.predicted_price),
            ("cost_per_night", self.cost_per_night),
            ("price_delta_pct", self.price_delta_pct),
            ("occupancy_delta_pct", self.occupancy_delta_pct),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(SimError::invalid(field, format!("must be finite, got {value}")));
            }
        }
        if self.n_samples == 0 {
            return Err(SimError::invalid("n_samples", "must be positive"));
        }
        Ok(())
    }

    pub fn adjusted_price(&self) -> f64 {
        self.predicted_price * (1.0 + self.price_delta_pct / 100.0)
    }

    pub fn adjusted_occupancy(&self, occupancy_mean: Days) -> Days {
        occupancy_mean * (1.0 + self.occupancy_delta_pct / 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfitPercentiles {
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

impl ProfitPercentiles {
    fn from_sorted(sorted: &[f64]) -> Self {
        let [p5, p25, p50, p75, p95] = PERCENTILE_LEVELS.map(|p| stats::percentile(sorted, p));
        Self {
            p5,
            p25,
            p50,
            p75,
            p95,
        }
    }

    /// Values in ascending level order (5th, 25th, 50th, 75th, 95th).
    pub fn as_array(&self) -> [f64; 5] {
        [self.p5, self.p25, self.p50, self.p75, self.p95]
    }
}

/// Aggregate statistics of one simulation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskSummary {
    pub mean_profit: f64,
    /// Population standard deviation of the simulated profits.
    pub std_profit: f64,
    /// Fraction of draws with strictly negative profit.
    pub prob_loss: f64,
    pub percentiles: ProfitPercentiles,
    pub adjusted_occupancy_mean: Days,
    pub adjusted_price: f64,
    /// Sample std of the subgroup's occupancy (not rescaled by the delta).
    pub occupancy_std: Days,
    pub cohort_size: usize,
    pub n_samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RiskOutcome {
    Summary(RiskSummary),
    /// The subgroup had `matched` usable records; `required` are needed.
    InsufficientData { matched: usize, required: usize },
}

impl RiskOutcome {
    pub fn summary(&self) -> Option<&RiskSummary> {
        match self {
            Self::Summary(s) => Some(s),
            Self::InsufficientData { .. } => None,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}

pub struct RiskSimulator {
    min_cohort_size: usize,
    max_occupancy_days: Days,
}

impl RiskSimulator {
    /// Fails with `InvalidInput` when the config would allow a degenerate
    /// fit or an unusable occupancy cap.
    pub fn new(config: &SimConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            min_cohort_size: config.min_cohort_size,
            max_occupancy_days: config.max_occupancy_days,
        })
    }

    pub fn simulate(
        &self,
        cohort: &Cohort,
        selector: &SegmentSelector,
        params: &SimulationParams,
        rng: &mut SimRng,
    ) -> SimResult<RiskOutcome> {
        params.validate()?;

        // ── 1. Filter ──────────────────────────────────────────
        let occupancies = cohort.segment(selector);
        if occupancies.len() < self.min_cohort_size {
            log::debug!(
                "risk: {}/{} has {} records, need {}",
                selector.region,
                selector.typology,
                occupancies.len(),
                self.min_cohort_size
            );
            return Ok(RiskOutcome::InsufficientData {
                matched: occupancies.len(),
                required: self.min_cohort_size,
            });
        }

        // ── 2. Fit ─────────────────────────────────────────────
        let model = OccupancyModel::fit(&occupancies).ok_or_else(|| {
            SimError::invalid("cohort", "occupancy dispersion undefined for subgroup")
        })?;
        log::debug!(
            "risk: {}/{} fit mean={:.2} std={:.2} n={} rng={}",
            selector.region,
            selector.typology,
            model.mean,
            model.std_dev,
            model.observations,
            rng.name
        );

        // ── 3. What-if + sample ────────────────────────────────
        let adjusted_price = params.adjusted_price();
        let adjusted_occupancy_mean = params.adjusted_occupancy(model.mean);
        if !adjusted_price.is_finite() || !adjusted_occupancy_mean.is_finite() {
            return Err(SimError::invalid(
                "price_delta_pct",
                "adjusted price or occupancy overflowed",
            ));
        }

        let normal = Normal::new(adjusted_occupancy_mean, model.std_dev)
            .map_err(|e| SimError::invalid("occupancy_model", e.to_string()))?;

        // revenue - cost = (price - cost) * occupancy, per booked night
        let margin = adjusted_price - params.cost_per_night;
        if !(margin * self.max_occupancy_days).is_finite() {
            return Err(SimError::invalid(
                "cost_per_night",
                format!("nightly margin {margin} overflows a year of profit"),
            ));
        }

        let mut profits: Vec<f64> = (0..params.n_samples)
            .map(|_| margin * normal.sample(&mut *rng).clamp(0.0, self.max_occupancy_days))
            .collect();

        // ── 4. Reduce ──────────────────────────────────────────
        let losses = profits.iter().filter(|p| **p < 0.0).count();
        let mean_profit = stats::mean(&profits);
        let std_profit = stats::population_std(&profits);
        if !mean_profit.is_finite() || !std_profit.is_finite() {
            return Err(SimError::invalid(
                "cost_per_night",
                format!("profit statistics overflow for nightly margin {margin}"),
            ));
        }
        profits.sort_by(|a, b| a.total_cmp(b));

        let summary = RiskSummary {
            mean_profit,
            std_profit,
            prob_loss: losses as f64 / params.n_samples as f64,
            percentiles: ProfitPercentiles::from_sorted(&profits),
            adjusted_occupancy_mean,
            adjusted_price,
            occupancy_std: model.std_dev,
            cohort_size: model.observations,
            n_samples: params.n_samples,
        };

        log::info!(
            "risk: {}/{} margin={margin:.2} mean_profit={:.2} std={:.2} p_loss={:.3}",
            selector.region,
            selector.typology,
            summary.mean_profit,
            summary.std_profit,
            summary.prob_loss
        );

        Ok(RiskOutcome::Summary(summary))
    }
}

/// One-shot simulation with the default configuration.
pub fn simulate_risk(
    cohort: &Cohort,
    region: &str,
    typology: &str,
    params: &SimulationParams,
    rng: &mut SimRng,
) -> SimResult<RiskOutcome> {
    RiskSimulator::new(&SimConfig::default_test())?.simulate(
        cohort,
        &SegmentSelector::new(region, typology),
        params,
        rng,
    )
}
