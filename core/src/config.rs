use crate::{
    error::{SimError, SimResult},
    types::{Days, DAYS_PER_YEAR, DEFAULT_SAMPLES, DEFAULT_SEED, MIN_COHORT_SIZE},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Names of the listing-table columns the simulator reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub region: String,
    pub typology: String,
    pub occupancy: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            region: "neighbourhood_cleansed".into(),
            typology: "tipologia".into(),
            occupancy: "estimated_occupancy_l365d".into(),
        }
    }
}

impl ColumnMapping {
    pub fn required(&self) -> [&str; 3] {
        [
            self.region.as_str(),
            self.typology.as_str(),
            self.occupancy.as_str(),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub min_cohort_size: usize,
    pub max_occupancy_days: Days,
    pub default_samples: usize,
    pub default_seed: u64,
    #[serde(default)]
    pub columns: ColumnMapping,
    /// Typologies folded together at load time (e.g. T5 and T6 into "T5+").
    #[serde(default)]
    pub typology_aliases: HashMap<String, String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::default_test()
    }
}

impl SimConfig {
    /// Load from the data/ directory.
    /// In tests, use SimConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/risk/simulation_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid config in {path}: {e}"))?;
        log::debug!(
            "config loaded from {path}: min_cohort_size={} samples={} seed={}",
            config.min_cohort_size,
            config.default_samples,
            config.default_seed
        );
        Ok(config)
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            min_cohort_size: MIN_COHORT_SIZE,
            max_occupancy_days: DAYS_PER_YEAR,
            default_samples: DEFAULT_SAMPLES,
            default_seed: DEFAULT_SEED,
            columns: ColumnMapping::default(),
            typology_aliases: HashMap::from([
                ("T5".to_string(), "T5+".to_string()),
                ("T6".to_string(), "T5+".to_string()),
            ]),
        }
    }

    /// Reject settings that would let a degenerate fit or a NaN
    /// reach a summary. The Bessel-corrected std needs at least two records.
    pub fn validate(&self) -> SimResult<()> {
        if self.min_cohort_size < 2 {
            return Err(SimError::invalid(
                "min_cohort_size",
                format!("must be at least 2, got {}", self.min_cohort_size),
            ));
        }
        if !self.max_occupancy_days.is_finite() || self.max_occupancy_days <= 0.0 {
            return Err(SimError::invalid(
                "max_occupancy_days",
                format!("must be a positive number, got {}", self.max_occupancy_days),
            ));
        }
        if self.default_samples == 0 {
            return Err(SimError::invalid("default_samples", "must be positive"));
        }
        for column in self.columns.required() {
            if column.trim().is_empty() {
                return Err(SimError::invalid("columns", "column names must not be empty"));
            }
        }
        Ok(())
    }
}
