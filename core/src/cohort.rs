//! Historical listing cohort — the read-only table the simulator fits on.
//!
//! The simulator needs only three columns from the listings dataset:
//! region, typology and estimated annual occupancy. Everything else in
//! the source table is ignored.

use crate::{
    config::SimConfig,
    error::{SimError, SimResult},
    types::{Days, Region, Typology},
};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

/// One historical listing observation.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortRecord {
    pub region: Region,
    pub typology: Typology,
    /// `None` when the source cell was empty.
    pub occupancy: Option<Days>,
}

impl CohortRecord {
    pub fn new(region: impl Into<Region>, typology: impl Into<Typology>, occupancy: Days) -> Self {
        Self {
            region: region.into(),
            typology: typology.into(),
            occupancy: Some(occupancy),
        }
    }
}

/// Lookup key selecting a comparable subgroup of the cohort.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentSelector {
    pub region: Region,
    pub typology: Typology,
}

impl SegmentSelector {
    pub fn new(region: impl Into<Region>, typology: impl Into<Typology>) -> Self {
        Self {
            region: region.into(),
            typology: typology.into(),
        }
    }

    fn matches(&self, record: &CohortRecord) -> bool {
        record.region == self.region && record.typology == self.typology
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cohort {
    records: Vec<CohortRecord>,
}

impl Cohort {
    pub fn new(records: Vec<CohortRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CohortRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Observed occupancies of every record matching `selector`, in source order.
    /// Matching is exact and case-sensitive. Records without an occupancy
    /// observation are skipped.
    pub fn segment(&self, selector: &SegmentSelector) -> Vec<Days> {
        self.records
            .iter()
            .filter(|r| selector.matches(r))
            .filter_map(|r| r.occupancy)
            .collect()
    }

    /// Distinct regions, sorted.
    pub fn regions(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.region.as_str()).collect();
        set.into_iter().collect()
    }

    /// Distinct typologies, sorted.
    pub fn typologies(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.typology.as_str()).collect();
        set.into_iter().collect()
    }

    pub fn from_csv_path(path: impl AsRef<Path>, config: &SimConfig) -> SimResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let cohort = Self::from_csv_reader(file, config)?;
        log::info!(
            "cohort: loaded {} records from {}",
            cohort.len(),
            path.display()
        );
        Ok(cohort)
    }

    /// Parse a listings CSV. The header is checked before any row is read,
    /// so a table missing a required column fails with `MissingColumn`
    /// instead of producing statistics over the wrong data.
    pub fn from_csv_reader<R: Read>(reader: R, config: &SimConfig) -> SimResult<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let column_index = |name: &str| -> SimResult<usize> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| SimError::MissingColumn {
                    column: name.to_string(),
                })
        };
        let region_idx = column_index(&config.columns.region)?;
        let typology_idx = column_index(&config.columns.typology)?;
        let occupancy_idx = column_index(&config.columns.occupancy)?;

        let mut records = Vec::new();
        let mut missing_occupancy = 0usize;

        for row in csv_reader.records() {
            let row = row?;
            // csv::Reader always records positions; 0 only if that ever changes.
            let line = row.position().map_or(0, |p| p.line());

            let region = row.get(region_idx).unwrap_or_default().to_string();
            let raw_typology = row.get(typology_idx).unwrap_or_default();
            let typology = config
                .typology_aliases
                .get(raw_typology)
                .cloned()
                .unwrap_or_else(|| raw_typology.to_string());

            let occupancy = parse_occupancy(
                row.get(occupancy_idx).unwrap_or_default(),
                config.max_occupancy_days,
                line,
            )?;
            if occupancy.is_none() {
                missing_occupancy += 1;
            }

            records.push(CohortRecord {
                region,
                typology,
                occupancy,
            });
        }

        if missing_occupancy > 0 {
            log::debug!("cohort: {missing_occupancy} records have no occupancy observation");
        }

        Ok(Self::new(records))
    }
}

fn parse_occupancy(raw: &str, max_days: Days, line: u64) -> SimResult<Option<Days>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let value: Days = raw.parse().map_err(|_| SimError::InvalidRecord {
        line,
        reason: format!("occupancy '{raw}' is not a number"),
    })?;
    if !value.is_finite() || !(0.0..=max_days).contains(&value) {
        return Err(SimError::InvalidRecord {
            line,
            reason: format!("occupancy {value} outside [0, {max_days}]"),
        });
    }
    Ok(Some(value))
}
