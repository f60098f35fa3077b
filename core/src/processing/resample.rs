use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::math::interp::interp_linear;
use crate::prelude::{GrapeError, GrapeResult, ProcessingStage};
use crate::station::series::ObservationSeries;
use crate::station::time::{duration_seconds, format_timestamp, seconds_between};
use crate::telemetry::log::LogManager;

/// What to do with grid points that fall outside the observed span.
///
/// Truncating the first timestamp to a whole second can place the first grid
/// point up to one second before the first observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Hold the nearest observed value.
    #[default]
    Clamp,
    /// Reject the series.
    Error,
}

/// Fixed-cadence linear resampler.
pub struct Resampler {
    cadence: Duration,
    boundary: BoundaryPolicy,
    logger: LogManager,
}

impl Resampler {
    pub fn new(cadence: Duration, boundary: BoundaryPolicy) -> GrapeResult<Self> {
        if cadence <= Duration::zero() {
            return Err(GrapeError::InvalidConfig(format!(
                "resample cadence must be positive, got {} s",
                duration_seconds(cadence)
            )));
        }
        Ok(Self {
            cadence,
            boundary,
            logger: LogManager::new("resample"),
        })
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    /// Grid from the whole-second floor of `first` to the whole-second floor
    /// of `last`, inclusive, stepping by the cadence.
    pub fn grid(&self, first: DateTime<Utc>, last: DateTime<Utc>) -> GrapeResult<Vec<DateTime<Utc>>> {
        let start = first.trunc_subsecs(0);
        let end = last.trunc_subsecs(0);
        let overflow = || GrapeError::InvalidConfig("resample span is too long".to_string());

        let span_ns = (end - start).num_nanoseconds().ok_or_else(overflow)?;
        let step_ns = self.cadence.num_nanoseconds().ok_or_else(overflow)?;
        let steps = span_ns / step_ns;

        Ok((0..=steps)
            .map(|step| start + Duration::nanoseconds(step * step_ns))
            .collect())
    }

    pub fn resample(&self, series: &ObservationSeries) -> GrapeResult<ObservationSeries> {
        let (first, last) = match (series.start(), series.end()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(GrapeError::InvalidSeries(
                    "cannot resample an empty series".to_string(),
                ))
            }
        };
        series.ensure_strictly_increasing()?;

        let grid = self.grid(first, last)?;
        if self.boundary == BoundaryPolicy::Error {
            if let Some(outside) = grid.iter().find(|&&t| t < first || t > last) {
                return Err(GrapeError::InvalidSeries(format!(
                    "grid point {} lies outside the observed span {} .. {}",
                    format_timestamp(*outside),
                    format_timestamp(first),
                    format_timestamp(last)
                )));
            }
        }

        let xs: Vec<f64> = series
            .timestamps()
            .iter()
            .map(|&t| seconds_between(first, t))
            .collect();
        let targets: Vec<f64> = grid.iter().map(|&t| seconds_between(first, t)).collect();

        let mut resampled = ObservationSeries::new(grid);
        for column in series.columns() {
            resampled.insert_column(&column.name, interp_linear(&xs, &column.values, &targets))?;
        }

        self.logger.record(&format!(
            "resampled {} rows to {} samples at {} s",
            series.len(),
            resampled.len(),
            duration_seconds(self.cadence)
        ));
        Ok(resampled)
    }
}

impl ProcessingStage for Resampler {
    fn label(&self) -> String {
        format!("Resampled Data (dt = {} s)", duration_seconds(self.cadence))
    }

    fn execute(&self, input: &ObservationSeries) -> GrapeResult<ObservationSeries> {
        self.resample(input)
    }
}
