use crate::prelude::{GrapeError, GrapeResult, ProcessingStage};
use crate::station::series::{ObservationSeries, POWER_DB, VPK};
use crate::station::time::format_timestamp;
use crate::telemetry::LogManager;

/// Adds `Power_dB = 20 log10(Vpk)` to a series.
///
/// Without a floor, a non-positive or non-finite `Vpk` rejects the series.
/// With a floor, such samples and anything quieter than the floor are
/// clamped to it.
pub struct PowerStage {
    floor_db: Option<f64>,
    logger: LogManager,
}

impl PowerStage {
    pub fn new(floor_db: Option<f64>) -> GrapeResult<Self> {
        if let Some(floor) = floor_db {
            if !floor.is_finite() {
                return Err(GrapeError::InvalidConfig(format!(
                    "power floor must be finite, got {floor}"
                )));
            }
        }
        Ok(Self {
            floor_db,
            logger: LogManager::new("power"),
        })
    }

    pub fn power_db(&self, series: &ObservationSeries) -> GrapeResult<Vec<f64>> {
        let vpk = series.column(VPK).ok_or_else(|| GrapeError::MissingColumn {
            context: "power derivation".to_string(),
            column: VPK.to_string(),
        })?;

        vpk.iter()
            .zip(series.timestamps())
            .map(|(&volts, instant)| {
                let db = 20.0 * volts.log10();
                match self.floor_db {
                    Some(floor) if !(db >= floor) => Ok(floor),
                    Some(_) => Ok(db),
                    None if volts > 0.0 && db.is_finite() => Ok(db),
                    None => Err(GrapeError::InvalidSeries(format!(
                        "Vpk {volts} at {} has no power in dB",
                        format_timestamp(*instant)
                    ))),
                }
            })
            .collect()
    }
}

impl ProcessingStage for PowerStage {
    fn label(&self) -> String {
        "Received Power".to_string()
    }

    fn execute(&self, input: &ObservationSeries) -> GrapeResult<ObservationSeries> {
        let power = self.power_db(input)?;
        if let Some(floor) = self.floor_db {
            let clamped = power.iter().filter(|&&db| db == floor).count();
            if clamped > 0 {
                self.logger
                    .warn(&format!("{clamped} samples held at the {floor} dB floor"));
            }
        }
        let mut output = input.clone();
        output.insert_column(POWER_DB, power)?;
        Ok(output)
    }
}
