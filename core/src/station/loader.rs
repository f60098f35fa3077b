use std::path::Path;

use rayon::prelude::*;

use crate::inventory::{FileInventory, FileRecord};
use crate::prelude::{GrapeError, GrapeResult};
use crate::station::series::{ObservationSeries, FREQ, VPK};
use crate::station::time::parse_timestamp;

/// Read one station file and express `Freq` as a deviation from `nominal_hz`.
///
/// Lines starting with `#` are comments. The first column holds the UTC
/// timestamp; every other column must be numeric. A file with no rows yields
/// an empty series.
pub fn read_observation_file(path: &Path, nominal_hz: f64) -> GrapeResult<ObservationSeries> {
    let csv_error = |source| GrapeError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let headers = reader.headers().map_err(csv_error)?.clone();
    if headers.is_empty() {
        return Ok(ObservationSeries::default());
    }
    let names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
    for required in [FREQ, VPK] {
        if !names.iter().any(|name| name == required) {
            return Err(GrapeError::MissingColumn {
                context: path.display().to_string(),
                column: required.to_string(),
            });
        }
    }

    let mut timestamps = Vec::new();
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(csv_error)?;
        let context = || format!("{} row {}", path.display(), row_no + 1);

        let raw_time = record.get(0).unwrap_or("");
        let instant = parse_timestamp(raw_time).ok_or_else(|| GrapeError::InvalidTimestamp {
            context: context(),
            value: raw_time.to_string(),
        })?;
        timestamps.push(instant);

        for (column, name) in names.iter().enumerate() {
            let cell = record.get(column + 1).unwrap_or("");
            let value = cell.parse::<f64>().map_err(|_| GrapeError::InvalidValue {
                context: context(),
                column: name.clone(),
                value: cell.to_string(),
            })?;
            values[column].push(value);
        }
    }

    let mut series = ObservationSeries::new(timestamps);
    for (name, mut column) in names.iter().zip(values) {
        if name == FREQ {
            column.iter_mut().for_each(|freq| *freq -= nominal_hz);
        }
        series.insert_column(name, column)?;
    }
    Ok(series)
}

/// Load every record in parallel, then merge and sort on the calling thread.
///
/// Returns the merged series and the number of files that held rows.
pub fn load_observations(
    inventory: &FileInventory,
    records: &[&FileRecord],
    nominal_hz: f64,
) -> GrapeResult<(ObservationSeries, usize)> {
    let parts = records
        .par_iter()
        .map(|record| {
            let path = inventory.path_of(record);
            let series = read_observation_file(&path, nominal_hz)?;
            inventory.metrics().record_loaded(series.len());
            log::debug!("loaded {} rows from {}", series.len(), record.filename);
            Ok(series)
        })
        .collect::<GrapeResult<Vec<_>>>()?;

    let parts: Vec<ObservationSeries> = parts.into_iter().filter(|part| !part.is_empty()).collect();
    let populated = parts.len();
    let mut merged = ObservationSeries::concat(parts);
    merged.sort_by_time();
    Ok((merged, populated))
}
