use std::path::Path;

use chrono::{DateTime, Duration, Utc};

use crate::prelude::{GrapeError, GrapeResult};
use crate::station::time::format_timestamp;

pub const UTC: &str = "UTC";
pub const FREQ: &str = "Freq";
pub const VPK: &str = "Vpk";
pub const POWER_DB: &str = "Power_dB";

/// Axis label for a known parameter; unknown parameters are labeled by name.
pub fn parameter_label(name: &str) -> &str {
    match name {
        FREQ => "Doppler Shift [Hz]",
        VPK => "Peak Voltage [V]",
        POWER_DB => "Received Power [dB]",
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Time-indexed table of numeric columns, all of the same length as the index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationSeries {
    timestamps: Vec<DateTime<Utc>>,
    columns: Vec<Column>,
}

impl ObservationSeries {
    pub fn new(timestamps: Vec<DateTime<Utc>>) -> Self {
        Self {
            timestamps,
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, name: &str, values: Vec<f64>) -> GrapeResult<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// Add a column, replacing any existing column with the same name.
    pub fn insert_column(&mut self, name: &str, values: Vec<f64>) -> GrapeResult<()> {
        if values.len() != self.timestamps.len() {
            return Err(GrapeError::InvalidSeries(format!(
                "column {name} has {} values for {} timestamps",
                values.len(),
                self.timestamps.len()
            )));
        }
        match self.columns.iter_mut().find(|column| column.name == name) {
            Some(column) => column.values = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.values.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.timestamps.first().copied()
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Stack series end to end. Column names are unioned in first-seen order and
    /// cells missing from a part are NaN.
    pub fn concat(parts: Vec<ObservationSeries>) -> Self {
        let mut names: Vec<String> = Vec::new();
        for part in &parts {
            for name in part.column_names() {
                if !names.iter().any(|known| known == name) {
                    names.push(name.to_string());
                }
            }
        }

        let total = parts.iter().map(ObservationSeries::len).sum();
        let mut timestamps = Vec::with_capacity(total);
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column {
                name,
                values: Vec::with_capacity(total),
            })
            .collect();

        for part in parts {
            for column in &mut columns {
                match part.column(&column.name) {
                    Some(values) => column.values.extend_from_slice(values),
                    None => column
                        .values
                        .extend(std::iter::repeat(f64::NAN).take(part.len())),
                }
            }
            timestamps.extend(part.timestamps);
        }

        Self {
            timestamps,
            columns,
        }
    }

    /// Stable sort of every row by timestamp.
    pub fn sort_by_time(&mut self) {
        let mut order: Vec<usize> = (0..self.timestamps.len()).collect();
        order.sort_by_key(|&row| self.timestamps[row]);
        if order.iter().enumerate().all(|(position, &row)| position == row) {
            return;
        }

        self.timestamps = order.iter().map(|&row| self.timestamps[row]).collect();
        for column in &mut self.columns {
            column.values = order.iter().map(|&row| column.values[row]).collect();
        }
    }

    /// Fails unless timestamps strictly increase.
    pub fn ensure_strictly_increasing(&self) -> GrapeResult<()> {
        if let Some(position) = self
            .timestamps
            .windows(2)
            .position(|pair| pair[1] <= pair[0])
        {
            let kind = if self.timestamps[position + 1] == self.timestamps[position] {
                "duplicate"
            } else {
                "decreasing"
            };
            return Err(GrapeError::InvalidSeries(format!(
                "{kind} timestamp {} at sample {} of the merged series",
                format_timestamp(self.timestamps[position + 1]),
                position + 1
            )));
        }
        Ok(())
    }

    /// The common spacing of a uniformly sampled series.
    pub fn sample_interval(&self) -> GrapeResult<Duration> {
        if self.timestamps.len() < 2 {
            return Err(GrapeError::InvalidSeries(format!(
                "{} sample(s) are too few to derive a sampling interval",
                self.timestamps.len()
            )));
        }
        let interval = self.timestamps[1] - self.timestamps[0];
        if interval <= Duration::zero() {
            return Err(GrapeError::InvalidSeries(
                "timestamps do not increase".to_string(),
            ));
        }
        if let Some(position) = self
            .timestamps
            .windows(2)
            .position(|pair| pair[1] - pair[0] != interval)
        {
            return Err(GrapeError::InvalidSeries(format!(
                "sample spacing changes at sample {}",
                position + 1
            )));
        }
        Ok(interval)
    }

    /// Write the series as CSV with a leading `UTC` column.
    pub fn write_csv(&self, path: &Path) -> GrapeResult<()> {
        let csv_error = |source| GrapeError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;

        let mut header = vec![UTC.to_string()];
        header.extend(self.column_names().map(str::to_string));
        writer.write_record(&header).map_err(csv_error)?;

        for (row, instant) in self.timestamps.iter().enumerate() {
            let mut record = Vec::with_capacity(self.columns.len() + 1);
            record.push(format_timestamp(*instant));
            record.extend(
                self.columns
                    .iter()
                    .map(|column| column.values[row].to_string()),
            );
            writer.write_record(&record).map_err(csv_error)?;
        }

        writer.flush().map_err(|source| GrapeError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
