use std::f64::consts::PI;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, ensure, Context};
use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use grapecore::fs::ensure_dir;
use grapecore::inventory::FrequencyTable;
use grapecore::station::time::duration_from_seconds;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::generator::template::{station_filename, station_header};

/// Configuration for generating synthetic Grape1 station files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub node: u32,
    pub grid_square: String,
    pub frequency_label: String,
    pub suffix: String,
    pub start: DateTime<Utc>,
    pub days: u32,
    /// Logged seconds per daily file, starting at midnight of that day.
    pub span_seconds: u32,
    pub cadence_seconds: f64,
    /// Upper bound of the random delay added to each row, in seconds.
    pub jitter_seconds: f64,
    pub doppler_amplitude_hz: f64,
    pub doppler_period_minutes: f64,
    pub noise_hz: f64,
    pub vpk_mean: f64,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            node: 1,
            grid_square: "EN91fh".to_string(),
            frequency_label: "WWV10".to_string(),
            suffix: ".csv".to_string(),
            start: Utc.with_ymd_and_hms(2021, 10, 25, 0, 0, 0).single().unwrap_or_default(),
            days: 1,
            span_seconds: 86_400,
            cadence_seconds: 1.0,
            jitter_seconds: 0.2,
            doppler_amplitude_hz: 0.5,
            doppler_period_minutes: 30.0,
            noise_hz: 0.02,
            vpk_mean: 0.3,
            seed: 0,
        }
    }
}

impl GeneratorConfig {
    fn validate(&self) -> anyhow::Result<Duration> {
        let cadence = duration_from_seconds(self.cadence_seconds)
            .ok_or_else(|| anyhow!("cadence must be positive, got {}", self.cadence_seconds))?;
        ensure!(
            self.jitter_seconds >= 0.0 && self.jitter_seconds < self.cadence_seconds,
            "jitter {} s must be below the cadence {} s",
            self.jitter_seconds,
            self.cadence_seconds
        );
        ensure!(self.doppler_period_minutes > 0.0, "doppler period must be positive");
        ensure!(self.vpk_mean > 0.0, "mean peak voltage must be positive");
        Ok(cadence)
    }
}

fn build_day(
    config: &GeneratorConfig,
    cadence: Duration,
    day_start: DateTime<Utc>,
    nominal_hz: f64,
    rng: &mut StdRng,
) -> anyhow::Result<String> {
    let rows = (f64::from(config.span_seconds) / config.cadence_seconds).floor() as i64;
    let mut body = station_header(
        config.node,
        &config.grid_square,
        &config.frequency_label,
        nominal_hz,
    );

    for row in 0..rows {
        let jitter = if config.jitter_seconds > 0.0 {
            rng.gen_range(0.0..config.jitter_seconds)
        } else {
            0.0
        };
        let offset = cadence * row as i32 + Duration::microseconds((jitter * 1e6) as i64);
        let instant = day_start + offset;

        let minutes = (row as f64 * config.cadence_seconds) / 60.0;
        let phase = 2.0 * PI * minutes / config.doppler_period_minutes;
        let doppler = config.doppler_amplitude_hz * phase.sin()
            + rng.gen_range(-1.0..=1.0) * config.noise_hz;
        let fading = 1.0 + 0.3 * (phase * 0.5).cos();
        let vpk = (config.vpk_mean * fading * rng.gen_range(0.9..1.1)).max(1e-6);

        writeln!(
            body,
            "{},{:.3},{:.6}",
            instant.to_rfc3339_opts(SecondsFormat::Micros, true),
            nominal_hz + doppler,
            vpk
        )
        .context("formatting generated row")?;
    }
    Ok(body)
}

/// Write one file per day into `directory` and return their paths.
pub fn write_station_files(config: &GeneratorConfig, directory: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let cadence = config.validate()?;
    let nominal_hz = FrequencyTable::default()
        .resolve(&config.frequency_label)
        .ok_or_else(|| anyhow!("unknown frequency label {:?}", config.frequency_label))?;
    ensure_dir(directory, false)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut written = Vec::with_capacity(config.days as usize);
    for day in 0..config.days {
        let day_start = config.start + Duration::days(i64::from(day));
        let body = build_day(config, cadence, day_start, nominal_hz, &mut rng)?;
        let name = station_filename(
            day_start,
            config.node,
            &config.grid_square,
            &config.frequency_label,
            &config.suffix,
        );
        let path = directory.join(name);
        fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        log::debug!("generated {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grapecore::station::loader::read_observation_file;
    use grapecore::station::series::FREQ;

    fn short_config(seed: u64) -> GeneratorConfig {
        GeneratorConfig {
            node: 7,
            days: 2,
            span_seconds: 300,
            seed,
            ..Default::default()
        }
    }

    #[test]
    fn generator_writes_one_parseable_file_per_day() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_station_files(&short_config(3), dir.path()).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[1]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("2021-10-26T000000Z_N0000007"));

        let series = read_observation_file(&paths[0], 10e6).unwrap();
        assert_eq!(series.len(), 300);
        series.ensure_strictly_increasing().unwrap();
        let max_doppler = series
            .column(FREQ)
            .unwrap()
            .iter()
            .fold(0.0f64, |max, v| max.max(v.abs()));
        assert!(max_doppler < 0.6);
    }

    #[test]
    fn generator_is_deterministic_per_seed() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let a = write_station_files(&short_config(11), first.path()).unwrap();
        let b = write_station_files(&short_config(11), second.path()).unwrap();
        assert_eq!(
            fs::read_to_string(&a[0]).unwrap(),
            fs::read_to_string(&b[0]).unwrap()
        );
    }

    #[test]
    fn generator_rejects_jitter_beyond_cadence() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            jitter_seconds: 1.5,
            ..short_config(0)
        };
        assert!(write_station_files(&config, dir.path()).is_err());
    }
}
