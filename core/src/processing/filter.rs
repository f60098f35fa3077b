use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use ndarray::{s, Array1, ArrayView1};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::math::fft::FftHelper;
use crate::math::poly::{poly_from_roots, product};
use crate::math::stats::StatsHelper;
use crate::prelude::{GrapeError, GrapeResult, ProcessingStage};
use crate::station::series::ObservationSeries;
use crate::station::time::duration_seconds;
use crate::telemetry::log::LogManager;

/// Butterworth response shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandType {
    #[default]
    Low,
    High,
    Bandpass,
    Bandstop,
}

impl BandType {
    pub fn is_two_sided(self) -> bool {
        matches!(self, BandType::Bandpass | BandType::Bandstop)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BandType::Low => "low",
            BandType::High => "high",
            BandType::Bandpass => "bandpass",
            BandType::Bandstop => "bandstop",
        }
    }
}

impl fmt::Display for BandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BandType {
    type Err = GrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "lowpass" => Ok(BandType::Low),
            "high" | "highpass" => Ok(BandType::High),
            "bandpass" | "band" => Ok(BandType::Bandpass),
            "bandstop" | "stop" => Ok(BandType::Bandstop),
            other => Err(GrapeError::InvalidFilterSpec(format!(
                "unknown band type {other:?}"
            ))),
        }
    }
}

/// Cutoff period(s) in minutes: one for low/high, a pair for band types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CutoffPeriods {
    Single(f64),
    Band([f64; 2]),
}

impl CutoffPeriods {
    pub fn minutes(&self) -> Vec<f64> {
        match self {
            CutoffPeriods::Single(tc) => vec![*tc],
            CutoffPeriods::Band(pair) => pair.to_vec(),
        }
    }
}

impl fmt::Display for CutoffPeriods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CutoffPeriods::Single(tc) => write!(f, "{tc}"),
            CutoffPeriods::Band([first, second]) => write!(f, "[{first}, {second}]"),
        }
    }
}

/// User-facing filter parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub order: usize,
    pub tc_min: CutoffPeriods,
    pub band: BandType,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            order: 6,
            tc_min: CutoffPeriods::Single(3.3333),
            band: BandType::Low,
        }
    }
}

impl FilterSpec {
    /// Checks that need no sampling rate.
    pub fn validate(&self) -> GrapeResult<()> {
        if self.order == 0 {
            return Err(GrapeError::InvalidFilterSpec(
                "filter order must be at least 1".to_string(),
            ));
        }
        let periods = self.tc_min.minutes();
        if let Some(bad) = periods.iter().find(|tc| !tc.is_finite() || **tc <= 0.0) {
            return Err(GrapeError::InvalidFilterSpec(format!(
                "cutoff period must be a positive number of minutes, got {bad}"
            )));
        }
        match (self.band.is_two_sided(), periods.len()) {
            (false, 1) => Ok(()),
            (true, 2) if periods[0] != periods[1] => Ok(()),
            (true, 2) => Err(GrapeError::InvalidFilterSpec(format!(
                "{} band edges must differ, got {} min twice",
                self.band, periods[0]
            ))),
            (two_sided, count) => Err(GrapeError::InvalidFilterSpec(format!(
                "{} filter takes {} cutoff period(s), got {count}",
                self.band,
                if two_sided { 2 } else { 1 }
            ))),
        }
    }

    /// Cutoff frequencies in Hz, ascending. Longer periods are lower frequencies.
    pub fn cutoff_hz(&self) -> Vec<f64> {
        let mut freqs: Vec<f64> = self
            .tc_min
            .minutes()
            .into_iter()
            .map(|tc| 1.0 / (tc * 60.0))
            .collect();
        freqs.sort_by(f64::total_cmp);
        freqs
    }

    pub fn label(&self) -> String {
        format!(
            "Butterworth Filtered Data (N={}, Tc={} min, Type: {})",
            self.order, self.tc_min, self.band
        )
    }
}

/// Zeros, poles and gain of a filter.
struct Zpk {
    zeros: Vec<Complex64>,
    poles: Vec<Complex64>,
    gain: f64,
}

impl Zpk {
    /// Analog lowpass prototype with unit cutoff.
    fn prototype(order: usize) -> Self {
        let n = order as f64;
        let poles = (0..order)
            .map(|k| {
                let m = -n + 1.0 + 2.0 * k as f64;
                -Complex64::from_polar(1.0, PI * m / (2.0 * n))
            })
            .collect();
        Self {
            zeros: Vec::new(),
            poles,
            gain: 1.0,
        }
    }

    fn degree(&self) -> usize {
        self.poles.len() - self.zeros.len()
    }

    /// `prod(-z) / prod(-p)`, the gain correction for reciprocal mappings.
    fn reciprocal_gain(&self) -> f64 {
        let num = product(self.zeros.iter().map(|&z| -z));
        let den = product(self.poles.iter().map(|&p| -p));
        (num / den).re
    }

    fn lowpass(self, wo: f64) -> Self {
        let degree = self.degree() as i32;
        Self {
            zeros: self.zeros.iter().map(|&z| z * wo).collect(),
            poles: self.poles.iter().map(|&p| p * wo).collect(),
            gain: self.gain * wo.powi(degree),
        }
    }

    fn highpass(self, wo: f64) -> Self {
        let degree = self.degree();
        let gain = self.gain * self.reciprocal_gain();
        let mut zeros: Vec<Complex64> = self.zeros.iter().map(|&z| wo / z).collect();
        zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));
        Self {
            zeros,
            poles: self.poles.iter().map(|&p| wo / p).collect(),
            gain,
        }
    }

    fn bandpass(self, wo: f64, bw: f64) -> Self {
        let degree = self.degree();
        let split = |roots: &[Complex64]| -> Vec<Complex64> {
            let scaled: Vec<Complex64> = roots.iter().map(|&r| r * (bw / 2.0)).collect();
            let shift: Vec<Complex64> = scaled.iter().map(|&r| (r * r - wo * wo).sqrt()).collect();
            scaled
                .iter()
                .zip(&shift)
                .map(|(&r, &d)| r + d)
                .chain(scaled.iter().zip(&shift).map(|(&r, &d)| r - d))
                .collect()
        };
        let mut zeros = split(&self.zeros);
        zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));
        Self {
            zeros,
            poles: split(&self.poles),
            gain: self.gain * bw.powi(degree as i32),
        }
    }

    fn bandstop(self, wo: f64, bw: f64) -> Self {
        let degree = self.degree();
        let gain = self.gain * self.reciprocal_gain();
        let split = |roots: &[Complex64]| -> Vec<Complex64> {
            let scaled: Vec<Complex64> = roots.iter().map(|&r| (bw / 2.0) / r).collect();
            let shift: Vec<Complex64> = scaled.iter().map(|&r| (r * r - wo * wo).sqrt()).collect();
            scaled
                .iter()
                .zip(&shift)
                .map(|(&r, &d)| r + d)
                .chain(scaled.iter().zip(&shift).map(|(&r, &d)| r - d))
                .collect()
        };
        let mut zeros = split(&self.zeros);
        zeros.extend(std::iter::repeat(Complex64::new(0.0, wo)).take(degree));
        zeros.extend(std::iter::repeat(Complex64::new(0.0, -wo)).take(degree));
        Self {
            zeros,
            poles: split(&self.poles),
            gain,
        }
    }

    /// Bilinear transform at a design rate of 2 (normalized frequencies).
    fn bilinear(self) -> Self {
        let fs2 = 4.0;
        let degree = self.degree();
        let num = product(self.zeros.iter().map(|&z| fs2 - z));
        let den = product(self.poles.iter().map(|&p| fs2 - p));
        let mut zeros: Vec<Complex64> = self.zeros.iter().map(|&z| (fs2 + z) / (fs2 - z)).collect();
        zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(degree));
        Self {
            zeros,
            poles: self.poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect(),
            gain: self.gain * (num / den).re,
        }
    }

    fn into_coefficients(self) -> (Vec<f64>, Vec<f64>) {
        let b = poly_from_roots(&self.zeros)
            .into_iter()
            .map(|c| c.re * self.gain)
            .collect();
        let a = poly_from_roots(&self.poles).into_iter().map(|c| c.re).collect();
        (b, a)
    }
}

/// One point of the complex frequency response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResponsePoint {
    pub frequency_hz: f64,
    pub gain_db: f64,
    pub phase_rad: f64,
}

/// A designed digital Butterworth filter, reusable for any series sampled at
/// the same rate.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    spec: FilterSpec,
    sampling_rate: f64,
    wn: Vec<f64>,
    b: Vec<f64>,
    a: Vec<f64>,
}

impl FilterState {
    /// Design the filter for `sampling_rate` samples per second.
    ///
    /// Every parameter is checked before any coefficient is computed.
    pub fn design(spec: &FilterSpec, sampling_rate: f64) -> GrapeResult<Self> {
        spec.validate()?;
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(GrapeError::InvalidFilterSpec(format!(
                "sampling rate must be positive, got {sampling_rate}"
            )));
        }

        let nyquist = sampling_rate / 2.0;
        let wn: Vec<f64> = spec.cutoff_hz().into_iter().map(|f| f / nyquist).collect();
        if let Some(too_high) = wn.iter().find(|w| **w >= 1.0) {
            return Err(GrapeError::InvalidFilterSpec(format!(
                "normalized cutoff {too_high} is at or above Nyquist ({nyquist} Hz)"
            )));
        }

        let warped: Vec<f64> = wn.iter().map(|w| 4.0 * (PI * w / 2.0).tan()).collect();
        let prototype = Zpk::prototype(spec.order);
        let analog = match spec.band {
            BandType::Low => prototype.lowpass(warped[0]),
            BandType::High => prototype.highpass(warped[0]),
            BandType::Bandpass => {
                prototype.bandpass((warped[0] * warped[1]).sqrt(), warped[1] - warped[0])
            }
            BandType::Bandstop => {
                prototype.bandstop((warped[0] * warped[1]).sqrt(), warped[1] - warped[0])
            }
        };
        let (b, a) = analog.bilinear().into_coefficients();

        Ok(Self {
            spec: spec.clone(),
            sampling_rate,
            wn,
            b,
            a,
        })
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Cutoffs normalized to Nyquist, ascending.
    pub fn wn(&self) -> &[f64] {
        &self.wn
    }

    pub fn b(&self) -> &[f64] {
        &self.b
    }

    pub fn a(&self) -> &[f64] {
        &self.a
    }

    pub fn apply(&self, data: &[f64]) -> Vec<f64> {
        self.filter_data(ArrayView1::from(data)).to_vec()
    }

    /// Forward-backward filtering with odd-reflection padding.
    ///
    /// Pads `3 * max(len(a), len(b))` samples on each side (at most `len - 1`)
    /// and starts both passes from the step-response steady state scaled to the
    /// first sample.
    pub fn filter_data(&self, data: ArrayView1<f64>) -> Array1<f64> {
        let len = data.len();
        if len == 0 {
            return Array1::zeros(0);
        }
        let taps = self.a.len().max(self.b.len());
        let pad = (3 * taps).min(len - 1);

        let first = data[0];
        let last = data[len - 1];
        let head = data.slice(s![1..=pad;-1]).mapv(|v| 2.0 * first - v);
        let tail = data
            .slice(s![len - 1 - pad..len - 1;-1])
            .mapv(|v| 2.0 * last - v);
        let extended: Array1<f64> = head
            .iter()
            .chain(data.iter())
            .chain(tail.iter())
            .copied()
            .collect();

        let zi = self.steady_state();
        let forward = self.lfilter(extended.view(), &zi, extended[0]);
        let backward_input = forward.slice(s![..;-1]);
        let backward = self.lfilter(backward_input, &zi, backward_input[0]);

        backward.slice(s![..;-1]).slice(s![pad..pad + len]).to_owned()
    }

    /// Coefficients padded to a common length and normalized by `a[0]`.
    fn normalized(&self) -> (Vec<f64>, Vec<f64>) {
        let taps = self.a.len().max(self.b.len());
        let a0 = self.a[0];
        let mut b: Vec<f64> = self.b.iter().map(|v| v / a0).collect();
        let mut a: Vec<f64> = self.a.iter().map(|v| v / a0).collect();
        b.resize(taps, 0.0);
        a.resize(taps, 0.0);
        (b, a)
    }

    /// Transposed direct-form II state after a unit step has settled.
    fn steady_state(&self) -> Vec<f64> {
        let (b, a) = self.normalized();
        let a_sum: f64 = a.iter().sum();
        if a_sum == 0.0 || !a_sum.is_finite() {
            return vec![0.0; b.len().saturating_sub(1)];
        }
        let dc = b.iter().sum::<f64>() / a_sum;

        let mut zi = vec![0.0; b.len().saturating_sub(1)];
        let mut acc = 0.0;
        for k in (1..b.len()).rev() {
            acc += b[k] - a[k] * dc;
            zi[k - 1] = acc;
        }
        zi
    }

    /// Single causal pass with initial state `zi * x0`, in the logical order of `input`.
    fn lfilter(&self, input: ArrayView1<f64>, zi: &[f64], x0: f64) -> Array1<f64> {
        let (b, a) = self.normalized();
        let order = b.len() - 1;
        let mut state: Vec<f64> = zi.iter().map(|&z| z * x0).collect();

        input
            .iter()
            .map(|&x| {
                if order == 0 {
                    return b[0] * x;
                }
                let y = b[0] * x + state[0];
                for k in 1..order {
                    state[k - 1] = b[k] * x + state[k] - a[k] * y;
                }
                state[order - 1] = b[order] * x - a[order] * y;
                y
            })
            .collect()
    }

    /// Response on `points` evenly spaced frequencies in `[0, fs/2)`.
    pub fn frequency_response(&self, points: usize) -> Vec<ResponsePoint> {
        let points = points.max(self.a.len().max(self.b.len()));
        let fft = FftHelper::new(2 * points);
        let num = fft.forward(&self.b);
        let den = fft.forward(&self.a);

        (0..points)
            .map(|k| {
                let h = num[k] / den[k];
                ResponsePoint {
                    frequency_hz: k as f64 * self.sampling_rate / fft.size() as f64,
                    gain_db: 20.0 * h.norm().log10(),
                    phase_rad: h.arg(),
                }
            })
            .collect()
    }
}

/// Filters selected columns of a uniformly sampled series.
pub struct FilterStage {
    spec: FilterSpec,
    params: Vec<String>,
    logger: LogManager,
}

impl FilterStage {
    pub fn new(spec: FilterSpec, params: Vec<String>) -> GrapeResult<Self> {
        spec.validate()?;
        Ok(Self {
            spec,
            params,
            logger: LogManager::new("filter"),
        })
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }
}

impl ProcessingStage for FilterStage {
    fn label(&self) -> String {
        self.spec.label()
    }

    fn execute(&self, input: &ObservationSeries) -> GrapeResult<ObservationSeries> {
        let interval = input.sample_interval()?;
        let sampling_rate = 1.0 / duration_seconds(interval);
        let state = FilterState::design(&self.spec, sampling_rate)?;

        let mut output = input.clone();
        for param in &self.params {
            let values = input.column(param).ok_or_else(|| GrapeError::MissingColumn {
                context: "resampled series".to_string(),
                column: param.clone(),
            })?;
            let filtered = state.apply(values);
            self.logger.record(&format!(
                "{param}: rms {:.4} -> {:.4}",
                StatsHelper::rms(values),
                StatsHelper::rms(&filtered)
            ));
            output.insert_column(param, filtered)?;
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Period in minutes whose cutoff is `fraction` of Nyquist at 1 sample/s.
    fn tc_for(fraction: f64) -> f64 {
        1.0 / (60.0 * fraction * 0.5)
    }

    fn lowpass(order: usize, fraction: f64) -> FilterSpec {
        FilterSpec {
            order,
            tc_min: CutoffPeriods::Single(tc_for(fraction)),
            band: BandType::Low,
        }
    }

    fn close(a: &[f64], b: &[f64], tol: f64) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < tol)
    }

    #[test]
    fn first_order_lowpass_matches_closed_form() {
        let state = FilterState::design(&lowpass(1, 0.5), 1.0).unwrap();
        let t = (PI / 4.0).tan();
        let b = [t / (1.0 + t), t / (1.0 + t)];
        let a = [1.0, (t - 1.0) / (1.0 + t)];
        assert!(close(state.b(), &b, 1e-12));
        assert!(close(state.a(), &a, 1e-12));
    }

    #[test]
    fn second_order_lowpass_at_half_nyquist() {
        let state = FilterState::design(&lowpass(2, 0.5), 1.0).unwrap();
        let b0 = 1.0 / (2.0 + 2f64.sqrt());
        let a2 = (2.0 - 2f64.sqrt()) / (2.0 + 2f64.sqrt());
        assert!(close(state.b(), &[b0, 2.0 * b0, b0], 1e-12));
        assert!(close(state.a(), &[1.0, 0.0, a2], 1e-12));
    }

    #[test]
    fn band_designs_double_the_order() {
        let spec = FilterSpec {
            order: 3,
            tc_min: CutoffPeriods::Band([tc_for(0.1), tc_for(0.3)]),
            band: BandType::Bandpass,
        };
        let state = FilterState::design(&spec, 1.0).unwrap();
        assert_eq!(state.a().len(), 7);
        assert_eq!(state.b().len(), 7);

        let stop = FilterState::design(
            &FilterSpec {
                band: BandType::Bandstop,
                ..spec
            },
            1.0,
        )
        .unwrap();
        assert_eq!(stop.a().len(), 7);
    }

    #[test]
    fn band_edges_sort_regardless_of_period_order() {
        let short_first = FilterSpec {
            order: 2,
            tc_min: CutoffPeriods::Band([5.0, 30.0]),
            band: BandType::Bandpass,
        };
        let long_first = FilterSpec {
            tc_min: CutoffPeriods::Band([30.0, 5.0]),
            ..short_first.clone()
        };
        let a = FilterState::design(&short_first, 1.0).unwrap();
        let b = FilterState::design(&long_first, 1.0).unwrap();
        assert!(a.wn()[0] < a.wn()[1]);
        assert_eq!(a.wn(), b.wn());
        assert!((a.wn()[0] - 2.0 / (30.0 * 60.0)).abs() < 1e-15);
        assert_eq!(a.b(), b.b());
    }

    #[test]
    fn rejects_invalid_specs_before_design() {
        let zero_order = FilterSpec {
            order: 0,
            ..FilterSpec::default()
        };
        let negative = FilterSpec {
            tc_min: CutoffPeriods::Single(-1.0),
            ..FilterSpec::default()
        };
        let zero_period = FilterSpec {
            tc_min: CutoffPeriods::Single(0.0),
            ..FilterSpec::default()
        };
        let wrong_arity = FilterSpec {
            band: BandType::Bandpass,
            ..FilterSpec::default()
        };
        for spec in [zero_order, negative, zero_period, wrong_arity] {
            assert!(matches!(
                FilterState::design(&spec, 1.0),
                Err(GrapeError::InvalidFilterSpec(_))
            ));
        }
    }

    #[test]
    fn rejects_cutoff_at_or_above_nyquist() {
        let at_nyquist = lowpass(4, 1.0);
        assert!(matches!(
            FilterState::design(&at_nyquist, 1.0),
            Err(GrapeError::InvalidFilterSpec(_))
        ));
        // 3.3333 min is fine at 1 Hz but not at one sample per ten minutes.
        assert!(FilterState::design(&FilterSpec::default(), 1.0 / 600.0).is_err());
    }

    #[test]
    fn preserves_length() {
        let state = FilterState::design(&lowpass(4, 0.2), 1.0).unwrap();
        for len in [1, 2, 5, 30, 200] {
            let data: Vec<f64> = (0..len).map(|i| (i as f64).cos()).collect();
            assert_eq!(state.apply(&data).len(), len);
        }
        assert!(state.apply(&[]).is_empty());
    }

    #[test]
    fn constant_input_passes_without_edge_artifacts() {
        let state = FilterState::design(&lowpass(4, 0.2), 1.0).unwrap();
        let data = vec![3.5; 120];
        let filtered = state.apply(&data);
        assert!(filtered.iter().all(|v| (v - 3.5).abs() < 1e-9));
    }

    #[test]
    fn highpass_removes_offset() {
        let spec = FilterSpec {
            order: 2,
            tc_min: CutoffPeriods::Single(tc_for(0.2)),
            band: BandType::High,
        };
        let state = FilterState::design(&spec, 1.0).unwrap();
        let filtered = state.apply(&vec![2.0; 80]);
        assert!(filtered.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn zero_phase_commutes_with_time_reversal() {
        let state = FilterState::design(&lowpass(2, 0.4), 1.0).unwrap();
        let data: Vec<f64> = (0..400)
            .map(|i| {
                let t = i as f64;
                1.0 + (t / 25.0).sin() + 0.3 * (t * 1.7).cos()
            })
            .collect();

        let direct = state.apply(&data);
        let reversed: Vec<f64> = data.iter().rev().copied().collect();
        let mut round_trip = state.apply(&reversed);
        round_trip.reverse();

        assert!(close(&direct[50..350], &round_trip[50..350], 1e-9));
    }

    #[test]
    fn zero_phase_keeps_slow_peaks_in_place() {
        let state = FilterState::design(&lowpass(4, 0.1), 1.0).unwrap();
        let data: Vec<f64> = (0..600)
            .map(|i| (2.0 * PI * i as f64 / 200.0).sin() + 0.2 * (i as f64 * 2.9).sin())
            .collect();
        let filtered = state.apply(&data);
        let peak = (200..300)
            .max_by(|&i, &j| filtered[i].total_cmp(&filtered[j]))
            .unwrap();
        assert!((peak as i64 - 250).abs() <= 1);
    }

    #[test]
    fn response_is_three_db_down_at_cutoff() {
        let state = FilterState::design(&lowpass(6, 0.25), 1.0).unwrap();
        let response = state.frequency_response(16);
        assert!(response[0].gain_db.abs() < 1e-6);
        let cutoff = response
            .iter()
            .find(|point| (point.frequency_hz - 0.125).abs() < 1e-12)
            .unwrap();
        assert!((cutoff.gain_db + 10.0 * 2f64.log10()).abs() < 1e-6);
    }

    #[test]
    fn filter_stage_filters_selected_columns() {
        use crate::station::series::{FREQ, VPK};
        use chrono::{Duration, TimeZone, Utc};

        let origin = Utc.with_ymd_and_hms(2021, 10, 25, 0, 0, 0).unwrap();
        let times: Vec<_> = (0..64).map(|s| origin + Duration::seconds(s)).collect();
        let noisy: Vec<f64> = (0..64).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let series = ObservationSeries::new(times)
            .with_column(FREQ, noisy.clone())
            .unwrap()
            .with_column(VPK, vec![1.0; 64])
            .unwrap();

        let stage = FilterStage::new(lowpass(4, 0.2), vec![FREQ.to_string()]).unwrap();
        let output = stage.execute(&series).unwrap();
        let freq = output.column(FREQ).unwrap();
        assert!(freq[10..54].iter().all(|v| v.abs() < 0.1));
        assert_eq!(output.column(VPK).unwrap(), series.column(VPK).unwrap());

        let missing = FilterStage::new(lowpass(4, 0.2), vec!["SNR".to_string()]).unwrap();
        assert!(matches!(
            missing.execute(&series),
            Err(GrapeError::MissingColumn { .. })
        ));
    }

    #[test]
    fn filter_data_matches_apply_on_borrowed_and_reversed_views() {
        let state = FilterState::design(&lowpass(3, 0.3), 1.0).unwrap();
        let signal: Vec<f64> = (0..80).map(|i| (i as f64 * 0.17).sin() + 0.01 * i as f64).collect();

        let owned = Array1::from(signal.clone());
        let from_view = state.filter_data(owned.slice(s![10..70]));
        assert!(close(&from_view.to_vec(), &state.apply(&signal[10..70]), 1e-12));

        let reversed_view = owned.slice(s![..;-1]);
        let reversed_signal: Vec<f64> = signal.iter().rev().copied().collect();
        let from_reversed = state.filter_data(reversed_view);
        assert!(close(&from_reversed.to_vec(), &state.apply(&reversed_signal), 1e-12));
    }

    #[test]
    fn labels_and_parses_band_types() {
        assert_eq!(
            FilterSpec::default().label(),
            "Butterworth Filtered Data (N=6, Tc=3.3333 min, Type: low)"
        );
        assert_eq!("bandstop".parse::<BandType>().unwrap(), BandType::Bandstop);
        assert!("notch".parse::<BandType>().is_err());
    }
}
