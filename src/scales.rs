use serde::{Deserialize, Serialize};

use crate::data_types::AxisFormat;
use crate::utils::date_formatter::{determine_date_format, format_timestamp};

/// Upper bound on the number of ticks a scale produces.
pub const MAX_TICKS: usize = 1_000;

/// Maps a data domain onto a pixel range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ChartScale {
    Linear { domain: (f64, f64), range: (f32, f32) },
    Log { domain: (f64, f64), range: (f32, f32) },
}

fn widen_degenerate(min: f64, max: f64) -> (f64, f64) {
    if (max - min).abs() < f64::EPSILON {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    }
}

impl ChartScale {
    pub fn new_linear(domain: (f64, f64), range: (f32, f32)) -> Self {
        Self::Linear {
            domain: widen_degenerate(domain.0, domain.1),
            range,
        }
    }

    /// Log scales need a strictly positive domain; non-positive bounds are clamped.
    pub fn new_log(domain: (f64, f64), range: (f32, f32)) -> Self {
        let lo = domain.0.max(f64::MIN_POSITIVE);
        let hi = domain.1.max(lo * 10.0);
        Self::Log {
            domain: (lo, hi),
            range,
        }
    }

    pub fn map(&self, value: f64) -> f32 {
        let res = match *self {
            Self::Linear { domain, range } => {
                let t = (value - domain.0) / (domain.1 - domain.0);
                range.0 as f64 + t * (range.1 - range.0) as f64
            }
            Self::Log { domain, range } => {
                let t = (value.ln() - domain.0.ln()) / (domain.1.ln() - domain.0.ln());
                range.0 as f64 + t * (range.1 - range.0) as f64
            }
        } as f32;
        if res.is_nan() || res.is_infinite() {
            0.0
        } else {
            res
        }
    }

    pub fn invert(&self, pixel: f32) -> f64 {
        let (domain, range) = (self.domain(), self.range());
        let span = (range.1 - range.0) as f64;
        if span == 0.0 {
            return domain.0;
        }
        let t = (pixel - range.0) as f64 / span;
        match self {
            Self::Linear { .. } => domain.0 + t * (domain.1 - domain.0),
            Self::Log { .. } => (domain.0.ln() + t * (domain.1.ln() - domain.0.ln())).exp(),
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        match *self {
            Self::Linear { domain, .. } | Self::Log { domain, .. } => domain,
        }
    }

    pub fn range(&self) -> (f32, f32) {
        match *self {
            Self::Linear { range, .. } | Self::Log { range, .. } => range,
        }
    }

    pub fn update_domain(&mut self, min: f64, max: f64) {
        match self {
            Self::Linear { domain, .. } => *domain = widen_degenerate(min, max),
            Self::Log { range, .. } => *self = Self::new_log((min, max), *range),
        }
    }

    pub fn update_range(&mut self, min: f32, max: f32) {
        match self {
            Self::Linear { range, .. } | Self::Log { range, .. } => *range = (min, max),
        }
    }

    /// Roughly `count` round tick values inside the domain; `count` is capped at [`MAX_TICKS`].
    ///
    /// A domain whose bounds or span are not finite has no ticks.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (d_min, d_max) = self.domain();
        let (lo, hi) = (d_min.min(d_max), d_min.max(d_max));
        if !(hi - lo).is_finite() {
            return Vec::new();
        }
        match self {
            Self::Linear { .. } => {
                let step = nice_step(hi - lo, count.clamp(1, MAX_TICKS));
                let first = (lo / step).ceil() as i64;
                let last = (hi / step).floor() as i64;
                (first..=last).map(|i| i as f64 * step).collect()
            }
            Self::Log { .. } => {
                let first = (lo.log10() - 1e-9).ceil() as i32;
                let last = (hi.log10() + 1e-9).floor() as i32;
                (first..=last).map(|e| 10f64.powi(e)).collect()
            }
        }
    }

    pub fn format_tick(&self, value: f64, format: &AxisFormat) -> String {
        if let AxisFormat::Time(unit) = format {
            let (d_min, d_max) = self.domain();
            let span_sec = (d_max - d_min).abs() / unit.per_second();
            return format_timestamp(value, determine_date_format(span_sec), *unit);
        }

        if value.abs() < 0.001 && value.abs() > 0.0 {
            format!("{:.4}", value)
        } else if value.abs() > 1000.0 {
            format!("{:.0}", value)
        } else {
            format!("{:.2}", value)
        }
    }

    /// Returns (m, c) such that screen = value * m + c. Exact for linear scales only.
    pub fn get_linear_coeffs(&self) -> (f32, f32) {
        match *self {
            Self::Linear { domain, range } => {
                let m = (range.1 - range.0) as f64 / (domain.1 - domain.0);
                let c = range.0 as f64 - m * domain.0;
                (m as f32, c as f32)
            }
            Self::Log { .. } => (1.0, 0.0),
        }
    }
}

/// A 1/2/5 x 10^k step just above `range / count`.
fn nice_step(range: f64, count: usize) -> f64 {
    if range <= 0.0 || !range.is_finite() {
        return 1.0;
    }
    let ideal = range / count as f64;
    let base = 10.0f64.powf(ideal.log10().floor());
    let rel = ideal / base;
    let stable_rel = if rel <= 1.0 {
        1.0
    } else if rel <= 2.0 {
        2.0
    } else if rel <= 5.0 {
        5.0
    } else {
        10.0
    };
    base * stable_rel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_map_and_invert() {
        let scale = ChartScale::new_linear((0.0, 10.0), (0.0, 100.0));
        assert_eq!(scale.map(5.0), 50.0);
        assert!((scale.invert(25.0) - 2.5).abs() < 1e-9);
        assert_eq!(scale.get_linear_coeffs(), (10.0, 0.0));
    }

    #[test]
    fn degenerate_domain_is_widened() {
        let scale = ChartScale::new_linear((3.0, 3.0), (0.0, 10.0));
        assert_eq!(scale.domain(), (2.5, 3.5));
    }

    #[test]
    fn ticks_are_round() {
        let scale = ChartScale::new_linear((0.0, 100.0), (0.0, 500.0));
        assert_eq!(
            scale.ticks(5),
            vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]
        );
    }

    #[test]
    fn overflowing_domain_has_no_ticks() {
        let scale = ChartScale::new_linear((-1e308, 1e308), (0.0, 500.0));
        assert!(scale.ticks(10).is_empty());
        let scale = ChartScale::new_log((1.0, f64::INFINITY), (0.0, 500.0));
        assert!(scale.ticks(10).is_empty());
    }

    #[test]
    fn tick_count_is_capped() {
        let scale = ChartScale::new_linear((0.0, 1.0), (0.0, 500.0));
        let ticks = scale.ticks(usize::MAX);
        assert!(!ticks.is_empty());
        assert!(ticks.len() <= MAX_TICKS + 1);
    }

    #[test]
    fn log_ticks_are_decades() {
        let scale = ChartScale::new_log((1.0, 1000.0), (0.0, 300.0));
        assert_eq!(scale.ticks(5), vec![1.0, 10.0, 100.0, 1000.0]);
        assert!((scale.map(10.0) - 100.0).abs() < 1e-3);
    }
}
