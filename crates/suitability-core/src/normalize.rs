//! Raw measurement normalization
//!
//! Every transform maps a physical reading onto a [0, 1] suitability
//! sub-score where 1 is best:
//!
//! | Metric        | Input                  | Transform                          |
//! |---------------|------------------------|------------------------------------|
//! | Temperature   | °C                     | `max(0, 1 - |t - 20| / 15)`        |
//! | Air quality   | AOD (≥ 0)              | `clamp(1 - aod)`                   |
//! | Vegetation    | NDVI [-1, 1]           | `(ndvi + 1) / 2`                   |
//! | Water         | soil moisture [0, 1]   | stepped plateau, see below         |
//! | Urbanization  | people/km²             | `log10(d + 1) / log10(10001)`      |

use crate::{Result, ScoringError};

/// Optimal temperature in °C
pub const OPTIMAL_TEMPERATURE_C: f64 = 20.0;

/// Distance from the optimum at which the temperature score reaches 0
pub const TEMPERATURE_TOLERANCE_C: f64 = 15.0;

/// Population density at which the urbanization score saturates
pub const DENSITY_SATURATION: f64 = 10_000.0;

/// Temperature suitability, peaking at 20 °C and reaching 0 at ±15 °C.
pub fn normalize_temperature(celsius: f64) -> f64 {
    let distance = (celsius - OPTIMAL_TEMPERATURE_C).abs();
    (1.0 - distance / TEMPERATURE_TOLERANCE_C).max(0.0)
}

/// Air quality from aerosol optical depth. Lower AOD is cleaner air.
pub fn normalize_aod(aod: f64) -> f64 {
    (1.0 - aod).clamp(0.0, 1.0)
}

/// Linear remap of NDVI from [-1, 1] to [0, 1].
///
/// Callers pre-clamp out-of-range readings.
pub fn normalize_ndvi(ndvi: f64) -> f64 {
    (ndvi + 1.0) / 2.0
}

/// Water availability from volumetric soil moisture.
///
/// Stepped policy, breakpoints are exact:
/// - `m < 0.1` too dry, 0.2
/// - `0.1 <= m < 0.3` ramp, `0.5 + m`
/// - `0.3 <= m <= 0.6` optimal, 1.0
/// - `0.6 < m < 0.8` wet, 0.8
/// - `m >= 0.8` waterlogged, 0.5
pub fn normalize_soil_moisture(moisture: f64) -> f64 {
    if moisture < 0.1 {
        0.2
    } else if moisture < 0.3 {
        0.5 + moisture
    } else if moisture <= 0.6 {
        1.0
    } else if moisture < 0.8 {
        0.8
    } else {
        0.5
    }
}

/// Urbanization on a log scale, saturating around 10,000 people/km².
pub fn normalize_population_density(density: f64) -> f64 {
    if density <= 0.0 {
        return 0.0;
    }
    let log_density = (density + 1.0).log10();
    let log_max = (DENSITY_SATURATION + 1.0).log10();
    (log_density / log_max).min(1.0)
}

/// Weighted mean of `scores`.
///
/// Mismatched lengths are a programming error and fail fast. A zero total
/// weight yields 0.
pub fn weighted_average(scores: &[f64], weights: &[f64]) -> Result<f64> {
    if scores.len() != weights.len() {
        return Err(ScoringError::LengthMismatch {
            scores: scores.len(),
            weights: weights.len(),
        });
    }

    let total_weight: f64 = weights.iter().sum();
    if total_weight == 0.0 {
        return Ok(0.0);
    }

    let weighted_sum: f64 = scores.iter().zip(weights).map(|(s, w)| s * w).sum();
    Ok(weighted_sum / total_weight)
}

/// Standard score. A zero deviation carries no information and maps to 0.
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        return 0.0;
    }
    (value - mean) / std_dev
}

/// Min-max scaling to [0, 1]. A degenerate range maps to 0.5.
pub fn min_max_normalize(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return 0.5;
    }
    (value - min) / (max - min)
}

/// Min-max scaling expressed as a percentage.
pub fn percentage_scale(value: f64, min: f64, max: f64) -> f64 {
    min_max_normalize(value, min, max) * 100.0
}

/// Flip a normalized score for metrics where lower is better.
pub fn invert(normalized: f64) -> f64 {
    1.0 - normalized
}

/// Z-score every value against the population mean and deviation.
pub fn normalize_series(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    values.iter().map(|&v| z_score(v, mean, std_dev)).collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(2000))]

        #[test]
        fn fuzz_temperature_in_unit_range(t in -90.0f64..70.0) {
            let s = normalize_temperature(t);
            prop_assert!((0.0..=1.0).contains(&s));
        }

        #[test]
        fn fuzz_aod_monotonic(a in 0.0f64..5.0, b in 0.0f64..5.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(normalize_aod(lo) >= normalize_aod(hi));
        }

        #[test]
        fn fuzz_density_monotonic(a in 0.001f64..1e6, b in 0.001f64..1e6) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(normalize_population_density(lo) <= normalize_population_density(hi));
            prop_assert!(normalize_population_density(hi) <= 1.0);
        }

        #[test]
        fn fuzz_soil_moisture_in_unit_range(m in 0.0f64..=1.0) {
            let s = normalize_soil_moisture(m);
            prop_assert!((0.2..=1.0).contains(&s));
        }
    }
}
