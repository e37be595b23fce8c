//! Aggregation of normalized sub-scores into a location score
//!
//! Weights are fixed and sum to 1.0. The overall [0, 1] score is reported
//! as an integer percentage together with a letter grade and a
//! qualitative suitability label.

use crate::normalize::{
    normalize_aod, normalize_ndvi, normalize_population_density, normalize_soil_moisture,
    normalize_temperature, weighted_average,
};
use crate::{round_to, GeoPoint, Result, Sample, SampleSource};
use serde::{Deserialize, Serialize};

/// Scoring weights (5-factor model). Sum = 1.0
pub const W_AIR_QUALITY: f64 = 0.25;
pub const W_VEGETATION: f64 = 0.20;
pub const W_TEMPERATURE: f64 = 0.20;
pub const W_WATER: f64 = 0.20;
pub const W_URBANIZATION: f64 = 0.15;

/// Defaults substituted when a source cannot supply a reading
pub const DEFAULT_TEMPERATURE_C: f64 = 20.0;
pub const DEFAULT_SOIL_MOISTURE: f64 = 0.3;
pub const DEFAULT_NDVI: f64 = 0.5;
pub const DEFAULT_AOD: f64 = 0.2;
pub const DEFAULT_POPULATION_DENSITY: f64 = 100.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricWeights {
    pub air_quality: f64,
    pub vegetation: f64,
    pub temperature: f64,
    pub water: f64,
    pub urbanization: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            air_quality: W_AIR_QUALITY,
            vegetation: W_VEGETATION,
            temperature: W_TEMPERATURE,
            water: W_WATER,
            urbanization: W_URBANIZATION,
        }
    }
}

impl MetricWeights {
    /// Weights in aggregation order: air, vegetation, temperature, water, urbanization
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.air_quality,
            self.vegetation,
            self.temperature,
            self.water,
            self.urbanization,
        ]
    }
}

/// The five raw readings for one location, defaults already applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricReadings {
    pub temperature_c: Sample,
    pub soil_moisture: Sample,
    pub ndvi: Sample,
    pub aod: Sample,
    pub population_density: Sample,
}

impl Default for MetricReadings {
    fn default() -> Self {
        Self::from_options(None, None, None, None, None)
    }
}

impl MetricReadings {
    /// Build readings from optional source results.
    ///
    /// Absent or non-finite values fall back to the documented defaults and
    /// are tagged [`SampleSource::Default`]. NDVI is clamped to [-1, 1].
    pub fn from_options(
        temperature_c: Option<Sample>,
        soil_moisture: Option<Sample>,
        ndvi: Option<Sample>,
        aod: Option<Sample>,
        population_density: Option<Sample>,
    ) -> Self {
        let ndvi = or_default(ndvi, DEFAULT_NDVI);
        Self {
            temperature_c: or_default(temperature_c, DEFAULT_TEMPERATURE_C),
            soil_moisture: or_default(soil_moisture, DEFAULT_SOIL_MOISTURE),
            ndvi: Sample {
                value: ndvi.value.clamp(-1.0, 1.0),
                source: ndvi.source,
            },
            aod: or_default(aod, DEFAULT_AOD),
            population_density: or_default(population_density, DEFAULT_POPULATION_DENSITY),
        }
    }
}

fn or_default(sample: Option<Sample>, default: f64) -> Sample {
    match sample {
        Some(s) if s.value.is_finite() => s,
        _ => Sample {
            value: default,
            source: SampleSource::Default,
        },
    }
}

/// Letter grade for an overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            Grade::APlus
        } else if score >= 0.8 {
            Grade::A
        } else if score >= 0.7 {
            Grade::BPlus
        } else if score >= 0.6 {
            Grade::B
        } else if score >= 0.5 {
            Grade::CPlus
        } else if score >= 0.4 {
            Grade::C
        } else if score >= 0.3 {
            Grade::D
        } else {
            Grade::F
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

/// Qualitative living-conditions label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Suitability {
    #[serde(rename = "Excellent living conditions")]
    Excellent,
    #[serde(rename = "Good living conditions")]
    Good,
    #[serde(rename = "Moderate living conditions")]
    Moderate,
    #[serde(rename = "Challenging living conditions")]
    Challenging,
    #[serde(rename = "Difficult living conditions")]
    Difficult,
}

impl Suitability {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Suitability::Excellent
        } else if score >= 0.6 {
            Suitability::Good
        } else if score >= 0.4 {
            Suitability::Moderate
        } else if score >= 0.2 {
            Suitability::Challenging
        } else {
            Suitability::Difficult
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Suitability::Excellent => "Excellent living conditions",
            Suitability::Good => "Good living conditions",
            Suitability::Moderate => "Moderate living conditions",
            Suitability::Challenging => "Challenging living conditions",
            Suitability::Difficult => "Difficult living conditions",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirQualityScore {
    /// Percentage (0-100)
    pub score: u32,
    pub normalized: f64,
    pub aod: f64,
    pub interpretation: String,
    pub source: SampleSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VegetationScore {
    pub score: u32,
    pub normalized: f64,
    pub ndvi: f64,
    pub interpretation: String,
    pub source: SampleSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureScore {
    pub score: u32,
    pub normalized: f64,
    /// Rounded to 0.1 °C
    pub current: f64,
    pub unit: String,
    pub interpretation: String,
    pub source: SampleSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterScore {
    pub score: u32,
    pub normalized: f64,
    /// Rounded to 0.01
    pub soil_moisture: f64,
    pub unit: String,
    pub interpretation: String,
    pub source: SampleSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrbanizationScore {
    pub score: u32,
    pub normalized: f64,
    /// Rounded to whole people/km²
    pub population_density: f64,
    pub unit: String,
    pub interpretation: String,
    pub source: SampleSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricScores {
    pub air_quality: AirQualityScore,
    pub vegetation: VegetationScore,
    pub temperature: TemperatureScore,
    pub water: WaterScore,
    pub urbanization: UrbanizationScore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallScore {
    /// Percentage (0-100)
    pub score: u32,
    pub normalized: f64,
    pub grade: Grade,
    pub suitability: Suitability,
}

/// Suitability score for one location, created fresh per request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationScore {
    pub location: GeoPoint,
    pub scores: MetricScores,
    pub overall: OverallScore,
    pub timestamp: String,
}

impl LocationScore {
    /// True when any reading fell back to a default or an estimate
    pub fn uses_fallback_data(&self) -> bool {
        [
            self.scores.air_quality.source,
            self.scores.vegetation.source,
            self.scores.temperature.source,
            self.scores.water.source,
            self.scores.urbanization.source,
        ]
        .iter()
        .any(|s| *s != SampleSource::Live)
    }
}

/// Score a location from readings that already carry their defaults
pub fn score_readings(location: GeoPoint, readings: &MetricReadings) -> Result<LocationScore> {
    let weights = MetricWeights::default();

    let temperature = readings.temperature_c.value;
    let soil_moisture = readings.soil_moisture.value;
    let ndvi = readings.ndvi.value;
    let aod = readings.aod.value;
    let density = readings.population_density.value;

    let temp_score = normalize_temperature(temperature);
    let water_score = normalize_soil_moisture(soil_moisture);
    let veg_score = normalize_ndvi(ndvi);
    let air_score = normalize_aod(aod);
    let urban_score = normalize_population_density(density);

    let overall = weighted_average(
        &[air_score, veg_score, temp_score, water_score, urban_score],
        &weights.as_array(),
    )?;

    Ok(LocationScore {
        location,
        scores: MetricScores {
            air_quality: AirQualityScore {
                score: to_percentage(air_score),
                normalized: air_score,
                aod,
                interpretation: interpret_air_quality(air_score).to_string(),
                source: readings.aod.source,
            },
            vegetation: VegetationScore {
                score: to_percentage(veg_score),
                normalized: veg_score,
                ndvi,
                interpretation: interpret_vegetation(ndvi).to_string(),
                source: readings.ndvi.source,
            },
            temperature: TemperatureScore {
                score: to_percentage(temp_score),
                normalized: temp_score,
                current: round_to(temperature, 1),
                unit: "°C".to_string(),
                interpretation: interpret_temperature(temp_score).to_string(),
                source: readings.temperature_c.source,
            },
            water: WaterScore {
                score: to_percentage(water_score),
                normalized: water_score,
                soil_moisture: round_to(soil_moisture, 2),
                unit: "volumetric".to_string(),
                interpretation: interpret_soil_moisture(soil_moisture).to_string(),
                source: readings.soil_moisture.source,
            },
            urbanization: UrbanizationScore {
                score: to_percentage(urban_score),
                normalized: urban_score,
                population_density: density.round(),
                unit: "people/km²".to_string(),
                interpretation: interpret_urbanization(urban_score).to_string(),
                source: readings.population_density.source,
            },
        },
        overall: OverallScore {
            score: to_percentage(overall),
            normalized: overall,
            grade: Grade::from_score(overall),
            suitability: Suitability::from_score(overall),
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// [0, 1] score to a 0-100 integer, rounding half up
pub fn to_percentage(score: f64) -> u32 {
    (score * 100.0).round().max(0.0) as u32
}

fn interpret_air_quality(score: f64) -> &'static str {
    if score >= 0.8 {
        "Excellent"
    } else if score >= 0.6 {
        "Good"
    } else if score >= 0.4 {
        "Moderate"
    } else if score >= 0.2 {
        "Poor"
    } else {
        "Very Poor"
    }
}

fn interpret_vegetation(ndvi: f64) -> &'static str {
    if ndvi < 0.0 {
        "Water"
    } else if ndvi < 0.2 {
        "Barren/Urban"
    } else if ndvi < 0.4 {
        "Sparse Vegetation"
    } else if ndvi < 0.6 {
        "Moderate Vegetation"
    } else {
        "Dense Vegetation"
    }
}

fn interpret_temperature(score: f64) -> &'static str {
    if score >= 0.8 {
        "Optimal"
    } else if score >= 0.5 {
        "Comfortable"
    } else if score > 0.0 {
        "Marginal"
    } else {
        "Extreme"
    }
}

fn interpret_soil_moisture(moisture: f64) -> &'static str {
    if moisture < 0.1 {
        "Too dry"
    } else if moisture < 0.3 {
        "Dry"
    } else if moisture <= 0.6 {
        "Optimal"
    } else if moisture < 0.8 {
        "Wet"
    } else {
        "Waterlogged"
    }
}

fn interpret_urbanization(score: f64) -> &'static str {
    if score < 0.25 {
        "Rural"
    } else if score < 0.5 {
        "Suburban"
    } else if score < 0.75 {
        "Urban"
    } else {
        "Dense urban"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nyc() -> GeoPoint {
        GeoPoint::new(40.7128, -74.006)
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = MetricWeights::default().as_array().iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "Weights should sum to 1.0, got {}", total);
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_score(0.95), Grade::APlus);
        assert_eq!(Grade::from_score(0.9), Grade::APlus);
        assert_eq!(Grade::from_score(0.85), Grade::A);
        assert_eq!(Grade::from_score(0.7), Grade::BPlus);
        assert_eq!(Grade::from_score(0.65), Grade::B);
        assert_eq!(Grade::from_score(0.55), Grade::CPlus);
        assert_eq!(Grade::from_score(0.4), Grade::C);
        assert_eq!(Grade::from_score(0.3), Grade::D);
        assert_eq!(Grade::from_score(0.29), Grade::F);
    }

    #[test]
    fn test_suitability_thresholds() {
        assert_eq!(Suitability::from_score(0.8), Suitability::Excellent);
        assert_eq!(Suitability::from_score(0.6), Suitability::Good);
        assert_eq!(Suitability::from_score(0.45), Suitability::Moderate);
        assert_eq!(Suitability::from_score(0.2), Suitability::Challenging);
        assert_eq!(Suitability::from_score(0.1), Suitability::Difficult);
    }

    #[test]
    fn test_extreme_sub_scores() {
        let weights = MetricWeights::default().as_array();

        let best = weighted_average(&[1.0; 5], &weights).unwrap();
        assert_eq!(to_percentage(best), 100);
        assert_eq!(Grade::from_score(best), Grade::APlus);
        assert_eq!(Suitability::from_score(best).label(), "Excellent living conditions");

        let worst = weighted_average(&[0.0; 5], &weights).unwrap();
        assert_eq!(to_percentage(worst), 0);
        assert_eq!(Grade::from_score(worst), Grade::F);
        assert_eq!(Suitability::from_score(worst).label(), "Difficult living conditions");
    }

    #[test]
    fn test_all_perfect_readings() {
        // AOD 0, NDVI 1, 20 °C, optimal moisture, saturated density
        let readings = MetricReadings::from_options(
            Some(Sample::live(20.0)),
            Some(Sample::live(0.45)),
            Some(Sample::live(1.0)),
            Some(Sample::live(0.0)),
            Some(Sample::live(10_000.0)),
        );
        let score = score_readings(nyc(), &readings).unwrap();
        assert_eq!(score.overall.score, 100);
        assert_eq!(score.overall.grade, Grade::APlus);
        assert_eq!(score.overall.suitability.label(), "Excellent living conditions");
        assert!(!score.uses_fallback_data());
    }

    #[test]
    fn test_all_worst_readings() {
        let readings = MetricReadings::from_options(
            Some(Sample::live(60.0)),
            Some(Sample::live(0.0)),
            Some(Sample::live(-1.0)),
            Some(Sample::live(2.0)),
            Some(Sample::live(0.0)),
        );
        let score = score_readings(nyc(), &readings).unwrap();
        // Dry soil still floors at 0.2, weighted 0.2 -> 4%
        assert_eq!(score.overall.score, 4);
        assert_eq!(score.overall.grade, Grade::F);
        assert_eq!(score.overall.suitability, Suitability::Difficult);
    }

    #[test]
    fn test_defaults_reference_score() {
        let score = score_readings(nyc(), &MetricReadings::default()).unwrap();

        assert_eq!(score.scores.air_quality.score, 80);
        assert_eq!(score.scores.vegetation.score, 75);
        assert_eq!(score.scores.temperature.score, 100);
        assert_eq!(score.scores.water.score, 100);
        assert_eq!(score.scores.urbanization.score, 50);

        let expected = 0.25 * 0.8 + 0.20 * 0.75 + 0.20 + 0.20
            + 0.15 * (101f64.log10() / 10_001f64.log10());
        assert!((score.overall.normalized - expected).abs() < 1e-12);
        assert_eq!(score.overall.score, 83);
        assert_eq!(score.overall.grade, Grade::A);
        assert_eq!(score.overall.suitability, Suitability::Excellent);
        assert_eq!(score.scores.temperature.source, SampleSource::Default);
        assert!(score.uses_fallback_data());
    }

    #[test]
    fn test_non_finite_and_out_of_range_inputs() {
        let readings = MetricReadings::from_options(
            Some(Sample::live(f64::NAN)),
            None,
            Some(Sample::estimated(1.8)),
            None,
            Some(Sample::live(f64::INFINITY)),
        );
        assert_eq!(readings.temperature_c.value, DEFAULT_TEMPERATURE_C);
        assert_eq!(readings.temperature_c.source, SampleSource::Default);
        assert_eq!(readings.ndvi.value, 1.0);
        assert_eq!(readings.ndvi.source, SampleSource::Estimated);
        assert_eq!(readings.population_density.value, DEFAULT_POPULATION_DENSITY);
    }

    #[test]
    fn test_zero_readings_are_data() {
        let readings = MetricReadings::from_options(
            None,
            Some(Sample::live(0.0)),
            None,
            None,
            Some(Sample::estimated(0.0)),
        );
        assert_eq!(readings.soil_moisture.value, 0.0);
        assert_eq!(readings.soil_moisture.source, SampleSource::Live);
        assert_eq!(readings.population_density.value, 0.0);
        assert_eq!(readings.population_density.source, SampleSource::Estimated);

        // Bone-dry soil scores 20%, not the 100% a defaulted 0.3 would give
        let score = score_readings(nyc(), &readings).unwrap();
        assert_eq!(score.scores.water.soil_moisture, 0.0);
        assert_eq!(score.scores.water.score, 20);
        assert_eq!(score.scores.water.source, SampleSource::Live);
        assert_eq!(score.scores.urbanization.population_density, 0.0);
    }

    #[test]
    fn test_display_rounding() {
        let readings = MetricReadings::from_options(
            Some(Sample::live(31.46)),
            Some(Sample::live(0.347)),
            None,
            None,
            Some(Sample::live(10_752.4)),
        );
        let score = score_readings(nyc(), &readings).unwrap();
        assert_eq!(score.scores.temperature.current, 31.5);
        assert_eq!(score.scores.water.soil_moisture, 0.35);
        assert_eq!(score.scores.urbanization.population_density, 10_752.0);
    }

    #[test]
    fn test_wire_shape() {
        let score = score_readings(nyc(), &MetricReadings::default()).unwrap();
        let json = serde_json::to_value(&score).unwrap();
        assert_eq!(json["overall"]["grade"], "A");
        assert_eq!(json["overall"]["suitability"], "Excellent living conditions");
        assert!(json["scores"]["airQuality"]["aod"].is_number());
        assert!(json["scores"]["water"]["soilMoisture"].is_number());
        assert!(json["scores"]["urbanization"]["populationDensity"].is_number());
        assert_eq!(json["scores"]["temperature"]["source"], "default");
    }
}
