//! Rule-based infrastructure recommendations for a scored location

use serde::Serialize;
use site_planner::Priority;
use suitability_core::LocationScore;

/// Sub-score percentage below which a metric counts as weak
const WEAK_METRIC_PCT: u32 = 60;
const MIN_RECOMMENDATIONS: usize = 3;
const MAX_RECOMMENDATIONS: usize = 6;

#[derive(Debug, Clone, Serialize)]
pub struct Recommendations {
    pub recommendations: Vec<String>,
    pub priority: Priority,
    pub summary: String,
}

/// Names of metrics scoring under the weak threshold
pub fn weak_metrics(score: &LocationScore) -> Vec<&'static str> {
    let s = &score.scores;
    [
        (s.air_quality.score, "air quality"),
        (s.vegetation.score, "vegetation coverage"),
        (s.temperature.score, "temperature regulation"),
        (s.water.score, "water management"),
    ]
    .into_iter()
    .filter(|(pct, _)| *pct < WEAK_METRIC_PCT)
    .map(|(_, name)| name)
    .collect()
}

pub fn summarize(score: &LocationScore) -> String {
    let weak = weak_metrics(score);
    if weak.is_empty() {
        "This location shows good environmental conditions across all metrics.".to_string()
    } else {
        format!(
            "Primary concerns include {}, requiring targeted infrastructure improvements.",
            weak.join(" and ")
        )
    }
}

fn priority_for(overall_pct: u32) -> Priority {
    if overall_pct < 50 {
        Priority::High
    } else if overall_pct < 70 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

pub fn recommend(score: &LocationScore) -> Recommendations {
    let s = &score.scores;
    let mut recs: Vec<&str> = Vec::new();

    if s.air_quality.score < WEAK_METRIC_PCT {
        recs.push("Implement clean air zones and increase public transportation to reduce vehicle emissions");
        recs.push("Plant more trees and create green corridors to filter air pollutants");
    }

    if s.vegetation.score < WEAK_METRIC_PCT {
        recs.push("Develop urban parks and green spaces to increase vegetation coverage");
        recs.push("Implement green roof and vertical garden programs for buildings");
    }

    if s.temperature.score < WEAK_METRIC_PCT {
        if s.temperature.current > 25.0 {
            recs.push("Create urban cooling strategies: shade structures, water features, and reflective surfaces");
        } else {
            recs.push("Improve building insulation and energy-efficient heating systems");
        }
    }

    if s.water.score < WEAK_METRIC_PCT {
        if s.water.soil_moisture < 0.3 {
            recs.push("Develop rainwater harvesting systems and improve irrigation infrastructure");
        } else {
            recs.push("Improve drainage systems and implement sustainable urban drainage solutions");
        }
    }

    if s.urbanization.score < 40 {
        recs.push("Invest in basic infrastructure: roads, utilities, and public services");
    } else if s.urbanization.score > 90 {
        recs.push("Focus on smart city technologies and efficient space utilization");
    }

    if recs.len() < MIN_RECOMMENDATIONS {
        recs.push("Maintain current environmental standards with regular monitoring");
        recs.push("Plan for sustainable growth with green infrastructure integration");
    }

    recs.truncate(MAX_RECOMMENDATIONS);

    Recommendations {
        recommendations: recs.into_iter().map(str::to_string).collect(),
        priority: priority_for(score.overall.score),
        summary: summarize(score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use suitability_core::{score_readings, GeoPoint, MetricReadings, Sample};

    fn scored(readings: MetricReadings) -> LocationScore {
        score_readings(GeoPoint::new(0.0, 0.0), &readings).unwrap()
    }

    #[test]
    fn test_healthy_location_gets_general_advice() {
        let score = scored(MetricReadings::default());
        let recs = recommend(&score);
        // Only urbanization (50%) is middling, so general advice pads the list
        assert_eq!(recs.recommendations.len(), 2);
        assert!(recs.recommendations[0].starts_with("Maintain current"));
        assert_eq!(recs.priority, Priority::Low);
        assert_eq!(
            recs.summary,
            "This location shows good environmental conditions across all metrics."
        );
    }

    #[test]
    fn test_hot_dry_polluted_location() {
        let score = scored(MetricReadings {
            temperature_c: Sample::live(38.0),
            soil_moisture: Sample::live(0.05),
            ndvi: Sample::live(-0.2),
            aod: Sample::live(0.9),
            population_density: Sample::live(20_000.0),
        });
        let recs = recommend(&score);

        assert_eq!(recs.recommendations.len(), MAX_RECOMMENDATIONS);
        assert!(recs.recommendations[0].starts_with("Implement clean air zones"));
        assert!(recs
            .recommendations
            .iter()
            .any(|r| r.starts_with("Create urban cooling")));
        assert_eq!(recs.priority, Priority::High);
        assert_eq!(
            recs.summary,
            "Primary concerns include air quality and vegetation coverage and temperature regulation and water management, requiring targeted infrastructure improvements."
        );
    }

    #[test]
    fn test_waterlogged_cold_location() {
        let score = scored(MetricReadings {
            temperature_c: Sample::live(2.0),
            soil_moisture: Sample::live(0.9),
            ..MetricReadings::default()
        });
        let recs = recommend(&score);
        assert!(recs
            .recommendations
            .iter()
            .any(|r| r.starts_with("Improve building insulation")));
        assert!(recs
            .recommendations
            .iter()
            .any(|r| r.starts_with("Improve drainage systems")));
        assert_eq!(weak_metrics(&score), vec!["temperature regulation", "water management"]);
    }

    #[test]
    fn test_priority_thresholds() {
        assert_eq!(priority_for(49), Priority::High);
        assert_eq!(priority_for(50), Priority::Medium);
        assert_eq!(priority_for(69), Priority::Medium);
        assert_eq!(priority_for(70), Priority::Low);
    }

    proptest! {
        #[test]
        fn prop_recommendations_follow_score(
            temperature in -30.0f64..50.0,
            soil in 0.0f64..1.0,
            ndvi in -1.0f64..1.0,
            aod in 0.0f64..2.0,
            density in 0.0f64..50_000.0,
        ) {
            let score = scored(MetricReadings {
                temperature_c: Sample::live(temperature),
                soil_moisture: Sample::live(soil),
                ndvi: Sample::live(ndvi),
                aod: Sample::live(aod),
                population_density: Sample::live(density),
            });
            let recs = recommend(&score);

            prop_assert!(recs.recommendations.len() >= 2);
            prop_assert!(recs.recommendations.len() <= MAX_RECOMMENDATIONS);
            prop_assert_eq!(recs.priority, priority_for(score.overall.score));
            for metric in weak_metrics(&score) {
                prop_assert!(recs.summary.contains(metric));
            }
        }
    }
}
