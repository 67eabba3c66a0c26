use proptest::prelude::*;
use sensor_insights::config::DetectorConfig;
use sensor_insights::pipeline::processing::aggregate::{group_by_sensor, overall_mean};
use sensor_insights::pipeline::processing::anomaly::detect;
use sensor_insights::pipeline::processing::FeatureDeriver;
use sensor_insights::types::{DerivedReading, NumericColumn, SensorReading};

const SENSORS: [&str; 3] = ["ECG", "BloodPressure", "PulseOximeter"];

fn reading(sensor: &str, data: Option<f64>, energy: Option<f64>, duration: Option<f64>, eff: Option<f64>) -> SensorReading {
    SensorReading {
        line: 2,
        timestamp: None,
        sensor_id: None,
        sensor_type: sensor.to_string(),
        layer: None,
        data_size_bytes: data,
        energy_consumption: energy,
        transmission_duration: duration,
        energy_efficiency_ratio: eff,
        transmission_efficiency_score: None,
    }
}

fn derived(values: &[(usize, f64, f64)]) -> Vec<DerivedReading> {
    let deriver = FeatureDeriver::new();
    values
        .iter()
        .enumerate()
        .filter_map(|(i, &(sensor, energy, eff))| {
            deriver
                .derive_one(&reading(
                    SENSORS[sensor],
                    Some(100.0 + i as f64 * 7.0),
                    Some(energy),
                    Some(2.0),
                    Some(eff),
                ))
                .ok()
        })
        .collect()
}

proptest! {
    #[test]
    fn derived_rows_are_always_finite(
        data in proptest::option::of(any::<f64>()),
        energy in proptest::option::of(any::<f64>()),
        duration in proptest::option::of(any::<f64>()),
        eff in proptest::option::of(any::<f64>()),
    ) {
        if let Ok(row) = FeatureDeriver::new().derive_one(&reading("ECG", data, energy, duration, eff)) {
            for column in NumericColumn::ALL {
                prop_assert!(row.value(column).is_finite(), "{} not finite", column);
            }
            prop_assert!(row.transmission_duration > 0.0);
            prop_assert!(row.energy_consumption > 0.0);
            prop_assert!(row.data_size_bytes >= 0.0);
        }
    }

    #[test]
    fn detection_labels_exactly_the_rounded_quota(
        values in prop::collection::vec((0..3usize, 1.0f64..100.0, 1000.0f64..2000.0), 2..60),
        contamination in 0.01f64..=0.5,
        seed in any::<u64>(),
    ) {
        let rows = derived(&values);
        let config = DetectorConfig {
            contamination,
            n_trees: 10,
            seed,
            ..DetectorConfig::default()
        };
        let detection = detect(&rows, &config).unwrap();
        prop_assert_eq!(detection.labels.len(), rows.len());
        let expected = (contamination * rows.len() as f64).round() as usize;
        prop_assert_eq!(detection.anomaly_count(), expected);
    }

    #[test]
    fn weighted_group_means_equal_overall_mean(
        values in prop::collection::vec((0..3usize, 1.0f64..100.0, 1.0f64..5000.0), 1..80),
    ) {
        let rows = derived(&values);
        let groups = group_by_sensor(&rows, None);
        prop_assert!(groups.iter().all(|g| g.count > 0));
        prop_assert_eq!(groups.iter().map(|g| g.count).sum::<usize>(), rows.len());

        let weighted = groups
            .iter()
            .map(|g| g.mean_efficiency_ratio * g.count as f64)
            .sum::<f64>()
            / rows.len() as f64;
        let overall = overall_mean(&rows, NumericColumn::EnergyEfficiencyRatio);
        prop_assert!((weighted - overall).abs() <= 1e-9 * overall.abs().max(1.0));
    }
}
