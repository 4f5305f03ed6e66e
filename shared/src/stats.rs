//! Run-level aggregates over zone values

use std::collections::BTreeMap;

use crate::models::{AnalysisSummary, Category};

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 for an empty slice
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// std_dev / mean × 100; 0 when the mean is 0
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m == 0.0 {
        return 0.0;
    }
    std_dev(values) / m * 100.0
}

/// Aggregate zone areas, values and categories into a run summary
pub fn summarize(areas_ha: &[f64], values: &[f64], categories: &[Category]) -> AnalysisSummary {
    let mut category_counts = BTreeMap::new();
    for category in categories {
        *category_counts.entry(*category).or_insert(0) += 1;
    }

    AnalysisSummary {
        zone_count: values.len(),
        total_area_ha: areas_ha.iter().fold(0.0, |acc, a| acc + a),
        mean_value: mean(values),
        std_dev: std_dev(values),
        coefficient_of_variation: coefficient_of_variation(values),
        category_counts,
    }
}
