use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use super::config::GradingScale;
use super::model::{ClassStatistics, StudentPerformance, SubjectStatistics};

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| compare_f64(*a, *b));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[(n / 2) - 1] + sorted[n / 2]) / 2.0
    }
}

/// Population standard deviation (divides by n).
pub(crate) fn standard_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Percentage of `values` at or above `mark`.
pub(crate) fn rate_at_or_above(values: &[f64], mark: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let hits = values.iter().filter(|v| **v >= mark).count();
    100.0 * hits as f64 / values.len() as f64
}

fn min_max(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        })
}

/// Class-wide statistics over students whose general average rests on at
/// least one weighted, graded subject. Others count in `total_students` only;
/// their graded subjects still feed the per-subject statistics.
pub fn compute_statistics(
    performances: &[StudentPerformance],
    scale: &GradingScale,
) -> ClassStatistics {
    let generals: Vec<f64> = performances
        .iter()
        .filter(|p| p.has_contributing_grades())
        .map(|p| p.general_average)
        .collect();

    let mut per_subject: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for p in performances {
        for s in p.subjects.iter().filter(|s| s.is_graded()) {
            per_subject
                .entry(s.subject_id.as_str())
                .or_default()
                .push(s.average);
        }
    }

    let subjects = per_subject
        .into_iter()
        .map(|(subject_id, averages)| {
            let (min_average, max_average) = min_max(&averages);
            SubjectStatistics {
                subject_id: subject_id.to_string(),
                student_count: averages.len(),
                average: mean(&averages),
                median: median(&averages),
                min_average,
                max_average,
                standard_deviation: standard_deviation(&averages),
                success_rate: rate_at_or_above(&averages, scale.pass_mark),
                excellence_rate: rate_at_or_above(&averages, scale.excellence_rate_mark),
            }
        })
        .collect();

    let (min_general, max_general) = min_max(&generals);
    let stats = ClassStatistics {
        total_students: performances.len(),
        graded_students: generals.len(),
        average_general: mean(&generals),
        median_general: median(&generals),
        min_general,
        max_general,
        standard_deviation: standard_deviation(&generals),
        success_rate: rate_at_or_above(&generals, scale.pass_mark),
        excellence_rate: rate_at_or_above(&generals, scale.excellence_rate_mark),
        subjects,
    };
    tracing::debug!(
        total = stats.total_students,
        graded = stats.graded_students,
        average = stats.average_general,
        "computed class statistics"
    );
    stats
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassComparison {
    pub class_id: String,
    pub stats: ClassStatistics,
}

/// One statistics block per class, in input order.
pub fn compare_classes<'a, I>(classes: I, scale: &GradingScale) -> Vec<ClassComparison>
where
    I: IntoIterator<Item = (&'a str, &'a [StudentPerformance])>,
{
    classes
        .into_iter()
        .map(|(class_id, performances)| ClassComparison {
            class_id: class_id.to_string(),
            stats: compute_statistics(performances, scale),
        })
        .collect()
}
