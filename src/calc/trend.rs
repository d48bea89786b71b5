use chrono::NaiveDate;
use serde::Serialize;

use super::config::GradingScale;
use super::error::CalcError;
use super::model::{GradeRecord, SubjectSummary, Trend};
use super::normalize::normalize;
use super::stats::mean;

fn classify(diff: f64, threshold: f64) -> Trend {
    if diff > threshold {
        Trend::Up
    } else if diff < -threshold {
        Trend::Down
    } else {
        Trend::Stable
    }
}

fn trend_from_points(mut points: Vec<(NaiveDate, f64)>, threshold: f64) -> Trend {
    if points.len() < 2 {
        return Trend::None;
    }
    points.sort_by(|a, b| a.0.cmp(&b.0));
    let values: Vec<f64> = points.into_iter().map(|(_, v)| v).collect();
    let split = values.len().div_ceil(2);
    let (first, second) = values.split_at(split);
    classify(mean(second) - mean(first), threshold)
}

/// Compares the normalized mean of the earlier half of the grades with the
/// later half. With an odd count the earlier half takes the extra grade.
pub fn detect_trend<'a, I>(grades: I, scale: &GradingScale) -> Result<Trend, CalcError>
where
    I: IntoIterator<Item = &'a GradeRecord>,
{
    let points = grades
        .into_iter()
        .map(|g| -> Result<(NaiveDate, f64), CalcError> {
            Ok((g.evaluation_date, normalize(g.value, g.max_value)?))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(trend_from_points(points, scale.trend_threshold))
}

/// Same classification over grades that were already normalized into
/// subject summaries.
pub fn summaries_trend<'a, I>(summaries: I, scale: &GradingScale) -> Trend
where
    I: IntoIterator<Item = &'a SubjectSummary>,
{
    let points = summaries
        .into_iter()
        .flat_map(|s| s.grades.iter().map(|g| (g.evaluation_date, g.value)))
        .collect();
    trend_from_points(points, scale.trend_threshold)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progression {
    pub previous_average: Option<f64>,
    pub current_average: Option<f64>,
    pub delta: Option<f64>,
    pub trend: Trend,
}

/// Trimester-to-trimester movement of a general average. `None` on either
/// side means that trimester had nothing graded.
pub fn progression(
    previous_average: Option<f64>,
    current_average: Option<f64>,
    scale: &GradingScale,
) -> Progression {
    let (delta, trend) = match (previous_average, current_average) {
        (Some(prev), Some(curr)) => {
            let delta = curr - prev;
            (Some(delta), classify(delta, scale.progression_threshold))
        }
        _ => (None, Trend::None),
    };
    Progression {
        previous_average,
        current_average,
        delta,
        trend,
    }
}
