use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::error::CalcError;
use super::model::{SubjectSummary, SubjectWeight};
use super::subject::check_coefficient;

/// General average together with the subjects and coefficients that
/// actually contributed to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralBreakdown {
    pub average: f64,
    pub total_coefficients: f64,
    pub contributing_subjects: Vec<String>,
}

/// Rejects a weight list that is negative, non-finite or names a subject
/// twice.
fn check_weights(weights: &[SubjectWeight]) -> Result<(), CalcError> {
    let mut seen = BTreeSet::new();
    for w in weights {
        check_coefficient(w.coefficient, "subject")?;
        if !seen.insert(w.subject_id.as_str()) {
            return Err(CalcError::invalid_input("duplicate subject weight")
                .with_details(serde_json::json!({ "subjectId": w.subject_id })));
        }
    }
    Ok(())
}

/// Subjects with a weight but no graded summary are left out of both the
/// numerator and the denominator; so are zero-weight subjects. Nothing
/// contributing yields an average of 0 with no contributing subjects.
pub fn general_breakdown(
    summaries: &BTreeMap<String, SubjectSummary>,
    weights: &[SubjectWeight],
) -> Result<GeneralBreakdown, CalcError> {
    check_weights(weights)?;

    let mut sum = 0.0_f64;
    let mut denom = 0.0_f64;
    let mut contributing_subjects = Vec::new();

    for w in weights {
        let Some(summary) = summaries.get(&w.subject_id) else {
            continue;
        };
        if !summary.is_graded() || w.coefficient <= 0.0 {
            continue;
        }
        sum += summary.average * w.coefficient;
        denom += w.coefficient;
        contributing_subjects.push(w.subject_id.clone());
    }

    let average = if denom > 0.0 { sum / denom } else { 0.0 };
    Ok(GeneralBreakdown {
        average,
        total_coefficients: denom,
        contributing_subjects,
    })
}
