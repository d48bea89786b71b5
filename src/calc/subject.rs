use super::error::CalcError;
use super::model::{GradeRecord, NormalizedGrade, SubjectSummary};
use super::normalize::normalize;

pub(crate) fn check_coefficient(coefficient: f64, what: &str) -> Result<(), CalcError> {
    if !coefficient.is_finite() || coefficient < 0.0 {
        tracing::warn!(what, coefficient, "rejected coefficient");
        return Err(CalcError::invalid_input(format!(
            "{} coefficient must be a non-negative number",
            what
        ))
        .with_details(serde_json::json!({ "coefficient": coefficient })));
    }
    Ok(())
}

pub(crate) fn normalize_grade(g: &GradeRecord) -> Result<NormalizedGrade, CalcError> {
    check_coefficient(g.coefficient, "grade")?;
    Ok(NormalizedGrade {
        grade_id: g.id.clone(),
        value: normalize(g.value, g.max_value)?,
        raw_value: g.value,
        max_value: g.max_value,
        coefficient: g.coefficient,
        evaluation_type: g.evaluation_type.clone(),
        evaluation_date: g.evaluation_date,
    })
}

/// Weighted average and min/max of one subject slice for one student and
/// period. An empty slice yields an all-zero summary.
pub fn aggregate<'a, I>(subject_id: &str, grades: I) -> Result<SubjectSummary, CalcError>
where
    I: IntoIterator<Item = &'a GradeRecord>,
{
    let mut weighted_sum = 0.0_f64;
    let mut weighted_denom = 0.0_f64;
    let mut min_grade = f64::INFINITY;
    let mut max_grade = f64::NEG_INFINITY;
    let mut contributions: Vec<NormalizedGrade> = Vec::new();

    for g in grades {
        let n = normalize_grade(g)?;
        weighted_sum += n.value * n.coefficient;
        weighted_denom += n.coefficient;
        min_grade = min_grade.min(n.value);
        max_grade = max_grade.max(n.value);
        contributions.push(n);
    }

    if contributions.is_empty() {
        return Ok(SubjectSummary::empty(subject_id));
    }

    let average = if weighted_denom > 0.0 {
        weighted_sum / weighted_denom
    } else {
        0.0
    };

    // Stable sort: same-day grades keep their input order.
    contributions.sort_by(|a, b| b.evaluation_date.cmp(&a.evaluation_date));

    tracing::debug!(
        subject_id,
        grade_count = contributions.len(),
        average,
        "aggregated subject"
    );

    Ok(SubjectSummary {
        subject_id: subject_id.to_string(),
        average,
        grade_count: contributions.len(),
        min_grade,
        max_grade,
        grades: contributions,
    })
}
