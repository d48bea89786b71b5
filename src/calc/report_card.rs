use serde::Serialize;

use super::config::GradingScale;
use super::error::CalcError;
use super::general::GeneralBreakdown;
use super::model::{Mention, NormalizedGrade, Period, SubjectSummary, SubjectWeight, Trend};
use super::ranking::RankInfo;
use super::trend::summaries_trend;

pub fn mention(average: f64, scale: &GradingScale) -> Mention {
    let m = &scale.mentions;
    if average >= m.felicitations {
        Mention::Felicitations
    } else if average >= m.tres_bien {
        Mention::TresBien
    } else if average >= m.bien {
        Mention::Bien
    } else if average >= m.assez_bien {
        Mention::AssezBien
    } else if average >= m.passable {
        Mention::Passable
    } else {
        Mention::Insuffisant
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GradeLabel {
    #[serde(rename = "Excellent")]
    Excellent,
    #[serde(rename = "Très bien")]
    TresBien,
    #[serde(rename = "Bien")]
    Bien,
    #[serde(rename = "Assez bien")]
    AssezBien,
    #[serde(rename = "Passable")]
    Passable,
    #[serde(rename = "Insuffisant")]
    Insuffisant,
}

/// Label of a single normalized grade; same ladder as the mention, with the
/// top step called "Excellent".
pub fn grade_label(value: f64, scale: &GradingScale) -> GradeLabel {
    match mention(value, scale) {
        Mention::Felicitations => GradeLabel::Excellent,
        Mention::TresBien => GradeLabel::TresBien,
        Mention::Bien => GradeLabel::Bien,
        Mention::AssezBien => GradeLabel::AssezBien,
        Mention::Passable => GradeLabel::Passable,
        Mention::Insuffisant => GradeLabel::Insuffisant,
    }
}

pub fn teacher_comment(average: f64, scale: &GradingScale) -> &'static str {
    let c = &scale.comments;
    if average >= c.excellent {
        "Excellent travail. Félicitations !"
    } else if average >= c.very_good {
        "Très bon travail. Continuez ainsi."
    } else if average >= c.good {
        "Bon travail. Des efforts à poursuivre."
    } else if average >= c.fair {
        "Travail convenable mais peut mieux faire."
    } else if average >= c.weak {
        "Résultats insuffisants. Il faut se ressaisir."
    } else {
        "Résultats très insuffisants. Risque de redoublement."
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelledGrade {
    #[serde(flatten)]
    pub grade: NormalizedGrade,
    pub label: GradeLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectReportLine {
    pub subject_id: String,
    pub coefficient: Option<f64>,
    pub average: f64,
    pub grade_count: usize,
    pub min_grade: f64,
    pub max_grade: f64,
    pub mention: Option<Mention>,
    pub trend: Trend,
    pub recent_grades: Vec<LabelledGrade>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReportCard {
    pub student_id: String,
    pub period: Period,
    pub subjects: Vec<SubjectReportLine>,
    pub general_average: f64,
    pub total_coefficients: f64,
    pub rank: Option<usize>,
    pub total_students: Option<usize>,
    pub appreciation: Mention,
    pub comment: String,
    pub progression_trend: Trend,
}

/// Everything a report card is assembled from.
#[derive(Debug, Clone, Copy)]
pub struct ReportCardInput<'a> {
    pub student_id: &'a str,
    pub subjects: &'a [SubjectSummary],
    pub general: &'a GeneralBreakdown,
    pub weights: &'a [SubjectWeight],
    pub rank: Option<RankInfo>,
    pub period: &'a Period,
}

fn subject_line(
    summary: &SubjectSummary,
    weights: &[SubjectWeight],
    scale: &GradingScale,
) -> SubjectReportLine {
    let coefficient = weights
        .iter()
        .find(|w| w.subject_id == summary.subject_id)
        .map(|w| w.coefficient);
    SubjectReportLine {
        subject_id: summary.subject_id.clone(),
        coefficient,
        average: summary.average,
        grade_count: summary.grade_count,
        min_grade: summary.min_grade,
        max_grade: summary.max_grade,
        mention: summary
            .is_graded()
            .then(|| mention(summary.average, scale)),
        trend: summaries_trend([summary], scale),
        recent_grades: summary
            .grades
            .iter()
            .map(|g| LabelledGrade {
                grade: g.clone(),
                label: grade_label(g.value, scale),
            })
            .collect(),
    }
}

/// Fails with `incomplete_data` when nothing contributed to the general
/// average, either because nothing is graded or because only unweighted
/// subjects are: an empty card is not the same thing as a card full of zeros.
pub fn assemble(
    input: ReportCardInput<'_>,
    scale: &GradingScale,
) -> Result<StudentReportCard, CalcError> {
    if input.general.contributing_subjects.is_empty() {
        let graded = input.subjects.iter().any(SubjectSummary::is_graded);
        tracing::warn!(
            student_id = input.student_id,
            trimester = %input.period.trimester,
            graded,
            "no contributing grades for report card"
        );
        let message = if graded {
            "could not generate report: no weighted subject is graded for this period"
        } else {
            "could not generate report: no grades recorded for this period"
        };
        return Err(CalcError::incomplete_data(message).with_details(serde_json::json!({
            "studentId": input.student_id,
            "period": input.period,
        })));
    }

    let average = input.general.average;
    let appreciation = mention(average, scale);
    tracing::debug!(
        student_id = input.student_id,
        average,
        appreciation = appreciation.label(),
        "assembled report card"
    );
    Ok(StudentReportCard {
        student_id: input.student_id.to_string(),
        period: input.period.clone(),
        subjects: input
            .subjects
            .iter()
            .map(|s| subject_line(s, input.weights, scale))
            .collect(),
        general_average: average,
        total_coefficients: input.general.total_coefficients,
        rank: input.rank.map(|r| r.rank),
        total_students: input.rank.map(|r| r.total_students),
        appreciation,
        comment: teacher_comment(average, scale).to_string(),
        progression_trend: summaries_trend(input.subjects, scale),
    })
}
