mod alerts;
mod config;
mod error;
mod general;
mod model;
mod normalize;
mod ranking;
mod report_card;
mod stats;
mod subject;
mod trend;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rayon::prelude::*;
use serde::Serialize;

pub use alerts::generate_alerts;
pub use config::GradingScale;
pub use error::{CalcError, ErrorCode};
pub use general::general_breakdown;
pub use model::{GradeRecord, Period, StudentPerformance, SubjectSummary, SubjectWeight};
pub use normalize::normalize;
pub use ranking::rank;
pub use report_card::{assemble, mention, ReportCardInput, StudentReportCard};
pub use stats::{compare_classes, compute_statistics};
pub use subject::aggregate;
pub use trend::{detect_trend, progression};

/// Builds one student's performance from the grades of a single period.
/// Grades of other students are ignored. The result is unranked.
pub fn student_performance<'a, I>(
    student_id: &str,
    grades: I,
    weights: &[SubjectWeight],
    scale: &GradingScale,
) -> Result<StudentPerformance, CalcError>
where
    I: IntoIterator<Item = &'a GradeRecord>,
{
    let mine: Vec<&GradeRecord> = grades
        .into_iter()
        .filter(|g| g.student_id == student_id)
        .collect();

    let mut by_subject: BTreeMap<&str, Vec<&GradeRecord>> = BTreeMap::new();
    for g in mine.iter().copied() {
        by_subject.entry(g.subject_id.as_str()).or_default().push(g);
    }

    // Weighted subjects first, in weight order; then graded but unweighted
    // subjects by id.
    let mut order: Vec<&str> = Vec::new();
    for w in weights {
        if !order.contains(&w.subject_id.as_str()) {
            order.push(w.subject_id.as_str());
        }
    }
    for subject_id in by_subject.keys().copied() {
        if !order.contains(&subject_id) {
            order.push(subject_id);
        }
    }

    let mut subjects = Vec::with_capacity(order.len());
    for subject_id in order {
        let slice = by_subject.get(subject_id).map(Vec::as_slice).unwrap_or(&[]);
        subjects.push(aggregate(subject_id, slice.iter().copied())?);
    }

    let summaries: BTreeMap<String, SubjectSummary> = subjects
        .iter()
        .map(|s| (s.subject_id.clone(), s.clone()))
        .collect();
    let general = general_breakdown(&summaries, weights)?;
    let progression_trend = detect_trend(mine.iter().copied(), scale)?;

    Ok(StudentPerformance {
        student_id: student_id.to_string(),
        general_average: general.average,
        total_coefficients: general.total_coefficients,
        subjects,
        rank: None,
        total_students: 0,
        appreciation: mention(general.average, scale),
        progression_trend,
    })
}

/// Builds and ranks every student of a class. `roster` lists students in
/// display order; students that only appear in `grades` are appended by id.
pub fn class_performances(
    roster: &[String],
    grades: &[&GradeRecord],
    weights: &[SubjectWeight],
    scale: &GradingScale,
) -> Result<Vec<StudentPerformance>, CalcError> {
    let mut by_student: HashMap<&str, Vec<&GradeRecord>> = HashMap::new();
    for g in grades {
        by_student.entry(g.student_id.as_str()).or_default().push(*g);
    }

    let mut student_ids: Vec<&str> = Vec::new();
    for id in roster {
        if !student_ids.contains(&id.as_str()) {
            student_ids.push(id.as_str());
        }
    }
    let extra: BTreeSet<&str> = by_student
        .keys()
        .copied()
        .filter(|id| !student_ids.contains(id))
        .collect();
    student_ids.extend(extra);

    let performances = student_ids
        .par_iter()
        .map(|id| {
            let mine = by_student.get(id).map(Vec::as_slice).unwrap_or(&[]);
            student_performance(id, mine.iter().copied(), weights, scale)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rank(performances, scale))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCardEntry {
    pub student_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_card: Option<StudentReportCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CalcError>,
}

pub fn report_card_for(
    performance: &StudentPerformance,
    weights: &[SubjectWeight],
    period: &Period,
    scale: &GradingScale,
) -> Result<StudentReportCard, CalcError> {
    let summaries: BTreeMap<String, SubjectSummary> = performance
        .subjects
        .iter()
        .map(|s| (s.subject_id.clone(), s.clone()))
        .collect();
    let general = general_breakdown(&summaries, weights)?;
    assemble(
        ReportCardInput {
            student_id: &performance.student_id,
            subjects: &performance.subjects,
            general: &general,
            weights,
            rank: performance.rank_info(),
            period,
        },
        scale,
    )
}

/// Report cards for an already ranked class, in rank order. Students with
/// nothing graded get an `incomplete_data` entry instead of a card.
pub fn class_report_cards(
    ranked: &[StudentPerformance],
    weights: &[SubjectWeight],
    period: &Period,
    scale: &GradingScale,
) -> Vec<ReportCardEntry> {
    ranked
        .par_iter()
        .map(|p| match report_card_for(p, weights, period, scale) {
            Ok(card) => ReportCardEntry {
                student_id: p.student_id.clone(),
                report_card: Some(card),
                error: None,
            },
            Err(e) => ReportCardEntry {
                student_id: p.student_id.clone(),
                report_card: None,
                error: Some(e),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::model::Trend;
    use crate::calc::subject::tests::grade;

    fn g(student: &str, subject: &str, value: f64, coef: f64, day: u32) -> GradeRecord {
        GradeRecord {
            student_id: student.to_string(),
            ..grade(subject, value, 20.0, coef, day)
        }
    }

    fn weights() -> Vec<SubjectWeight> {
        vec![
            SubjectWeight {
                subject_id: "math".to_string(),
                coefficient: 3.0,
            },
            SubjectWeight {
                subject_id: "physics".to_string(),
                coefficient: 2.0,
            },
        ]
    }

    #[test]
    fn student_performance_excludes_ungraded_subjects() {
        let grades = vec![g("s1", "math", 14.0, 1.0, 1), g("s2", "math", 4.0, 1.0, 1)];
        let p = student_performance("s1", &grades, &weights(), &GradingScale::default())
            .expect("performance");
        assert_eq!(p.general_average, 14.0);
        assert_eq!(p.subjects.len(), 2);
        assert_eq!(p.subjects[0].subject_id, "math");
        assert_eq!(p.subjects[1].grade_count, 0);
        assert_eq!(p.rank, None);
        assert_eq!(p.progression_trend, Trend::None);
    }

    #[test]
    fn unweighted_subjects_follow_weighted_ones() {
        let grades = vec![g("s1", "art", 18.0, 1.0, 1), g("s1", "math", 10.0, 1.0, 1)];
        let p = student_performance("s1", &grades, &weights(), &GradingScale::default()).unwrap();
        let ids: Vec<&str> = p.subjects.iter().map(|s| s.subject_id.as_str()).collect();
        assert_eq!(ids, vec!["math", "physics", "art"]);
        assert_eq!(p.general_average, 10.0);
    }

    #[test]
    fn class_pipeline_ranks_roster_and_stragglers() {
        let grades = vec![
            g("s1", "math", 12.0, 1.0, 1),
            g("s2", "math", 16.0, 1.0, 1),
            g("s3", "math", 16.0, 1.0, 1),
        ];
        let refs: Vec<&GradeRecord> = grades.iter().collect();
        let roster = vec!["s2".to_string(), "s1".to_string(), "s0".to_string()];
        let ranked =
            class_performances(&roster, &refs, &weights(), &GradingScale::default()).unwrap();
        let view: Vec<(&str, Option<usize>)> = ranked
            .iter()
            .map(|p| (p.student_id.as_str(), p.rank))
            .collect();
        assert_eq!(
            view,
            vec![("s2", Some(1)), ("s3", Some(1)), ("s1", Some(3)), ("s0", Some(4))]
        );
        assert!(ranked.iter().all(|p| p.total_students == 4));
    }

    #[test]
    fn class_report_cards_flag_empty_students() {
        let grades = vec![g("s1", "math", 12.0, 1.0, 1), g("s1", "physics", 18.0, 1.0, 2)];
        let refs: Vec<&GradeRecord> = grades.iter().collect();
        let roster = vec!["s1".to_string(), "s9".to_string()];
        let scale = GradingScale::default();
        let ranked = class_performances(&roster, &refs, &weights(), &scale).unwrap();
        let period = Period::new("T1", "2024-2025");
        let cards = class_report_cards(&ranked, &weights(), &period, &scale);
        assert_eq!(cards.len(), 2);
        let first = cards[0].report_card.as_ref().expect("card for s1");
        assert!((first.general_average - 14.4).abs() < 1e-9);
        assert_eq!(first.total_coefficients, 5.0);
        assert_eq!(first.rank, Some(1));
        assert_eq!(cards[1].student_id, "s9");
        assert_eq!(
            cards[1].error.as_ref().map(|e| e.code),
            Some(ErrorCode::IncompleteData)
        );
    }

    #[test]
    fn unweighted_only_student_is_not_reported_as_failing() {
        let grades = vec![g("a", "math", 16.0, 1.0, 1), g("b", "art", 18.0, 1.0, 1)];
        let refs: Vec<&GradeRecord> = grades.iter().collect();
        let scale = GradingScale::default();
        let ranked = class_performances(&[], &refs, &weights(), &scale).unwrap();
        let b = ranked.iter().find(|p| p.student_id == "b").expect("b ranked");
        assert!(!b.has_contributing_grades());
        assert_eq!(b.total_coefficients, 0.0);

        let stats = compute_statistics(&ranked, &scale);
        assert_eq!(stats.graded_students, 1);
        assert_eq!(stats.average_general, 16.0);
        assert_eq!(stats.success_rate, 100.0);

        let alerts = generate_alerts(&ranked, &scale);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].student_id, "a");

        let period = Period::new("T1", "2024-2025");
        let cards = class_report_cards(&ranked, &weights(), &period, &scale);
        let entry = cards.iter().find(|c| c.student_id == "b").expect("b entry");
        assert!(entry.report_card.is_none());
        assert_eq!(entry.error.as_ref().map(|e| e.code), Some(ErrorCode::IncompleteData));
    }

    #[test]
    fn pipeline_is_idempotent() {
        let grades = vec![
            g("a", "math", 11.0, 2.0, 1),
            g("a", "physics", 13.5, 1.0, 3),
            g("b", "math", 11.0, 1.0, 2),
            g("c", "physics", 7.25, 1.0, 4),
        ];
        let refs: Vec<&GradeRecord> = grades.iter().collect();
        let scale = GradingScale::default();
        let first = class_performances(&[], &refs, &weights(), &scale).unwrap();
        let second = class_performances(&[], &refs, &weights(), &scale).unwrap();
        assert_eq!(first, second);
        let bits = |v: &[StudentPerformance]| -> Vec<u64> {
            v.iter().map(|p| p.general_average.to_bits()).collect()
        };
        assert_eq!(bits(first.as_slice()), bits(second.as_slice()));
    }
}
