use std::collections::BTreeMap;

use crate::calc::{self, SubjectSummary};
use crate::ipc::error::{calc_err, ok};
use crate::ipc::helpers::{self, required_f64, required_str, to_json};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_normalize(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let value = match required_f64(req, "value") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let max_value = match required_f64(req, "maxValue") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match calc::normalize(value, max_value) {
        Ok(normalized) => ok(&req.id, json!({ "normalized": normalized })),
        Err(e) => calc_err(&req.id, e),
    }
}

fn handle_subject_summary(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let grades = match helpers::grades(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let period = match helpers::period(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let selected = helpers::in_period(&grades, period.as_ref());
    let slice = selected
        .into_iter()
        .filter(|g| g.subject_id == subject_id);
    match calc::aggregate(&subject_id, slice) {
        Ok(summary) => to_json(req, &summary),
        Err(e) => calc_err(&req.id, e),
    }
}

/// Aggregates every subject present in `grades` for one student, then
/// weighs the subject averages.
fn handle_general_average(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let grades = match helpers::grades(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let weights = match helpers::weights(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let period = match helpers::period(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let mut by_subject: BTreeMap<String, Vec<&calc::GradeRecord>> = BTreeMap::new();
    for g in helpers::in_period(&grades, period.as_ref()) {
        if g.student_id == student_id {
            by_subject.entry(g.subject_id.clone()).or_default().push(g);
        }
    }
    let mut summaries: BTreeMap<String, SubjectSummary> = BTreeMap::new();
    for (subject_id, slice) in by_subject {
        match calc::aggregate(&subject_id, slice) {
            Ok(s) => {
                summaries.insert(subject_id, s);
            }
            Err(e) => return calc_err(&req.id, e),
        }
    }

    match calc::general_breakdown(&summaries, &weights) {
        Ok(breakdown) => ok(
            &req.id,
            json!({
                "studentId": student_id,
                "generalAverage": breakdown.average,
                "totalCoefficients": breakdown.total_coefficients,
                "contributingSubjects": breakdown.contributing_subjects,
                "subjects": summaries.values().collect::<Vec<_>>(),
            }),
        ),
        Err(e) => calc_err(&req.id, e),
    }
}

fn handle_trend(state: &mut AppState, req: &Request) -> serde_json::Value {
    let scale = match helpers::scale(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let grades = match helpers::grades(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match calc::detect_trend(&grades, &scale) {
        Ok(trend) => ok(
            &req.id,
            json!({ "trend": trend, "gradeCount": grades.len() }),
        ),
        Err(e) => calc_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.normalize" => Some(handle_normalize(state, req)),
        "grades.subjectSummary" => Some(handle_subject_summary(state, req)),
        "grades.generalAverage" => Some(handle_general_average(state, req)),
        "grades.trend" => Some(handle_trend(state, req)),
        _ => None,
    }
}
