use crate::calc::{
    self, ErrorCode, GradeRecord, GradingScale, Period, StudentPerformance, SubjectWeight,
};
use crate::ipc::error::{calc_err, err, ok};
use crate::ipc::helpers::{self, required_str, to_json};
use crate::ipc::types::{AppState, Request};
use serde::Deserialize;
use serde_json::json;

/// Inputs shared by every class-level method.
struct ClassInputs {
    scale: GradingScale,
    roster: Vec<String>,
    grades: Vec<GradeRecord>,
    weights: Vec<SubjectWeight>,
    period: Option<Period>,
}

fn class_inputs(state: &AppState, req: &Request) -> Result<ClassInputs, serde_json::Value> {
    Ok(ClassInputs {
        scale: helpers::scale(state, req)?,
        roster: helpers::roster(req)?,
        grades: helpers::grades(req)?,
        weights: helpers::weights(req)?,
        period: helpers::period(req)?,
    })
}

fn ranked_class(req: &Request, inputs: &ClassInputs) -> Result<Vec<StudentPerformance>, serde_json::Value> {
    let selected = helpers::in_period(&inputs.grades, inputs.period.as_ref());
    calc::class_performances(&inputs.roster, &selected, &inputs.weights, &inputs.scale)
        .map_err(|e| calc_err(&req.id, e))
}

fn handle_student_performance(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let inputs = match class_inputs(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let selected = helpers::in_period(&inputs.grades, inputs.period.as_ref());
    match calc::student_performance(
        &student_id,
        selected.iter().copied(),
        &inputs.weights,
        &inputs.scale,
    ) {
        Ok(p) => to_json(req, &p),
        Err(e) => calc_err(&req.id, e),
    }
}

fn handle_student_progression(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let academic_year = match required_str(req, "academicYear") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let from = match required_str(req, "fromTrimester") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let to = match required_str(req, "toTrimester") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let inputs = match class_inputs(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    // A trimester with nothing graded has no average to compare.
    let average_for = |trimester: &str| -> Result<Option<f64>, calc::CalcError> {
        let period = Period::new(trimester, academic_year.as_str());
        let p = calc::student_performance(
            &student_id,
            period.select(&inputs.grades),
            &inputs.weights,
            &inputs.scale,
        )?;
        Ok(p.has_contributing_grades().then_some(p.general_average))
    };
    let previous = match average_for(&from) {
        Ok(v) => v,
        Err(e) => return calc_err(&req.id, e),
    };
    let current = match average_for(&to) {
        Ok(v) => v,
        Err(e) => return calc_err(&req.id, e),
    };

    let progression = calc::progression(previous, current, &inputs.scale);
    ok(
        &req.id,
        json!({
            "studentId": student_id,
            "academicYear": academic_year,
            "fromTrimester": from,
            "toTrimester": to,
            "progression": progression,
        }),
    )
}

fn handle_class_ranking(state: &mut AppState, req: &Request) -> serde_json::Value {
    let inputs = match class_inputs(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match ranked_class(req, &inputs) {
        Ok(ranked) => to_json(req, &ranked),
        Err(e) => e,
    }
}

fn handle_class_statistics(state: &mut AppState, req: &Request) -> serde_json::Value {
    let inputs = match class_inputs(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match ranked_class(req, &inputs) {
        Ok(ranked) => to_json(req, &calc::compute_statistics(&ranked, &inputs.scale)),
        Err(e) => e,
    }
}

fn handle_class_alerts(state: &mut AppState, req: &Request) -> serde_json::Value {
    let inputs = match class_inputs(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match ranked_class(req, &inputs) {
        Ok(ranked) => to_json(req, &calc::generate_alerts(&ranked, &inputs.scale)),
        Err(e) => e,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassGrades {
    class_id: String,
    #[serde(default)]
    student_ids: Vec<String>,
    grades: Vec<GradeRecord>,
}

fn handle_classes_compare(state: &mut AppState, req: &Request) -> serde_json::Value {
    let scale = match helpers::scale(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let classes: Vec<ClassGrades> = match helpers::required(req, "classes") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if classes.is_empty() {
        return err(
            &req.id,
            ErrorCode::BadParams.as_str(),
            "classes must not be empty",
            None,
        );
    }
    let weights = match helpers::weights(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let period = match helpers::period(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let mut ranked_by_class = Vec::with_capacity(classes.len());
    for c in &classes {
        let selected = helpers::in_period(&c.grades, period.as_ref());
        match calc::class_performances(&c.student_ids, &selected, &weights, &scale) {
            Ok(ranked) => ranked_by_class.push((c.class_id.as_str(), ranked)),
            Err(e) => {
                return calc_err(&req.id, e.with_details(json!({ "classId": c.class_id })))
            }
        }
    }
    let comparison = calc::compare_classes(
        ranked_by_class
            .iter()
            .map(|(id, ranked)| (*id, ranked.as_slice())),
        &scale,
    );
    to_json(req, &comparison)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.student.performance" => Some(handle_student_performance(state, req)),
        "analytics.student.progression" => Some(handle_student_progression(state, req)),
        "analytics.class.ranking" => Some(handle_class_ranking(state, req)),
        "analytics.class.statistics" => Some(handle_class_statistics(state, req)),
        "analytics.class.alerts" => Some(handle_class_alerts(state, req)),
        "analytics.classes.compare" => Some(handle_classes_compare(state, req)),
        _ => None,
    }
}
