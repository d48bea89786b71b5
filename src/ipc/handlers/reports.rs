use crate::calc::{self, CalcError};
use crate::ipc::error::calc_err;
use crate::ipc::helpers::{self, required_str, to_json};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_student_report_card(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let scale = match helpers::scale(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let period = match helpers::required_period(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let roster = match helpers::roster(req) {
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

    let selected = period.select(&grades);
    let ranked = match calc::class_performances(&roster, &selected, &weights, &scale) {
        Ok(v) => v,
        Err(e) => return calc_err(&req.id, e),
    };
    // Outside the roster and without grades: nothing to report on.
    let Some(performance) = ranked.iter().find(|p| p.student_id == student_id) else {
        let e = CalcError::incomplete_data("no grades recorded for this period")
            .with_details(json!({ "studentId": student_id, "period": period }));
        return calc_err(&req.id, e);
    };

    match calc::report_card_for(performance, &weights, &period, &scale) {
        Ok(card) => to_json(req, &card),
        Err(e) => calc_err(&req.id, e),
    }
}

fn handle_class_report_cards(state: &mut AppState, req: &Request) -> serde_json::Value {
    let scale = match helpers::scale(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let period = match helpers::required_period(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let roster = match helpers::roster(req) {
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

    let selected = period.select(&grades);
    let ranked = match calc::class_performances(&roster, &selected, &weights, &scale) {
        Ok(v) => v,
        Err(e) => return calc_err(&req.id, e),
    };
    let entries = calc::class_report_cards(&ranked, &weights, &period, &scale);
    let incomplete = entries
        .iter()
        .filter(|e| e.error.as_ref().is_some_and(CalcError::is_incomplete_data))
        .count();
    tracing::info!(
        students = entries.len(),
        incomplete,
        trimester = %period.trimester,
        "assembled class report cards"
    );
    to_json(
        req,
        &json!({
            "period": period,
            "statistics": calc::compute_statistics(&ranked, &scale),
            "reportCards": entries,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.studentReportCard" => Some(handle_student_report_card(state, req)),
        "reports.classReportCards" => Some(handle_class_report_cards(state, req)),
        _ => None,
    }
}
