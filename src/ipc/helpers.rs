use serde::de::DeserializeOwned;
use serde_json::json;

use crate::calc::{ErrorCode, GradeRecord, GradingScale, Period, SubjectWeight};
use crate::ipc::error::{calc_err, err};
use crate::ipc::types::{AppState, Request};

fn bad_params(req: &Request, message: impl Into<String>) -> serde_json::Value {
    err(&req.id, ErrorCode::BadParams.as_str(), message, None)
}

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| bad_params(req, format!("missing {}", key)))
}

pub fn required_f64(req: &Request, key: &str) -> Result<f64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| bad_params(req, format!("{} must be a number", key)))
}

pub fn optional<T: DeserializeOwned>(req: &Request, key: &str) -> Result<Option<T>, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => serde_json::from_value(v.clone()).map(Some).map_err(|e| {
            err(
                &req.id,
                ErrorCode::BadParams.as_str(),
                format!("invalid {}: {}", key, e),
                Some(json!({ "param": key })),
            )
        }),
    }
}

pub fn required<T: DeserializeOwned>(req: &Request, key: &str) -> Result<T, serde_json::Value> {
    optional(req, key)?.ok_or_else(|| bad_params(req, format!("missing {}", key)))
}

pub fn grades(req: &Request) -> Result<Vec<GradeRecord>, serde_json::Value> {
    required(req, "grades")
}

/// Subject weights are mandatory: without them every general average
/// would silently be 0.
pub fn weights(req: &Request) -> Result<Vec<SubjectWeight>, serde_json::Value> {
    let weights: Vec<SubjectWeight> = required(req, "weights")?;
    if weights.is_empty() {
        return Err(bad_params(req, "weights must not be empty"));
    }
    Ok(weights)
}

pub fn roster(req: &Request) -> Result<Vec<String>, serde_json::Value> {
    Ok(optional(req, "studentIds")?.unwrap_or_default())
}

pub fn period(req: &Request) -> Result<Option<Period>, serde_json::Value> {
    optional(req, "period")
}

pub fn required_period(req: &Request) -> Result<Period, serde_json::Value> {
    required(req, "period")
}

/// Grades restricted to `period` when one is given.
pub fn in_period<'a>(grades: &'a [GradeRecord], period: Option<&Period>) -> Vec<&'a GradeRecord> {
    match period {
        Some(p) => p.select(grades),
        None => grades.iter().collect(),
    }
}

/// Session scale, or the per-call `scale` override when present.
pub fn scale(state: &AppState, req: &Request) -> Result<GradingScale, serde_json::Value> {
    match req.params.get("scale") {
        None => Ok(state.scale.clone()),
        Some(v) if v.is_null() => Ok(state.scale.clone()),
        Some(v) => GradingScale::from_json(v).map_err(|e| calc_err(&req.id, e)),
    }
}

pub fn to_json<T: serde::Serialize>(req: &Request, value: &T) -> serde_json::Value {
    match serde_json::to_value(value) {
        Ok(v) => crate::ipc::error::ok(&req.id, v),
        Err(e) => err(&req.id, "serialize_failed", e.to_string(), None),
    }
}
