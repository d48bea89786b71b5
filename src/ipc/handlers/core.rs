use crate::calc::{ErrorCode, GradingScale};
use crate::ipc::error::{calc_err, err, ok};
use crate::ipc::helpers::to_json;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "scale": state.scale,
        }),
    )
}

fn handle_settings_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    to_json(req, &state.scale)
}

fn handle_settings_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("scale") else {
        return err(&req.id, ErrorCode::BadParams.as_str(), "missing params.scale", None);
    };
    if !raw.is_object() {
        return err(&req.id, ErrorCode::BadParams.as_str(), "scale must be an object", None);
    }
    match GradingScale::from_json(raw) {
        Ok(scale) => {
            tracing::info!(?scale, "grading scale replaced");
            state.scale = scale;
            to_json(req, &state.scale)
        }
        Err(e) => calc_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "settings.get" => Some(handle_settings_get(state, req)),
        "settings.set" => Some(handle_settings_set(state, req)),
        _ => None,
    }
}
