use super::error::CalcError;

/// Ceiling of the common reference scale every grade is rescaled onto.
pub const SCALE_MAX: f64 = 20.0;

/// Rescales `value / max_value` onto 0..=20. Out-of-range values are passed
/// through unclamped.
pub fn normalize(value: f64, max_value: f64) -> Result<f64, CalcError> {
    if !max_value.is_finite() || max_value <= 0.0 {
        tracing::warn!(value, max_value, "rejected grade maximum");
        return Err(CalcError::invalid_input("maxValue must be greater than 0")
            .with_details(serde_json::json!({ "maxValue": max_value })));
    }
    if !value.is_finite() {
        tracing::warn!(value, max_value, "rejected grade value");
        return Err(CalcError::invalid_input("value must be a finite number"));
    }
    Ok((value / max_value) * SCALE_MAX)
}
