use serde::{Deserialize, Serialize};

use super::error::CalcError;
use super::normalize::SCALE_MAX;

/// Threshold ladder for the report-card mention. Each field is the minimum
/// general average (inclusive) for that mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MentionLadder {
    pub felicitations: f64,
    pub tres_bien: f64,
    pub bien: f64,
    pub assez_bien: f64,
    pub passable: f64,
}

impl Default for MentionLadder {
    fn default() -> Self {
        Self {
            felicitations: 18.0,
            tres_bien: 16.0,
            bien: 14.0,
            assez_bien: 12.0,
            passable: 10.0,
        }
    }
}

impl MentionLadder {
    fn steps(&self) -> [f64; 5] {
        [
            self.felicitations,
            self.tres_bien,
            self.bien,
            self.assez_bien,
            self.passable,
        ]
    }
}

/// Threshold ladder for the free-text teacher comment on a report card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommentLadder {
    pub excellent: f64,
    pub very_good: f64,
    pub good: f64,
    pub fair: f64,
    pub weak: f64,
}

impl Default for CommentLadder {
    fn default() -> Self {
        Self {
            excellent: 16.0,
            very_good: 14.0,
            good: 12.0,
            fair: 10.0,
            weak: 8.0,
        }
    }
}

impl CommentLadder {
    fn steps(&self) -> [f64; 5] {
        [self.excellent, self.very_good, self.good, self.fair, self.weak]
    }
}

/// Every grading-policy constant the engine reads. All marks are on the
/// normalized 0..=20 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GradingScale {
    /// Minimum average counted as a pass (success rate, at-risk alert).
    pub pass_mark: f64,
    /// Minimum average counted in the class excellence rate.
    pub excellence_rate_mark: f64,
    /// Minimum average that raises an `excellence` alert.
    pub excellence_alert_mark: f64,
    /// A declining student below this average raises a `declining` alert.
    pub decline_watch_mark: f64,
    /// Half-to-half mean difference needed to call a trend up or down.
    pub trend_threshold: f64,
    /// Trimester-to-trimester difference needed to call a progression.
    pub progression_threshold: f64,
    /// Averages closer than this share a rank.
    pub tie_epsilon: f64,
    pub mentions: MentionLadder,
    pub comments: CommentLadder,
}

impl Default for GradingScale {
    fn default() -> Self {
        Self {
            pass_mark: 10.0,
            excellence_rate_mark: 14.0,
            excellence_alert_mark: 16.0,
            decline_watch_mark: 12.0,
            trend_threshold: 1.0,
            progression_threshold: 0.0,
            tie_epsilon: 1e-9,
            mentions: MentionLadder::default(),
            comments: CommentLadder::default(),
        }
    }
}

fn check_mark(name: &str, v: f64) -> Result<(), CalcError> {
    if !v.is_finite() || !(0.0..=SCALE_MAX).contains(&v) {
        return Err(CalcError::invalid_input(format!(
            "{} must be within 0..={}",
            name, SCALE_MAX
        ))
        .with_details(serde_json::json!({ name: v })));
    }
    Ok(())
}

fn check_descending(name: &str, steps: &[f64]) -> Result<(), CalcError> {
    for (i, v) in steps.iter().enumerate() {
        check_mark(&format!("{}[{}]", name, i), *v)?;
    }
    if steps.windows(2).any(|w| w[0] <= w[1]) {
        return Err(CalcError::invalid_input(format!(
            "{} thresholds must be strictly descending",
            name
        ))
        .with_details(serde_json::json!({ name: steps })));
    }
    Ok(())
}

impl GradingScale {
    pub fn validate(&self) -> Result<(), CalcError> {
        check_mark("passMark", self.pass_mark)?;
        check_mark("excellenceRateMark", self.excellence_rate_mark)?;
        check_mark("excellenceAlertMark", self.excellence_alert_mark)?;
        check_mark("declineWatchMark", self.decline_watch_mark)?;
        check_mark("trendThreshold", self.trend_threshold)?;
        check_mark("progressionThreshold", self.progression_threshold)?;
        if !self.tie_epsilon.is_finite() || self.tie_epsilon < 0.0 {
            return Err(CalcError::invalid_input(
                "tieEpsilon must be a non-negative number",
            ));
        }
        check_descending("mentions", &self.mentions.steps())?;
        check_descending("comments", &self.comments.steps())?;
        Ok(())
    }

    /// Parses a (possibly partial) scale object. Missing keys keep defaults.
    pub fn from_json(raw: &serde_json::Value) -> Result<Self, CalcError> {
        let scale: GradingScale = serde_json::from_value(raw.clone())
            .map_err(|e| CalcError::invalid_input(format!("invalid grading scale: {}", e)))?;
        scale.validate()?;
        Ok(scale)
    }
}
