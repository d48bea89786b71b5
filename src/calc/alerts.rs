use super::config::GradingScale;
use super::model::{AlertType, Severity, StudentAlert, StudentPerformance, Trend};

fn alert(p: &StudentPerformance, alert_type: AlertType, severity: Severity, message: String) -> StudentAlert {
    StudentAlert {
        student_id: p.student_id.clone(),
        alert_type,
        severity,
        message,
    }
}

/// Flags students from their general average and progression trend. Output
/// follows input order; per student the order is excellence, at_risk,
/// declining, improving. Students without a contributing grade are not
/// flagged: their 0 average is a placeholder.
pub fn generate_alerts(ranked: &[StudentPerformance], scale: &GradingScale) -> Vec<StudentAlert> {
    let mut out = Vec::new();
    for p in ranked.iter().filter(|p| p.has_contributing_grades()) {
        let avg = p.general_average;
        if avg >= scale.excellence_alert_mark {
            out.push(alert(
                p,
                AlertType::Excellence,
                Severity::Low,
                format!("Excellents résultats ({:.2}/20)", avg),
            ));
        }
        if avg < scale.pass_mark {
            out.push(alert(
                p,
                AlertType::AtRisk,
                Severity::High,
                format!("Moyenne générale insuffisante ({:.2}/20)", avg),
            ));
        }
        if p.progression_trend == Trend::Down && avg < scale.decline_watch_mark {
            out.push(alert(
                p,
                AlertType::Declining,
                Severity::Medium,
                format!("Résultats en baisse, moyenne fragile ({:.2}/20)", avg),
            ));
        }
        if p.progression_trend == Trend::Up {
            out.push(alert(
                p,
                AlertType::Improving,
                Severity::Low,
                format!("Résultats en progression ({:.2}/20)", avg),
            ));
        }
    }
    tracing::debug!(students = ranked.len(), alerts = out.len(), "generated alerts");
    out
}
