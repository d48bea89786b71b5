use serde::Serialize;

use super::config::GradingScale;
use super::model::StudentPerformance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankInfo {
    pub rank: usize,
    pub total_students: usize,
}

impl StudentPerformance {
    pub fn rank_info(&self) -> Option<RankInfo> {
        self.rank.map(|rank| RankInfo {
            rank,
            total_students: self.total_students,
        })
    }
}

/// Orders by general average descending and assigns competition ranks
/// (`[18, 16, 16, 14]` ranks as `[1, 2, 2, 4]`). Equal averages are listed
/// by student id.
pub fn rank(
    mut performances: Vec<StudentPerformance>,
    scale: &GradingScale,
) -> Vec<StudentPerformance> {
    performances.sort_by(|a, b| {
        b.general_average
            .total_cmp(&a.general_average)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });

    let total = performances.len();
    let mut current_rank = 0_usize;
    let mut previous: Option<f64> = None;
    for (idx, p) in performances.iter_mut().enumerate() {
        let tied = previous
            .map(|prev| (prev - p.general_average).abs() <= scale.tie_epsilon)
            .unwrap_or(false);
        if !tied {
            current_rank = idx + 1;
            previous = Some(p.general_average);
        }
        p.rank = Some(current_rank);
        p.total_students = total;
    }

    tracing::debug!(total, "ranked students");
    performances
}
