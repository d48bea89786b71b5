use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

fn default_max_value() -> f64 {
    20.0
}

fn default_coefficient() -> f64 {
    1.0
}

/// One evaluation result as supplied by the grade store. Never mutated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub student_id: String,
    pub subject_id: String,
    #[serde(default)]
    pub teacher_id: String,
    pub value: f64,
    #[serde(default = "default_max_value")]
    pub max_value: f64,
    #[serde(default = "default_coefficient")]
    pub coefficient: f64,
    #[serde(default)]
    pub evaluation_type: String,
    #[serde(default)]
    pub trimester: String,
    #[serde(default)]
    pub academic_year: String,
    pub evaluation_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Subject-level coefficient, distinct from the per-grade coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectWeight {
    pub subject_id: String,
    pub coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub trimester: String,
    pub academic_year: String,
}

impl Period {
    pub fn new(trimester: impl Into<String>, academic_year: impl Into<String>) -> Self {
        Self {
            trimester: trimester.into(),
            academic_year: academic_year.into(),
        }
    }

    pub fn contains(&self, grade: &GradeRecord) -> bool {
        grade.trimester == self.trimester && grade.academic_year == self.academic_year
    }

    pub fn select<'a>(&self, grades: &'a [GradeRecord]) -> Vec<&'a GradeRecord> {
        grades.iter().filter(|g| self.contains(g)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedGrade {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_id: Option<String>,
    /// Score on the 0..=20 scale.
    pub value: f64,
    pub raw_value: f64,
    pub max_value: f64,
    pub coefficient: f64,
    pub evaluation_type: String,
    pub evaluation_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    pub subject_id: String,
    pub average: f64,
    pub grade_count: usize,
    pub min_grade: f64,
    pub max_grade: f64,
    /// Most recent first.
    pub grades: Vec<NormalizedGrade>,
}

impl SubjectSummary {
    pub fn empty(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            average: 0.0,
            grade_count: 0,
            min_grade: 0.0,
            max_grade: 0.0,
            grades: Vec::new(),
        }
    }

    pub fn is_graded(&self) -> bool {
        self.grade_count > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Mention {
    #[serde(rename = "Félicitations")]
    Felicitations,
    #[serde(rename = "Très bien")]
    TresBien,
    #[serde(rename = "Bien")]
    Bien,
    #[serde(rename = "Assez bien")]
    AssezBien,
    #[serde(rename = "Passable")]
    Passable,
    #[serde(rename = "Insuffisant")]
    Insuffisant,
}

impl Mention {
    pub fn label(self) -> &'static str {
        match self {
            Mention::Felicitations => "Félicitations",
            Mention::TresBien => "Très bien",
            Mention::Bien => "Bien",
            Mention::AssezBien => "Assez bien",
            Mention::Passable => "Passable",
            Mention::Insuffisant => "Insuffisant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPerformance {
    pub student_id: String,
    pub general_average: f64,
    /// Sum of the subject weights that fed `general_average`.
    pub total_coefficients: f64,
    pub subjects: Vec<SubjectSummary>,
    /// 1-based; `None` until ranked.
    pub rank: Option<usize>,
    pub total_students: usize,
    pub appreciation: Mention,
    pub progression_trend: Trend,
}

impl StudentPerformance {
    /// False when no weighted subject is graded, in which case
    /// `general_average` is a placeholder 0 and not a result.
    pub fn has_contributing_grades(&self) -> bool {
        self.total_coefficients > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStatistics {
    pub subject_id: String,
    pub student_count: usize,
    pub average: f64,
    pub median: f64,
    pub min_average: f64,
    pub max_average: f64,
    pub standard_deviation: f64,
    pub success_rate: f64,
    pub excellence_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStatistics {
    pub total_students: usize,
    pub graded_students: usize,
    pub average_general: f64,
    pub median_general: f64,
    pub min_general: f64,
    pub max_general: f64,
    pub standard_deviation: f64,
    pub success_rate: f64,
    pub excellence_rate: f64,
    pub subjects: Vec<SubjectStatistics>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Excellence,
    AtRisk,
    Improving,
    Declining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAlert {
    pub student_id: String,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
}
