use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct StudentSnapshot {
    pub student_id: String,
    pub gpa: f64,
    pub credits_completed: u32,
    pub credits_attempted: u32,
    pub attendance_rate: f64,
    pub engagement_score: f64,
    pub has_financial_aid: bool,
    pub is_first_generation: bool,
    #[serde(default)]
    pub financial_hold: bool,
    #[serde(default)]
    pub crisis_flag: bool,
    #[serde(default)]
    pub counseling_visits: u32,
}

impl StudentSnapshot {
    // Nothing attempted counts as fully on track.
    pub fn completion_ratio(&self) -> f64 {
        if self.credits_attempted == 0 {
            1.0
        } else {
            f64::from(self.credits_completed) / f64::from(self.credits_attempted)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskCategory {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "Low",
            RiskCategory::Medium => "Medium",
            RiskCategory::High => "High",
            RiskCategory::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskScores {
    pub academic_risk: f64,
    pub engagement_risk: f64,
    pub financial_risk: f64,
    pub wellness_risk: f64,
    pub overall_risk: f64,
    pub risk_category: RiskCategory,
    pub risk_pathway: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningType {
    #[serde(rename = "Academic Probation")]
    AcademicProbation,
    #[serde(rename = "Low GPA")]
    LowGpa,
    #[serde(rename = "GPA Watch")]
    GpaWatch,
    #[serde(rename = "High Credit Deficit")]
    HighCreditDeficit,
    #[serde(rename = "Credit Progress")]
    CreditProgress,
    #[serde(rename = "Severe Attendance")]
    SevereAttendance,
    #[serde(rename = "Attendance Warning")]
    AttendanceWarning,
    #[serde(rename = "Very Low Engagement")]
    VeryLowEngagement,
    #[serde(rename = "Low Engagement")]
    LowEngagement,
    #[serde(rename = "Financial Aid Risk")]
    FinancialAidRisk,
    #[serde(rename = "First-Gen Support Needed")]
    FirstGenSupportNeeded,
}

impl WarningType {
    pub fn label(&self) -> &'static str {
        match self {
            WarningType::AcademicProbation => "Academic Probation",
            WarningType::LowGpa => "Low GPA",
            WarningType::GpaWatch => "GPA Watch",
            WarningType::HighCreditDeficit => "High Credit Deficit",
            WarningType::CreditProgress => "Credit Progress",
            WarningType::SevereAttendance => "Severe Attendance",
            WarningType::AttendanceWarning => "Attendance Warning",
            WarningType::VeryLowEngagement => "Very Low Engagement",
            WarningType::LowEngagement => "Low Engagement",
            WarningType::FinancialAidRisk => "Financial Aid Risk",
            WarningType::FirstGenSupportNeeded => "First-Gen Support Needed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub student_id: String,
    pub warning_type: WarningType,
    pub severity: Severity,
    pub message: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SnapshotRecord {
    pub student_pk: Uuid,
    pub full_name: String,
    pub email: String,
    pub term: String,
    pub snapshot: StudentSnapshot,
}

#[derive(Debug, Clone)]
pub struct AssessmentRecord {
    pub student_key: String,
    pub full_name: String,
    pub email: String,
    pub term: String,
    pub overall_risk: f64,
    pub risk_category: String,
    pub risk_pathway: String,
}

#[derive(Debug, Clone)]
pub struct CategorySummary {
    pub category: String,
    pub count: usize,
    pub avg_overall: f64,
}

#[derive(Debug, Clone)]
pub struct WarningRecord {
    pub student_key: String,
    pub full_name: String,
    pub term: String,
    pub warning_type: String,
    pub severity: String,
    pub message: String,
    pub generated_at: DateTime<Utc>,
}
