use thiserror::Error;

use crate::models::{RiskCategory, RiskScores, StudentSnapshot};

pub const ACADEMIC_WEIGHT: f64 = 0.5;
pub const ENGAGEMENT_WEIGHT: f64 = 0.3;
pub const FINANCIAL_WEIGHT: f64 = 0.2;

const GPA_SUB_WEIGHT: f64 = 0.6;
const COMPLETION_SUB_WEIGHT: f64 = 0.4;
const ATTENDANCE_SUB_WEIGHT: f64 = 0.5;
const LMS_SUB_WEIGHT: f64 = 0.5;

const PROBATION_GPA: f64 = 2.0;
const FINANCIAL_AID_STEP: f64 = 0.5;
const FINANCIAL_HOLD_STEP: f64 = 0.5;
const LOW_GPA_STEP: f64 = 0.25;
const COUNSELING_VISIT_LIMIT: u32 = 3;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("gpa {0} is outside the 0.0-4.0 scale")]
    GpaOutOfRange(f64),
    #[error("{field} {value} is outside the 0.0-1.0 range")]
    RateOutOfRange { field: &'static str, value: f64 },
}

fn validate(snapshot: &StudentSnapshot) -> Result<(), ValidationError> {
    if !(0.0..=4.0).contains(&snapshot.gpa) {
        return Err(ValidationError::GpaOutOfRange(snapshot.gpa));
    }
    for (field, value) in [
        ("attendance_rate", snapshot.attendance_rate),
        ("engagement_score", snapshot.engagement_score),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::RateOutOfRange { field, value });
        }
    }
    Ok(())
}

pub fn compute_risk_scores(snapshot: &StudentSnapshot) -> Result<RiskScores, ValidationError> {
    validate(snapshot)?;

    // GPA deficit is measured against the 2.0 probation floor, not the top
    // of the scale.
    let gpa_deficit = ((PROBATION_GPA - snapshot.gpa) / PROBATION_GPA).max(0.0);
    let academic_risk = clamp01(
        GPA_SUB_WEIGHT * gpa_deficit
            + COMPLETION_SUB_WEIGHT * (1.0 - snapshot.completion_ratio()),
    );

    let engagement_risk = clamp01(
        ATTENDANCE_SUB_WEIGHT * (1.0 - snapshot.attendance_rate)
            + LMS_SUB_WEIGHT * (1.0 - snapshot.engagement_score),
    );

    // Step function: the underlying signals are categorical.
    let mut financial_risk = 0.0;
    if snapshot.has_financial_aid {
        financial_risk += FINANCIAL_AID_STEP;
    }
    if snapshot.financial_hold {
        financial_risk += FINANCIAL_HOLD_STEP;
    }
    if snapshot.gpa < PROBATION_GPA {
        financial_risk += LOW_GPA_STEP;
    }
    let financial_risk = clamp01(financial_risk);

    let wellness_risk = if snapshot.crisis_flag {
        1.0
    } else if snapshot.counseling_visits > COUNSELING_VISIT_LIMIT {
        0.5
    } else {
        0.0
    };

    // Wellness drives warnings directly and stays out of the aggregate.
    let overall_risk = ACADEMIC_WEIGHT * academic_risk
        + ENGAGEMENT_WEIGHT * engagement_risk
        + FINANCIAL_WEIGHT * financial_risk;

    Ok(RiskScores {
        academic_risk,
        engagement_risk,
        financial_risk,
        wellness_risk,
        overall_risk,
        risk_category: categorize(overall_risk),
        risk_pathway: risk_pathway(academic_risk, engagement_risk, financial_risk, wellness_risk),
    })
}

pub fn categorize(overall: f64) -> RiskCategory {
    if overall >= 0.50 {
        RiskCategory::Critical
    } else if overall >= 0.30 {
        RiskCategory::High
    } else if overall >= 0.10 {
        RiskCategory::Medium
    } else {
        RiskCategory::Low
    }
}

fn risk_pathway(academic: f64, engagement: f64, financial: f64, wellness: f64) -> &'static str {
    let factors = [
        ("academic", academic),
        ("engagement", engagement),
        ("financial", financial),
        ("wellness", wellness),
    ];

    let mut pathway = "none";
    let mut highest = 0.0;
    for (name, value) in factors {
        if value > highest {
            pathway = name;
            highest = value;
        }
    }
    pathway
}

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
