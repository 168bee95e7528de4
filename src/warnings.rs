use chrono::{DateTime, Utc};

use crate::models::{Severity, StudentSnapshot, Warning, WarningType};

// Shared by the Low GPA tier and the financial aid gate.
const LOW_GPA_THRESHOLD: f64 = 2.5;

struct ThresholdTier {
    threshold: f64,
    warning_type: WarningType,
    severity: Severity,
    message: fn(f64) -> String,
}

struct RuleClass {
    metric: fn(&StudentSnapshot) -> f64,
    tiers: &'static [ThresholdTier],
}

// Tiers ascend by threshold, so the first match is the most severe
// applicable one and suppresses the rest of the class.
const GPA_TIERS: &[ThresholdTier] = &[
    ThresholdTier {
        threshold: 2.0,
        warning_type: WarningType::AcademicProbation,
        severity: Severity::Critical,
        message: probation_message,
    },
    ThresholdTier {
        threshold: LOW_GPA_THRESHOLD,
        warning_type: WarningType::LowGpa,
        severity: Severity::High,
        message: low_gpa_message,
    },
    ThresholdTier {
        threshold: 3.0,
        warning_type: WarningType::GpaWatch,
        severity: Severity::Medium,
        message: gpa_watch_message,
    },
];

const CREDIT_TIERS: &[ThresholdTier] = &[
    ThresholdTier {
        threshold: 0.67,
        warning_type: WarningType::HighCreditDeficit,
        severity: Severity::Critical,
        message: credit_deficit_message,
    },
    ThresholdTier {
        threshold: 0.80,
        warning_type: WarningType::CreditProgress,
        severity: Severity::Medium,
        message: credit_progress_message,
    },
];

const ATTENDANCE_TIERS: &[ThresholdTier] = &[
    ThresholdTier {
        threshold: 0.70,
        warning_type: WarningType::SevereAttendance,
        severity: Severity::Critical,
        message: attendance_message,
    },
    ThresholdTier {
        threshold: 0.80,
        warning_type: WarningType::AttendanceWarning,
        severity: Severity::High,
        message: attendance_message,
    },
];

const ENGAGEMENT_TIERS: &[ThresholdTier] = &[
    ThresholdTier {
        threshold: 0.40,
        warning_type: WarningType::VeryLowEngagement,
        severity: Severity::Critical,
        message: engagement_message,
    },
    ThresholdTier {
        threshold: 0.60,
        warning_type: WarningType::LowEngagement,
        severity: Severity::High,
        message: engagement_message,
    },
];

const RULE_CLASSES: &[RuleClass] = &[
    RuleClass {
        metric: gpa_of,
        tiers: GPA_TIERS,
    },
    RuleClass {
        metric: completion_of,
        tiers: CREDIT_TIERS,
    },
    RuleClass {
        metric: attendance_of,
        tiers: ATTENDANCE_TIERS,
    },
    RuleClass {
        metric: engagement_of,
        tiers: ENGAGEMENT_TIERS,
    },
];

fn gpa_of(snapshot: &StudentSnapshot) -> f64 {
    snapshot.gpa
}

fn completion_of(snapshot: &StudentSnapshot) -> f64 {
    snapshot.completion_ratio()
}

fn attendance_of(snapshot: &StudentSnapshot) -> f64 {
    snapshot.attendance_rate
}

fn engagement_of(snapshot: &StudentSnapshot) -> f64 {
    snapshot.engagement_score
}

fn probation_message(gpa: f64) -> String {
    format!("GPA {gpa:.2} is below 2.0 threshold")
}

fn low_gpa_message(gpa: f64) -> String {
    format!("GPA {gpa:.2} is below recommended 2.5")
}

fn gpa_watch_message(gpa: f64) -> String {
    format!("GPA {gpa:.2} could be improved")
}

fn credit_deficit_message(ratio: f64) -> String {
    format!("Only {:.1}% credits completed", ratio * 100.0)
}

fn credit_progress_message(ratio: f64) -> String {
    format!("{:.1}% completion rate needs improvement", ratio * 100.0)
}

fn attendance_message(rate: f64) -> String {
    format!("Attendance at {:.1}%", rate * 100.0)
}

fn engagement_message(score: f64) -> String {
    format!("Engagement score {:.1}%", score * 100.0)
}

pub fn generate_warnings(snapshot: &StudentSnapshot, generated_at: DateTime<Utc>) -> Vec<Warning> {
    let mut warnings = Vec::new();

    for class in RULE_CLASSES {
        let value = (class.metric)(snapshot);
        if let Some(tier) = class.tiers.iter().find(|tier| value < tier.threshold) {
            warnings.push(Warning {
                student_id: snapshot.student_id.clone(),
                warning_type: tier.warning_type,
                severity: tier.severity,
                message: (tier.message)(value),
                generated_at,
            });
        }
    }

    // Contingent on academic standing, not financial data alone.
    if snapshot.has_financial_aid && snapshot.gpa < LOW_GPA_THRESHOLD {
        warnings.push(Warning {
            student_id: snapshot.student_id.clone(),
            warning_type: WarningType::FinancialAidRisk,
            severity: Severity::High,
            message: format!("GPA {:.2} may affect financial aid eligibility", snapshot.gpa),
            generated_at,
        });
    }

    // The flag alone, with no other indicator, never warns.
    if snapshot.is_first_generation && !warnings.is_empty() {
        warnings.push(Warning {
            student_id: snapshot.student_id.clone(),
            warning_type: WarningType::FirstGenSupportNeeded,
            severity: Severity::Medium,
            message: "First-generation student needs additional support".to_string(),
            generated_at,
        });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_snapshot(
        gpa: f64,
        completed: u32,
        attempted: u32,
        attendance: f64,
        engagement: f64,
    ) -> StudentSnapshot {
        StudentSnapshot {
            student_id: "HSU-1001".to_string(),
            gpa,
            credits_completed: completed,
            credits_attempted: attempted,
            attendance_rate: attendance,
            engagement_score: engagement,
            has_financial_aid: false,
            is_first_generation: false,
            financial_hold: false,
            crisis_flag: false,
            counseling_visits: 0,
        }
    }

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 12, 9, 0, 0).unwrap()
    }

    fn types(warnings: &[Warning]) -> Vec<WarningType> {
        warnings.iter().map(|w| w.warning_type).collect()
    }

    #[test]
    fn probation_profile_fires_all_six_warnings_in_rule_order() {
        let mut snapshot = sample_snapshot(1.5, 20, 40, 0.55, 0.20);
        snapshot.has_financial_aid = true;
        snapshot.is_first_generation = true;

        let warnings = generate_warnings(&snapshot, generated_at());
        assert_eq!(
            types(&warnings),
            vec![
                WarningType::AcademicProbation,
                WarningType::HighCreditDeficit,
                WarningType::SevereAttendance,
                WarningType::VeryLowEngagement,
                WarningType::FinancialAidRisk,
                WarningType::FirstGenSupportNeeded,
            ]
        );

        let severities: Vec<Severity> = warnings.iter().map(|w| w.severity).collect();
        assert_eq!(
            severities,
            vec![
                Severity::Critical,
                Severity::Critical,
                Severity::Critical,
                Severity::Critical,
                Severity::High,
                Severity::Medium,
            ]
        );

        assert_eq!(warnings[0].message, "GPA 1.50 is below 2.0 threshold");
        assert_eq!(warnings[1].message, "Only 50.0% credits completed");
        assert_eq!(warnings[2].message, "Attendance at 55.0%");
        assert_eq!(warnings[3].message, "Engagement score 20.0%");
        assert_eq!(
            warnings[4].message,
            "GPA 1.50 may affect financial aid eligibility"
        );
        assert_eq!(
            warnings[5].message,
            "First-generation student needs additional support"
        );
    }

    #[test]
    fn good_standing_profile_fires_nothing() {
        let warnings = generate_warnings(&sample_snapshot(3.5, 75, 75, 0.95, 0.90), generated_at());
        assert!(warnings.is_empty());
    }

    #[test]
    fn gpa_tiers_are_mutually_exclusive() {
        let warnings = generate_warnings(&sample_snapshot(1.5, 40, 40, 0.95, 0.90), generated_at());
        assert_eq!(types(&warnings), vec![WarningType::AcademicProbation]);
    }

    #[test]
    fn gpa_watch_covers_the_middle_band() {
        let warnings = generate_warnings(&sample_snapshot(2.8, 40, 40, 0.95, 0.90), generated_at());
        assert_eq!(types(&warnings), vec![WarningType::GpaWatch]);
        assert_eq!(warnings[0].message, "GPA 2.80 could be improved");
        assert_eq!(warnings[0].severity, Severity::Medium);
    }

    #[test]
    fn gpa_boundaries_fall_to_the_lower_tier() {
        let at_probation =
            generate_warnings(&sample_snapshot(2.0, 40, 40, 0.95, 0.90), generated_at());
        assert_eq!(types(&at_probation), vec![WarningType::LowGpa]);
        assert_eq!(at_probation[0].message, "GPA 2.00 is below recommended 2.5");

        let at_watch = generate_warnings(&sample_snapshot(2.5, 40, 40, 0.95, 0.90), generated_at());
        assert_eq!(types(&at_watch), vec![WarningType::GpaWatch]);

        let at_top = generate_warnings(&sample_snapshot(3.0, 40, 40, 0.95, 0.90), generated_at());
        assert!(at_top.is_empty());
    }

    #[test]
    fn credit_tiers_split_at_two_thirds() {
        let deficit = generate_warnings(&sample_snapshot(3.5, 66, 100, 0.95, 0.90), generated_at());
        assert_eq!(types(&deficit), vec![WarningType::HighCreditDeficit]);
        assert_eq!(deficit[0].message, "Only 66.0% credits completed");

        let progress =
            generate_warnings(&sample_snapshot(3.5, 67, 100, 0.95, 0.90), generated_at());
        assert_eq!(types(&progress), vec![WarningType::CreditProgress]);
        assert_eq!(
            progress[0].message,
            "67.0% completion rate needs improvement"
        );

        let on_track = generate_warnings(&sample_snapshot(3.5, 80, 100, 0.95, 0.90), generated_at());
        assert!(on_track.is_empty());
    }

    #[test]
    fn attendance_tiers_split_at_seventy_percent() {
        let severe = generate_warnings(&sample_snapshot(3.5, 40, 40, 0.65, 0.90), generated_at());
        assert_eq!(types(&severe), vec![WarningType::SevereAttendance]);
        assert_eq!(severe[0].severity, Severity::Critical);
        assert_eq!(severe[0].message, "Attendance at 65.0%");

        let warning = generate_warnings(&sample_snapshot(3.5, 40, 40, 0.70, 0.90), generated_at());
        assert_eq!(types(&warning), vec![WarningType::AttendanceWarning]);
        assert_eq!(warning[0].severity, Severity::High);

        let fine = generate_warnings(&sample_snapshot(3.5, 40, 40, 0.80, 0.90), generated_at());
        assert!(fine.is_empty());
    }

    #[test]
    fn engagement_tiers_split_at_forty_percent() {
        let very_low = generate_warnings(&sample_snapshot(3.5, 40, 40, 0.95, 0.30), generated_at());
        assert_eq!(types(&very_low), vec![WarningType::VeryLowEngagement]);
        assert_eq!(very_low[0].message, "Engagement score 30.0%");

        let low = generate_warnings(&sample_snapshot(3.5, 40, 40, 0.95, 0.40), generated_at());
        assert_eq!(types(&low), vec![WarningType::LowEngagement]);

        let fine = generate_warnings(&sample_snapshot(3.5, 40, 40, 0.95, 0.60), generated_at());
        assert!(fine.is_empty());
    }

    #[test]
    fn classes_emit_in_definition_order() {
        let warnings = generate_warnings(&sample_snapshot(3.5, 40, 40, 0.65, 0.50), generated_at());
        assert_eq!(
            types(&warnings),
            vec![WarningType::SevereAttendance, WarningType::LowEngagement]
        );
    }

    #[test]
    fn financial_aid_risk_requires_low_gpa() {
        let mut snapshot = sample_snapshot(2.2, 40, 40, 0.95, 0.90);
        snapshot.has_financial_aid = true;
        let warnings = generate_warnings(&snapshot, generated_at());
        assert_eq!(
            types(&warnings),
            vec![WarningType::LowGpa, WarningType::FinancialAidRisk]
        );
        assert_eq!(
            warnings[1].message,
            "GPA 2.20 may affect financial aid eligibility"
        );

        let mut solid = sample_snapshot(3.5, 40, 40, 0.95, 0.90);
        solid.has_financial_aid = true;
        assert!(generate_warnings(&solid, generated_at()).is_empty());
    }

    #[test]
    fn first_generation_flag_alone_never_warns() {
        let mut snapshot = sample_snapshot(3.8, 40, 40, 0.98, 0.95);
        snapshot.is_first_generation = true;
        assert!(generate_warnings(&snapshot, generated_at()).is_empty());
    }

    #[test]
    fn first_generation_support_rides_on_any_other_warning() {
        let mut snapshot = sample_snapshot(2.8, 40, 40, 0.95, 0.90);
        snapshot.is_first_generation = true;
        let warnings = generate_warnings(&snapshot, generated_at());
        assert_eq!(
            types(&warnings),
            vec![WarningType::GpaWatch, WarningType::FirstGenSupportNeeded]
        );
        assert_eq!(warnings[1].severity, Severity::Medium);
    }

    #[test]
    fn repeated_generation_is_identical() {
        let mut snapshot = sample_snapshot(2.2, 50, 60, 0.72, 0.55);
        snapshot.has_financial_aid = true;
        snapshot.is_first_generation = true;

        let first = generate_warnings(&snapshot, generated_at());
        let second = generate_warnings(&snapshot, generated_at());
        assert_eq!(first, second);
    }
}
