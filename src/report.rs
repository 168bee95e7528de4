use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{AssessmentRecord, CategorySummary, WarningRecord};

const CATEGORY_ORDER: [&str; 4] = ["Critical", "High", "Medium", "Low"];

pub fn summarize_by_category(assessments: &[AssessmentRecord]) -> Vec<CategorySummary> {
    let mut map: std::collections::HashMap<&str, (usize, f64)> = std::collections::HashMap::new();

    for assessment in assessments {
        let entry = map.entry(assessment.risk_category.as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += assessment.overall_risk;
    }

    CATEGORY_ORDER
        .iter()
        .filter_map(|category| {
            map.get(category).map(|(count, total)| CategorySummary {
                category: (*category).to_string(),
                count: *count,
                avg_overall: if *count == 0 {
                    0.0
                } else {
                    *total / *count as f64
                },
            })
        })
        .collect()
}

pub fn build_report(
    scope: Option<&str>,
    generated_on: NaiveDate,
    assessments: &[AssessmentRecord],
    warnings: &[WarningRecord],
) -> String {
    let summaries = summarize_by_category(assessments);

    let mut output = String::new();
    let scope_label = scope.unwrap_or("all students");

    let _ = writeln!(output, "# Student Retention Early Warning Report");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        scope_label, generated_on
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Category Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No current assessments.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} students (avg risk {:.0}/100)",
                summary.category,
                summary.count,
                summary.avg_overall * 100.0
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Students");

    if assessments.is_empty() {
        let _ = writeln!(output, "No current assessments.");
    } else {
        for assessment in assessments.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({}, {}, {}) risk {:.0}/100 [{}] via {} pathway",
                assessment.full_name,
                assessment.student_key,
                assessment.email,
                assessment.term,
                assessment.overall_risk * 100.0,
                assessment.risk_category,
                assessment.risk_pathway
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Active Warnings");

    if warnings.is_empty() {
        let _ = writeln!(output, "No active warnings.");
    } else {
        for warning in warnings.iter().take(15) {
            let _ = writeln!(
                output,
                "- {} ({}, {}) [{}] {} on {}: {}",
                warning.full_name,
                warning.student_key,
                warning.term,
                warning.severity,
                warning.warning_type,
                warning.generated_at.date_naive(),
                warning.message
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn assessment(key: &str, name: &str, category: &str, overall: f64) -> AssessmentRecord {
        AssessmentRecord {
            student_key: key.to_string(),
            full_name: name.to_string(),
            email: format!("{}@hsu.edu", key.to_lowercase()),
            term: "Fall 2025".to_string(),
            overall_risk: overall,
            risk_category: category.to_string(),
            risk_pathway: "academic".to_string(),
        }
    }

    #[test]
    fn summaries_follow_severity_order() {
        let assessments = vec![
            assessment("HSU-1003", "Lena Fischer", "Low", 0.0225),
            assessment("HSU-1001", "Maya Torres", "Critical", 0.5125),
            assessment("HSU-1002", "Devon Clark", "Medium", 0.12),
            assessment("HSU-1004", "Omar Reyes", "Medium", 0.20),
        ];

        let summaries = summarize_by_category(&assessments);
        let labels: Vec<&str> = summaries.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(labels, vec!["Critical", "Medium", "Low"]);

        let medium = &summaries[1];
        assert_eq!(medium.count, 2);
        assert!((medium.avg_overall - 0.16).abs() < 1e-9);
    }

    #[test]
    fn report_lists_mix_students_and_warnings() {
        let assessments = vec![
            assessment("HSU-1001", "Maya Torres", "Critical", 0.5125),
            assessment("HSU-1003", "Lena Fischer", "Low", 0.0225),
        ];
        let warnings = vec![WarningRecord {
            student_key: "HSU-1001".to_string(),
            full_name: "Maya Torres".to_string(),
            term: "Fall 2025".to_string(),
            warning_type: "Academic Probation".to_string(),
            severity: "Critical".to_string(),
            message: "GPA 1.50 is below 2.0 threshold".to_string(),
            generated_at: Utc.with_ymd_and_hms(2025, 12, 12, 9, 0, 0).unwrap(),
        }];

        let generated_on = NaiveDate::from_ymd_opt(2025, 12, 12).unwrap();
        let report = build_report(Some("Fall 2025"), generated_on, &assessments, &warnings);

        assert!(report.contains("# Student Retention Early Warning Report"));
        assert!(report.contains("Generated for Fall 2025 on 2025-12-12"));
        assert!(report.contains("- Critical: 1 students (avg risk 51/100)"));
        assert!(report.contains(
            "- Maya Torres (HSU-1001, hsu-1001@hsu.edu, Fall 2025) risk 51/100 [Critical] via academic pathway"
        ));
        assert!(report.contains(
            "- Maya Torres (HSU-1001, Fall 2025) [Critical] Academic Probation on 2025-12-12: \
             GPA 1.50 is below 2.0 threshold"
        ));
    }

    #[test]
    fn empty_report_still_renders_sections() {
        let generated_on = NaiveDate::from_ymd_opt(2025, 12, 12).unwrap();
        let report = build_report(None, generated_on, &[], &[]);
        assert!(report.contains("Generated for all students"));
        assert!(report.contains("No current assessments."));
        assert!(report.contains("No active warnings."));
    }
}
