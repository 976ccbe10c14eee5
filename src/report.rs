use std::fmt::Write;

use crate::attendance::percentage;
use crate::models::AttendanceRecord;
use crate::summary;
use crate::tracker::Tracker;

#[derive(Debug, Clone, Default)]
pub struct ReportScope<'a> {
    pub student_id: Option<&'a str>,
    pub subject_id: Option<&'a str>,
}

pub fn build_report(tracker: &Tracker, scope: &ReportScope<'_>, threshold: u32) -> String {
    let records = tracker.reportable_records();
    let mut summaries =
        summary::summarize_students(tracker.students(), &records, scope.subject_id);
    if let Some(subject_id) = scope.subject_id {
        summaries.retain(|summary| {
            tracker
                .student(&summary.student_id)
                .is_some_and(|student| student.enrolled_subjects.iter().any(|s| s == subject_id))
        });
    }
    if let Some(student_id) = scope.student_id {
        summaries.retain(|summary| summary.student_id == student_id);
    }

    let mut output = String::new();
    let subject_label = scope
        .subject_id
        .and_then(|id| tracker.subject(id))
        .map(|subject| format!("{} ({})", subject.name, subject.id))
        .unwrap_or_else(|| "all subjects".to_string());

    let _ = writeln!(output, "# Attendance Report");
    let _ = writeln!(
        output,
        "Generated for {} across {} students",
        subject_label,
        summaries.len()
    );

    if let Some(student_id) = scope.student_id {
        write_student_detail(&mut output, tracker, &records, student_id, scope.subject_id);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Below {}%", threshold);
    let flagged = summary::below_threshold(&summaries, threshold);
    if flagged.is_empty() {
        let _ = writeln!(output, "No students below the threshold.");
    } else {
        for summary in flagged.iter().take(15) {
            let _ = writeln!(
                output,
                "- {} ({}, {}) {}% ({}/{} classes)",
                summary.student_name,
                summary.student_id,
                summary.department,
                summary.percentage,
                summary.classes_attended,
                summary.total_classes
            );
        }
        if flagged.len() > 15 {
            let _ = writeln!(output, "- ... and {} more", flagged.len() - 15);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Subject Averages");
    let subject_summaries = summary::summarize_subjects(tracker.subjects(), &records);
    if subject_summaries.is_empty() {
        let _ = writeln!(output, "No subjects recorded.");
    } else {
        for subject in subject_summaries
            .iter()
            .filter(|s| scope.subject_id.map_or(true, |id| s.subject_id == id))
        {
            let _ = writeln!(
                output,
                "- {} ({}, {}): {}% across {} students",
                subject.subject_name,
                subject.subject_id,
                subject.department,
                subject.percentage,
                subject.student_count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Exam Windows");
    for iat in tracker.iat_calendar() {
        let (attended, total) = tracker
            .iat_records()
            .iter()
            .filter(|record| record.iat_type == Some(iat.iat_type))
            .filter(|record| scope.subject_id.map_or(true, |id| record.subject_id == id))
            .filter(|record| scope.student_id.map_or(true, |id| record.student_id == id))
            .fold((0, 0), |(a, t), record| {
                (a + record.classes_attended, t + record.total_classes)
            });
        let active = if iat.is_active { " (active)" } else { "" };
        if total == 0 {
            let _ = writeln!(
                output,
                "- {}{}: {} to {}, no attendance recorded",
                iat.iat_type, active, iat.start_date, iat.end_date
            );
        } else {
            let _ = writeln!(
                output,
                "- {}{}: {} to {}, {}% ({}/{} classes)",
                iat.iat_type,
                active,
                iat.start_date,
                iat.end_date,
                percentage(attended, total),
                attended,
                total
            );
        }
    }

    output
}

fn write_student_detail(
    output: &mut String,
    tracker: &Tracker,
    records: &[AttendanceRecord],
    student_id: &str,
    subject_id: Option<&str>,
) {
    let _ = writeln!(output);
    let Some(student) = tracker.student(student_id) else {
        let _ = writeln!(output, "## Student {}", student_id);
        let _ = writeln!(output, "No such student.");
        return;
    };

    let _ = writeln!(output, "## {} ({})", student.name, student.id);
    let _ = writeln!(
        output,
        "{}, {}, Section {}",
        student.department, student.year, student.section
    );
    let _ = writeln!(
        output,
        "Overall: {}%",
        summary::overall_percentage(records, &student.id, subject_id)
    );
    for enrolled in student
        .enrolled_subjects
        .iter()
        .filter(|id| subject_id.map_or(true, |scoped| id.as_str() == scoped))
    {
        let name = tracker
            .subject(enrolled)
            .map(|subject| subject.name.as_str())
            .unwrap_or("unknown subject");
        let _ = writeln!(
            output,
            "- {} ({}): {}%",
            name,
            enrolled,
            summary::overall_percentage(records, &student.id, Some(enrolled))
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tracker() -> Tracker {
        let mut rng = StdRng::seed_from_u64(5);
        Tracker::seeded(&mut rng, 20)
    }

    #[test]
    fn report_has_all_sections() {
        let report = build_report(&tracker(), &ReportScope::default(), 75);
        assert!(report.starts_with("# Attendance Report"));
        assert!(report.contains("Generated for all subjects across 20 students"));
        assert!(report.contains("## Below 75%"));
        assert!(report.contains("## Subject Averages"));
        assert!(report.contains("## Exam Windows"));
        assert!(report.contains("IAT 3 (active)"));
        assert!(report.contains("no attendance recorded"));
    }

    #[test]
    fn student_scope_adds_detail() {
        let tracker = tracker();
        let scope = ReportScope {
            student_id: Some("S001"),
            subject_id: None,
        };
        let report = build_report(&tracker, &scope, 75);
        let student = tracker.student("S001").unwrap();
        assert!(report.contains(&format!("## {} (S001)", student.name)));
        assert!(report.contains("Overall: "));
        assert!(report.contains("across 1 students"));
    }

    #[test]
    fn unknown_student_is_reported() {
        let scope = ReportScope {
            student_id: Some("S999"),
            subject_id: None,
        };
        let report = build_report(&tracker(), &scope, 75);
        assert!(report.contains("No such student."));
    }

    #[test]
    fn subject_scope_limits_averages() {
        let scope = ReportScope {
            student_id: None,
            subject_id: Some("SUB004"),
        };
        let report = build_report(&tracker(), &scope, 75);
        assert!(report.contains("Generated for Digital Electronics (SUB004)"));
        assert!(!report.contains("MERN Stack (SUB001"));
    }

    #[test]
    fn subject_scope_counts_enrolled_students_only() {
        let tracker = tracker();
        let enrolled: Vec<&str> = tracker
            .students()
            .iter()
            .filter(|s| s.enrolled_subjects.contains(&"SUB004".to_string()))
            .map(|s| s.id.as_str())
            .collect();
        let scope = ReportScope {
            student_id: None,
            subject_id: Some("SUB004"),
        };
        let report = build_report(&tracker, &scope, 100);
        assert!(report.contains(&format!(
            "Generated for Digital Electronics (SUB004) across {} students",
            enrolled.len()
        )));
        for student in tracker.students() {
            let listed = report.contains(&format!("({}, ", student.id));
            assert!(!listed || enrolled.contains(&student.id.as_str()));
        }
    }

    #[test]
    fn zero_threshold_flags_nobody() {
        let report = build_report(&tracker(), &ReportScope::default(), 0);
        assert!(report.contains("No students below the threshold."));
    }
}
