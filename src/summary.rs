use std::collections::{HashMap, HashSet};

use crate::attendance::percentage;
use crate::models::{
    AttendanceRecord, AttendanceStatus, Student, StudentSummary, Subject, SubjectSummary,
};

/// Overall attendance for a student, optionally limited to one subject.
/// Sums attended and held classes across every matching record; 0 when
/// nothing matches.
pub fn overall_percentage(
    records: &[AttendanceRecord],
    student_id: &str,
    subject_id: Option<&str>,
) -> u32 {
    let (attended, total) = totals(
        records
            .iter()
            .filter(|record| record.student_id == student_id)
            .filter(|record| subject_id.map_or(true, |id| record.subject_id == id)),
    );
    percentage(attended, total)
}

fn totals<'a>(records: impl Iterator<Item = &'a AttendanceRecord>) -> (u32, u32) {
    records.fold((0, 0), |(attended, total), record| {
        (attended + record.classes_attended, total + record.total_classes)
    })
}

/// One summary per student, lowest attendance first.
pub fn summarize_students(
    students: &[Student],
    records: &[AttendanceRecord],
    subject_id: Option<&str>,
) -> Vec<StudentSummary> {
    let mut by_student: HashMap<&str, (u32, u32)> = HashMap::new();
    for record in records {
        if subject_id.is_some_and(|id| record.subject_id != id) {
            continue;
        }
        let entry = by_student.entry(record.student_id.as_str()).or_insert((0, 0));
        entry.0 += record.classes_attended;
        entry.1 += record.total_classes;
    }

    let mut summaries: Vec<StudentSummary> = students
        .iter()
        .map(|student| {
            let (classes_attended, total_classes) =
                by_student.get(student.id.as_str()).copied().unwrap_or((0, 0));
            let percentage = percentage(classes_attended, total_classes);
            StudentSummary {
                student_id: student.id.clone(),
                student_name: student.name.clone(),
                department: student.department,
                classes_attended,
                total_classes,
                percentage,
                status: AttendanceStatus::from_percentage(percentage),
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        a.percentage
            .cmp(&b.percentage)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
    summaries
}

/// Students with recorded classes whose overall percentage is under `threshold`.
pub fn below_threshold(summaries: &[StudentSummary], threshold: u32) -> Vec<&StudentSummary> {
    summaries
        .iter()
        .filter(|summary| summary.total_classes > 0 && summary.percentage < threshold)
        .collect()
}

/// Class-wide attendance per subject, in catalogue order.
pub fn summarize_subjects(
    subjects: &[Subject],
    records: &[AttendanceRecord],
) -> Vec<SubjectSummary> {
    subjects
        .iter()
        .map(|subject| {
            let matching: Vec<&AttendanceRecord> = records
                .iter()
                .filter(|record| record.subject_id == subject.id)
                .collect();
            let student_count = matching
                .iter()
                .map(|record| record.student_id.as_str())
                .collect::<HashSet<_>>()
                .len();
            let (attended, total) = totals(matching.into_iter());
            SubjectSummary {
                subject_id: subject.id.clone(),
                subject_name: subject.name.clone(),
                department: subject.department,
                student_count,
                percentage: percentage(attended, total),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::{period_record, Period};
    use crate::models::{Department, Month, Section, Year};
    use chrono::NaiveDate;

    fn record(
        student_id: &str,
        subject_id: &str,
        month: Month,
        total: u32,
        attended: u32,
    ) -> AttendanceRecord {
        let date = NaiveDate::from_ymd_opt(2024, month.number(), 15).unwrap();
        period_record(student_id, subject_id, Period::Monthly(month), date, total, attended)
    }

    fn student(id: &str, name: &str) -> Student {
        Student {
            id: id.to_string(),
            name: name.to_string(),
            department: Department::Cse,
            year: Year::First,
            section: Section::A,
            enrolled_subjects: vec!["SUB001".to_string(), "SUB003".to_string()],
        }
    }

    fn subject(id: &str, name: &str) -> Subject {
        Subject {
            id: id.to_string(),
            name: name.to_string(),
            department: Department::Cse,
            total_sessions: 0,
        }
    }

    #[test]
    fn zero_records_yield_zero() {
        assert_eq!(overall_percentage(&[], "S001", None), 0);
        let records = vec![record("S002", "SUB001", Month::Jan, 20, 20)];
        assert_eq!(overall_percentage(&records, "S001", None), 0);
    }

    #[test]
    fn overall_sums_before_dividing() {
        let records = vec![
            record("S001", "SUB001", Month::Jan, 20, 10),
            record("S001", "SUB001", Month::Feb, 25, 25),
            record("S001", "SUB003", Month::Jan, 18, 9),
        ];
        // (10 + 25 + 9) / (20 + 25 + 18) = 44 / 63
        assert_eq!(overall_percentage(&records, "S001", None), 70);
        // (10 + 25) / (20 + 25) = 35 / 45
        assert_eq!(overall_percentage(&records, "S001", Some("SUB001")), 78);
        assert_eq!(overall_percentage(&records, "S001", Some("SUB002")), 0);
    }

    #[test]
    fn summaries_sort_lowest_first_and_flag_threshold() {
        let students = vec![
            student("S001", "Aadhya Sharma"),
            student("S002", "Aarav Patel"),
            student("S003", "Abhinav Kumar"),
        ];
        let records = vec![
            record("S001", "SUB001", Month::Jan, 20, 19),
            record("S002", "SUB001", Month::Jan, 20, 11),
        ];
        let summaries = summarize_students(&students, &records, None);
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].student_id, "S003");
        assert_eq!(summaries[0].percentage, 0);
        assert_eq!(summaries[1].student_id, "S002");
        assert_eq!(summaries[1].status, AttendanceStatus::OnDuty);
        assert_eq!(summaries[2].status, AttendanceStatus::Present);

        let flagged = below_threshold(&summaries, 75);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].student_id, "S002");
    }

    #[test]
    fn subject_summaries_count_distinct_students() {
        let subjects = vec![
            subject("SUB001", "MERN Stack"),
            subject("SUB003", "Data Structures"),
        ];
        let records = vec![
            record("S001", "SUB001", Month::Jan, 20, 20),
            record("S001", "SUB001", Month::Feb, 20, 10),
            record("S002", "SUB001", Month::Jan, 20, 15),
        ];
        let summaries = summarize_subjects(&subjects, &records);
        assert_eq!(summaries[0].student_count, 2);
        assert_eq!(summaries[0].percentage, 75);
        assert_eq!(summaries[1].student_count, 0);
        assert_eq!(summaries[1].percentage, 0);
    }
}
