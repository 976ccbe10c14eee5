use chrono::NaiveDate;

use crate::models::{AttendanceRecord, AttendanceStatus, IatType, Month};

/// Rounded share of attended classes; 0 when nothing was held.
pub fn percentage(classes_attended: u32, total_classes: u32) -> u32 {
    if total_classes == 0 {
        return 0;
    }
    ((classes_attended as f64 / total_classes as f64) * 100.0).round() as u32
}

/// Which reporting window a generated record covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Monthly(Month),
    Exam(IatType),
}

/// Builds an aggregated record for one student and subject over a period.
/// Status is derived from the percentage band.
pub fn period_record(
    student_id: &str,
    subject_id: &str,
    period: Period,
    date: NaiveDate,
    total_classes: u32,
    classes_attended: u32,
) -> AttendanceRecord {
    let classes_attended = classes_attended.min(total_classes);
    let percentage = percentage(classes_attended, total_classes);
    let (id, month, iat_type) = match period {
        Period::Monthly(month) => (
            format!("ATT_{student_id}_{subject_id}_{month}"),
            Some(month),
            None,
        ),
        Period::Exam(iat) => (
            format!("IAT_{student_id}_{subject_id}_IAT{}", iat.number()),
            None,
            Some(iat),
        ),
    };

    AttendanceRecord {
        id,
        student_id: student_id.to_string(),
        session_id: None,
        subject_id: subject_id.to_string(),
        date,
        status: AttendanceStatus::from_percentage(percentage),
        month,
        iat_type,
        total_classes,
        classes_attended,
        percentage,
    }
}

/// A single-class mark taken by hand. The status is whatever was chosen.
pub fn session_mark(
    id: String,
    student_id: &str,
    subject_id: &str,
    session_id: Option<&str>,
    date: NaiveDate,
    status: AttendanceStatus,
) -> AttendanceRecord {
    let classes_attended = u32::from(status.counts_as_attended());
    AttendanceRecord {
        id,
        student_id: student_id.to_string(),
        session_id: session_id.map(str::to_string),
        subject_id: subject_id.to_string(),
        date,
        status,
        month: None,
        iat_type: None,
        total_classes: 1,
        classes_attended,
        percentage: percentage(classes_attended, 1),
    }
}

pub fn for_month(records: &[AttendanceRecord], month: Month) -> Vec<&AttendanceRecord> {
    records
        .iter()
        .filter(|record| record.month == Some(month))
        .collect()
}

pub fn for_iat(records: &[AttendanceRecord], iat: IatType) -> Vec<&AttendanceRecord> {
    records
        .iter()
        .filter(|record| record.iat_type == Some(iat))
        .collect()
}

pub fn on_date(records: &[AttendanceRecord], date: NaiveDate) -> Vec<&AttendanceRecord> {
    records.iter().filter(|record| record.date == date).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(9, 12), 75);
        assert_eq!(percentage(0, 20), 0);
        assert_eq!(percentage(5, 0), 0);
    }

    #[test]
    fn period_record_derives_status_and_ids() {
        let feb = Period::Monthly(Month::Feb);
        let monthly = period_record("S001", "SUB001", feb, date(2, 15), 20, 14);
        assert_eq!(monthly.id, "ATT_S001_SUB001_Feb");
        assert_eq!(monthly.percentage, 70);
        assert_eq!(monthly.status, AttendanceStatus::OnDuty);
        assert_eq!(monthly.month, Some(Month::Feb));
        assert!(monthly.iat_type.is_none());

        let exam = period_record("S001", "SUB001", Period::Exam(IatType::Iat2), date(4, 15), 10, 3);
        assert_eq!(exam.id, "IAT_S001_SUB001_IAT2");
        assert_eq!(exam.status, AttendanceStatus::Absent);
        assert_eq!(exam.iat_type, Some(IatType::Iat2));
    }

    #[test]
    fn period_record_clamps_attended_to_total() {
        let jan = Period::Monthly(Month::Jan);
        let record = period_record("S001", "SUB001", jan, date(1, 15), 18, 30);
        assert_eq!(record.classes_attended, 18);
        assert_eq!(record.percentage, 100);
    }

    #[test]
    fn session_mark_keeps_chosen_status() {
        let on_duty = session_mark(
            "MARK0001".into(),
            "S002",
            "SUB003",
            Some("SESS001"),
            date(5, 2),
            AttendanceStatus::OnDuty,
        );
        assert_eq!(on_duty.status, AttendanceStatus::OnDuty);
        assert_eq!(on_duty.classes_attended, 1);
        assert_eq!(on_duty.percentage, 100);

        let absent = session_mark(
            "MARK0002".into(),
            "S002",
            "SUB003",
            None,
            date(5, 2),
            AttendanceStatus::Absent,
        );
        assert_eq!(absent.classes_attended, 0);
        assert_eq!(absent.percentage, 0);
        assert!(absent.session_id.is_none());
    }

    #[test]
    fn filters_select_matching_period() {
        let records = vec![
            period_record("S001", "SUB001", Period::Monthly(Month::Jan), date(1, 15), 20, 20),
            period_record("S001", "SUB001", Period::Monthly(Month::Feb), date(2, 15), 20, 10),
            period_record("S001", "SUB001", Period::Exam(IatType::Iat1), date(3, 15), 10, 9),
        ];
        assert_eq!(for_month(&records, Month::Jan).len(), 1);
        assert_eq!(for_iat(&records, IatType::Iat1).len(), 1);
        assert!(for_iat(&records, IatType::Iat3).is_empty());
        assert_eq!(on_date(&records, date(2, 15)).len(), 1);
    }
}
