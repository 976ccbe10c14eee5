use std::io::Write;

use anyhow::Context;
use serde::Serialize;

use crate::models::AttendanceRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Csv,
    Json,
}

/// Flat row so optional columns serialize as empty CSV cells.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    student_id: &'a str,
    subject_id: &'a str,
    session_id: &'a str,
    date: String,
    period: String,
    status: String,
    total_classes: u32,
    classes_attended: u32,
    percentage: u32,
}

impl<'a> From<&'a AttendanceRecord> for CsvRow<'a> {
    fn from(record: &'a AttendanceRecord) -> Self {
        let period = match (record.month, record.iat_type) {
            (Some(month), _) => month.to_string(),
            (None, Some(iat)) => iat.to_string(),
            (None, None) => String::new(),
        };
        Self {
            id: &record.id,
            student_id: &record.student_id,
            subject_id: &record.subject_id,
            session_id: record.session_id.as_deref().unwrap_or(""),
            date: record.date.to_string(),
            period,
            status: record.status.to_string(),
            total_classes: record.total_classes,
            classes_attended: record.classes_attended,
            percentage: record.percentage,
        }
    }
}

pub fn write_records<W: Write>(
    writer: W,
    records: &[AttendanceRecord],
    format: Format,
) -> anyhow::Result<usize> {
    match format {
        Format::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            for record in records {
                csv_writer
                    .serialize(CsvRow::from(record))
                    .context("failed to write CSV row")?;
            }
            csv_writer.flush()?;
        }
        Format::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, records).context("failed to write JSON")?;
            writeln!(writer)?;
        }
    }
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::{period_record, session_mark, Period};
    use crate::models::{AttendanceStatus, IatType, Month};
    use chrono::NaiveDate;

    fn records() -> Vec<AttendanceRecord> {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        vec![
            period_record("S001", "SUB001", Period::Monthly(Month::Mar), date, 20, 16),
            period_record("S001", "SUB001", Period::Exam(IatType::Iat1), date, 10, 4),
            session_mark(
                "MARK0001".into(),
                "S001",
                "SUB001",
                Some("SESS001"),
                date,
                AttendanceStatus::OnDuty,
            ),
        ]
    }

    #[test]
    fn csv_has_header_and_rows() {
        let mut buffer = Vec::new();
        let written = write_records(&mut buffer, &records(), Format::Csv).unwrap();
        assert_eq!(written, 3);
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "id,student_id,subject_id,session_id,date,period,status,\
             total_classes,classes_attended,percentage"
        );
        assert_eq!(lines[1], "ATT_S001_SUB001_Mar,S001,SUB001,,2024-03-15,Mar,Present,20,16,80");
        assert_eq!(lines[2], "IAT_S001_SUB001_IAT1,S001,SUB001,,2024-03-15,IAT 1,Absent,10,4,40");
        assert_eq!(lines[3], "MARK0001,S001,SUB001,SESS001,2024-03-15,,On Duty,1,1,100");
    }

    #[test]
    fn json_uses_display_labels() {
        let mut buffer = Vec::new();
        write_records(&mut buffer, &records(), Format::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 3);
        assert_eq!(parsed[1]["iat_type"], "IAT 1");
        assert_eq!(parsed[2]["status"], "On Duty");
        assert_eq!(parsed[0]["month"], "Mar");
    }

    #[test]
    fn writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monthly.csv");
        let file = std::fs::File::create(&path).unwrap();
        write_records(file, &records()[..1], Format::Csv).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("ATT_S001_SUB001_Mar"));
    }
}
