use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "CSE")]
    Cse,
    #[serde(rename = "ECE")]
    Ece,
    #[serde(rename = "MECH")]
    Mech,
    #[serde(rename = "IT")]
    It,
    #[serde(rename = "CIVIL")]
    Civil,
}

impl Department {
    pub const ALL: [Department; 5] = [
        Department::Cse,
        Department::Ece,
        Department::Mech,
        Department::It,
        Department::Civil,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Department::Cse => "CSE",
            Department::Ece => "ECE",
            Department::Mech => "MECH",
            Department::It => "IT",
            Department::Civil => "CIVIL",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Department::ALL
            .into_iter()
            .find(|dept| dept.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| TrackerError::Parse {
                kind: "department",
                value: value.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Year {
    #[serde(rename = "1st Year")]
    First,
    #[serde(rename = "2nd Year")]
    Second,
    #[serde(rename = "3rd Year")]
    Third,
}

impl Year {
    pub const ALL: [Year; 3] = [Year::First, Year::Second, Year::Third];

    pub fn as_str(self) -> &'static str {
        match self {
            Year::First => "1st Year",
            Year::Second => "2nd Year",
            Year::Third => "3rd Year",
        }
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Year {
    type Err = TrackerError;

    /// Accepts "1", "1st" or "1st Year".
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let leading = normalized.trim_end_matches(" year");
        match leading {
            "1" | "1st" => Ok(Year::First),
            "2" | "2nd" => Ok(Year::Second),
            "3" | "3rd" => Ok(Year::Third),
            _ => Err(TrackerError::Parse {
                kind: "year",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
    A,
    B,
    C,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::A, Section::B, Section::C];
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Section::A => "A",
            Section::B => "B",
            Section::C => "C",
        };
        f.write_str(label)
    }
}

impl FromStr for Section {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Section::A),
            "B" => Ok(Section::B),
            "C" => Ok(Section::C),
            _ => Err(TrackerError::Parse {
                kind: "section",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
    #[serde(rename = "On Duty")]
    OnDuty,
}

impl AttendanceStatus {
    /// Band for a rounded percentage: 75 and above is Present, 50 and above is On Duty.
    pub fn from_percentage(percentage: u32) -> Self {
        if percentage >= 75 {
            AttendanceStatus::Present
        } else if percentage >= 50 {
            AttendanceStatus::OnDuty
        } else {
            AttendanceStatus::Absent
        }
    }

    /// On Duty counts as attended when a single class is marked.
    pub fn counts_as_attended(self) -> bool {
        !matches!(self, AttendanceStatus::Absent)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::OnDuty => "On Duty",
        };
        f.write_str(label)
    }
}

impl FromStr for AttendanceStatus {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let compact: String = value
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match compact.as_str() {
            "present" | "p" => Ok(AttendanceStatus::Present),
            "absent" | "a" => Ok(AttendanceStatus::Absent),
            "onduty" | "od" => Ok(AttendanceStatus::OnDuty),
            _ => Err(TrackerError::Parse {
                kind: "status",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IatType {
    #[serde(rename = "IAT 1")]
    Iat1,
    #[serde(rename = "IAT 2")]
    Iat2,
    #[serde(rename = "IAT 3")]
    Iat3,
}

impl IatType {
    pub const ALL: [IatType; 3] = [IatType::Iat1, IatType::Iat2, IatType::Iat3];

    pub fn number(self) -> u8 {
        match self {
            IatType::Iat1 => 1,
            IatType::Iat2 => 2,
            IatType::Iat3 => 3,
        }
    }
}

impl fmt::Display for IatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IAT {}", self.number())
    }
}

impl FromStr for IatType {
    type Err = TrackerError;

    /// Accepts "IAT 1", "iat1" or a bare "1".
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let compact: String = value
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match compact.trim_start_matches("iat") {
            "1" => Ok(IatType::Iat1),
            "2" => Ok(IatType::Iat2),
            "3" => Ok(IatType::Iat3),
            _ => Err(TrackerError::Parse {
                kind: "IAT",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
}

impl Month {
    pub const ALL: [Month; 6] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
    ];

    /// Calendar month, 1-based.
    pub fn number(self) -> u32 {
        match self {
            Month::Jan => 1,
            Month::Feb => 2,
            Month::Mar => 3,
            Month::Apr => 4,
            Month::May => 5,
            Month::Jun => 6,
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Month::Jan => "Jan",
            Month::Feb => "Feb",
            Month::Mar => "Mar",
            Month::Apr => "Apr",
            Month::May => "May",
            Month::Jun => "Jun",
        };
        f.write_str(label)
    }
}

impl FromStr for Month {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        const FULL: [&str; 6] = ["january", "february", "march", "april", "may", "june"];
        let normalized = value.trim().to_ascii_lowercase();
        Month::ALL
            .into_iter()
            .zip(FULL)
            .find(|(month, full)| {
                normalized == month.to_string().to_ascii_lowercase() || normalized == *full
            })
            .map(|(month, _)| month)
            .ok_or_else(|| TrackerError::Parse {
                kind: "month",
                value: value.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub department: Department,
    pub year: Year,
    pub section: Section,
    pub enrolled_subjects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub department: Department,
    pub total_sessions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub subject_id: String,
    pub name: String,
    pub period: u8,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub student_id: String,
    pub session_id: Option<String>,
    pub subject_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub month: Option<Month>,
    pub iat_type: Option<IatType>,
    pub total_classes: u32,
    pub classes_attended: u32,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IatRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub iat_type: IatType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
}

/// Field values for a new or edited student.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub department: Department,
    pub year: Year,
    pub section: Section,
    /// Empty means every subject of the department.
    pub enrolled_subjects: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewSubject {
    pub name: String,
    pub department: Department,
}

/// Session form values. `date` is optional so that a missing date is
/// reported as a validation error rather than a parse failure.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub subject_id: String,
    pub name: String,
    pub period: u8,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct StudentSummary {
    pub student_id: String,
    pub student_name: String,
    pub department: Department,
    pub classes_attended: u32,
    pub total_classes: u32,
    pub percentage: u32,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone)]
pub struct SubjectSummary {
    pub subject_id: String,
    pub subject_name: String,
    pub department: Department,
    pub student_count: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyCounts {
    pub present: usize,
    pub absent: usize,
    pub on_duty: usize,
}

#[derive(Debug, Clone)]
pub struct DashboardStats {
    pub total_students: usize,
    pub total_subjects: usize,
    pub total_sessions: usize,
    pub today: DailyCounts,
    pub active_iat: Option<IatRecord>,
}
