/// Result type for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Validation failures surfaced to the user. None of these are fatal.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("unknown student: {0}")]
    UnknownStudent(String),

    #[error("unknown subject: {0}")]
    UnknownSubject(String),

    #[error("unknown session: {0}")]
    UnknownSession(String),

    #[error("student {student_id} is not enrolled in {subject_id}")]
    NotEnrolled {
        student_id: String,
        subject_id: String,
    },

    #[error("student {0} is marked more than once")]
    DuplicateMark(String),

    #[error("unknown IAT record: {0}")]
    UnknownIat(String),

    #[error("period must be between 1 and 8, got {0}")]
    PeriodOutOfRange(u8),

    #[error("subject {subject_id} belongs to {subject_department}, not {student_department}")]
    DepartmentMismatch {
        subject_id: String,
        subject_department: String,
        student_department: String,
    },

    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("invalid {kind}: {value}")]
    Parse { kind: &'static str, value: String },
}
