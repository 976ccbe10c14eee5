use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::attendance::{period_record, Period};
use crate::models::{
    AttendanceRecord, Department, IatRecord, IatType, Month, Section, Student, Subject, Year,
};

pub const SEED_YEAR: i32 = 2024;

pub const STUDENT_NAMES: [&str; 60] = [
    "Aadhya Sharma", "Aarav Patel", "Abhinav Kumar", "Aditi Singh", "Aditya Gupta",
    "Akash Reddy", "Akshara Nair", "Amit Verma", "Ananya Iyer", "Ankit Joshi",
    "Anushka Rao", "Arjun Mehta", "Arya Pandey", "Bhavya Agarwal", "Chaitanya Das",
    "Deepika Malhotra", "Dev Kapoor", "Diya Mishra", "Gaurav Chauhan", "Harsh Sinha",
    "Ishaan Tiwari", "Isha Bansal", "Kabir Saxena", "Kavya Jain", "Kiran Bhat",
    "Krish Kulkarni", "Lakshmi Pillai", "Manish Goyal", "Maya Desai", "Mohit Shah",
    "Naina Varma", "Naman Shukla", "Navya Ghosh", "Neha Arora", "Neil Khanna",
    "Nikita Roy", "Nikhil Dutta", "Pooja Bhardwaj", "Pranav Mittal", "Priya Choudhury",
    "Rahul Thakur", "Ravi Prasad", "Rhea Sood", "Rishi Ahluwalia", "Rohan Sethi",
    "Sachin Yadav", "Sahil Aggarwal", "Shreya Khurana", "Shubham Bajaj", "Sneha Wadhwa",
    "Tanvi Bose", "Tarun Mallik", "Tisha Chopra", "Varun Srivastava", "Vedika Kohli",
    "Vikram Pandya", "Vinay Sharma", "Yash Gupta", "Zara Khan", "Zoya Merchant",
];

/// Exam windows that carry generated attendance. IAT 3 is the open window
/// and has none yet.
pub const GENERATED_EXAMS: [IatType; 2] = [IatType::Iat1, IatType::Iat2];

pub(crate) fn seed_date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(SEED_YEAR, month, day).unwrap_or_default()
}

pub fn subjects() -> Vec<Subject> {
    [
        ("SUB001", "MERN Stack", Department::Cse),
        ("SUB002", "MCA", Department::It),
        ("SUB003", "Data Structures", Department::Cse),
        ("SUB004", "Digital Electronics", Department::Ece),
        ("SUB005", "Machine Design", Department::Mech),
        ("SUB006", "Structural Analysis", Department::Civil),
    ]
    .into_iter()
    .map(|(id, name, department)| Subject {
        id: id.to_string(),
        name: name.to_string(),
        department,
        total_sessions: 0,
    })
    .collect()
}

pub fn department_subjects(subjects: &[Subject], department: Department) -> Vec<String> {
    subjects
        .iter()
        .filter(|subject| subject.department == department)
        .map(|subject| subject.id.clone())
        .collect()
}

/// Random cohort placement for each name, enrolled in every subject of
/// the drawn department.
pub fn students<R: Rng>(rng: &mut R, count: usize, subjects: &[Subject]) -> Vec<Student> {
    STUDENT_NAMES
        .iter()
        .take(count)
        .enumerate()
        .map(|(index, name)| {
            let department = *Department::ALL.choose(rng).unwrap_or(&Department::Cse);
            let year = *Year::ALL.choose(rng).unwrap_or(&Year::First);
            let section = *Section::ALL.choose(rng).unwrap_or(&Section::A);
            Student {
                id: format!("S{:03}", index + 1),
                name: name.to_string(),
                department,
                year,
                section,
                enrolled_subjects: department_subjects(subjects, department),
            }
        })
        .collect()
}

/// Six months of history per enrolment: 18 to 25 classes a month with at
/// least half attended.
pub fn monthly_attendance<R: Rng>(rng: &mut R, students: &[Student]) -> Vec<AttendanceRecord> {
    let mut records = Vec::new();
    for student in students {
        for subject_id in &student.enrolled_subjects {
            for month in Month::ALL {
                let total_classes = rng.gen_range(18..=25);
                let classes_attended = rng.gen_range(total_classes / 2..=total_classes);
                records.push(period_record(
                    &student.id,
                    subject_id,
                    Period::Monthly(month),
                    seed_date(month.number(), 15),
                    total_classes,
                    classes_attended,
                ));
            }
        }
    }
    records
}

/// Exam-window history per enrolment: 8 to 12 classes, between two and
/// all-but-one attended.
pub fn iat_attendance<R: Rng>(rng: &mut R, students: &[Student]) -> Vec<AttendanceRecord> {
    let mut records = Vec::new();
    for student in students {
        for subject_id in &student.enrolled_subjects {
            for iat in GENERATED_EXAMS {
                let total_classes = rng.gen_range(8..=12);
                let classes_attended = rng.gen_range(2..total_classes);
                let month = if iat == IatType::Iat1 { 3 } else { 4 };
                records.push(period_record(
                    &student.id,
                    subject_id,
                    Period::Exam(iat),
                    seed_date(month, 15),
                    total_classes,
                    classes_attended,
                ));
            }
        }
    }
    records
}

pub fn iat_calendar() -> Vec<IatRecord> {
    vec![
        IatRecord {
            id: "IAT_REC_1".to_string(),
            iat_type: IatType::Iat1,
            start_date: seed_date(2, 25),
            end_date: seed_date(3, 31),
            is_active: false,
        },
        IatRecord {
            id: "IAT_REC_2".to_string(),
            iat_type: IatType::Iat2,
            start_date: seed_date(4, 1),
            end_date: seed_date(4, 30),
            is_active: false,
        },
        IatRecord {
            id: "IAT_REC_3".to_string(),
            iat_type: IatType::Iat3,
            start_date: seed_date(5, 1),
            end_date: seed_date(5, 31),
            is_active: true,
        },
    ]
}
