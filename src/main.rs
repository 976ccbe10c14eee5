use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use attendance_tracker::config::{self, Config};
use attendance_tracker::models::{
    AttendanceRecord, AttendanceStatus, Department, IatType, Month, NewSession, NewStudent,
    NewSubject, Section, Student, Year,
};
use attendance_tracker::{attendance, export, report, Tracker, TrackerError};

#[derive(Parser)]
#[command(name = "attendance-tracker")]
#[command(
    about = "Student attendance tracker over a generated in-memory roster",
    long_about = None
)]
struct Cli {
    /// Seed for the generated data (overrides ATTENDANCE_SEED)
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Totals, today's marks and the active exam window
    Dashboard {
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// List and manage students
    Students {
        #[command(subcommand)]
        action: StudentCommand,
    },
    /// List and manage subjects
    Subjects {
        #[command(subcommand)]
        action: SubjectCommand,
    },
    /// Schedule class sessions
    Sessions {
        #[command(subcommand)]
        action: SessionCommand,
    },
    /// View period attendance or take a class register
    Attendance {
        #[command(subcommand)]
        action: AttendanceCommand,
    },
    /// Exam windows
    Iat {
        #[command(subcommand)]
        action: IatCommand,
    },
    /// Generate a markdown attendance report
    Report {
        #[arg(long)]
        student: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        /// Flag students under this percentage (0 to 100)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
        threshold: Option<u32>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Dump attendance records as CSV or JSON
    Export {
        #[arg(long, value_enum, default_value_t = RecordKind::Monthly)]
        kind: RecordKind,
        #[arg(long, value_enum, default_value_t = export::Format::Csv)]
        format: export::Format,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum StudentCommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        department: Option<Department>,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        department: Department,
        #[arg(long)]
        year: Year,
        #[arg(long)]
        section: Section,
        /// Subject ids; defaults to every subject of the department
        #[arg(long = "subject")]
        subjects: Vec<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        department: Option<Department>,
        #[arg(long)]
        year: Option<Year>,
        #[arg(long)]
        section: Option<Section>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum SubjectCommand {
    List {
        #[arg(long)]
        department: Option<Department>,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        department: Department,
    },
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        department: Option<Department>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum SessionCommand {
    List {
        #[arg(long)]
        department: Option<Department>,
    },
    Add {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        period: u8,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Edit {
        id: String,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        period: Option<u8>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum AttendanceCommand {
    Monthly {
        #[arg(long, default_value = "Jan")]
        month: Month,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    Iat {
        #[arg(long, default_value = "IAT 1")]
        iat: IatType,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Mark students for one class
    Take {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Schedule a session in this period and tie the marks to it
        #[arg(long)]
        period: Option<u8>,
        /// STUDENT=STATUS, e.g. S001=present
        #[arg(long = "mark", value_parser = parse_mark)]
        marks: Vec<(String, AttendanceStatus)>,
        /// Status for enrolled students not marked explicitly
        #[arg(long)]
        default_status: Option<AttendanceStatus>,
    },
}

#[derive(Subcommand)]
enum IatCommand {
    List,
    Activate {
        id: String,
    },
    Dates {
        id: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RecordKind {
    Monthly,
    Iat,
}

fn parse_mark(value: &str) -> Result<(String, AttendanceStatus), String> {
    let (student, status) = value
        .split_once('=')
        .ok_or_else(|| format!("expected STUDENT=STATUS, got {value}"))?;
    let status = status.parse::<AttendanceStatus>().map_err(|err| err.to_string())?;
    Ok((student.trim().to_string(), status))
}

fn init_logging(level: &str) {
    let env_filter =
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_LEVEL));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_logging(&config.log_level);

    let mut rng = match cli.seed.or(config.seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut tracker = Tracker::seeded(&mut rng, config.student_count);
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Dashboard { today: on } => print_dashboard(&tracker, on.unwrap_or(today)),
        Commands::Students { action } => run_students(&mut tracker, action)?,
        Commands::Subjects { action } => run_subjects(&mut tracker, action)?,
        Commands::Sessions { action } => run_sessions(&mut tracker, action)?,
        Commands::Attendance { action } => run_attendance(&mut tracker, action)?,
        Commands::Iat { action } => run_iat(&mut tracker, action)?,
        Commands::Report {
            student,
            subject,
            threshold,
            out,
        } => {
            let scope = report::ReportScope {
                student_id: student.as_deref(),
                subject_id: subject.as_deref(),
            };
            let threshold = threshold.unwrap_or(config.threshold);
            let output = report::build_report(&tracker, &scope, threshold);
            match out {
                Some(path) => {
                    std::fs::write(&path, output)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Report written to {}.", path.display());
                }
                None => print!("{output}"),
            }
        }
        Commands::Export { kind, format, out } => {
            let records = match kind {
                RecordKind::Monthly => tracker.monthly_records(),
                RecordKind::Iat => tracker.iat_records(),
            };
            match out {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    let written = export::write_records(file, records, format)?;
                    println!("Exported {written} records to {}.", path.display());
                }
                None => {
                    export::write_records(std::io::stdout().lock(), records, format)?;
                }
            }
        }
    }

    tracing::info!("command complete");
    Ok(())
}

fn print_dashboard(tracker: &Tracker, today: NaiveDate) {
    let stats = tracker.dashboard(today);
    println!("Students: {}", stats.total_students);
    println!("Subjects: {}", stats.total_subjects);
    println!("Sessions: {}", stats.total_sessions);
    println!(
        "Today ({today}): {} present, {} absent, {} on duty",
        stats.today.present, stats.today.absent, stats.today.on_duty
    );
    match stats.active_iat {
        Some(iat) => println!(
            "Active exam window: {} ({} to {})",
            iat.iat_type, iat.start_date, iat.end_date
        ),
        None => println!("No active exam window."),
    }
}

fn print_student(student: &Student) {
    println!(
        "- {} {} ({}, {}, Section {}) subjects: {}",
        student.id,
        student.name,
        student.department,
        student.year,
        student.section,
        student.enrolled_subjects.join(", ")
    );
}

fn run_students(tracker: &mut Tracker, action: StudentCommand) -> anyhow::Result<()> {
    match action {
        StudentCommand::List { search, department } => {
            let students = tracker.filter_students(&search, department);
            if students.is_empty() {
                println!("No students found.");
                return Ok(());
            }
            println!("Total students: {}", students.len());
            for student in students {
                print_student(student);
            }
        }
        StudentCommand::Add {
            name,
            department,
            year,
            section,
            subjects,
        } => {
            let id = tracker.add_student(NewStudent {
                name,
                department,
                year,
                section,
                enrolled_subjects: subjects,
            })?;
            if let Some(student) = tracker.student(&id) {
                println!("Student added:");
                print_student(student);
            }
        }
        StudentCommand::Edit {
            id,
            name,
            department,
            year,
            section,
        } => {
            let current = tracker
                .student(&id)
                .cloned()
                .ok_or_else(|| TrackerError::UnknownStudent(id.clone()))?;
            let department_changed = department.is_some_and(|dept| dept != current.department);
            tracker.update_student(
                &id,
                NewStudent {
                    name: name.unwrap_or(current.name),
                    department: department.unwrap_or(current.department),
                    year: year.unwrap_or(current.year),
                    section: section.unwrap_or(current.section),
                    enrolled_subjects: if department_changed {
                        Vec::new()
                    } else {
                        current.enrolled_subjects
                    },
                },
            )?;
            if let Some(student) = tracker.student(&id) {
                println!("Student updated:");
                print_student(student);
            }
        }
        StudentCommand::Delete { id } => {
            if tracker.delete_student(&id) {
                println!("Deleted {id}; {} students remain.", tracker.students().len());
            } else {
                println!("No student with id {id}.");
            }
        }
    }
    Ok(())
}

fn run_subjects(tracker: &mut Tracker, action: SubjectCommand) -> anyhow::Result<()> {
    match action {
        SubjectCommand::List { department } => {
            let subjects = tracker.filter_subjects(department);
            if subjects.is_empty() {
                println!("No subjects found.");
                return Ok(());
            }
            println!("Total subjects: {}", subjects.len());
            for subject in subjects {
                println!(
                    "- {} {} ({}) {} sessions",
                    subject.id, subject.name, subject.department, subject.total_sessions
                );
            }
        }
        SubjectCommand::Add { name, department } => {
            let id = tracker.add_subject(NewSubject { name, department })?;
            println!("Subject {id} added.");
        }
        SubjectCommand::Edit {
            id,
            name,
            department,
        } => {
            let current = tracker
                .subject(&id)
                .cloned()
                .ok_or_else(|| TrackerError::UnknownSubject(id.clone()))?;
            tracker.update_subject(
                &id,
                NewSubject {
                    name: name.unwrap_or(current.name),
                    department: department.unwrap_or(current.department),
                },
            )?;
            println!("Subject {id} updated.");
        }
        SubjectCommand::Delete { id } => {
            if tracker.delete_subject(&id) {
                println!("Deleted {id}; {} subjects remain.", tracker.subjects().len());
            } else {
                println!("No subject with id {id}.");
            }
        }
    }
    Ok(())
}

fn print_sessions(tracker: &Tracker, department: Option<Department>) {
    let sessions = tracker.filter_sessions(department);
    if sessions.is_empty() {
        println!("No sessions scheduled.");
        return;
    }
    println!("Total sessions: {}", sessions.len());
    for session in sessions {
        let subject = tracker
            .subject(&session.subject_id)
            .map(|subject| format!("{} ({})", subject.name, subject.department))
            .unwrap_or_else(|| session.subject_id.clone());
        println!(
            "- {} {} on {}, period {}: {}",
            session.id, session.name, session.date, session.period, subject
        );
    }
}

fn run_sessions(tracker: &mut Tracker, action: SessionCommand) -> anyhow::Result<()> {
    match action {
        SessionCommand::List { department } => print_sessions(tracker, department),
        SessionCommand::Add {
            subject,
            name,
            period,
            date,
        } => {
            let id = tracker.add_session(NewSession {
                subject_id: subject,
                name,
                period,
                date,
            })?;
            println!("Session {id} added.");
            print_sessions(tracker, None);
        }
        SessionCommand::Edit {
            id,
            subject,
            name,
            period,
            date,
        } => {
            let current = tracker
                .session(&id)
                .cloned()
                .ok_or_else(|| TrackerError::UnknownSession(id.clone()))?;
            tracker.update_session(
                &id,
                NewSession {
                    subject_id: subject.unwrap_or(current.subject_id),
                    name: name.unwrap_or(current.name),
                    period: period.unwrap_or(current.period),
                    date: date.or(Some(current.date)),
                },
            )?;
            print_sessions(tracker, None);
        }
        SessionCommand::Delete { id } => {
            if tracker.delete_session(&id) {
                println!("Deleted {id}.");
            } else {
                println!("No session with id {id}.");
            }
        }
    }
    Ok(())
}

fn print_records(tracker: &Tracker, records: &[&AttendanceRecord], limit: usize) {
    if records.is_empty() {
        println!("No attendance recorded for this period.");
        return;
    }
    for record in records.iter().take(limit) {
        let (name, department) = tracker
            .student(&record.student_id)
            .map(|student| (student.name.as_str(), student.department.as_str()))
            .unwrap_or(("unknown", "-"));
        println!(
            "- {} {} ({}) {}: {}% ({}/{}) {}",
            record.student_id,
            name,
            department,
            record.subject_id,
            record.percentage,
            record.classes_attended,
            record.total_classes,
            record.status
        );
    }
    if records.len() > limit {
        println!("... {} more", records.len() - limit);
    }
}

fn run_attendance(tracker: &mut Tracker, action: AttendanceCommand) -> anyhow::Result<()> {
    match action {
        AttendanceCommand::Monthly { month, limit } => {
            let records = attendance::for_month(tracker.monthly_records(), month);
            println!("{month}: {} records", records.len());
            print_records(tracker, &records, limit);
        }
        AttendanceCommand::Iat { iat, limit } => {
            let records = attendance::for_iat(tracker.iat_records(), iat);
            println!("{iat}: {} records", records.len());
            print_records(tracker, &records, limit);
        }
        AttendanceCommand::Take {
            subject,
            date,
            period,
            marks,
            default_status,
        } => {
            let mut register: Vec<(String, AttendanceStatus)> = Vec::new();
            if let Some(status) = default_status {
                for student in tracker.students() {
                    let explicit = marks.iter().any(|(id, _)| *id == student.id);
                    if student.enrolled_subjects.contains(&subject) && !explicit {
                        register.push((student.id.clone(), status));
                    }
                }
            }
            register.extend(marks);

            let taken = match period {
                Some(period) => {
                    let (session_id, taken) =
                        tracker.take_attendance_in_period(&subject, period, date, &register)?;
                    println!("Scheduled {session_id} in period {period}.");
                    taken
                }
                None => tracker.take_attendance(&subject, None, date, &register)?,
            };
            if let Some(date) = date {
                println!("Recorded {taken} marks for {subject} on {date}.");
                print_dashboard(tracker, date);
            }
        }
    }
    Ok(())
}

fn run_iat(tracker: &mut Tracker, action: IatCommand) -> anyhow::Result<()> {
    match &action {
        IatCommand::List => {}
        IatCommand::Activate { id } => tracker.activate_iat(id)?,
        IatCommand::Dates { id, start, end } => tracker.update_iat_dates(id, *start, *end)?,
    }
    for iat in tracker.iat_calendar() {
        let marker = if iat.is_active { " (active)" } else { "" };
        println!(
            "- {} {}{}: {} to {}",
            iat.id, iat.iat_type, marker, iat.start_date, iat.end_date
        );
    }
    Ok(())
}
