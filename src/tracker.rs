use std::collections::HashSet;

use chrono::NaiveDate;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::attendance;
use crate::error::{TrackerError, TrackerResult};
use crate::models::{
    AttendanceRecord, AttendanceStatus, DailyCounts, DashboardStats, Department, IatRecord,
    NewSession, NewStudent, NewSubject, Session, Student, Subject,
};
use crate::roster::Registry;
use crate::seed;

/// In-memory state for one run: every collection plus the rules that span
/// more than one of them.
#[derive(Debug, Clone)]
pub struct Tracker {
    students: Registry<Student>,
    subjects: Registry<Subject>,
    sessions: Registry<Session>,
    marks: Registry<AttendanceRecord>,
    monthly: Vec<AttendanceRecord>,
    exams: Vec<AttendanceRecord>,
    iat_calendar: Vec<IatRecord>,
}

impl Default for Tracker {
    fn default() -> Self {
        Self {
            students: Registry::new("S", 3),
            subjects: Registry::new("SUB", 3),
            sessions: Registry::new("SESS", 3),
            marks: Registry::new("MARK", 4),
            monthly: Vec::new(),
            exams: Vec::new(),
            iat_calendar: Vec::new(),
        }
    }
}

impl Tracker {
    /// Fresh mock dataset: the subject catalogue, `student_count` students
    /// (capped by the name pool), their generated history and the IAT calendar.
    pub fn seeded<R: Rng>(rng: &mut R, student_count: usize) -> Self {
        let subjects = seed::subjects();
        let students = seed::students(rng, student_count, &subjects);
        let monthly = seed::monthly_attendance(rng, &students);
        let exams = seed::iat_attendance(rng, &students);

        info!(
            students = students.len(),
            subjects = subjects.len(),
            monthly_records = monthly.len(),
            iat_records = exams.len(),
            "seeded attendance data"
        );

        Self {
            students: Registry::with_items("S", 3, students),
            subjects: Registry::with_items("SUB", 3, subjects),
            monthly,
            exams,
            iat_calendar: seed::iat_calendar(),
            ..Self::default()
        }
    }

    pub fn students(&self) -> &[Student] {
        self.students.as_slice()
    }

    pub fn subjects(&self) -> &[Subject] {
        self.subjects.as_slice()
    }

    pub fn sessions(&self) -> &[Session] {
        self.sessions.as_slice()
    }

    pub fn monthly_records(&self) -> &[AttendanceRecord] {
        &self.monthly
    }

    pub fn iat_records(&self) -> &[AttendanceRecord] {
        &self.exams
    }

    /// Hand-taken single-class marks.
    pub fn session_marks(&self) -> &[AttendanceRecord] {
        self.marks.as_slice()
    }

    pub fn iat_calendar(&self) -> &[IatRecord] {
        &self.iat_calendar
    }

    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.get(id)
    }

    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.get(id)
    }

    pub fn session(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Records that feed overall percentages: monthly history plus taken
    /// marks. Exam windows overlap the months and are reported on their own.
    pub fn reportable_records(&self) -> Vec<AttendanceRecord> {
        self.monthly
            .iter()
            .chain(self.marks.iter())
            .cloned()
            .collect()
    }

    /// Case-insensitive substring match on name or id, optionally limited to
    /// one department.
    pub fn filter_students(&self, search: &str, department: Option<Department>) -> Vec<&Student> {
        let needle = search.trim().to_lowercase();
        self.students
            .iter()
            .filter(|student| {
                needle.is_empty()
                    || student.name.to_lowercase().contains(&needle)
                    || student.id.to_lowercase().contains(&needle)
            })
            .filter(|student| department.map_or(true, |dept| student.department == dept))
            .collect()
    }

    pub fn filter_subjects(&self, department: Option<Department>) -> Vec<&Subject> {
        self.subjects
            .iter()
            .filter(|subject| department.map_or(true, |dept| subject.department == dept))
            .collect()
    }

    pub fn filter_sessions(&self, department: Option<Department>) -> Vec<&Session> {
        self.sessions
            .iter()
            .filter(|session| match department {
                None => true,
                Some(dept) => self
                    .subjects
                    .get(&session.subject_id)
                    .is_some_and(|subject| subject.department == dept),
            })
            .collect()
    }

    pub fn add_student(&mut self, input: NewStudent) -> TrackerResult<String> {
        let id = self.students.next_id();
        let student = self.build_student(id.clone(), input)?;
        debug!(student_id = %id, name = %student.name, "student added");
        self.students.push(student);
        Ok(id)
    }

    pub fn update_student(&mut self, id: &str, input: NewStudent) -> TrackerResult<()> {
        if !self.students.contains(id) {
            return Err(TrackerError::UnknownStudent(id.to_string()));
        }
        let student = self.build_student(id.to_string(), input)?;
        self.students.replace(student);
        debug!(student_id = %id, "student updated");
        Ok(())
    }

    /// Removes the student and their attendance. False when the id is unknown.
    pub fn delete_student(&mut self, id: &str) -> bool {
        if self.students.remove(id).is_none() {
            warn!(student_id = %id, "delete ignored, no such student");
            return false;
        }
        self.monthly.retain(|record| record.student_id != id);
        self.exams.retain(|record| record.student_id != id);
        self.marks.retain(|record| record.student_id != id);
        debug!(student_id = %id, "student deleted");
        true
    }

    fn build_student(&self, id: String, input: NewStudent) -> TrackerResult<Student> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(TrackerError::MissingField("name"));
        }

        let enrolled_subjects = if input.enrolled_subjects.is_empty() {
            seed::department_subjects(self.subjects.as_slice(), input.department)
        } else {
            for subject_id in &input.enrolled_subjects {
                let subject = self
                    .subjects
                    .get(subject_id)
                    .ok_or_else(|| TrackerError::UnknownSubject(subject_id.clone()))?;
                if subject.department != input.department {
                    return Err(TrackerError::DepartmentMismatch {
                        subject_id: subject_id.clone(),
                        subject_department: subject.department.to_string(),
                        student_department: input.department.to_string(),
                    });
                }
            }
            let mut unique: Vec<String> = Vec::with_capacity(input.enrolled_subjects.len());
            for subject_id in input.enrolled_subjects {
                if !unique.contains(&subject_id) {
                    unique.push(subject_id);
                }
            }
            unique
        };

        Ok(Student {
            id,
            name: name.to_string(),
            department: input.department,
            year: input.year,
            section: input.section,
            enrolled_subjects,
        })
    }

    pub fn add_subject(&mut self, input: NewSubject) -> TrackerResult<String> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(TrackerError::MissingField("name"));
        }
        let id = self.subjects.next_id();
        self.subjects.push(Subject {
            id: id.clone(),
            name: name.to_string(),
            department: input.department,
            total_sessions: 0,
        });
        debug!(subject_id = %id, "subject added");
        Ok(id)
    }

    /// Renames or moves a subject. Moving it to another department enrols
    /// that department's students and drops everyone else, along with the
    /// attendance they had for it.
    pub fn update_subject(&mut self, id: &str, input: NewSubject) -> TrackerResult<()> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(TrackerError::MissingField("name"));
        }
        let subject = self
            .subjects
            .get_mut(id)
            .ok_or_else(|| TrackerError::UnknownSubject(id.to_string()))?;
        let moved = subject.department != input.department;
        subject.name = name.to_string();
        subject.department = input.department;

        if moved {
            for student in self.students.iter_mut() {
                let enrolled = student.enrolled_subjects.iter().any(|s| s == id);
                if student.department == input.department {
                    if !enrolled {
                        student.enrolled_subjects.push(id.to_string());
                    }
                } else if enrolled {
                    student.enrolled_subjects.retain(|subject_id| subject_id != id);
                }
            }
            let students = &self.students;
            let keep = |record: &AttendanceRecord| {
                record.subject_id != id
                    || students
                        .get(&record.student_id)
                        .is_some_and(|s| s.enrolled_subjects.iter().any(|e| e == id))
            };
            self.monthly.retain(|record| keep(record));
            self.exams.retain(|record| keep(record));
            self.marks.retain(|record| keep(record));
            info!(subject_id = %id, department = %input.department, "subject moved");
        }
        debug!(subject_id = %id, "subject updated");
        Ok(())
    }

    /// Removes the subject, its sessions, its enrolments and its attendance.
    pub fn delete_subject(&mut self, id: &str) -> bool {
        if self.subjects.remove(id).is_none() {
            warn!(subject_id = %id, "delete ignored, no such subject");
            return false;
        }
        self.sessions.retain(|session| session.subject_id != id);
        for student in self.students.iter_mut() {
            student.enrolled_subjects.retain(|subject_id| subject_id != id);
        }
        self.monthly.retain(|record| record.subject_id != id);
        self.exams.retain(|record| record.subject_id != id);
        self.marks.retain(|record| record.subject_id != id);
        debug!(subject_id = %id, "subject deleted");
        true
    }

    pub fn add_session(&mut self, input: NewSession) -> TrackerResult<String> {
        let id = self.sessions.next_id();
        let session = self.build_session(id.clone(), input)?;
        self.adjust_session_count(&session.subject_id, 1);
        debug!(session_id = %id, subject_id = %session.subject_id, "session added");
        self.sessions.push(session);
        Ok(id)
    }

    pub fn update_session(&mut self, id: &str, input: NewSession) -> TrackerResult<()> {
        let previous_subject = self
            .sessions
            .get(id)
            .map(|session| session.subject_id.clone())
            .ok_or_else(|| TrackerError::UnknownSession(id.to_string()))?;
        let session = self.build_session(id.to_string(), input)?;
        if session.subject_id != previous_subject {
            self.adjust_session_count(&previous_subject, -1);
            self.adjust_session_count(&session.subject_id, 1);
        }
        self.sessions.replace(session);
        debug!(session_id = %id, "session updated");
        Ok(())
    }

    /// Marks taken against the session are kept but lose the link.
    pub fn delete_session(&mut self, id: &str) -> bool {
        let Some(session) = self.sessions.remove(id) else {
            warn!(session_id = %id, "delete ignored, no such session");
            return false;
        };
        self.adjust_session_count(&session.subject_id, -1);
        for mark in self.marks.iter_mut() {
            if mark.session_id.as_deref() == Some(id) {
                mark.session_id = None;
            }
        }
        debug!(session_id = %id, "session deleted");
        true
    }

    fn build_session(&self, id: String, input: NewSession) -> TrackerResult<Session> {
        if input.subject_id.trim().is_empty() {
            return Err(TrackerError::MissingField("subject"));
        }
        let name = input.name.trim();
        if name.is_empty() {
            return Err(TrackerError::MissingField("session name"));
        }
        if input.period == 0 {
            return Err(TrackerError::MissingField("period"));
        }
        if input.period > 8 {
            return Err(TrackerError::PeriodOutOfRange(input.period));
        }
        let date = input.date.ok_or(TrackerError::MissingField("date"))?;
        if !self.subjects.contains(&input.subject_id) {
            return Err(TrackerError::UnknownSubject(input.subject_id));
        }

        Ok(Session {
            id,
            subject_id: input.subject_id,
            name: name.to_string(),
            period: input.period,
            date,
        })
    }

    fn adjust_session_count(&mut self, subject_id: &str, delta: i32) {
        if let Some(subject) = self.subjects.get_mut(subject_id) {
            subject.total_sessions = subject.total_sessions.saturating_add_signed(delta);
        }
    }

    /// Records one mark per student for a subject on a date, optionally tied
    /// to a scheduled session. Nothing is recorded unless every mark is valid.
    pub fn take_attendance(
        &mut self,
        subject_id: &str,
        session_id: Option<&str>,
        date: Option<NaiveDate>,
        marks: &[(String, AttendanceStatus)],
    ) -> TrackerResult<usize> {
        let date = date.ok_or(TrackerError::MissingField("date"))?;
        self.check_register(subject_id, marks)?;
        if let Some(session_id) = session_id {
            let session = self
                .sessions
                .get(session_id)
                .ok_or_else(|| TrackerError::UnknownSession(session_id.to_string()))?;
            if session.subject_id != subject_id {
                return Err(TrackerError::UnknownSession(session_id.to_string()));
            }
        }
        Ok(self.record_marks(subject_id, session_id, date, marks))
    }

    /// Schedules a "Period N" session and takes the register against it.
    /// The session is only created once the register has been checked.
    pub fn take_attendance_in_period(
        &mut self,
        subject_id: &str,
        period: u8,
        date: Option<NaiveDate>,
        marks: &[(String, AttendanceStatus)],
    ) -> TrackerResult<(String, usize)> {
        let date = date.ok_or(TrackerError::MissingField("date"))?;
        self.check_register(subject_id, marks)?;
        let session = self.build_session(
            self.sessions.next_id(),
            NewSession {
                subject_id: subject_id.to_string(),
                name: format!("Period {period}"),
                period,
                date: Some(date),
            },
        )?;

        let session_id = session.id.clone();
        self.adjust_session_count(subject_id, 1);
        self.sessions.push(session);
        debug!(%session_id, subject_id, "session added");
        let taken = self.record_marks(subject_id, Some(&session_id), date, marks);
        Ok((session_id, taken))
    }

    /// Each student at most once, and only students enrolled in the subject.
    fn check_register(
        &self,
        subject_id: &str,
        marks: &[(String, AttendanceStatus)],
    ) -> TrackerResult<()> {
        if !self.subjects.contains(subject_id) {
            return Err(TrackerError::UnknownSubject(subject_id.to_string()));
        }
        if marks.is_empty() {
            return Err(TrackerError::MissingField("marks"));
        }
        let mut seen = HashSet::new();
        for (student_id, _) in marks {
            let student = self
                .students
                .get(student_id)
                .ok_or_else(|| TrackerError::UnknownStudent(student_id.clone()))?;
            if !student.enrolled_subjects.iter().any(|s| s == subject_id) {
                return Err(TrackerError::NotEnrolled {
                    student_id: student_id.clone(),
                    subject_id: subject_id.to_string(),
                });
            }
            if !seen.insert(student_id.as_str()) {
                return Err(TrackerError::DuplicateMark(student_id.clone()));
            }
        }
        Ok(())
    }

    fn record_marks(
        &mut self,
        subject_id: &str,
        session_id: Option<&str>,
        date: NaiveDate,
        marks: &[(String, AttendanceStatus)],
    ) -> usize {
        for (student_id, status) in marks {
            let id = self.marks.next_id();
            let mark =
                attendance::session_mark(id, student_id, subject_id, session_id, date, *status);
            self.marks.push(mark);
        }
        debug!(subject_id, %date, count = marks.len(), "attendance taken");
        marks.len()
    }

    /// Makes `id` the only active exam window.
    pub fn activate_iat(&mut self, id: &str) -> TrackerResult<()> {
        if !self.iat_calendar.iter().any(|iat| iat.id == id) {
            return Err(TrackerError::UnknownIat(id.to_string()));
        }
        for iat in &mut self.iat_calendar {
            iat.is_active = iat.id == id;
        }
        debug!(iat_id = %id, "IAT activated");
        Ok(())
    }

    pub fn update_iat_dates(
        &mut self,
        id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> TrackerResult<()> {
        if start_date > end_date {
            return Err(TrackerError::InvalidDateRange {
                start: start_date.to_string(),
                end: end_date.to_string(),
            });
        }
        let iat = self
            .iat_calendar
            .iter_mut()
            .find(|iat| iat.id == id)
            .ok_or_else(|| TrackerError::UnknownIat(id.to_string()))?;
        iat.start_date = start_date;
        iat.end_date = end_date;
        debug!(iat_id = %id, %start_date, %end_date, "IAT dates updated");
        Ok(())
    }

    pub fn active_iat(&self) -> Option<&IatRecord> {
        self.iat_calendar.iter().find(|iat| iat.is_active)
    }

    pub fn dashboard(&self, today: NaiveDate) -> DashboardStats {
        let mut counts = DailyCounts::default();
        for mark in attendance::on_date(self.marks.as_slice(), today) {
            match mark.status {
                AttendanceStatus::Present => counts.present += 1,
                AttendanceStatus::Absent => counts.absent += 1,
                AttendanceStatus::OnDuty => counts.on_duty += 1,
            }
        }

        DashboardStats {
            total_students: self.students.len(),
            total_subjects: self.subjects.len(),
            total_sessions: self.sessions.len(),
            today: counts,
            active_iat: self.active_iat().cloned(),
        }
    }
}
