//! In-memory doubles for the store and the model endpoint.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use crate::assistant::llm::TextGenerator;
use crate::assistant::store::{AttendanceStore, StoreSession};
use crate::model::attendance::Arrival;
use crate::model::student::Student;

/// One check-in row of `attendance_log`.
#[derive(Debug, Clone)]
pub struct AttendanceRecord {
    pub student_roll_no: String,
    pub attendance_date: NaiveDate,
    pub in_time: NaiveTime,
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M:%S").unwrap()
}

pub fn record(roll_no: &str, day: &str, at: &str) -> AttendanceRecord {
    AttendanceRecord {
        student_roll_no: roll_no.to_string(),
        attendance_date: date(day),
        in_time: time(at),
    }
}

struct Inner {
    students: Vec<Student>,
    records: Vec<AttendanceRecord>,
    fail: AtomicBool,
    roster_loads: AtomicUsize,
    sessions_opened: AtomicUsize,
    open_sessions: AtomicUsize,
}

impl Inner {
    fn check(&self) -> Result<(), sqlx::Error> {
        if self.fail.load(Ordering::SeqCst) {
            Err(sqlx::Error::Protocol("simulated failure".into()))
        } else {
            Ok(())
        }
    }

    fn name_of(&self, roll_no: &str) -> Option<&str> {
        self.students
            .iter()
            .find(|s| s.roll_no == roll_no)
            .map(|s| s.student_name.as_str())
    }

    /// Earliest check-in per student on `day`.
    fn first_check_ins(&self, day: NaiveDate) -> Vec<Arrival> {
        let mut earliest: BTreeMap<&str, NaiveTime> = BTreeMap::new();
        for r in self.records.iter().filter(|r| r.attendance_date == day) {
            earliest
                .entry(r.student_roll_no.as_str())
                .and_modify(|t| *t = (*t).min(r.in_time))
                .or_insert(r.in_time);
        }

        let mut arrivals: Vec<Arrival> = earliest
            .into_iter()
            .filter_map(|(roll_no, in_time)| {
                self.name_of(roll_no).map(|name| Arrival {
                    student_name: name.to_string(),
                    in_time,
                })
            })
            .collect();
        arrivals.sort_by_key(|a| a.in_time);
        arrivals
    }
}

/// Store backed by vectors, with counters for loads and open sessions.
#[derive(Clone)]
pub struct FakeStore {
    inner: Arc<Inner>,
}

impl FakeStore {
    pub fn new(students: Vec<Student>, records: Vec<AttendanceRecord>) -> Self {
        Self {
            inner: Arc::new(Inner {
                students,
                records,
                fail: AtomicBool::new(false),
                roster_loads: AtomicUsize::new(0),
                sessions_opened: AtomicUsize::new(0),
                open_sessions: AtomicUsize::new(0),
            }),
        }
    }

    /// Make every query (but not session acquisition) fail.
    pub fn fail_queries(&self, fail: bool) {
        self.inner.fail.store(fail, Ordering::SeqCst);
    }

    pub fn roster_loads(&self) -> usize {
        self.inner.roster_loads.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> usize {
        self.inner.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn open_sessions(&self) -> usize {
        self.inner.open_sessions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttendanceStore for FakeStore {
    async fn session(&self) -> Result<Box<dyn StoreSession>, sqlx::Error> {
        self.inner.sessions_opened.fetch_add(1, Ordering::SeqCst);
        self.inner.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            inner: self.inner.clone(),
        }))
    }

    async fn roster(&self) -> Result<Vec<Student>, sqlx::Error> {
        self.inner.check()?;
        self.inner.roster_loads.fetch_add(1, Ordering::SeqCst);
        let mut students = self.inner.students.clone();
        students.sort_by(|a, b| a.roll_no.cmp(&b.roll_no));
        Ok(students)
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        self.inner.check()
    }
}

struct FakeSession {
    inner: Arc<Inner>,
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.inner.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StoreSession for FakeSession {
    async fn present_names(&mut self, date: NaiveDate) -> Result<Vec<String>, sqlx::Error> {
        self.inner.check()?;
        let mut names: Vec<String> = self
            .inner
            .first_check_ins(date)
            .into_iter()
            .map(|a| a.student_name)
            .collect();
        names.sort();
        Ok(names)
    }

    async fn absent_names(&mut self, date: NaiveDate) -> Result<Vec<String>, sqlx::Error> {
        self.inner.check()?;
        let mut names: Vec<String> = self
            .inner
            .students
            .iter()
            .filter(|s| {
                !self
                    .inner
                    .records
                    .iter()
                    .any(|r| r.attendance_date == date && r.student_roll_no == s.roll_no)
            })
            .map(|s| s.student_name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn present_count(&mut self, date: NaiveDate) -> Result<i64, sqlx::Error> {
        self.inner.check()?;
        Ok(self.inner.first_check_ins(date).len() as i64)
    }

    async fn first_arrival(&mut self, date: NaiveDate) -> Result<Option<Arrival>, sqlx::Error> {
        self.inner.check()?;
        Ok(self.inner.first_check_ins(date).into_iter().next())
    }

    async fn last_arrival(&mut self, date: NaiveDate) -> Result<Option<Arrival>, sqlx::Error> {
        self.inner.check()?;
        Ok(self.inner.first_check_ins(date).into_iter().last())
    }

    async fn late_arrivals(
        &mut self,
        date: NaiveDate,
        after: NaiveTime,
    ) -> Result<Vec<Arrival>, sqlx::Error> {
        self.inner.check()?;
        Ok(self
            .inner
            .first_check_ins(date)
            .into_iter()
            .filter(|a| a.in_time > after)
            .collect())
    }

    async fn was_present(&mut self, date: NaiveDate, roll_no: &str) -> Result<bool, sqlx::Error> {
        self.inner.check()?;
        Ok(self
            .inner
            .records
            .iter()
            .any(|r| r.attendance_date == date && r.student_roll_no == roll_no))
    }

    async fn roll_no_of(&mut self, student_name: &str) -> Result<Option<String>, sqlx::Error> {
        self.inner.check()?;
        Ok(self
            .inner
            .students
            .iter()
            .find(|s| s.student_name == student_name)
            .map(|s| s.roll_no.clone()))
    }

    async fn all_students(&mut self) -> Result<Vec<Student>, sqlx::Error> {
        self.inner.check()?;
        let mut students = self.inner.students.clone();
        students.sort_by(|a, b| a.student_name.cmp(&b.student_name));
        Ok(students)
    }

    async fn student_count(&mut self) -> Result<i64, sqlx::Error> {
        self.inner.check()?;
        Ok(self.inner.students.len() as i64)
    }
}

/// Model double that replays canned replies and records the prompts it saw.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn replying(replies: &[&str]) -> Self {
        let generator = Self::default();
        for r in replies {
            generator.push_reply(r);
        }
        generator
    }

    pub fn push_reply(&self, reply: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(reply.to_string()));
    }

    pub fn push_error(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted reply left")),
        }
    }
}
