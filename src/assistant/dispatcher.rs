use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, error};

use crate::assistant::store::{AttendanceStore, StoreSession};
use crate::model::decision::{Decision, Tool};
use crate::model::student::Student;
use crate::utils::roster_cache::{RosterCache, find_student};

pub const QUERY_FAILED: &str = "Sorry, I encountered a problem trying to answer your question.";
pub const UNKNOWN_STUDENT: &str =
    "I couldn't identify a specific student in your question. Please try again.";

/// Runs the query behind a [`Decision`] and words the result.
pub struct Dispatcher {
    store: Arc<dyn AttendanceStore>,
    roster: RosterCache,
    late_after: NaiveTime,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn AttendanceStore>, roster: RosterCache, late_after: NaiveTime) -> Self {
        Self {
            store,
            roster,
            late_after,
        }
    }

    pub fn roster(&self) -> &RosterCache {
        &self.roster
    }

    pub fn store(&self) -> &dyn AttendanceStore {
        self.store.as_ref()
    }

    /// Answer for `decision`. Database failures are logged and replaced by
    /// [`QUERY_FAILED`]; this never returns an error.
    ///
    /// Day-based tools without a date use `today`.
    pub async fn answer(&self, decision: &Decision, question: &str, today: NaiveDate) -> String {
        if decision.tool == Tool::NonAttendance {
            return small_talk(question).to_string();
        }

        let date = match decision.date {
            Some(d) => d,
            None => {
                if decision.tool.needs_date() {
                    debug!(tool = %decision.tool, %today, "No date in decision, using today");
                }
                today
            }
        };

        match self.run(decision.tool, date, question).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, tool = %decision.tool, %date, "Query failed");
                QUERY_FAILED.to_string()
            }
        }
    }

    async fn run(&self, tool: Tool, date: NaiveDate, question: &str) -> Result<String> {
        let student = if tool.needs_student() {
            let roster = self.roster.get_or_load(self.store.as_ref()).await?;
            match find_student(&roster, question) {
                Some(s) => Some(s.clone()),
                None => return Ok(UNKNOWN_STUDENT.to_string()),
            }
        } else {
            None
        };

        // released on drop, whichever way this returns
        let mut session = self.store.session().await?;
        debug!(%tool, %date, "Running query");

        self.query(session.as_mut(), tool, date, student.as_ref())
            .await
    }

    async fn query(
        &self,
        session: &mut dyn StoreSession,
        tool: Tool,
        date: NaiveDate,
        student: Option<&Student>,
    ) -> Result<String> {
        let answer = match (tool, student) {
            (Tool::GetPresent, _) => {
                let names = session.present_names(date).await?;
                if names.is_empty() {
                    format!("No students were found present on {}.", date)
                } else {
                    format!(
                        "The following students were present on {}: {}",
                        date,
                        names.join(", ")
                    )
                }
            }

            (Tool::GetAbsent, _) => {
                let names = session.absent_names(date).await?;
                if names.is_empty() {
                    format!("No students were listed as absent on {}.", date)
                } else {
                    format!(
                        "The following students were absent on {}: {}",
                        date,
                        names.join(", ")
                    )
                }
            }

            (Tool::GetPresentCount, _) => {
                let count = session.present_count(date).await?;
                format!("There were a total of {} students present on {}.", count, date)
            }

            (Tool::GetFirstArrival, _) => match session.first_arrival(date).await? {
                Some(a) => format!(
                    "The first student to arrive on {} was {} at {}.",
                    date, a.student_name, a.in_time
                ),
                None => format!("No arrival times were found for {}.", date),
            },

            (Tool::GetLastArrival, _) => match session.last_arrival(date).await? {
                Some(a) => format!(
                    "The last student to arrive on {} was {} at {}.",
                    date, a.student_name, a.in_time
                ),
                None => format!("No arrival times were found for {}.", date),
            },

            (Tool::GetLateArrivals, _) => {
                let late = session.late_arrivals(date, self.late_after).await?;
                if late.is_empty() {
                    format!(
                        "No students were marked as late (after {}) on {}.",
                        self.late_after, date
                    )
                } else {
                    let late: Vec<String> = late
                        .iter()
                        .map(|a| format!("{} (at {})", a.student_name, a.in_time))
                        .collect();
                    format!(
                        "The following students were late on {}: {}.",
                        date,
                        late.join(", ")
                    )
                }
            }

            (Tool::GetSpecificStudentStatus, Some(s)) => {
                if session.was_present(date, &s.roll_no).await? {
                    format!("Yes, {} was present on {}.", s.student_name, date)
                } else {
                    format!("No, {} was not marked present on {}.", s.student_name, date)
                }
            }

            (Tool::GetStudentInfo, Some(s)) => match session.roll_no_of(&s.student_name).await? {
                Some(roll_no) => format!("The roll number for {} is {}.", s.student_name, roll_no),
                None => format!("I could not find a student named {}.", s.student_name),
            },

            (Tool::GetAllStudents, _) => {
                let students = session.all_students().await?;
                if students.is_empty() {
                    "There are no students enrolled in the system.".to_string()
                } else {
                    let list: Vec<String> = students
                        .iter()
                        .map(|s| format!("- {} (Roll No: {})", s.student_name, s.roll_no))
                        .collect();
                    format!(
                        "Here is the list of all enrolled students:\n{}",
                        list.join("\n")
                    )
                }
            }

            (Tool::GetTotalStudentCount, _) => {
                let count = session.student_count().await?;
                format!(
                    "There are a total of {} students enrolled in the system.",
                    count
                )
            }

            (Tool::GetSpecificStudentStatus | Tool::GetStudentInfo, None) => {
                UNKNOWN_STUDENT.to_string()
            }

            (Tool::NonAttendance, _) => unreachable!("non_attendance is answered before any query"),
        };

        Ok(answer)
    }
}

/// Canned replies for questions that are not about attendance.
pub fn small_talk(question: &str) -> &'static str {
    let q = question.to_lowercase();

    if q.contains("who made you") {
        "I am an AI assistant created by Google and fine-tuned for this attendance system by you!"
    } else if q.contains("who are you") {
        "I am an AI assistant designed to help you query the student attendance database."
    } else {
        "I'm sorry, I can only answer questions related to student attendance."
    }
}
