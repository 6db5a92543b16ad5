use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Named operation the classifier may pick for a question.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tool {
    GetPresent,
    GetAbsent,
    GetPresentCount,
    GetFirstArrival,
    GetLastArrival,
    GetLateArrivals,
    GetSpecificStudentStatus,
    GetStudentInfo,
    GetAllStudents,
    GetTotalStudentCount,
    NonAttendance,
}

impl Tool {
    /// Tools that read `attendance_log` for a single day.
    pub fn needs_date(&self) -> bool {
        matches!(
            self,
            Tool::GetPresent
                | Tool::GetAbsent
                | Tool::GetPresentCount
                | Tool::GetFirstArrival
                | Tool::GetLastArrival
                | Tool::GetLateArrivals
                | Tool::GetSpecificStudentStatus
        )
    }

    /// Tools that need a student name pulled out of the question.
    pub fn needs_student(&self) -> bool {
        matches!(self, Tool::GetSpecificStudentStatus | Tool::GetStudentInfo)
    }
}

/// Tool plus optional date, produced fresh for every question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "tool": "get_present", "date": "2024-01-01" }))]
pub struct Decision {
    pub tool: Tool,

    #[schema(example = "2024-01-01", format = "date", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
}

impl Decision {
    pub fn new(tool: Tool, date: Option<NaiveDate>) -> Self {
        Self { tool, date }
    }

    /// What a failed or unreadable classification degrades to.
    pub fn fallback() -> Self {
        Self::new(Tool::NonAttendance, None)
    }
}
