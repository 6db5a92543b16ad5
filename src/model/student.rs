use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Enrolled student, read from the `students` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Student {
    #[schema(example = "CS-101")]
    pub roll_no: String,

    #[schema(example = "ELON MUSK")]
    pub student_name: String,
}

impl Student {
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn new(roll_no: impl Into<String>, student_name: impl Into<String>) -> Self {
        Self {
            roll_no: roll_no.into(),
            student_name: student_name.into(),
        }
    }
}
