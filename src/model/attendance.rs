use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Student name joined with the time they came in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Arrival {
    pub student_name: String,
    pub in_time: NaiveTime,
}
