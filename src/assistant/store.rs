use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use futures::StreamExt;
use sqlx::pool::PoolConnection;
use sqlx::{MySql, MySqlPool};
use tracing::debug;

use crate::model::attendance::Arrival;
use crate::model::student::Student;

/// Read-only access to `students` and `attendance_log`.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Borrow one connection for the duration of a question.
    /// Dropping the session hands the connection back.
    async fn session(&self) -> Result<Box<dyn StoreSession>, sqlx::Error>;

    /// Every enrolled student, ordered by roll number.
    async fn roster(&self) -> Result<Vec<Student>, sqlx::Error>;

    async fn ping(&self) -> Result<(), sqlx::Error>;
}

/// Queries that run on a single borrowed connection.
#[async_trait]
pub trait StoreSession: Send {
    async fn present_names(&mut self, date: NaiveDate) -> Result<Vec<String>, sqlx::Error>;

    async fn absent_names(&mut self, date: NaiveDate) -> Result<Vec<String>, sqlx::Error>;

    async fn present_count(&mut self, date: NaiveDate) -> Result<i64, sqlx::Error>;

    async fn first_arrival(&mut self, date: NaiveDate) -> Result<Option<Arrival>, sqlx::Error>;

    async fn last_arrival(&mut self, date: NaiveDate) -> Result<Option<Arrival>, sqlx::Error>;

    /// Students whose first check-in is strictly after `after`, earliest first.
    async fn late_arrivals(
        &mut self,
        date: NaiveDate,
        after: NaiveTime,
    ) -> Result<Vec<Arrival>, sqlx::Error>;

    async fn was_present(&mut self, date: NaiveDate, roll_no: &str) -> Result<bool, sqlx::Error>;

    async fn roll_no_of(&mut self, student_name: &str) -> Result<Option<String>, sqlx::Error>;

    /// All students ordered by name.
    async fn all_students(&mut self) -> Result<Vec<Student>, sqlx::Error>;

    async fn student_count(&mut self) -> Result<i64, sqlx::Error>;
}

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn session(&self) -> Result<Box<dyn StoreSession>, sqlx::Error> {
        let conn = self.pool.acquire().await?;
        Ok(Box::new(MySqlSession { conn }))
    }

    async fn roster(&self) -> Result<Vec<Student>, sqlx::Error> {
        let mut stream = sqlx::query_as::<_, Student>(
            r#"
            SELECT roll_no, student_name
            FROM students
            ORDER BY roll_no ASC
            "#,
        )
        .fetch(&self.pool);

        let mut students = Vec::new();
        while let Some(row) = stream.next().await {
            students.push(row?);
        }

        debug!(count = students.len(), "Roster loaded");
        Ok(students)
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

struct MySqlSession {
    conn: PoolConnection<MySql>,
}

#[async_trait]
impl StoreSession for MySqlSession {
    async fn present_names(&mut self, date: NaiveDate) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT s.student_name
            FROM students s
            JOIN attendance_log al ON s.roll_no = al.student_roll_no
            WHERE al.attendance_date = ?
            GROUP BY s.roll_no, s.student_name
            ORDER BY s.student_name ASC
            "#,
        )
        .bind(date)
        .fetch_all(&mut *self.conn)
        .await
    }

    async fn absent_names(&mut self, date: NaiveDate) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT student_name
            FROM students
            WHERE roll_no NOT IN (
                SELECT student_roll_no FROM attendance_log WHERE attendance_date = ?
            )
            ORDER BY student_name ASC
            "#,
        )
        .bind(date)
        .fetch_all(&mut *self.conn)
        .await
    }

    async fn present_count(&mut self, date: NaiveDate) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT student_roll_no)
            FROM attendance_log
            WHERE attendance_date = ?
            "#,
        )
        .bind(date)
        .fetch_one(&mut *self.conn)
        .await
    }

    async fn first_arrival(&mut self, date: NaiveDate) -> Result<Option<Arrival>, sqlx::Error> {
        sqlx::query_as::<_, Arrival>(
            r#"
            SELECT s.student_name, al.in_time
            FROM students s
            JOIN attendance_log al ON s.roll_no = al.student_roll_no
            WHERE al.attendance_date = ?
            ORDER BY al.in_time ASC
            LIMIT 1
            "#,
        )
        .bind(date)
        .fetch_optional(&mut *self.conn)
        .await
    }

    async fn last_arrival(&mut self, date: NaiveDate) -> Result<Option<Arrival>, sqlx::Error> {
        // a second check-in on the same day is not an arrival
        sqlx::query_as::<_, Arrival>(
            r#"
            SELECT s.student_name, MIN(al.in_time) AS in_time
            FROM students s
            JOIN attendance_log al ON s.roll_no = al.student_roll_no
            WHERE al.attendance_date = ?
            GROUP BY s.roll_no, s.student_name
            ORDER BY MIN(al.in_time) DESC
            LIMIT 1
            "#,
        )
        .bind(date)
        .fetch_optional(&mut *self.conn)
        .await
    }

    async fn late_arrivals(
        &mut self,
        date: NaiveDate,
        after: NaiveTime,
    ) -> Result<Vec<Arrival>, sqlx::Error> {
        sqlx::query_as::<_, Arrival>(
            r#"
            SELECT s.student_name, MIN(al.in_time) AS in_time
            FROM students s
            JOIN attendance_log al ON s.roll_no = al.student_roll_no
            WHERE al.attendance_date = ?
            GROUP BY s.roll_no, s.student_name
            HAVING MIN(al.in_time) > ?
            ORDER BY MIN(al.in_time) ASC
            "#,
        )
        .bind(date)
        .bind(after)
        .fetch_all(&mut *self.conn)
        .await
    }

    async fn was_present(&mut self, date: NaiveDate, roll_no: &str) -> Result<bool, sqlx::Error> {
        let hits = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT CAST(EXISTS(
                SELECT 1 FROM attendance_log
                WHERE attendance_date = ? AND student_roll_no = ?
            ) AS SIGNED)
            "#,
        )
        .bind(date)
        .bind(roll_no)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(hits > 0)
    }

    async fn roll_no_of(&mut self, student_name: &str) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT roll_no FROM students WHERE student_name = ?")
            .bind(student_name)
            .fetch_optional(&mut *self.conn)
            .await
    }

    async fn all_students(&mut self) -> Result<Vec<Student>, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            "SELECT roll_no, student_name FROM students ORDER BY student_name ASC",
        )
        .fetch_all(&mut *self.conn)
        .await
    }

    async fn student_count(&mut self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(roll_no) FROM students")
            .fetch_one(&mut *self.conn)
            .await
    }
}
