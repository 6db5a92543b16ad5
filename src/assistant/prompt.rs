use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const TODAY_PLACEHOLDER: &str = "{today_date}";

const DEFAULT_INSTRUCTIONS: &str = r#"You are a smart assistant for an attendance system. Your only job is to analyze the user's question and choose the correct "tool" to answer it.

You MUST respond with only two words, separated by a comma: "tool_name,date".
The "date" must be in 'YYYY-MM-DD' format. Use today's date if the user says "today". Use 'null' if no date is needed. Today's date is {today_date}.

--- AVAILABLE TOOLS ---
-- Attendance Log Tools (Daily data) --
- "get_present": For questions about who was present on a specific day.
- "get_absent": For questions about who was absent on a specific day.
- "get_present_count": For questions about the total count of students *present on a specific day*.
- "get_first_arrival": For questions about who arrived first on a specific day.
- "get_last_arrival": For questions about who arrived last on a specific day.
- "get_late_arrivals": For questions about who was "late" (after 09:00:00) on a specific day.
- "get_specific_student_status": For questions about a single student's *attendance status* (e.g., "Was Elon Musk present?").

-- Student Table Tools (Permanent data) --
- "get_student_info": For questions about one student's *permanent info* (e.g., "What is Bill Gates' roll number?").
- "get_all_students": For questions asking to *list all students* and their roll numbers.
- "get_total_student_count": For questions about the *total number of students enrolled* in the system.

-- Other Tools --
- "non_attendance": For any other question (e.g., "who are you?", "hello")."#;

/// One worked example shown to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptExample {
    pub question: String,
    pub response: String,
}

impl PromptExample {
    fn new(question: &str, response: &str) -> Self {
        Self {
            question: question.to_string(),
            response: response.to_string(),
        }
    }
}

/// Instruction block plus examples sent ahead of every question.
///
/// `{today_date}` in the instructions and in example responses is replaced
/// with the current date when the prompt is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub instructions: String,
    #[serde(default)]
    pub examples: Vec<PromptExample>,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            examples: vec![
                PromptExample::new("Who was present today?", "get_present,{today_date}"),
                PromptExample::new(
                    "Was Elon Musk present today?",
                    "get_specific_student_status,{today_date}",
                ),
                PromptExample::new("What is Bill Gates' roll number?", "get_student_info,null"),
                PromptExample::new("who came in first today?", "get_first_arrival,{today_date}"),
                PromptExample::new(
                    "Who was the last person entered today?",
                    "get_last_arrival,{today_date}",
                ),
                PromptExample::new("who are you?", "non_attendance,null"),
            ],
        }
    }
}

impl PromptTemplate {
    /// Read a template from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt template {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid prompt template {}", path.display()))
    }

    /// Full prompt for `question`, ending where the model should answer.
    pub fn render(&self, today: NaiveDate, question: &str) -> String {
        let today = today.format("%Y-%m-%d").to_string();

        let mut prompt = self.instructions.replace(TODAY_PLACEHOLDER, &today);

        if !self.examples.is_empty() {
            prompt.push_str("\n\n--- EXAMPLES ---");
            for ex in &self.examples {
                prompt.push_str(&format!(
                    "\nUser: \"{}\"\nResponse: {}\n",
                    ex.question,
                    ex.response.replace(TODAY_PLACEHOLDER, &today)
                ));
            }
        }

        prompt.push_str("\n\nUser: ");
        prompt.push_str(question);
        prompt.push_str("\nResponse:");
        prompt
    }
}
