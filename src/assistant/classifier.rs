use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::assistant::llm::TextGenerator;
use crate::assistant::prompt::PromptTemplate;
use crate::model::decision::{Decision, Tool};

/// Why a model reply could not be turned into a [`Decision`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReplyError {
    #[error("reply is not of the form tool,date")]
    MissingComma,
    #[error("unknown tool {0:?}")]
    UnknownTool(String),
    #[error("invalid date {0:?}")]
    BadDate(String),
}

/// Parse a `tool_name,date_or_null` reply.
pub fn parse_reply(reply: &str) -> Result<Decision, ReplyError> {
    let reply = reply.trim().trim_matches(|c: char| c == '`' || c == '"').trim();

    let (tool, date) = reply.split_once(',').ok_or(ReplyError::MissingComma)?;

    let tool = tool.trim();
    let tool = Tool::from_str(tool).map_err(|_| ReplyError::UnknownTool(tool.to_string()))?;

    let date = match date.trim() {
        "null" => None,
        d => Some(
            NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .map_err(|_| ReplyError::BadDate(d.to_string()))?,
        ),
    };

    Ok(Decision::new(tool, date))
}

/// Asks the model which tool answers a question.
pub struct IntentClassifier {
    llm: Arc<dyn TextGenerator>,
    template: PromptTemplate,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn TextGenerator>, template: PromptTemplate) -> Self {
        Self { llm, template }
    }

    /// Never fails: any transport or parse problem yields
    /// [`Decision::fallback`].
    pub async fn classify(&self, question: &str, today: NaiveDate) -> Decision {
        let prompt = self.template.render(today, question);

        let reply = match self.llm.generate(&prompt).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Model call failed, falling back to non_attendance");
                return Decision::fallback();
            }
        };

        debug!(reply = %reply.trim(), "Model reply");

        parse_reply(&reply).unwrap_or_else(|e| {
            warn!(error = %e, reply = %reply.trim(), "Unreadable model reply, falling back to non_attendance");
            Decision::fallback()
        })
    }
}
