//! Question answering: classify the question with the model, then run the
//! matching attendance query.

pub mod classifier;
pub mod dispatcher;
pub mod llm;
pub mod prompt;
pub mod store;

#[cfg(test)]
pub mod test_utils;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::model::decision::Decision;
use classifier::IntentClassifier;
use dispatcher::Dispatcher;

#[derive(Debug, Serialize, ToSchema)]
pub struct Answer {
    pub decision: Decision,
    #[schema(example = "The following students were present on 2024-01-01: ALICE, BOB")]
    pub answer: String,
}

pub struct Assistant {
    classifier: IntentClassifier,
    dispatcher: Dispatcher,
}

impl Assistant {
    pub fn new(classifier: IntentClassifier, dispatcher: Dispatcher) -> Self {
        Self {
            classifier,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub async fn ask(&self, question: &str) -> Answer {
        self.ask_on(question, Local::now().date_naive()).await
    }

    /// Answer `question` as if today were `today`.
    #[instrument(name = "assistant_ask", skip(self, question))]
    pub async fn ask_on(&self, question: &str, today: NaiveDate) -> Answer {
        let decision = self.classifier.classify(question, today).await;
        info!(tool = %decision.tool, date = ?decision.date, "AI decision");

        let answer = self.dispatcher.answer(&decision, question, today).await;
        Answer { decision, answer }
    }
}
