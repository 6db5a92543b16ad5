use crate::api::assistant::AskRequest;
use crate::assistant::Answer;
use crate::model::decision::{Decision, Tool};
use crate::model::student::Student;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Assistant API",
        version = "0.1.0",
        description = r#"
## Attendance Assistant

Ask questions about student attendance in plain language.

Each question goes to a hosted language model, which picks one **tool**
(for example `get_absent`) and a date. The service runs the matching
read-only query against the attendance database and returns a formatted
answer together with the model's decision.

### Tools
- **Attendance log**: present, absent, present count, first / last arrival,
  late arrivals (after 09:00:00), one student's status
- **Students**: one student's roll number, all students, total count
- **Other**: `non_attendance` for anything else

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::assistant::ask,
        crate::api::assistant::refresh_roster,
        crate::api::assistant::health
    ),
    components(
        schemas(
            AskRequest,
            Answer,
            Decision,
            Tool,
            Student
        )
    ),
    tags(
        (name = "Assistant", description = "Natural-language attendance questions"),
        (name = "Health", description = "Service health"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn ask_response_references_answer_schema() {
        let doc: Value = serde_json::to_value(ApiDoc::openapi()).unwrap();

        let ok = &doc["paths"]["/api/ask"]["post"]["responses"]["200"];
        assert_eq!(
            ok["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/Answer"
        );
        assert!(doc["components"]["schemas"]["Answer"].is_object());

        let refresh = &doc["paths"]["/api/roster/refresh"]["post"]["responses"];
        assert!(refresh["429"].is_object());
    }
}
