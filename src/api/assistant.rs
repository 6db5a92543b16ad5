use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use crate::assistant::Assistant;

#[derive(Deserialize, ToSchema)]
pub struct AskRequest {
    #[schema(example = "Who was absent today?")]
    pub question: String,
}

/// Ask a question about attendance
#[utoipa::path(
    post,
    path = "/api/ask",
    request_body = AskRequest,
    responses(
        (status = 200, description = "Answer with the tool the model picked", body = crate::assistant::Answer),
        (status = 400, description = "Empty question", body = Object, example = json!({
            "message": "Please enter a question."
        })),
        (status = 429, description = "Too many requests")
    ),
    tag = "Assistant"
)]
#[instrument(name = "api_ask", skip(assistant, payload))]
pub async fn ask(
    assistant: web::Data<Assistant>,
    payload: web::Json<AskRequest>,
) -> impl Responder {
    let question = payload.question.trim();

    if question.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "message": "Please enter a question."
        }));
    }

    let answer = assistant.ask(question).await;
    HttpResponse::Ok().json(answer)
}

/// Drop the cached roster so the next name lookup reloads it
#[utoipa::path(
    post,
    path = "/api/roster/refresh",
    responses(
        (status = 200, description = "Roster cache cleared", body = Object, example = json!({
            "message": "Roster cache invalidated"
        })),
        (status = 429, description = "Too many requests")
    ),
    tag = "Assistant"
)]
pub async fn refresh_roster(assistant: web::Data<Assistant>) -> impl Responder {
    assistant.dispatcher().roster().invalidate().await;
    info!("Roster cache invalidated");

    HttpResponse::Ok().json(json!({
        "message": "Roster cache invalidated"
    }))
}

/// Database connectivity check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Database reachable", body = Object, example = json!({
            "database": "connected"
        })),
        (status = 503, description = "Database unreachable", body = Object, example = json!({
            "database": "unavailable"
        }))
    ),
    tag = "Health"
)]
pub async fn health(assistant: web::Data<Assistant>) -> impl Responder {
    match assistant.dispatcher().store().ping().await {
        Ok(()) => HttpResponse::Ok().json(json!({ "database": "connected" })),
        Err(e) => {
            error!(error = %e, "Health check failed");
            HttpResponse::ServiceUnavailable().json(json!({ "database": "unavailable" }))
        }
    }
}
