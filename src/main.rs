use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use std::sync::Arc;

mod api;
mod assistant;
mod config;
mod db;
mod docs;
mod model;
mod routes;
mod utils;

use assistant::Assistant;
use assistant::classifier::IntentClassifier;
use assistant::dispatcher::Dispatcher;
use assistant::llm::ChatCompletionClient;
use assistant::prompt::PromptTemplate;
use assistant::store::MySqlStore;
use config::Config;
use db::init_db;
use utils::roster_cache::RosterCache;

use crate::docs::ApiDoc;
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance AI Assistant"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Missing credentials stop the process before anything is served
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(config.database.clone()).await?;
    info!("Connected to the attendance database");

    let template = match &config.prompt_template_path {
        Some(path) => PromptTemplate::from_file(path)?,
        None => PromptTemplate::default(),
    };

    let llm = ChatCompletionClient::new(
        config.llm_base_url.clone(),
        config.llm_api_key.clone(),
        config.llm_model.clone(),
        config.llm_timeout,
    )?;

    let assistant = Data::new(Assistant::new(
        IntentClassifier::new(Arc::new(llm), template),
        Dispatcher::new(
            Arc::new(MySqlStore::new(pool)),
            RosterCache::new(config.roster_ttl),
            config.late_threshold,
        ),
    ));

    let assistant_for_warmup = assistant.clone();
    actix_web::rt::spawn(async move {
        let dispatcher = assistant_for_warmup.dispatcher();
        if let Err(e) = dispatcher.roster().warmup(dispatcher.store()).await {
            error!(error = %e, "Failed to warmup roster cache");
        }
    });

    let limiters = routes::Limiters {
        ask: routes::build_limiter(config.rate_ask_per_min)?,
        refresh: routes::build_limiter(config.rate_refresh_per_min)?,
    };
    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(assistant.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config, limiters.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
