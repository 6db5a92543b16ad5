use crate::{api::assistant, config::Config};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::{Result, anyhow};
use std::sync::Arc;

pub type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// One limiter per rate-limited resource, shared by every worker.
#[derive(Clone)]
pub struct Limiters {
    pub ask: Arc<Limiter>,
    pub refresh: Arc<Limiter>,
}

/// Per-peer-IP limiter allowing `requests_per_min` with an equal burst.
pub fn build_limiter(requests_per_min: u32) -> Result<Arc<Limiter>> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        60_000 / requests_per_min as u64
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("Invalid rate limit: {} requests/min", requests_per_min))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: Limiters) {
    cfg.service(web::resource("/health").route(web::get().to(assistant::health)));

    cfg.service(
        web::scope(&config.api_prefix)
            // /ask
            .service(
                web::resource("/ask")
                    .wrap(limiters.ask)
                    .route(web::post().to(assistant::ask)),
            )
            // /roster/refresh
            .service(
                web::resource("/roster/refresh")
                    .wrap(limiters.refresh)
                    .route(web::post().to(assistant::refresh_roster)),
            ),
    );
}
