use actix_cors::Cors;
use actix_web::{
    http::{header, Method, StatusCode},
    route, web, HttpRequest, HttpResponse, Responder,
};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub mod aggregator;
pub mod cache;
pub mod envelope;
pub mod hacker_news;
pub mod story;

use aggregator::{AggregatorSettings, StoryAggregator};
use cache::MemoryCache;
use envelope::ResponseEnvelope;
use hacker_news::{HackerNewsClient, StorySource};

#[derive(Parser, Debug, Clone)]
#[clap(about, version, author)]
pub struct Args {
    #[clap(short, long, default_value = "127.0.0.1")]
    pub ip: String,

    #[clap(short, long, default_value = "3000")]
    pub port: u16,

    /// Maximum number of stories fetched per refresh
    #[clap(short, long, default_value = "200")]
    pub limit: usize,

    /// Seconds a fetched story list stays cached
    #[clap(short, long, default_value = "600")]
    pub cache_lifetime: u64,

    #[clap(short, long, default_value = hacker_news::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout for upstream calls, in seconds
    #[clap(short, long, default_value = "30")]
    pub timeout: u64,
}

impl Args {
    pub fn settings(&self) -> AggregatorSettings {
        AggregatorSettings {
            max_stories: self.limit,
            cache_ttl: Duration::from_secs(self.cache_lifetime),
        }
    }
}

pub struct AppState {
    pub config: Args,
    pub aggregator: StoryAggregator,
}

impl AppState {
    pub fn new(config: Args) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.timeout);
        let client = HackerNewsClient::new(&config.base_url, timeout)?;
        Ok(Self::with_source(config, Arc::new(client)))
    }

    pub fn with_source(config: Args, source: Arc<dyn StorySource>) -> Self {
        let aggregator =
            StoryAggregator::new(source, Arc::new(MemoryCache::new()), config.settings());
        Self { config, aggregator }
    }
}

/// Allow-all CORS policy: any origin, method and header, preflight included.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
}

#[route("/api/HackerNewsFeed/top", method = "GET", method = "HEAD")]
pub async fn top_stories(app_data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    info!("Fetching top stories");

    let envelope = app_data.aggregator.get_latest_stories().await;

    if envelope.is_success {
        let count = envelope.data.as_ref().map_or(0, |stories| stories.len());
        info!(count, "Successfully fetched top stories");
    } else {
        error!(
            status_code = envelope.status_code,
            "Failed to fetch top stories"
        );
    }

    create_response(&req, &envelope)
}

fn create_response<T: Serialize>(
    req: &HttpRequest,
    envelope: &ResponseEnvelope<T>,
) -> HttpResponse {
    let status =
        StatusCode::from_u16(envelope.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let body = match serde_json::to_string(envelope) {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "Failed to serialize response");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let mut response = HttpResponse::build(status);
    response.insert_header((header::CONTENT_TYPE, "application/json"));

    if req.method() == Method::HEAD {
        response
            .insert_header((header::CONTENT_LENGTH, body.len()))
            .finish()
    } else {
        response.body(body)
    }
}
