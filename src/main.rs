use actix_web::{web, App, HttpServer};
use clap::Parser;
use hn_feed_proxy::{cors, top_stories, AppState, Args};
use tracing::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let address = format!("{}:{}", args.ip, args.port);

    let state = AppState::new(args).map_err(|e| {
        error!(error = %e, "Failed to build HTTP client");
        std::io::Error::new(std::io::ErrorKind::Other, "HTTP client initialization failed")
    })?;

    let settings = state.aggregator.settings();
    info!(
        upstream = %state.config.base_url,
        max_stories = settings.max_stories,
        cache_ttl_secs = settings.cache_ttl.as_secs(),
        "Server running at http://{}",
        address
    );

    let app_state = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .wrap(cors())
            .app_data(app_state.clone())
            .service(top_stories)
    })
    .bind(&address)?
    .run()
    .await
}
