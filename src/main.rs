mod api;
mod auth;
mod comments;
mod config;
mod metrics;
mod remote;
mod search;
mod twoface;

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;

use crate::auth::{Revocations, Tokens};
use crate::config::Config;
use crate::remote::{cache::Cached, cache::SnapshotCache, http};
use actix_web::{
    dev::{Service, ServiceResponse},
    middleware, web, App, HttpServer,
};
use futures::future::{try_join, FutureExt};
use std::time::Duration;
use tracing::{info, Level};

#[allow(clippy::cognitive_complexity)]
fn main() {
    let args: Vec<_> = std::env::args().collect();
    let [_, config_file_path, ..] = &args[..] else {
        eprintln!("First argument should be path to config file");
        return;
    };

    let config = Config::from_file(config_file_path);

    // Set up logger output
    let subscriber_builder = tracing_subscriber::fmt().with_max_level(Level::DEBUG);
    if config.human_logs {
        subscriber_builder.init();
    } else {
        subscriber_builder.json().init();
    }

    info!("starting postboard");

    actix_rt::System::new()
        .block_on(serve(config))
        .expect("actix runtime terminated");
}

async fn serve(config: Config) -> std::io::Result<()> {
    let api_base_url = config.api_base_url.clone();
    let api_timeout = Duration::from_secs(config.api_timeout_secs);
    // Check the remote service's URL once, before any worker needs it.
    http::Client::new(&api_base_url, api_timeout).expect("invalid api_base_url");

    // Shared by every worker
    let snapshot = SnapshotCache::default();
    let revocations = Revocations::default();
    let tokens = Tokens::new(&config.jwt_secret, config.token_ttl_secs);
    let search = config.search_settings();
    let stale_after = Duration::from_secs(config.posts_stale_secs);

    // Start the userfacing API server
    info!(
        addr = &config.userfacing_listen_address[..],
        api = &api_base_url[..],
        "starting userfacing API server"
    );
    let max_body_size = config.max_body_size;
    let userfacing = HttpServer::new(move || {
        // HTTP clients belong to the worker thread that made them.
        let remote = http::Client::new(&api_base_url, api_timeout).expect("invalid api_base_url");
        let client = Cached::new(remote, snapshot.clone(), stale_after);
        let state = api::State::new(client, tokens.clone(), revocations.clone(), search);
        App::new()
            // Middleware for Prometheus
            .wrap_fn(|request, srv| srv.call(request).map(increment_response_metrics))
            .app_data(web::Data::new(state))
            // enable logger
            .wrap(middleware::Logger::default())
            // limit size of the payload (global configuration)
            .app_data(web::JsonConfig::default().limit(max_body_size))
            .configure(api::configure::<Cached<http::Client>>)
    })
    .bind(config.userfacing_listen_address.clone())?
    .run();

    // Start the metrics server
    info!(
        addr = &config.metrics_address[..],
        "starting metrics server"
    );
    let metrics_server = HttpServer::new(|| {
        App::new().service(
            web::scope("/metrics")
                .service(web::resource("/").route(web::get().to(metrics::endpoint::gather)))
                .service(web::resource("").route(web::get().to(metrics::endpoint::gather))),
        )
    })
    .bind(config.metrics_address)?
    .run();

    try_join(userfacing, metrics_server).await.map(|_| ())
}

/// If response is OK, increment the metrics for HTTP statuses.
fn increment_response_metrics<E, B>(
    response: Result<ServiceResponse<B>, E>,
) -> Result<ServiceResponse<B>, E> {
    match response {
        Ok(response) => {
            metrics::HTTP_RESPONSES
                .with_label_values(&[response.status().as_str()])
                .inc();
            Ok(response)
        }
        other => other,
    }
}
