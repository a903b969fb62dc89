lazy_static! {

    pub static ref HANDLER_SECS: prometheus::HistogramVec = register_histogram_vec!(
        "postboard_handler_secs",
        "Seconds taken for each response, partitioned by endpoint name",
        &["endpoint_name"],
        vec![0.05, 0.25, 1.0, 4.0] // Prometheus buckets
    )
    .expect("couldn't make HANDLER_SECS");

    pub static ref RESPONSES: prometheus::IntCounterVec = register_int_counter_vec!(
        "postboard_responses",
        "How many responses of Ok/Err per endpoint",
        &["endpoint_name", "result"]
    )
    .expect("couldn't make RESPONSES");

    pub static ref HTTP_RESPONSES: prometheus::IntCounterVec = register_int_counter_vec!(
        "postboard_http_responses",
        "Count of each HTTP status code served by postboard responses",
        &["status"]
    )
    .expect("couldn't make HTTP_RESPONSES");

    pub static ref UPSTREAM_REQUESTS: prometheus::IntCounterVec = register_int_counter_vec!(
        "postboard_upstream_requests",
        "Requests sent to the remote REST API, by resource and Ok/Err",
        &["resource", "result"]
    )
    .expect("couldn't make UPSTREAM_REQUESTS");

    pub static ref SNAPSHOT_FETCHES: prometheus::IntCounter = register_int_counter!(
        "postboard_snapshot_fetches",
        "How often the cached post snapshot had to be refetched"
    )
    .expect("couldn't make SNAPSHOT_FETCHES");
}

pub mod endpoint {
    use actix_web::{http, HttpResponse};
    use prometheus::Encoder;

    pub async fn gather() -> HttpResponse {
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = vec![];
        let metric_families = prometheus::gather();
        match encoder.encode(&metric_families, &mut buffer) {
            Ok(()) => HttpResponse::build(http::StatusCode::OK).body(buffer),
            Err(e) => {
                let message = format!("{:?}", e);
                HttpResponse::build(http::StatusCode::INTERNAL_SERVER_ERROR).body(message)
            }
        }
    }
}
