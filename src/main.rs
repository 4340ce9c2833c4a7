use docpipe::{
    api,
    config::Config,
    embedding::{HttpEmbeddingClient, TokioSleeper},
    extract::{ContentExtractor, HttpExtractionClient, HttpFileFetcher},
    logging,
    pipeline::Pipeline,
    store::InMemoryStore,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    let config = Config::from_env().expect("Failed to load config from environment");
    logging::init_tracing();

    let http = reqwest::Client::builder()
        .user_agent("docpipe/0.2")
        .build()
        .expect("Failed to build HTTP client");

    let extractor = ContentExtractor::new(
        Arc::new(HttpFileFetcher::new(http.clone())),
        Arc::new(HttpExtractionClient::new(
            http.clone(),
            &config.extraction_url,
            config.extraction_api_key.clone(),
        )),
        config.extraction_overview_tokens,
        config.extraction_segment_tokens,
    );
    let embedder = Arc::new(HttpEmbeddingClient::new(
        http,
        &config.embedding_url,
        config.embedding_api_key.clone(),
        &config.embedding_model,
        config.embedding_dimension,
    ));

    // The document store is owned by the wider application; standalone runs use the
    // in-memory reference implementation.
    let store = Arc::new(InMemoryStore::new());
    let pipeline = Pipeline::new(&config, store, extractor, embedder, Arc::new(TokioSleeper));
    let app = api::create_router(Arc::new(pipeline));

    let (listener, port) = bind_listener(config.server_port)
        .await
        .expect("Failed to bind listener");
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.unwrap();
}

async fn bind_listener(configured_port: Option<u16>) -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    if let Some(port) = configured_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 4300..=4399;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 4300-4399",
    ))
}
