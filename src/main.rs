use semsearch::api::{self, AppState};
use semsearch::domain::DocumentStore;
use semsearch::embedding::{EmbeddingClient, GoogleEmbeddingClient};
use semsearch::pipeline::{IndexPipeline, QueryPipeline};
use semsearch::summarization::{GoogleSummarizationClient, SummarizationClient};
use semsearch::typesense::TypesenseClient;
use semsearch::{config, logging};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    config::init_config();
    logging::init_tracing();

    // Startup blocks on store readiness; serving traffic against an
    // unverified schema is not an option.
    let store: Arc<dyn DocumentStore> = Arc::new(
        TypesenseClient::connect()
            .await
            .expect("Failed to establish vector store readiness"),
    );
    let embedder: Arc<dyn EmbeddingClient> = Arc::new(GoogleEmbeddingClient::new());
    let summarizer: Arc<dyn SummarizationClient> = Arc::new(GoogleSummarizationClient::new());

    let state = Arc::new(AppState {
        indexer: IndexPipeline::new(embedder.clone(), store.clone()),
        searcher: QueryPipeline::new(embedder, store, summarizer),
    });
    let app = api::create_router(state);

    let port = config::get_config().http_port;
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
        .await
        .expect("Failed to bind listener");
    tracing::info!("Listening on http://0.0.0.0:{port}");
    axum::serve(listener, app).await.unwrap();
}
