use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use askdocs_rag::chunking::BoundaryChunker;
use askdocs_rag::config::PipelineConfig;
use askdocs_rag::openai::{OpenAIAnswerFormatter, OpenAIEmbeddingProvider};
use askdocs_rag::pipeline::QaPipeline;
use askdocs_rag::qdrant::QdrantVectorStore;
use askdocs_server::config::ServerConfig;
use askdocs_server::routes::app_router;
use askdocs_server::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let pipeline_config = PipelineConfig::builder()
        .collection(config.collection.as_str())
        .chunk_size(config.chunk_size)
        .chunk_overlap(config.chunk_overlap)
        .request_timeout(config.request_timeout)
        .build()?;

    let embedder =
        OpenAIEmbeddingProvider::new(config.openai_api_key.as_str(), config.request_timeout)?;
    let formatter =
        OpenAIAnswerFormatter::new(config.openai_api_key.as_str(), config.request_timeout)?;
    let store = QdrantVectorStore::new(&config.qdrant_url, config.request_timeout)?;
    let chunker = BoundaryChunker::new(pipeline_config.chunk_size, pipeline_config.chunk_overlap)?;

    let pipeline = QaPipeline::builder()
        .config(pipeline_config)
        .embedding_provider(Arc::new(embedder))
        .vector_store(Arc::new(store))
        .chunker(Arc::new(chunker))
        .formatter(Arc::new(formatter))
        .build()?;

    pipeline.init().await.context("failed to initialize vector store collection")?;

    let app = app_router(AppState::new(Arc::new(pipeline)));
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for askdocs server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("askdocs listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
