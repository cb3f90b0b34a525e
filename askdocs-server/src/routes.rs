//! HTTP surface: router and handlers for `/api/documents/*`.

use std::collections::HashMap;
use std::convert::Infallible;

use askdocs_rag::document::Document;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, bad_request};
use crate::extract::extract_text;
use crate::state::AppState;

/// Uploads above this size are rejected by the body limit layer.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Build the application router.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/documents/upload", post(upload))
        .route("/api/documents/query", post(query))
        .route("/api/documents/query/stream", post(query_stream))
        .route("/api/documents/stats", get(stats))
        .route("/api/documents/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to Ask Docs API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload_document": "/api/documents/upload",
            "query_documents": "/api/documents/query",
            "stream_query": "/api/documents/query/stream",
            "document_stats": "/api/documents/stats",
            "health_check": "/api/documents/health",
        },
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "message": "Document API is running",
    }))
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut metadata: HashMap<String, String> = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| bad_request("file field is missing a filename"))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("failed to read file field: {e}")))?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("description") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("failed to read description: {e}")))?;
                if !value.is_empty() {
                    metadata.insert("description".to_string(), value);
                }
            }
            Some("tags") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("failed to read tags: {e}")))?;
                let tags: Vec<&str> =
                    value.split(',').map(str::trim).filter(|t| !t.is_empty()).collect();
                if !tags.is_empty() {
                    metadata.insert("tags".to_string(), tags.join(","));
                }
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or_else(|| bad_request("no file provided"))?;
    metadata.insert("file_size".to_string(), bytes.len().to_string());

    let text = extract_text(&filename, bytes).await?;
    let document = Document::new(&filename, text).with_metadata(metadata);
    let receipt = state.pipeline.ingest(&document).await?;

    info!(document.id = %receipt.document_id, filename = %receipt.filename, "document uploaded");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Document uploaded and processed successfully",
            "data": {
                "success": true,
                "document_id": receipt.document_id,
                "filename": receipt.filename,
                "chunks_created": receipt.chunks_created,
            },
        })),
    ))
}

#[derive(Debug, Deserialize)]
struct QueryForm {
    query: String,
    #[serde(default)]
    k: Option<usize>,
    #[serde(default)]
    document_id: Option<Uuid>,
}

async fn query(
    State(state): State<AppState>,
    Form(form): Form<QueryForm>,
) -> Result<impl IntoResponse, ApiError> {
    let answer = state.pipeline.answer(&form.query, form.k, form.document_id).await?;

    Ok(Json(json!({
        "message": "Query executed successfully",
        "data": {
            "success": true,
            "query": answer.query,
            "answer": answer.answer,
            "search_type": answer.search_type,
            "total_results": answer.total_results,
            "sources": answer.sources,
        },
    })))
}

async fn query_stream(
    State(state): State<AppState>,
    Form(form): Form<QueryForm>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    // Retrieval runs before the response starts, so retrieval errors still
    // surface as plain HTTP errors rather than mid-stream events.
    let answer = state.pipeline.answer_stream(&form.query, form.k, form.document_id).await?;
    let summary = serde_json::to_string(&answer.summary).unwrap_or_default();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("meta").data(summary));

        let mut fragments = answer.fragments;
        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(text) => yield Ok(Event::default().event("chunk").data(text)),
                Err(e) => {
                    // Ends without the end marker: the client must treat
                    // this as a failed answer, not an empty one.
                    yield Ok(Event::default().event("error").data(e.to_string()));
                    return;
                }
            }
        }

        yield Ok(Event::default().event("end").data(""));
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.pipeline.stats().await?;

    Ok(Json(json!({
        "message": "Statistics retrieved successfully",
        "data": {
            "success": true,
            "total_documents": stats.total_documents,
            "total_chunks": stats.total_chunks,
            "collection_name": state.pipeline.config().collection,
        },
    })))
}
