use anyhow::Result;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tower_http::cors::CorsLayer;

use crate::catalog::{CatalogError, CatalogService};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{log_requests, state::*, RequestsLoggingLevel, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
struct DeletedResponse {
    pub deleted: String,
}

#[derive(Debug, Deserialize)]
struct DeleteEntryQuery {
    pub artist: String,
    pub title: String,
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = match &self {
            CatalogError::InvalidInput(_) | CatalogError::DuplicateEntry { .. } => {
                StatusCode::BAD_REQUEST
            }
            CatalogError::NotFound => StatusCode::NOT_FOUND,
            CatalogError::UploadFailed(_)
            | CatalogError::DeleteFailed(_)
            | CatalogError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            warn!("Catalog operation failed: {}", self);
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

async fn list_entries(State(catalog): State<GuardedCatalogService>) -> Response {
    match catalog.list_all() {
        Ok(entries) => Json(entries).into_response(),
        Err(err) => err.into_response(),
    }
}

/// POST /upload - multipart form with artist_name, genre, song_title and
/// the audio bytes in song_file.
async fn upload_entry(
    State(catalog): State<GuardedCatalogService>,
    mut multipart: Multipart,
) -> Response {
    let mut artist_name: Option<String> = None;
    let mut genre: Option<String> = None;
    let mut song_title: Option<String> = None;
    let mut audio: Option<Vec<u8>> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "song_file" => match field.bytes().await {
                Ok(bytes) => audio = Some(bytes.to_vec()),
                Err(err) => {
                    warn!("Failed to read uploaded audio: {}", err);
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorResponse {
                            error: "Failed to read audio file".to_string(),
                        }),
                    )
                        .into_response();
                }
            },
            "artist_name" | "genre" | "song_title" => {
                if let Ok(bytes) = field.bytes().await {
                    let value = String::from_utf8_lossy(&bytes).to_string();
                    match field_name.as_str() {
                        "artist_name" => artist_name = Some(value),
                        "genre" => genre = Some(value),
                        _ => song_title = Some(value),
                    }
                }
            }
            _ => {}
        }
    }

    let (artist_name, song_title) = match (artist_name, song_title) {
        (Some(artist), Some(title)) => (artist, title),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "artist_name and song_title are required".to_string(),
                }),
            )
                .into_response();
        }
    };

    let audio = match audio {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "No audio file provided".to_string(),
                }),
            )
                .into_response();
        }
    };

    match catalog
        .create(
            &artist_name,
            genre.as_deref().unwrap_or(""),
            &song_title,
            audio,
        )
        .await
    {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn stream_entry(
    State(catalog): State<GuardedCatalogService>,
    Path(id): Path<i64>,
) -> Response {
    match catalog.resolve_stream_url(id) {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn delete_entry(
    State(catalog): State<GuardedCatalogService>,
    Query(query): Query<DeleteEntryQuery>,
) -> Response {
    match catalog.delete(&query.artist, &query.title).await {
        Ok(()) => Json(DeletedResponse {
            deleted: format!("{} by {}", query.title.trim(), query.artist.trim()),
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

impl ServerState {
    fn new(config: ServerConfig, catalog: CatalogService) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            catalog: Arc::new(catalog),
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

fn make_app(config: ServerConfig, catalog: CatalogService) -> Result<Router> {
    let state = ServerState::new(config.clone(), catalog);

    let upload_route = Router::new()
        .route("/upload", post(upload_entry))
        .layer(DefaultBodyLimit::max(
            config.max_upload_size_mb * 1024 * 1024,
        ));

    let catalog_routes: Router = Router::new()
        .merge(upload_route)
        .route("/entries", get(list_entries))
        .route("/stream/{id}", get(stream_entry))
        .route("/entry", delete(delete_entry))
        .with_state(state.clone());

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    let app: Router = home_router
        .nest("/v1/catalog", catalog_routes)
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(
    catalog: CatalogService,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
    max_upload_size_mb: usize,
) -> Result<()> {
    let config = ServerConfig {
        port,
        requests_logging_level,
        max_upload_size_mb,
    };
    let app = make_app(config, catalog)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
