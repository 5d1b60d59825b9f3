use crate::config::Config;
use crate::db::{Collection, Database};
use crate::error::Error;
use crate::export::ExportDocument;
use crate::import::{ImportDocument, ImportSummary};
use crate::models::{MediaKind, Movie, MoviePatch, NewMovie, NewTvShow, TvShow, TvShowPatch};
use crate::query::ListQuery;
use crate::stats::{self, DirectorStats, RatingStats, Statistics, WatchStats, YearStats};
use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(db: Database, max_body_bytes: usize) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            max_body_bytes,
        }
    }

    /// Runs `f` against the database on the blocking pool. Calls are
    /// serialized by the mutex, so each one sees no half-applied write.
    async fn with_db<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Database) -> crate::error::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let joined = tokio::task::spawn_blocking(move || {
            let mut guard = db
                .lock()
                .map_err(|_| Error::Unavailable("database lock poisoned".to_string()))?;
            f(&mut *guard)
        })
        .await;
        match joined {
            Ok(result) => result.map_err(ApiError::from),
            Err(e) => Err(ApiError::from(Error::Unavailable(format!(
                "database task failed: {e}"
            )))),
        }
    }

    async fn collection(&self) -> Result<Collection, ApiError> {
        self.with_db(|db| db.collection()).await
    }
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(MediaKind),
    Store(Error),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Store(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(kind) => (StatusCode::NOT_FOUND, kind.not_found().to_string()),
            ApiError::Store(Error::Validation(message)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, message)
            }
            ApiError::Store(e) => {
                error!("Request failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (
            status,
            Json(json!({ "status": "error", "message": message })),
        )
            .into_response()
    }
}

pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let db = Database::open(&config.database_path).with_context(|| {
        format!(
            "Failed to open database at {}",
            config.database_path.display()
        )
    })?;
    info!("Database schema at version {}", db.schema_version()?);

    let app = build_router(AppState::new(db, config.max_body_bytes));

    info!("Listening on {}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let max_body_bytes = state.max_body_bytes;
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/movies", get(list_movies).post(create_movie))
        .route(
            "/movies/:id",
            get(get_movie)
                .put(update_movie)
                .patch(update_movie)
                .delete(delete_movie),
        )
        .route("/tv-shows", get(list_tv_shows).post(create_tv_show))
        .route(
            "/tv-shows/:id",
            get(get_tv_show)
                .put(update_tv_show)
                .patch(update_tv_show)
                .delete(delete_tv_show),
        )
        .route("/export", get(export))
        .route("/import", post(import))
        .route("/statistics", get(statistics))
        .route("/statistics/watch", get(watch_statistics))
        .route("/statistics/ratings", get(rating_statistics))
        .route("/statistics/years", get(year_statistics))
        .route("/statistics/directors", get(director_statistics))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Cinetrack API is running" }))
}

async fn health() -> &'static str {
    "OK"
}

async fn list_movies(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let movies = state.with_db(move |db| db.list_movies(&query)).await?;
    Ok(Json(movies))
}

async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Movie>, ApiError> {
    state
        .with_db(move |db| db.get_movie(id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(MediaKind::Movie))
}

async fn create_movie(
    State(state): State<AppState>,
    Json(new): Json<NewMovie>,
) -> Result<(StatusCode, Json<Movie>), ApiError> {
    new.validate()?;
    let movie = state.with_db(move |db| db.insert_movie(new)).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

async fn update_movie(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<MoviePatch>,
) -> Result<Json<Movie>, ApiError> {
    patch.validate()?;
    state
        .with_db(move |db| db.update_movie(id, patch))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(MediaKind::Movie))
}

async fn delete_movie(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Movie>, ApiError> {
    state
        .with_db(move |db| db.delete_movie(id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(MediaKind::Movie))
}

async fn list_tv_shows(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TvShow>>, ApiError> {
    let shows = state.with_db(move |db| db.list_tv_shows(&query)).await?;
    Ok(Json(shows))
}

async fn get_tv_show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TvShow>, ApiError> {
    state
        .with_db(move |db| db.get_tv_show(id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(MediaKind::TvShow))
}

async fn create_tv_show(
    State(state): State<AppState>,
    Json(new): Json<NewTvShow>,
) -> Result<(StatusCode, Json<TvShow>), ApiError> {
    new.validate()?;
    let show = state.with_db(move |db| db.insert_tv_show(new)).await?;
    Ok((StatusCode::CREATED, Json(show)))
}

async fn update_tv_show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<TvShowPatch>,
) -> Result<Json<TvShow>, ApiError> {
    patch.validate()?;
    state
        .with_db(move |db| db.update_tv_show(id, patch))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(MediaKind::TvShow))
}

async fn delete_tv_show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TvShow>, ApiError> {
    state
        .with_db(move |db| db.delete_tv_show(id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(MediaKind::TvShow))
}

async fn export(State(state): State<AppState>) -> Result<Json<ExportDocument>, ApiError> {
    let document = state.with_db(|db| db.export()).await?;
    info!(
        "Exported {} movies and {} TV shows",
        document.movies.len(),
        document.tv_shows.len()
    );
    Ok(Json(document))
}

async fn import(
    State(state): State<AppState>,
    Json(document): Json<ImportDocument>,
) -> Result<Json<ImportSummary>, ApiError> {
    info!(
        "Import requested: {} movies, {} TV shows",
        document.movies.len(),
        document.tv_shows.len()
    );
    let summary = state
        .with_db(move |db| Ok(db.import_document(&document)))
        .await?;
    Ok(Json(summary))
}

async fn statistics(State(state): State<AppState>) -> Result<Json<Statistics>, ApiError> {
    let collection = state.collection().await?;
    Ok(Json(Statistics::compute(&collection)))
}

async fn watch_statistics(State(state): State<AppState>) -> Result<Json<WatchStats>, ApiError> {
    let c = state.collection().await?;
    Ok(Json(stats::watch_stats(&c.movies, &c.tv_shows)))
}

async fn rating_statistics(
    State(state): State<AppState>,
) -> Result<Json<RatingStats>, ApiError> {
    let c = state.collection().await?;
    Ok(Json(stats::rating_stats(&c.movies, &c.tv_shows)))
}

async fn year_statistics(State(state): State<AppState>) -> Result<Json<YearStats>, ApiError> {
    let c = state.collection().await?;
    Ok(Json(stats::year_stats(&c.movies, &c.tv_shows)))
}

async fn director_statistics(
    State(state): State<AppState>,
) -> Result<Json<DirectorStats>, ApiError> {
    let c = state.collection().await?;
    Ok(Json(stats::director_stats(&c.movies)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
