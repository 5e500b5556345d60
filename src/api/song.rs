use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use log::info;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    api::listing_body,
    error::AppError,
    middleware::CurrentUser,
    query::{parse_page, Entity, Field, PageQuery},
    state::{AppState, STATE},
};

pub fn routes() -> Router<()> {
    Router::new()
        .route("/:page", get(catalog))
        .route("/language/:language/:page", get(by_language))
        .route("/singer/:name/:page", get(by_singer))
        .route("/search/:title/:page", get(by_title))
        .route("/", post(add))
        .route("/delete", post(remove))
        .with_state(STATE.clone())
}

/// Distinct language and singer side-lists rendered next to every catalog
/// listing as filter links.
async fn side_lists(
    postgres: &tokio_postgres::Client,
) -> Result<(Vec<Value>, Vec<Value>), AppError> {
    let languages = postgres
        .query("SELECT DISTINCT language FROM songs ORDER BY language", &[])
        .await?
        .iter()
        .map(|row| Ok(json!({ "language": row.try_get::<_, String>("language")? })))
        .collect::<Result<Vec<_>, AppError>>()?;
    let singers = postgres
        .query("SELECT DISTINCT singer FROM songs ORDER BY singer", &[])
        .await?
        .iter()
        .map(|row| Ok(json!({ "singer": row.try_get::<_, String>("singer")? })))
        .collect::<Result<Vec<_>, AppError>>()?;
    Ok((languages, singers))
}

async fn song_listing(
    state: &AppState,
    query: PageQuery,
) -> Result<Json<Value>, AppError> {
    let postgres = state.postgres_pool.get().await?;
    let listing = query.fetch(&postgres).await?;
    let (languages, singers) = side_lists(&postgres).await?;

    let mut body = listing_body(listing);
    body["languages"] = json!(languages);
    body["singers"] = json!(singers);
    Ok(Json(body))
}

pub async fn catalog(
    Path(page): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let page = parse_page(&page).map_err(AppError::bad_request)?;
    song_listing(&state, PageQuery::new(Entity::Songs, page)).await
}

pub async fn by_language(
    Path((language, page)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let page = parse_page(&page).map_err(AppError::bad_request)?;
    let query = PageQuery::new(Entity::Songs, page).filter(Field::Language, language);
    song_listing(&state, query).await
}

pub async fn by_singer(
    Path((name, page)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let page = parse_page(&page).map_err(AppError::bad_request)?;
    let query = PageQuery::new(Entity::Songs, page).filter(Field::Singer, name);
    song_listing(&state, query).await
}

// Search is an exact-title lookup.
pub async fn by_title(
    Path((title, page)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let page = parse_page(&page).map_err(AppError::bad_request)?;
    let query = PageQuery::new(Entity::Songs, page).filter(Field::Title, title);
    song_listing(&state, query).await
}

#[derive(Deserialize)]
pub struct SongForm {
    pub title: Option<String>,
    pub duration: Option<i32>,
    pub year: Option<i32>,
    pub language: Option<String>,
    pub singer: Option<String>,
}

pub async fn add(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(form): Json<SongForm>,
) -> Result<Json<Value>, AppError> {
    let (Some(title), Some(duration), Some(year), Some(language), Some(singer)) = (
        form.title.filter(|t| !t.is_empty()),
        form.duration,
        form.year,
        form.language.filter(|l| !l.is_empty()),
        form.singer.filter(|s| !s.is_empty()),
    ) else {
        return Ok(Json(json!({
            "success": false,
            "message": "all song fields are required",
        })));
    };
    let postgres = state.postgres_pool.get().await?;

    let existing = postgres
        .query("SELECT id FROM songs WHERE title = $1", &[&title])
        .await?;
    if !existing.is_empty() {
        return Ok(Json(json!({
            "success": false,
            "message": "`title` existed",
        })));
    }

    postgres
        .execute(
            "INSERT INTO songs (title, duration, year, language, singer) VALUES ($1, $2, $3, $4, $5)",
            &[&title, &duration, &year, &language, &singer],
        )
        .await?;
    info!("Added song {}", title);

    Ok(Json(json!({
        "success": true,
        "message": "song registered",
    })))
}

#[derive(Deserialize)]
pub struct DeleteForm {
    pub title: Option<String>,
}

pub async fn remove(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(form): Json<DeleteForm>,
) -> Result<Json<Value>, AppError> {
    let Some(title) = form.title.filter(|t| !t.is_empty()) else {
        return Ok(Json(json!({
            "success": false,
            "message": "`title` is required",
        })));
    };
    let mut postgres = state.postgres_pool.get().await?;

    let existing = postgres
        .query("SELECT id FROM songs WHERE title = $1", &[&title])
        .await?;
    if existing.is_empty() {
        return Ok(Json(json!({
            "success": false,
            "message": "`song` does not exist",
        })));
    }

    // Collection entries reference the song by title, so both go in one
    // transaction.
    let tx = postgres.transaction().await?;
    tx.execute("DELETE FROM collection WHERE song = $1", &[&title])
        .await?;
    tx.execute("DELETE FROM songs WHERE title = $1", &[&title])
        .await?;
    tx.commit().await?;
    info!("Deleted song {}", title);

    Ok(Json(json!({
        "success": true,
        "message": "song deleted",
    })))
}
