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
    query::{parse_page, Direction, Entity, Field, PageQuery},
    state::{AppState, STATE},
};

pub fn routes() -> Router<()> {
    Router::new()
        .route("/:page", get(listing))
        .route("/", post(collect))
        .route("/favorite", post(favorite))
        .route("/play", post(play))
        .route("/clear", post(clear))
        .route("/remove", post(remove))
        .with_state(STATE.clone())
}

pub async fn listing(
    user: CurrentUser,
    Path(page): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let page = parse_page(&page).map_err(AppError::bad_request)?;
    let postgres = state.postgres_pool.get().await?;

    let listing = PageQuery::new(Entity::Collection, page)
        .filter(Field::Collector, user.username)
        .order_by(Field::PlayCount, Direction::Desc)
        .fetch(&postgres)
        .await?;

    Ok(Json(listing_body(listing)))
}

#[derive(Deserialize)]
pub struct EntryForm {
    pub song: Option<String>,
}

fn rejected(message: &str) -> Json<Value> {
    Json(json!({ "success": false, "message": message }))
}

async fn entry_exists(
    postgres: &tokio_postgres::Client,
    song: &str,
    username: &str,
) -> Result<bool, AppError> {
    let results = postgres
        .query(
            "SELECT 1 FROM collection WHERE song = $1 AND username = $2",
            &[&song, &username],
        )
        .await?;
    Ok(!results.is_empty())
}

pub async fn collect(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(form): Json<EntryForm>,
) -> Result<Json<Value>, AppError> {
    let Some(song) = form.song.filter(|s| !s.is_empty()) else {
        return Ok(rejected("`song` is required"));
    };
    let postgres = state.postgres_pool.get().await?;

    let known = postgres
        .query("SELECT id FROM songs WHERE title = $1", &[&song])
        .await?;
    if known.is_empty() {
        return Ok(rejected("`song` does not exist"));
    }
    if entry_exists(&postgres, &song, &user.username).await? {
        return Ok(rejected("`song` has been collected"));
    }

    postgres
        .execute(
            "INSERT INTO collection (song, username, play_count, is_favorite) VALUES ($1, $2, 0, false)",
            &[&song, &user.username],
        )
        .await?;
    info!("{} collected {}", user.username, song);

    Ok(Json(json!({
        "success": true,
        "message": "song collected",
    })))
}

/// Runs one update statement against the caller's own entry, with a
/// uniform "not collected" rejection when the entry is absent.
async fn update_entry(
    user: &CurrentUser,
    state: &AppState,
    form: EntryForm,
    statement: &str,
    message: &str,
) -> Result<Json<Value>, AppError> {
    let Some(song) = form.song.filter(|s| !s.is_empty()) else {
        return Ok(rejected("`song` is required"));
    };
    let postgres = state.postgres_pool.get().await?;

    if !entry_exists(&postgres, &song, &user.username).await? {
        return Ok(rejected("`song` has not been collected"));
    }
    postgres
        .execute(statement, &[&song, &user.username])
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": message,
    })))
}

pub async fn favorite(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(form): Json<EntryForm>,
) -> Result<Json<Value>, AppError> {
    update_entry(
        &user,
        &state,
        form,
        "UPDATE collection SET is_favorite = NOT is_favorite WHERE song = $1 AND username = $2",
        "favorite set",
    )
    .await
}

pub async fn play(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(form): Json<EntryForm>,
) -> Result<Json<Value>, AppError> {
    update_entry(
        &user,
        &state,
        form,
        "UPDATE collection SET play_count = play_count + 1 WHERE song = $1 AND username = $2",
        "play recorded",
    )
    .await
}

pub async fn clear(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(form): Json<EntryForm>,
) -> Result<Json<Value>, AppError> {
    update_entry(
        &user,
        &state,
        form,
        "UPDATE collection SET play_count = 0 WHERE song = $1 AND username = $2",
        "play history cleared",
    )
    .await
}

pub async fn remove(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(form): Json<EntryForm>,
) -> Result<Json<Value>, AppError> {
    update_entry(
        &user,
        &state,
        form,
        "DELETE FROM collection WHERE song = $1 AND username = $2",
        "removed from collection",
    )
    .await
}
