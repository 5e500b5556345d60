use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    middleware::CurrentUser,
    query::{parse_page, record, Direction, Entity, Field, PageQuery, PAGE_SIZE},
    state::{AppState, STATE},
};

pub fn routes() -> Router<()> {
    Router::new()
        .route("/:page", get(listing))
        .with_state(STATE.clone())
}

// Singers with the caller's highest summed play count. `>= ALL` keeps ties,
// so several singers can share the top spot.
const TOP_SINGERS: &str = "SELECT songs.singer FROM songs \
    INNER JOIN collection ON songs.title = collection.song \
    WHERE collection.username = $1 GROUP BY songs.singer \
    HAVING SUM(collection.play_count) >= ALL (\
        SELECT SUM(collection.play_count) FROM songs \
        INNER JOIN collection ON songs.title = collection.song \
        WHERE collection.username = $1 GROUP BY songs.singer)";

const TOP_LANGUAGES: &str = "SELECT songs.language FROM songs \
    INNER JOIN collection ON songs.title = collection.song \
    WHERE collection.username = $1 GROUP BY songs.language \
    HAVING SUM(collection.play_count) >= ALL (\
        SELECT SUM(collection.play_count) FROM songs \
        INNER JOIN collection ON songs.title = collection.song \
        WHERE collection.username = $1 GROUP BY songs.language)";

pub async fn listing(
    user: CurrentUser,
    Path(page): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let page = parse_page(&page).map_err(AppError::bad_request)?;
    let postgres = state.postgres_pool.get().await?;
    let offset = (page - 1) * PAGE_SIZE;

    let favorites = PageQuery::new(Entity::Collection, page)
        .filter(Field::Collector, user.username.clone())
        .filter(Field::IsFavorite, true)
        .order_by(Field::PlayCount, Direction::Desc)
        .fetch(&postgres)
        .await?;

    let top_singers = postgres
        .query(
            format!("{} ORDER BY 1 LIMIT $2 OFFSET $3", TOP_SINGERS).as_str(),
            &[&user.username, &PAGE_SIZE, &offset],
        )
        .await?
        .iter()
        .map(|row| Ok(json!({ "singer": row.try_get::<_, String>("singer")? })))
        .collect::<Result<Vec<_>, AppError>>()?;

    let singer_picks = record::SONG.records(
        &postgres
            .query(
                format!(
                    "SELECT id, title, duration, year, language, singer FROM songs \
                     WHERE singer IN ({}) ORDER BY id LIMIT $2 OFFSET $3",
                    TOP_SINGERS
                )
                .as_str(),
                &[&user.username, &PAGE_SIZE, &offset],
            )
            .await?,
    )?;

    let top_languages = postgres
        .query(
            format!("{} ORDER BY 1 LIMIT $2 OFFSET $3", TOP_LANGUAGES).as_str(),
            &[&user.username, &PAGE_SIZE, &offset],
        )
        .await?
        .iter()
        .map(|row| Ok(json!({ "language": row.try_get::<_, String>("language")? })))
        .collect::<Result<Vec<_>, AppError>>()?;

    let language_picks = record::SONG.records(
        &postgres
            .query(
                format!(
                    "SELECT id, title, duration, year, language, singer FROM songs \
                     WHERE language IN ({}) ORDER BY id LIMIT $2 OFFSET $3",
                    TOP_LANGUAGES
                )
                .as_str(),
                &[&user.username, &PAGE_SIZE, &offset],
            )
            .await?,
    )?;

    let mut body = json!({
        "top_singers": top_singers,
        "singer_picks": singer_picks,
        "top_languages": top_languages,
        "language_picks": language_picks,
        "favorites": favorites.rows,
    });
    if let Some(pagination) = favorites.pagination {
        body["pagination"] = json!(pagination);
    }
    Ok(Json(body))
}
