use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
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
        .route("/:page", get(roster))
        .route("/find/:username", get(find))
        .with_state(STATE.clone())
}

pub async fn roster(
    _user: CurrentUser,
    Path(page): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let page = parse_page(&page).map_err(AppError::bad_request)?;
    let postgres = state.postgres_pool.get().await?;

    let listing = PageQuery::new(Entity::Users, page)
        .filter(Field::IsActive, true)
        .fetch(&postgres)
        .await?;

    Ok(Json(listing_body(listing)))
}

pub async fn find(
    Path(username): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let postgres = state.postgres_pool.get().await?;

    let results = postgres
        .query(
            "SELECT username, is_superuser, first_name, last_name, email, is_active FROM auth_user WHERE username = $1",
            &[&username],
        )
        .await?;
    let Some(result) = results.first() else {
        return Ok(Json(json!({
            "success": false,
            "message": "requested user does not exist",
        })));
    };

    Ok(Json(json!({
        "success": true,
        "user": {
            "username": result.try_get::<_, String>("username")?,
            "is_superuser": result.try_get::<_, bool>("is_superuser")?,
            "first_name": result.try_get::<_, String>("first_name")?,
            "last_name": result.try_get::<_, String>("last_name")?,
            "email": result.try_get::<_, String>("email")?,
            "is_active": result.try_get::<_, bool>("is_active")?,
        },
    })))
}
