use axum::{extract::State, routing::post, Json, Router};
use bcrypt::{hash, verify, DEFAULT_COST};
use log::info;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    middleware::issue_token,
    state::{AppState, STATE},
};

pub fn routes() -> Router<()> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/deactivate", post(deactivate))
        .with_state(STATE.clone())
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

fn rejected(message: &str) -> Json<Value> {
    Json(json!({ "success": false, "message": message }))
}

pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> Result<Json<Value>, AppError> {
    let Some(username) = form.username.filter(|u| !u.is_empty()) else {
        return Ok(rejected("`username` is required"));
    };
    let Some(password) = form.password.filter(|p| !p.is_empty()) else {
        return Ok(rejected("`password` is required"));
    };
    let postgres = state.postgres_pool.get().await?;

    let existing = postgres
        .query("SELECT id FROM auth_user WHERE username = $1", &[&username])
        .await?;
    if !existing.is_empty() {
        return Ok(rejected("`username` existed"));
    }

    let encoded = hash(&password, DEFAULT_COST)?;
    postgres
        .execute(
            "INSERT INTO auth_user (username, password, is_superuser, first_name, last_name, email, is_active) VALUES ($1, $2, $3, $4, $5, $6, true)",
            &[
                &username,
                &encoded,
                &form.is_superuser,
                &form.first_name,
                &form.last_name,
                &form.email,
            ],
        )
        .await?;
    info!("Registered user {}", username);

    Ok(Json(json!({
        "success": true,
        "message": "user registered",
    })))
}

/// Looks up an active user and checks the supplied password. All failure
/// modes collapse to `None` so callers surface one uniform message.
async fn verify_credentials(
    postgres: &tokio_postgres::Client,
    username: &str,
    password: &str,
) -> Result<Option<(i32, bool)>, AppError> {
    let results = postgres
        .query(
            "SELECT id, password, is_superuser, is_active FROM auth_user WHERE username = $1",
            &[&username],
        )
        .await?;
    let Some(row) = results.first() else {
        return Ok(None);
    };
    if !row.try_get::<_, bool>("is_active")? {
        return Ok(None);
    }
    let encoded = row.try_get::<_, String>("password")?;
    if !verify(password, &encoded)? {
        return Ok(None);
    }
    Ok(Some((
        row.try_get::<_, i32>("id")?,
        row.try_get::<_, bool>("is_superuser")?,
    )))
}

pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<Credentials>,
) -> Result<Json<Value>, AppError> {
    let Some(username) = form.username.filter(|u| !u.is_empty()) else {
        return Ok(rejected("`username` is required"));
    };
    let Some(password) = form.password.filter(|p| !p.is_empty()) else {
        return Ok(rejected("`password` is required"));
    };
    let postgres = state.postgres_pool.get().await?;

    let Some((id, is_superuser)) = verify_credentials(&postgres, &username, &password).await?
    else {
        return Ok(rejected("invalid username/password"));
    };
    let token = issue_token(id, &username, is_superuser)?;
    info!("User {} logged in", username);

    Ok(Json(json!({
        "success": true,
        "message": "login successfully",
        "token": token,
        "user": {
            "id": id,
            "username": username,
            "is_superuser": is_superuser,
        },
    })))
}

/// Tokens are bearer credentials the client simply discards; the server
/// keeps no session to tear down.
pub async fn logout() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "logout successfully",
    }))
}

pub async fn deactivate(
    State(state): State<AppState>,
    Json(form): Json<Credentials>,
) -> Result<Json<Value>, AppError> {
    let Some(username) = form.username.filter(|u| !u.is_empty()) else {
        return Ok(rejected("`username` is required"));
    };
    let Some(password) = form.password.filter(|p| !p.is_empty()) else {
        return Ok(rejected("`password` is required"));
    };
    let postgres = state.postgres_pool.get().await?;

    if verify_credentials(&postgres, &username, &password)
        .await?
        .is_none()
    {
        return Ok(rejected("invalid username/password"));
    }
    postgres
        .execute(
            "UPDATE auth_user SET is_active = false WHERE username = $1",
            &[&username],
        )
        .await?;
    info!("Deactivated user {}", username);

    Ok(Json(json!({
        "success": true,
        "message": "user deleted",
    })))
}
