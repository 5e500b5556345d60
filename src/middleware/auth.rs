use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{config::CONFIG, error::AppError};

const TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// The authenticated caller, carried as a request extension. Handlers take
/// this instead of reading identity out of request bodies, so a client can
/// only ever act on its own account.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub is_superuser: bool,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: String,
    uid: i32,
    su: bool,
    exp: u64,
}

pub fn issue_token(id: i32, username: &str, is_superuser: bool) -> Result<String> {
    let exp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() + TOKEN_TTL_SECS;
    let claims = Claims {
        sub: username.to_string(),
        uid: id,
        su: is_superuser,
        exp,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(CONFIG.token_secret.as_bytes()),
    )?)
}

fn verify_token(token: &str) -> Result<CurrentUser> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(CONFIG.token_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(CurrentUser {
        id: data.claims.uid,
        username: data.claims.sub,
        is_superuser: data.claims.su,
    })
}

/// Attaches the bearer-token identity (if any) to the request. Requests
/// without a valid token pass through untouched; protected handlers reject
/// via the [`CurrentUser`] extractor.
pub async fn attach_user(mut request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if let Some(token) = token {
        match verify_token(token) {
            Ok(user) => {
                request.extensions_mut().insert(user);
            }
            Err(e) => debug!("Rejected bearer token: {}", e),
        }
    }
    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(AppError::unauthorized)
    }
}
