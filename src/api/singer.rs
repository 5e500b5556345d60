use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use log::info;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    middleware::CurrentUser,
    query::record,
    state::{AppState, STATE},
};

pub fn routes() -> Router<()> {
    Router::new()
        .route("/", post(upsert))
        .route("/:name", get(detail))
        .with_state(STATE.clone())
}

#[derive(Deserialize)]
pub struct SingerForm {
    pub name: Option<String>,
    pub sex: Option<String>,
    pub birth_year: Option<i32>,
    pub area: Option<String>,
    pub message: Option<String>,
    pub award: Option<String>,
}

impl SingerForm {
    /// Every field is required and none may be blank.
    fn complete(self) -> Option<(String, String, i32, String, String, String)> {
        Some((
            self.name.filter(|n| !n.is_empty())?,
            self.sex.filter(|s| !s.is_empty())?,
            self.birth_year?,
            self.area.filter(|a| !a.is_empty())?,
            self.message.filter(|m| !m.is_empty())?,
            self.award.filter(|a| !a.is_empty())?,
        ))
    }
}

pub async fn upsert(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(form): Json<SingerForm>,
) -> Result<Json<Value>, AppError> {
    let Some((name, sex, birth_year, area, message, award)) = form.complete() else {
        return Ok(Json(json!({
            "success": false,
            "message": "all singer fields are required",
        })));
    };
    let postgres = state.postgres_pool.get().await?;

    let existing = postgres
        .query("SELECT name FROM singers WHERE name = $1", &[&name])
        .await?;
    if existing.is_empty() {
        postgres
            .execute(
                "INSERT INTO singers (name, sex, birth_year, area, message, award) VALUES ($1, $2, $3, $4, $5, $6)",
                &[&name, &sex, &birth_year, &area, &message, &award],
            )
            .await?;
    } else {
        postgres
            .execute(
                "UPDATE singers SET sex = $2, birth_year = $3, area = $4, message = $5, award = $6 WHERE name = $1",
                &[&name, &sex, &birth_year, &area, &message, &award],
            )
            .await?;
    }
    info!("Registered singer {}", name);

    Ok(Json(json!({
        "success": true,
        "message": "singer registered",
    })))
}

pub async fn detail(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let postgres = state.postgres_pool.get().await?;

    let results = postgres
        .query(
            "SELECT name, sex, birth_year, area, message, award FROM singers WHERE name = $1",
            &[&name],
        )
        .await?;
    let result = results.first().ok_or_else(AppError::not_found)?;
    let profile = record::SINGER.record(result)?;

    let songs = postgres
        .query(
            "SELECT title FROM songs WHERE singer = $1 ORDER BY title",
            &[&name],
        )
        .await?
        .iter()
        .map(|row| Ok(json!({ "title": row.try_get::<_, String>("title")? })))
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Json(json!({
        "data": profile,
        "songs": songs,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> SingerForm {
        SingerForm {
            name: Some("Edith Piaf".to_string()),
            sex: Some("female".to_string()),
            birth_year: Some(1915),
            area: Some("France".to_string()),
            message: Some("La Mome Piaf".to_string()),
            award: Some("Grammy Hall of Fame".to_string()),
        }
    }

    #[test]
    fn filled_form_is_complete() {
        let (name, sex, birth_year, area, message, award) = form().complete().unwrap();
        assert_eq!(name, "Edith Piaf");
        assert_eq!(sex, "female");
        assert_eq!(birth_year, 1915);
        assert_eq!(area, "France");
        assert_eq!(message, "La Mome Piaf");
        assert_eq!(award, "Grammy Hall of Fame");
    }

    #[test]
    fn missing_fields_are_rejected() {
        let mut f = form();
        f.birth_year = None;
        assert!(f.complete().is_none());

        let mut f = form();
        f.name = None;
        assert!(f.complete().is_none());
    }

    #[test]
    fn blank_fields_are_rejected_uniformly() {
        for blank in ["name", "sex", "area", "message", "award"] {
            let mut f = form();
            match blank {
                "name" => f.name = Some(String::new()),
                "sex" => f.sex = Some(String::new()),
                "area" => f.area = Some(String::new()),
                "message" => f.message = Some(String::new()),
                _ => f.award = Some(String::new()),
            }
            assert!(f.complete().is_none(), "blank `{}` accepted", blank);
        }
    }
}
