use axum::Router;
use serde_json::{json, Value};

use crate::query::page::PageListing;

pub mod auth;
pub mod collection;
pub mod recommend;
pub mod singer;
pub mod song;
pub mod user;

pub fn routes() -> Router<()> {
    Router::new()
        .nest("/auth", auth::routes())
        .nest("/users", user::routes())
        .nest("/songs", song::routes())
        .nest("/singers", singer::routes())
        .nest("/collection", collection::routes())
        .nest("/recommend", recommend::routes())
}

/// Shared listing body: the `pagination` key is omitted entirely when the
/// result set is empty, which tells clients to render no paging controls.
pub(crate) fn listing_body(listing: PageListing) -> Value {
    let mut body = json!({
        "data": listing.rows,
        "total": listing.total_count,
    });
    if let Some(pagination) = listing.pagination {
        body["pagination"] = json!(pagination);
    }
    body
}
