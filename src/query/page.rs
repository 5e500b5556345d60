use thiserror::Error;
use tokio_postgres::types::ToSql;

use crate::{
    query::record::{self, Record, RowMapper},
    types::Pagination,
};

/// Rows per listing page, fixed across every listing endpoint.
pub const PAGE_SIZE: i64 = 10;

#[derive(Debug, Error)]
pub enum PageError {
    /// The route parameter was not a positive integer. User-correctable.
    #[error("invalid page number")]
    InvalidPageNumber,
    /// The backing store rejected or failed one of the two listing queries.
    /// Terminal for the request; no partial results are returned.
    #[error("query failed: {0}")]
    QueryFailure(#[from] tokio_postgres::Error),
}

/// Parses a 1-based page number from a route parameter.
pub fn parse_page(raw: &str) -> Result<i64, PageError> {
    match raw.parse::<i64>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(PageError::InvalidPageNumber),
    }
}

/// Listing-capable record types. Each maps to one FROM clause and one fixed
/// column list; nothing else is ever interpolated into listing SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Users,
    Songs,
    Collection,
}

impl Entity {
    fn from_clause(self) -> &'static str {
        match self {
            Entity::Users => "auth_user",
            Entity::Songs => "songs",
            Entity::Collection => {
                "collection INNER JOIN songs ON songs.title = collection.song"
            }
        }
    }

    fn columns(self) -> &'static str {
        match self {
            Entity::Users => "id, username, is_superuser, first_name, last_name, email, is_active",
            Entity::Songs => "id, title, duration, year, language, singer",
            Entity::Collection => {
                "collection.song, songs.singer, collection.username, collection.play_count, collection.is_favorite"
            }
        }
    }

    fn default_order(self) -> &'static str {
        match self {
            Entity::Users => "id",
            Entity::Songs => "id",
            Entity::Collection => "collection.song",
        }
    }

    fn mapper(self) -> &'static RowMapper {
        match self {
            Entity::Users => &record::USER,
            Entity::Songs => &record::SONG,
            Entity::Collection => &record::COLLECTION,
        }
    }
}

/// Filterable/sortable columns. Predicates and sort specs only ever name a
/// variant of this enum, so request data never reaches an identifier
/// position in the generated SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    IsActive,
    Title,
    Language,
    Singer,
    Collector,
    PlayCount,
    IsFavorite,
}

impl Field {
    fn column(self) -> &'static str {
        match self {
            Field::Username => "username",
            Field::IsActive => "is_active",
            Field::Title => "title",
            Field::Language => "language",
            Field::Singer => "singer",
            Field::Collector => "collection.username",
            Field::PlayCount => "collection.play_count",
            Field::IsFavorite => "collection.is_favorite",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// A bound predicate value. Only values travel through here; identifiers
/// come from the [`Field`] allow-list.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl Scalar {
    fn as_sql(&self) -> &(dyn ToSql + Sync) {
        match self {
            Scalar::Text(v) => v,
            Scalar::Int(v) => v,
            Scalar::Bool(v) => v,
        }
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

/// One page of a filtered listing, plus the metadata the page controls need.
pub struct PageListing {
    pub rows: Vec<Record>,
    pub total_count: i64,
    pub total_pages: i64,
    pub pagination: Option<Pagination>,
}

/// Composes the count query and the windowed select for one listing request.
///
/// Every listing endpoint supplies only its entity, equality predicates and
/// sort; the two read statements, the window arithmetic and the page-link
/// view-model are produced here so they cannot drift apart per endpoint.
///
/// The count and the select run as two separate reads on one connection.
/// A writer landing between them can make the two disagree; for a
/// read-mostly catalog that window is accepted rather than engineered
/// around.
pub struct PageQuery {
    entity: Entity,
    predicates: Vec<(Field, Scalar)>,
    sort: Option<(Field, Direction)>,
    page: i64,
}

impl PageQuery {
    pub fn new(entity: Entity, page: i64) -> Self {
        Self {
            entity,
            predicates: Vec::new(),
            sort: None,
            page,
        }
    }

    pub fn filter(mut self, field: Field, value: impl Into<Scalar>) -> Self {
        self.predicates.push((field, value.into()));
        self
    }

    pub fn order_by(mut self, field: Field, direction: Direction) -> Self {
        self.sort = Some((field, direction));
        self
    }

    fn where_clause(&self) -> String {
        if self.predicates.is_empty() {
            return String::new();
        }
        let conditions = self
            .predicates
            .iter()
            .enumerate()
            .map(|(i, (field, _))| format!("{} = ${}", field.column(), i + 1))
            .collect::<Vec<_>>()
            .join(" AND ");
        format!(" WHERE {}", conditions)
    }

    fn count_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM {}{}",
            self.entity.from_clause(),
            self.where_clause()
        )
    }

    fn select_sql(&self) -> String {
        let (order, direction) = match self.sort {
            Some((field, direction)) => (field.column(), direction.keyword()),
            None => (self.entity.default_order(), "ASC"),
        };
        let n = self.predicates.len();
        format!(
            "SELECT {} FROM {}{} ORDER BY {} {} LIMIT ${} OFFSET ${}",
            self.entity.columns(),
            self.entity.from_clause(),
            self.where_clause(),
            order,
            direction,
            n + 1,
            n + 2,
        )
    }

    /// Runs the count and the windowed select, converting rows per the
    /// entity's field list.
    ///
    /// A page past the end yields empty rows (the select runs at the
    /// requested offset) while the window view-model is computed from the
    /// last valid page, so every rendered link stays in range.
    pub async fn fetch(&self, db: &tokio_postgres::Client) -> Result<PageListing, PageError> {
        let params: Vec<&(dyn ToSql + Sync)> =
            self.predicates.iter().map(|(_, v)| v.as_sql()).collect();

        let count_row = db.query_one(self.count_sql().as_str(), &params).await?;
        let total_count: i64 = count_row.try_get(0)?;
        let total_pages = total_pages(total_count);

        let offset = (self.page - 1) * PAGE_SIZE;
        let mut select_params = params;
        select_params.push(&PAGE_SIZE);
        select_params.push(&offset);
        let rows = db.query(self.select_sql().as_str(), &select_params).await?;

        Ok(PageListing {
            rows: self.entity.mapper().records(&rows)?,
            total_count,
            total_pages,
            pagination: page_window(self.page, total_pages),
        })
    }
}

pub fn total_pages(total_count: i64) -> i64 {
    (total_count + PAGE_SIZE - 1) / PAGE_SIZE
}

/// Window for a requested page, clamped into the valid range so that an
/// out-of-range request still renders links a user can follow back.
fn page_window(page: i64, total_pages: i64) -> Option<Pagination> {
    Pagination::window(page.min(total_pages), total_pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_numbers_are_positive_integers() {
        assert_eq!(parse_page("1").unwrap(), 1);
        assert_eq!(parse_page("37").unwrap(), 37);
        assert!(matches!(parse_page("0"), Err(PageError::InvalidPageNumber)));
        assert!(matches!(parse_page("-2"), Err(PageError::InvalidPageNumber)));
        assert!(matches!(parse_page("x"), Err(PageError::InvalidPageNumber)));
        assert!(matches!(parse_page(""), Err(PageError::InvalidPageNumber)));
        assert!(matches!(
            parse_page("1.5"),
            Err(PageError::InvalidPageNumber)
        ));
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);
        assert_eq!(total_pages(95), 10);
        assert_eq!(total_pages(100), 10);
    }

    #[test]
    fn unfiltered_query_has_no_where_clause() {
        let q = PageQuery::new(Entity::Songs, 1);
        assert_eq!(q.count_sql(), "SELECT COUNT(*) FROM songs");
        assert_eq!(
            q.select_sql(),
            "SELECT id, title, duration, year, language, singer FROM songs \
             ORDER BY id ASC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn predicates_bind_values_by_placeholder() {
        let q = PageQuery::new(Entity::Songs, 2)
            .filter(Field::Language, "French")
            .filter(Field::Singer, "Edith Piaf");
        assert_eq!(
            q.count_sql(),
            "SELECT COUNT(*) FROM songs WHERE language = $1 AND singer = $2"
        );
        assert_eq!(
            q.select_sql(),
            "SELECT id, title, duration, year, language, singer FROM songs \
             WHERE language = $1 AND singer = $2 ORDER BY id ASC LIMIT $3 OFFSET $4"
        );
    }

    #[test]
    fn hostile_filter_values_never_reach_the_sql_text() {
        let q = PageQuery::new(Entity::Songs, 1).filter(Field::Title, "'; DROP TABLE songs; --");
        assert!(!q.count_sql().contains("DROP"));
        assert!(!q.select_sql().contains("DROP"));
    }

    #[test]
    fn collection_listing_sorts_by_play_count() {
        let q = PageQuery::new(Entity::Collection, 1)
            .filter(Field::Collector, "alice")
            .order_by(Field::PlayCount, Direction::Desc);
        assert_eq!(
            q.count_sql(),
            "SELECT COUNT(*) FROM collection INNER JOIN songs ON songs.title = collection.song \
             WHERE collection.username = $1"
        );
        assert_eq!(
            q.select_sql(),
            "SELECT collection.song, songs.singer, collection.username, \
             collection.play_count, collection.is_favorite \
             FROM collection INNER JOIN songs ON songs.title = collection.song \
             WHERE collection.username = $1 \
             ORDER BY collection.play_count DESC LIMIT $2 OFFSET $3"
        );
    }

    #[test]
    fn window_is_absent_for_empty_results() {
        assert_eq!(page_window(1, 0), None);
        assert_eq!(page_window(999, 0), None);
    }

    #[test]
    fn out_of_range_page_clamps_the_window() {
        // Requesting page 999 of 5: the row query runs at the requested
        // offset and comes back empty, but the links point at real pages.
        let p = page_window(999, 5).unwrap();
        assert_eq!(p.current, 5);
        assert_eq!(p.previous, Some(4));
        assert_eq!(p.next, None);
    }

    #[test]
    fn in_range_page_is_not_clamped() {
        let p = page_window(7, 12).unwrap();
        assert_eq!(p.current, 7);
        assert_eq!(p.previous, Some(6));
        assert_eq!(p.next, Some(8));
    }
}
