use serde_json::{json, Map, Value};
use tokio_postgres::Row;

/// One converted relational row: an ordered field-name → scalar mapping.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    BigInt,
    Text,
    Bool,
}

/// Declarative field list converting raw rows into JSON records.
///
/// The order of the specs is the order of the keys in the resulting object;
/// a column missing from the row or of the wrong type surfaces as a query
/// error, since the field lists are fixed alongside the SQL that feeds them.
pub struct RowMapper {
    fields: &'static [(&'static str, FieldKind)],
}

impl RowMapper {
    pub const fn new(fields: &'static [(&'static str, FieldKind)]) -> Self {
        Self { fields }
    }

    pub fn record(&self, row: &Row) -> Result<Record, tokio_postgres::Error> {
        let mut record = Map::with_capacity(self.fields.len());
        for &(name, kind) in self.fields {
            let value = match kind {
                FieldKind::Int => json!(row.try_get::<_, i32>(name)?),
                FieldKind::BigInt => json!(row.try_get::<_, i64>(name)?),
                FieldKind::Text => json!(row.try_get::<_, String>(name)?),
                FieldKind::Bool => json!(row.try_get::<_, bool>(name)?),
            };
            record.insert(name.to_string(), value);
        }
        Ok(record)
    }

    pub fn records(&self, rows: &[Row]) -> Result<Vec<Record>, tokio_postgres::Error> {
        rows.iter().map(|row| self.record(row)).collect()
    }
}

pub static USER: RowMapper = RowMapper::new(&[
    ("id", FieldKind::Int),
    ("username", FieldKind::Text),
    ("is_superuser", FieldKind::Bool),
    ("first_name", FieldKind::Text),
    ("last_name", FieldKind::Text),
    ("email", FieldKind::Text),
    ("is_active", FieldKind::Bool),
]);

pub static SONG: RowMapper = RowMapper::new(&[
    ("id", FieldKind::Int),
    ("title", FieldKind::Text),
    ("duration", FieldKind::Int),
    ("year", FieldKind::Int),
    ("language", FieldKind::Text),
    ("singer", FieldKind::Text),
]);

pub static SINGER: RowMapper = RowMapper::new(&[
    ("name", FieldKind::Text),
    ("sex", FieldKind::Text),
    ("birth_year", FieldKind::Int),
    ("area", FieldKind::Text),
    ("message", FieldKind::Text),
    ("award", FieldKind::Text),
]);

pub static COLLECTION: RowMapper = RowMapper::new(&[
    ("song", FieldKind::Text),
    ("singer", FieldKind::Text),
    ("username", FieldKind::Text),
    ("play_count", FieldKind::Int),
    ("is_favorite", FieldKind::Bool),
]);
