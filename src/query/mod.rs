pub mod page;
pub mod record;

pub use page::{parse_page, Direction, Entity, Field, PageError, PageQuery, PAGE_SIZE};
pub use record::{Record, RowMapper};
