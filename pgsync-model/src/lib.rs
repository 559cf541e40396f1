//! Shared data model for the pgsync crates: the denormalized `FilmWork`
//! document, its nested `NamedItem` entities, and the `ExtractorCursor`
//! watermark triple.

pub mod cursor;
pub mod film_work;
pub mod named_item;

pub use cursor::ExtractorCursor;
pub use film_work::{FilmWork, Role};
pub use named_item::NamedItem;
