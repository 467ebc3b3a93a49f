//! Data models for harvested stories.

mod item;
mod record;

pub use item::Item;
pub use record::{website_from_url, Record};
