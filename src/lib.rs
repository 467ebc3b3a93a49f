//! hnharvest - resumable Hacker News story harvester.
//!
//! Walks the item ID space from the high-water mark down, stores stories that
//! link to external pages, and later enriches each stored story with the
//! rendered content of its linked page.

pub mod cli;
pub mod config;
pub mod models;
pub mod repository;
pub mod scrapers;
pub mod services;
pub mod utils;
