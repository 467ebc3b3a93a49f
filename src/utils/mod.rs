//! Shared utility functions.

pub mod html;

pub use html::{extract_page, render_content, ExtractedPage};
