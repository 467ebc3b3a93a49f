//! HTML page extraction and rendering.

use scraper::{Html, Selector};

/// Title and body subtree pulled out of an HTML document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Trimmed `<title>` text, empty if missing.
    pub title: String,
    /// Outer HTML of `<body>`, empty if the document has none.
    pub body_html: String,
}

/// Split a document into its title and `<body>` subtree.
pub fn extract_page(html: &str) -> ExtractedPage {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    // html5ever synthesizes an empty <body> for bare documents; only keep a
    // body that was actually present in the source.
    let body_html = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .filter(|el| el.has_children())
        .map(|el| el.html())
        .unwrap_or_default();

    ExtractedPage { title, body_html }
}

/// Render an HTML fragment to Markdown text.
pub fn render_content(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    htmd::convert(html)
        .unwrap_or_else(|_| {
            // Fallback: strip tags and return plain text
            let fragment = Html::parse_fragment(html);
            fragment.root_element().text().collect::<String>()
        })
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title_and_body() {
        let html = r#"<html><head><title>  A Page  </title></head>
            <body><h1>Heading</h1><p>Some <b>bold</b> text.</p></body></html>"#;
        let page = extract_page(html);
        assert_eq!(page.title, "A Page");
        assert!(page.body_html.starts_with("<body>"));
        assert!(page.body_html.contains("<h1>Heading</h1>"));
        assert!(!page.body_html.contains("<title>"));
    }

    #[test]
    fn test_extract_missing_parts() {
        let page = extract_page("<html><head><title></title></head></html>");
        assert_eq!(page.title, "");
        assert_eq!(page.body_html, "");
    }

    #[test]
    fn test_render_content() {
        let text = render_content("<body><h1>Heading</h1><p>Some <b>bold</b> text.</p></body>");
        assert!(text.contains("Heading"));
        assert!(text.contains("**bold**"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_content(""), "");
        assert_eq!(render_content("   \n"), "");
    }
}
