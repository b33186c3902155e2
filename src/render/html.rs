//! Minimal standalone HTML page.
//!
//! The page has no regions, assets or scripts: the body fragment is the
//! only content, so rendering it triggers no further work.

use std::fmt::Write;

use crate::diagnostics::DevelError;
use crate::render::PageRenderer;

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlPageRenderer;

impl PageRenderer for HtmlPageRenderer {
    fn render_page(&self, title: &str, body_html: &str) -> Result<String, DevelError> {
        let mut page = String::with_capacity(body_html.len() + 256);
        write!(
            page,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n{body_html}\n</body>\n</html>\n",
            title = escape_html(title),
        )
        .map_err(|e| DevelError::Render(e.to_string()))?;
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape_html(r#"/a?x=1&y="<script>'"#),
            "/a?x=1&amp;y=&quot;&lt;script&gt;&#39;"
        );
        assert_eq!(escape_html("/admin"), "/admin");
    }

    #[test]
    fn test_page_contains_title_and_body() {
        let page = HtmlPageRenderer.render_page("Devel <Redirect>", "<p>hi</p>").unwrap();
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Devel &lt;Redirect&gt;</title>"));
        assert!(page.contains("<p>hi</p>"));
    }
}
