//! Rendering of the redirect inspection page.

pub mod html;

pub use html::{escape_html, HtmlPageRenderer};

use crate::diagnostics::DevelError;

/// Produces a complete page around an already-safe HTML body fragment.
pub trait PageRenderer: Send + Sync {
    fn render_page(&self, title: &str, body_html: &str) -> Result<String, DevelError>;
}

impl<F> PageRenderer for F
where
    F: Fn(&str, &str) -> Result<String, DevelError> + Send + Sync,
{
    fn render_page(&self, title: &str, body_html: &str) -> Result<String, DevelError> {
        self(title, body_html)
    }
}
