//! Response classification.
//!
//! A response counts as a redirect when its status is 3xx and it carries
//! a `Location` header. `304 Not Modified` and `300 Multiple Choices`
//! without a location are left alone.

use axum::http::header::LOCATION;
use axum::response::Response;
use url::Url;

/// Where a redirect response points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    location: String,
}

impl RedirectTarget {
    /// Extract the target of a redirect response.
    ///
    /// Returns `None` for non-redirects. A location that is not valid
    /// UTF-8 is returned lossily so it can still be shown.
    pub fn of(response: &Response) -> Option<Self> {
        if !response.status().is_redirection() {
            return None;
        }
        let value = response.headers().get(LOCATION)?;
        let location = match value.to_str() {
            Ok(s) => s.to_string(),
            Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
        };
        Some(Self { location })
    }

    /// The raw `Location` value.
    pub fn as_str(&self) -> &str {
        &self.location
    }

    /// True when the target may be offered as a link: a relative
    /// reference or an `http`/`https` URL. Anything else (`javascript:`,
    /// `data:`, ...) is shown as text only.
    pub fn is_navigable(&self) -> bool {
        match Url::parse(&self.location) {
            Ok(url) => matches!(url.scheme(), "http" | "https"),
            Err(url::ParseError::RelativeUrlWithoutBase) => true,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_found_with_location() {
        let res = (StatusCode::FOUND, [(LOCATION, "/admin")]).into_response();
        let target = RedirectTarget::of(&res).unwrap();
        assert_eq!(target.as_str(), "/admin");
        assert!(target.is_navigable());
    }

    #[test]
    fn test_navigable_schemes() {
        let target = |location: &'static str| {
            let res = (StatusCode::FOUND, [(LOCATION, location)]).into_response();
            RedirectTarget::of(&res).unwrap()
        };
        assert!(target("https://example.com/x").is_navigable());
        assert!(target("http://example.com").is_navigable());
        assert!(target("//example.com/x").is_navigable());
        assert!(target("node/1?destination=/admin").is_navigable());
        assert!(!target("javascript:alert(document.cookie)").is_navigable());
        assert!(!target(" JavaScript:alert(1)").is_navigable());
        assert!(!target("data:text/html,<script>x</script>").is_navigable());
        assert!(!target("vbscript:msgbox").is_navigable());
    }

    #[test]
    fn test_not_modified_is_not_redirect() {
        let res = StatusCode::NOT_MODIFIED.into_response();
        assert!(RedirectTarget::of(&res).is_none());
    }

    #[test]
    fn test_location_on_success_is_not_redirect() {
        let res = (StatusCode::CREATED, [(LOCATION, "/items/1")]).into_response();
        assert!(RedirectTarget::of(&res).is_none());
    }
}
