//! HTML backend for markdown rendering.
//!
//! Produces semantic HTML5 output suitable for embedding in a page.

use std::borrow::Cow;
use std::fmt::Write;

use url::Url;

use crate::backend::{AlertKind, RenderBackend};
use crate::state::escape_html;

/// HTML render backend.
///
/// Produces semantic HTML5 with:
/// - `<blockquote>` for blockquotes, `<div class="alert">` for alerts
/// - `<img>` for images
/// - Relative links resolved against the document URL
/// - Links with schemes other than `http`, `https` and `mailto` replaced by `#`
pub struct HtmlBackend;

/// Schemes kept in `href` and `src` attributes.
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

impl RenderBackend for HtmlBackend {
    fn blockquote_start(out: &mut String) {
        out.push_str("<blockquote>");
    }

    fn blockquote_end(out: &mut String) {
        out.push_str("</blockquote>");
    }

    fn alert_start(kind: AlertKind, out: &mut String) {
        let (class, title) = match kind {
            AlertKind::Note => ("note", "Note"),
            AlertKind::Tip => ("tip", "Tip"),
            AlertKind::Important => ("important", "Important"),
            AlertKind::Warning => ("warning", "Warning"),
            AlertKind::Caution => ("caution", "Caution"),
        };
        write!(
            out,
            r#"<div class="alert alert-{class}"><p class="alert-title">{title}</p>"#
        )
        .unwrap();
    }

    fn alert_end(_kind: AlertKind, out: &mut String) {
        out.push_str("</div>");
    }

    fn image(src: &str, alt: &str, title: &str, out: &mut String) {
        let title_attr = if title.is_empty() {
            String::new()
        } else {
            format!(r#" title="{}""#, escape_html(title))
        };
        write!(
            out,
            r#"<img src="{}"{title_attr} alt="{}">"#,
            escape_html(src),
            escape_html(alt)
        )
        .unwrap();
    }

    fn transform_link<'a>(url: &'a str, base_url: Option<&Url>) -> Cow<'a, str> {
        if !has_allowed_scheme(url) {
            return Cow::Borrowed("#");
        }
        match base_url {
            Some(base) => resolve_link(url, base),
            None => Cow::Borrowed(url),
        }
    }
}

/// Whether `url` is relative or uses one of [`ALLOWED_SCHEMES`].
///
/// Parsing strips leading whitespace and embedded tabs, so `" java\tscript:"`
/// is still seen as `javascript`.
fn has_allowed_scheme(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => ALLOWED_SCHEMES.contains(&parsed.scheme()),
        Err(_) => true,
    }
}

/// Resolve a link found in a remote document against the document URL.
///
/// - `docs/guide.md` → `https://host/repo/docs/guide.md`
/// - `../LICENSE` → `https://host/LICENSE`
/// - `/abs/path` → `https://host/abs/path`
///
/// Absolute URLs, fragment-only links and unparseable values are returned
/// unchanged.
fn resolve_link<'a>(url: &'a str, base: &Url) -> Cow<'a, str> {
    if url.is_empty() || url.starts_with('#') || Url::parse(url).is_ok() {
        return Cow::Borrowed(url);
    }
    match base.join(url) {
        Ok(resolved) => Cow::Owned(resolved.into()),
        Err(_) => Cow::Borrowed(url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn base() -> Url {
        Url::parse("https://raw.example.com/org/repo/main/README.md").unwrap()
    }

    #[test]
    fn test_blockquote() {
        let mut out = String::new();
        HtmlBackend::blockquote_start(&mut out);
        out.push_str("content");
        HtmlBackend::blockquote_end(&mut out);
        assert_eq!(out, "<blockquote>content</blockquote>");
    }

    #[test]
    fn test_image() {
        let mut out = String::new();
        HtmlBackend::image("image.png", "Alt text", "", &mut out);
        assert_eq!(out, r#"<img src="image.png" alt="Alt text">"#);
    }

    #[test]
    fn test_image_with_title() {
        let mut out = String::new();
        HtmlBackend::image("image.png", "Alt text", "Image title", &mut out);
        assert_eq!(
            out,
            r#"<img src="image.png" title="Image title" alt="Alt text">"#
        );
    }

    #[test]
    fn test_alert_warning() {
        let mut out = String::new();
        HtmlBackend::alert_start(AlertKind::Warning, &mut out);
        out.push_str("<p>careful</p>");
        HtmlBackend::alert_end(AlertKind::Warning, &mut out);
        assert_eq!(
            out,
            r#"<div class="alert alert-warning"><p class="alert-title">Warning</p><p>careful</p></div>"#
        );
    }

    #[test]
    fn test_resolve_link_sibling() {
        assert_eq!(
            resolve_link("docs/guide.md", &base()),
            "https://raw.example.com/org/repo/main/docs/guide.md"
        );
    }

    #[test]
    fn test_resolve_link_parent() {
        assert_eq!(
            resolve_link("../LICENSE", &base()),
            "https://raw.example.com/org/repo/LICENSE"
        );
    }

    #[test]
    fn test_resolve_link_root_relative() {
        assert_eq!(
            resolve_link("/logo.svg", &base()),
            "https://raw.example.com/logo.svg"
        );
    }

    #[test]
    fn test_resolve_link_absolute_unchanged() {
        assert_eq!(
            resolve_link("https://example.com/x", &base()),
            "https://example.com/x"
        );
        assert_eq!(
            resolve_link("mailto:dev@example.com", &base()),
            "mailto:dev@example.com"
        );
    }

    #[test]
    fn test_resolve_link_fragment_unchanged() {
        assert_eq!(resolve_link("#install", &base()), "#install");
    }

    #[test]
    fn test_transform_link_without_base() {
        assert_eq!(HtmlBackend::transform_link("./page.md", None), "./page.md");
    }

    #[test]
    fn test_transform_link_neutralizes_script_schemes() {
        for url in [
            "javascript:alert(1)",
            "JavaScript:alert(1)",
            " java\tscript:alert(1)",
            "data:text/html,<b>x</b>",
            "vbscript:msgbox",
        ] {
            assert_eq!(HtmlBackend::transform_link(url, None), "#", "{url}");
            assert_eq!(HtmlBackend::transform_link(url, Some(&base())), "#", "{url}");
        }
    }

    #[test]
    fn test_transform_link_keeps_allowed_schemes() {
        assert_eq!(
            HtmlBackend::transform_link("https://example.com/x", Some(&base())),
            "https://example.com/x"
        );
        assert_eq!(
            HtmlBackend::transform_link("mailto:dev@example.com", None),
            "mailto:dev@example.com"
        );
        assert_eq!(HtmlBackend::transform_link("#usage", None), "#usage");
    }
}
