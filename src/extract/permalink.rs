//! Permalink resolution and post id derivation

use url::Url;

/// Path segment that precedes the post id in a permalink
pub const COMMENTS_MARKER: &str = "/comments/";

/// Resolves a permalink `href` to an absolute URL
///
/// Root-relative links (`/r/...`) are joined onto `origin`'s scheme and host;
/// anything else is returned unchanged.
///
/// # Example
///
/// ```
/// use forum_harvest::extract::resolve_permalink;
/// use url::Url;
///
/// let origin = Url::parse("https://www.reddit.com").unwrap();
/// assert_eq!(
///     resolve_permalink("/r/x/comments/abc123/title/", &origin),
///     "https://www.reddit.com/r/x/comments/abc123/title/"
/// );
/// ```
pub fn resolve_permalink(href: &str, origin: &Url) -> String {
    if href.starts_with('/') {
        format!("{}{}", origin.origin().ascii_serialization(), href)
    } else {
        href.to_string()
    }
}

/// Derives the post id from a permalink
///
/// The id is the path segment right after [`COMMENTS_MARKER`]. When the marker
/// is missing or the segment is empty, the full URL is used as the id so that
/// deduplication still works.
pub fn post_id_from_url(url: &str) -> String {
    url.split_once(COMMENTS_MARKER)
        .and_then(|(_, rest)| rest.split(['/', '?', '#']).next())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://www.reddit.com").unwrap()
    }

    #[test]
    fn test_root_relative_resolves_to_origin() {
        let url = resolve_permalink("/r/x/comments/abc123/title/", &origin());
        assert_eq!(url, "https://www.reddit.com/r/x/comments/abc123/title/");
        assert_eq!(post_id_from_url(&url), "abc123");
    }

    #[test]
    fn test_origin_path_is_ignored() {
        let origin = Url::parse("https://old.reddit.com/some/path/").unwrap();
        assert_eq!(
            resolve_permalink("/r/x/comments/q/", &origin),
            "https://old.reddit.com/r/x/comments/q/"
        );
    }

    #[test]
    fn test_absolute_link_is_unchanged() {
        let href = "https://www.reddit.com/r/y/comments/zz9/post/";
        assert_eq!(resolve_permalink(href, &origin()), href);
    }

    #[test]
    fn test_relative_without_slash_is_unchanged() {
        assert_eq!(resolve_permalink("r/x/comments/1/", &origin()), "r/x/comments/1/");
    }

    #[test]
    fn test_post_id_stops_at_query_and_fragment() {
        assert_eq!(
            post_id_from_url("https://www.reddit.com/r/x/comments/abc?utm=1"),
            "abc"
        );
        assert_eq!(
            post_id_from_url("https://www.reddit.com/r/x/comments/abc#top"),
            "abc"
        );
    }

    #[test]
    fn test_post_id_falls_back_to_url() {
        let url = "https://www.reddit.com/r/x/top/";
        assert_eq!(post_id_from_url(url), url);

        let trailing = "https://www.reddit.com/r/x/comments/";
        assert_eq!(post_id_from_url(trailing), trailing);
    }
}
