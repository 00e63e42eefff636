//! `Link` header parsing for GitHub's cursor pagination.

use reqwest::header::HeaderValue;

/// Extract the `rel="next"` URL from a `Link` header, if present.
pub fn next_link(header: Option<&HeaderValue>) -> Option<String> {
    header
        .and_then(|value| value.to_str().ok())
        .and_then(parse_next)
}

/// Parse `<url>; rel="next", <url>; rel="last"` and return the next URL.
pub fn parse_next(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut segments = part.split(';').map(str::trim);
        let target = segments.next()?;
        let is_next = segments.any(|param| {
            param
                .strip_prefix("rel=")
                .map(|rel| rel.trim_matches('"').split_whitespace().any(|r| r == "next"))
                .unwrap_or(false)
        });

        if !is_next {
            return None;
        }

        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}
