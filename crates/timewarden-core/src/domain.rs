//! Hostname extraction, normalization and matching.
//!
//! The matching policy is strict by design: only http/https URLs yield a
//! host, comparison is exact, and the single piece of subdomain inference is
//! the `www.` variant: a configured `example.test` also matches
//! `www.example.test`, while a configured `www.example.test` matches only
//! itself.

/// Normalize a user-entered hostname: trimmed, lowercase, no trailing dot.
///
/// Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(hostname: &str) -> String {
    hostname.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Whether a hostname is already in normal form and shaped like a host.
///
/// Rejects empty strings and anything carrying a scheme, path, port, query
/// or whitespace.
pub fn is_normalized(hostname: &str) -> bool {
    !hostname.is_empty()
        && hostname == normalize(hostname)
        && !hostname
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | ':' | '?' | '#' | '@'))
}

/// Extract the host from a URL, if and only if the scheme is http or https.
///
/// Returns the lowercase host with any userinfo and port stripped. Bracketed
/// IPv6 hosts are returned with their brackets intact.
pub fn host_from_url(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;

    // Authority ends at the first path/query/fragment delimiter.
    let authority_end = rest
        .find(|c| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    let mut authority = &rest[..authority_end];

    if let Some((_userinfo, host_port)) = authority.rsplit_once('@') {
        authority = host_port;
    }

    let host = if let Some(stripped) = authority.strip_prefix('[') {
        // IPv6 literal: keep brackets, drop everything after the close.
        let end = stripped.find(']')?;
        &authority[..end + 2]
    } else {
        match authority.rsplit_once(':') {
            Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
            _ => authority,
        }
    };

    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

/// Whether a URL's host matches a configured hostname under the strict
/// policy.
pub fn hostname_matches(configured: &str, host: &str) -> bool {
    if configured == host {
        return true;
    }
    // A bare hostname also claims its `www.` variant; a `www.` hostname
    // claims only itself.
    if !configured.starts_with("www.") {
        if let Some(stripped) = host.strip_prefix("www.") {
            return stripped == configured;
        }
    }
    false
}

/// Resolve a URL against a set of configured hostnames.
///
/// Returns the configured hostname (not the URL's host) on a match, so
/// callers key all state by the exact configured string.
pub fn match_url<'a, I>(url: &str, configured: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let host = host_from_url(url)?;
    configured
        .into_iter()
        .find(|c| hostname_matches(c, &host))
}
