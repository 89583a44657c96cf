//! Endpoint helpers shared by the URL-based transports.

/// Strip `user:password@` from a URL so it can be logged.
pub(crate) fn without_userinfo(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };

    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);

    match authority.rsplit_once('@') {
        Some((_, host)) => format!("{}://{}{}", scheme, host, tail),
        None => url.to_string(),
    }
}
