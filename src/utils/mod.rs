use time::OffsetDateTime;

/// Escape HTML special characters
pub fn escape_html(text: &str) -> String {
    text.replace("&", "&amp;")
        .replace("<", "&lt;")
        .replace(">", "&gt;")
        .replace("\"", "&quot;")
        .replace("'", "&#39;")
}

/// Escape HTML attribute values
pub fn escape_attr(text: &str) -> String {
    escape_html(text)
}

/// Normalize a base URL prefix to `/` or `/segment[/segment...]`
pub fn normalize_base(base: &str) -> String {
    let trimmed = base.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", collapse_slashes(trimmed))
    }
}

/// Join a base prefix and a path, collapsing duplicate slashes
pub fn join_url(base: &str, path: &str) -> String {
    let joined = format!("/{}/{}", base.trim_matches('/'), path.trim_start_matches('/'));
    let mut out = collapse_slashes(&joined);
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for ch in path.chars() {
        if ch == '/' && out.ends_with('/') {
            continue;
        }
        out.push(ch);
    }
    out
}

/// Percent-decode a request path; undecodable input is used as is
pub fn decode_path(path: &str) -> String {
    match urlencoding::decode(path) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => path.to_string(),
    }
}

/// Percent-encode each segment of a path, keeping the `/` separators
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether the raw query string contains `key`, with or without a value
pub fn has_query_key(query: Option<&str>, key: &str) -> bool {
    query
        .unwrap_or("")
        .split('&')
        .any(|pair| pair.split_once('=').map_or(pair, |(k, _)| k) == key)
}

/// Format a commit timestamp for display
pub fn format_time(time: &OffsetDateTime) -> String {
    let fmt = time::format_description::well_known::Rfc3339;
    time.format(&fmt).unwrap_or_else(|_| time.unix_timestamp().to_string())
}
