//! Condensing of error response bodies

const MAX_BODY_CHARS: usize = 500;

/// Turn an error response body into something fit for an error message
///
/// HTML error pages shrink to their `<title>`, even an empty one; pages
/// without a title tag get a fixed message. Anything else is kept verbatim
/// up to 500 characters.
#[must_use]
pub fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim_start();
    // ASCII lowercasing keeps byte offsets aligned with `trimmed`
    let lower = trimmed.to_ascii_lowercase();

    if lower.starts_with("<!doctype html") || lower.starts_with("<html") {
        return match html_title(trimmed, &lower) {
            Some(title) => format!("Server says: {title}"),
            None => "Received HTML response instead of JSON".to_string(),
        };
    }

    match body.char_indices().nth(MAX_BODY_CHARS) {
        Some((cut, _)) => format!("{}... (truncated)", &body[..cut]),
        None => body.to_string(),
    }
}

fn html_title<'a>(html: &'a str, lower: &str) -> Option<&'a str> {
    let open = lower.find("<title")?;
    let start = open + lower[open..].find('>')? + 1;
    let end = start + lower[start..].find("</title")?;
    Some(html[start..end].trim())
}
