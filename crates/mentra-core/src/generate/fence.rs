/// Strip a Markdown code fence wrapped around a model response.
///
/// Handles ```` ```json ````, a bare ```` ``` ````, and a fence left open at the
/// end. Text without a fence is returned trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix("```") {
        body = match rest.find('\n') {
            // Drop the info string (`json`, `JSON`, ...) with its line.
            Some(newline) => &rest[newline + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }

    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }

    body.trim()
}
