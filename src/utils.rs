/// Adds a scheme when the user typed a bare host and drops trailing slashes so endpoint
/// paths can be joined onto the result.
pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
