/// Text processing utilities
pub mod text {
    pub const TRUNCATION_MARKER: &str = "\n... (content truncated)";

    /// Cut `text` to at most `max_chars` characters, appending a marker when cut.
    pub fn truncate_chars(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            None => text.to_string(),
            Some((byte_index, _)) => {
                let mut truncated = text[..byte_index].to_string();
                truncated.push_str(TRUNCATION_MARKER);
                truncated
            }
        }
    }

    /// Short single-line preview for log output.
    pub fn preview(text: &str, max_chars: usize) -> String {
        let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
        match flattened.char_indices().nth(max_chars) {
            None => flattened,
            Some((byte_index, _)) => format!("{}...", &flattened[..byte_index]),
        }
    }
}

/// URL utilities
pub mod url {
    use url::Url;

    /// Extract the host of a URL
    pub fn extract_domain(url_str: &str) -> Option<String> {
        Url::parse(url_str)
            .ok()
            .and_then(|url| url.host_str().map(|h| h.to_string()))
    }

    /// True for http(s) URLs that carry a host
    pub fn is_valid_folder_url(url_str: &str) -> bool {
        match Url::parse(url_str) {
            Ok(url) => (url.scheme() == "http" || url.scheme() == "https") && url.host_str().is_some(),
            Err(_) => false,
        }
    }
}
