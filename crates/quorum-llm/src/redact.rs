//! Keeping secrets out of logs and error messages

/// Longest provider error text passed through
const MAX_ERROR_CHARS: usize = 300;

/// Show only the last four characters of an API key.
///
/// ```
/// use quorum_llm::redact::mask_api_key;
/// assert_eq!(mask_api_key("sk-1234567890abcdef"), "****cdef");
/// assert_eq!(mask_api_key("short"), "****");
/// ```
#[must_use]
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 12 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

/// Turn a provider error into text safe to log and propagate.
///
/// Authentication failures never echo the provider text, since it may
/// contain the rejected key. Long messages are clipped.
#[must_use]
pub fn redact_api_error(error: &str) -> String {
    let lower = error.to_lowercase();
    let is_auth = ["api key", "apikey", "invalid key", "unauthorized", "authentication"]
        .iter()
        .any(|needle| lower.contains(needle));
    if is_auth {
        return "authentication failed; check the configured API key".to_string();
    }
    if lower.contains("rate limit") || lower.contains("quota") {
        return "rate limited by the provider".to_string();
    }

    match error.char_indices().nth(MAX_ERROR_CHARS) {
        Some((cut, _)) => format!("{}...(truncated)", &error[..cut]),
        None => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_api_key() {
        let masked = mask_api_key("sk-1234567890abcdefghij");
        assert_eq!(masked, "****ghij");
        assert_eq!(mask_api_key(""), "****");
        assert_eq!(mask_api_key("12345678901"), "****");
    }

    #[test]
    fn test_auth_errors_drop_provider_text() {
        let redacted = redact_api_error("Invalid API key: sk-1234567890");
        assert!(!redacted.contains("sk-"));
        assert!(redacted.contains("authentication"));
    }

    #[test]
    fn test_rate_limit_and_passthrough() {
        assert_eq!(
            redact_api_error("Rate limit exceeded: 100 requests per minute"),
            "rate limited by the provider"
        );
        assert_eq!(redact_api_error("Model not found"), "Model not found");
    }

    #[test]
    fn test_long_errors_clipped_on_char_boundary() {
        let long = "é".repeat(400);
        let redacted = redact_api_error(&long);
        assert!(redacted.ends_with("...(truncated)"));
        assert_eq!(redacted.chars().filter(|c| *c == 'é').count(), MAX_ERROR_CHARS);
    }
}
