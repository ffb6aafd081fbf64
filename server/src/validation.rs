use crate::error::ApiError;

/// Maximum text length for TTS requests, in characters (provider input limit)
pub const MAX_TEXT_LENGTH: usize = 4096;

/// Validate the text of a TTS request and hand it back.
///
/// A missing field and an empty string are the same thing to callers.
pub fn validate_tts_request(text: Option<&str>) -> Result<&str, ApiError> {
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return Err(ApiError::InvalidInput("Text is required".to_string())),
    };

    let chars = text.chars().count();
    if chars > MAX_TEXT_LENGTH {
        return Err(ApiError::InvalidInput(format!(
            "Text too long ({} characters, max {})",
            chars, MAX_TEXT_LENGTH
        )));
    }

    Ok(text)
}

/// First characters of `text`, for log lines.
pub fn preview(text: &str) -> String {
    const PREVIEW_CHARS: usize = 50;
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().nth(PREVIEW_CHARS).is_some() {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tts_request_valid() {
        assert_eq!(validate_tts_request(Some("Hello")).unwrap(), "Hello");
        assert!(validate_tts_request(Some(" ")).is_ok());
    }

    #[test]
    fn test_validate_tts_request_missing_text() {
        let result = validate_tts_request(None);
        assert!(result.is_err());
        if let Err(ApiError::InvalidInput(msg)) = result {
            assert_eq!(msg, "Text is required");
        }
    }

    #[test]
    fn test_validate_tts_request_empty_text() {
        assert!(matches!(
            validate_tts_request(Some("")),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_tts_request_too_long() {
        let long_text = "a".repeat(MAX_TEXT_LENGTH + 1);
        let result = validate_tts_request(Some(&long_text));
        assert!(result.is_err());
        if let Err(ApiError::InvalidInput(msg)) = result {
            assert!(msg.contains("too long"));
        }
    }

    #[test]
    fn test_length_is_counted_in_characters() {
        // 4096 two-byte characters are within the limit
        let text = "é".repeat(MAX_TEXT_LENGTH);
        assert!(validate_tts_request(Some(&text)).is_ok());
    }

    #[test]
    fn test_preview_truncates_long_text() {
        assert_eq!(preview("short"), "short");
        let long = "x".repeat(80);
        let p = preview(&long);
        assert_eq!(p.len(), 53);
        assert!(p.ends_with("..."));
    }
}
