//! URL and input validation utilities

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Pattern every accepted link must match in full
pub const YOUTUBE_WATCH_PATTERN: &str = r"^https://www\.youtube\.com/watch\?v=.*$";

/// Example shown next to the input field
pub const YOUTUBE_WATCH_EXAMPLE: &str = "https://www.youtube.com/watch?v=XXXX";

/// Reasons a Download click is refused before anything is spawned
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Input is blank. Please provide a valid youtube link")]
    Blank,

    #[error("Invalid URL.\nPlease enter a valid URL similar to 'https://www.youtube.com/watch?v=XXXX'")]
    InvalidUrl,
}

fn watch_url_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(YOUTUBE_WATCH_PATTERN).expect("static pattern compiles"))
}

/// Validate raw user input, returning it unchanged when accepted
pub fn validate_youtube_url(input: &str) -> Result<&str, ValidationError> {
    if input.trim().is_empty() {
        return Err(ValidationError::Blank);
    }
    if !watch_url_regex().is_match(input) {
        return Err(ValidationError::InvalidUrl);
    }
    Ok(input)
}

/// Extract the `v` query parameter of a watch URL, used for log context only
pub fn extract_video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_inputs_are_rejected() {
        for input in ["", " ", "\t", "   \t  ", "\n"] {
            assert_eq!(validate_youtube_url(input), Err(ValidationError::Blank));
        }
        assert_eq!(
            ValidationError::Blank.to_string(),
            "Input is blank. Please provide a valid youtube link"
        );
    }

    #[test]
    fn test_non_matching_inputs_are_rejected() {
        let inputs = [
            "youtube",
            "https://youtu.be/abc123",
            "http://www.youtube.com/watch?v=abc123",
            "https://youtube.com/watch?v=abc123",
            "https://m.youtube.com/watch?v=abc123",
            " https://www.youtube.com/watch?v=abc123",
            "https://www.youtube.com/playlist?list=PL123",
            "https://wwwXyoutube.com/watch?v=abc123",
        ];
        for input in inputs {
            assert_eq!(
                validate_youtube_url(input),
                Err(ValidationError::InvalidUrl),
                "input {:?} should be rejected",
                input
            );
        }
        assert_eq!(
            ValidationError::InvalidUrl.to_string(),
            "Invalid URL.\nPlease enter a valid URL similar to 'https://www.youtube.com/watch?v=XXXX'"
        );
    }

    #[test]
    fn test_watch_urls_are_accepted_unchanged() {
        let inputs = [
            "https://www.youtube.com/watch?v=abc123",
            "https://www.youtube.com/watch?v=",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "https://www.youtube.com/watch?v=abc 123",
        ];
        for input in inputs {
            assert_eq!(validate_youtube_url(input), Ok(input));
        }
    }

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v="), None);
        assert_eq!(extract_video_id("not a url"), None);
    }
}
