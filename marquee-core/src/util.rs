//! Utility functions for marquee

/// Safely truncates a string to a maximum number of characters.
///
/// Respects utf8 character boundaries.
pub fn safe_truncate_utf8(s: impl AsRef<str>, max_chars: usize) -> String {
    s.as_ref().chars().take(max_chars).collect()
}

/// Debug print a long string by truncating to n characters
///
/// # Example
///
/// ```
/// # use marquee_core::util::debug_long_utf8;
/// let s = debug_long_utf8("🎬".repeat(10), 3);
///
/// assert_eq!(s, "🎬🎬🎬 (10)");
/// ```
pub fn debug_long_utf8(s: impl AsRef<str>, max_chars: usize) -> String {
    let trunc = safe_truncate_utf8(&s, max_chars);

    format!("{} ({})", trunc, s.as_ref().chars().count())
}

/// Strips a surrounding markdown code fence, as chat models like to wrap json in one.
///
/// ```
/// # use marquee_core::util::strip_code_fences;
/// assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
/// ```
pub fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    let Some(fenced) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (`json`) on the opening line
    let body = fenced.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_truncate_str_with_utf8_char_boundary() {
        let s = "🦀".repeat(101);

        // Single char
        assert_eq!(safe_truncate_utf8(&s, 100).chars().count(), 100);

        // With invalid char boundary
        let s = "Jürgen".repeat(100);
        assert_eq!(safe_truncate_utf8(&s, 100).chars().count(), 100);
    }

    #[test]
    fn test_strip_code_fences_without_info_string() {
        assert_eq!(strip_code_fences("```\n[1, 2]\n```\n"), "[1, 2]");
    }

    #[test]
    fn test_strip_code_fences_unterminated() {
        assert_eq!(strip_code_fences("```json\n[1, 2]"), "[1, 2]");
    }
}
