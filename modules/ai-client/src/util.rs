/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Strip markdown code fences some models wrap around JSON replies.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_multibyte_chars() {
        let text = "Mikroelektronik für Sensorik";
        let truncated = truncate_to_char_boundary(text, 17);
        assert!(truncated.len() <= 17);
        assert!(text.starts_with(truncated));
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_to_char_boundary("Graphene", 100), "Graphene");
    }

    #[test]
    fn code_fences_are_removed() {
        assert_eq!(strip_code_blocks("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("  {}  "), "{}");
    }
}
