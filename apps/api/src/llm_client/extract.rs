//! Pulls the JSON object out of model output that may be fenced or wrapped in prose.

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Returns the first balanced `{...}` block in `text`.
///
/// Braces inside JSON strings (including escaped quotes) do not count toward nesting.
/// Returns `None` if there is no `{` or the first block never closes.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let text = strip_json_fences(text);
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_plain_object() {
        assert_eq!(extract_json_object("{\"a\": 1}"), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_fenced_object() {
        let input = "```json\n{\"laborHours\": 1.5}\n```";
        assert_eq!(extract_json_object(input), Some("{\"laborHours\": 1.5}"));
    }

    #[test]
    fn test_prose_wrapped_object() {
        let input = "Sure! Here is the estimate:\n{\"parts\": [{\"name\": \"Pads\"}]}\nLet me know.";
        assert_eq!(
            extract_json_object(input),
            Some("{\"parts\": [{\"name\": \"Pads\"}]}")
        );
    }

    #[test]
    fn test_first_of_several_objects() {
        assert_eq!(extract_json_object("{\"a\":1} {\"b\":2}"), Some("{\"a\":1}"));
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let input = r#"{"notes": "use {torque} spec \"}\" carefully", "x": {"y": 1}} trailing"#;
        assert_eq!(
            extract_json_object(input),
            Some(r#"{"notes": "use {torque} spec \"}\" carefully", "x": {"y": 1}}"#)
        );
    }

    #[test]
    fn test_missing_or_unbalanced() {
        assert_eq!(extract_json_object("I could not produce an estimate."), None);
        assert_eq!(extract_json_object("{\"a\": {\"b\": 1}"), None);
        assert_eq!(extract_json_object(""), None);
    }

    #[test]
    fn test_stray_closing_brace_before_object() {
        // Text before the first '{' is skipped entirely.
        assert_eq!(extract_json_object("} oops {\"a\":1}"), Some("{\"a\":1}"));
    }
}
