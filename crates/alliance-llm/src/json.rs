//! Lenient JSON extraction from model output.

/// Pulls the outermost JSON object out of a model reply.
///
/// Models sometimes wrap JSON in Markdown fences or add prose around it.
/// Returns the text between the first `{` and the last `}`, or `None`
/// when there is no such span.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object() {
        assert_eq!(extract_json_object(r#"{"a":1}"#), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_fenced_object() {
        let text = "```json\n{\"a\": {\"b\": 2}}\n```";
        assert_eq!(extract_json_object(text), Some("{\"a\": {\"b\": 2}}"));
    }

    #[test]
    fn test_prose_around_object() {
        let text = "Voici l'évaluation : {\"ok\": true} Merci.";
        assert_eq!(extract_json_object(text), Some("{\"ok\": true}"));
    }

    #[test]
    fn test_no_object() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} {"), None);
    }
}
