// src/sanitize.rs
// Strip code fences the model sometimes wraps around its JSON reply

/// Opening fence with language tag
pub const JSON_FENCE: &str = "```json";
/// Bare fence
pub const FENCE: &str = "```";

/// Remove every fence marker and trim surrounding whitespace.
///
/// The tagged fence goes first so its `json` suffix doesn't survive the bare
/// fence pass. Total and idempotent.
pub fn sanitize(raw: &str) -> String {
    raw.replace(JSON_FENCE, "")
        .replace(FENCE, "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{"summary": "不错", "readability": {"hsk_level": "HSK4", "score": 70}}"#;

    fn wrap(s: &str) -> String {
        format!("{}\n{}\n{}", JSON_FENCE, s, FENCE)
    }

    #[test]
    fn test_plain_json_untouched() {
        assert_eq!(sanitize(PAYLOAD), PAYLOAD);
    }

    #[test]
    fn test_fenced_json_unwrapped() {
        assert_eq!(sanitize(&wrap(PAYLOAD)), PAYLOAD);
    }

    #[test]
    fn test_wrap_with_padding_equals_trimmed() {
        let padded = format!("  \n{}\n\t", PAYLOAD);
        assert_eq!(sanitize(&wrap(&padded)), padded.trim());
    }

    #[test]
    fn test_bare_fences_removed() {
        assert_eq!(sanitize("```\n{}\n```"), "{}");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "   ",
            PAYLOAD,
            "```json```json",
            "``````",
            "````json",
            "prose with ``` in the middle",
            "\n```json\n{\"a\": 1}\n```\n",
            "去年夏天，我和朋友一起去了北京",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_fences_anywhere_removed() {
        assert_eq!(sanitize("a```b```jsonc"), "abc");
    }
}
