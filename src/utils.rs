//! Text escaping and model output cleanup helpers.

use std::borrow::Cow;

use crate::constants::prompt::CODE_FENCES;

/// Double each backslash so it stays literal inside a quoted SQL string.
pub fn escape_backslashes(text: &str) -> Cow<'_, str> {
    if text.contains('\\') {
        Cow::Owned(text.replace('\\', "\\\\"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Replace each newline with a literal `\n` escape.
pub fn escape_line_breaks(text: &str) -> Cow<'_, str> {
    if text.contains('\n') {
        Cow::Owned(text.replace('\n', "\\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Prefix each single quote with a backslash.
pub fn escape_quotes(text: &str) -> Cow<'_, str> {
    if text.contains('\'') {
        Cow::Owned(text.replace('\'', "\\'"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Escape backslashes, line breaks, then quotes, so text can sit inside a
/// single-quoted SQL literal.
pub fn escape_all(text: &str) -> Cow<'_, str> {
    if !text.contains(['\\', '\n', '\'']) {
        return Cow::Borrowed(text);
    }
    let escaped = escape_backslashes(text);
    let escaped = escape_line_breaks(&escaped);
    Cow::Owned(escape_quotes(&escaped).into_owned())
}

/// Strip every markdown code fence from model output and trim surrounding whitespace.
pub fn clean_model_output(raw: &str) -> String {
    let mut cleaned = raw.to_string();
    for fence in CODE_FENCES {
        if cleaned.contains(fence) {
            cleaned = cleaned.replace(fence, "");
        }
    }
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_breaks_become_literal_escapes() {
        assert_eq!(escape_line_breaks("a\nb\n"), "a\\nb\\n");
        assert!(matches!(escape_line_breaks("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn quotes_are_backslash_escaped() {
        assert_eq!(escape_quotes("it's Bob's"), "it\\'s Bob\\'s");
        assert!(matches!(escape_quotes("none"), Cow::Borrowed(_)));
    }

    #[test]
    fn escape_all_handles_both_in_order() {
        assert_eq!(escape_all("don't\nstop"), "don\\'t\\nstop");
        assert_eq!(escape_all("only\nbreaks"), "only\\nbreaks");
        assert_eq!(escape_all("only'quote"), "only\\'quote");
        assert!(matches!(escape_all("clean"), Cow::Borrowed(_)));
    }

    #[test]
    fn backslashes_are_doubled_before_quotes() {
        assert_eq!(escape_backslashes("C:\\tmp"), "C:\\\\tmp");
        assert_eq!(escape_all("C:\\'"), "C:\\\\\\'");
        assert_eq!(escape_all("a\\nb"), "a\\\\nb");
    }

    #[test]
    fn fences_are_removed_from_model_output() {
        let raw = "```json\n{\"a\": 1}\n```\n";
        assert_eq!(clean_model_output(raw), "{\"a\": 1}");
        assert_eq!(clean_model_output("```JSON x ``` y ```"), "x  y");
        assert_eq!(clean_model_output("  **bold** summary  "), "**bold** summary");
    }
}
