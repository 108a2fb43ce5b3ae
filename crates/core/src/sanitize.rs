/// Sentence delimiters, in priority order. Only the first one present is
/// used to split.
const DELIMITERS: [char; 4] = ['.', '!', '?', '\n'];

const MAX_SENTENCES: usize = 3;

/// Trim raw model output to at most three sentences ending in terminal
/// punctuation. Returns an empty string when nothing usable remains.
pub fn sanitize(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let sentences: Vec<&str> = match DELIMITERS.iter().find(|d| trimmed.contains(**d)) {
        Some(&delimiter) => trimmed
            .split(delimiter)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect(),
        None => vec![trimmed],
    };
    if sentences.is_empty() {
        return String::new();
    }

    let mut text = sentences[..sentences.len().min(MAX_SENTENCES)].join(". ");
    if !text.ends_with(['.', '!', '?']) {
        text.push('.');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence_count(text: &str) -> usize {
        text.split(". ").count()
    }

    #[test]
    fn empty_and_blank_input() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("   \n  "), "");
        assert_eq!(sanitize("..."), "");
        assert_eq!(sanitize("\n\n"), "");
    }

    #[test]
    fn keeps_two_sentences() {
        assert_eq!(
            sanitize("  Ce douaa apaise le cœur. Il rappelle la patience.  "),
            "Ce douaa apaise le cœur. Il rappelle la patience."
        );
    }

    #[test]
    fn truncates_to_three_sentences() {
        let out = sanitize("Un. Deux. Trois. Quatre. Cinq.");
        assert_eq!(out, "Un. Deux. Trois.");
        assert_eq!(sentence_count(&out), 3);
    }

    #[test]
    fn appends_terminal_period() {
        assert_eq!(sanitize("Une pensée sans fin"), "Une pensée sans fin.");
    }

    #[test]
    fn dot_has_priority_over_other_delimiters() {
        // Split on '.', so '!' stays inside its fragment.
        assert_eq!(sanitize("Quelle paix! Vraiment. Oui"), "Quelle paix! Vraiment. Oui.");
    }

    #[test]
    fn exclamation_split_rejoins_with_periods() {
        assert_eq!(sanitize("Courage! Patience! Espoir! Foi!"), "Courage. Patience. Espoir.");
    }

    #[test]
    fn newline_split() {
        assert_eq!(sanitize("Première ligne\n\nDeuxième ligne"), "Première ligne. Deuxième ligne.");
    }

    #[test]
    fn output_always_terminated() {
        for raw in ["a", "a b c", "x? y", "line\nother", "fin!", "ok."] {
            let out = sanitize(raw);
            assert!(out.ends_with(['.', '!', '?']), "{raw:?} -> {out:?}");
            assert!(sentence_count(&out) <= 3);
        }
    }
}
