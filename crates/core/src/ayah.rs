use serde::Serialize;

/// A verse split into its text and its reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedAyah {
    pub text: Option<String>,
    pub reference: Option<String>,
}

/// Split a stored verse of the form `﴿TEXT﴾ [REFERENCE]`.
/// Either part may be missing; both are trimmed.
pub fn parse(full: &str) -> ParsedAyah {
    ParsedAyah {
        text: between(full, '﴿', '﴾'),
        reference: between(full, '[', ']'),
    }
}

fn between(s: &str, open: char, close: char) -> Option<String> {
    let start = s.find(open)? + open.len_utf8();
    let len = s[start..].find(close)?;
    let inner = s[start..start + len].trim();
    (!inner.is_empty()).then(|| inner.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_text_and_reference() {
        let parsed = parse("﴿إِنَّ اللَّهَ مَعَ الصَّابِرِينَ﴾ [البقرة: 153]");
        assert_eq!(parsed.text.as_deref(), Some("إِنَّ اللَّهَ مَعَ الصَّابِرِينَ"));
        assert_eq!(parsed.reference.as_deref(), Some("البقرة: 153"));
    }

    #[test]
    fn missing_parts() {
        assert_eq!(parse(""), ParsedAyah::default());
        let only_text = parse("﴿ نص ﴾");
        assert_eq!(only_text.text.as_deref(), Some("نص"));
        assert_eq!(only_text.reference, None);
        assert_eq!(parse("[2:153]").reference.as_deref(), Some("2:153"));
    }

    #[test]
    fn unclosed_or_empty_delimiters() {
        assert_eq!(parse("﴿ jamais fermé").text, None);
        assert_eq!(parse("﴿﴾ []"), ParsedAyah::default());
    }
}
