//! Normalization of scraped strings before they land in markdown.

/// Collapse every whitespace run (including newlines) to a single space.
///
/// Scraped titles and descriptions often carry layout whitespace; a stray
/// newline inside a heading or a bold label would break the document.
pub(crate) fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The first non-blank value, normalized to a single line.
pub(crate) fn first_present<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(single_line)
        .find(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_collapses_whitespace() {
        assert_eq!(single_line("  Hunyuan3D\n\t 2.0  "), "Hunyuan3D 2.0");
        assert_eq!(single_line("\n \n"), "");
    }

    #[test]
    fn first_present_skips_blank_and_missing() {
        let picked = first_present([None, Some("   "), Some("Widget"), Some("Other")]);
        assert_eq!(picked.as_deref(), Some("Widget"));
        assert!(first_present([None, Some("")]).is_none());
    }
}
