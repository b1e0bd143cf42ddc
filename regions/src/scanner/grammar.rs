use std::sync::LazyLock;

use regex::Regex;

/// Closing marker terminating every region.
pub const CLOSE_MARKER: &str = "[/editable]";

/// Prefix shared by every ordinal region name.
pub const ORDINAL_PREFIX: &str = "region-";

/// Opening marker that is bare, unnamed, or carries an ordinal-shaped name.
/// These are the markers eligible for renumbering.
static OPENING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\[editable(?:(?: +name="(?P<name>(?:region-[0-9]*)*)") *\]|\])"#)
        .expect("opening marker grammar is valid")
});

/// Open marker, lazily matched body, close marker. Any name.
static REGION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\[editable name="(?P<name>.*?)"\](?P<body>.*?)\[/editable\]"#)
        .expect("region grammar is valid")
});

/// The textual pattern recognizing region markers.
///
/// `Opening` and `Region` are compiled once per process. `Named` is built per
/// call by [`MarkerGrammar::named`] and matches a single region name as
/// literal text.
#[derive(Debug, Clone)]
pub enum MarkerGrammar {
    /// Header-only grammar used by the renumberer.
    Opening,
    /// Full open/body/close grammar for any name.
    Region,
    /// Full grammar restricted to one name.
    Named(Regex),
}

impl MarkerGrammar {
    /// Build a full-region grammar for `name`. Grammar metacharacters in the
    /// name are escaped, so `a.b` only matches a region literally named `a.b`.
    pub fn named(name: &str) -> Result<Self, regex::Error> {
        let pattern = format!(
            r#"(?is)\[editable name="(?P<name>{})"\](?P<body>.*?)\[/editable\]"#,
            regex::escape(name)
        );
        Regex::new(&pattern).map(MarkerGrammar::Named)
    }

    pub fn regex(&self) -> &Regex {
        match self {
            MarkerGrammar::Opening => &*OPENING_RE,
            MarkerGrammar::Region => &*REGION_RE,
            MarkerGrammar::Named(re) => re,
        }
    }
}

/// `[editable name="<name>"]`
pub fn open_marker(name: &str) -> String {
    format!("[editable name=\"{}\"]", name)
}

/// Canonical ordinal name for the region at `index`.
pub fn ordinal_name(index: usize) -> String {
    format!("{}{}", ORDINAL_PREFIX, index)
}

/// True for `region-` followed by zero or more ASCII digits.
pub fn is_ordinal_name(name: &str) -> bool {
    name.strip_prefix(ORDINAL_PREFIX)
        .is_some_and(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_matches_bare_and_ordinal_headers() {
        let re = MarkerGrammar::Opening;
        for header in [
            "[editable]",
            "[editable name=\"\"]",
            "[editable name=\"region-3\"]",
            "[editable name=\"region-\"]",
            "[EDITABLE  name=\"REGION-12\" ]",
        ] {
            assert!(re.regex().is_match(header), "expected match: {}", header);
        }
    }

    #[test]
    fn opening_skips_custom_names() {
        let re = MarkerGrammar::Opening;
        assert!(!re.regex().is_match("[editable name=\"intro\"]"));
        assert!(!re.regex().is_match("[editable name=\"region-1a\"]"));
        assert!(!re.regex().is_match("[/editable]"));
    }

    #[test]
    fn named_grammar_escapes_metacharacters() {
        let grammar = MarkerGrammar::named("a.b").unwrap();
        assert!(grammar.regex().is_match("[editable name=\"a.b\"]x[/editable]"));
        assert!(!grammar.regex().is_match("[editable name=\"axb\"]x[/editable]"));

        let grammar = MarkerGrammar::named("(.*)").unwrap();
        assert!(!grammar.regex().is_match("[editable name=\"intro\"]x[/editable]"));
        assert!(grammar.regex().is_match("[editable name=\"(.*)\"]x[/editable]"));
    }

    #[test]
    fn ordinal_names() {
        assert!(is_ordinal_name("region-0"));
        assert!(is_ordinal_name("region-42"));
        assert!(is_ordinal_name("region-"));
        assert!(!is_ordinal_name("intro"));
        assert!(!is_ordinal_name("region-4x"));
        assert_eq!(ordinal_name(7), "region-7");
        assert_eq!(open_marker("intro"), "[editable name=\"intro\"]");
    }
}
