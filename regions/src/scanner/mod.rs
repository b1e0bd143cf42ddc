pub mod grammar;

use std::ops::Range;

use regex::CaptureMatches;

use crate::scanner::grammar::MarkerGrammar;

/// One marker match found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMatch<'d> {
    /// The full matched text.
    pub text: &'d str,
    /// Region name. `None` for a bare `[editable]` header.
    pub name: Option<&'d str>,
    /// Raw body between the markers. `None` for header-only grammars.
    pub body: Option<&'d str>,
    /// Byte span of the whole match.
    pub span: Range<usize>,
}

impl RegionMatch<'_> {
    /// Start offset of the match in the scanned document.
    pub fn position(&self) -> usize {
        self.span.start
    }
}

/// Lazy iterator over the matches of a grammar, left to right.
pub struct Scan<'g, 'd> {
    inner: CaptureMatches<'g, 'd>,
}

impl<'d> Iterator for Scan<'_, 'd> {
    type Item = RegionMatch<'d>;

    fn next(&mut self) -> Option<Self::Item> {
        let caps = self.inner.next()?;
        let whole = caps.get(0)?;
        Some(RegionMatch {
            text: whole.as_str(),
            name: caps.name("name").map(|m| m.as_str()),
            body: caps.name("body").map(|m| m.as_str()),
            span: whole.range(),
        })
    }
}

/// Scan `document` for non-overlapping matches of `grammar`.
///
/// Matches are maximal and ordered by their first byte. Calling `scan`
/// again restarts from the beginning of the document.
pub fn scan<'g, 'd>(document: &'d str, grammar: &'g MarkerGrammar) -> Scan<'g, 'd> {
    Scan {
        inner: grammar.regex().captures_iter(document),
    }
}

/// Rebuild `document`, substituting every match of `grammar` with the
/// closure's output. Replacement is positional: each match is spliced at
/// its own recorded span, so two matches with identical text never
/// interfere with each other.
pub(crate) fn replace_matches<F>(document: &str, grammar: &MarkerGrammar, mut replace: F) -> String
where
    F: FnMut(&RegionMatch<'_>) -> String,
{
    let mut out = String::with_capacity(document.len());
    let mut last = 0;
    for found in scan(document, grammar) {
        out.push_str(&document[last..found.span.start]);
        out.push_str(&replace(&found));
        last = found.span.end;
    }
    out.push_str(&document[last..]);
    out
}
