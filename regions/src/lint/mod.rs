//! Marker checks for authors.
//!
//! Rendering never fails on malformed markers: they are left in the page as
//! literal text. `check` reports them so they can be fixed at the source.

mod diagnostic;

use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

pub use diagnostic::MarkerDiagnostic;

use crate::scanner::grammar::{MarkerGrammar, is_ordinal_name};
use crate::scanner::scan;

static OPEN_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[editable(?:\s[^\]]*)?\]").expect("open tag pattern is valid")
});

static CLOSE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[/editable\]").expect("close tag pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Open,
    Close,
}

/// Check the region markers of `document`.
pub fn check(document: &str, file_id: usize) -> Vec<MarkerDiagnostic> {
    let regions: Vec<_> = scan(document, &MarkerGrammar::Region).collect();
    let mut diagnostics = Vec::new();

    // Names
    let mut first_seen: HashMap<String, Range<usize>> = HashMap::new();
    for region in &regions {
        let name = region.name.unwrap_or_default();
        let header = region.span.start..region.span.start + header_len(region.text);

        if name.contains('"') {
            diagnostics.push(
                MarkerDiagnostic::warning("region name contains a double quote", header.clone(), file_id)
                    .with_note("the envelope escapes it, but editors may not round-trip it"),
            );
        }

        let key = name.to_lowercase();
        match first_seen.get(&key) {
            // Ordinal names are reassigned by position on the next editor visit.
            Some(first) if is_ordinal_name(&key) => diagnostics.push(
                MarkerDiagnostic::warning(format!("duplicate region name `{}`", name), header, file_id)
                    .with_related(first.clone(), "first defined here")
                    .with_note("ordinal names are renumbered the next time an editor opens the page"),
            ),
            Some(first) => diagnostics.push(
                MarkerDiagnostic::error(format!("duplicate region name `{}`", name), header, file_id)
                    .with_related(first.clone(), "first defined here")
                    .with_note("saved changes only ever reach the first region with a given name"),
            ),
            None => {
                first_seen.insert(key, header);
            }
        }
    }

    // Pairing
    let starts: Vec<usize> = regions.iter().map(|r| r.span.start).collect();
    let ends: Vec<usize> = regions.iter().map(|r| r.span.end).collect();
    let inside = |pos: usize| regions.iter().any(|r| r.span.start < pos && pos < r.span.end);

    let mut tags: Vec<(TagKind, Range<usize>)> = OPEN_TAG_RE
        .find_iter(document)
        .map(|m| (TagKind::Open, m.range()))
        .chain(CLOSE_TAG_RE.find_iter(document).map(|m| (TagKind::Close, m.range())))
        .collect();
    tags.sort_by_key(|(_, span)| span.start);

    let unnamed = MarkerGrammar::Opening;
    let mut pending: Option<Range<usize>> = None;

    for (kind, span) in tags {
        match kind {
            TagKind::Open if starts.contains(&span.start) => {}
            TagKind::Open if inside(span.start) => diagnostics.push(
                MarkerDiagnostic::warning("nested region marker", span, file_id)
                    .with_note("regions cannot nest; this marker is part of the enclosing region's body"),
            ),
            TagKind::Open if is_unnamed(&unnamed, &document[span.clone()]) => {
                if let Some(previous) = pending.replace(span.clone()) {
                    diagnostics.push(unclosed(previous, file_id));
                }
                diagnostics.push(
                    MarkerDiagnostic::note("region has no name yet", span, file_id)
                        .with_note("a name is assigned the next time an editor opens the page"),
                );
            }
            TagKind::Open => diagnostics.push(unclosed(span, file_id)),
            TagKind::Close if ends.contains(&span.end) => {}
            TagKind::Close if inside(span.start) => {}
            TagKind::Close => {
                if pending.take().is_none() {
                    diagnostics.push(
                        MarkerDiagnostic::warning("closing marker without a region", span, file_id)
                            .with_note("it will appear as literal text"),
                    );
                }
            }
        }
    }

    if let Some(previous) = pending {
        diagnostics.push(unclosed(previous, file_id));
    }

    diagnostics.sort_by_key(|d| d.span.start);
    diagnostics
}

fn unclosed(span: Range<usize>, file_id: usize) -> MarkerDiagnostic {
    MarkerDiagnostic::warning("region marker is never closed", span, file_id)
        .with_note("add `[/editable]` after the region body; until then it appears as literal text")
}

fn is_unnamed(grammar: &MarkerGrammar, tag: &str) -> bool {
    scan(tag, grammar)
        .next()
        .is_some_and(|m| m.span.start == 0 && m.name.is_none_or(str::is_empty))
}

fn header_len(text: &str) -> usize {
    text.find(']').map_or(text.len(), |i| i + 1)
}
