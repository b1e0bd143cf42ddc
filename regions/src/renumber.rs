use tracing::debug;

use crate::scanner::grammar::{MarkerGrammar, open_marker, ordinal_name};
use crate::scanner::replace_matches;

/// Result of a renumbering pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renumbered {
    pub document: String,
    /// True when the pass rewrote at least one header. Callers persist the
    /// document only in that case.
    pub changed: bool,
    /// Number of headers eligible for renumbering.
    pub count: usize,
}

/// Give every bare or ordinal-named region header a dense, zero-based
/// ordinal name in document order.
///
/// Headers with a custom name are not matched and survive untouched. Each
/// header is rewritten at its own offset, so repeated identical headers
/// (two bare `[editable]`, or a stale `region-1` before a `region-0`) are
/// numbered by position.
pub fn renumber(document: &str) -> Renumbered {
    let mut count = 0;
    let renamed = replace_matches(document, &MarkerGrammar::Opening, |_| {
        let header = open_marker(&ordinal_name(count));
        count += 1;
        header
    });

    let changed = renamed != document;
    if changed {
        debug!(regions = count, "renumbered editable regions");
    }

    Renumbered {
        document: renamed,
        changed,
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_bare_markers() {
        let out = renumber("[editable]a[/editable] [editable]b[/editable]");
        assert_eq!(
            out.document,
            "[editable name=\"region-0\"]a[/editable] [editable name=\"region-1\"]b[/editable]"
        );
        assert!(out.changed);
        assert_eq!(out.count, 2);
    }

    #[test]
    fn fills_empty_names() {
        let out = renumber("[editable name=\"\"]a[/editable]");
        assert_eq!(out.document, "[editable name=\"region-0\"]a[/editable]");
    }

    #[test]
    fn reorders_stale_ordinals_by_position() {
        let out = renumber(
            "[editable name=\"region-1\"]a[/editable][editable name=\"region-0\"]b[/editable]",
        );
        assert_eq!(
            out.document,
            "[editable name=\"region-0\"]a[/editable][editable name=\"region-1\"]b[/editable]"
        );
    }

    #[test]
    fn leaves_custom_names_alone() {
        let doc = "[editable name=\"intro\"]a[/editable] [editable]b[/editable]";
        let out = renumber(doc);
        assert_eq!(
            out.document,
            "[editable name=\"intro\"]a[/editable] [editable name=\"region-0\"]b[/editable]"
        );
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let first = renumber("x [editable]a[/editable] y [editable name=\"region-9\"]b[/editable]");
        let second = renumber(&first.document);
        assert_eq!(second.document, first.document);
        assert!(!second.changed);
        assert_eq!(second.count, 2);
    }

    #[test]
    fn document_without_markers_is_unchanged() {
        let out = renumber("# Title\n\nplain text");
        assert_eq!(out.document, "# Title\n\nplain text");
        assert!(!out.changed);
        assert_eq!(out.count, 0);
    }

    #[test]
    fn normalizes_header_spelling() {
        let out = renumber("[EDITABLE   name=\"REGION-0\"  ]a[/editable]");
        assert_eq!(out.document, "[editable name=\"region-0\"]a[/editable]");
        assert!(out.changed);
    }
}
