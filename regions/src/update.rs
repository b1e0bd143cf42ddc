use tracing::{debug, warn};

use crate::scanner::grammar::{CLOSE_MARKER, MarkerGrammar, open_marker};
use crate::scanner::scan;

/// Result of applying a set of region updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Updated {
    pub document: String,
    /// Names whose region was found and replaced, in update order.
    pub applied: Vec<String>,
    /// Names with no matching region in the document.
    pub skipped: Vec<String>,
}

impl Updated {
    /// True when no update found its region.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Replace the body of each named region with the supplied raw text.
///
/// Names match case-insensitively and the rewritten header carries the
/// posted spelling. Only the first region carrying a given name is touched;
/// names with no matching region are skipped. Bodies are stored as given, without
/// rendering. Text outside the replaced spans is preserved byte for byte.
pub fn apply_updates<I, K, V>(document: &str, updates: I) -> Updated
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = document.to_string();
    let mut applied = Vec::new();
    let mut skipped = Vec::new();

    for (name, body) in updates {
        let (name, body) = (name.as_ref(), body.as_ref());

        let grammar = match MarkerGrammar::named(name) {
            Ok(grammar) => grammar,
            Err(e) => {
                warn!(region = name, error = %e, "cannot build region grammar");
                skipped.push(name.to_string());
                continue;
            }
        };

        let Some(span) = scan(&out, &grammar).next().map(|found| found.span) else {
            debug!(region = name, "no such region, update skipped");
            skipped.push(name.to_string());
            continue;
        };

        if body.to_ascii_lowercase().contains(CLOSE_MARKER) {
            warn!(region = name, "region body contains a closing marker");
        }

        let replacement = format!("{}{}{}", open_marker(name), body, CLOSE_MARKER);
        out.replace_range(span, &replacement);
        applied.push(name.to_string());
    }

    Updated {
        document: out,
        applied,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    const DOC: &str =
        "intro [editable name=\"region-0\"]A[/editable] mid [editable name=\"region-1\"]B[/editable] end";

    #[test]
    fn replaces_only_the_target_region() {
        let out = apply_updates(DOC, [("region-1", "C")]);
        assert_eq!(
            out.document,
            "intro [editable name=\"region-0\"]A[/editable] mid [editable name=\"region-1\"]C[/editable] end"
        );
        assert_eq!(out.applied, vec!["region-1"]);
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn unknown_name_is_skipped() {
        let out = apply_updates(DOC, [("region-9", "X")]);
        assert_eq!(out.document, DOC);
        assert!(out.is_noop());
        assert_eq!(out.skipped, vec!["region-9"]);
    }

    #[test]
    fn remaining_updates_apply_after_a_skip() {
        let mut updates = BTreeMap::new();
        updates.insert("missing".to_string(), "X".to_string());
        updates.insert("region-0".to_string(), "Z".to_string());
        let out = apply_updates(DOC, &updates);
        assert!(out.document.contains("[editable name=\"region-0\"]Z[/editable]"));
        assert_eq!(out.applied, vec!["region-0"]);
        assert_eq!(out.skipped, vec!["missing"]);
    }

    #[test]
    fn names_are_literal_text() {
        let out = apply_updates(DOC, [("region-.", "X")]);
        assert_eq!(out.document, DOC);

        let doc = "[editable name=\"a+b\"]old[/editable]";
        let out = apply_updates(doc, [("a+b", "new")]);
        assert_eq!(out.document, "[editable name=\"a+b\"]new[/editable]");
    }

    #[test]
    fn only_first_duplicate_is_updated() {
        let doc = "[editable name=\"a\"]x[/editable] [editable name=\"a\"]x[/editable]";
        let out = apply_updates(doc, [("a", "y")]);
        assert_eq!(
            out.document,
            "[editable name=\"a\"]y[/editable] [editable name=\"a\"]x[/editable]"
        );
    }

    #[test]
    fn names_match_case_insensitively_and_the_posted_spelling_is_stored() {
        let out = apply_updates(DOC, [("REGION-0", "New")]);
        assert_eq!(
            out.document,
            "intro [editable name=\"REGION-0\"]New[/editable] mid [editable name=\"region-1\"]B[/editable] end"
        );
        assert_eq!(out.applied, vec!["REGION-0"]);

        let doc = "[Editable name=\"Intro\"]old[/EDITABLE]";
        let out = apply_updates(doc, [("intro", "new")]);
        assert_eq!(out.document, "[editable name=\"intro\"]new[/editable]");
    }

    #[test]
    fn multiline_bodies_are_stored_raw() {
        let out = apply_updates(DOC, [("region-0", "# Heading\n\n*text*")]);
        assert!(
            out.document
                .starts_with("intro [editable name=\"region-0\"]# Heading\n\n*text*[/editable] mid")
        );
    }
}
