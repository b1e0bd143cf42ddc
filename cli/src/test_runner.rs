use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use codespan_reporting::diagnostic::Severity;
use serde::Deserialize;

use regions::lint::{self, MarkerDiagnostic};
use regions::{CommonMarkRenderer, apply_updates, render_authorized, render_public, renumber};

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning's span must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RegionUpdate {
    pub name: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Render as an editor would see the page: renumbered, with envelopes.
    #[serde(default)]
    pub authorized: bool,

    /// Updates to apply in order. When present the test checks the updated
    /// source instead of rendered output.
    #[serde(default)]
    pub update: Vec<RegionUpdate>,

    /// Expected rendered page (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Expected page source after renumbering or updates (trimmed comparison).
    #[serde(default)]
    pub expect_document: Option<String>,

    /// Whether renumbering or updates should have changed the source.
    #[serde(default)]
    pub expect_changed: Option<bool>,

    /// Expected warnings. If present (even empty), warning count and content are checked.
    /// Each entry checks message substring and optionally the source line.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

/// Parse a `.test.md` file into its TOML config and page source.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

/// What one fixture produced.
struct Produced {
    document: String,
    changed: bool,
    output: Option<String>,
}

fn produce(config: &TestConfig, source: &str) -> Produced {
    let renderer = CommonMarkRenderer::default();

    if !config.update.is_empty() {
        let updated = apply_updates(
            source,
            config.update.iter().map(|u| (u.name.as_str(), u.body.as_str())),
        );
        let changed = !updated.is_noop();
        return Produced {
            document: updated.document,
            changed,
            output: None,
        };
    }

    if config.authorized {
        let renumbered = renumber(source);
        let output = render_authorized(&renumbered.document, &renderer);
        return Produced {
            document: renumbered.document,
            changed: renumbered.changed,
            output: Some(output),
        };
    }

    Produced {
        document: source.to_string(),
        changed: false,
        output: Some(render_public(source, &renderer)),
    }
}

fn compare(what: &str, expected: &str, actual: &str) -> Option<String> {
    let expected = expected.trim();
    let actual = actual.trim();
    if expected == actual {
        None
    } else {
        Some(format!(
            "{} mismatch\n  expected: {}\n  actual:   {}",
            what, expected, actual
        ))
    }
}

fn evaluate(config: &TestConfig, source: &str) -> Option<String> {
    let produced = produce(config, source);

    if let Some(expected) = &config.expect_output {
        let Some(actual) = &produced.output else {
            return Some("expect_output is set but the test applies updates".into());
        };
        if let Some(reason) = compare("output", expected, actual) {
            return Some(reason);
        }
    }

    if let Some(expected) = &config.expect_document {
        if let Some(reason) = compare("document", expected, &produced.document) {
            return Some(reason);
        }
    }

    if let Some(expected) = config.expect_changed {
        if expected != produced.changed {
            return Some(format!(
                "expected changed = {}, got {}",
                expected, produced.changed
            ));
        }
    }

    if let Some(expected_warnings) = &config.expect_warnings {
        let diagnostics = lint::check(source, 0);
        if let Some(reason) = check_warnings(source, &diagnostics, expected_warnings) {
            return Some(reason);
        }
    }

    None
}

fn run_single_test(path: &Path) -> TestResult {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("cannot read file: {}", e)),
            };
        }
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("frontmatter error: {}", e)),
            };
        }
    };

    TestResult {
        path: path.to_path_buf(),
        description: config.description.clone(),
        outcome: match evaluate(&config, source) {
            Some(reason) => TestOutcome::Fail(reason),
            None => TestOutcome::Pass,
        },
    }
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
/// Notes are not counted; errors are.
fn check_warnings(
    source: &str,
    diagnostics: &[MarkerDiagnostic],
    expected: &[ExpectedWarning],
) -> Option<String> {
    let actual_warnings: Vec<&MarkerDiagnostic> = diagnostics
        .iter()
        .filter(|d| d.severity >= Severity::Warning)
        .collect();

    if actual_warnings.len() != expected.len() {
        let actual_msgs: Vec<String> = actual_warnings
            .iter()
            .map(|w| format!("  - {}", w.message))
            .collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            actual_warnings.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual_warnings.iter().zip(expected.iter()).enumerate() {
        if !actual.message.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, actual.message
            ));
        }

        if let Some(expected_line) = expected.line {
            let actual_line = byte_offset_to_line(source, actual.span.start);
            if actual_line != expected_line {
                return Some(format!(
                    "warning[{}]: expected on line {}, but span is on line {}",
                    i, expected_line, actual_line
                ));
            }
        }
    }

    None
}

/// Discover `.test.md` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(".test.md"))
        {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(cat), files.len());
    }
}

fn category_label(cat: &str) -> &str {
    if cat.is_empty() { "(root)" } else { cat }
}

fn pass_label(no_color: bool) -> &'static str {
    if no_color { "PASS" } else { "\x1b[32mPASS\x1b[0m" }
}

fn fail_label(no_color: bool) -> &'static str {
    if no_color { "FAIL" } else { "\x1b[31mFAIL\x1b[0m" }
}

fn bold(s: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[1m{}\x1b[0m", s)
    }
}

fn test_label(result: &TestResult) -> &str {
    result.description.as_deref().unwrap_or_else(|| {
        result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_suffix(".test.md"))
            .unwrap_or("?")
    })
}

fn report_failures(failures: &[TestResult]) {
    if failures.is_empty() {
        return;
    }
    eprintln!();
    eprintln!("failures:");
    for f in failures {
        eprintln!();
        eprintln!("  --- {} ---", f.path.display());
        if let TestOutcome::Fail(reason) = &f.outcome {
            for line in reason.lines() {
                eprintln!("  {}", line);
            }
        }
    }
}

fn summary(passed: usize, failed: usize, no_color: bool) -> i32 {
    eprintln!();
    if failed == 0 {
        let ok = if no_color { "ok" } else { "\x1b[32mok\x1b[0m" };
        eprintln!("test result: {}. {} passed, 0 failed", ok, passed);
        0
    } else {
        let bad = if no_color { "FAILED" } else { "\x1b[31mFAILED\x1b[0m" };
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            bad,
            passed,
            failed,
            passed + failed
        );
        1
    }
}

/// Run all `.test.md` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();
    let mut record = |result: TestResult| match result.outcome {
        TestOutcome::Pass => {
            passed += 1;
            eprintln!("  {}  {}", pass_label(no_color), test_label(&result));
        }
        TestOutcome::Fail(_) => {
            eprintln!("  {}  {}", fail_label(no_color), test_label(&result));
            failures.push(result);
        }
    };

    if path.is_file() {
        record(run_single_test(path));
    } else {
        let all_categories = discover_categorized(path);
        if all_categories.is_empty() {
            eprintln!("no .test.md files found in {}", path.display());
            return 1;
        }

        let run_categories = select_categories(&all_categories, categories);
        if run_categories.is_empty() {
            eprintln!("no matching categories found");
            return 1;
        }

        for (cat, files) in &run_categories {
            eprintln!();
            eprintln!("{}", bold(category_label(cat), no_color));
            for file in *files {
                record(run_single_test(file));
            }
        }
    }

    report_failures(&failures);
    summary(passed, failures.len(), no_color)
}

fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }

    let mut filtered = BTreeMap::new();
    for req in requested {
        let req = req.trim_matches('/');
        let mut found = false;
        for (cat, files) in all {
            if cat == req || cat.starts_with(&format!("{}/", req)) {
                filtered.insert(cat.as_str(), files);
                found = true;
            }
        }
        if !found {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    filtered
}
