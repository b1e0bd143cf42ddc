use pulldown_cmark::{Options, Parser as CmarkParser, html};

use crate::scanner::grammar::MarkerGrammar;
use crate::scanner::replace_matches;

/// Turns a region body into HTML. Implementations must be pure.
pub trait MarkupRenderer {
    fn render(&self, raw: &str) -> String;
}

/// CommonMark renderer with strikethrough and tables enabled.
#[derive(Debug, Clone, Copy)]
pub struct CommonMarkRenderer {
    options: Options,
}

impl CommonMarkRenderer {
    pub fn new(options: Options) -> Self {
        CommonMarkRenderer { options }
    }
}

impl Default for CommonMarkRenderer {
    fn default() -> Self {
        CommonMarkRenderer::new(Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES)
    }
}

impl MarkupRenderer for CommonMarkRenderer {
    fn render(&self, raw: &str) -> String {
        let parser = CmarkParser::new_ext(raw, self.options);
        let mut out = String::with_capacity(raw.len() + raw.len() / 2);
        html::push_html(&mut out, parser);
        // Regions sit inline within the surrounding page text.
        let trimmed = out.trim_end_matches('\n').len();
        out.truncate(trimmed);
        out
    }
}

/// Render every region for a viewer allowed to edit it: the body becomes
/// HTML wrapped in an envelope carrying the region name.
pub fn render_authorized<R>(document: &str, renderer: &R) -> String
where
    R: MarkupRenderer + ?Sized,
{
    replace_matches(document, &MarkerGrammar::Region, |found| {
        let html = renderer.render(found.body.unwrap_or_default());
        envelope(found.name.unwrap_or_default(), &html)
    })
}

/// Render every region for a public viewer: markers are dropped and only
/// the rendered body remains.
pub fn render_public<R>(document: &str, renderer: &R) -> String
where
    R: MarkupRenderer + ?Sized,
{
    replace_matches(document, &MarkerGrammar::Region, |found| {
        renderer.render(found.body.unwrap_or_default())
    })
}

fn envelope(name: &str, html: &str) -> String {
    format!(
        "<div data-editable data-name=\"{}\">{}</div>",
        escape_attribute(name),
        html
    )
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
