//! Markdown rendering for entry bodies.

use pulldown_cmark::{html, Options, Parser};

/// Turns a raw entry body into HTML.
pub trait Renderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

/// CommonMark renderer with tables, strikethrough and footnotes enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_FOOTNOTES);

        let parser = Parser::new_ext(markdown, options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}
