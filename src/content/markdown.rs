//! Markdown rendering with syntax highlighting

use anyhow::Result;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::helpers::escape_html;

/// Renders post bodies to HTML; fenced code blocks are highlighted with syntect
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme: Theme,
    line_numbers: bool,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::with_options("base16-ocean.dark", false)
    }

    /// Unknown theme names fall back to syntect's first bundled theme
    pub fn with_options(theme: &str, line_numbers: bool) -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = match themes.remove(theme) {
            Some(t) => t,
            None => {
                tracing::warn!("Unknown highlight theme {:?}, using default", theme);
                themes
                    .into_values()
                    .next()
                    .unwrap_or_default()
            }
        };

        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
            line_numbers,
        }
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> Result<String> {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES;

        let mut events: Vec<Event> = Vec::new();
        // Some(lang) while inside a code block; lang may be empty
        let mut code_lang: Option<String> = None;
        let mut code = String::new();

        for event in Parser::new_ext(markdown, options) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    code_lang = Some(match kind {
                        CodeBlockKind::Fenced(lang) => lang.to_string(),
                        CodeBlockKind::Indented => String::new(),
                    });
                    code.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    let lang = code_lang.take().unwrap_or_default();
                    let block = self.highlight_code(&code, &lang);
                    events.push(Event::Html(CowStr::from(block)));
                }
                Event::Text(text) if code_lang.is_some() => code.push_str(&text),
                other => events.push(other),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        Ok(html_output)
    }

    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let lang = if lang.is_empty() { "text" } else { lang };

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let highlighted = match highlighted_html_for_string(code, &self.syntax_set, syntax, &self.theme)
        {
            Ok(h) => h,
            Err(e) => {
                tracing::debug!("Highlighting {} failed: {}", lang, e);
                format!("<pre><code>{}</code></pre>", escape_html(code))
            }
        };

        if self.line_numbers {
            let gutter = (1..=code.lines().count())
                .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code">{}</td></tr></table></figure>"#,
                lang, gutter, highlighted
            )
        } else {
            format!(r#"<figure class="highlight {}">{}</figure>"#, lang, highlighted)
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}
