//! Restricted markdown to HTML.
//!
//! Only a fixed subset is understood: fenced code blocks, `**bold**`, `*italic*`,
//! `` `inline code` ``, `* ` list items and blank-line paragraphs. The input is
//! escaped before any stage runs, so the tags inserted by later stages are the
//! only markup in the output. Unbalanced markers stay as literal text.

use std::sync::OnceLock;

use regex::Regex;

use crate::escape::escape_html;

/// Escaped input split around fenced code blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Text the inline and block stages may rewrite.
    Prose(String),
    /// Body of a fenced block, emitted verbatim.
    Code(String),
}

pub struct MarkdownRenderer {
    fence: Regex,
    bold: Regex,
    italic: Regex,
    inline_code: Regex,
    list_item: Regex,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self {
            // A line holding only ``` opens, the next such line closes.
            fence: compile(r"(?ms)^```[ \t]*\n(.*?)^```[ \t]*$"),
            bold: compile(r"\*\*(.+?)\*\*"),
            // No whitespace just inside the markers, so `* item` and `2 * 3` survive.
            italic: compile(r"\*([^\s*](?:[^*\n]*?[^\s*])?)\*"),
            inline_code: compile(r"`([^`\n]+?)`"),
            list_item: compile(r"(?m)^[ \t]*\* (.+)$"),
        }
    }

    /// Render `text` into an HTML fragment wrapped in a single `<p>`.
    pub fn render(&self, text: &str) -> String {
        // CRLF line endings would defeat the line-anchored patterns.
        let escaped = escape_html(&text.replace("\r\n", "\n"));

        let body: String = self
            .split_fences(&escaped)
            .into_iter()
            .map(|segment| match segment {
                Segment::Code(code) => format!("<pre><code>{code}</code></pre>"),
                Segment::Prose(prose) => self.render_prose(&prose),
            })
            .collect();

        format!("<p>{body}</p>")
    }

    fn render_prose(&self, prose: &str) -> String {
        let text = self.bold(prose);
        let text = self.italic(&text);
        let text = self.inline_code(&text);
        let text = self.list_items(&text);
        let text = wrap_lists(&text);
        split_paragraphs(&text)
    }

    fn split_fences(&self, escaped: &str) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in self.fence.captures_iter(escaped) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Prose(escaped[last..whole.start()].to_string()));
            }
            let body = caps.get(1).map_or("", |m| m.as_str());
            let body = body.strip_suffix('\n').unwrap_or(body);
            segments.push(Segment::Code(body.to_string()));
            last = whole.end();
        }

        if last < escaped.len() || segments.is_empty() {
            segments.push(Segment::Prose(escaped[last..].to_string()));
        }

        segments
    }

    fn bold(&self, text: &str) -> String {
        let mut current = text.to_string();
        while self.bold.is_match(&current) {
            current = self
                .bold
                .replace_all(&current, "<strong>${1}</strong>")
                .into_owned();
        }
        current
    }

    fn italic(&self, text: &str) -> String {
        self.italic.replace_all(text, "<em>${1}</em>").into_owned()
    }

    fn inline_code(&self, text: &str) -> String {
        self.inline_code
            .replace_all(text, "<code>${1}</code>")
            .into_owned()
    }

    fn list_items(&self, text: &str) -> String {
        self.list_item.replace_all(text, "<li>${1}</li>").into_owned()
    }
}

/// Wrap every maximal run of consecutive `<li>` lines in its own `<ul>`.
fn wrap_lists(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut run: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if line.starts_with("<li>") && line.ends_with("</li>") {
            run.push(line);
            continue;
        }
        if !run.is_empty() {
            out.push(format!("<ul>{}</ul>", run.join("\n")));
            run.clear();
        }
        out.push(line.to_string());
    }
    if !run.is_empty() {
        out.push(format!("<ul>{}</ul>", run.join("\n")));
    }

    out.join("\n")
}

fn split_paragraphs(text: &str) -> String {
    text.replace("\n\n", "</p><p>")
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("markdown patterns are valid")
}

/// Render with a process-wide renderer, compiled on first use.
pub fn render_markdown(text: &str) -> String {
    static RENDERER: OnceLock<MarkdownRenderer> = OnceLock::new();
    RENDERER.get_or_init(MarkdownRenderer::new).render(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_escaped_and_wrapped_once() {
        let input = "Tom & Jerry say \"hi\" <3";
        assert_eq!(
            render_markdown(input),
            format!("<p>{}</p>", escape_html(input))
        );
    }

    #[test]
    fn test_plain_multiline_without_blank_line_is_single_paragraph() {
        assert_eq!(render_markdown("line one\nline two"), "<p>line one\nline two</p>");
    }

    #[test]
    fn test_bold() {
        let html = render_markdown("**bold**");
        assert!(html.contains("<strong>bold</strong>"));
        assert!(!html.contains('*'));
    }

    #[test]
    fn test_multiple_bold_spans() {
        assert_eq!(
            render_markdown("**uno** y **dos**"),
            "<p><strong>uno</strong> y <strong>dos</strong></p>"
        );
    }

    #[test]
    fn test_italic_and_bold_do_not_cross() {
        let html = render_markdown("*a* and **b**");
        assert_eq!(html, "<p><em>a</em> and <strong>b</strong></p>");
        assert!(!html.contains("<em></em>"));
    }

    #[test]
    fn test_italic_ignores_spaced_asterisks() {
        assert_eq!(render_markdown("2 * 3 * 4"), "<p>2 * 3 * 4</p>");
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(
            render_markdown("run `cargo test` now"),
            "<p>run <code>cargo test</code> now</p>"
        );
    }

    #[test]
    fn test_unbalanced_markers_stay_literal() {
        assert_eq!(render_markdown("**open and `tick"), "<p>**open and `tick</p>");
    }

    #[test]
    fn test_markup_in_input_is_escaped_before_tags_are_added() {
        let html = render_markdown("**<b>x</b>**");
        assert_eq!(html, "<p><strong>&lt;b&gt;x&lt;/b&gt;</strong></p>");
    }

    #[test]
    fn test_fenced_code_block_is_verbatim() {
        let html = render_markdown("Mira:\n```\nlet x = **y** * 2;\n\nif a < b {}\n```\nfin");
        assert_eq!(
            html,
            "<p>Mira:\n<pre><code>let x = **y** * 2;\n\nif a &lt; b {}</code></pre>\nfin</p>"
        );
    }

    #[test]
    fn test_unclosed_fence_is_literal() {
        assert_eq!(render_markdown("```\ncode"), "<p>```\ncode</p>");
    }

    #[test]
    fn test_empty_fence() {
        assert_eq!(render_markdown("```\n```"), "<p><pre><code></code></pre></p>");
    }

    #[test]
    fn test_list_items_are_wrapped() {
        assert_eq!(
            render_markdown("* uno\n  * dos"),
            "<p><ul><li>uno</li>\n<li>dos</li></ul></p>"
        );
    }

    #[test]
    fn test_each_disjoint_list_gets_its_own_ul() {
        let html = render_markdown("* a\n* b\ntexto\n* c");
        assert_eq!(
            html,
            "<p><ul><li>a</li>\n<li>b</li></ul>\ntexto\n<ul><li>c</li></ul></p>"
        );
        assert_eq!(html.matches("<ul>").count(), 2);
    }

    #[test]
    fn test_list_item_with_italic_content() {
        assert_eq!(
            render_markdown("* una *idea*"),
            "<p><ul><li>una <em>idea</em></li></ul></p>"
        );
    }

    #[test]
    fn test_paragraphs() {
        assert_eq!(
            render_markdown("primero\n\nsegundo\n\ntercero"),
            "<p>primero</p><p>segundo</p><p>tercero</p>"
        );
    }

    #[test]
    fn test_crlf_input_renders_like_lf() {
        assert_eq!(
            render_markdown("```\r\nlet a = 1;\r\n```\r\n"),
            "<p><pre><code>let a = 1;</code></pre>\n</p>"
        );
        assert_eq!(
            render_markdown("uno\r\n\r\n* a\r\n* b"),
            "<p>uno</p><p><ul><li>a</li>\n<li>b</li></ul></p>"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render_markdown(""), "<p></p>");
    }

    #[test]
    fn test_split_fences_segments() {
        let renderer = MarkdownRenderer::new();
        let segments = renderer.split_fences("a\n```\nb\n```\nc");
        assert_eq!(
            segments,
            vec![
                Segment::Prose("a\n".to_string()),
                Segment::Code("b".to_string()),
                Segment::Prose("\nc".to_string()),
            ]
        );
    }

    #[test]
    fn test_bold_stage_runs_before_italic_stage() {
        let renderer = MarkdownRenderer::new();
        let after_bold = renderer.bold("**x** *y*");
        assert_eq!(after_bold, "<strong>x</strong> *y*");
        assert_eq!(renderer.italic(&after_bold), "<strong>x</strong> <em>y</em>");
    }

    #[test]
    fn test_wrap_lists_without_items_is_identity() {
        assert_eq!(wrap_lists("a\n\nb"), "a\n\nb");
    }
}
