//! Draw the HTML fragments produced by `saulo_core` as styled terminal lines.
//!
//! Only the tags the renderer emits are understood (`p`, `strong`, `em`,
//! `code`, `pre`, `ul`, `li`); text between them is entity-decoded.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

#[derive(Default)]
struct LineBuilder {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    bold: bool,
    italic: bool,
    code: bool,
    pre: bool,
}

impl LineBuilder {
    fn style(&self) -> Style {
        let mut style = Style::default();
        if self.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.pre {
            style = style.fg(Color::Green);
        } else if self.code {
            style = style.fg(Color::Yellow);
        }
        style
    }

    fn push_text(&mut self, text: &str) {
        let decoded = decode_entities(text);
        let mut parts = decoded.split('\n').peekable();
        while let Some(part) = parts.next() {
            if !part.is_empty() {
                let style = self.style();
                self.spans.push(Span::styled(part.to_string(), style));
            }
            if parts.peek().is_some() {
                // Inside a code block every newline is a line, blank or not.
                if self.pre {
                    self.break_line();
                } else {
                    self.flush();
                }
            }
        }
    }

    /// End the current line if it has content.
    fn flush(&mut self) {
        if !self.spans.is_empty() {
            self.break_line();
        }
    }

    fn break_line(&mut self) {
        let spans = std::mem::take(&mut self.spans);
        self.lines.push(Line::from(spans));
    }

    fn tag(&mut self, tag: &str) {
        match tag {
            "strong" => self.bold = true,
            "/strong" => self.bold = false,
            "em" => self.italic = true,
            "/em" => self.italic = false,
            "code" => self.code = true,
            "/code" => self.code = false,
            "pre" => {
                self.flush();
                self.pre = true;
            }
            "/pre" => {
                self.break_line();
                self.pre = false;
            }
            "ul" | "/ul" | "/li" => self.flush(),
            "li" => {
                self.flush();
                self.spans
                    .push(Span::styled("  • ", Style::default().fg(Color::DarkGray)));
            }
            "/p" => {
                self.flush();
                self.lines.push(Line::default());
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

pub fn html_to_lines(html: &str) -> Vec<Line<'static>> {
    let mut builder = LineBuilder::default();
    let mut rest = html;

    while !rest.is_empty() {
        match rest.find('<') {
            Some(0) => match rest.find('>') {
                Some(end) => {
                    builder.tag(&rest[1..end]);
                    rest = &rest[end + 1..];
                }
                None => {
                    builder.push_text(rest);
                    rest = "";
                }
            },
            Some(start) => {
                builder.push_text(&rest[..start]);
                rest = &rest[start..];
            }
            None => {
                builder.push_text(rest);
                rest = "";
            }
        }
    }

    builder.finish()
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
