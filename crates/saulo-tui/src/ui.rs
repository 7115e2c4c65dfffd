use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthChar;
use saulo_core::{ConnectivityState, Message, Origin};
use crate::app::App;
use crate::html::html_to_lines;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn connectivity_style(state: ConnectivityState) -> Style {
    let color = match state {
        ConnectivityState::Connected => Color::Green,
        ConnectivityState::Unknown => Color::Yellow,
        ConnectivityState::Simulated => Color::Red,
    };
    Style::default().fg(color).bg(Color::DarkGray).bold()
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let state = app.connectivity_state();

    let mut spans = vec![
        Span::styled(" Saulo ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::raw("  "),
        Span::styled("● ", connectivity_style(state)),
        Span::styled(state.display_name(), connectivity_style(state)),
    ];

    if let Some(agent_state) = &app.agent_state {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("estado: {}", agent_state),
            Style::default().fg(Color::Magenta),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn label_style(message: &Message) -> Style {
    let color = match message.origin() {
        Origin::User => Color::Cyan,
        Origin::Assistant if message.simulated() => Color::Red,
        Origin::Assistant => Color::Yellow,
        Origin::System => Color::DarkGray,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Label line plus rendered body for every transcript entry.
fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for message in app.conversation.transcript().messages() {
        let mut header = vec![
            Span::styled(message.sender_label().to_string(), label_style(message)),
            Span::styled(
                format!(" · {}", message.timestamp()),
                Style::default().fg(Color::DarkGray),
            ),
        ];
        if message.simulated() {
            header.push(Span::styled(
                " [sin conexión]",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ));
        }
        lines.push(Line::from(header));
        lines.extend(html_to_lines(message.rendered_html()));
        lines.push(Line::default());
    }

    if app.is_sending() {
        lines.push(Line::from(Span::styled(
            "Saulo:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Pensando{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

/// Wrap a styled line at word boundaries so it fits within `width` columns.
/// Words wider than the row are split. Whitespace at a wrap point is dropped.
fn wrap_line(line: &Line, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);

    // Runs of whitespace or non-whitespace, each char keeping its span's style
    let mut tokens: Vec<Vec<(char, Style)>> = Vec::new();
    for span in &line.spans {
        let style = line.style.patch(span.style);
        for c in span.content.chars() {
            let same_kind = tokens
                .last()
                .and_then(|token| token.last())
                .is_some_and(|(prev, _)| prev.is_whitespace() == c.is_whitespace());
            match tokens.last_mut() {
                Some(token) if same_kind => token.push((c, style)),
                _ => tokens.push(vec![(c, style)]),
            }
        }
    }

    let mut rows: Vec<Vec<(char, Style)>> = Vec::new();
    let mut row: Vec<(char, Style)> = Vec::new();
    let mut row_width = 0;

    for token in tokens {
        let token_width: usize = token.iter().map(|(c, _)| char_width(*c)).sum();
        let is_space = token.first().is_some_and(|(c, _)| c.is_whitespace());

        if row_width + token_width <= width {
            // Leading whitespace is kept on the first row only (indentation).
            if is_space && row.is_empty() && !rows.is_empty() {
                continue;
            }
            row_width += token_width;
            row.extend(token);
            continue;
        }

        if is_space {
            rows.push(std::mem::take(&mut row));
            row_width = 0;
            continue;
        }

        if !row.is_empty() {
            while row.last().is_some_and(|(c, _)| c.is_whitespace()) {
                row.pop();
            }
            rows.push(std::mem::take(&mut row));
            row_width = 0;
        }

        for (c, style) in token {
            let w = char_width(c);
            if row_width + w > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            row.push((c, style));
            row_width += w;
        }
    }

    if !row.is_empty() || rows.is_empty() {
        rows.push(row);
    }

    rows.into_iter().map(row_to_line).collect()
}

fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Regroup consecutive chars of equal style into spans.
fn row_to_line(row: Vec<(char, Style)>) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut text = String::new();
    let mut current: Option<Style> = None;

    for (c, style) in row {
        if current.is_some_and(|s| s != style) {
            spans.push(Span::styled(std::mem::take(&mut text), current.unwrap_or_default()));
        }
        current = Some(style);
        text.push(c);
    }
    if let Some(style) = current {
        spans.push(Span::styled(text, style));
    }

    Line::from(spans)
}

fn wrap_lines(lines: &[Line], width: u16) -> Vec<Line<'static>> {
    lines
        .iter()
        .flat_map(|line| wrap_line(line, width as usize))
        .collect()
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Inner size minus borders
    let inner_width = area.width.saturating_sub(2);
    let rows = wrap_lines(&transcript_lines(app), inner_width);

    app.chat_height = area.height.saturating_sub(2);
    let total = rows.len().min(u16::MAX as usize) as u16;
    app.max_scroll = total.saturating_sub(app.chat_height);
    if app.follow_tail || app.chat_scroll > app.max_scroll {
        app.chat_scroll = app.max_scroll;
    }

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Conversación · {} ", app.conversation.user_id()));

    // Rows are already wrapped, so scroll offsets map one-to-one onto them.
    let chat = Paragraph::new(Text::from(rows))
        .block(chat_block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let sending = app.is_sending();
    let (border_color, title) = if sending {
        (Color::DarkGray, " Esperando respuesta... ")
    } else {
        (Color::Yellow, " Mensaje (Enter para enviar) ")
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_color = if sending { Color::DarkGray } else { Color::Cyan };
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(text_color))
        .block(input_block);

    frame.render_widget(input, area);

    if !sending {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = if app.is_sending() {
        (" ENVIANDO ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" enviar ", label_style),
        Span::styled(" ↑/↓ ", key_style),
        Span::styled(" desplazar ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" página ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" salir ", label_style),
    ];

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
