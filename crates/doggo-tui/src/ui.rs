use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use doggo_core::{AlertPhase, ChatRole, LogEntry, Severity, UiState};
use crate::app::App;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat log, input, footer
    let [header_area, log_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_log(app, frame, log_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.state.alert.is_shown() {
        render_alert(&app.state, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" DoggoGPT-Mini ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("{} ", app.client().endpoint()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("[{}] ", app.client().framing().as_str()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

/// Project the log entries into display lines
fn log_lines(state: &UiState, width: u16, spinner: &str) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let entries = state.log();

    for (i, entry) in entries.iter().enumerate() {
        match entry {
            LogEntry::Message(msg) => match msg.role {
                ChatRole::User => {
                    let mut first = vec![Span::styled(
                        "Input: ",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )];
                    first.push(Span::raw(msg.lines.first().cloned().unwrap_or_default()));
                    lines.push(Line::from(first));
                    lines.extend(msg.lines.iter().skip(1).map(|l| Line::from(l.clone())));
                }
                ChatRole::Assistant => {
                    lines.push(Line::from(Span::styled(
                        "DoggoGPT:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                    let waiting = state.is_busy()
                        && i + 1 == entries.len()
                        && msg.lines.iter().all(|l| l.is_empty());
                    if waiting {
                        lines.push(Line::from(Span::styled(
                            format!("{} Fetching...", spinner),
                            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                        )));
                    } else {
                        lines.extend(msg.lines.iter().map(|l| Line::from(l.clone())));
                    }
                }
            },
            LogEntry::Separator => {
                lines.push(Line::from(Span::styled(
                    "─".repeat(width as usize),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
    }

    lines
}

fn render_log(app: &mut App, frame: &mut Frame, area: Rect) {
    let border_color = if app.state.scroll_locked() { Color::DarkGray } else { Color::Cyan };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", app.state.direction.display_name()));

    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    let spinner = SPINNER[app.animation_frame % SPINNER.len()];

    let text = if app.state.log().is_empty() {
        Text::from(Span::styled(
            "Type a message and press Enter to translate...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(log_lines(&app.state, inner_width, spinner))
    };

    let log = Paragraph::new(text).wrap(Wrap { trim: false });

    // Rows after word wrapping, counted before the block adds its borders
    let total = u16::try_from(log.line_count(inner_width)).unwrap_or(u16::MAX);
    app.max_scroll = total.saturating_sub(inner_height);
    app.log_height = inner_height;

    let scroll = app.state.scroll.resolve(app.max_scroll);
    let log = log.block(block).scroll((scroll, 0));

    frame.render_widget(log, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let busy = app.state.is_busy();
    let spinner = SPINNER[app.animation_frame % SPINNER.len()];

    let (title, border_color) = if busy {
        (format!(" {} Waiting for reply (Esc to cancel) ", spinner), Color::DarkGray)
    } else {
        (" Message (Enter to send) ".to_string(), Color::Yellow)
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.state.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.state.input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    let cursor_x = (cursor_pos - scroll_offset) as u16;
    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let disabled_style = Style::default().bg(Color::Black).fg(Color::DarkGray);

    let (status, status_style) = if app.state.is_busy() {
        (" BUSY ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" READY ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let submit_style = if app.state.is_busy() { disabled_style } else { label_style };

    let mut hints = vec![
        Span::styled(status, status_style),
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", submit_style),
        Span::styled(" Tab ", key_style),
        Span::styled(" direction ", submit_style),
    ];

    if app.state.is_busy() {
        hints.extend(vec![
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ]);
    } else {
        hints.extend(vec![
            Span::styled(" ↑/↓ ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" clear ", label_style),
        ]);
    }

    hints.extend(vec![
        Span::styled(" ^C ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn render_alert(state: &UiState, frame: &mut Frame, area: Rect) {
    let alert = &state.alert;

    // Centered banner near the top, over the log
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 3.min(area.height);
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_area = Rect::new(popup_x, 2.min(area.height.saturating_sub(popup_height)), popup_width, popup_height);

    let accent = match alert.severity() {
        Severity::Error => Color::Red,
        Severity::Info => Color::Blue,
    };
    let style = match alert.phase() {
        AlertPhase::FadingOut => Style::default().fg(Color::DarkGray),
        _ => Style::default().fg(Color::White).bg(accent),
    };

    frame.render_widget(Clear, popup_area);
    let banner = Paragraph::new(alert.text().to_string())
        .style(style)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(accent)));
    frame.render_widget(banner, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use doggo_core::{Alert, ChatRequest, Direction};
    use ratatui::{backend::TestBackend, Terminal};

    fn plain(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_log_projection() {
        let mut state = UiState::new(Direction::EngToDoggo, Alert::default());
        state.begin_request(&ChatRequest {
            message: "hello".to_string(),
            direction: Direction::EngToDoggo,
        });

        // Waiting indicator before the first fragment
        let lines = plain(&log_lines(&state, 10, "*"));
        assert_eq!(lines, vec!["Input: hello", "DoggoGPT:", "* Fetching..."]);

        state.push_fragment("Bork\nbork");
        let lines = plain(&log_lines(&state, 10, "*"));
        assert_eq!(lines, vec!["Input: hello", "DoggoGPT:", "Bork", "bork"]);
    }

    #[test]
    fn test_separator_spans_width() {
        let mut state = UiState::new(Direction::EngToDoggo, Alert::default());
        state.begin_request(&ChatRequest {
            message: "hi".to_string(),
            direction: Direction::EngToDoggo,
        });
        state.finish(
            &doggo_core::StreamOutcome::Completed(Default::default()),
            std::time::Instant::now(),
        );

        let lines = plain(&log_lines(&state, 4, "*"));
        assert_eq!(lines.last().map(String::as_str), Some("────"));
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_log_bottom_shows_newest_word_wrapped_line() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut app = App::new(doggo_core::Config::new(), tx);
        app.state.begin_request(&ChatRequest {
            message: "hi".to_string(),
            direction: Direction::EngToDoggo,
        });
        // Each of these wraps at word boundaries into more rows than
        // its width alone suggests
        for _ in 0..6 {
            app.state.push_fragment("aaaaaaaa bbbbbbbb cc\n");
        }
        app.state.push_fragment("LASTLINE");

        let mut terminal = Terminal::new(TestBackend::new(12, 12)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = screen(&terminal);
        assert!(screen.contains("LASTLINE"), "newest line not visible:\n{}", screen);
        assert!(app.max_scroll > 0);
    }
}
