use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};

use crate::{
    app::{App, AppState},
    session::{CharMark, Session, TestResult},
    theme::Palette,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let palette = self.theme().palette();
        Block::default()
            .style(Style::default().bg(palette.background).fg(palette.text))
            .render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Length(1), // padding
                Constraint::Min(1),    // body
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(
            "Typing Speed Test",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        match (&self.state, self.session.as_ref()) {
            (AppState::Loading, _) => {
                render_loading(self.spinner_frame, &palette, chunks[2], buf)
            }
            (AppState::Unavailable(reason), _) => {
                render_unavailable(reason, &palette, chunks[2], buf)
            }
            (AppState::Typing, Some(session)) => {
                render_typing(self, session, &palette, chunks[2], buf)
            }
            (AppState::Results, Some(session)) => {
                if let Some(result) = session.result() {
                    render_results(&result, &palette, chunks[2], buf);
                }
            }
            _ => {}
        }

        Paragraph::new(Span::styled(
            legend(&self.state),
            Style::default()
                .fg(palette.muted)
                .add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[3], buf);
    }
}

fn legend(state: &AppState) -> &'static str {
    match state {
        AppState::Loading => "(tab) theme / (esc)ape",
        AppState::Unavailable(_) => "(r)etry / (tab) theme / (esc)ape",
        AppState::Typing => "(ctrl+r) new quote / (tab) theme / (esc)ape",
        AppState::Results => "(n)ew quote / (t)heme / (esc)ape",
    }
}

fn render_loading(frame: usize, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let chunks = vertically_centered(area, 1);
    Paragraph::new(Line::from(vec![
        Span::styled(
            SPINNER[frame % SPINNER.len()],
            Style::default().fg(palette.accent),
        ),
        Span::styled(" fetching a quote...", Style::default().fg(palette.muted)),
    ]))
    .alignment(Alignment::Center)
    .render(chunks, buf);
}

fn render_unavailable(reason: &str, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let chunks = vertically_centered(area, 3);
    Paragraph::new(vec![
        Line::from(Span::styled(
            "Quote unavailable",
            Style::default()
                .fg(palette.incorrect)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(reason, Style::default().fg(palette.muted))),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks, buf);
}

/// Rows `line` takes once word-wrapped into `width` columns
fn wrapped_height(line: &Line, width: u16) -> u16 {
    let rows = Paragraph::new(line.clone())
        .wrap(Wrap { trim: false })
        .line_count(width.max(1));
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn render_typing(app: &App, session: &Session, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let prompt_inner_width = area.width.saturating_sub(2);
    let spans = prompt_spans(session, palette);
    let prompt = Line::from(spans.clone());
    let prompt_lines = wrapped_height(&prompt, prompt_inner_width);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),                              // live accuracy
            Constraint::Length(1),                              // padding
            Constraint::Length(prompt_lines.saturating_add(2)), // quote
            Constraint::Length(1),                              // author
            Constraint::Length(1),                              // padding
            Constraint::Min(3),                                 // input box
        ])
        .split(area);

    Paragraph::new(Line::from(vec![
        Span::styled(
            format!("{}%", session.accuracy()),
            Style::default().patch(bold_style).fg(palette.accent),
        ),
        Span::styled(" current accuracy", Style::default().fg(palette.muted)),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    // too short for the whole quote: scroll so the cursor row stays in view
    let visible = chunks[2].height.saturating_sub(2);
    let cursor = session
        .char_marks()
        .iter()
        .position(|mark| *mark == CharMark::Current)
        .unwrap_or(spans.len().saturating_sub(1));
    // wrap whole words only, the way the full quote wraps
    let word_end = session
        .target()
        .chars()
        .skip(cursor)
        .position(char::is_whitespace)
        .map_or(spans.len(), |n| cursor + n)
        .max(cursor + 1);
    let cursor_row = wrapped_height(&Line::from(spans[..word_end].to_vec()), prompt_inner_width);
    let scroll = cursor_row.saturating_sub(visible);

    Paragraph::new(prompt)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .render(chunks[2], buf);

    if let Some(quote) = &app.quote {
        Paragraph::new(Span::styled(
            format!("— {}", quote.author),
            Style::default()
                .fg(palette.muted)
                .add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Right)
        .render(chunks[3], buf);
    }

    render_input_box(app.input.as_str(), palette, chunks[5], buf);
}

/// One span per target char, styled by how the current input matches it
pub fn prompt_spans<'a>(session: &Session, palette: &Palette) -> Vec<Span<'a>> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);

    session
        .target()
        .chars()
        .zip(session.char_marks())
        .map(|(expected, mark)| match mark {
            CharMark::Correct => Span::styled(
                expected.to_string(),
                Style::default().patch(bold_style).fg(palette.correct),
            ),
            CharMark::Incorrect => Span::styled(
                match expected {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                Style::default().patch(bold_style).fg(palette.incorrect),
            ),
            CharMark::Current => Span::styled(
                expected.to_string(),
                Style::default()
                    .bg(palette.cursor_bg)
                    .add_modifier(Modifier::UNDERLINED),
            ),
            CharMark::Pending => {
                Span::styled(expected.to_string(), Style::default().fg(palette.text))
            }
        })
        .collect()
}

fn render_input_box(input: &str, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let shown = input.replace('\n', "↵");
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);

    let placeholder = shown.is_empty();
    let text_span = if placeholder {
        Span::styled("Start typing...", Style::default().fg(palette.muted))
    } else {
        Span::styled(shown, Style::default().fg(palette.text))
    };
    let mut spans = vec![text_span];
    if !placeholder {
        spans.push(Span::styled(" ", Style::default().bg(palette.accent)));
    }

    let line = Line::from(spans);
    // keep the cursor line visible once the text outgrows the box
    let scroll = wrapped_height(&line, inner_width).saturating_sub(inner_height);

    Paragraph::new(line)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent)),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .render(area, buf);
}

fn render_results(result: &TestResult, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let panel = vertically_centered(area, 6);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Your Results ")
        .border_style(Style::default().fg(palette.accent));
    let inner = block.inner(panel);
    block.render(panel, buf);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(inner);

    let stats = [
        (result.wpm.to_string(), "Words per minute", palette.accent),
        (format!("{}%", result.accuracy), "Accuracy", palette.correct),
        (format!("{}s", result.time), "Time", palette.time),
    ];

    for ((value, label, color), column) in stats.into_iter().zip(columns.iter()) {
        Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                value,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(label, Style::default().fg(palette.muted))),
        ])
        .alignment(Alignment::Center)
        .render(*column, buf);
    }
}

/// A `height`-row strip in the vertical middle of `area`
fn vertically_centered(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    let top = (area.height - height) / 2;
    Rect::new(area.x, area.y + top, area.width, height)
}
